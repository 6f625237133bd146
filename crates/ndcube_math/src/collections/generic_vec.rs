//! Lists indexed by small integer newtypes such as face and sticker IDs.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, Index, IndexMut, Range};

/// Error returned when a list grows past the largest index its ID type can
/// hold.
#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("too many {type_name}s (limit is {max_value})")]
pub struct IndexOverflow {
    /// Name of the ID type.
    pub type_name: &'static str,
    /// Largest representable ID.
    pub max_value: u64,
}

/// Error returned when looking up an ID that is not in a list.
#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("no such {type_name}")]
pub struct IndexOutOfRange {
    /// Name of the ID type.
    pub type_name: &'static str,
}

/// Declares ID newtypes around unsigned integers, usable as keys of a
/// [`GenericVec`] and as members of a [`tinyset::Set64`].
#[macro_export]
macro_rules! idx_struct {
    ($(
        $(#[$attr:meta])*
        $vis:vis struct $name:ident($inner_vis:vis $inner:ty);
    )+) => {$(
        $(#[$attr])*
        #[derive(Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        $vis struct $name($inner_vis $inner);

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl $crate::Fits64 for $name {
            unsafe fn from_u64(x: u64) -> Self {
                Self(x as $inner)
            }

            fn to_u64(self) -> u64 {
                self.0 as u64
            }
        }

        impl $crate::collections::IndexNewtype for $name {
            const MAX_INDEX: usize = <$inner>::MAX as usize;
            const TYPE_NAME: &'static str = stringify!($name);

            fn to_usize(self) -> usize {
                self.0 as usize
            }
            fn from_usize_unchecked(index: usize) -> Self {
                Self(index as $inner)
            }
        }
    )+};
}

/// ID newtype declared with [`idx_struct!`].
pub trait IndexNewtype:
    fmt::Debug
    + fmt::Display
    + Default
    + Copy
    + Eq
    + Ord
    + std::hash::Hash
    + tinyset::Fits64
    + Send
    + Sync
{
    /// Largest representable ID, as an index.
    const MAX_INDEX: usize;
    /// Name of the type, for error messages.
    const TYPE_NAME: &'static str;

    /// Returns the ID as an index.
    fn to_usize(self) -> usize;
    /// Converts an index to an ID, truncating if it is too large.
    #[doc(hidden)]
    fn from_usize_unchecked(index: usize) -> Self;

    /// Converts an index to an ID, or returns an error if it is too large.
    fn try_from_usize(index: usize) -> Result<Self, IndexOverflow> {
        if index <= Self::MAX_INDEX {
            Ok(Self::from_usize_unchecked(index))
        } else {
            Err(IndexOverflow {
                type_name: Self::TYPE_NAME,
                max_value: Self::MAX_INDEX as u64,
            })
        }
    }

    /// Iterates over the first `count` IDs, stopping early at the largest
    /// representable one.
    fn iter(count: usize) -> IdRange<Self> {
        IdRange {
            range: 0..count.min(Self::MAX_INDEX.saturating_add(1)),
            _phantom: PhantomData,
        }
    }
}

/// Iterator over consecutive IDs, returned by [`IndexNewtype::iter()`].
#[derive(Debug, Clone)]
pub struct IdRange<I> {
    range: Range<usize>,
    _phantom: PhantomData<I>,
}
impl<I: IndexNewtype> Iterator for IdRange<I> {
    type Item = I;

    fn next(&mut self) -> Option<I> {
        self.range.next().map(I::from_usize_unchecked)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}
impl<I: IndexNewtype> DoubleEndedIterator for IdRange<I> {
    fn next_back(&mut self) -> Option<I> {
        self.range.next_back().map(I::from_usize_unchecked)
    }
}
impl<I: IndexNewtype> ExactSizeIterator for IdRange<I> {}

/// `Vec<E>` whose positions are IDs of type `I`.
///
/// Dereferences to a slice for length checks and plain iteration over values.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GenericVec<I, E> {
    values: Vec<E>,
    _phantom: PhantomData<I>,
}

impl<I, E: fmt::Debug> fmt::Debug for GenericVec<I, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.values).finish()
    }
}
impl<I, E> Default for GenericVec<I, E> {
    fn default() -> Self {
        Self {
            values: vec![],
            _phantom: PhantomData,
        }
    }
}
impl<I, E> Deref for GenericVec<I, E> {
    type Target = [E];

    fn deref(&self) -> &[E] {
        &self.values
    }
}
impl<I: IndexNewtype, E> Index<I> for GenericVec<I, E> {
    type Output = E;

    fn index(&self, id: I) -> &E {
        &self.values[id.to_usize()]
    }
}
impl<I: IndexNewtype, E> IndexMut<I> for GenericVec<I, E> {
    fn index_mut(&mut self, id: I) -> &mut E {
        &mut self.values[id.to_usize()]
    }
}

impl<I: IndexNewtype, E> GenericVec<I, E> {
    /// Returns an empty list.
    pub const fn new() -> Self {
        Self {
            values: vec![],
            _phantom: PhantomData,
        }
    }

    /// Appends a value and returns its ID.
    pub fn push(&mut self, value: E) -> Result<I, IndexOverflow> {
        let id = I::try_from_usize(self.values.len())?;
        self.values.push(value);
        Ok(id)
    }

    /// Returns the value for `id`.
    pub fn get(&self, id: I) -> Result<&E, IndexOutOfRange> {
        self.values.get(id.to_usize()).ok_or(IndexOutOfRange {
            type_name: I::TYPE_NAME,
        })
    }
    /// Returns the value for `id` mutably.
    pub fn get_mut(&mut self, id: I) -> Result<&mut E, IndexOutOfRange> {
        self.values.get_mut(id.to_usize()).ok_or(IndexOutOfRange {
            type_name: I::TYPE_NAME,
        })
    }

    /// Iterates over values in ID order.
    pub fn iter_values(&self) -> std::slice::Iter<'_, E> {
        self.values.iter()
    }
    /// Iterates over IDs and values.
    pub fn iter(&self) -> std::iter::Zip<IdRange<I>, std::slice::Iter<'_, E>> {
        I::iter(self.values.len()).zip(&self.values)
    }
    /// Iterates over IDs and mutable values.
    pub fn iter_mut(&mut self) -> std::iter::Zip<IdRange<I>, std::slice::IterMut<'_, E>> {
        I::iter(self.values.len()).zip(&mut self.values)
    }

    /// Builds a list of the same length from a function of each ID and value.
    pub fn map_ref<'a, U>(&'a self, mut f: impl FnMut(I, &'a E) -> U) -> GenericVec<I, U> {
        self.iter().map(|(id, value)| f(id, value)).collect()
    }
}

impl<I: IndexNewtype, E> FromIterator<E> for GenericVec<I, E> {
    fn from_iter<T: IntoIterator<Item = E>>(iter: T) -> Self {
        iter.into_iter().collect::<Vec<E>>().into()
    }
}
impl<I: IndexNewtype, E> From<Vec<E>> for GenericVec<I, E> {
    /// Converts a `Vec`, dropping any values past the largest ID.
    fn from(mut values: Vec<E>) -> Self {
        values.truncate(I::MAX_INDEX.saturating_add(1));
        Self {
            values,
            _phantom: PhantomData,
        }
    }
}
impl<'a, I: IndexNewtype, E> IntoIterator for &'a GenericVec<I, E> {
    type Item = (I, &'a E);
    type IntoIter = std::iter::Zip<IdRange<I>, std::slice::Iter<'a, E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::idx_struct! {
        struct Slot(u8);
    }

    #[test]
    fn test_push_until_full() {
        let mut list = GenericVec::<Slot, usize>::new();
        for i in 0..256 {
            assert_eq!(list.push(i * 10), Ok(Slot(i as u8)));
        }
        assert_eq!(
            list.push(0),
            Err(IndexOverflow {
                type_name: "Slot",
                max_value: 255,
            }),
        );
        assert_eq!(list.len(), 256);
        assert_eq!(list[Slot(255)], 2550);
        assert_eq!(list.iter().rev().next(), Some((Slot(255), &2550)));
        assert_eq!(Slot::iter(1000).len(), 256);
    }

    #[test]
    fn test_lookup_and_map() {
        let mut list: GenericVec<Slot, char> = vec!['a', 'b'].into();
        assert_eq!(list.get(Slot(1)), Ok(&'b'));
        assert_eq!(list.get(Slot(2)), Err(IndexOutOfRange { type_name: "Slot" }));
        *list.get_mut(Slot(0)).expect("present") = 'z';

        let upper = list.map_ref(|id, c| format!("{id}{}", c.to_ascii_uppercase()));
        assert_eq!(upper.iter_values().cloned().collect::<Vec<_>>(), ["0Z", "1B"]);
        assert_eq!(format!("{list:?}"), "['z', 'b']");
        assert_eq!(format!("{:?}", Slot(7)), "Slot#7");
    }
}
