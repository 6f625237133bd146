use std::fmt;

use super::*;

/// Output from cutting a polytope element by a hyperplane.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementCutOutput {
    /// The element is flush with the cutting plane.
    Flush,
    /// The element is not flush with the cutting plane.
    NonFlush {
        /// Portion of the element that is inside the cut, if any. If the inside
        /// of the cut is being deleted, this is `None`.
        inside: Option<ElementId>,
        /// Portion of the element that is outside the cut, if any. If the
        /// outside of the cut is being deleted, this is `None`.
        outside: Option<ElementId>,
        /// Intersection of the element with the cutting plane, if any. This has
        /// rank one less than the element.
        intersection: Option<ElementId>,
    },
}
impl fmt::Display for ElementCutOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_option = |p: Option<ElementId>| match p {
            Some(id) => id.to_string(),
            None => "<none>".to_string(),
        };

        match self {
            ElementCutOutput::Flush => write!(f, "Flush"),
            ElementCutOutput::NonFlush {
                inside,
                outside,
                intersection,
            } => write!(
                f,
                "NonFlush {{ inside: {}, outside: {}, intersection: {} }}",
                fmt_option(*inside),
                fmt_option(*outside),
                fmt_option(*intersection),
            ),
        }
    }
}
impl ElementCutOutput {
    /// Result for an element that is completely removed by the cut.
    pub const REMOVED: Self = Self::NonFlush {
        inside: None,
        outside: None,
        intersection: None,
    };

    /// Constructs a result for an element `p` that is completely inside the
    /// cut.
    pub fn all_inside(p: ElementId) -> Self {
        Self::NonFlush {
            inside: Some(p),
            outside: None,
            intersection: None,
        }
    }
    /// Constructs a result for an element `p` that is completely outside the
    /// cut.
    pub fn all_outside(p: ElementId) -> Self {
        Self::NonFlush {
            inside: None,
            outside: Some(p),
            intersection: None,
        }
    }

    /// Returns the portion inside the cut, if any.
    pub fn inside(self) -> Option<ElementId> {
        match self {
            ElementCutOutput::Flush => None,
            ElementCutOutput::NonFlush { inside, .. } => inside,
        }
    }
    /// Returns the portion outside the cut, if any.
    pub fn outside(self) -> Option<ElementId> {
        match self {
            ElementCutOutput::Flush => None,
            ElementCutOutput::NonFlush { outside, .. } => outside,
        }
    }

    /// Returns an iterator containing `inside` and `outside`, ignoring `None`
    /// values.
    pub fn iter_inside_and_outside(self) -> impl Iterator<Item = ElementId> {
        itertools::chain(self.inside(), self.outside())
    }
}
