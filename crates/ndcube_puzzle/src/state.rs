//! Mutable puzzle state: which color occupies each sticker.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use sha2::Digest;

use crate::*;

/// Twist of a grip by some number of increments in some slices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Twist {
    /// Grip to twist.
    pub grip: Grip,
    /// Number of increments to twist by. [`CCW`] and [`CW`] are one increment
    /// in each direction.
    pub dir: i32,
    /// Bitmask of slices to twist, counting from the grip's face. 0 means the
    /// first slice and -1 means every slice.
    pub slice_mask: i32,
}
impl Twist {
    /// Constructs a twist.
    pub fn new(grip: Grip, dir: i32, slice_mask: i32) -> Self {
        Self {
            grip,
            dir,
            slice_mask,
        }
    }

    /// Returns the twist that undoes this one.
    #[must_use]
    pub fn rev(self) -> Self {
        Self {
            dir: -self.dir,
            ..self
        }
    }
}

/// Colors of every sticker of a puzzle.
///
/// Each sticker holds the face whose color currently occupies it, so a solved
/// puzzle maps every sticker to its own face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleState {
    stickers: PerSticker<Face>,
}
impl PuzzleState {
    /// Returns the solved state of a puzzle.
    pub fn new(puzzle: &PuzzleDescription) -> Self {
        Self {
            stickers: puzzle.sticker_faces().clone(),
        }
    }

    /// Returns the color of every sticker.
    pub fn stickers(&self) -> &PerSticker<Face> {
        &self.stickers
    }
    /// Returns the color of every sticker.
    pub fn into_stickers(self) -> PerSticker<Face> {
        self.stickers
    }

    /// Returns the state to solved.
    pub fn reset(&mut self, puzzle: &PuzzleDescription) {
        *self = Self::new(puzzle);
    }

    /// Applies a twist.
    pub fn twist(&mut self, puzzle: &PuzzleDescription, twist: Twist) -> Result<(), TwistError> {
        puzzle.apply_twist_to_state(&mut self.stickers, twist.grip, twist.dir, twist.slice_mask)
    }

    /// Returns whether every face shows a single color.
    ///
    /// Colors may be on a different face than they started on, so a puzzle
    /// that has only been rotated as a whole is solved.
    pub fn is_solved(&self, puzzle: &PuzzleDescription) -> bool {
        let mut face_colors: PerFace<Option<Face>> = vec![None; puzzle.num_faces()].into();
        let sticker_faces = puzzle.sticker_faces().iter_values();
        for (&face, &color) in std::iter::zip(sticker_faces, self.stickers.iter_values()) {
            if *face_colors[face].get_or_insert(color) != color {
                return false;
            }
        }
        true
    }

    /// Resets the puzzle and then applies `num_twists` random twists,
    /// returning the twists applied.
    ///
    /// Each twist turns a single random slice of a random grip with order at
    /// least 2, in a random direction. Consecutive twists never use the same
    /// face or opposite faces.
    pub fn scramble(
        &mut self,
        puzzle: &PuzzleDescription,
        rng: &mut impl Rng,
        num_twists: usize,
    ) -> Result<Vec<Twist>, TwistError> {
        self.reset(puzzle);

        let candidates = puzzle
            .grips()
            .iter()
            .filter(|(_, info)| info.order >= 2)
            .map(|(grip, info)| (grip, info.face))
            .collect::<Vec<_>>();

        let mut previous_face: Option<Face> = None;
        let mut twists = Vec::with_capacity(num_twists);
        for _ in 0..num_twists {
            let allowed = candidates
                .iter()
                .filter(|&&(_, face)| match previous_face {
                    Some(prev) => face != prev && puzzle.faces()[prev].opposite != Some(face),
                    None => true,
                })
                .collect::<Vec<_>>();
            let &&(grip, face) = allowed.choose(rng).ok_or(TwistError::NothingToScramble)?;
            previous_face = Some(face);

            let slice = rng.random_range(0..puzzle.num_slices_for_grip(grip).max(1));
            let slice_mask = 1_i32.checked_shl(slice as u32).unwrap_or(1);
            let dir = if rng.random_bool(0.5) { CW } else { CCW };
            let twist = Twist::new(grip, dir, slice_mask);
            self.twist(puzzle, twist)?;
            twists.push(twist);
        }
        log::debug!("scrambled {} with {} twists", puzzle.prescription(), twists.len());
        Ok(twists)
    }

    /// Resets the puzzle and then scrambles it with enough twists to fully
    /// mix it up, plus a few more so that parity is unpredictable.
    pub fn scramble_fully(
        &mut self,
        puzzle: &PuzzleDescription,
        rng: &mut impl Rng,
    ) -> Result<Vec<Twist>, TwistError> {
        let extra = rng.random_range(0..10);
        self.scramble(puzzle, rng, puzzle.twists_needed_to_fully_scramble() + extra)
    }
}

impl PuzzleDescription {
    /// Returns the number of twists needed to fully scramble the puzzle, which
    /// is proportional to the number of faces and the number of slices.
    pub fn twists_needed_to_fully_scramble(&self) -> usize {
        self.num_faces() * self.prescription().int_length as usize * 2
    }
}

/// Returns a deterministic random number generator seeded from a string.
pub fn rng_from_seed(seed: &str) -> rand_chacha::ChaCha12Rng {
    let digest = sha2::Sha256::digest(seed.as_bytes());
    let mut bytes = [0_u8; 32];
    bytes.copy_from_slice(&digest[..32]);
    rand_chacha::ChaCha12Rng::from_seed(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_solved() {
        let p = PuzzleDescription::build("{4,3}", "3").unwrap();
        let state = PuzzleState::new(&p);
        assert_eq!(state.stickers(), p.sticker_faces());
        assert!(state.is_solved(&p));
    }

    #[test]
    fn test_twist_and_undo() {
        let p = PuzzleDescription::build("{4,3}", "3").unwrap();
        let grip = p.grips().iter().find(|(_, g)| g.order == 4).unwrap().0;
        let mut state = PuzzleState::new(&p);

        let twist = Twist::new(grip, CCW, 1);
        state.twist(&p, twist).unwrap();
        assert!(!state.is_solved(&p));
        state.twist(&p, twist.rev()).unwrap();
        assert!(state.is_solved(&p));
        assert_eq!(state, PuzzleState::new(&p));
    }

    #[test]
    fn test_whole_puzzle_rotation_is_solved() {
        let p = PuzzleDescription::build("{4,3}", "3").unwrap();
        let grip = p.grips().iter().find(|(_, g)| g.order == 4).unwrap().0;
        let mut state = PuzzleState::new(&p);
        state.twist(&p, Twist::new(grip, CW, -1)).unwrap();
        assert_ne!(state, PuzzleState::new(&p));
        assert!(state.is_solved(&p));
    }

    #[test]
    fn test_scramble() {
        let p = PuzzleDescription::build("{4,3,3}", "3").unwrap();
        let mut state = PuzzleState::new(&p);
        let twists = state.scramble(&p, &mut rng_from_seed("test"), 20).unwrap();
        assert_eq!(twists.len(), 20);
        assert!(!state.is_solved(&p));

        for pair in twists.windows(2) {
            let a = p.grips()[pair[0].grip].face;
            let b = p.grips()[pair[1].grip].face;
            assert_ne!(a, b);
            assert_ne!(p.faces()[a].opposite, Some(b));
        }
        for twist in &twists {
            assert!(p.grips()[twist.grip].order >= 2);
            assert_eq!(twist.slice_mask.count_ones(), 1);
            assert!(twist.dir == CW || twist.dir == CCW);
        }

        // Undoing the scramble in reverse order solves the puzzle.
        for &twist in twists.iter().rev() {
            state.twist(&p, twist.rev()).unwrap();
        }
        assert_eq!(state, PuzzleState::new(&p));
    }

    #[test]
    fn test_scramble_is_reproducible() {
        let p = PuzzleDescription::build("{4,3}", "3").unwrap();
        let mut a = PuzzleState::new(&p);
        let mut b = PuzzleState::new(&p);
        let twists_a = a.scramble_fully(&p, &mut rng_from_seed("seed")).unwrap();
        let twists_b = b.scramble_fully(&p, &mut rng_from_seed("seed")).unwrap();
        assert_eq!(twists_a, twists_b);
        assert_eq!(a, b);
        assert!(twists_a.len() >= p.twists_needed_to_fully_scramble());
        assert_eq!(p.twists_needed_to_fully_scramble(), 6 * 3 * 2);
    }
}
