use ndcube_math::Float;
use serde::{Deserialize, Serialize};

use crate::PuzzleDescription;

/// Serializable overview of a built puzzle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleSummary {
    /// Prescription that the puzzle was built from, such as `{4,3,3} 3`.
    pub prescription: String,
    /// Number of dimensions.
    pub ndim: u8,
    /// Number of elements of each rank in the original polytope.
    pub element_counts: Vec<usize>,
    /// Number of faces.
    pub faces: usize,
    /// Number of stickers.
    pub stickers: usize,
    /// Number of cubies.
    pub cubies: usize,
    /// Number of cubies with each number of stickers, starting from 1.
    pub cubies_by_colors: Vec<usize>,
    /// Number of grips.
    pub grips: usize,
    /// Number of grips that can be twisted.
    pub twistable_grips: usize,
    /// Distance from the origin to the farthest vertex.
    pub circumradius: Float,
    /// Distance from the origin to the nearest face plane.
    pub inradius: Float,
    /// Digest of the puzzle's fingerprint, if it can be fingerprinted.
    pub fingerprint: Option<String>,
}

impl From<&PuzzleDescription> for PuzzleSummary {
    fn from(puzzle: &PuzzleDescription) -> Self {
        let max_colors = puzzle
            .cubie_stickers()
            .iter_values()
            .map(|stickers| stickers.len())
            .max()
            .unwrap_or(0);

        Self {
            prescription: puzzle.prescription().to_string(),
            ndim: puzzle.ndim(),
            element_counts: puzzle.original_element_counts().to_vec(),
            faces: puzzle.num_faces(),
            stickers: puzzle.num_stickers(),
            cubies: puzzle.num_cubies(),
            cubies_by_colors: (1..=max_colors)
                .map(|n| puzzle.num_cubies_with_num_colors(n))
                .collect(),
            grips: puzzle.num_grips(),
            twistable_grips: puzzle.grips().iter_values().filter(|g| g.order > 1).count(),
            circumradius: puzzle.circumradius(),
            inradius: puzzle.inradius(),
            fingerprint: puzzle.fingerprint().digest().map(str::to_owned),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_hypercube_summary() {
        let p = PuzzleDescription::build("{4,3,3}", "3").unwrap();
        let summary = PuzzleSummary::from(&p);
        assert_eq!(summary.prescription, "{4,3,3} 3");
        assert_eq!(summary.ndim, 4);
        assert_eq!(summary.element_counts, [16, 32, 24, 8, 1]);
        assert_eq!(summary.faces, 8);
        assert_eq!(summary.stickers, 216);
        assert_eq!(summary.cubies, 80);
        assert_eq!(summary.cubies_by_colors, [8, 24, 32, 16]);
        assert_eq!(summary.grips, 216);
        assert_eq!(summary.twistable_grips, 208);
        assert_eq!(summary.fingerprint.as_deref(), p.fingerprint().digest());
    }
}
