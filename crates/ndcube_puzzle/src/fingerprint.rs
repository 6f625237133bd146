//! Topological fingerprint of a puzzle, for recognizing when two
//! prescriptions describe the same puzzle.

use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use ndcube_math::Float;
use sha2::{Digest, Sha256};

use crate::twist::which_slice;
use crate::{PerFace, PuzzleDescription};

/// Marker present in the text of any fingerprint that cannot be trusted.
pub const NOT_FINGERPRINTABLE: &str = "NOT FINGERPRINTABLE";

/// Relative tolerance for deciding whether all edges have the same length.
const EDGE_LENGTH_TOLERANCE: Float = 1e-9;

/// Human-readable summary of the topology of a puzzle, along with a digest of
/// it.
///
/// Two puzzles with the same fingerprint have the same pieces arranged the
/// same way, even if they were built from different prescriptions. For
/// example, `{5,3,3} 2` and `{5,3,3} 3` have the same fingerprint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PuzzleFingerprint {
    text: String,
    digest: Option<String>,
}
impl fmt::Display for PuzzleFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)?;
        if let Some(digest) = &self.digest {
            write!(f, "\ndigest: {digest}")?;
        }
        Ok(())
    }
}
impl PuzzleFingerprint {
    /// Constructs a fingerprint from its text, computing the digest if the
    /// text does not contain [`NOT_FINGERPRINTABLE`].
    pub fn from_text(text: String) -> Self {
        let digest = (!text.contains(NOT_FINGERPRINTABLE))
            .then(|| hex::encode(Sha256::digest(text.as_bytes())));
        Self { text, digest }
    }

    pub(crate) fn new(
        polytope_fingerprint: &str,
        puzzle: &PuzzleDescription,
        face_types: &PerFace<String>,
        (min_edge_length, max_edge_length): (Float, Float),
    ) -> Self {
        let indented = polytope_fingerprint
            .lines()
            .map(|line| format!("    {line}"))
            .join("\n");
        let mut text = format!(
            "original polytope:\n{indented}\nfloor(intLength/2) = {}\nnumber of stickers: {}",
            puzzle.prescription.int_length / 2,
            puzzle.num_stickers(),
        );

        if max_edge_length > min_edge_length * (1.0 + EDGE_LENGTH_TOLERANCE) {
            text += &format!(
                "\nface type to slice sticker counts: UNKNOWN because edge lengths are \
                 nonuniform: min {min_edge_length}, max {max_edge_length}",
            );
            text += &format!("\n{NOT_FINGERPRINTABLE}!");
        } else {
            let mut face_type_counts = BTreeMap::new();
            for (face, face_type) in face_types.iter() {
                face_type_counts.entry(face_type).or_insert_with(|| {
                    let info = &puzzle.faces[face];
                    let mut counts = vec![0; info.cuts.len() + 1];
                    for center in puzzle.sticker_centers.iter_values() {
                        counts[which_slice(center, &info.normal, &info.cuts)] += 1;
                    }
                    counts
                });
            }
            text += "\nface type to slice sticker counts:";
            for (face_type, counts) in face_type_counts {
                text += &format!("\n    {face_type}: {}", counts.iter().join(","));
            }
        }

        Self::from_text(text)
    }

    /// Returns the human-readable text of the fingerprint.
    pub fn text(&self) -> &str {
        &self.text
    }
    /// Returns the lowercase hexadecimal SHA-256 digest of the text, or `None`
    /// if the puzzle is not fingerprintable.
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }
    /// Returns whether the fingerprint can be trusted.
    pub fn is_fingerprintable(&self) -> bool {
        self.digest.is_some()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_not_fingerprintable() {
        let fp = PuzzleFingerprint::from_text(format!("abc\n{NOT_FINGERPRINTABLE}!"));
        assert!(!fp.is_fingerprintable());
        assert_eq!(fp.digest(), None);

        let fp = PuzzleFingerprint::from_text("abc".to_owned());
        assert_eq!(
            fp.digest(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"),
        );
        assert_eq!(fp.to_string(), format!("abc\ndigest: {}", fp.digest().unwrap()));
    }

    #[test]
    fn test_hypercube_fingerprint() {
        let p = PuzzleDescription::build("{4,3,3}", "3").unwrap();
        let expected = "\
original polytope:
    element counts: 16 32 24 8 1
    rank 2 types: 24*4-gon
    rank 3 types: 8*(6*4-gon)
    rank 4 types: 1*(8*(6*4-gon))
floor(intLength/2) = 1
number of stickers: 216
face type to slice sticker counts:
    (6*4-gon): 81,54,81";
        assert_eq!(p.fingerprint().text(), expected);
        assert!(p.fingerprint().is_fingerprintable());
    }

    #[test]
    fn test_equivalent_puzzles() {
        let fingerprint = |schlafli: &str, length: &str| {
            PuzzleDescription::build(schlafli, length)
                .unwrap()
                .fingerprint()
                .clone()
        };
        assert_eq!(fingerprint("{4,3}", "3"), fingerprint("{4,3}", "3(3)"));
        assert_ne!(fingerprint("{4,3}", "2"), fingerprint("{4,3}", "3"));
        assert_ne!(fingerprint("{3}x{}", "3(2.75)"), fingerprint("{3}x{}", "3(3.25)"));
    }
}
