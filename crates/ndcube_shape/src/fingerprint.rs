//! Topological summaries of polytopes, for recognizing polytopes with the same
//! structure regardless of how they were specified.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::ElementTable;

/// Returns a summary of the combinatorial type of every element, indexed by
/// rank and then by index within the rank.
///
/// - Vertices are `point`.
/// - Edges are `segment`.
/// - Polygons are `N-gon`.
/// - Higher-rank elements list their facet types with multiplicity, such as
///   `(6*4-gon)` for a cube.
pub fn element_type_summaries(table: &ElementTable) -> Vec<Vec<String>> {
    let mut summaries: Vec<Vec<String>> = vec![];
    for rank in 0..=table.top_rank() {
        let count = table.count(rank);
        let list = match rank {
            0 => vec!["point".to_owned(); count],
            1 => vec!["segment".to_owned(); count],
            2 => (0..count)
                .map(|i| format!("{}-gon", table.incidences(2, i, 1).len()))
                .collect(),
            _ => (0..count)
                .map(|i| {
                    let facet_types = table
                        .incidences(rank, i, rank - 1)
                        .iter()
                        .map(|&j| summaries[rank as usize - 1][j].as_str());
                    format!("({})", histogram(facet_types))
                })
                .collect(),
        };
        summaries.push(list);
    }
    summaries
}

/// Returns a deterministic human-readable summary of the structure of a
/// polytope: the number of elements of each rank, and how many elements of
/// each type there are for every rank from 2 up.
pub fn polytope_fingerprint(table: &ElementTable) -> String {
    let summaries = element_type_summaries(table);
    let mut lines = vec![format!(
        "element counts: {}",
        (0..=table.top_rank()).map(|rank| table.count(rank)).join(" "),
    )];
    for (rank, list) in summaries.iter().enumerate().skip(2) {
        lines.push(format!(
            "rank {rank} types: {}",
            histogram(list.iter().map(String::as_str)),
        ));
    }
    lines.join("\n")
}

/// Formats a multiset of strings as `count*string` pairs, sorted by string.
fn histogram<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let mut counts = BTreeMap::<&str, usize>::new();
    for item in items {
        *counts.entry(item).or_default() += 1;
    }
    counts.iter().map(|(item, n)| format!("{n}*{item}")).join(",")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{Polytope, SchlafliProduct};

    fn fingerprint_of(s: &str) -> String {
        let schlafli: SchlafliProduct = s.parse().expect("valid symbol");
        let p = Polytope::from_schlafli_product(&schlafli).expect("valid polytope");
        polytope_fingerprint(&ElementTable::new(p.space(), &[p.root()]))
    }

    #[test]
    fn test_hypercube_fingerprint() {
        assert_eq!(
            fingerprint_of("{4,3,3}"),
            "element counts: 16 32 24 8 1\n\
             rank 2 types: 24*4-gon\n\
             rank 3 types: 8*(6*4-gon)\n\
             rank 4 types: 1*(8*(6*4-gon))",
        );
    }

    #[test]
    fn test_prism_fingerprint() {
        assert_eq!(
            fingerprint_of("{3}x{}"),
            "element counts: 6 9 5 1\n\
             rank 2 types: 2*3-gon,3*4-gon\n\
             rank 3 types: 1*(2*3-gon,3*4-gon)",
        );
    }

    #[test]
    fn test_equivalent_products_match() {
        assert_eq!(fingerprint_of("{4}x{}"), fingerprint_of("{4,3}"));
        assert_eq!(fingerprint_of("{4}x{4}"), fingerprint_of("{4,3,3}"));
        assert_ne!(fingerprint_of("{3}x{4}"), fingerprint_of("{4,3,3}"));
    }
}
