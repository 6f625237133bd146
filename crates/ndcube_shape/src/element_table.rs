use std::collections::HashMap;

use super::*;

/// Every element of a set of polytopes, grouped by rank, along with every
/// incidence between them.
///
/// Elements of the top rank are listed in the order of the roots given at
/// construction. Elements of lower ranks are listed in ascending order of
/// [`ElementId`], which is the order in which they were created.
#[derive(Debug, Clone)]
pub struct ElementTable {
    elements: Vec<Vec<ElementId>>,
    index_of: HashMap<ElementId, usize>,
    /// `incidences[rank][i][other_rank]`
    incidences: Vec<Vec<Vec<Vec<usize>>>>,
}

impl ElementTable {
    /// Computes the element table for a set of roots, which must all have the
    /// same rank.
    pub fn new(space: &Space, roots: &[ElementId]) -> Self {
        let top_rank = roots.first().map_or(0, |&r| space.rank(r));

        let mut elements = vec![vec![]; top_rank as usize + 1];
        elements[top_rank as usize] = roots.to_vec();
        for rank in 0..top_rank {
            let mut set = ElementSet::new();
            for &root in roots {
                set.extend(space.subelements_with_rank(root, rank));
            }
            let mut list = set.iter().collect::<Vec<_>>();
            list.sort();
            elements[rank as usize] = list;
        }

        let index_of = elements
            .iter()
            .flat_map(|list| list.iter().enumerate().map(|(i, &e)| (e, i)))
            .collect::<HashMap<_, _>>();

        // Down-incidences and self-incidences first.
        let mut incidences = elements
            .iter()
            .enumerate()
            .map(|(rank, list)| {
                list.iter()
                    .enumerate()
                    .map(|(i, &e)| {
                        (0..=top_rank as usize)
                            .map(|other_rank| {
                                if other_rank < rank {
                                    let mut indices = space
                                        .subelements_with_rank(e, other_rank as u8)
                                        .into_iter()
                                        .filter_map(|sub| index_of.get(&sub).copied())
                                        .collect::<Vec<_>>();
                                    indices.sort();
                                    indices
                                } else if other_rank == rank {
                                    vec![i]
                                } else {
                                    vec![]
                                }
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        // Up-incidences are the transpose of down-incidences. Iterating in
        // order keeps each list sorted.
        for rank in 0..=top_rank as usize {
            for i in 0..elements[rank].len() {
                for lower_rank in 0..rank {
                    for j in incidences[rank][i][lower_rank].clone() {
                        incidences[lower_rank][j][rank].push(i);
                    }
                }
            }
        }

        Self {
            elements,
            index_of,
            incidences,
        }
    }

    /// Returns the rank of the top-rank elements.
    pub fn top_rank(&self) -> u8 {
        (self.elements.len() - 1) as u8
    }
    /// Returns the elements of a rank.
    pub fn elements(&self, rank: u8) -> &[ElementId] {
        self.elements.get(rank as usize).map(Vec::as_slice).unwrap_or(&[])
    }
    /// Returns the number of elements of a rank.
    pub fn count(&self, rank: u8) -> usize {
        self.elements(rank).len()
    }
    /// Returns the index of an element within its rank.
    pub fn index_of(&self, element: ElementId) -> Option<usize> {
        self.index_of.get(&element).copied()
    }
    /// Returns the indices of the elements of rank `other_rank` incident to
    /// element `i` of rank `rank`, in ascending order.
    ///
    /// Lower ranks give every element in the (transitive) boundary, higher
    /// ranks give every element whose boundary contains it, and the same rank
    /// gives just `[i]`.
    pub fn incidences(&self, rank: u8, i: usize, other_rank: u8) -> &[usize] {
        &self.incidences[rank as usize][i][other_rank as usize]
    }
}
