//! Merges two index-ordered streams in lockstep.
//!
//! Grounded on `diffdir.py`'s `collate_iters`: walk both streams together,
//! holding back whichever side runs ahead of the other until it catches up
//! or the other side is exhausted. Both inputs must already be strictly
//! increasing in [`Index`] — the invariant every iterator in this engine
//! upholds.

use std::cmp::Ordering;

use path::{Index, PathEntry};

/// Anything [`collate`] can merge: a value located at an [`Index`].
pub trait Indexed {
    /// This value's position in the tree.
    fn index(&self) -> &Index;
}

impl Indexed for PathEntry {
    fn index(&self) -> &Index {
        &self.index
    }
}

/// Merges two index-ordered iterators into `(Some, Some)` / `(Some, None)` /
/// `(None, Some)` triples sharing an index, in increasing index order.
pub struct Collate<A: Iterator, B: Iterator> {
    a: A,
    b: B,
    next_a: Option<A::Item>,
    next_b: Option<B::Item>,
}

impl<A, B> Collate<A, B>
where
    A: Iterator,
    B: Iterator,
    A::Item: Indexed,
    B::Item: Indexed,
{
    /// Builds a collated iterator over `a` and `b`.
    pub fn new(a: A, b: B) -> Self {
        Self {
            a,
            b,
            next_a: None,
            next_b: None,
        }
    }
}

impl<A, B> Iterator for Collate<A, B>
where
    A: Iterator,
    B: Iterator,
    A::Item: Indexed,
    B::Item: Indexed,
{
    type Item = (Option<A::Item>, Option<B::Item>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_a.is_none() {
            self.next_a = self.a.next();
        }
        if self.next_b.is_none() {
            self.next_b = self.b.next();
        }

        match (self.next_a.take(), self.next_b.take()) {
            (None, None) => None,
            (Some(a), None) => Some((Some(a), None)),
            (None, Some(b)) => Some((None, Some(b))),
            (Some(a), Some(b)) => match a.index().cmp(b.index()) {
                Ordering::Less => {
                    self.next_b = Some(b);
                    Some((Some(a), None))
                }
                Ordering::Equal => Some((Some(a), Some(b))),
                Ordering::Greater => {
                    self.next_a = Some(a);
                    Some((None, Some(b)))
                }
            },
        }
    }
}

/// Collates `a` and `b` by index. See [`Collate`].
pub fn collate<A, B>(a: A, b: B) -> Collate<A::IntoIter, B::IntoIter>
where
    A: IntoIterator,
    B: IntoIterator,
    A::Item: Indexed,
    B::Item: Indexed,
{
    Collate::new(a.into_iter(), b.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item(Index);

    impl Indexed for Item {
        fn index(&self) -> &Index {
            &self.0
        }
    }

    fn item(s: &str) -> Item {
        Item(Index::from([s].as_slice()))
    }

    #[test]
    fn matches_shared_indices_and_holds_back_the_rest() {
        let a = vec![item("a"), item("b"), item("d")];
        let b = vec![item("b"), item("c"), item("d")];
        let pairs: Vec<_> = collate(a, b).collect();
        assert_eq!(
            pairs,
            vec![
                (Some(item("a")), None),
                (Some(item("b")), Some(item("b"))),
                (None, Some(item("c"))),
                (Some(item("d")), Some(item("d"))),
            ]
        );
    }

    #[test]
    fn exhausted_side_yields_remainder_of_the_other() {
        let a: Vec<Item> = vec![];
        let b = vec![item("x"), item("y")];
        let pairs: Vec<_> = collate(a, b).collect();
        assert_eq!(
            pairs,
            vec![(None, Some(item("x"))), (None, Some(item("y")))]
        );
    }

    #[test]
    fn identical_streams_pair_everything() {
        let a = vec![item("a"), item("b"), item("c")];
        let b = a.clone();
        let pairs: Vec<_> = collate(a, b).collect();
        assert!(pairs
            .iter()
            .all(|(x, y)| x.is_some() && y.is_some() && x == y));
    }

    #[test]
    fn output_order_is_strictly_increasing() {
        let a = vec![item("a"), item("c"), item("e")];
        let b = vec![item("b"), item("c"), item("f")];
        let pairs: Vec<_> = collate(a, b).collect();
        let mut indices = Vec::new();
        for (x, y) in &pairs {
            let idx = x.as_ref().map(Indexed::index).or(y.as_ref().map(Indexed::index));
            indices.push(idx.unwrap());
        }
        for w in indices.windows(2) {
            assert!(w[0] < w[1]);
        }
    }
}
