#![warn(missing_docs)]
#![doc(test(attr(deny(unused, future_incompatible))))]

//! This crate searches a categorical dataset for tuples of variables that depend on each other.
//!
//! Given a [`DataMatrix`] of `n` variables observed over `m` samples, a search evaluates an
//! information-theoretic [measure][measure::Measure] over every tuple in a [`TupleSpace`]. By
//! default that is every combination of `d` distinct variables, but named variable groups and tuple
//! templates can restrict it to, say, pairs that take one variable from each of two groups. The
//! space is enumerated lazily in a fixed order, so a large search can be split into "ranks" that
//! independent processes evaluate without talking to each other, and each rank is split again
//! across threads.
//!
//! Joint frequency tables are counted either by a single pass over the samples, or by
//! intersecting per-symbol bitmasks; both give identical tables. Entropies of sub-tuples are
//! shared through an in-memory [cache][cache::MemoryCache], because every pair appears in many
//! triples.
//!
//! ```
//! use mist::{search, DataMatrix, SearchConfig};
//!
//! let data = DataMatrix::random_seeded(6, 200, 3, 42).unwrap();
//! let config = SearchConfig::builder().tuple_size(2).build().unwrap();
//! let results = search::start(&config, &data).unwrap();
//! assert_eq!(results.len(), 15);
//! ```

use smallvec::SmallVec;
use std::fmt;
use std::iter::FromIterator;

pub mod cache;
pub mod counter;
pub mod data;
mod error;
pub mod measure;
pub mod search;
pub mod space;

pub use counter::{BitsetCounter, ContingencyTable, Counter, ProbabilityAlgorithm, VectorCounter};
pub use data::{DataMatrix, Order, VariableView};
pub use error::{Error, Result};
pub use measure::{EntropyCalculator, Measure, MeasureKind};
pub use search::{CacheConfig, ResultRecord, SearchConfig, SearchResults};
pub use space::{GroupId, GroupRef, GroupTuple, Partition, TupleSpace, Tuples};

/// One observation of one variable. Negative values mean the observation is missing.
pub type Symbol = i8;

/// An ordered tuple of variable indexes.
///
/// Unlike a set, a tuple keeps the order its variables were drawn in, which for templates that
/// cross several groups is the order of the groups. Tuples of up to four variables don't allocate.
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tuple(SmallVec<[usize; 4]>);

impl Tuple {
    /// Creates a tuple holding exactly the given variables, in order.
    pub fn new(variables: &[usize]) -> Self {
        Tuple(SmallVec::from_slice(variables))
    }

    /// The number of variables in the tuple.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the tuple has no variables.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The variables, in order.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Returns an iterator over the variables in this tuple.
    ///
    /// ```
    /// use mist::Tuple;
    ///
    /// let t = Tuple::new(&[4, 1, 7]);
    /// assert_eq!(t.iter().collect::<Vec<_>>(), [4, 1, 7]);
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = usize> + Clone + '_ {
        self.0.iter().copied()
    }

    /// The same variables in ascending order. Every permutation of a tuple has the same joint
    /// entropy, so this is the form used as a cache key.
    ///
    /// ```
    /// use mist::Tuple;
    ///
    /// assert_eq!(Tuple::new(&[3, 0, 2]).canonical(), Tuple::new(&[0, 2, 3]));
    /// ```
    pub fn canonical(&self) -> Self {
        let mut v = self.0.clone();
        v.sort_unstable();
        Tuple(v)
    }
}

impl std::ops::Index<usize> for Tuple {
    type Output = usize;

    fn index(&self, position: usize) -> &usize {
        &self.0[position]
    }
}

impl FromIterator<usize> for Tuple {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Tuple(iter.into_iter().collect())
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Tuple;
    use smallvec::SmallVec;
    use std::mem::size_of;

    #[test]
    fn small_tuples_stay_inline() {
        let t = Tuple::new(&[1, 2, 3, 4]);
        assert!(!t.0.spilled());
        assert_eq!(size_of::<Tuple>(), size_of::<SmallVec<[usize; 4]>>());
    }

    #[test]
    fn tuples_order_lexicographically() {
        let mut tuples = vec![
            Tuple::new(&[1, 0]),
            Tuple::new(&[0, 2]),
            Tuple::new(&[0, 1]),
        ];
        tuples.sort();
        assert_eq!(
            tuples,
            [Tuple::new(&[0, 1]), Tuple::new(&[0, 2]), Tuple::new(&[1, 0])]
        );
    }
}
