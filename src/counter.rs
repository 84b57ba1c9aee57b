//! Joint frequency tables for tuples of variables.
//!
//! A [`Counter`] fills a [`ContingencyTable`] with how often each combination of symbols occurs
//! across the samples of a [`DataMatrix`]. Two strategies are provided and produce identical
//! tables: [`VectorCounter`] walks the samples once per tuple, while [`BitsetCounter`] keeps one
//! bitmask of samples per variable and symbol, and intersects them.

use crate::data::VariableView;
use crate::{DataMatrix, Error, Result, Symbol};
use bitvec::prelude::*;
use smallvec::SmallVec;
use std::fmt;
use std::iter::FromIterator;
use std::str::FromStr;

/// Tables with more cells than this are refused rather than allocated.
const MAX_CELLS: usize = 1 << 30;

/// Summary statistics computed from the cells of a table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableSummary {
    /// The [Shannon entropy][] of the table, measured in bits. This is normalized to produce the
    /// same result whether the table contains probabilities or frequencies.
    ///
    /// [Shannon entropy]: https://en.wikipedia.org/wiki/Entropy_(information_theory)
    pub uncertainty: f64,

    /// The total count across all cells in the table.
    pub sample_size: f64,
}

impl FromIterator<f64> for TableSummary {
    /// Creates a summary for a table whose non-zero cells are provided by the given iterator.
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut summary = TableSummary {
            uncertainty: 0.0,
            sample_size: 0.0,
        };
        for count in iter {
            summary.uncertainty -= count * count.log2();
            summary.sample_size += count;
        }
        if summary.sample_size > 0.0 {
            summary.uncertainty /= summary.sample_size;
            summary.uncertainty += summary.sample_size.log2();
        }
        summary
    }
}

/// A dense joint frequency table over `arity` variables with `bins` symbols each.
///
/// Cells are numbered in mixed radix with the first variable least significant, so the cell for
/// symbols `(s0, s1, s2)` is `s0 + bins * s1 + bins² * s2`.
#[derive(Clone, Default, PartialEq)]
pub struct ContingencyTable {
    counts: Vec<u64>,
    bins: usize,
    arity: usize,
}

impl fmt::Debug for ContingencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.counts.iter().enumerate().filter(|(_, &c)| c > 0))
            .finish()
    }
}

impl ContingencyTable {
    /// Creates an empty table. Counters size it as needed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resizes the table for `arity` variables of `bins` symbols, with every cell zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the table would be unreasonably large.
    pub fn reset(&mut self, bins: usize, arity: usize) -> Result<()> {
        let cells = u32::try_from(arity)
            .ok()
            .and_then(|arity| bins.checked_pow(arity))
            .filter(|&cells| cells <= MAX_CELLS)
            .ok_or_else(|| {
                Error::config(format!(
                    "a table over {} variables of {} bins is too large",
                    arity, bins
                ))
            })?;
        self.counts.clear();
        self.counts.resize(cells, 0);
        self.bins = bins;
        self.arity = arity;
        Ok(())
    }

    /// The count in every cell.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// The count for one combination of symbols, given in variable order.
    ///
    /// # Panics
    ///
    /// Panics if the number of symbols is not the table's arity, or any symbol is out of range.
    pub fn get(&self, symbols: &[Symbol]) -> u64 {
        assert_eq!(symbols.len(), self.arity);
        let cell = symbols.iter().rev().fold(0, |cell, &s| {
            assert!(s >= 0 && (s as usize) < self.bins);
            cell * self.bins + s as usize
        });
        self.counts[cell]
    }

    /// The number of samples counted, which excludes samples with a missing symbol.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Symbols per variable.
    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Number of variables.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Compute a [`TableSummary`] over the current contents of this table.
    ///
    /// ```
    /// use mist::counter::{ContingencyTable, Counter, VectorCounter};
    /// use mist::{DataMatrix, Order};
    ///
    /// let data = DataMatrix::from_vec(vec![0, 1, 0, 1, 0, 0, 1, 1], 2, 4, Order::RowMajor).unwrap();
    /// let mut table = ContingencyTable::new();
    ///
    /// VectorCounter.count(&data, &[0], &mut table).unwrap();
    /// assert_eq!(table.summary().uncertainty, 1.0);
    ///
    /// VectorCounter.count(&data, &[0, 1], &mut table).unwrap();
    /// assert_eq!(table.summary().uncertainty, 2.0);
    /// assert_eq!(table.summary().sample_size, 4.0);
    /// ```
    pub fn summary(&self) -> TableSummary {
        self.counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| c as f64)
            .collect()
    }
}

/// A strategy for filling a [`ContingencyTable`] from a [`DataMatrix`].
///
/// Samples where any of the tuple's variables is missing are left out of the table.
pub trait Counter: Send + Sync {
    /// Replaces the contents of `table` with the joint frequencies of the given variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if one of the variables has a symbol that is not less than the
    /// matrix's bin count.
    fn count(&self, data: &DataMatrix<'_>, tuple: &[usize], table: &mut ContingencyTable)
        -> Result<()>;
}

/// Counts by walking every sample and computing its cell directly. The cost is proportional to
/// the number of samples, whatever the bin count.
#[derive(Clone, Copy, Debug, Default)]
pub struct VectorCounter;

impl Counter for VectorCounter {
    fn count(
        &self,
        data: &DataMatrix<'_>,
        tuple: &[usize],
        table: &mut ContingencyTable,
    ) -> Result<()> {
        let bins = data.bins();
        table.reset(bins, tuple.len())?;
        let views: SmallVec<[VariableView<'_>; 4]> =
            tuple.iter().map(|&v| data.variable(v)).collect();

        for sample in 0..data.nsamples() {
            let mut cell = 0;
            let mut radix = 1;
            let mut missing = false;
            for (view, &variable) in views.iter().zip(tuple) {
                let symbol = view.get(sample);
                if symbol < 0 {
                    // keep checking the rest of the sample's symbols
                    missing = true;
                    continue;
                }
                if symbol as usize >= bins {
                    return Err(Error::Domain {
                        variable,
                        sample,
                        symbol,
                        bins,
                    });
                }
                cell += symbol as usize * radix;
                radix *= bins;
            }
            if !missing {
                table.counts[cell] += 1;
            }
        }
        Ok(())
    }
}

/// Counts by intersecting per-symbol sample masks.
///
/// Construction records, for every variable and symbol, the set of samples where that variable
/// takes that symbol. A cell's count is then the size of the intersection of one mask per
/// variable, computed a word at a time. Combinations whose partial intersection is already empty
/// are skipped, which is what makes this pay off when the bin count is large.
pub struct BitsetCounter {
    masks: Vec<Vec<BitVec<u64, Lsb0>>>,
    bins: usize,
    nsamples: usize,
}

impl fmt::Debug for BitsetCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitsetCounter")
            .field("nvars", &self.masks.len())
            .field("bins", &self.bins)
            .field("nsamples", &self.nsamples)
            .finish()
    }
}

impl BitsetCounter {
    /// Builds the sample masks for every variable of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Domain`] if any symbol is not less than the bin count.
    pub fn new(data: &DataMatrix<'_>) -> Result<Self> {
        let bins = data.bins();
        let nsamples = data.nsamples();
        let masks = (0..data.nvars())
            .map(|variable| {
                let mut masks = vec![bitvec![u64, Lsb0; 0; nsamples]; bins];
                for (sample, symbol) in data.variable(variable).iter().enumerate() {
                    if symbol < 0 {
                        continue;
                    }
                    match masks.get_mut(symbol as usize) {
                        Some(mask) => mask.set(sample, true),
                        None => {
                            return Err(Error::Domain {
                                variable,
                                sample,
                                symbol,
                                bins,
                            })
                        }
                    }
                }
                Ok(masks)
            })
            .collect::<Result<_>>()?;
        Ok(BitsetCounter {
            masks,
            bins,
            nsamples,
        })
    }

    fn intersect(
        &self,
        tuple: &[usize],
        prefix: Option<&[u64]>,
        scratch: &mut [Vec<u64>],
        cell: usize,
        radix: usize,
        counts: &mut [u64],
    ) {
        let (&variable, rest) = match tuple.split_first() {
            Some(split) => split,
            None => return,
        };
        for (symbol, mask) in self.masks[variable].iter().enumerate() {
            let mask = mask.as_raw_slice();
            let cell = cell + symbol * radix;
            if rest.is_empty() {
                counts[cell] = match prefix {
                    Some(prefix) => prefix
                        .iter()
                        .zip(mask)
                        .map(|(a, b)| u64::from((a & b).count_ones()))
                        .sum(),
                    None => mask.iter().map(|w| u64::from(w.count_ones())).sum(),
                };
                continue;
            }

            let (current, deeper) = match scratch.split_first_mut() {
                Some(split) => split,
                None => return,
            };
            match prefix {
                Some(prefix) => {
                    for (out, (a, b)) in current.iter_mut().zip(prefix.iter().zip(mask)) {
                        *out = a & b;
                    }
                }
                None => current.copy_from_slice(mask),
            }
            if current.iter().all(|&w| w == 0) {
                continue;
            }
            self.intersect(rest, Some(&current[..]), deeper, cell, radix * self.bins, counts);
        }
    }
}

impl Counter for BitsetCounter {
    fn count(
        &self,
        data: &DataMatrix<'_>,
        tuple: &[usize],
        table: &mut ContingencyTable,
    ) -> Result<()> {
        if data.nvars() != self.masks.len() || data.nsamples() != self.nsamples {
            return Err(Error::config(
                "bitset counter was built for a different data matrix",
            ));
        }
        table.reset(self.bins, tuple.len())?;
        let words = (self.nsamples + 63) / 64;
        let mut scratch = vec![vec![0u64; words]; tuple.len().saturating_sub(1)];
        self.intersect(tuple, None, &mut scratch, 0, 1, &mut table.counts);
        Ok(())
    }
}

/// Which [`Counter`] a search uses.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ProbabilityAlgorithm {
    /// [`VectorCounter`].
    #[default]
    Vector,
    /// [`BitsetCounter`].
    Bitset,
}

impl ProbabilityAlgorithm {
    /// Prepares a counter of this kind for `data`.
    pub fn counter(self, data: &DataMatrix<'_>) -> Result<Box<dyn Counter>> {
        Ok(match self {
            ProbabilityAlgorithm::Vector => Box::new(VectorCounter),
            ProbabilityAlgorithm::Bitset => Box::new(BitsetCounter::new(data)?),
        })
    }

    /// The name accepted by [`str::parse`].
    pub fn name(self) -> &'static str {
        match self {
            ProbabilityAlgorithm::Vector => "vector",
            ProbabilityAlgorithm::Bitset => "bitset",
        }
    }
}

impl FromStr for ProbabilityAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vector" => Ok(ProbabilityAlgorithm::Vector),
            "bitset" => Ok(ProbabilityAlgorithm::Bitset),
            _ => Err(Error::config(format!(
                "unknown probability algorithm {:?}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Order;

    fn both(data: &DataMatrix<'_>, tuple: &[usize]) -> (ContingencyTable, ContingencyTable) {
        let mut vector = ContingencyTable::new();
        VectorCounter.count(data, tuple, &mut vector).unwrap();
        let mut bitset = ContingencyTable::new();
        BitsetCounter::new(data)
            .unwrap()
            .count(data, tuple, &mut bitset)
            .unwrap();
        (vector, bitset)
    }

    #[test]
    fn cells_are_mixed_radix() {
        // variable 0: 0 1 2 2, variable 1: 1 1 0 1
        let data =
            DataMatrix::from_vec(vec![0, 1, 2, 2, 1, 1, 0, 1], 2, 4, Order::RowMajor).unwrap();
        let (vector, bitset) = both(&data, &[0, 1]);
        assert_eq!(vector, bitset);
        assert_eq!(vector.total(), 4);
        assert_eq!(vector.get(&[0, 1]), 1);
        assert_eq!(vector.get(&[2, 1]), 1);
        assert_eq!(vector.get(&[2, 0]), 1);
        assert_eq!(vector.counts()[1 + 3], 1);

        let (reversed, _) = both(&data, &[1, 0]);
        assert_eq!(reversed.get(&[1, 0]), 1);
        assert_eq!(reversed.summary(), vector.summary());
    }

    #[test]
    fn counters_agree_on_random_data() {
        for (order, seed) in [(Order::RowMajor, 3), (Order::ColumnMajor, 4)] {
            let data = DataMatrix::random_seeded(5, 300, 7, seed)
                .unwrap()
                .to_order(order);
            for tuple in [&[2][..], &[0, 4], &[3, 1, 2]] {
                let (vector, bitset) = both(&data, tuple);
                assert_eq!(vector, bitset, "{:?}", tuple);
                assert_eq!(vector.total(), 300);
            }
        }
    }

    #[test]
    fn missing_samples_are_excluded() {
        let data =
            DataMatrix::from_vec(vec![0, -1, 1, 1, 1, 0, -1, 0], 2, 4, Order::RowMajor).unwrap();
        let (vector, bitset) = both(&data, &[0, 1]);
        assert_eq!(vector, bitset);
        assert_eq!(vector.total(), 2);
        assert_eq!(vector.get(&[0, 1]), 1);
        assert_eq!(vector.get(&[1, 0]), 1);

        let (single, _) = both(&data, &[0]);
        assert_eq!(single.total(), 3);
    }

    #[test]
    fn out_of_range_symbols_are_domain_errors() {
        let raw = [0i8, 1, 5, 1];
        let buffer = crate::data::Buffer {
            elements: crate::data::Elements::I8(&raw),
            shape: (2, 2),
            layout: crate::data::Layout::C,
        };
        let data = DataMatrix::from_buffer(buffer, Order::RowMajor, 2).unwrap();
        let mut table = ContingencyTable::new();
        VectorCounter.count(&data, &[0], &mut table).unwrap();
        let err = VectorCounter.count(&data, &[0, 1], &mut table).unwrap_err();
        assert!(matches!(
            err,
            Error::Domain {
                variable: 1,
                sample: 0,
                symbol: 5,
                bins: 2
            }
        ));
        assert!(matches!(BitsetCounter::new(&data), Err(Error::Domain { .. })));
    }

    #[test]
    fn missing_values_do_not_hide_domain_errors() {
        // sample 0 is missing variable 0 but has an out-of-range variable 1
        let raw = [-1i8, 0, 5, 0];
        let buffer = crate::data::Buffer {
            elements: crate::data::Elements::I8(&raw),
            shape: (2, 2),
            layout: crate::data::Layout::C,
        };
        let data = DataMatrix::from_buffer(buffer, Order::RowMajor, 2).unwrap();
        let expected = |err: &Error| {
            matches!(
                err,
                Error::Domain {
                    variable: 1,
                    sample: 0,
                    symbol: 5,
                    bins: 2
                }
            )
        };

        let mut table = ContingencyTable::new();
        let err = VectorCounter.count(&data, &[0, 1], &mut table).unwrap_err();
        assert!(expected(&err), "{:?}", err);
        let err = BitsetCounter::new(&data).unwrap_err();
        assert!(expected(&err), "{:?}", err);
    }

    #[test]
    fn summary_ignores_empty_cells() {
        let summary: TableSummary = vec![2.0, 2.0].into_iter().collect();
        assert_eq!(summary.uncertainty, 1.0);
        let empty: TableSummary = std::iter::empty().collect();
        assert_eq!(empty.uncertainty, 0.0);
        assert_eq!(empty.sample_size, 0.0);
    }

    #[test]
    fn algorithms_parse() {
        assert_eq!(
            "Bitset".parse::<ProbabilityAlgorithm>().unwrap(),
            ProbabilityAlgorithm::Bitset
        );
        assert_eq!(
            "vector".parse::<ProbabilityAlgorithm>().unwrap(),
            ProbabilityAlgorithm::Vector
        );
        assert!("dense".parse::<ProbabilityAlgorithm>().is_err());
    }
}
