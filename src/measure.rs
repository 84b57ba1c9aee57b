//! Dependency measures computed from joint entropies.

use crate::cache::EntropyCaches;
use crate::counter::{ContingencyTable, Counter};
use crate::{DataMatrix, Error, Result, Tuple};
use std::fmt;
use std::str::FromStr;

/// Computes joint entropies for one worker of a search.
///
/// Each worker owns a calculator, with its own scratch table, while the data, the counter and the
/// caches are shared. Entropies are always computed over the variables in ascending order, so a
/// value is the same whether or not it came from a cache.
pub struct EntropyCalculator<'a, 'd> {
    data: &'a DataMatrix<'d>,
    counter: &'a dyn Counter,
    caches: &'a EntropyCaches,
    table: ContingencyTable,
}

impl fmt::Debug for EntropyCalculator<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntropyCalculator")
            .field("data", self.data)
            .field("caches", self.caches)
            .finish()
    }
}

impl<'a, 'd> EntropyCalculator<'a, 'd> {
    /// Creates a calculator that counts with `counter` and shares `caches`.
    pub fn new(
        data: &'a DataMatrix<'d>,
        counter: &'a dyn Counter,
        caches: &'a EntropyCaches,
    ) -> Self {
        EntropyCalculator {
            data,
            counter,
            caches,
            table: ContingencyTable::new(),
        }
    }

    /// The Shannon entropy, in bits, of the joint distribution of `variables`.
    ///
    /// ```
    /// use mist::cache::EntropyCaches;
    /// use mist::{DataMatrix, EntropyCalculator, Order, VectorCounter};
    ///
    /// let data = DataMatrix::from_vec(vec![0, 0, 1, 1, 0, 1, 0, 1], 2, 4, Order::RowMajor).unwrap();
    /// let caches = EntropyCaches::disabled();
    /// let mut calc = EntropyCalculator::new(&data, &VectorCounter, &caches);
    /// assert_eq!(calc.entropy(&[0]).unwrap(), 1.0);
    /// assert_eq!(calc.entropy(&[1, 0]).unwrap(), 2.0);
    /// ```
    pub fn entropy(&mut self, variables: &[usize]) -> Result<f64> {
        let key = Tuple::new(variables).canonical();
        match self.caches.level(key.len()) {
            Some(cache) => {
                if let Some(entropy) = cache.get(&key) {
                    return Ok(entropy);
                }
                let entropy = self.count(key.as_slice())?;
                cache.insert(key, entropy);
                Ok(entropy)
            }
            None => self.count(key.as_slice()),
        }
    }

    fn count(&mut self, variables: &[usize]) -> Result<f64> {
        self.counter.count(self.data, variables, &mut self.table)?;
        Ok(self.table.summary().uncertainty)
    }
}

/// A statistic computed for each tuple of a search.
pub trait Measure: Send + Sync {
    /// The column name used for this measure in result tables.
    fn name(&self) -> &'static str;

    /// Whether the measure is defined for tuples of `arity` variables.
    fn supports(&self, arity: usize) -> bool;

    /// Whether the measure looks at proper sub-tuples, which makes caching their entropies
    /// worthwhile.
    fn uses_subtuples(&self) -> bool;

    /// Computes the measure for `tuple`.
    fn evaluate(&self, calc: &mut EntropyCalculator<'_, '_>, tuple: &Tuple) -> Result<f64>;

    /// Names of the quantities [`Measure::evaluate_with_intermediates`] reports for tuples of
    /// `arity` variables. Empty for measures with nothing to report.
    fn intermediate_names(&self, _arity: usize) -> &'static [&'static str] {
        &[]
    }

    /// Computes the measure for `tuple`, appending the quantities it was derived from to
    /// `intermediates` in the order of [`Measure::intermediate_names`].
    fn evaluate_with_intermediates(
        &self,
        calc: &mut EntropyCalculator<'_, '_>,
        tuple: &Tuple,
        _intermediates: &mut Vec<f64>,
    ) -> Result<f64> {
        self.evaluate(calc, tuple)
    }
}

static PAIR_INTERMEDIATES: [&str; 3] = ["entropy0", "entropy1", "entropy01"];

static TRIPLE_INTERMEDIATES: [&str; 14] = [
    "entropy0",
    "entropy1",
    "entropy2",
    "entropy01",
    "entropy02",
    "entropy12",
    "entropy012",
    "jointInfo01",
    "jointInfo02",
    "jointInfo12",
    "jointInfo012",
    "diffInfo0",
    "diffInfo1",
    "diffInfo2",
];

/// Mutual information for pairs, and a symmetric three-way interaction score for triples.
///
/// For a pair, this is `H(a) + H(b) - H(a, b)`. For a triple it takes the three-way interaction
/// information `I(a; b; c)` and how much it differs from each pairwise mutual information,
/// `Δa = I(a; b; c) - I(b; c)` and so on, and scores the triple as `-(Δa · Δb · Δc)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymmetricDelta;

impl Measure for SymmetricDelta {
    fn name(&self) -> &'static str {
        "SymmetricDelta"
    }

    fn supports(&self, arity: usize) -> bool {
        arity == 2 || arity == 3
    }

    fn uses_subtuples(&self) -> bool {
        true
    }

    fn evaluate(&self, calc: &mut EntropyCalculator<'_, '_>, tuple: &Tuple) -> Result<f64> {
        self.delta(calc, tuple, None)
    }

    fn intermediate_names(&self, arity: usize) -> &'static [&'static str] {
        match arity {
            2 => &PAIR_INTERMEDIATES,
            3 => &TRIPLE_INTERMEDIATES,
            _ => &[],
        }
    }

    fn evaluate_with_intermediates(
        &self,
        calc: &mut EntropyCalculator<'_, '_>,
        tuple: &Tuple,
        intermediates: &mut Vec<f64>,
    ) -> Result<f64> {
        self.delta(calc, tuple, Some(intermediates))
    }
}

impl SymmetricDelta {
    fn delta(
        &self,
        calc: &mut EntropyCalculator<'_, '_>,
        tuple: &Tuple,
        intermediates: Option<&mut Vec<f64>>,
    ) -> Result<f64> {
        match *tuple.as_slice() {
            [a, b] => {
                let h0 = calc.entropy(&[a])?;
                let h1 = calc.entropy(&[b])?;
                let h01 = calc.entropy(&[a, b])?;
                if let Some(out) = intermediates {
                    out.extend_from_slice(&[h0, h1, h01]);
                }
                Ok(h0 + h1 - h01)
            }
            [a, b, c] => {
                let h0 = calc.entropy(&[a])?;
                let h1 = calc.entropy(&[b])?;
                let h2 = calc.entropy(&[c])?;
                let h01 = calc.entropy(&[a, b])?;
                let h02 = calc.entropy(&[a, c])?;
                let h12 = calc.entropy(&[b, c])?;
                let h012 = calc.entropy(&[a, b, c])?;

                let i01 = h0 + h1 - h01;
                let i02 = h0 + h2 - h02;
                let i12 = h1 + h2 - h12;
                let i012 = h0 + h1 + h2 - h01 - h02 - h12 + h012;

                let (d0, d1, d2) = (i012 - i12, i012 - i02, i012 - i01);
                if let Some(out) = intermediates {
                    out.extend_from_slice(&[
                        h0, h1, h2, h01, h02, h12, h012, i01, i02, i12, i012, d0, d1, d2,
                    ]);
                }
                let product = d0 * d1 * d2;
                Ok(if product == 0.0 { 0.0 } else { -product })
            }
            _ => Err(Error::config(format!(
                "{} is not defined for {} variables",
                self.name(),
                tuple.len()
            ))),
        }
    }
}

/// The joint entropy of the whole tuple.
#[derive(Clone, Copy, Debug, Default)]
pub struct JointEntropy;

impl Measure for JointEntropy {
    fn name(&self) -> &'static str {
        "JointEntropy"
    }

    fn supports(&self, arity: usize) -> bool {
        arity >= 1
    }

    fn uses_subtuples(&self) -> bool {
        false
    }

    fn evaluate(&self, calc: &mut EntropyCalculator<'_, '_>, tuple: &Tuple) -> Result<f64> {
        calc.entropy(tuple.as_slice())
    }
}

/// Selects one of the built-in measures.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MeasureKind {
    /// [`SymmetricDelta`].
    #[default]
    SymmetricDelta,
    /// [`JointEntropy`].
    JointEntropy,
}

impl MeasureKind {
    /// The measure itself.
    pub fn measure(self) -> &'static dyn Measure {
        match self {
            MeasureKind::SymmetricDelta => &SymmetricDelta,
            MeasureKind::JointEntropy => &JointEntropy,
        }
    }
}

impl FromStr for MeasureKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "symmetricdelta" => Ok(MeasureKind::SymmetricDelta),
            "entropy" | "jointentropy" => Ok(MeasureKind::JointEntropy),
            _ => Err(Error::config(format!("unknown measure {:?}", s))),
        }
    }
}
