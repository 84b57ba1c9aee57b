//! Evaluating a measure over every tuple of a space.
//!
//! A search is described by an immutable [`SearchConfig`] and run by [`start`], which can be
//! called any number of times with the same configuration and returns the same records each time.
//! Work is divided at two levels. Independent processes each own a [`Partition`] of the
//! enumeration order, and within a process that range is cut into one chunk per thread before
//! anything runs. Each tuple is evaluated exactly once, and results come back in enumeration
//! order.

use crate::cache::{CachePolicy, CacheStats, EntropyCaches};
use crate::counter::ProbabilityAlgorithm;
use crate::measure::{EntropyCalculator, Measure, MeasureKind};
use crate::space::{binomial, split, Partition, TupleSpace};
use crate::{DataMatrix, Error, Result, Tuple};
use rayon::prelude::*;
use std::io::Write;
use std::mem::size_of;
use std::ops::Range;
use std::thread;
use tracing::{debug, info, warn};

/// Settings for the sub-tuple entropy caches.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheConfig {
    /// Whether to cache at all. Results are the same either way.
    pub enabled: bool,
    /// How full caches make room.
    pub policy: CachePolicy,
    /// Entries per sub-tuple size. By default there is room for every sub-tuple of that size,
    /// within `max_bytes`.
    pub capacity: Option<usize>,
    /// Approximate memory budget shared by all the caches of one search, 256 MiB by default.
    ///
    /// A [`CachePolicy::Flat`] cache allocates all of its slots before the first tuple is
    /// evaluated, so with many variables a search claims this whole budget up front.
    pub max_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            policy: CachePolicy::Flat,
            capacity: None,
            max_bytes: 256 << 20,
        }
    }
}

/// A complete, validated description of a search.
///
/// ```
/// use mist::{MeasureKind, ProbabilityAlgorithm, SearchConfig};
///
/// let config = SearchConfig::builder()
///     .tuple_size(3)
///     .measure(MeasureKind::SymmetricDelta)
///     .probability_algorithm(ProbabilityAlgorithm::Bitset)
///     .cutoff(0.05)
///     .threads(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.tuple_size(), 3);
///
/// // SymmetricDelta is only defined for pairs and triples
/// assert!(SearchConfig::builder().tuple_size(4).build().is_err());
/// ```
#[derive(Debug)]
pub struct SearchConfig {
    tuple_size: usize,
    measure: MeasureKind,
    probability_algorithm: ProbabilityAlgorithm,
    cache: CacheConfig,
    cutoff: Option<f64>,
    threads: usize,
    partition: Partition,
    tuple_space: Option<TupleSpace>,
    tuple_limit: Option<u64>,
    output_intermediate: bool,
}

impl SearchConfig {
    /// Starts describing a search; every setting has a default.
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Variables per tuple.
    pub fn tuple_size(&self) -> usize {
        self.tuple_size
    }

    /// The measure evaluated for each tuple.
    pub fn measure(&self) -> MeasureKind {
        self.measure
    }

    /// How contingency tables are counted.
    pub fn probability_algorithm(&self) -> ProbabilityAlgorithm {
        self.probability_algorithm
    }

    /// Sub-tuple cache settings.
    pub fn cache(&self) -> &CacheConfig {
        &self.cache
    }

    /// The smallest value kept in the results, if any.
    pub fn cutoff(&self) -> Option<f64> {
        self.cutoff
    }

    /// Worker threads per search.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// The ranks this invocation owns.
    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// The explicit tuple space, if one was given.
    pub fn tuple_space(&self) -> Option<&TupleSpace> {
        self.tuple_space.as_ref()
    }

    /// The most tuples, counted from the start of the enumeration, the whole run considers.
    pub fn tuple_limit(&self) -> Option<u64> {
        self.tuple_limit
    }

    /// Whether records carry the measure's intermediate quantities.
    pub fn output_intermediate(&self) -> bool {
        self.output_intermediate
    }
}

/// Builder for [`SearchConfig`].
#[derive(Debug, Default)]
pub struct SearchConfigBuilder {
    tuple_size: Option<usize>,
    measure: MeasureKind,
    probability_algorithm: ProbabilityAlgorithm,
    cache: CacheConfig,
    cutoff: Option<f64>,
    threads: Option<usize>,
    ranks: Option<usize>,
    total_ranks: Option<usize>,
    start_rank: Option<usize>,
    tuple_space: Option<TupleSpace>,
    tuple_limit: Option<u64>,
    output_intermediate: bool,
}

impl SearchConfigBuilder {
    /// Variables per tuple; 2 unless a tuple space says otherwise.
    pub fn tuple_size(mut self, tuple_size: usize) -> Self {
        self.tuple_size = Some(tuple_size);
        self
    }

    /// The measure to evaluate.
    pub fn measure(mut self, measure: MeasureKind) -> Self {
        self.measure = measure;
        self
    }

    /// The counting strategy.
    pub fn probability_algorithm(mut self, algorithm: ProbabilityAlgorithm) -> Self {
        self.probability_algorithm = algorithm;
        self
    }

    /// All cache settings at once.
    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Turns sub-tuple caching on or off.
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache.enabled = enabled;
        self
    }

    /// Keep only records whose value is at least `cutoff`.
    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    /// Worker threads; zero means one per available CPU, which is also the default.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// How many consecutive ranks this invocation evaluates.
    pub fn ranks(mut self, ranks: usize) -> Self {
        self.ranks = Some(ranks);
        self
    }

    /// How many ranks the whole run is divided into.
    pub fn total_ranks(mut self, total_ranks: usize) -> Self {
        self.total_ranks = Some(total_ranks);
        self
    }

    /// The first rank this invocation evaluates.
    pub fn start_rank(mut self, start_rank: usize) -> Self {
        self.start_rank = Some(start_rank);
        self
    }

    /// Searches this space instead of every combination of `tuple_size` variables.
    pub fn tuple_space(mut self, space: TupleSpace) -> Self {
        self.tuple_space = Some(space);
        self
    }

    /// Considers only the first `limit` tuples of the enumeration, before dividing it into ranks.
    pub fn tuple_limit(mut self, limit: u64) -> Self {
        self.tuple_limit = Some(limit);
        self
    }

    /// Also report the entropies and information terms each value was computed from.
    pub fn output_intermediate(mut self, enabled: bool) -> Self {
        self.output_intermediate = enabled;
        self
    }

    /// Checks the settings against each other.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the tuple size is zero, disagrees with the tuple space, or is
    /// not supported by the measure; if the tuple space has no templates; if the cutoff is NaN; or
    /// if an explicit cache capacity is zero.
    ///
    /// # Panics
    ///
    /// Panics if the rank settings are inconsistent; see [`Partition::new`].
    pub fn build(self) -> Result<SearchConfig> {
        let tuple_size = match &self.tuple_space {
            Some(space) => {
                let arity = space
                    .arity()
                    .ok_or_else(|| Error::config("the tuple space has no templates"))?;
                if let Some(size) = self.tuple_size {
                    if size != arity {
                        return Err(Error::config(format!(
                            "tuple size {} disagrees with the tuple space's arity {}",
                            size, arity
                        )));
                    }
                }
                arity
            }
            None => self.tuple_size.unwrap_or(2),
        };
        if tuple_size == 0 {
            return Err(Error::config("tuple size must be positive"));
        }
        let measure = self.measure.measure();
        if !measure.supports(tuple_size) {
            return Err(Error::config(format!(
                "{} does not support tuples of {} variables",
                measure.name(),
                tuple_size
            )));
        }
        if self.cutoff.map_or(false, f64::is_nan) {
            return Err(Error::config("cutoff must be a number"));
        }
        if self.cache.capacity == Some(0) {
            return Err(Error::config("cache capacity must be positive"));
        }

        let threads = match self.threads {
            Some(threads) if threads > 0 => threads,
            _ => thread::available_parallelism().map_or(1, |n| n.get()),
        };
        let partition = Partition::new(
            self.start_rank.unwrap_or(0),
            self.ranks.unwrap_or(1),
            self.total_ranks.unwrap_or(1),
        );

        Ok(SearchConfig {
            tuple_size,
            measure: self.measure,
            probability_algorithm: self.probability_algorithm,
            cache: self.cache,
            cutoff: self.cutoff,
            threads,
            partition,
            tuple_space: self.tuple_space,
            tuple_limit: self.tuple_limit,
            output_intermediate: self.output_intermediate,
        })
    }
}

/// One evaluated tuple.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRecord {
    /// The variables, in the order the tuple space produced them.
    pub tuple: Tuple,
    /// The measure's value.
    pub value: f64,
    /// The quantities `value` was computed from, named by
    /// [`SearchResults::intermediate_names`]. Empty unless the search asked for them.
    pub intermediates: Vec<f64>,
}

/// The records produced by one call to [`start`].
#[derive(Clone, Debug)]
pub struct SearchResults {
    arity: usize,
    measure: &'static str,
    intermediate_names: &'static [&'static str],
    records: Vec<ResultRecord>,
    cache_stats: Vec<CacheStats>,
}

impl SearchResults {
    /// The number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no tuple was kept.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Variables per tuple.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// The name of the measure, which is also the header of the value column.
    pub fn measure_name(&self) -> &'static str {
        self.measure
    }

    /// The columns between the tuple and the value, when intermediate output was requested.
    pub fn intermediate_names(&self) -> &'static [&'static str] {
        self.intermediate_names
    }

    /// The records, in enumeration order.
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    /// Takes the records.
    pub fn into_records(self) -> Vec<ResultRecord> {
        self.records
    }

    /// Counters for each sub-tuple cache, smallest sub-tuples first. Empty when caching was off.
    pub fn cache_stats(&self) -> &[CacheStats] {
        &self.cache_stats
    }

    /// The results as a numeric table: the tuple's variables, any intermediate quantities, then
    /// the value.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.records
            .iter()
            .map(|r| {
                r.tuple
                    .iter()
                    .map(|v| v as f64)
                    .chain(r.intermediates.iter().copied())
                    .chain(std::iter::once(r.value))
                    .collect()
            })
            .collect()
    }

    fn write_header<W: Write>(&self, out: &mut W) -> Result<()> {
        for i in 0..self.arity {
            write!(out, "v{},", i)?;
        }
        for name in self.intermediate_names {
            write!(out, "{},", name)?;
        }
        writeln!(out, "{}", self.measure)?;
        Ok(())
    }

    fn write_tuple<W: Write>(out: &mut W, tuple: &Tuple) -> Result<()> {
        for v in tuple.iter() {
            write!(out, "{},", v)?;
        }
        Ok(())
    }

    /// Writes a header and one line per record, with values in the shortest form that parses
    /// back to the same number.
    ///
    /// ```
    /// use mist::{search, DataMatrix, Order, SearchConfig};
    ///
    /// let data = DataMatrix::from_vec(vec![0, 1, 0, 1, 0, 1, 0, 1], 2, 4, Order::RowMajor).unwrap();
    /// let results = search::start(&SearchConfig::builder().build().unwrap(), &data).unwrap();
    /// let mut out = Vec::new();
    /// results.write_csv(&mut out).unwrap();
    /// assert_eq!(String::from_utf8(out).unwrap(), "v0,v1,SymmetricDelta\n0,1,1\n");
    /// ```
    pub fn write_csv<W: Write>(&self, mut out: W) -> Result<()> {
        self.write_header(&mut out)?;
        for record in &self.records {
            Self::write_tuple(&mut out, &record.tuple)?;
            for x in &record.intermediates {
                write!(out, "{},", x)?;
            }
            writeln!(out, "{}", record.value)?;
        }
        Ok(())
    }

    /// Writes a header and the records whose value is at least `threshold`, with values rounded
    /// to `precision` decimal places.
    pub fn write_thresholded<W: Write>(
        &self,
        mut out: W,
        threshold: f64,
        precision: usize,
    ) -> Result<()> {
        self.write_header(&mut out)?;
        for record in self.records.iter().filter(|r| r.value >= threshold) {
            Self::write_tuple(&mut out, &record.tuple)?;
            for x in &record.intermediates {
                write!(out, "{:.*},", precision, x)?;
            }
            writeln!(out, "{:.*}", precision, record.value)?;
        }
        Ok(())
    }
}

fn entropy_caches(
    config: &CacheConfig,
    measure: &dyn Measure,
    nvars: usize,
    arity: usize,
) -> Result<EntropyCaches> {
    if !config.enabled || !measure.uses_subtuples() {
        return Ok(EntropyCaches::disabled());
    }
    let levels = arity.saturating_sub(1).min(2);
    if levels == 0 {
        return Ok(EntropyCaches::disabled());
    }
    let entry_bytes = size_of::<parking_lot::Mutex<Option<(Tuple, f64)>>>();
    let limit = (config.max_bytes / levels / entry_bytes).max(1);
    let capacities: Vec<usize> = (1..=levels)
        .map(|size| {
            let wanted = config
                .capacity
                .unwrap_or_else(|| usize::try_from(binomial(nvars, size)).unwrap_or(usize::MAX));
            if wanted > limit {
                warn!(
                    size,
                    wanted, limit, "sub-tuple cache clamped to fit its memory budget"
                );
            }
            wanted.min(limit).max(1)
        })
        .collect();
    debug!(?capacities, policy = ?config.policy, "sub-tuple caches");
    EntropyCaches::new(config.policy, &capacities)
}

/// Evaluates the configured measure over this invocation's share of the tuple space.
///
/// ```
/// use mist::{search, DataMatrix, SearchConfig};
///
/// let data = DataMatrix::random_seeded(10, 100, 4, 1).unwrap();
/// let all = search::start(&SearchConfig::builder().build().unwrap(), &data).unwrap();
/// assert_eq!(all.len(), 45);
///
/// let config = SearchConfig::builder().start_rank(1).total_ranks(2).build().unwrap();
/// let second_half = search::start(&config, &data).unwrap();
/// assert_eq!(second_half.records(), &all.records()[22..]);
/// ```
///
/// # Errors
///
/// Returns [`Error::Config`] if an explicit tuple space covers a different number of variables
/// than `data`, and [`Error::Domain`] if `data` holds a symbol outside its bin count. Any error
/// in any worker abandons the whole search.
pub fn start(config: &SearchConfig, data: &DataMatrix<'_>) -> Result<SearchResults> {
    let universal;
    let space = match &config.tuple_space {
        Some(space) => {
            if space.nvars() != data.nvars() {
                return Err(Error::config(format!(
                    "the tuple space covers {} variables but the data has {}",
                    space.nvars(),
                    data.nvars()
                )));
            }
            space
        }
        None => {
            universal = TupleSpace::all_combinations(data.nvars(), config.tuple_size)?;
            &universal
        }
    };

    let count = space.count_tuples();
    let limited = config.tuple_limit.map_or(count, |limit| count.min(limit));
    let range = config.partition.range(limited);
    let parts = (config.threads as u64).min(range.end - range.start).max(1);
    let chunks: Vec<Range<u64>> = (0..parts).map(|i| split(range.clone(), parts, i)).collect();

    info!(
        tuples = range.end - range.start,
        of = count,
        measure = config.measure.measure().name(),
        algorithm = config.probability_algorithm.name(),
        threads = config.threads,
        "starting search"
    );
    debug!(?range, ?chunks, partition = ?config.partition, "work layout");

    let measure = config.measure.measure();
    let counter = config.probability_algorithm.counter(data)?;
    let caches = entropy_caches(&config.cache, measure, data.nvars(), config.tuple_size)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;

    let counter = &*counter;
    let caches_ref = &caches;
    let shape = space.shape();
    let cutoff = config.cutoff;
    let intermediate = config.output_intermediate;
    let chunk_records = pool.install(|| {
        chunks
            .par_iter()
            .map(|chunk| {
                let mut calc = EntropyCalculator::new(data, counter, caches_ref);
                let mut records = Vec::new();
                for tuple in shape.tuples_in(chunk.clone()) {
                    let mut intermediates = Vec::new();
                    let value = if intermediate {
                        measure.evaluate_with_intermediates(&mut calc, &tuple, &mut intermediates)?
                    } else {
                        measure.evaluate(&mut calc, &tuple)?
                    };
                    if cutoff.map_or(true, |c| value >= c) {
                        records.push(ResultRecord {
                            tuple,
                            value,
                            intermediates,
                        });
                    }
                }
                Ok(records)
            })
            .collect::<Result<Vec<Vec<ResultRecord>>>>()
    })?;

    let records: Vec<ResultRecord> = chunk_records.into_iter().flatten().collect();
    let cache_stats = caches.stats();
    for (level, stats) in cache_stats.iter().enumerate() {
        debug!(
            size = level + 1,
            hits = stats.hits,
            misses = stats.misses,
            evictions = stats.evictions,
            hit_rate = stats.hit_rate(),
            "sub-tuple cache"
        );
    }
    info!(records = records.len(), "search finished");

    Ok(SearchResults {
        arity: config.tuple_size,
        measure: measure.name(),
        intermediate_names: if intermediate {
            measure.intermediate_names(config.tuple_size)
        } else {
            &[]
        },
        records,
        cache_stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GroupTuple, Order};

    #[test]
    fn builder_defaults() {
        let config = SearchConfig::builder().build().unwrap();
        assert_eq!(config.tuple_size(), 2);
        assert_eq!(config.measure(), MeasureKind::SymmetricDelta);
        assert_eq!(config.probability_algorithm(), ProbabilityAlgorithm::Vector);
        assert!(config.cache().enabled);
        assert_eq!(config.cache().policy, CachePolicy::Flat);
        assert_eq!(config.cutoff(), None);
        assert!(config.threads() >= 1);
        assert_eq!(config.partition(), Partition::new(0, 1, 1));
        assert!(config.tuple_space().is_none());
    }

    #[test]
    fn builder_checks_arity() {
        let space = TupleSpace::all_combinations(5, 3).unwrap();
        let config = SearchConfig::builder().tuple_space(space).build().unwrap();
        assert_eq!(config.tuple_size(), 3);

        let space = TupleSpace::all_combinations(5, 3).unwrap();
        assert!(SearchConfig::builder()
            .tuple_size(2)
            .tuple_space(space)
            .build()
            .is_err());

        let empty = TupleSpace::new(5).unwrap();
        assert!(SearchConfig::builder().tuple_space(empty).build().is_err());

        assert!(SearchConfig::builder().tuple_size(0).build().is_err());
        assert!(SearchConfig::builder()
            .tuple_size(1)
            .measure(MeasureKind::JointEntropy)
            .build()
            .is_ok());
        assert!(SearchConfig::builder().cutoff(f64::NAN).build().is_err());
    }

    #[test]
    #[should_panic]
    fn builder_rejects_bad_ranks() {
        let _ = SearchConfig::builder().start_rank(3).total_ranks(3).build();
    }

    #[test]
    fn space_must_match_data() {
        let data = DataMatrix::random_seeded(4, 10, 2, 0).unwrap();
        let space = TupleSpace::all_combinations(5, 2).unwrap();
        let config = SearchConfig::builder().tuple_space(space).build().unwrap();
        assert!(matches!(start(&config, &data), Err(Error::Config(_))));
    }

    #[test]
    fn tuple_limit_truncates_before_partitioning() {
        let data = DataMatrix::random_seeded(8, 50, 3, 5).unwrap();
        let all = start(&SearchConfig::builder().build().unwrap(), &data).unwrap();
        let config = SearchConfig::builder()
            .tuple_limit(10)
            .start_rank(1)
            .total_ranks(2)
            .build()
            .unwrap();
        let limited = start(&config, &data).unwrap();
        assert_eq!(limited.records(), &all.records()[5..10]);
    }

    #[test]
    fn flat_caches_stay_within_budget() {
        assert_eq!(CacheConfig::default().max_bytes, 256 << 20);

        let config = CacheConfig {
            max_bytes: 1 << 16,
            ..CacheConfig::default()
        };
        let measure = MeasureKind::SymmetricDelta.measure();
        let caches = entropy_caches(&config, measure, 20_000, 3).unwrap();
        let entry_bytes = size_of::<parking_lot::Mutex<Option<(Tuple, f64)>>>();
        let total: usize = (1..=2)
            .map(|size| caches.level(size).unwrap().capacity() * entry_bytes)
            .sum();
        assert!(total <= config.max_bytes, "{} bytes", total);
    }

    #[test]
    fn cache_statistics_are_reported() {
        let data = DataMatrix::random_seeded(6, 40, 3, 9).unwrap();
        let config = SearchConfig::builder()
            .tuple_size(3)
            .threads(1)
            .cache(CacheConfig {
                policy: CachePolicy::Replacing,
                ..CacheConfig::default()
            })
            .build()
            .unwrap();
        let results = start(&config, &data).unwrap();
        assert_eq!(results.len(), 20);
        let stats = results.cache_stats();
        assert_eq!(stats.len(), 2);
        // 6 singles and 15 pairs, each counted once
        assert_eq!(stats[0].misses, 6);
        assert_eq!(stats[1].misses, 15);
        assert_eq!(stats[0].hits, 20 * 3 - 6);
        assert_eq!(stats[1].hits, 20 * 3 - 15);

        let uncached = SearchConfig::builder()
            .tuple_size(3)
            .cache_enabled(false)
            .build()
            .unwrap();
        let plain = start(&uncached, &data).unwrap();
        assert!(plain.cache_stats().is_empty());
        assert_eq!(plain.records(), results.records());
    }

    #[test]
    fn cross_product_tuples_keep_their_order() {
        let data = DataMatrix::random_seeded(4, 30, 2, 2).unwrap();
        let mut space = TupleSpace::new(4).unwrap();
        space.add_variable_group("late", &[3]).unwrap();
        space
            .add_variable_group_tuple(GroupTuple::CrossProduct(vec![
                "late".into(),
                crate::GroupRef::All,
            ]))
            .unwrap();
        let config = SearchConfig::builder()
            .tuple_space(space)
            .measure(MeasureKind::JointEntropy)
            .build()
            .unwrap();
        let results = start(&config, &data).unwrap();
        let tuples: Vec<_> = results
            .records()
            .iter()
            .map(|r| r.tuple.as_slice().to_vec())
            .collect();
        assert_eq!(tuples, [[3, 0], [3, 1], [3, 2], [3, 3]]);
    }

    #[test]
    fn intermediate_columns_sit_between_tuple_and_value() {
        let data =
            DataMatrix::from_vec(vec![0, 1, 0, 1, 0, 1, 0, 1], 2, 4, Order::RowMajor).unwrap();
        let config = SearchConfig::builder()
            .output_intermediate(true)
            .build()
            .unwrap();
        assert!(config.output_intermediate());
        let results = start(&config, &data).unwrap();
        assert_eq!(
            results.intermediate_names(),
            ["entropy0", "entropy1", "entropy01"]
        );

        let mut out = Vec::new();
        results.write_csv(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "v0,v1,entropy0,entropy1,entropy01,SymmetricDelta\n0,1,1,1,1,1\n"
        );
        let mut out = Vec::new();
        results.write_thresholded(&mut out, 0.5, 1).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "v0,v1,entropy0,entropy1,entropy01,SymmetricDelta\n0,1,1.0,1.0,1.0,1.0\n"
        );
        assert_eq!(results.to_rows(), [vec![0.0, 1.0, 1.0, 1.0, 1.0, 1.0]]);

        // measures without intermediates keep the plain layout
        let config = SearchConfig::builder()
            .measure(MeasureKind::JointEntropy)
            .output_intermediate(true)
            .build()
            .unwrap();
        let results = start(&config, &data).unwrap();
        assert!(results.intermediate_names().is_empty());
        assert_eq!(results.to_rows(), [vec![0.0, 1.0, 1.0]]);
    }

    #[test]
    fn thresholded_output() {
        let data = DataMatrix::from_vec(
            vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 0, 1, 1],
            3,
            4,
            Order::RowMajor,
        )
        .unwrap();
        let results = start(&SearchConfig::builder().build().unwrap(), &data).unwrap();
        let mut out = Vec::new();
        results.write_thresholded(&mut out, 0.5, 3).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "v0,v1,SymmetricDelta\n0,1,1.000\n"
        );
        assert_eq!(
            results.to_rows(),
            [vec![0.0, 1.0, 1.0], vec![0.0, 2.0, 0.0], vec![1.0, 2.0, 0.0]]
        );
    }
}
