//! Descriptions of which variable tuples a search evaluates.
//!
//! A [`TupleSpace`] is a set of named variable groups plus an ordered list of tuple templates.
//! Each template draws one variable per position from the group at that position; when a group
//! appears at several positions the variables drawn from it are strictly increasing, so a
//! template like `[A, A]` yields each unordered pair of `A` once. Templates are independent of
//! each other: a tuple two templates can produce is produced twice.
//!
//! The space is never materialized. It is counted in closed form, and any contiguous range of its
//! enumeration order can be generated directly, which is how ranks and threads share it out.

use crate::{Error, Result, Tuple};
use lasso::{Rodeo, Spur};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Range;

/// Identifies a variable group within one [`TupleSpace`].
pub type GroupId = usize;

/// A reference to a variable group, as written in a [`GroupTuple`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GroupRef {
    /// The group registered under this name.
    Name(String),
    /// The group with this id, as returned by [`TupleSpace::add_variable_group`].
    Index(GroupId),
    /// Every variable in the space.
    All,
}

impl From<&str> for GroupRef {
    fn from(name: &str) -> Self {
        GroupRef::Name(name.to_owned())
    }
}

impl From<GroupId> for GroupRef {
    fn from(id: GroupId) -> Self {
        GroupRef::Index(id)
    }
}

/// A tuple template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GroupTuple {
    /// Every combination of `arity` distinct variables from one group.
    Combinations {
        /// The group to draw from.
        group: GroupRef,
        /// How many variables each tuple takes.
        arity: usize,
    },
    /// One variable from each listed group, in order. Groups listed more than once contribute
    /// combinations rather than permutations.
    CrossProduct(Vec<GroupRef>),
}

impl GroupTuple {
    fn arity(&self) -> usize {
        match self {
            GroupTuple::Combinations { arity, .. } => *arity,
            GroupTuple::CrossProduct(groups) => groups.len(),
        }
    }
}

/// Number of ways to choose `k` of `n` items, saturating at `u128::MAX`.
pub(crate) fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k) as u128;
    let n = n as u128;
    let mut result: u128 = 1;
    for i in 0..k {
        result = match result.checked_mul(n - i) {
            Some(r) => r / (i + 1),
            None => return u128::MAX,
        };
    }
    result
}

#[derive(Clone, Debug)]
struct Template {
    groups: SmallVec<[GroupId; 4]>,
    count: u64,
}

/// The part of a [`TupleSpace`] that enumeration needs: group members and resolved templates.
#[derive(Clone, Debug, Default)]
pub(crate) struct SpaceShape {
    groups: Vec<Vec<usize>>,
    templates: Vec<Template>,
}

impl SpaceShape {
    pub(crate) fn count(&self) -> u64 {
        self.templates.iter().map(|t| t.count).sum()
    }

    /// How many ways there are to fill the rest of `template` once its first `fixed.len()`
    /// positions hold the group-local indexes in `fixed`.
    fn completions(&self, template: &[GroupId], fixed: &[usize]) -> u128 {
        let p = fixed.len();
        let mut total: u128 = 1;
        for (q, &g) in template.iter().enumerate().skip(p) {
            if template[p..q].contains(&g) {
                continue;
            }
            let appearances = template[q..].iter().filter(|&&h| h == g).count();
            let start = min_start(template, fixed, q);
            let available = self.groups[g].len().saturating_sub(start);
            total = total.saturating_mul(binomial(available, appearances));
        }
        total
    }

    pub(crate) fn tuples_in(&self, range: Range<u64>) -> Tuples<'_> {
        let end = range.end.min(self.count());
        let start = range.start.min(end);
        let mut tuples = Tuples {
            shape: self,
            template: 0,
            positions: SmallVec::new(),
            remaining: end - start,
        };
        if tuples.remaining > 0 {
            tuples.seek(start);
        }
        tuples
    }
}

/// The smallest group-local index position `q` may hold: one past the previous position drawn
/// from the same group, if any.
fn min_start(template: &[GroupId], positions: &[usize], q: usize) -> usize {
    template[..q]
        .iter()
        .zip(positions)
        .rev()
        .find(|(&h, _)| h == template[q])
        .map_or(0, |(_, &i)| i + 1)
}

/// Variable groups and tuple templates describing the tuples a search should evaluate.
///
/// ```
/// use mist::{GroupTuple, TupleSpace};
///
/// let mut space = TupleSpace::new(6).unwrap();
/// space.add_variable_group("genes", &[0, 1, 2]).unwrap();
/// space.add_variable_group("traits", &[4, 5]).unwrap();
/// space.add_named_group_tuple(&["genes", "traits"]).unwrap();
/// space
///     .add_variable_group_tuple(GroupTuple::Combinations { group: "genes".into(), arity: 2 })
///     .unwrap();
///
/// assert_eq!(space.count_tuples(), 3 * 2 + 3);
/// let tuples: Vec<_> = space.tuples().map(|t| t.as_slice().to_vec()).collect();
/// assert_eq!(tuples[..3], [[0, 4], [0, 5], [1, 4]]);
/// assert_eq!(tuples[6..], [[0, 1], [0, 2], [1, 2]]);
/// ```
pub struct TupleSpace {
    nvars: usize,
    names: Rodeo,
    group_names: Vec<Option<Spur>>,
    all: Option<GroupId>,
    shape: SpaceShape,
}

impl fmt::Debug for TupleSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = |g: GroupId| match self.group_names[g] {
            Some(key) => self.names.resolve(&key),
            None => "*",
        };
        let groups: Vec<_> = (0..self.shape.groups.len())
            .map(|g| (name(g), &self.shape.groups[g]))
            .collect();
        let templates: Vec<Vec<_>> = self
            .shape
            .templates
            .iter()
            .map(|t| t.groups.iter().map(|&g| name(g)).collect())
            .collect();
        f.debug_struct("TupleSpace")
            .field("nvars", &self.nvars)
            .field("groups", &groups)
            .field("templates", &templates)
            .finish()
    }
}

impl TupleSpace {
    /// Creates a space over `nvars` variables with no groups and no templates, and so no tuples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `nvars` is zero.
    pub fn new(nvars: usize) -> Result<Self> {
        if nvars == 0 {
            return Err(Error::config("a tuple space needs at least one variable"));
        }
        Ok(TupleSpace {
            nvars,
            names: Rodeo::new(),
            group_names: Vec::new(),
            all: None,
            shape: SpaceShape::default(),
        })
    }

    /// The space of every combination of `arity` distinct variables out of `nvars`.
    ///
    /// ```
    /// use mist::TupleSpace;
    ///
    /// let space = TupleSpace::all_combinations(100, 2).unwrap();
    /// assert_eq!(space.count_tuples(), 4950);
    /// ```
    pub fn all_combinations(nvars: usize, arity: usize) -> Result<Self> {
        let mut space = TupleSpace::new(nvars)?;
        space.add_variable_group_tuple(GroupTuple::Combinations {
            group: GroupRef::All,
            arity,
        })?;
        Ok(space)
    }

    /// The number of variables tuples are drawn from.
    pub fn nvars(&self) -> usize {
        self.nvars
    }

    /// The number of variables in every tuple, once a template has been registered.
    pub fn arity(&self) -> Option<usize> {
        self.shape.templates.first().map(|t| t.groups.len())
    }

    /// Registers a named group of variables. Duplicate indexes are dropped, and the members are
    /// kept in ascending order, which is the order tuples draw them in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the name is taken, the group is empty, or an index is not a
    /// variable of this space.
    pub fn add_variable_group(&mut self, name: &str, indexes: &[usize]) -> Result<GroupId> {
        if self.names.get(name).is_some() {
            return Err(Error::config(format!("group {:?} is already defined", name)));
        }
        if indexes.is_empty() {
            return Err(Error::config(format!("group {:?} is empty", name)));
        }
        if let Some(&bad) = indexes.iter().find(|&&i| i >= self.nvars) {
            return Err(Error::config(format!(
                "group {:?} names variable {}, but there are only {}",
                name, bad, self.nvars
            )));
        }
        let mut members = indexes.to_vec();
        members.sort_unstable();
        members.dedup();
        let key = self.names.get_or_intern(name);
        Ok(self.push_group(Some(key), members))
    }

    fn push_group(&mut self, name: Option<Spur>, members: Vec<usize>) -> GroupId {
        self.group_names.push(name);
        self.shape.groups.push(members);
        self.shape.groups.len() - 1
    }

    /// The members of the named group.
    pub fn group(&self, name: &str) -> Option<&[usize]> {
        self.group_id(name).map(|g| &self.shape.groups[g][..])
    }

    fn group_id(&self, name: &str) -> Option<GroupId> {
        let key = self.names.get(name)?;
        self.group_names.iter().position(|&n| n == Some(key))
    }

    /// Iterates over the named groups and their members, in registration order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[usize])> + '_ {
        self.group_names
            .iter()
            .zip(&self.shape.groups)
            .filter_map(move |(name, members)| {
                name.map(|key| (self.names.resolve(&key), &members[..]))
            })
    }

    /// The id `group` refers to. The universal group gets the next free id until a template
    /// that uses it is accepted.
    fn resolve(&self, group: &GroupRef) -> Result<GroupId> {
        match group {
            GroupRef::Name(name) => self
                .group_id(name)
                .ok_or_else(|| Error::config(format!("group {:?} is not defined", name))),
            GroupRef::Index(id) if *id < self.shape.groups.len() => Ok(*id),
            GroupRef::Index(id) => Err(Error::config(format!("group {} is not defined", id))),
            GroupRef::All => Ok(self.all.unwrap_or(self.shape.groups.len())),
        }
    }

    /// Registers a tuple template. Templates are enumerated in the order they're registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the template has no positions, refers to a group that isn't
    /// defined, has a different arity than templates registered before it, or would make the
    /// space too large to count.
    pub fn add_variable_group_tuple(&mut self, template: GroupTuple) -> Result<()> {
        let arity = template.arity();
        if arity == 0 {
            return Err(Error::config("tuple templates need at least one position"));
        }
        if let Some(existing) = self.arity() {
            if existing != arity {
                return Err(Error::config(format!(
                    "template of arity {} added to a space of arity {}",
                    arity, existing
                )));
            }
        }

        let groups: SmallVec<[GroupId; 4]> = match &template {
            GroupTuple::Combinations { group, arity } => {
                let id = self.resolve(group)?;
                SmallVec::from_elem(id, *arity)
            }
            GroupTuple::CrossProduct(refs) => refs
                .iter()
                .map(|r| self.resolve(r))
                .collect::<Result<_>>()?,
        };

        let adds_all = self.all.is_none() && groups.contains(&self.shape.groups.len());
        if adds_all {
            let id = self.push_group(None, (0..self.nvars).collect());
            self.all = Some(id);
        }

        let count = u64::try_from(self.shape.completions(&groups, &[]))
            .ok()
            .filter(|&count| self.shape.count().checked_add(count).is_some());
        match count {
            Some(count) => {
                self.shape.templates.push(Template { groups, count });
                Ok(())
            }
            None => {
                if adds_all {
                    self.group_names.pop();
                    self.shape.groups.pop();
                    self.all = None;
                }
                Err(Error::config(format!("{:?} describes too many tuples", template)))
            }
        }
    }

    /// Registers a cross-product template over groups given by name.
    pub fn add_named_group_tuple(&mut self, names: &[&str]) -> Result<()> {
        let refs = names.iter().map(|&name| GroupRef::from(name)).collect();
        self.add_variable_group_tuple(GroupTuple::CrossProduct(refs))
    }

    /// The number of tuples in the space, computed without enumerating them.
    ///
    /// ```
    /// use mist::TupleSpace;
    ///
    /// let mut space = TupleSpace::new(200).unwrap();
    /// space.add_variable_group("A", &(0..100).collect::<Vec<_>>()).unwrap();
    /// space.add_variable_group("B", &[150]).unwrap();
    /// space.add_named_group_tuple(&["A", "A"]).unwrap();
    /// space.add_named_group_tuple(&["A", "B"]).unwrap();
    /// assert_eq!(space.count_tuples(), 4950 + 100);
    /// ```
    pub fn count_tuples(&self) -> u64 {
        self.shape.count()
    }

    /// Iterates over the whole space.
    pub fn tuples(&self) -> Tuples<'_> {
        self.tuples_in(0..self.count_tuples())
    }

    /// Iterates over the tuples whose positions in the enumeration order fall in `range`. The
    /// iterator starts directly at `range.start` rather than skipping the tuples before it.
    /// Out-of-range bounds are clamped to the size of the space.
    pub fn tuples_in(&self, range: Range<u64>) -> Tuples<'_> {
        self.shape.tuples_in(range)
    }

    /// The tuple at position `index` in the enumeration order.
    ///
    /// ```
    /// use mist::{Tuple, TupleSpace};
    ///
    /// let space = TupleSpace::all_combinations(5, 3).unwrap();
    /// assert_eq!(space.tuple_at(0), Some(Tuple::new(&[0, 1, 2])));
    /// assert_eq!(space.tuple_at(9), Some(Tuple::new(&[2, 3, 4])));
    /// assert_eq!(space.tuple_at(10), None);
    /// ```
    pub fn tuple_at(&self, index: u64) -> Option<Tuple> {
        self.tuples_in(index..index.saturating_add(1)).next()
    }

    pub(crate) fn shape(&self) -> &SpaceShape {
        &self.shape
    }
}

/// An iterator over a contiguous range of a [`TupleSpace`]'s enumeration order.
///
/// Tuples come out template by template, and lexicographically by group-local index within each
/// template.
#[derive(Clone, Debug)]
pub struct Tuples<'a> {
    shape: &'a SpaceShape,
    template: usize,
    positions: SmallVec<[usize; 4]>,
    remaining: u64,
}

impl Tuples<'_> {
    fn seek(&mut self, index: u64) {
        let mut offset = index;
        for (t, template) in self.shape.templates.iter().enumerate() {
            if offset < template.count {
                self.template = t;
                self.unrank(offset);
                return;
            }
            offset -= template.count;
        }
        debug_assert!(false, "seek past the end of the space");
    }

    fn unrank(&mut self, mut offset: u64) {
        let shape = self.shape;
        let template = &shape.templates[self.template].groups;
        self.positions.clear();
        for q in 0..template.len() {
            let mut index = min_start(template, &self.positions, q);
            loop {
                self.positions.push(index);
                let completions = shape.completions(template, &self.positions);
                if u128::from(offset) < completions {
                    break;
                }
                // fits, since it is no more than offset
                offset -= completions as u64;
                self.positions.pop();
                index += 1;
            }
        }
    }

    fn fill(&mut self, from: usize) {
        let template = &self.shape.templates[self.template].groups;
        self.positions.truncate(from);
        for q in from..template.len() {
            let start = min_start(template, &self.positions, q);
            self.positions.push(start);
        }
    }

    /// Moves to the next tuple of the current template, returning false if there isn't one.
    fn increment(&mut self) -> bool {
        let shape = self.shape;
        let template = &shape.templates[self.template].groups;
        for p in (0..template.len()).rev() {
            let g = template[p];
            let later = template[p + 1..].iter().filter(|&&h| h == g).count();
            let candidate = self.positions[p] + 1;
            if candidate + later < shape.groups[g].len() {
                self.positions[p] = candidate;
                self.fill(p + 1);
                return true;
            }
        }
        false
    }

    fn advance(&mut self) {
        if self.increment() {
            return;
        }
        while self.template + 1 < self.shape.templates.len() {
            self.template += 1;
            if self.shape.templates[self.template].count > 0 {
                self.fill(0);
                return;
            }
        }
        debug_assert!(false, "advanced past the end of the space");
    }
}

impl Iterator for Tuples<'_> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        if self.remaining == 0 {
            return None;
        }
        let shape = self.shape;
        let template = &shape.templates[self.template].groups;
        let tuple = self
            .positions
            .iter()
            .zip(template)
            .map(|(&i, &g)| shape.groups[g][i])
            .collect();
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(tuple)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

/// The slice of a tuple space that one invocation of a search owns when the work is spread over
/// several independent processes.
///
/// The enumeration range `[0, count)` is divided into `total_ranks` pieces of
/// `count / total_ranks` tuples, the last piece also taking the remainder. An invocation owns
/// `ranks` consecutive pieces starting at `start_rank`.
///
/// ```
/// use mist::Partition;
///
/// assert_eq!(Partition::new(0, 1, 3).range(10), 0..3);
/// assert_eq!(Partition::new(1, 1, 3).range(10), 3..6);
/// assert_eq!(Partition::new(1, 2, 3).range(10), 3..10);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Partition {
    start_rank: usize,
    ranks: usize,
    total_ranks: usize,
}

impl Default for Partition {
    fn default() -> Self {
        Partition::new(0, 1, 1)
    }
}

impl Partition {
    /// Describes ranks `start_rank .. start_rank + ranks` out of `total_ranks`.
    ///
    /// # Panics
    ///
    /// Panics if `ranks` or `total_ranks` is zero, or if the ranks run past `total_ranks`.
    pub fn new(start_rank: usize, ranks: usize, total_ranks: usize) -> Self {
        assert!(ranks > 0, "a partition needs at least one rank");
        assert!(total_ranks > 0, "total_ranks must be positive");
        assert!(
            start_rank
                .checked_add(ranks)
                .map_or(false, |end| end <= total_ranks),
            "ranks {}..{}+{} exceed total_ranks {}",
            start_rank,
            start_rank,
            ranks,
            total_ranks
        );
        Partition {
            start_rank,
            ranks,
            total_ranks,
        }
    }

    /// The first rank this invocation owns.
    pub fn start_rank(&self) -> usize {
        self.start_rank
    }

    /// How many consecutive ranks this invocation owns.
    pub fn ranks(&self) -> usize {
        self.ranks
    }

    /// How many ranks the whole run is divided into.
    pub fn total_ranks(&self) -> usize {
        self.total_ranks
    }

    /// The enumeration range owned by this invocation out of a space of `count` tuples.
    pub fn range(&self, count: u64) -> Range<u64> {
        let total = self.total_ranks as u64;
        let first = split(0..count, total, self.start_rank as u64);
        let last = split(0..count, total, (self.start_rank + self.ranks - 1) as u64);
        first.start..last.end
    }
}

/// The `index`th of `parts` pieces of `range`: equal pieces, with the remainder going to the
/// last one.
pub(crate) fn split(range: Range<u64>, parts: u64, index: u64) -> Range<u64> {
    debug_assert!(index < parts);
    let step = (range.end - range.start) / parts;
    let start = range.start + index * step;
    let end = if index + 1 == parts {
        range.end
    } else {
        start + step
    };
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(space: &TupleSpace) -> Vec<Vec<usize>> {
        space.tuples().map(|t| t.as_slice().to_vec()).collect()
    }

    #[test]
    fn binomials() {
        assert_eq!(binomial(5, 0), 1);
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(5, 5), 1);
        assert_eq!(binomial(3, 4), 0);
        assert_eq!(binomial(333, 3), 6_099_006);
        assert_eq!(binomial(100_000, 99_998), 4_999_950_000);
    }

    #[test]
    fn combinations_are_increasing() {
        let space = TupleSpace::all_combinations(4, 2).unwrap();
        assert_eq!(
            collect(&space),
            [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]]
        );
    }

    #[test]
    fn repeated_groups_interleave_with_others() {
        let mut space = TupleSpace::new(6).unwrap();
        space.add_variable_group("A", &[0, 1, 2]).unwrap();
        space.add_variable_group("B", &[4, 5]).unwrap();
        space.add_named_group_tuple(&["A", "B", "A"]).unwrap();
        assert_eq!(space.count_tuples(), 3 * 2);
        assert_eq!(
            collect(&space),
            [
                [0, 4, 1],
                [0, 4, 2],
                [0, 5, 1],
                [0, 5, 2],
                [1, 4, 2],
                [1, 5, 2]
            ]
        );
    }

    #[test]
    fn every_start_index_seeks_correctly() {
        let mut space = TupleSpace::new(9).unwrap();
        space.add_variable_group("A", &[0, 1, 2, 3, 4]).unwrap();
        space.add_variable_group("B", &[5, 6, 7]).unwrap();
        space.add_named_group_tuple(&["A", "B", "A"]).unwrap();
        space.add_named_group_tuple(&["B", "B", "B"]).unwrap();
        space.add_named_group_tuple(&["A", "A", "A"]).unwrap();
        let all = collect(&space);
        assert_eq!(all.len() as u64, space.count_tuples());
        for start in 0..=all.len() {
            let tail: Vec<_> = space
                .tuples_in(start as u64..all.len() as u64)
                .map(|t| t.as_slice().to_vec())
                .collect();
            assert_eq!(tail, all[start..]);
        }
    }

    #[test]
    fn empty_templates_are_skipped() {
        let mut space = TupleSpace::new(4).unwrap();
        space.add_variable_group("one", &[3]).unwrap();
        space.add_variable_group("two", &[0, 1]).unwrap();
        space.add_named_group_tuple(&["two", "two"]).unwrap();
        space.add_named_group_tuple(&["one", "one"]).unwrap();
        space.add_named_group_tuple(&["two", "one"]).unwrap();
        assert_eq!(space.count_tuples(), 1 + 0 + 2);
        assert_eq!(collect(&space), [[0, 1], [0, 3], [1, 3]]);
    }

    #[test]
    fn groups_are_validated() {
        let mut space = TupleSpace::new(3).unwrap();
        assert!(space.add_variable_group("a", &[]).is_err());
        assert!(space.add_variable_group("a", &[3]).is_err());
        assert_eq!(space.add_variable_group("a", &[2, 0, 2]).unwrap(), 0);
        assert!(space.add_variable_group("a", &[1]).is_err());
        assert_eq!(space.group("a"), Some(&[0, 2][..]));
        assert_eq!(space.group("b"), None);
    }

    #[test]
    fn templates_are_validated() {
        let mut space = TupleSpace::new(3).unwrap();
        space.add_variable_group("a", &[0, 1]).unwrap();
        assert!(space.add_named_group_tuple(&[]).is_err());
        assert!(space.add_named_group_tuple(&["a", "b"]).is_err());
        assert!(space
            .add_variable_group_tuple(GroupTuple::CrossProduct(vec![GroupRef::Index(7)]))
            .is_err());
        assert_eq!(space.arity(), None);
        space.add_named_group_tuple(&["a", "a"]).unwrap();
        assert!(space
            .add_variable_group_tuple(GroupTuple::Combinations {
                group: GroupRef::All,
                arity: 3
            })
            .is_err());
        space
            .add_variable_group_tuple(GroupTuple::Combinations {
                group: GroupRef::All,
                arity: 2,
            })
            .unwrap();
        assert_eq!(space.count_tuples(), 1 + 3);
        // the universal group is not a named group
        assert_eq!(space.groups().count(), 1);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(TupleSpace::new(0).is_err());
        assert!(TupleSpace::all_combinations(0, 2).is_err());
        assert!(TupleSpace::all_combinations(5, 0).is_err());
    }

    #[test]
    fn huge_spaces_are_counted_or_rejected() {
        let space = TupleSpace::all_combinations(1_000_000, 3).unwrap();
        assert_eq!(space.count_tuples(), 166_666_166_667_000_000);
        assert!(TupleSpace::all_combinations(1_000_000, 5).is_err());
    }

    #[test]
    fn rejected_templates_leave_the_space_unchanged() {
        let mut space = TupleSpace::new(200).unwrap();
        assert!(space
            .add_variable_group_tuple(GroupTuple::Combinations {
                group: GroupRef::All,
                arity: 30,
            })
            .is_err());
        assert!(space
            .add_variable_group_tuple(GroupTuple::CrossProduct(vec![
                GroupRef::All,
                "missing".into(),
            ]))
            .is_err());
        assert_eq!(space.arity(), None);
        assert_eq!(space.count_tuples(), 0);

        // nothing was registered, so the first named group still gets the first id
        assert_eq!(space.add_variable_group("a", &[0, 1]).unwrap(), 0);
        space
            .add_variable_group_tuple(GroupTuple::CrossProduct(vec!["a".into(), GroupRef::All]))
            .unwrap();
        assert_eq!(space.count_tuples(), 2 * 200);
        assert_eq!(space.tuple_at(0), Some(Tuple::new(&[0, 0])));
    }

    #[test]
    fn split_covers_range() {
        for parts in 1..7 {
            let mut next = 5;
            for index in 0..parts {
                let piece = split(5..22, parts, index);
                assert_eq!(piece.start, next);
                next = piece.end;
            }
            assert_eq!(next, 22);
        }
    }

    #[test]
    #[should_panic]
    fn partition_past_the_end_panics() {
        Partition::new(2, 2, 3);
    }

    #[test]
    #[should_panic]
    fn partition_without_ranks_panics() {
        Partition::new(0, 0, 3);
    }
}
