//! Hash grouping with first-seen slot order
//!
//! Groups are keyed by an optional string: `None` is the null group, which
//! collects every row whose key is null, the way a relational `GROUP BY`
//! does. Slots are allocated in the order keys are first seen, so a stable
//! sort of the output keeps tied groups in input order.

use std::collections::{HashMap, HashSet};

use crate::utils::round2;

pub type GroupKey = Option<String>;

/// Aggregator over per-group states of type `S`
#[derive(Debug)]
pub struct Aggregator<S> {
    slots: HashMap<GroupKey, usize>,
    keys: Vec<GroupKey>,
    states: Vec<S>,
}

impl<S: Default> Default for Aggregator<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Default> Aggregator<S> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            keys: Vec::new(),
            states: Vec::new(),
        }
    }

    /// State for `key`, created on first sight
    pub fn state(&mut self, key: Option<&str>) -> &mut S {
        let lookup = key.map(str::to_owned);
        let slot = match self.slots.get(&lookup) {
            Some(&slot) => slot,
            None => {
                let slot = self.states.len();
                self.slots.insert(lookup.clone(), slot);
                self.keys.push(lookup);
                self.states.push(S::default());
                slot
            }
        };
        &mut self.states[slot]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Consume into `(key, state)` pairs in first-seen order
    pub fn into_groups(self) -> impl Iterator<Item = (GroupKey, S)> {
        self.keys.into_iter().zip(self.states)
    }
}

/// Sum that ignores nulls, like SQL `SUM`
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum {
    pub total: f64,
}

impl Sum {
    #[inline]
    pub fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.total += v;
        }
    }

    /// Total rounded to cents; an all-null group reports 0.0
    pub fn rounded(&self) -> f64 {
        round2(self.total)
    }
}

/// Average that ignores nulls, like SQL `AVG`
#[derive(Debug, Clone, Copy, Default)]
pub struct Avg {
    pub sum: f64,
    pub count: u64,
}

impl Avg {
    #[inline]
    pub fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    pub fn value(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.sum / self.count as f64 }
    }
}

/// Distinct count over integer ids, like SQL `COUNT(DISTINCT ..)`
#[derive(Debug, Clone, Default)]
pub struct DistinctCount {
    seen: HashSet<i64>,
}

impl DistinctCount {
    #[inline]
    pub fn add(&mut self, id: Option<i64>) {
        if let Some(id) = id {
            self.seen.insert(id);
        }
    }

    pub fn count(&self) -> u64 {
        self.seen.len() as u64
    }
}

/// Stable descending sort on an f64 metric
///
/// Uses the IEEE total order, so a NaN metric sorts ahead of every number
/// instead of breaking the comparison.
pub fn sort_desc_by<T, F>(rows: &mut [T], metric: F)
where
    F: Fn(&T) -> f64,
{
    rows.sort_by(|a, b| metric(b).total_cmp(&metric(a)));
}
