//! Streaming reducers and robust estimators used when folding many sessions
//! worth of timings into a single figure.
//!
//! The reducers are plain values so they can be driven directly from Rust or
//! registered as SQLite aggregates (see `stats::functions`).

use crate::error::TrimError;

/// A reducer consumed inside a grouped reduction
pub trait Reducer: Default {
    type Input;
    type Output;

    fn step(&mut self, input: Self::Input);

    /// `None` when nothing usable was stepped
    fn finalize(&self) -> Option<Self::Output>;
}

/// Fold an iterator through a fresh reducer
pub fn reduce<R, I>(inputs: I) -> Option<R::Output>
where
    R: Reducer,
    I: IntoIterator<Item = R::Input>,
{
    let mut reducer = R::default();
    for input in inputs {
        reducer.step(input);
    }
    reducer.finalize()
}

/// Sorted sample of durations plus the number of flawed observations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistic {
    values: Vec<f64>,
    flawed: u32,
}

impl Statistic {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping the sample ordered
    pub fn push(&mut self, value: f64, flawed: bool) {
        let idx = self.values.partition_point(|v| *v <= value);
        self.values.insert(idx, value);
        if flawed {
            self.flawed += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn flawed(&self) -> u32 {
        self.flawed
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn median(&self) -> Option<f64> {
        median_of_sorted(&self.values)
    }

    /// Trimmed mean of the sample, every observation weighing one
    pub fn measurement(&self) -> Result<f64, TrimError> {
        let series: Vec<(f64, f64)> = self.values.iter().map(|v| (*v, 1.0)).collect();
        trimmed_average(self.values.len() as f64, &series)
    }
}

/// Middle element of an ascending slice; even lengths average the two middles
pub fn median_of_sorted(sorted: &[f64]) -> Option<f64> {
    let len = sorted.len();
    match len {
        0 => None,
        _ if len % 2 == 1 => Some(sorted[len / 2]),
        _ => Some((sorted[len / 2] + sorted[len / 2 - 1]) / 2.0),
    }
}

/// Median over every non-null value stepped
#[derive(Debug, Clone, Default)]
pub struct MedianReducer {
    sample: Statistic,
}

impl Reducer for MedianReducer {
    type Input = Option<f64>;
    type Output = f64;

    fn step(&mut self, input: Option<f64>) {
        if let Some(value) = input.filter(|v| !v.is_nan()) {
            self.sample.push(value, false);
        }
    }

    fn finalize(&self) -> Option<f64> {
        self.sample.median()
    }
}

/// `Σ(value·weight) / Σweight`, used to merge already aggregated rows so each
/// contributes in proportion to the occurrences it stands for
#[derive(Debug, Clone, Default)]
pub struct WeightedMeanReducer {
    sum: f64,
    weight: f64,
}

impl Reducer for WeightedMeanReducer {
    type Input = (f64, f64);
    type Output = f64;

    fn step(&mut self, (value, weight): (f64, f64)) {
        // zero-count rows carry no information
        if weight.is_nan() || weight <= 0.0 || !value.is_finite() {
            return;
        }
        self.sum += value * weight;
        self.weight += weight;
    }

    fn finalize(&self) -> Option<f64> {
        if self.weight > 0.0 {
            Some(self.sum / self.weight)
        } else {
            None
        }
    }
}

/// Carries the first non-null value through a grouping untouched
#[derive(Debug, Clone)]
pub struct FirstReducer<T> {
    value: Option<T>,
}

impl<T> Default for FirstReducer<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T: Clone> Reducer for FirstReducer<T> {
    type Input = Option<T>;
    type Output = T;

    fn step(&mut self, input: Option<T>) {
        if self.value.is_none() {
            self.value = input;
        }
    }

    fn finalize(&self) -> Option<T> {
        self.value.clone()
    }
}

/// Weighted mean of the middle third of `series`.
///
/// `series` holds `(value, weight)` pairs sorted ascending by value and
/// `total` is its total weight. The lowest and highest `floor(total / 3)`
/// units of weight are discarded, splitting a boundary bucket proportionally.
pub fn trimmed_average(total: f64, series: &[(f64, f64)]) -> Result<f64, TrimError> {
    let series: Vec<(f64, f64)> = series.iter().copied().filter(|(_, w)| *w > 0.0).collect();
    let cut = (total / 3.0).floor();

    let mut sum = 0.0;
    let mut weight = 0.0;

    let mut start = 0usize;
    let mut cutoff = cut;
    while cutoff > 0.0 && start < series.len() {
        cutoff -= series[start].1;
        start += 1;
    }
    if cutoff < 0.0 {
        sum += -cutoff * series[start - 1].0;
        weight += -cutoff;
    }

    let mut end = series.len() as isize - 1;
    let mut cutoff = cut;
    while cutoff > 0.0 && end >= 0 {
        cutoff -= series[end as usize].1;
        end -= 1;
    }
    if cutoff < 0.0 {
        sum += -cutoff * series[(end + 1) as usize].0;
        weight += -cutoff;
    }

    while (start as isize) <= end {
        sum += series[start].1 * series[start].0;
        weight += series[start].1;
        start += 1;
    }

    if weight > 0.0 {
        Ok(sum / weight)
    } else {
        Err(TrimError::EmptyMiddle)
    }
}

/// `trimmed_average` with the total taken from the series itself
pub fn trimmed_average_of(series: &[(f64, f64)]) -> Result<f64, TrimError> {
    let total = series.iter().map(|(_, w)| w.max(0.0)).sum();
    trimmed_average(total, series)
}

/// Numbers chronologically ordered timestamps into clusters: the counter
/// moves on whenever two consecutive timestamps are at least `interval`
/// seconds apart. Calls must follow the ordering of the rows being grouped.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrouper {
    interval: f64,
    last: f64,
    count: u64,
}

impl TimeGrouper {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            last: 0.0,
            count: 0,
        }
    }

    pub fn reset(&mut self) {
        self.last = 0.0;
        self.count = 0;
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn set_interval(&mut self, interval: f64) {
        self.interval = interval;
    }

    pub fn next(&mut self, timestamp: f64) -> u64 {
        if (timestamp - self.last).abs() >= self.interval {
            self.count += 1;
        }
        self.last = timestamp;
        self.count
    }
}
