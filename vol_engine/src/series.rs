/// series.rs — Dated observations and three-way date alignment
///
/// Realized volatility and both model predictions arrive as independent
/// (date, value) sequences.  Before any metric is computed they are joined
/// on the date key:
///
///   aligned = realized ⋈ garch ⋈ lstm      (inner join, ascending dates)
///
/// Duplicate dates inside one source resolve to the FIRST occurrence in
/// source order; the dropped rows are counted and logged.
use ahash::AHashMap;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::AlignError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// A named sequence of dated observations in source order.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    pub name: String,
    observations: Vec<Observation>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), observations: Vec::new() }
    }

    pub fn from_pairs(
        name: impl Into<String>,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        let mut series = Self::new(name);
        for (date, value) in pairs {
            series.push(date, value);
        }
        series
    }

    pub fn push(&mut self, date: NaiveDate, value: f64) {
        self.observations.push(Observation { date, value });
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// Ascending copy with one observation per date, the first occurrence in
    /// source order winning.  Also returns the number of rows dropped.
    pub fn sorted_unique(&self) -> (TimeSeries, usize) {
        let mut observations = self.observations.clone();
        // stable: equal dates keep source order
        observations.sort_by_key(|o| o.date);
        let before = observations.len();
        observations.dedup_by_key(|o| o.date);
        let dropped = before - observations.len();
        (TimeSeries { name: self.name.clone(), observations }, dropped)
    }

    /// Date → value index keeping the first occurrence of every date.
    /// Returns the index and the number of duplicate rows ignored.
    fn first_occurrence_index(&self) -> (AHashMap<NaiveDate, f64>, usize) {
        let mut index = AHashMap::with_capacity(self.observations.len());
        let mut duplicates = 0usize;
        for obs in &self.observations {
            if index.contains_key(&obs.date) {
                duplicates += 1;
            } else {
                index.insert(obs.date, obs.value);
            }
        }
        (index, duplicates)
    }
}

/// Realized volatility and both predictions on a shared, ascending date axis.
///
/// All four vectors have the same length (guaranteed by [`align`]).
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub dates: Vec<NaiveDate>,
    pub realized: Vec<f64>,
    pub garch: Vec<f64>,
    pub lstm: Vec<f64>,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

/// Inner-join three series on their date key.
///
/// # Errors
/// * `AlignError::EmptySource` — one of the inputs has no observations
/// * `AlignError::NoOverlap`   — the date intersection is empty
pub fn align(
    realized: &TimeSeries,
    garch: &TimeSeries,
    lstm: &TimeSeries,
) -> Result<AlignedSeries, AlignError> {
    for source in [realized, garch, lstm] {
        if source.is_empty() {
            return Err(AlignError::EmptySource { name: source.name.clone() });
        }
    }

    let (realized_idx, realized_dups) = realized.first_occurrence_index();
    let (garch_idx, garch_dups) = garch.first_occurrence_index();
    let (lstm_idx, lstm_dups) = lstm.first_occurrence_index();

    for (name, dups) in [
        (&realized.name, realized_dups),
        (&garch.name, garch_dups),
        (&lstm.name, lstm_dups),
    ] {
        if dups > 0 {
            warn!("{name}: {dups} duplicate date(s) ignored, first occurrence kept");
        }
    }

    let mut dates: Vec<NaiveDate> = realized_idx
        .keys()
        .filter(|d| garch_idx.contains_key(*d) && lstm_idx.contains_key(*d))
        .copied()
        .collect();

    if dates.is_empty() {
        return Err(AlignError::NoOverlap);
    }
    dates.sort_unstable();

    let realized_vals = dates.iter().map(|d| realized_idx[d]).collect();
    let garch_vals = dates.iter().map(|d| garch_idx[d]).collect();
    let lstm_vals = dates.iter().map(|d| lstm_idx[d]).collect();

    debug!(
        "aligned {} dates (realized={}, garch={}, lstm={})",
        dates.len(),
        realized_idx.len(),
        garch_idx.len(),
        lstm_idx.len()
    );

    Ok(AlignedSeries {
        dates,
        realized: realized_vals,
        garch: garch_vals,
        lstm: lstm_vals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn inner_join_keeps_common_dates_sorted() {
        let realized =
            TimeSeries::from_pairs("realized", [(day(3), 3.0), (day(1), 1.0), (day(2), 2.0)]);
        let garch = TimeSeries::from_pairs("garch", [(day(1), 1.1), (day(2), 2.1), (day(3), 2.9)]);
        let lstm = TimeSeries::from_pairs("lstm", [(day(2), 2.2), (day(3), 3.2), (day(4), 4.0)]);

        let aligned = align(&realized, &garch, &lstm).unwrap();
        assert_eq!(aligned.dates, vec![day(2), day(3)]);
        assert_eq!(aligned.realized, vec![2.0, 3.0]);
        assert_eq!(aligned.garch, vec![2.1, 2.9]);
        assert_eq!(aligned.lstm, vec![2.2, 3.2]);
        assert_eq!(aligned.first_date(), Some(day(2)));
        assert_eq!(aligned.last_date(), Some(day(3)));
    }

    #[test]
    fn disjoint_ranges_fail_explicitly() {
        let realized = TimeSeries::from_pairs("realized", [(day(1), 1.0), (day(2), 2.0)]);
        let garch = TimeSeries::from_pairs("garch", [(day(3), 1.0), (day(4), 2.0)]);
        let lstm = TimeSeries::from_pairs("lstm", [(day(1), 1.0), (day(2), 2.0)]);

        assert_eq!(align(&realized, &garch, &lstm), Err(AlignError::NoOverlap));
    }

    #[test]
    fn duplicate_dates_keep_first_occurrence() {
        let realized =
            TimeSeries::from_pairs("realized", [(day(1), 1.0), (day(1), 99.0), (day(2), 2.0)]);
        let garch = TimeSeries::from_pairs("garch", [(day(1), 1.5), (day(2), 2.5), (day(2), -1.0)]);
        let lstm = TimeSeries::from_pairs("lstm", [(day(1), 0.5), (day(2), 1.5)]);

        let aligned = align(&realized, &garch, &lstm).unwrap();
        assert_eq!(aligned.realized, vec![1.0, 2.0]);
        assert_eq!(aligned.garch, vec![1.5, 2.5]);
    }

    #[test]
    fn sorted_unique_keeps_first_occurrence() {
        let s = TimeSeries::from_pairs(
            "r",
            [(day(3), 3.0), (day(1), 1.0), (day(3), 30.0), (day(2), 2.0)],
        );
        let (unique, dropped) = s.sorted_unique();
        assert_eq!(dropped, 1);
        assert_eq!(unique.dates(), vec![day(1), day(2), day(3)]);
        assert_eq!(unique.values(), vec![1.0, 2.0, 3.0]);
        assert_eq!(unique.name, "r");
    }

    #[test]
    fn empty_source_is_named() {
        let realized = TimeSeries::from_pairs("realized", [(day(1), 1.0)]);
        let garch = TimeSeries::new("garch");
        let lstm = TimeSeries::from_pairs("lstm", [(day(1), 1.0)]);

        assert_eq!(
            align(&realized, &garch, &lstm),
            Err(AlignError::EmptySource { name: "garch".into() })
        );
    }
}
