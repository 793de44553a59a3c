use std::collections::BTreeMap;

use crate::output::{EnergyRecord, EuYearAggregate};

/// Running sum and count per year; years only appear once they have a value.
#[derive(Debug, Default)]
pub struct YearlyMeanAccumulator {
    groups: BTreeMap<i32, (f64, usize)>,
}

impl YearlyMeanAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, record: &EnergyRecord) {
        let (Some(year), Some(value)) = (record.year, record.renewable_percentage) else {
            return;
        };
        let entry = self.groups.entry(year).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    /// One row per year, ascending.
    pub fn finish(self) -> Vec<EuYearAggregate> {
        self.groups
            .into_iter()
            .map(|(year, (sum, count))| EuYearAggregate {
                year,
                renewable_percentage_mean: sum / count as f64,
            })
            .collect()
    }
}

pub fn yearly_means<'a, I>(records: I) -> Vec<EuYearAggregate>
where
    I: IntoIterator<Item = &'a EnergyRecord>,
{
    let mut accumulator = YearlyMeanAccumulator::new();
    for record in records {
        accumulator.ingest(record);
    }
    accumulator.finish()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PercentageSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Count, extremes, mean and median of the present percentages, or `None`
/// when there are none.
pub fn summarize_percentages<'a, I>(records: I) -> Option<PercentageSummary>
where
    I: IntoIterator<Item = &'a EnergyRecord>,
{
    let mut values = records
        .into_iter()
        .filter_map(|r| r.renewable_percentage)
        .collect::<Vec<_>>();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let median = if count % 2 == 1 {
        values[count / 2]
    } else {
        (values[count / 2 - 1] + values[count / 2]) / 2.0
    };
    Some(PercentageSummary {
        count,
        min: values[0],
        max: values[count - 1],
        mean,
        median,
    })
}
