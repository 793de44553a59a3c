//! EU renewable-total views consumed by the chart widgets.

use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{
    mapping::{Mappings, RENEWABLE_TOTAL},
    output::{EnergyRecord, EuYearAggregate},
    stats,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EuView {
    pub eu_records: Vec<EnergyRecord>,
    pub yearly_aggregate: Vec<EuYearAggregate>,
}

/// True for a "Renewable Energy Total" observation of an EU member with both
/// a year and a value.
pub fn is_eu_renewable_total(record: &EnergyRecord, mappings: &Mappings) -> bool {
    record.energy_type == RENEWABLE_TOTAL
        && mappings.is_eu_member(&record.code)
        && record.year.is_some()
        && record.renewable_percentage.is_some()
}

/// Restricts `records` to EU renewable totals and averages them per year.
/// Years without a qualifying record do not appear in the aggregate.
pub fn filter_renewable_eu(records: &[EnergyRecord], mappings: &Mappings) -> EuView {
    let eu_records = records
        .iter()
        .filter(|record| is_eu_renewable_total(record, mappings))
        .cloned()
        .collect::<Vec<_>>();
    let yearly_aggregate = stats::yearly_means(&eu_records);
    info!(
        "Selected {} EU renewable-total record(s) across {} year(s)",
        eu_records.len(),
        yearly_aggregate.len()
    );
    EuView {
        eu_records,
        yearly_aggregate,
    }
}

/// Records of one year, lowest share first (the per-year bar chart order).
pub fn year_ranking(records: &[EnergyRecord], year: i32) -> Vec<EnergyRecord> {
    records
        .iter()
        .filter(|r| r.year == Some(year))
        .sorted_by(|a, b| {
            let left = a.renewable_percentage.unwrap_or(f64::NEG_INFINITY);
            let right = b.renewable_percentage.unwrap_or(f64::NEG_INFINITY);
            left.total_cmp(&right).then_with(|| a.code.cmp(&b.code))
        })
        .cloned()
        .collect()
}

/// One country's records in year order.
pub fn country_series(records: &[EnergyRecord], code: &str) -> Vec<EnergyRecord> {
    records
        .iter()
        .filter(|r| r.code == code)
        .sorted_by_key(|r| r.year)
        .cloned()
        .collect()
}
