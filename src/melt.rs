//! Reshapes the Eurostat wide TSV layout into the long layout.
//!
//! Bulk downloads ship one row per series with the dimension codes packed into
//! the first column (`freq,nrg_bal,unit,geo\TIME_PERIOD`) and one column per
//! year. Cells carry the value followed by optional observation flags
//! (`"21.3 p"`); a bare `:` means not available.

use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;

use crate::{
    data::Value,
    error::{PipelineError, Result},
    frame::Frame,
};

const DIMENSION_SEPARATOR: char = '\\';
const NOT_AVAILABLE: &str = ":";

pub const TIME_PERIOD: &str = "TIME_PERIOD";
pub const OBS_VALUE: &str = "OBS_VALUE";
pub const OBS_FLAG: &str = "OBS_FLAG";

fn year_pattern() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"(\d{4})").expect("valid year pattern"))
}

/// True when the first header packs several dimensions, as in
/// `freq,nrg_bal,unit,geo\TIME_PERIOD`.
pub fn is_wide_layout(headers: &[String]) -> bool {
    headers
        .first()
        .is_some_and(|first| first.contains(DIMENSION_SEPARATOR))
}

pub fn melt_wide(wide: &Frame) -> Result<Frame> {
    let packed = wide
        .headers()
        .first()
        .ok_or_else(|| PipelineError::missing_column(wide.name(), "dimension header"))?;
    let dimensions = packed
        .split(DIMENSION_SEPARATOR)
        .next()
        .unwrap_or_default()
        .split(',')
        .map(|d| d.trim().to_string())
        .collect::<Vec<_>>();

    let mut year_columns = Vec::new();
    for (idx, header) in wide.headers().iter().enumerate().skip(1) {
        match year_pattern().captures(header) {
            Some(caps) => year_columns.push((idx, caps[1].to_string())),
            None => warn!("Skipping column '{header}' without a year in {}", wide.name()),
        }
    }

    let mut headers = dimensions.clone();
    headers.extend([TIME_PERIOD, OBS_VALUE, OBS_FLAG].map(String::from));
    let mut long = Frame::new(wide.name(), headers);

    for (row_idx, row) in wide.rows().iter().enumerate() {
        let packed_keys = row
            .first()
            .and_then(Option::as_ref)
            .map(Value::as_display)
            .unwrap_or_default();
        let keys = packed_keys.split(',').map(str::trim).collect::<Vec<_>>();
        if keys.len() != dimensions.len() {
            return Err(PipelineError::WideLayout {
                row: row_idx + 2,
                expected: dimensions.len(),
                found: keys.len(),
            });
        }
        for (col_idx, year) in &year_columns {
            let raw = row
                .get(*col_idx)
                .and_then(Option::as_ref)
                .map(Value::as_display)
                .unwrap_or_default();
            let (value, flag) = split_observation(&raw);
            let mut cells = keys
                .iter()
                .map(|key| crate::data::parse_cell(key))
                .collect::<Vec<_>>();
            cells.push(Some(Value::Text(year.clone())));
            cells.push(value.and_then(crate::data::parse_cell));
            cells.push(flag.and_then(crate::data::parse_cell));
            long.push_row(cells);
        }
    }
    debug!(
        "Melted {} wide row(s) across {} year column(s) into {} row(s)",
        wide.row_count(),
        year_columns.len(),
        long.row_count()
    );
    Ok(long)
}

/// Splits `"21.3 p"` into value and flag; `":"` and `": c"` have no value.
fn split_observation(raw: &str) -> (Option<&str>, Option<&str>) {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let value = parts.next().filter(|v| !v.is_empty() && *v != NOT_AVAILABLE);
    let flag = parts.next().map(str::trim).filter(|f| !f.is_empty());
    (value, flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_observation_separates_flags() {
        assert_eq!(split_observation("21.3 p"), (Some("21.3"), Some("p")));
        assert_eq!(split_observation("17.8"), (Some("17.8"), None));
        assert_eq!(split_observation(":"), (None, None));
        assert_eq!(split_observation(": c"), (None, Some("c")));
        assert_eq!(split_observation(""), (None, None));
    }

    #[test]
    fn melt_produces_one_row_per_year() {
        let wide = Frame::from_text_rows(
            "statistical",
            &["freq,nrg_bal,unit,geo\\TIME_PERIOD", "2019 ", "2020 "],
            &[
                vec!["A,REN,PC,DE", "17.3 ", "19.1 p"],
                vec!["A,REN,PC,EL", ":", "21.7 "],
            ],
        );
        assert!(is_wide_layout(wide.headers()));
        let long = melt_wide(&wide).unwrap();
        assert_eq!(
            long.headers(),
            ["freq", "nrg_bal", "unit", "geo", "TIME_PERIOD", "OBS_VALUE", "OBS_FLAG"]
        );
        assert_eq!(long.row_count(), 4);
        assert_eq!(long.text(1, 4), Some("2020"));
        assert_eq!(long.text(1, 5), Some("19.1"));
        assert_eq!(long.text(1, 6), Some("p"));
        assert_eq!(long.cell(2, 5), None);
        assert_eq!(long.text(3, 3), Some("EL"));
    }

    #[test]
    fn melt_rejects_rows_with_wrong_dimension_count() {
        let wide = Frame::from_text_rows(
            "statistical",
            &["freq,nrg_bal,unit,geo\\TIME_PERIOD", "2020"],
            &[vec!["A,REN,DE", "19.1"]],
        );
        let err = melt_wide(&wide).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::WideLayout { row: 2, expected: 4, found: 3 }
        ));
    }
}
