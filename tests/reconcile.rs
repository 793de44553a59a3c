mod common;

use common::{SAMPLE_CSV, SAMPLE_GEOJSON, fixture_path, geographic_frame, statistical_frame};
use eu_renewables::PipelineError;
use eu_renewables::data::Value;
use eu_renewables::frame::Frame;
use eu_renewables::loader;
use eu_renewables::mapping::{MappingOverrides, Mappings};
use eu_renewables::output::OUTPUT_COLUMNS;
use eu_renewables::reconcile::{self, reconcile};

fn is_one_decimal(value: f64) -> bool {
    let scaled = value * 10.0;
    (scaled - scaled.round()).abs() < 1e-9
}

#[test]
fn greek_codes_unify_across_sources() {
    let stat = statistical_frame(&[
        ("DE", "2020", "19.1"),
        ("FR", "2020", "19.3"),
        ("EL", "2020", "21.7"),
    ]);
    let geo = geographic_frame(&[("DE", "Germany"), ("FR", "France"), ("GR", "Greece")]);

    let result = reconcile(&stat, &geo, Mappings::builtin()).expect("reconcile");
    assert_eq!(result.records.len(), 3);
    assert_eq!(result.diagnostics.join.matched_rows, 3);
    assert!(result.diagnostics.join.unmatched_geo.is_empty());
    assert!(result.diagnostics.join.unmatched_stat.is_empty());

    let greece = result
        .records
        .iter()
        .find(|r| r.country == "Greece")
        .expect("greek record");
    assert_eq!(greece.code, "GR");
    assert_eq!(greece.cntr_id, "GR");
    assert_eq!(greece.flag, "\u{1F1EC}\u{1F1F7}");
    assert!(result.records.iter().all(|r| r.code != "EL"));
}

#[test]
fn fixture_pipeline_reports_mismatches_and_coercion() {
    let (stat, geo) = loader::load(&fixture_path(SAMPLE_CSV), &fixture_path(SAMPLE_GEOJSON))
        .expect("load fixtures");
    let result = reconcile(&stat, &geo, Mappings::builtin()).expect("reconcile");

    assert_eq!(result.records.len(), 6);
    assert_eq!(result.diagnostics.join.unmatched_geo, vec!["NO".to_string()]);
    assert_eq!(result.diagnostics.join.unmatched_stat, vec!["TR".to_string()]);

    let coercion = &result.diagnostics.coercion;
    assert_eq!(coercion.len(), 1);
    assert_eq!(coercion[0].column, "Renewable Percentage");
    assert_eq!(coercion[0].raw, "n/a");

    let first = &result.records[0];
    assert_eq!(first.code, "DE");
    assert_eq!(first.country, "Germany");
    assert_eq!(first.iso3, "DEU");
    assert_eq!(first.energy_type, "Renewable Energy Total");
    assert_eq!(first.year, Some(2020));
    assert_eq!(first.renewable_percentage, Some(25.5));
    assert_eq!(first.geometry["type"], "Point");

    assert_eq!(result.records[2].energy_type, "Renewable Electricity");
    assert_eq!(result.records[3].code, "GR");
    assert_eq!(result.records[3].renewable_percentage, Some(21.8));
    assert_eq!(result.records[5].renewable_percentage, None);
}

#[test]
fn every_present_percentage_has_one_decimal() {
    let stat = statistical_frame(&[
        ("DE", "2018", "17.123"),
        ("DE", "2019", "2.25"),
        ("DE", "2020", "21.75"),
        ("DE", "2021", "19"),
    ]);
    let geo = geographic_frame(&[("DE", "Germany")]);
    let result = reconcile(&stat, &geo, Mappings::builtin()).expect("reconcile");

    let values = result
        .records
        .iter()
        .filter_map(|r| r.renewable_percentage)
        .collect::<Vec<_>>();
    assert_eq!(values, vec![17.1, 2.3, 21.8, 19.0]);
    assert!(values.iter().all(|v| is_one_decimal(*v)));
}

#[test]
fn rows_without_a_join_key_are_counted() {
    let stat = statistical_frame(&[
        ("DE", "2020", "19.1"),
        ("", "2020", "12.0"),
        ("  ", "2021", "13.0"),
    ]);
    let geo = geographic_frame(&[("DE", "Germany"), ("", "Nowhere")]);

    let result = reconcile(&stat, &geo, Mappings::builtin()).expect("reconcile");
    let join = &result.diagnostics.join;
    assert_eq!(result.records.len(), 1);
    assert_eq!(join.matched_rows, 1);
    assert!(join.unmatched_geo.is_empty());
    assert!(join.unmatched_stat.is_empty());
    assert_eq!(join.missing_key_stat, 2);
    assert_eq!(join.missing_key_geo, 1);
    assert!(!join.is_complete());
}

#[test]
fn fully_matched_join_is_complete() {
    let stat = statistical_frame(&[("DE", "2020", "19.1")]);
    let geo = geographic_frame(&[("DE", "Germany")]);
    let result = reconcile(&stat, &geo, Mappings::builtin()).expect("reconcile");
    assert!(result.diagnostics.join.is_complete());
}

#[test]
fn rename_onto_an_existing_column_is_rejected() {
    let overrides = MappingOverrides {
        column_renames: [("CNTR_NAME".to_string(), "Country".to_string())].into(),
        ..MappingOverrides::default()
    };
    let mappings = Mappings::with_overrides(&overrides).unwrap();
    let frame = Frame::from_text_rows(
        "merged",
        &["CNTR_NAME", "NAME_ENGL"],
        &[vec!["Deutschland", "Germany"]],
    );
    let err = reconcile::rename_columns(frame, &mappings).expect_err("duplicate Country");
    match err {
        PipelineError::DuplicateColumn { table, column } => {
            assert_eq!(table, "merged");
            assert_eq!(column, "Country");
        }
        other => panic!("expected DuplicateColumn, found {other:?}"),
    }
}

#[test]
fn unmapped_energy_types_pass_through() {
    let frame = Frame::from_text_rows("merged", &["Energy Type"], &[vec!["REN"], vec!["NRG_X"]]);
    let mapped = reconcile::map_energy_types(frame, Mappings::builtin()).unwrap();
    assert_eq!(mapped.text(0, 0), Some("Renewable Energy Total"));
    assert_eq!(mapped.text(1, 0), Some("NRG_X"));
}

#[test]
fn drop_columns_tolerates_absent_columns() {
    let frame = Frame::from_text_rows("merged", &["Code", "unit"], &[vec!["DE", "PC"]]);
    let dropped = reconcile::drop_columns(frame, Mappings::builtin());
    assert_eq!(dropped.headers(), ["Code"]);
    let again = reconcile::drop_columns(dropped.clone(), Mappings::builtin());
    assert_eq!(again, dropped);
}

#[test]
fn rename_produces_canonical_names() {
    let frame = Frame::from_text_rows(
        "merged",
        &["CNTR_ID", "NAME_ENGL", "nrg_bal", "geo", "TIME_PERIOD", "OBS_VALUE"],
        &[vec!["DE", "Germany", "REN", "DE", "2020", "19.1"]],
    );
    let renamed = reconcile::rename_columns(frame, Mappings::builtin()).unwrap();
    assert_eq!(
        renamed.headers(),
        [
            "CNTR_ID",
            "Country",
            "Energy Type",
            "Code",
            "Year",
            "Renewable Percentage"
        ]
    );
}

#[test]
fn normalize_codes_rewrites_both_code_columns() {
    let frame = Frame::from_text_rows(
        "merged",
        &["CNTR_ID", "Code"],
        &[vec!["EL", "EL"], vec!["DE", "DE"]],
    );
    let normalized = reconcile::normalize_codes(frame, Mappings::builtin()).unwrap();
    assert_eq!(normalized.text(0, 0), Some("GR"));
    assert_eq!(normalized.text(0, 1), Some("GR"));
    assert_eq!(normalized.text(1, 1), Some("DE"));
}

#[test]
fn derive_flags_leaves_malformed_codes_empty() {
    let frame = Frame::from_text_rows("merged", &["Code"], &[vec!["DE"], vec!["EU27_2020"]]);
    let flagged = reconcile::derive_flags(frame).unwrap();
    let flag = flagged.require_column("Flag").unwrap();
    assert_eq!(flagged.text(0, flag), Some("\u{1F1E9}\u{1F1EA}"));
    assert_eq!(flagged.text(1, flag), Some(""));
}

#[test]
fn round_percentage_leaves_missing_values_alone() {
    let mut frame = Frame::new("merged", vec!["Renewable Percentage".to_string()]);
    frame.push_row(vec![Some(Value::Float(12.345))]);
    frame.push_row(vec![None]);
    let rounded = reconcile::round_percentage(frame).unwrap();
    assert_eq!(rounded.cell(0, 0), Some(&Value::Float(12.3)));
    assert_eq!(rounded.cell(1, 0), None);
}

#[test]
fn missing_join_column_halts_the_pipeline() {
    let stat = Frame::from_text_rows("statistical", &["country"], &[vec!["DE"]]);
    let geo = geographic_frame(&[("DE", "Germany")]);
    let err = reconcile(&stat, &geo, Mappings::builtin()).expect_err("no geo column");
    match err {
        PipelineError::MissingColumn { table, column } => {
            assert_eq!(table, "statistical");
            assert_eq!(column, "geo");
        }
        other => panic!("expected MissingColumn, found {other:?}"),
    }
}

#[test]
fn projection_follows_output_contract() {
    let stat = statistical_frame(&[("DE", "2020", "19.1")]);
    let geo = geographic_frame(&[("DE", "Germany")]);
    let (frame, _) = reconcile::reconcile_frame(&stat, &geo, Mappings::builtin()).unwrap();
    for column in OUTPUT_COLUMNS.iter().filter(|c| !["ISO3_CODE", "geometry"].contains(*c)) {
        assert!(frame.has_column(column), "missing {column}");
    }
    let records = reconcile::project_records(&frame).unwrap();
    assert_eq!(records[0].iso3, "");
    assert!(records[0].geometry.is_null());
}

#[test]
fn overrides_relabel_energy_types() {
    let overrides = MappingOverrides {
        energy_types: [("REN".to_string(), "All renewables".to_string())].into(),
        ..MappingOverrides::default()
    };
    let mappings = Mappings::with_overrides(&overrides).unwrap();
    let stat = statistical_frame(&[("DE", "2020", "19.1")]);
    let geo = geographic_frame(&[("DE", "Germany")]);
    let result = reconcile(&stat, &geo, &mappings).unwrap();
    assert_eq!(result.records[0].energy_type, "All renewables");
}
