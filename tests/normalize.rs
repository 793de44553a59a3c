use eu_renewables::mapping::{MappingOverrides, Mappings};
use eu_renewables::normalize::{
    code_to_flag, code_to_flag_opt, normalize_country_code, normalize_country_code_with,
};
use proptest::prelude::*;

#[test]
fn greek_statistical_code_becomes_iso() {
    assert_eq!(normalize_country_code("EL"), "GR");
    assert_eq!(normalize_country_code("GR"), "GR");
    assert_eq!(normalize_country_code("FR"), "FR");
}

#[test]
fn unknown_codes_pass_through_verbatim() {
    for code in ["", "el", "XK", "EU27_2020", " EL"] {
        assert_eq!(normalize_country_code(code), code);
    }
}

#[test]
fn injected_aliases_are_applied() {
    let overrides = MappingOverrides {
        country_aliases: [("UK".to_string(), "GB".to_string())].into(),
        ..MappingOverrides::default()
    };
    let mappings = Mappings::with_overrides(&overrides).expect("valid overrides");
    assert_eq!(normalize_country_code_with("UK", &mappings), "GB");
    assert_eq!(normalize_country_code_with("EL", &mappings), "GR");
    assert_eq!(normalize_country_code("UK"), "UK");
}

#[test]
fn flags_for_malformed_input_are_empty() {
    assert_eq!(code_to_flag("D"), "");
    assert_eq!(code_to_flag("DEU"), "");
    assert_eq!(code_to_flag(""), "");
    assert_eq!(code_to_flag_opt(None), "");
    assert_eq!(code_to_flag_opt(Some("GR")), "\u{1F1EC}\u{1F1F7}");
}

proptest! {
    #[test]
    fn normalization_is_idempotent(raw in ".{0,6}") {
        let once = normalize_country_code(&raw);
        prop_assert_eq!(normalize_country_code(&once), once.clone());
        prop_assert_ne!(once, "EL");
    }

    #[test]
    fn flags_are_two_regional_indicators(code in "[A-Za-z]{2}") {
        let flag = code_to_flag(&code);
        prop_assert_eq!(flag.chars().count(), 2);
        let all_regional = flag.chars().all(|c| ('\u{1F1E6}'..='\u{1F1FF}').contains(&c));
        prop_assert!(all_regional);
        prop_assert_eq!(code_to_flag(&code.to_ascii_uppercase()), flag);
    }

    #[test]
    fn other_lengths_never_produce_a_flag(code in "[A-Z]{0,1}|[A-Z]{3,5}") {
        prop_assert_eq!(code_to_flag(&code), "");
    }
}
