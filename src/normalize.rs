use crate::mapping::Mappings;

const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;

/// Rewrites a statistical-source country code to its canonical ISO spelling
/// using the built-in alias table (`EL` becomes `GR`).
pub fn normalize_country_code(raw: &str) -> String {
    normalize_country_code_with(raw, Mappings::builtin())
}

pub fn normalize_country_code_with(raw: &str, mappings: &Mappings) -> String {
    mappings.canonical_code(raw).to_string()
}

/// Flag emoji for a two-letter code, built from regional indicator symbols.
///
/// Case-insensitive. Anything other than exactly two ASCII letters yields an
/// empty string: flags are display-only and must never stop the pipeline.
pub fn code_to_flag(code: &str) -> String {
    let mut chars = code.chars();
    let (Some(first), Some(second), None) = (chars.next(), chars.next(), chars.next()) else {
        return String::new();
    };
    match (regional_indicator(first), regional_indicator(second)) {
        (Some(a), Some(b)) => [a, b].iter().collect(),
        _ => String::new(),
    }
}

pub fn code_to_flag_opt(code: Option<&str>) -> String {
    code.map(code_to_flag).unwrap_or_default()
}

fn regional_indicator(letter: char) -> Option<char> {
    if !letter.is_ascii_alphabetic() {
        return None;
    }
    let offset = letter.to_ascii_uppercase() as u32 - 'A' as u32;
    char::from_u32(REGIONAL_INDICATOR_A + offset)
}
