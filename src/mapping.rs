//! Static lookup tables driving the reconcile pipeline.
//!
//! [`Mappings`] bundles the energy-type labels, column renames, EU membership
//! set, columns to drop and country-code aliases. The built-in tables are
//! constructed once ([`Mappings::builtin`]) and never mutated; callers that
//! need different tables layer a [`MappingOverrides`] on top with
//! [`Mappings::with_overrides`].

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::OnceLock,
};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Geographic-side join column (GISCO country identifier).
pub const GEO_KEY: &str = "CNTR_ID";
/// Statistics-side join column (Eurostat geo code).
pub const STAT_KEY: &str = "geo";

pub const CODE: &str = "Code";
pub const FLAG: &str = "Flag";
pub const COUNTRY: &str = "Country";
pub const ENERGY_TYPE: &str = "Energy Type";
pub const PERCENTAGE: &str = "Renewable Percentage";
pub const YEAR: &str = "Year";
pub const ISO3: &str = "ISO3_CODE";
pub const GEOMETRY: &str = "geometry";

pub const RENEWABLE_TOTAL: &str = "Renewable Energy Total";

const ENERGY_TYPES: &[(&str, &str)] = &[
    ("REN", RENEWABLE_TOTAL),
    ("REN_ELC", "Renewable Electricity"),
    ("REN_HEAT_CL", "Renewable Heating and Cooling"),
    ("REN_TRA", "Renewable Energy in Transport"),
];

const COLUMN_RENAMES: &[(&str, &str)] = &[
    ("nrg_bal", ENERGY_TYPE),
    ("TIME_PERIOD", YEAR),
    ("OBS_VALUE", PERCENTAGE),
    ("geo", CODE),
    ("NAME_ENGL", COUNTRY),
];

// Canonical codes only: Greece is GR here, never the Eurostat EL.
const EU_MEMBERS: &[&str] = &[
    "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT",
    "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
];

const DROP_COLUMNS: &[&str] = &["LAST UPDATE", "freq", "unit", "OBS_FLAG"];

const COUNTRY_ALIASES: &[(&str, &str)] = &[("EL", "GR")];

static BUILTIN: OnceLock<Mappings> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mappings {
    energy_types: BTreeMap<String, String>,
    column_renames: BTreeMap<String, String>,
    eu_members: BTreeSet<String>,
    drop_columns: Vec<String>,
    country_aliases: BTreeMap<String, String>,
}

/// Partial tables merged over the built-in ones. Every field is optional so a
/// YAML file only has to name what it changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingOverrides {
    pub energy_types: BTreeMap<String, String>,
    pub column_renames: BTreeMap<String, String>,
    pub eu_members_extra: BTreeSet<String>,
    pub drop_columns_extra: Vec<String>,
    pub country_aliases: BTreeMap<String, String>,
}

impl MappingOverrides {
    pub fn is_empty(&self) -> bool {
        self == &MappingOverrides::default()
    }
}

impl Default for Mappings {
    fn default() -> Self {
        Self {
            energy_types: to_map(ENERGY_TYPES),
            column_renames: to_map(COLUMN_RENAMES),
            eu_members: EU_MEMBERS.iter().map(|c| c.to_string()).collect(),
            drop_columns: DROP_COLUMNS.iter().map(|c| c.to_string()).collect(),
            country_aliases: to_map(COUNTRY_ALIASES),
        }
    }
}

impl Mappings {
    /// Shared instance of the built-in tables.
    pub fn builtin() -> &'static Mappings {
        BUILTIN.get_or_init(Mappings::default)
    }

    /// Returns the built-in tables with `overrides` merged over them.
    ///
    /// Alias targets may not themselves be aliases, which keeps code
    /// normalization idempotent. Every EU member, built-in or extra, is
    /// canonicalized through the merged aliases so membership tests run
    /// against normalized codes.
    pub fn with_overrides(overrides: &MappingOverrides) -> Result<Self> {
        let mut mappings = Mappings::default();
        mappings.energy_types.extend(overrides.energy_types.clone());
        mappings
            .column_renames
            .extend(overrides.column_renames.clone());
        mappings
            .country_aliases
            .extend(overrides.country_aliases.clone());

        for (alias, target) in &mappings.country_aliases {
            if mappings.country_aliases.contains_key(target) {
                return Err(PipelineError::Config(format!(
                    "country alias '{alias}' -> '{target}' points at another alias"
                )));
            }
        }

        let members = std::mem::take(&mut mappings.eu_members);
        for member in members.iter().chain(&overrides.eu_members_extra) {
            let canonical = mappings.canonical_code(member).to_string();
            if &canonical != member {
                warn!("EU member '{member}' is not canonical; using '{canonical}'");
            }
            mappings.eu_members.insert(canonical);
        }
        for column in &overrides.drop_columns_extra {
            if !mappings.drop_columns.contains(column) {
                mappings.drop_columns.push(column.clone());
            }
        }
        Ok(mappings)
    }

    pub fn energy_label(&self, code: &str) -> Option<&str> {
        self.energy_types.get(code).map(String::as_str)
    }

    pub fn energy_types(&self) -> &BTreeMap<String, String> {
        &self.energy_types
    }

    pub fn column_renames(&self) -> &BTreeMap<String, String> {
        &self.column_renames
    }

    pub fn eu_members(&self) -> &BTreeSet<String> {
        &self.eu_members
    }

    pub fn is_eu_member(&self, code: &str) -> bool {
        self.eu_members.contains(code)
    }

    pub fn drop_columns(&self) -> &[String] {
        &self.drop_columns
    }

    pub fn country_aliases(&self) -> &BTreeMap<String, String> {
        &self.country_aliases
    }

    /// The canonical spelling of `code`; unaliased codes come back unchanged.
    pub fn canonical_code<'a>(&'a self, code: &'a str) -> &'a str {
        self.country_aliases
            .get(code)
            .map(String::as_str)
            .unwrap_or(code)
    }
}

fn to_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
