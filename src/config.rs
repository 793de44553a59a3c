//! YAML configuration: default input paths and mapping overrides.
//!
//! ```yaml
//! data_path: data/nrg_ind_ren_linear.csv
//! geo_path: geo/europe.geojson
//! mappings:
//!   eu_members_extra: ["NO"]
//!   drop_columns_extra: [DATAFLOW]
//! ```

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{PipelineError, Result},
    loader,
    mapping::{MappingOverrides, Mappings},
};

pub const DEFAULT_DATA_PATH: &str = "data/nrg_ind_ren_linear.csv";
pub const DEFAULT_GEO_PATH: &str = "geo/europe.geojson";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_path: Option<PathBuf>,
    pub geo_path: Option<PathBuf>,
    pub mappings: MappingOverrides,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        loader::ensure_file(path)?;
        let reader = BufReader::new(File::open(path)?);
        serde_yaml::from_reader(reader)
            .map_err(|err| PipelineError::Config(format!("{}: {err}", path.display())))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|err| PipelineError::Config(err.to_string()))
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|err| PipelineError::Config(err.to_string()))
    }

    /// Built-in tables with this config's overrides applied.
    pub fn mappings(&self) -> Result<Mappings> {
        if self.mappings.is_empty() {
            Ok(Mappings::builtin().clone())
        } else {
            Mappings::with_overrides(&self.mappings)
        }
    }

    pub fn data_path(&self) -> PathBuf {
        self.data_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
    }

    pub fn geo_path(&self) -> PathBuf {
        self.geo_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GEO_PATH))
    }
}
