//! Where inputs are found and outputs go, and which systems are reconciled.
use crate::SourceSpec;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open configuration file '{}' for reading", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not decode the configuration file")]
    Decode(#[from] ron::de::SpannedError),
    #[error("Source '{0}' is configured more than once")]
    DuplicateSource(String),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// The directory containing one subdirectory per source.
    pub input_root: PathBuf,
    /// The directory into which the results of each run are written.
    pub output_root: PathBuf,
    /// The subdirectory of `input_root` holding directory service exports.
    pub directory_subdir: String,
    /// The subdirectory of `input_root` holding HR roster exports.
    pub roster_subdir: String,
    /// File extensions considered when looking for exports.
    pub extensions: Vec<String>,
    pub delimiter: char,
    /// Exports modified longer ago than this are ignored.
    pub max_file_age_days: i64,
    /// The maximum amount of rows read per source.
    pub max_rows: usize,
    /// See [`directory::Options::employee_markers`][crate::directory::Options::employee_markers].
    pub employee_markers: Vec<String>,
    /// See [`directory::Options::employee_exclusions`][crate::directory::Options::employee_exclusions].
    pub employee_exclusions: Vec<String>,
    /// See [`directory::Options::contractor_markers`][crate::directory::Options::contractor_markers].
    pub contractor_markers: Vec<String>,
    pub sources: Vec<SourceSpec>,
}

impl Default for Config {
    fn default() -> Self {
        let directory = crate::directory::Options::default();
        Config {
            input_root: "эксельки".into(),
            output_root: "вывод".into(),
            directory_subdir: "AD".into(),
            roster_subdir: "штатка".into(),
            extensions: vec!["csv".into()],
            delimiter: ',',
            max_file_age_days: 180,
            max_rows: 10_000,
            employee_markers: directory.employee_markers,
            employee_exclusions: directory.employee_exclusions,
            contractor_markers: directory.contractor_markers,
            sources: SourceSpec::builtin(),
        }
    }
}

impl Config {
    /// Load the configuration from a RON file. Fields that aren't mentioned keep their default.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|source| Error::Open {
            path: path.to_owned(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader(read: impl std::io::Read) -> Result<Self, Error> {
        let config: Config = ron::de::from_reader(read)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        let mut ids = std::collections::BTreeSet::new();
        for source in &self.sources {
            if !ids.insert(source.id.as_str()) {
                return Err(Error::DuplicateSource(source.id.clone()));
            }
        }
        Ok(())
    }

    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn max_file_age(&self) -> time::Duration {
        time::Duration::days(self.max_file_age_days)
    }

    pub fn directory_options(&self) -> crate::directory::Options {
        crate::directory::Options {
            employee_markers: self.employee_markers.clone(),
            employee_exclusions: self.employee_exclusions.clone(),
            contractor_markers: self.contractor_markers.clone(),
            delimiter: self.delimiter,
        }
    }

    pub fn source_options(&self) -> crate::source::Options {
        crate::source::Options {
            delimiter: self.delimiter,
            max_rows: self.max_rows,
        }
    }
}
