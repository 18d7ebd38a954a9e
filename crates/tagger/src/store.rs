use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use glob::glob_with;
use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::extract::Fields;
use crate::prelude::*;

/// Realisation marking a dataset as excluded from the DRS.
pub(crate) const EXCLUDE_REALISATION: &str = "EXCLUDE";

const DEFAULT_REALISATION: &str = "r1";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    pub(crate) fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value.clone()],
            Self::Many(values) => values.clone(),
        }
    }
}

/// Assigns a realisation to those files of a dataset whose path
/// matches a regular expression.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RealisationFilter {
    #[serde(deserialize_with = "deserialize_regex")]
    pub(crate) pattern: Regex,
    pub(crate) realisation: String,
}

fn deserialize_regex<'de, D>(deserializer: D) -> Result<Regex, D::Error>
where
    D: Deserializer<'de>,
{
    let pattern = String::deserialize(deserializer)?;
    Regex::new(&pattern).map_err(serde::de::Error::custom)
}

/// The content of a single file of the JSON store.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StoreFile {
    pub(crate) datasets: Vec<PathBuf>,
    filters: BTreeMap<PathBuf, Vec<RealisationFilter>>,
    mappings: BTreeMap<String, BTreeMap<String, String>>,
    defaults: BTreeMap<String, FieldValue>,
    overrides: BTreeMap<String, FieldValue>,
    realisations: BTreeMap<String, String>,
}

impl StoreFile {
    pub(crate) fn from_path<P: AsRef<Path>>(path: P) -> TaggerResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// User defined settings of a dataset.
#[derive(Debug, Default, Clone)]
pub(crate) struct DatasetSpec {
    /// Term mappings per facet, applied before the vocabulary lookup.
    pub(crate) mappings: BTreeMap<String, BTreeMap<String, String>>,

    /// Values used if neither the file name nor the file provides a
    /// value for a facet.
    pub(crate) defaults: BTreeMap<String, FieldValue>,

    /// Values which replace whatever was found for a facet.
    pub(crate) overrides: BTreeMap<String, FieldValue>,

    pub(crate) realisation: Option<String>,

    /// Realisations of single files, checked in order.
    pub(crate) filters: Vec<RealisationFilter>,
}

impl DatasetSpec {
    /// The realisation of the dataset; `r1` unless configured.
    pub(crate) fn realisation(&self) -> &str {
        self.realisation.as_deref().unwrap_or(DEFAULT_REALISATION)
    }

    /// Returns the realisation of a file of the dataset. The first
    /// filter matching the path wins, otherwise the realisation of the
    /// dataset applies.
    pub(crate) fn realisation_of(&self, path: &Path) -> &str {
        let path = path.to_string_lossy();
        self.filters
            .iter()
            .find(|filter| filter.pattern.is_match(&path))
            .map(|filter| filter.realisation.as_str())
            .unwrap_or_else(|| self.realisation())
    }

    /// Whether a file is excluded from the DRS.
    pub(crate) fn is_excluded(&self, path: &Path) -> bool {
        self.realisation_of(path) == EXCLUDE_REALISATION
    }

    pub(crate) fn defaults(&self) -> Fields {
        to_fields(&self.defaults)
    }

    /// Replaces terms according to the mappings of the dataset. Keys
    /// are compared case-insensitively.
    pub(crate) fn apply_mappings(&self, fields: &mut Fields) {
        for (facet, values) in fields.iter_mut() {
            let Some(mapping) = self.mappings.get(facet) else {
                continue;
            };

            for value in values.iter_mut() {
                let key = value.trim();
                if let Some((_, to)) =
                    mapping.iter().find(|(from, _)| from.eq_ignore_ascii_case(key))
                {
                    *value = to.clone();
                }
            }
        }
    }

    pub(crate) fn apply_overrides(&self, fields: &mut Fields) {
        fields.extend(to_fields(&self.overrides));
    }
}

fn to_fields(values: &BTreeMap<String, FieldValue>) -> Fields {
    values
        .iter()
        .map(|(facet, value)| (facet.clone(), value.to_vec()))
        .collect()
}

/// Dataset settings read from a directory of JSON files.
#[derive(Debug, Default)]
pub(crate) struct DatasetStore {
    datasets: BTreeMap<PathBuf, DatasetSpec>,
}

impl DatasetStore {
    /// Reads all `*.json` files below `dir`.
    pub(crate) fn from_dir<P: AsRef<Path>>(dir: P) -> TaggerResult<Self> {
        let pattern = format!("{}/**/*.json", dir.as_ref().display());
        let mut files: Vec<PathBuf> = glob_with(&pattern, Default::default())?
            .filter_map(Result::ok)
            .collect();
        files.sort();

        let mut store = Self::default();
        for path in files {
            let file = StoreFile::from_path(&path).map_err(|e| {
                TaggerError::other(format!(
                    "invalid dataset config '{}': {e}",
                    path.display()
                ))
            })?;

            store.insert(file);
        }

        Ok(store)
    }

    pub(crate) fn insert(&mut self, file: StoreFile) {
        for dataset in file.filters.keys() {
            if !file.datasets.contains(dataset) {
                log::warn!("filters of unknown dataset {}", dataset.display());
            }
        }

        for dataset in file.datasets.iter() {
            let spec = DatasetSpec {
                mappings: file.mappings.clone(),
                defaults: file.defaults.clone(),
                overrides: file.overrides.clone(),
                realisation: file
                    .realisations
                    .get(&*dataset.to_string_lossy())
                    .cloned(),
                filters: file.filters.get(dataset).cloned().unwrap_or_default(),
            };

            self.datasets.insert(dataset.clone(), spec);
        }
    }

    /// Returns the settings of the registered dataset that contains
    /// `path`. If several datasets contain the path, the innermost one
    /// is chosen.
    pub(crate) fn lookup(&self, path: &Path) -> Option<&DatasetSpec> {
        path.ancestors().find_map(|dir| self.datasets.get(dir))
    }

    pub(crate) fn len(&self) -> usize {
        self.datasets.len()
    }
}
