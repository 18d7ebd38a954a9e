use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};

use crate::error::{bail, TaggerError, TaggerResult};
use crate::facet;

const LEVEL_2_FREQUENCY: &str = "satellite-orbit";

/// Tagger config.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Config {
    /// The path of the config.
    #[serde(skip)]
    path: PathBuf,

    /// Location and matching options of the vocabulary table.
    #[serde(default)]
    pub(crate) vocab: VocabConfig,

    /// Aliases for non-compliant terms, grouped by facet. The key is
    /// the raw term found in the data, the value is the canonical term
    /// of the vocabulary.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub(crate) aliases: BTreeMap<String, BTreeMap<String, String>>,

    /// Construction of DRS identifiers.
    #[serde(default)]
    pub(crate) drs: DrsConfig,

    /// Runtime options.
    #[serde(default)]
    pub(crate) runtime: Runtime,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct VocabConfig {
    /// A CSV file with the columns `property`, `term`, `url` and an
    /// optional `broader` column. Relative paths are resolved against
    /// the directory of the config.
    ///
    /// Platforms name their programme as broader concept, programmes
    /// (`platform_programme`) their group (`platform_group`).
    pub(crate) path: Option<PathBuf>,

    #[serde(default)]
    pub(crate) case_ignore: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct DrsConfig {
    pub(crate) project: String,

    /// The facets of a DRS identifier in the order of appearance.
    pub(crate) facets: Vec<String>,

    /// Facets which are taken as is and not looked up in the
    /// vocabulary.
    pub(crate) free_facets: Vec<String>,

    /// The frequency term used for level 2 products. Defaults to
    /// `satellite-orbit`.
    pub(crate) level_2_frequency: Option<String>,
}

impl Default for DrsConfig {
    fn default() -> Self {
        Self {
            project: "esacci".into(),
            facets: facet::DRS_ORDER.iter().map(|s| s.to_string()).collect(),
            free_facets: vec![facet::PRODUCT_VERSION.into()],
            level_2_frequency: Some(LEVEL_2_FREQUENCY.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct Runtime {
    /// How many files to look at per dataset. A value of "0" means
    /// all files.
    pub(crate) file_count: usize,

    /// Whether to compute a SHA-256 checksum for each file.
    pub(crate) checksum: bool,

    /// Whether to consult the alias table for unmapped terms.
    pub(crate) use_mapping: bool,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            file_count: 0,
            checksum: true,
            use_mapping: false,
        }
    }
}

impl Config {
    pub(crate) const FILENAME: &'static str = "tagger.toml";

    /// Discovers the config of the tagger.
    ///
    /// This function fails, if neither the current directory nor any
    /// parent directory contains a [Config].
    pub(crate) fn discover() -> TaggerResult<Self> {
        let mut root_dir = env::current_dir()?;

        loop {
            if let Ok(metadata) = fs::metadata(root_dir.join(Self::FILENAME))
            {
                if metadata.is_file() {
                    break;
                }
            }

            if !root_dir.pop() {
                bail!("{} not found (or any parent directory)", Self::FILENAME);
            }
        }

        Self::from_path(root_dir.join(Self::FILENAME))
    }

    /// Loads an existing config from a path.
    pub(crate) fn from_path<P>(path: P) -> TaggerResult<Self>
    where
        P: AsRef<Path>,
    {
        let path: PathBuf = path.as_ref().into();
        let content = fs::read_to_string(&path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.path = path;

        Ok(config)
    }

    /// Returns the location of the vocabulary table.
    pub(crate) fn vocab_path(&self) -> Option<PathBuf> {
        let path = self.vocab.path.as_ref()?;
        if path.is_absolute() {
            return Some(path.clone());
        }

        match self.path.parent() {
            Some(parent) => Some(parent.join(path)),
            None => Some(path.clone()),
        }
    }
}
