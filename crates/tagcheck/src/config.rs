use std::path::{Path, PathBuf};
use std::{env, fs};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{bail, TagcheckError, TagcheckResult};

/// Tagcheck config.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Config {
    /// The path of the config.
    #[serde(skip)]
    path: PathBuf,

    /// Location and field names of the search indices.
    #[serde(default)]
    pub(crate) search: SearchConfig,

    /// Options of the rendered pages.
    #[serde(default)]
    pub(crate) page: PageConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct SearchConfig {
    pub(crate) host: Url,

    /// The index holding one document per file.
    pub(crate) files_index: String,

    /// The index holding one document per dataset (collection).
    pub(crate) collections_index: String,

    /// The field of a file document which holds its DRS identifiers.
    pub(crate) drs_field: String,

    /// The field of a file document which refers to its dataset.
    pub(crate) dataset_field: String,

    /// A stable sort key of file and collection documents. The
    /// `search_after` cursor is taken from this field.
    pub(crate) sort_field: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            host: Url::parse("http://localhost:9200").unwrap(),
            files_index: "opensearch-files".into(),
            collections_index: "opensearch-collections".into(),
            drs_field: "projects.opensearch.drsId".into(),
            dataset_field: "projects.opensearch.datasetId.keyword".into(),
            sort_field: "_id".into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct PageConfig {
    /// The maximum number of files listed in a panel.
    pub(crate) cap: usize,

    /// The number of documents requested per query.
    pub(crate) page_size: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            cap: 1000,
            page_size: 100,
        }
    }
}

impl Config {
    pub(crate) const FILENAME: &'static str = "tagcheck.toml";

    /// Discovers the config of the renderer.
    ///
    /// If neither the current directory nor any parent directory
    /// contains a [Config], the defaults are used.
    pub(crate) fn discover() -> TagcheckResult<Self> {
        let mut root_dir = env::current_dir()?;

        loop {
            if let Ok(metadata) = fs::metadata(root_dir.join(Self::FILENAME))
            {
                if metadata.is_file() {
                    return Self::from_path(root_dir.join(Self::FILENAME));
                }
            }

            if !root_dir.pop() {
                log::info!("{} not found, using defaults", Self::FILENAME);
                return Ok(Self::default());
            }
        }
    }

    /// Loads an existing config from a path.
    pub(crate) fn from_path<P>(path: P) -> TagcheckResult<Self>
    where
        P: AsRef<Path>,
    {
        let path: PathBuf = path.as_ref().into();
        let content = fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)?;

        if config.page.page_size == 0 {
            bail!("invalid page size 0 in {}", path.display());
        }

        Ok(Self { path, ..config })
    }
}
