use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::pager::Pager;
use crate::prelude::*;
use crate::query;
use crate::search::Hit;

/// A dataset as stored in the collections index.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Collection {
    pub(crate) collection_id: String,
    pub(crate) title: String,
    pub(crate) path: Option<String>,

    #[serde(rename = "drsId")]
    pub(crate) drs_ids: Vec<String>,
}

impl Collection {
    pub(crate) fn from_hit(hit: Hit) -> Self {
        let mut collection: Self =
            serde_json::from_value(hit.source).unwrap_or_default();
        if collection.collection_id.is_empty() {
            collection.collection_id = hit.id;
        }

        collection
    }
}

/// The state of a panel in the rendered page. Every panel is written
/// as `NotLoaded`; the page script moves it on once the panel is
/// expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum PanelState {
    NotLoaded,

    /// Queries were issued, but the listing isn't complete. A panel
    /// stays in this state if a query failed.
    Loading,

    Loaded,
}

impl PanelState {
    pub(crate) const ALL: [Self; 3] = [Self::NotLoaded, Self::Loading, Self::Loaded];
}

/// A dataset of an ECV page and its file statistics.
#[derive(Debug)]
pub(crate) struct Panel {
    pub(crate) collection: Collection,
    pub(crate) total_files: Option<u64>,
    pub(crate) files_without_drs: Option<u64>,
}

impl Panel {
    pub(crate) fn new(collection: Collection) -> Self {
        Self {
            collection,
            total_files: None,
            files_without_drs: None,
        }
    }

    /// Counts all files and the files without DRS of the dataset. A
    /// failed count is logged and leaves the statistics unset.
    pub(crate) async fn count<S: SearchIndex>(&mut self, index: &S, config: &Config) {
        if let Err(e) = self.fetch_counts(index, config).await {
            log::warn!(
                "unable to count files of {}: {e}",
                self.collection.collection_id
            );
        }
    }

    async fn fetch_counts<S: SearchIndex>(
        &mut self,
        index: &S,
        config: &Config,
    ) -> TagcheckResult<()> {
        let search = &config.search;
        let dataset = &self.collection.collection_id;
        let files = &search.files_index;

        let total = query::dataset_files(search, dataset);
        self.total_files = Some(index.count(files, &query::count(&total)).await?);

        let missing = query::missing_drs(search, dataset);
        self.files_without_drs =
            Some(index.count(files, &query::count(&missing)).await?);

        Ok(())
    }
}

/// Returns the panels of an ECV. Only the file statistics are queried;
/// the files themselves are listed by the page once a panel is
/// expanded.
pub(crate) async fn panels<S: SearchIndex>(
    index: &S,
    config: &Config,
    ecv: &str,
) -> TagcheckResult<Vec<Panel>> {
    let mut panels: Vec<Panel> = collections(index, config, ecv)
        .await?
        .into_iter()
        .map(Panel::new)
        .collect();

    for panel in panels.iter_mut() {
        panel.count(index, config).await;
    }

    Ok(panels)
}

/// Returns the collections of an ECV, ordered by id.
pub(crate) async fn collections<S: SearchIndex>(
    index: &S,
    config: &Config,
    ecv: &str,
) -> TagcheckResult<Vec<Collection>> {
    let pager = Pager::new(
        index,
        &config.search.collections_index,
        query::collections(ecv),
        &config.search.sort_field,
        config.page.page_size,
    );

    let hits = crate::pager::collect_all(pager).await?;
    Ok(hits.into_iter().map(Collection::from_hit).collect())
}

/// Returns the ECVs of all collections.
pub(crate) async fn ecvs<S: SearchIndex>(
    index: &S,
    config: &Config,
) -> TagcheckResult<Vec<String>> {
    let response = index
        .search(&config.search.collections_index, &query::ecvs())
        .await?;

    let mut ecvs = response.bucket_keys("ecvs");
    ecvs.retain(|ecv| ecv != query::UMBRELLA);
    ecvs.sort();
    Ok(ecvs)
}

/// Returns the DRS identifiers of the datasets, without duplicates.
pub(crate) fn drs_ids(panels: &[Panel]) -> Vec<&str> {
    let mut ids: Vec<&str> = panels
        .iter()
        .flat_map(|p| p.collection.drs_ids.iter().map(String::as_str))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
