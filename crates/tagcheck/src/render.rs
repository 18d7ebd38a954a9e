use std::fs;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;

use crate::panel::{self, Panel, PanelState};
use crate::prelude::*;
use crate::query;
use crate::search;

const INDEX_TITLE: &str = "CCI tag check";

/// File name of the page of an ECV.
pub(crate) fn ecv_file_name(ecv: &str) -> String {
    let name: String = ecv
        .chars()
        .map(|c| match c {
            '/' | '\\' | ' ' => '-',
            c => c,
        })
        .collect();

    format!("{name}.html")
}

#[derive(Debug, Serialize)]
struct EcvLink<'a> {
    name: &'a str,
    href: String,
}

#[derive(Debug, Serialize)]
struct IndexView<'a> {
    title: &'a str,
    ecvs: Vec<EcvLink<'a>>,
}

#[derive(Debug, Serialize)]
struct PanelView<'a> {
    id: &'a str,
    title: &'a str,
    path: Option<&'a str>,
    counts: String,
    class: &'static str,
    state: PanelState,

    /// The body of the request for the first page of files without
    /// DRS, as JSON.
    page: String,
}

/// Settings read by the page script.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfig {
    search_url: String,
    cap: usize,
    states: [PanelState; 3],
}

#[derive(Debug, Serialize)]
struct EcvView<'a> {
    title: &'a str,
    dataset_count: usize,
    panels: Vec<PanelView<'a>>,
    drs_count: usize,
    drs_ids: Vec<&'a str>,

    /// The [ClientConfig] as JSON, embedded in a script element.
    client: String,
}

/// Serializes a value to JSON which can be placed in a script element.
fn script_json<T: Serialize>(value: &T) -> TagcheckResult<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Renders the pages and writes them below an output directory.
pub(crate) struct PageWriter<'a> {
    dir: PathBuf,
    config: &'a Config,
    templates: Handlebars<'static>,
}

impl<'a> PageWriter<'a> {
    pub(crate) const ECV_DIR: &'static str = "ecvs";

    pub(crate) fn new<P: AsRef<Path>>(
        dir: P,
        config: &'a Config,
    ) -> TagcheckResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(dir.join(Self::ECV_DIR))?;

        let mut templates = Handlebars::new();
        templates.register_partial("head", include_str!("../templates/head.hbs"))?;
        templates.register_template_string(
            "index",
            include_str!("../templates/index.hbs"),
        )?;
        templates
            .register_template_string("ecv", include_str!("../templates/ecv.hbs"))?;

        Ok(Self {
            dir,
            config,
            templates,
        })
    }

    /// Renders the page listing all ECVs.
    pub(crate) fn render_index(&self, ecvs: &[String]) -> TagcheckResult<String> {
        let view = IndexView {
            title: INDEX_TITLE,
            ecvs: ecvs
                .iter()
                .map(|ecv| EcvLink {
                    name: ecv,
                    href: format!("{}/{}", Self::ECV_DIR, ecv_file_name(ecv)),
                })
                .collect(),
        };

        Ok(self.templates.render("index", &view)?)
    }

    fn panel_view<'p>(&self, panel: &'p Panel) -> TagcheckResult<PanelView<'p>> {
        let search = &self.config.search;
        let collection = &panel.collection;
        let title = if collection.title.is_empty() {
            &collection.collection_id
        } else {
            &collection.title
        };

        let counts = match (panel.total_files, panel.files_without_drs) {
            (Some(total), Some(missing)) => {
                format!("{missing} of {total} files without DRS")
            }
            _ => "file counts unavailable".to_string(),
        };

        let class = match panel.files_without_drs {
            Some(0) => "ok",
            _ => "missing",
        };

        let page_size = self.config.page.page_size.min(self.config.page.cap);
        let page = query::page(
            &query::missing_drs(search, &collection.collection_id),
            &search.sort_field,
            page_size.max(1),
            None,
        );

        Ok(PanelView {
            id: &collection.collection_id,
            title,
            path: collection.path.as_deref(),
            counts,
            class,
            state: PanelState::NotLoaded,
            page: serde_json::to_string(&page)?,
        })
    }

    /// Renders the page of an ECV with one panel per dataset. The
    /// panels are written unloaded; the files of a dataset are queried
    /// by the page once its panel is expanded.
    pub(crate) fn render_ecv(
        &self,
        ecv: &str,
        panels: &[Panel],
    ) -> TagcheckResult<String> {
        let search = &self.config.search;
        let client = ClientConfig {
            search_url: search::endpoint(&search.host, &search.files_index, "_search")?
                .to_string(),
            cap: self.config.page.cap,
            states: PanelState::ALL,
        };

        let drs_ids = panel::drs_ids(panels);
        let view = EcvView {
            title: ecv,
            dataset_count: panels.len(),
            panels: panels
                .iter()
                .map(|panel| self.panel_view(panel))
                .collect::<TagcheckResult<_>>()?,
            drs_count: drs_ids.len(),
            drs_ids,
            client: script_json(&client)?,
        };

        Ok(self.templates.render("ecv", &view)?)
    }

    pub(crate) fn write_ecv(
        &self,
        ecv: &str,
        panels: &[Panel],
    ) -> TagcheckResult<PathBuf> {
        let path = self.dir.join(Self::ECV_DIR).join(ecv_file_name(ecv));
        fs::write(&path, self.render_ecv(ecv, panels)?)?;
        Ok(path)
    }

    pub(crate) fn write_index(&self, ecvs: &[String]) -> TagcheckResult<PathBuf> {
        let path = self.dir.join("index.html");
        fs::write(&path, self.render_index(ecvs)?)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::panel::Collection;
    type TestResult = anyhow::Result<()>;

    fn panel() -> Panel {
        let mut panel = Panel::new(Collection {
            collection_id: "abc\"123".into(),
            title: "Sea <Surface> Temperature".into(),
            path: Some("/neodc/esacci/sst".into()),
            drs_ids: vec!["esacci.SST.r1".into()],
        });

        panel.total_files = Some(4);
        panel.files_without_drs = Some(2);
        panel
    }

    #[test]
    fn render_index_page() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::default();
        let writer = PageWriter::new(dir.path(), &config)?;

        let html = writer.render_index(&["SST".into(), "SEA ICE".into()])?;
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>CCI tag check</title>"));
        assert!(html.contains("<a href=\"ecvs/SST.html\">SST</a>"));
        assert!(html.contains("<a href=\"ecvs/SEA-ICE.html\">SEA ICE</a>"));
        assert!(html.trim_end().ends_with("</html>"));
        Ok(())
    }

    #[test]
    fn render_ecv_page() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut config = Config::default();
        config.search.host = Url::parse("http://proxy.example.org/es")?;
        config.page.cap = 50;

        let writer = PageWriter::new(dir.path(), &config)?;
        let html = writer.render_ecv("SST", &[panel()])?;

        assert!(html.contains("id=\"abc&quot;123\""));
        assert!(html.contains("Sea &lt;Surface&gt; Temperature"));
        assert!(html.contains("(2 of 4 files without DRS)"));
        assert!(html.contains("<code>/neodc/esacci/sst</code>"));
        assert!(html.contains("<li><code>esacci.SST.r1</code></li>"));
        assert!(html.contains("Datasets (1)"));

        // every panel starts unloaded and carries its first query
        assert!(html.contains("data-state=\"not-loaded\""));
        assert!(html.contains("&quot;size&quot;:50"));
        assert!(html.contains("&quot;must_not&quot;"));
        assert!(!html.contains("&quot;search_after&quot;"));

        assert!(html.contains(
            "\"searchUrl\":\"http://proxy.example.org/es/opensearch-files/_search\""
        ));
        assert!(html.contains("\"states\":[\"not-loaded\",\"loading\",\"loaded\"]"));
        assert!(html.contains("addEventListener(\"toggle\""));
        Ok(())
    }

    #[test]
    fn render_panel_without_counts() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::default();
        let writer = PageWriter::new(dir.path(), &config)?;

        let panel = Panel::new(Collection {
            collection_id: "abc".into(),
            ..Default::default()
        });

        let html = writer.render_ecv("SST", &[panel])?;
        assert!(html.contains("<summary>abc <span class=\"missing\">"));
        assert!(html.contains("(file counts unavailable)"));
        assert!(html.contains("DRS identifiers (0)"));
        assert!(!html.contains("Path:"));
        Ok(())
    }

    #[test]
    fn script_json_escapes_end_tag() -> TestResult {
        assert_eq!(script_json(&"</script>")?, "\"<\\/script>\"");
        Ok(())
    }

    #[test]
    fn write_pages() -> TestResult {
        let dir = tempfile::tempdir()?;
        let config = Config::default();
        let writer = PageWriter::new(dir.path().join("html"), &config)?;

        let path = writer.write_ecv("SST", &[])?;
        assert_eq!(path, dir.path().join("html/ecvs/SST.html"));
        assert!(path.is_file());

        let path = writer.write_index(&["SST".into()])?;
        assert!(fs::read_to_string(path)?.contains("ecvs/SST.html"));
        Ok(())
    }
}
