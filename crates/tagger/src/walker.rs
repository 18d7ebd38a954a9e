use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::path::{Path, PathBuf};

use glob::{glob_with, MatchOptions, Pattern};

use crate::drs::{DrsBuilder, ResolvedFields};
use crate::extract::{split_attribute, ExtractError, Fields, MetadataExtractor};
use crate::facet;
use crate::prelude::*;
use crate::resolver::{ResolutionError, ResolvedFacet, TermResolver};
use crate::store::{DatasetSpec, DatasetStore};
use crate::utils::sha256;

const PBAR_TAG: &str = "Tagging files: {human_pos} ({percent}%) | \
        elapsed: {elapsed_precise}{msg}";

/// Extensions of files which are expected to carry a DRS.
const DATA_EXTENSIONS: [&str; 4] = ["nc", "prj", "shp", "shx"];

/// A file of a dataset.
#[derive(Debug, Default, Clone)]
pub(crate) struct FileRecord {
    pub(crate) path: PathBuf,

    /// The metadata fields after mappings and overrides were applied.
    pub(crate) fields: Fields,

    pub(crate) drs: Option<String>,
    pub(crate) checksum: Option<String>,
}

/// The outcome of walking a dataset.
#[derive(Debug, Default)]
pub(crate) struct DatasetRecord {
    pub(crate) path: PathBuf,
    pub(crate) files: Vec<FileRecord>,

    /// Vocabulary URLs of all resolved terms, keyed by facet.
    pub(crate) terms: BTreeMap<String, BTreeSet<String>>,

    /// Facet and value of terms which aren't in the vocabulary.
    pub(crate) unmapped: BTreeSet<(String, String)>,

    pub(crate) errors: Vec<String>,
}

/// Summary of a tagged dataset.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct TaggingResult<'a> {
    pub(crate) dataset: &'a Path,
    pub(crate) vocabulary_urls: BTreeSet<&'a str>,
    pub(crate) files_without_drs: usize,
    pub(crate) total_files: usize,
    pub(crate) errors: &'a [String],
}

impl DatasetRecord {
    fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    fn error<E: Display>(&mut self, path: &Path, e: E) {
        self.errors.push(format!("{}: {e}", path.display()));
    }

    fn tag(&mut self, facet: &str, url: &str) {
        self.terms
            .entry(facet.to_string())
            .or_default()
            .insert(url.to_string());
    }

    #[inline]
    pub(crate) fn total_files(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn files_without_drs(&self) -> usize {
        self.files.iter().filter(|file| file.drs.is_none()).count()
    }

    pub(crate) fn result(&self) -> TaggingResult<'_> {
        TaggingResult {
            dataset: &self.path,
            vocabulary_urls: self
                .terms
                .values()
                .flatten()
                .map(String::as_str)
                .collect(),
            files_without_drs: self.files_without_drs(),
            total_files: self.total_files(),
            errors: &self.errors,
        }
    }
}

/// Walks the files of a dataset and derives their DRS identifiers.
pub(crate) struct DatasetWalker<'a, E> {
    resolver: TermResolver<'a>,
    builder: &'a DrsBuilder,
    extractor: E,
    store: Option<&'a DatasetStore>,
    free_facets: Vec<String>,
    level_2_frequency: Option<String>,
    checksum: bool,
    quiet: bool,
}

impl<'a, E: MetadataExtractor> DatasetWalker<'a, E> {
    pub(crate) fn new(
        resolver: TermResolver<'a>,
        builder: &'a DrsBuilder,
        extractor: E,
    ) -> Self {
        Self {
            resolver,
            builder,
            extractor,
            store: None,
            free_facets: vec![],
            level_2_frequency: None,
            checksum: false,
            quiet: true,
        }
    }

    pub(crate) fn store(mut self, store: &'a DatasetStore) -> Self {
        self.store = Some(store);
        self
    }

    pub(crate) fn free_facets(mut self, facets: &[String]) -> Self {
        self.free_facets = facets.to_vec();
        self
    }

    /// Sets the frequency term of level 2 products. An empty term
    /// disables the rule.
    pub(crate) fn level_2_frequency(mut self, term: Option<String>) -> Self {
        self.level_2_frequency = term.filter(|term| !term.is_empty());
        self
    }

    pub(crate) fn checksum(mut self, yes: bool) -> Self {
        self.checksum = yes;
        self
    }

    pub(crate) fn quiet(mut self, yes: bool) -> Self {
        self.quiet = yes;
        self
    }

    /// Walks the dataset at `path`. If `limit` is greater than zero, at
    /// most `limit` files are processed.
    ///
    /// Errors of single files and of the dataset itself are collected
    /// in the record; they never abort the walk.
    pub(crate) fn walk(&self, path: &Path, limit: usize) -> DatasetRecord {
        let mut record = DatasetRecord::new(path);

        let spec = self
            .store
            .and_then(|store| store.lookup(path))
            .cloned()
            .unwrap_or_default();

        if !path.is_dir() {
            log::error!("dataset not found: {}", path.display());
            record.error(path, "dataset not found");
            return record;
        }

        let files = match list_files(path, limit) {
            Ok(files) if files.is_empty() => {
                log::error!("no files found for {}", path.display());
                record.error(path, "no files found");
                return record;
            }
            Ok(files) => files,
            Err(e) => {
                record.error(path, e);
                return record;
            }
        };

        log::info!(
            "dataset {}: processing {} files",
            path.display(),
            files.len()
        );

        let pbar = ProgressBarBuilder::new(PBAR_TAG, self.quiet)
            .len(files.len() as u64)
            .build();

        for file in files {
            let file = self.process_file(file, &spec, &mut record);
            if file.drs.is_none() {
                log::debug!("no DRS for {}: {:?}", file.path.display(), file.fields);
            }

            record.files.push(file);
            pbar.inc(1);
        }

        pbar.finish_and_clear();
        record
    }

    fn process_file(
        &self,
        path: PathBuf,
        spec: &DatasetSpec,
        record: &mut DatasetRecord,
    ) -> FileRecord {
        let mut file = FileRecord {
            path,
            ..Default::default()
        };

        if self.checksum {
            match sha256(&file.path) {
                Ok(hash) => file.checksum = Some(hash),
                Err(e) => record.error(
                    &file.path,
                    ExtractError::Unreadable {
                        path: file.path.display().to_string(),
                        reason: e.to_string(),
                    },
                ),
            }
        }

        let mut fields = spec.defaults();
        match self.extractor.extract(&file.path) {
            Ok(extracted) => fields.extend(extracted),
            Err(e) => {
                log::error!("{e} in dataset {}", record.path.display());
                record.error(&file.path, e);
                file.fields = fields;
                return file;
            }
        }

        for name in facet::GLOBAL_ATTRS {
            if let Some(values) = fields.get_mut(name) {
                *values = values
                    .iter()
                    .flat_map(|value| split_attribute(name, value))
                    .collect();
            }
        }

        spec.apply_mappings(&mut fields);
        spec.apply_overrides(&mut fields);
        self.apply_level_2_frequency(&mut fields);

        let resolved = self.resolve(&file.path, &fields, record);
        if !spec.is_excluded(&file.path) {
            let realisation = spec.realisation_of(&file.path);
            file.drs = self
                .builder
                .build(&resolved)
                .map(|drs| format!("{drs}.{realisation}"));
        }

        file.fields = fields;
        file
    }

    /// Level 2 products are mapped to the satellite orbit frequency.
    fn apply_level_2_frequency(&self, fields: &mut Fields) {
        let Some(ref frequency) = self.level_2_frequency else {
            return;
        };

        let is_level_2 = fields
            .get(facet::PROCESSING_LEVEL)
            .is_some_and(|levels| levels.iter().any(|l| l.contains('2')));

        if is_level_2 {
            fields.insert(facet::FREQUENCY.into(), vec![frequency.clone()]);
        }
    }

    fn resolve(
        &self,
        path: &Path,
        fields: &Fields,
        record: &mut DatasetRecord,
    ) -> ResolvedFields {
        let mut resolved = ResolvedFields::new();

        let names: BTreeSet<&str> = self
            .builder
            .facets()
            .iter()
            .map(String::as_str)
            .chain(
                fields
                    .keys()
                    .map(String::as_str)
                    .filter(|name| facet::is_moles_facet(name)),
            )
            .collect();

        for name in names {
            let values = fields.get(name).map(Vec::as_slice).unwrap_or_default();

            if self.free_facets.iter().any(|f| f == name) {
                match values.first() {
                    Some(value) => {
                        let facet = ResolvedFacet::free(name, value);
                        resolved.insert(facet.property.clone(), facet);
                    }
                    None => self.missing(path, name, record),
                }

                continue;
            }

            match self.resolver.resolve_facet(name, values) {
                Ok(facet) => {
                    for term in facet.terms.iter() {
                        record.tag(&term.property, &term.url);
                        for (broader, url) in self.resolver.broader(term) {
                            record.tag(broader, &url);
                        }
                    }

                    resolved.insert(facet.property.clone(), facet);
                }
                Err(errors) => {
                    for e in errors {
                        match e {
                            ResolutionError::Missing { .. } => {
                                self.missing(path, name, record);
                                continue;
                            }
                            ResolutionError::Unmapped {
                                ref property,
                                ref value,
                            } => {
                                record.unmapped.insert((property.clone(), value.clone()));
                            }
                            _ => (),
                        }

                        log::warn!("{e} in dataset {}", record.path.display());
                        record.error(path, e);
                    }
                }
            }
        }

        resolved
    }

    fn missing(&self, path: &Path, name: &str, record: &mut DatasetRecord) {
        let e = ResolutionError::Missing {
            property: name.into(),
        };

        let is_data = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| DATA_EXTENSIONS.contains(&ext));

        if is_data {
            log::error!("{e} in dataset {} for file {}", record.path.display(), path.display());
        } else {
            log::warn!("{e} in dataset {} for file {}", record.path.display(), path.display());
        }

        record.error(path, e);
    }
}

/// Lists the regular files below `dir` in sorted order.
///
/// If `limit` is greater than zero, the first `limit` netCDF files are
/// returned; datasets without netCDF files fall back to the first
/// `limit` files of any kind.
pub(crate) fn list_files(dir: &Path, limit: usize) -> TaggerResult<Vec<PathBuf>> {
    let base = Pattern::escape(&dir.to_string_lossy());
    let collect = |pattern: &str| -> TaggerResult<Vec<PathBuf>> {
        let pattern = format!("{base}/{pattern}");
        let mut files: Vec<PathBuf> = glob_with(&pattern, MatchOptions::default())?
            .filter_map(Result::ok)
            .filter(|path| path.is_file())
            .collect();

        files.sort();
        Ok(files)
    };

    if limit == 0 {
        return collect("**/*");
    }

    let mut files = collect("**/*.nc")?;
    if files.is_empty() {
        files = collect("**/*")?;
    }

    files.truncate(limit);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::extract::FileNameExtractor;
    use crate::report::ReportWriter;
    use crate::store::StoreFile;
    use crate::vocab::{Vocabulary, VocabularyEntry};
    type TestResult = anyhow::Result<()>;

    /// Reads the fields from `key=value` lines of the file itself.
    struct KeyValueExtractor;

    impl MetadataExtractor for KeyValueExtractor {
        fn extract(&self, path: &Path) -> Result<Fields, ExtractError> {
            let content = fs::read_to_string(path).map_err(|e| {
                ExtractError::Unreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            })?;

            let mut fields = Fields::new();
            for line in content.lines() {
                let Some((key, value)) = line.split_once('=') else {
                    return Err(ExtractError::InvalidFileName(
                        path.display().to_string(),
                    ));
                };

                fields.entry(key.into()).or_default().push(value.into());
            }

            Ok(fields)
        }
    }

    fn vocab() -> Vocabulary {
        let mut vocab = Vocabulary::new(false);
        let entries = [
            ("ecv", "ecv", "http://vocab/ecv/ecv", None),
            (
                "processing_level",
                "l3c",
                "http://vocab/proc/l3c",
                Some("http://vocab/proc/l3"),
            ),
            ("processing_level", "L2P", "http://vocab/proc/l2p", None),
            ("ecv", "SST", "http://vocab/ecv/sst", None),
            ("data_type", "SSTskin", "http://vocab/type/sstskin", None),
            ("product_string", "AVHRR16_G", "http://vocab/product/avhrr", None),
            ("sensor", "AVHRR", "http://vocab/sensor/avhrr", None),
            ("sensor", "AATSR", "http://vocab/sensor/aatsr", None),
            ("time_coverage_resolution", "day", "http://vocab/freq/day", None),
            (
                "time_coverage_resolution",
                "satellite-orbit",
                "http://vocab/freq/orbit",
                None,
            ),
            (
                "platform",
                "NOAA-16",
                "http://vocab/platform/noaa-16",
                Some("http://vocab/prog/noaa"),
            ),
            (
                "platform_programme",
                "NOAA",
                "http://vocab/prog/noaa",
                Some("http://vocab/grp/poes"),
            ),
            ("platform_group", "POES", "http://vocab/grp/poes", None),
        ];

        for (property, term, url, broader) in entries {
            vocab.insert(VocabularyEntry {
                property: property.into(),
                term: term.into(),
                url: url.into(),
                broader: broader.map(String::from),
            });
        }

        vocab.insert_alias("sensor", "AVHRR_GAC", "AVHRR");
        vocab
    }

    #[test]
    fn walk_scenario() -> TestResult {
        let dir = tempfile::tempdir()?;
        let dataset = dir.path().join("dataset");
        fs::create_dir_all(dataset.join("sub"))?;
        fs::write(dataset.join("a.nc"), "ecv=ecv\nprocessing_level=l3c")?;
        fs::write(dataset.join("sub/b.nc"), "ecv=ecv\nprocessing_level=l3c")?;
        fs::write(dataset.join("c.nc"), "ecv=ecv")?;

        let vocab = vocab();
        let builder = DrsBuilder::new("proj", ["ecv", "processing_level"]);
        let walker = DatasetWalker::new(
            TermResolver::new(&vocab, false),
            &builder,
            KeyValueExtractor,
        );

        let record = walker.walk(&dataset, 0);
        assert_eq!(record.total_files(), 3);
        assert_eq!(record.files_without_drs(), 1);
        assert_eq!(record.errors.len(), 1);
        assert!(record.errors[0].contains("processing_level"));

        let drs: Vec<_> = record.files.iter().map(|f| f.drs.as_deref()).collect();
        assert_eq!(
            drs,
            vec![Some("proj.ecv.l3c.r1"), None, Some("proj.ecv.l3c.r1")]
        );

        let result = record.result();
        assert_eq!(result.total_files, 3);
        assert_eq!(result.files_without_drs, 1);
        assert!(result.vocabulary_urls.contains("http://vocab/proc/l3"));

        let out = dir.path().join("out");
        fs::create_dir_all(&out)?;
        ReportWriter::new(&out).write(&[record])?;

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("esgf_drs.json"))?)?;
        let groups = json.as_object().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["proj.ecv.l3c.r1"].as_array().unwrap().len(), 2);

        let log = fs::read_to_string(out.join("error.log"))?;
        assert_eq!(log.lines().count(), 1);
        Ok(())
    }

    #[test]
    fn walk_resolves_global_attributes() -> TestResult {
        let dir = tempfile::tempdir()?;
        let dataset = dir.path().join("sst");
        fs::create_dir_all(&dataset)?;
        fs::write(
            dataset.join("f.nc"),
            "ecv=SST\nprocessing_level=l3c\nsensor=AVHRR_GAC;AATSR\n\
             time_coverage_resolution=day",
        )?;

        let vocab = vocab();
        let builder = DrsBuilder::new(
            "esacci",
            ["ecv", "time_coverage_resolution", "sensor"],
        );

        let walker = DatasetWalker::new(
            TermResolver::new(&vocab, true),
            &builder,
            KeyValueExtractor,
        );

        let record = walker.walk(&dataset, 0);
        assert!(record.errors.is_empty(), "{:?}", record.errors);
        assert_eq!(
            record.files[0].drs.as_deref(),
            Some("esacci.SST.day.multi-sensor.r1")
        );
        assert_eq!(record.terms["sensor"].len(), 2);
        assert_eq!(record.terms["broader_processing_level"].len(), 1);

        // without aliases AVHRR_GAC is unknown
        let walker = DatasetWalker::new(
            TermResolver::new(&vocab, false),
            &builder,
            KeyValueExtractor,
        );
        let record = walker.walk(&dataset, 0);
        assert_eq!(record.files_without_drs(), 1);
        assert!(record.errors[0].contains("AVHRR_GAC"));
        Ok(())
    }

    #[test]
    fn walk_with_store() -> TestResult {
        let dir = tempfile::tempdir()?;
        let dataset = dir.path().join("sst");
        fs::create_dir_all(&dataset)?;
        let name = "20030101-ESACCI-L2P_SST-SSTskin-AVHRR16_G-fv01.1.nc";
        fs::write(dataset.join(name), "")?;
        fs::write(dataset.join("README.txt"), "")?;

        let mut store = DatasetStore::default();
        let file: StoreFile = serde_json::from_value(serde_json::json!({
            "datasets": [dataset],
            "defaults": { "sensor": "AVHRR_GAC", "time_coverage_resolution": "day" },
            "mappings": { "sensor": { "avhrr_gac": "AVHRR" } },
            "realisations": { dataset.to_string_lossy(): "r3" }
        }))?;
        store.insert(file);

        let vocab = vocab();
        let builder = DrsBuilder::new(
            "esacci",
            [
                "ecv",
                "time_coverage_resolution",
                "processing_level",
                "data_type",
                "sensor",
                "product_string",
                "product_version",
            ],
        );

        let free = vec!["product_version".to_string()];
        let walker = DatasetWalker::new(
            TermResolver::new(&vocab, false),
            &builder,
            FileNameExtractor,
        )
        .store(&store)
        .free_facets(&free)
        .level_2_frequency(Some("satellite-orbit".into()))
        .checksum(true);

        let record = walker.walk(&dataset, 0);
        assert_eq!(record.total_files(), 2);

        let file = &record.files[0];
        assert!(file.path.ends_with(name));
        assert_eq!(
            file.drs.as_deref(),
            Some("esacci.SST.satellite-orbit.L2P.SSTskin.AVHRR.AVHRR16_G.01-1.r3")
        );
        assert_eq!(
            file.checksum.as_deref(),
            Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );

        // README.txt has no valid file name
        assert_eq!(record.files[1].drs, None);
        assert_eq!(record.errors.len(), 1);
        Ok(())
    }

    #[test]
    fn walk_excluded_dataset() -> TestResult {
        let dir = tempfile::tempdir()?;
        let dataset = dir.path().join("ds");
        fs::create_dir_all(&dataset)?;
        fs::write(dataset.join("a.nc"), "ecv=ecv\nprocessing_level=l3c")?;

        let mut store = DatasetStore::default();
        store.insert(serde_json::from_value(serde_json::json!({
            "datasets": [dataset],
            "realisations": { dataset.to_string_lossy(): "EXCLUDE" }
        }))?);

        let vocab = vocab();
        let builder = DrsBuilder::new("proj", ["ecv", "processing_level"]);
        let walker = DatasetWalker::new(
            TermResolver::new(&vocab, false),
            &builder,
            KeyValueExtractor,
        )
        .store(&store);

        let record = walker.walk(&dataset, 0);
        assert_eq!(record.files_without_drs(), 1);
        assert!(record.errors.is_empty());
        assert!(!record.terms.is_empty());
        Ok(())
    }

    #[test]
    fn walk_platform_programme() -> TestResult {
        let dir = tempfile::tempdir()?;
        let dataset = dir.path().join("sst");
        fs::create_dir_all(&dataset)?;
        fs::write(dataset.join("a.nc"), "ecv=SST\nplatform=NOAA-16")?;
        fs::write(dataset.join("b.nc"), "ecv=SST\nplatform=NOAA")?;

        let vocab = vocab();
        let builder = DrsBuilder::new("esacci", ["ecv", "platform"]);
        let walker = DatasetWalker::new(
            TermResolver::new(&vocab, false),
            &builder,
            KeyValueExtractor,
        );

        let record = walker.walk(&dataset, 0);
        assert!(record.errors.is_empty(), "{:?}", record.errors);

        let drs: Vec<_> = record.files.iter().map(|f| f.drs.as_deref()).collect();
        assert_eq!(
            drs,
            vec![
                Some("esacci.SST.NOAA-16.r1"),
                Some("esacci.SST.multi-platform.r1")
            ]
        );

        assert_eq!(record.terms["platform"].len(), 1);
        assert!(record.terms["platform_programme"].contains("http://vocab/prog/noaa"));
        assert!(record.terms["platform_group"].contains("http://vocab/grp/poes"));

        let out = dir.path().join("out");
        fs::create_dir_all(&out)?;
        ReportWriter::new(&out).write(&[record])?;

        let tags = fs::read_to_string(out.join(crate::report::MOLES_TAGS))?;
        assert!(tags.contains("http://vocab/prog/noaa"));
        assert!(tags.contains("http://vocab/grp/poes"));
        Ok(())
    }

    #[test]
    fn walk_collects_unmapped_terms() -> TestResult {
        let dir = tempfile::tempdir()?;
        let dataset = dir.path().join("sst");
        fs::create_dir_all(&dataset)?;
        fs::write(dataset.join("a.nc"), "ecv=SST\nsensor=MODIS")?;
        fs::write(dataset.join("b.nc"), "ecv=SST\nsensor=MODIS;AVHRR")?;

        let vocab = vocab();
        let builder = DrsBuilder::new("esacci", ["ecv", "sensor"]);
        let walker = DatasetWalker::new(
            TermResolver::new(&vocab, false),
            &builder,
            KeyValueExtractor,
        );

        let record = walker.walk(&dataset, 0);
        assert_eq!(record.files_without_drs(), 2);
        assert_eq!(record.errors.len(), 2);
        assert_eq!(
            record.unmapped.iter().collect::<Vec<_>>(),
            vec![&("sensor".to_string(), "MODIS".to_string())]
        );
        Ok(())
    }

    #[test]
    fn walk_realisation_filters() -> TestResult {
        let dir = tempfile::tempdir()?;
        let dataset = dir.path().join("ds");
        fs::create_dir_all(dataset.join("old"))?;
        for name in ["a.nc", "a-v2.nc", "old/c.nc"] {
            fs::write(dataset.join(name), "ecv=ecv\nprocessing_level=l3c")?;
        }

        let mut store = DatasetStore::default();
        store.insert(serde_json::from_value(serde_json::json!({
            "datasets": [dataset],
            "realisations": { dataset.to_string_lossy(): "r2" },
            "filters": {
                dataset.to_string_lossy(): [
                    { "pattern": "-v2\\.nc$", "realisation": "r4" },
                    { "pattern": "/old/", "realisation": "EXCLUDE" }
                ]
            }
        }))?);

        let vocab = vocab();
        let builder = DrsBuilder::new("proj", ["ecv", "processing_level"]);
        let walker = DatasetWalker::new(
            TermResolver::new(&vocab, false),
            &builder,
            KeyValueExtractor,
        )
        .store(&store);

        let record = walker.walk(&dataset, 0);
        assert!(record.errors.is_empty(), "{:?}", record.errors);

        let drs: Vec<_> = record
            .files
            .iter()
            .map(|f| (f.path.strip_prefix(&dataset).unwrap(), f.drs.as_deref()))
            .collect();
        assert_eq!(
            drs,
            vec![
                (Path::new("a-v2.nc"), Some("proj.ecv.l3c.r4")),
                (Path::new("a.nc"), Some("proj.ecv.l3c.r2")),
                (Path::new("old/c.nc"), None),
            ]
        );
        Ok(())
    }

    #[test]
    fn walk_twice_writes_same_reports() -> TestResult {
        let dir = tempfile::tempdir()?;
        let dataset = dir.path().join("sst");
        fs::create_dir_all(dataset.join("2003"))?;
        fs::write(
            dataset.join("a.nc"),
            "ecv=SST\nsensor=AVHRR;AATSR\ntime_coverage_resolution=day",
        )?;
        fs::write(
            dataset.join("2003/b.nc"),
            "ecv=SST\nprocessing_level=l3c\ntime_coverage_resolution=day",
        )?;
        fs::write(dataset.join("2003/c.nc"), "ecv=SST")?;

        let vocab = vocab();
        let builder = DrsBuilder::new(
            "esacci",
            ["ecv", "time_coverage_resolution", "sensor"],
        );
        let walker = DatasetWalker::new(
            TermResolver::new(&vocab, false),
            &builder,
            KeyValueExtractor,
        )
        .checksum(true);

        let out = dir.path().join("out");
        fs::create_dir_all(&out)?;

        let mut reports = vec![];
        for _ in 0..2 {
            let record = walker.walk(&dataset, 0);
            ReportWriter::new(&out).write(&[record])?;
            reports.push((
                fs::read(out.join(crate::report::ESGF_DRS))?,
                fs::read(out.join(crate::report::MOLES_TAGS))?,
            ));
        }

        assert!(!reports[0].0.is_empty());
        assert!(!reports[0].1.is_empty());
        assert_eq!(reports[0], reports[1]);
        Ok(())
    }

    #[test]
    fn level_2_frequency_rule() {
        let vocab = vocab();
        let builder = DrsBuilder::new("proj", ["ecv"]);
        let walker = DatasetWalker::new(
            TermResolver::new(&vocab, false),
            &builder,
            KeyValueExtractor,
        );

        let mut fields = Fields::new();
        fields.insert("processing_level".into(), vec!["L2P".into()]);
        fields.insert("time_coverage_resolution".into(), vec!["day".into()]);

        let walker = walker.level_2_frequency(Some(String::new()));
        let mut unchanged = fields.clone();
        walker.apply_level_2_frequency(&mut unchanged);
        assert_eq!(unchanged["time_coverage_resolution"], vec!["day"]);

        let walker = walker.level_2_frequency(Some("satellite-orbit".into()));
        walker.apply_level_2_frequency(&mut fields);
        assert_eq!(fields["time_coverage_resolution"], vec!["satellite-orbit"]);
    }

    #[test]
    fn walk_missing_dataset() {
        let vocab = vocab();
        let builder = DrsBuilder::new("proj", ["ecv"]);
        let walker = DatasetWalker::new(
            TermResolver::new(&vocab, false),
            &builder,
            KeyValueExtractor,
        );

        let record = walker.walk(Path::new("/does/not/exist"), 0);
        assert_eq!(record.total_files(), 0);
        assert_eq!(record.errors.len(), 1);
    }

    #[test]
    fn list_files_limit() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("2003"))?;
        for name in ["b.nc", "a.txt", "2003/c.nc", "2003/d.nc"] {
            fs::write(dir.path().join(name), "")?;
        }

        let files = list_files(dir.path(), 0)?;
        assert_eq!(files.len(), 4);

        let files = list_files(dir.path(), 2)?;
        assert_eq!(
            files,
            vec![dir.path().join("2003/c.nc"), dir.path().join("2003/d.nc")]
        );

        fs::remove_file(dir.path().join("b.nc"))?;
        fs::remove_file(dir.path().join("2003/c.nc"))?;
        fs::remove_file(dir.path().join("2003/d.nc"))?;
        assert_eq!(list_files(dir.path(), 5)?, vec![dir.path().join("a.txt")]);
        Ok(())
    }
}
