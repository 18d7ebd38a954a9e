use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::drs::group_by_drs;
use crate::facet;
use crate::prelude::*;
use crate::walker::DatasetRecord;

pub(crate) const ESGF_DRS: &str = "esgf_drs.json";
pub(crate) const MOLES_TAGS: &str = "moles_tags.csv";
pub(crate) const ERROR_LOG: &str = "error.log";

#[derive(Debug, Serialize)]
struct FileEntry<'a> {
    file: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha256: Option<&'a str>,
}

/// Writes the results of a run to an output directory.
#[derive(Debug)]
pub(crate) struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub(crate) fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes (or overwrites) the DRS mapping and the MOLES tags and
    /// appends all errors to the error log.
    pub(crate) fn write(&self, records: &[DatasetRecord]) -> TaggerResult<()> {
        self.write_drs(records)?;
        self.write_tags(records)?;
        self.write_errors(records)?;
        Ok(())
    }

    fn report_error(&self, name: &str) -> impl FnOnce(io::Error) -> TaggerError {
        let path = self.dir.join(name).display().to_string();
        move |source| TaggerError::ReportWrite { path, source }
    }

    fn write_drs(&self, records: &[DatasetRecord]) -> TaggerResult<()> {
        let groups =
            group_by_drs(records.iter().flat_map(|record| record.files.iter()));

        let mapping: serde_json::Map<String, serde_json::Value> = groups
            .into_iter()
            .map(|group| -> TaggerResult<(String, serde_json::Value)> {
                let files: Vec<FileEntry> = group
                    .files
                    .iter()
                    .map(|file| FileEntry {
                        file: &file.path,
                        sha256: file.checksum.as_deref(),
                    })
                    .collect();

                Ok((group.drs.to_string(), serde_json::to_value(files)?))
            })
            .collect::<TaggerResult<_>>()?;

        let path = self.dir.join(ESGF_DRS);
        let file = File::create(&path).map_err(self.report_error(ESGF_DRS))?;
        let mut out = BufWriter::new(file);

        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        mapping.serialize(&mut ser)?;

        writeln!(out).map_err(self.report_error(ESGF_DRS))?;
        out.flush().map_err(self.report_error(ESGF_DRS))?;

        log::info!("DRS mapping written to {}", path.display());
        Ok(())
    }

    fn write_tags(&self, records: &[DatasetRecord]) -> TaggerResult<()> {
        let mut rows: BTreeSet<(String, &str)> = BTreeSet::new();
        for record in records {
            let dataset = record.path.display().to_string();
            for (name, urls) in record.terms.iter() {
                if !facet::is_moles_facet(name) {
                    continue;
                }

                for url in urls {
                    rows.insert((dataset.clone(), url.as_str()));
                }
            }
        }

        let file =
            File::create(self.dir.join(MOLES_TAGS)).map_err(self.report_error(MOLES_TAGS))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        for row in rows.iter() {
            writer.serialize(row)?;
        }

        writer.flush().map_err(self.report_error(MOLES_TAGS))?;
        Ok(())
    }

    fn write_errors(&self, records: &[DatasetRecord]) -> TaggerResult<()> {
        if records.iter().all(|record| record.errors.is_empty()) {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(ERROR_LOG))
            .map_err(self.report_error(ERROR_LOG))?;
        let mut out = BufWriter::new(file);

        for record in records {
            for e in record.errors.iter() {
                writeln!(out, "{}\t{e}", record.path.display())
                    .map_err(self.report_error(ERROR_LOG))?;
            }
        }

        out.flush().map_err(self.report_error(ERROR_LOG))?;
        Ok(())
    }
}
