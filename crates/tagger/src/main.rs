use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use cli::Args;
use comfy_table::{presets, Row, Table};
use drs::DrsBuilder;
use error::{TaggerError, TaggerResult};
use extract::FileNameExtractor;
use report::ReportWriter;
use resolver::TermResolver;
use store::{DatasetStore, StoreFile};
use vocab::Vocabulary;
use walker::{DatasetRecord, DatasetWalker};

use crate::config::Config;

mod cli;
mod config;
mod drs;
mod error;
mod extract;
mod facet;
mod prelude;
mod progress;
mod report;
mod resolver;
mod store;
mod utils;
mod vocab;
mod walker;

fn datasets(args: &Args) -> TaggerResult<Vec<PathBuf>> {
    let mut datasets = if let Some(ref dataset) = args.dataset {
        vec![dataset.clone()]
    } else if let Some(ref path) = args.file {
        utils::read_lines(path)?
    } else if let Some(ref path) = args.json_datasets {
        StoreFile::from_path(path)?.datasets
    } else {
        vec![]
    };

    datasets.sort();
    datasets.dedup();
    Ok(datasets)
}

fn summary(records: &[DatasetRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(Row::from(vec![
        "dataset",
        "files",
        "without drs",
        "terms",
        "unmapped",
        "errors",
    ]));

    for record in records {
        let result = record.result();
        table.add_row([
            result.dataset.display().to_string(),
            result.total_files.to_string(),
            result.files_without_drs.to_string(),
            result.vocabulary_urls.len().to_string(),
            record.unmapped.len().to_string(),
            result.errors.len().to_string(),
        ]);
    }

    table
}

/// Lists the terms of all datasets which aren't in the vocabulary.
fn unmapped(records: &[DatasetRecord]) -> Option<Table> {
    let terms: BTreeSet<&(String, String)> =
        records.iter().flat_map(|r| r.unmapped.iter()).collect();

    if terms.is_empty() {
        return None;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(Row::from(vec!["facet", "term not in vocabulary"]));

    for (facet, term) in terms {
        table.add_row([facet, term]);
    }

    Some(table)
}

fn run(args: Args) -> TaggerResult<()> {
    let config = match args.config {
        Some(ref path) => Config::from_path(path)?,
        None => Config::discover()?,
    };

    let vocab = Vocabulary::from_config(&config)?;
    log::info!(
        "vocabulary loaded ({} terms, {} aliases)",
        vocab.len(),
        vocab.aliases().len()
    );

    let store = match args.json_store {
        Some(ref dir) => Some(DatasetStore::from_dir(dir)?),
        None => None,
    };

    if let Some(ref store) = store {
        log::info!("dataset store loaded ({} datasets)", store.len());
    }

    let datasets = datasets(&args)?;
    let builder = DrsBuilder::from_config(&config.drs);
    let use_mapping = args.use_mapping || config.runtime.use_mapping;
    let file_count = args.file_count.unwrap_or(config.runtime.file_count);

    let mut walker = DatasetWalker::new(
        TermResolver::new(&vocab, use_mapping),
        &builder,
        FileNameExtractor,
    )
    .free_facets(&config.drs.free_facets)
    .level_2_frequency(config.drs.level_2_frequency.clone())
    .checksum(!args.no_checksum && config.runtime.checksum)
    .quiet(args.quiet);

    if let Some(ref store) = store {
        walker = walker.store(store);
    }

    let records: Vec<DatasetRecord> = datasets
        .iter()
        .map(|dataset| walker.walk(dataset, file_count))
        .collect();

    ReportWriter::new(&args.output_dir).write(&records)?;

    if !args.quiet {
        println!("{}", summary(&records));
        if let Some(table) = unmapped(&records) {
            println!("{table}");
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.level_filter())
        .parse_default_env()
        .init();

    match run(args) {
        Ok(()) => process::exit(0),
        Err(TaggerError::IO(e)) if e.kind() == ErrorKind::BrokenPipe => {
            process::exit(0)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
