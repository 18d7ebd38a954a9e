use std::io::ErrorKind;
use std::process;

use clap::Parser;
use cli::Args;
use config::Config;
use error::{TagcheckError, TagcheckResult};
use progress::ProgressBarBuilder;
use render::PageWriter;
use search::HttpIndex;

mod cli;
mod config;
mod error;
mod pager;
mod panel;
mod prelude;
mod progress;
mod query;
mod render;
mod search;

const PBAR_ECVS: &str = "Generating pages: {pos}/{len} ({percent}%) | \
        elapsed: {elapsed_precise}{msg}";

async fn run(args: Args) -> TagcheckResult<()> {
    let mut config = match args.config {
        Some(ref path) => Config::from_path(path)?,
        None => Config::discover()?,
    };

    if let Some(cap) = args.cap {
        config.page.cap = cap;
    }

    let index = HttpIndex::new(config.search.host.clone());
    let writer = PageWriter::new(&args.output, &config)?;

    let ecvs = panel::ecvs(&index, &config).await?;
    log::info!("found {} ECVs", ecvs.len());

    let pbar = ProgressBarBuilder::new(PBAR_ECVS, args.quiet)
        .len(ecvs.len() as u64)
        .build();

    for ecv in ecvs.iter() {
        pbar.set_message(format!(" | {ecv}"));

        let panels = panel::panels(&index, &config, ecv).await?;
        let path = writer.write_ecv(ecv, &panels)?;
        log::info!("{ecv}: {} datasets written to {}", panels.len(), path.display());
        pbar.inc(1);
    }

    pbar.finish_and_clear();

    let path = writer.write_index(&ecvs)?;
    log::info!("index written to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.level_filter())
        .parse_default_env()
        .init();

    match run(args).await {
        Ok(()) => process::exit(0),
        Err(TagcheckError::IO(e)) if e.kind() == ErrorKind::BrokenPipe => {
            process::exit(0)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
