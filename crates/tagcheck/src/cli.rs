use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// Render HTML pages listing the files without DRS identifier of each
/// CCI dataset.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None, max_term_width = 72)]
pub(crate) struct Args {
    /// The location of the config. If this option isn't set, the
    /// current directory and all parent directories are searched for
    /// a `tagcheck.toml`; without a config the defaults are used.
    #[arg(
        short,
        long,
        env = "TAGCHECK_CONFIG",
        hide_env_values = true,
        value_name = "FILE"
    )]
    pub(crate) config: Option<PathBuf>,

    /// The directory the pages are written to.
    #[arg(short, long, value_name = "DIR", default_value = "html")]
    pub(crate) output: PathBuf,

    /// The maximum number of files listed per dataset. If this option
    /// isn't set, the value of the config is used.
    #[arg(long, value_name = "N")]
    pub(crate) cap: Option<usize>,

    /// Run verbosely. Print additional progress information to the
    /// standard error stream. The option can be given several times.
    /// This option conflicts with the `--quiet` option.
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub(crate) verbose: u8,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    pub(crate) quiet: bool,
}

impl Args {
    pub(crate) fn level_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }

        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
