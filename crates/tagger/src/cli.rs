use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use log::LevelFilter;

/// Tag CCI datasets with vocabulary terms and derive their DRS
/// identifiers.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None, max_term_width = 72)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["dataset", "file", "json_datasets"])
))]
pub(crate) struct Args {
    /// The full path to a dataset.
    #[arg(short, long, value_name = "DATASET")]
    pub(crate) dataset: Option<PathBuf>,

    /// A file containing one dataset path per line. Blank lines are
    /// ignored.
    #[arg(short, long, value_name = "FILE")]
    pub(crate) file: Option<PathBuf>,

    /// A JSON file containing a list of datasets, given as the
    /// `datasets` member of an object.
    #[arg(short, long, value_name = "JSON_FILE")]
    pub(crate) json_datasets: Option<PathBuf>,

    /// How many files to look at per dataset. If this option isn't set
    /// the value of the config is used; a value of "0" means all files.
    #[arg(long = "file_count", visible_alias = "file-count", value_name = "N")]
    pub(crate) file_count: Option<usize>,

    /// The location of the config. If this option isn't set, the
    /// current directory and all parent directories are searched for
    /// a `tagger.toml`.
    #[arg(
        short,
        long,
        env = "TAGGER_CONFIG",
        hide_env_values = true,
        value_name = "FILE"
    )]
    pub(crate) config: Option<PathBuf>,

    /// A directory of JSON files with user defined mappings, defaults,
    /// overrides and realisations of datasets.
    #[arg(long, value_name = "DIR")]
    pub(crate) json_store: Option<PathBuf>,

    /// Look up non-compliant terms in the alias table.
    #[arg(long)]
    pub(crate) use_mapping: bool,

    /// Don't compute the SHA-256 checksum of each file.
    #[arg(long)]
    pub(crate) no_checksum: bool,

    /// The directory the reports are written to.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub(crate) output_dir: PathBuf,

    /// Run verbosely. Print additional progress information to the
    /// standard error stream. The option can be given several times.
    /// This option conflicts with the `--quiet` option.
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub(crate) verbose: u8,

    /// Operate quietly; do not show progress and only report errors.
    /// This option conflicts with the `--verbose` option.
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

#[cfg(test)]
mod tests {
    use super::*;
    type TestResult = anyhow::Result<()>;

    #[test]
    fn parse_args() -> TestResult {
        let args = Args::try_parse_from([
            "moles-esgf-tag",
            "-d",
            "/neodc/esacci/sst",
            "--file_count",
            "2",
            "--use-mapping",
            "-vv",
        ])?;

        assert_eq!(args.dataset, Some(PathBuf::from("/neodc/esacci/sst")));
        assert_eq!(args.file_count, Some(2));
        assert!(args.use_mapping);
        assert!(!args.no_checksum);
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.level_filter(), LevelFilter::Debug);

        let args =
            Args::try_parse_from(["moles-esgf-tag", "-f", "list.txt", "--file-count", "1", "-q"])?;
        assert_eq!(args.file, Some(PathBuf::from("list.txt")));
        assert_eq!(args.file_count, Some(1));
        assert_eq!(args.level_filter(), LevelFilter::Error);
        Ok(())
    }

    #[test]
    fn parse_args_input_required() {
        assert!(Args::try_parse_from(["moles-esgf-tag"]).is_err());
        assert!(Args::try_parse_from([
            "moles-esgf-tag",
            "-d",
            "a",
            "-j",
            "datasets.json"
        ])
        .is_err());
        assert!(Args::try_parse_from(["moles-esgf-tag", "-d", "a", "-v", "-q"]).is_err());
    }
}
