use clap::Args;

use farmhand::bundle::{BundleFinalizer, BundleSummary};
use farmhand::config::{BUNDLE_FILE_NAME, DEFAULT_BUNDLE_SUFFIXES};
use farmhand::paths;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct BundleArgs {
    /// Directory to scan for result files
    #[arg(long, default_value = ".")]
    pub dir: String,

    /// File-name suffix to include, repeatable (defaults: .log, .xml)
    #[arg(long = "suffix", value_name = "SUFFIX")]
    pub suffixes: Vec<String>,

    /// Name of the output archive, written into the scanned directory
    #[arg(long, default_value = BUNDLE_FILE_NAME)]
    pub output: String,
}

pub fn run(args: BundleArgs) -> CmdResult<BundleSummary> {
    let dir = paths::expand_user_path(&args.dir);

    let suffixes = if args.suffixes.is_empty() {
        DEFAULT_BUNDLE_SUFFIXES
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        args.suffixes
    };

    let summary = BundleFinalizer::new(&dir, &suffixes, &args.output).finish()?;

    Ok((summary, 0))
}
