use clap::Args;

use farmhand::config::{default_properties, validate_platform};
use farmhand::farm::{BuildFarm, BuildHandle};
use farmhand::{kv, log_status};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct TriggerArgs {
    /// Farm project to build (combined with --platform)
    #[arg(long)]
    pub project: String,

    /// Target platform (ios, android)
    #[arg(long)]
    pub platform: String,

    /// Extra build property, repeatable (overrides defaults)
    #[arg(long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

pub fn run(args: TriggerArgs) -> CmdResult<BuildHandle> {
    validate_platform(&args.platform)?;

    let mut properties = default_properties();
    properties.append(&mut kv::parse_pairs(&args.properties)?);

    let client = crate::commands::farm_client()?;
    let farm_project = format!("{} {}", args.project, args.platform);
    let handle = client.start_build(&farm_project, &properties)?;

    log_status!(
        "trigger",
        "Started build {} for {}",
        handle.build_number,
        handle.project
    );

    Ok((handle, 0))
}
