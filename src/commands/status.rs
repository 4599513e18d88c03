use clap::Args;
use serde::Serialize;

use farmhand::farm::{BuildFarm, BuildHandle, BuildNumber, BuildStatus};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct StatusArgs {
    /// Farm project the build belongs to (including platform suffix)
    #[arg(long)]
    pub project: String,

    /// Build number or identifier
    #[arg(long)]
    pub build: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput {
    pub handle: BuildHandle,
    pub status: BuildStatus,
    pub terminal: bool,
}

pub fn run(args: StatusArgs) -> CmdResult<StatusOutput> {
    let build_number = match args.build.parse::<u64>() {
        Ok(n) => BuildNumber::Int(n),
        Err(_) => BuildNumber::Str(args.build.clone()),
    };

    let handle = BuildHandle {
        build_number,
        project: args.project,
    };

    let client = crate::commands::farm_client()?;
    let status = client.build_status(&handle)?;

    Ok((
        StatusOutput {
            terminal: status.is_terminal(),
            status,
            handle,
        },
        0,
    ))
}
