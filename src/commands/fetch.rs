use clap::Args;
use serde::Serialize;

use farmhand::artifact;
use farmhand::farm::BuildFarm;
use farmhand::paths;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct FetchArgs {
    /// Upstream CI job id whose artifact archive is downloaded
    #[arg(long)]
    pub job_id: String,

    /// Directory to extract into
    #[arg(long, default_value = ".")]
    pub dest: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutput {
    pub job_id: String,
    pub dest: String,
    pub extracted_files: Vec<String>,
}

pub fn run(args: FetchArgs) -> CmdResult<FetchOutput> {
    let dest = paths::expand_user_path(&args.dest);

    let client = crate::commands::farm_client()?;
    let archive = client.artifact_bytes(&args.job_id)?;
    let extracted = artifact::extract(&archive, &dest)?;

    Ok((
        FetchOutput {
            job_id: args.job_id,
            dest: dest.display().to_string(),
            extracted_files: extracted
                .into_iter()
                .map(|p| p.display().to_string())
                .collect(),
        },
        0,
    ))
}
