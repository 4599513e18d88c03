use std::time::Duration;

use clap::Args;

use farmhand::config::{
    default_properties, ArtifactSource, PipelineConfig, BUNDLE_FILE_NAME, DEFAULT_BUNDLE_SUFFIXES,
};
use farmhand::pipeline::{self, PipelineReport};
use farmhand::poll::{CancelToken, PollOptions};
use farmhand::{kv, paths, Error};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct RunArgs {
    /// Farm project to build (combined with --platform)
    #[arg(long)]
    pub project: String,

    /// Target platform (ios, android)
    #[arg(long)]
    pub platform: String,

    /// Extra build property, repeatable (overrides defaults)
    #[arg(long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Upstream CI job id whose artifact archive is downloaded
    #[arg(long, conflicts_with_all = ["pipeline", "job_name"])]
    pub job_id: Option<String>,

    /// Upstream pipeline id (resolve the job id by name instead)
    #[arg(long, requires = "job_name")]
    pub pipeline: Option<String>,

    /// Upstream job name to resolve within --pipeline
    #[arg(long, requires = "pipeline")]
    pub job_name: Option<String>,

    /// Upstream project path for job resolution (defaults to --project)
    #[arg(long)]
    pub project_path: Option<String>,

    /// Working directory for extraction, the test run, and the bundle
    #[arg(long, default_value = ".")]
    pub workdir: String,

    /// Maximum status queries before giving up
    #[arg(long, default_value_t = 40)]
    pub max_attempts: u32,

    /// Initial poll interval in seconds (doubles, capped at 60s)
    #[arg(long, default_value_t = 5)]
    pub interval: u64,

    /// Test runner argv, after `--`
    #[arg(last = true)]
    pub runner: Vec<String>,
}

pub fn run(args: RunArgs) -> CmdResult<PipelineReport> {
    let artifact_source = match (args.job_id, args.pipeline, args.job_name) {
        (Some(job_id), _, _) => ArtifactSource::JobId(job_id),
        (None, Some(pipeline_id), Some(job_name)) => ArtifactSource::PipelineJob {
            project_path: args.project_path.unwrap_or_else(|| args.project.clone()),
            pipeline_id,
            job_name,
        },
        _ => {
            return Err(Error::validation_missing_argument(vec![
                "job_id".to_string(),
                "pipeline".to_string(),
            ])
            .with_hint("Pass --job-id, or --pipeline with --job-name"))
        }
    };

    let mut properties = default_properties();
    properties.append(&mut kv::parse_pairs(&args.properties)?);

    let config = PipelineConfig {
        project: args.project,
        platform: args.platform,
        properties,
        artifact_source,
        working_dir: paths::expand_user_path(&args.workdir),
        runner_argv: args.runner,
        bundle_suffixes: DEFAULT_BUNDLE_SUFFIXES
            .iter()
            .map(|s| s.to_string())
            .collect(),
        bundle_file_name: BUNDLE_FILE_NAME.to_string(),
        poll: PollOptions {
            max_attempts: args.max_attempts,
            initial_interval: Duration::from_secs(args.interval),
            ..PollOptions::default()
        },
    };

    let client = crate::commands::farm_client()?;
    let report = pipeline::run(&config, &client, &CancelToken::new())?;

    Ok((report, 0))
}
