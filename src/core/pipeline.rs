//! The orchestration pipeline: trigger, poll, fetch, invoke, bundle.
//!
//! Stage errors abort the remaining stages and propagate unchanged. The
//! bundler is attached to the pipeline's exit path and runs exactly once
//! whichever way the stages end; a bundling failure never replaces a stage
//! error that is already propagating.

use std::fs;

use serde::Serialize;

use crate::artifact;
use crate::bundle::{BundleFinalizer, BundleSummary};
use crate::config::{ArtifactSource, PipelineConfig};
use crate::error::{Error, Result};
use crate::farm::{BuildFarm, BuildHandle, BuildStatus};
use crate::poll::{self, CancelToken};
use crate::process;

/// Property key carrying the resolved upstream job id to the farm.
const UPSTREAM_JOB_PROPERTY: &str = "upstream_job_id";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub handle: BuildHandle,
    pub status: BuildStatus,
    pub extracted_files: Vec<String>,
    pub runner_exit_code: i32,
    pub bundle: BundleSummary,
}

struct StageOutcome {
    handle: BuildHandle,
    status: BuildStatus,
    extracted_files: Vec<String>,
    runner_exit_code: i32,
}

/// Run the full pipeline for one build.
pub fn run(
    config: &PipelineConfig,
    farm: &dyn BuildFarm,
    cancel: &CancelToken,
) -> Result<PipelineReport> {
    // Fail-fast input validation, before the finalizer is armed and before
    // any network traffic.
    config.validate()?;

    fs::create_dir_all(&config.working_dir).map_err(|e| {
        Error::artifact_filesystem(config.working_dir.display().to_string(), e.to_string())
    })?;

    let finalizer = BundleFinalizer::new(
        &config.working_dir,
        &config.bundle_suffixes,
        &config.bundle_file_name,
    );

    let outcome = run_stages(config, farm, cancel);
    let bundled = finalizer.finish();

    match (outcome, bundled) {
        (Ok(outcome), Ok(bundle)) => Ok(PipelineReport {
            handle: outcome.handle,
            status: outcome.status,
            extracted_files: outcome.extracted_files,
            runner_exit_code: outcome.runner_exit_code,
            bundle,
        }),
        (Ok(_), Err(bundle_err)) => Err(bundle_err),
        (Err(stage_err), Ok(bundle)) => {
            log_status!(
                "bundle",
                "Pipeline failed; diagnostics preserved in {}",
                bundle.path
            );
            Err(stage_err)
        }
        (Err(stage_err), Err(bundle_err)) => {
            // The stage error determines the exit status; the bundling
            // failure is only recorded.
            log_status!("bundle", "Bundling also failed: {}", bundle_err);
            Err(stage_err)
        }
    }
}

fn run_stages(
    config: &PipelineConfig,
    farm: &dyn BuildFarm,
    cancel: &CancelToken,
) -> Result<StageOutcome> {
    let job_id = match &config.artifact_source {
        ArtifactSource::JobId(id) => id.clone(),
        ArtifactSource::PipelineJob {
            project_path,
            pipeline_id,
            job_name,
        } => {
            let id = farm.find_job_id(project_path, pipeline_id, job_name)?;
            log_status!("trigger", "Resolved upstream job '{}' to {}", job_name, id);
            id.to_string()
        }
    };

    let mut properties = config.properties.clone();
    properties.insert(UPSTREAM_JOB_PROPERTY.to_string(), job_id.clone());

    let handle = farm.start_build(&config.farm_project(), &properties)?;
    log_status!(
        "trigger",
        "Started build {} for {}",
        handle.build_number,
        handle.project
    );

    let status = poll::wait_for_completion(farm, &handle, &config.poll, cancel)?;
    if status == BuildStatus::Failed {
        return Err(Error::farm_build_failed(
            handle.project.clone(),
            handle.build_number.to_string(),
        ));
    }

    let archive = farm.artifact_bytes(&job_id)?;
    let extracted = artifact::extract(&archive, &config.working_dir)?;

    let runner = process::run_process(&config.runner_argv, &config.working_dir)?;

    Ok(StageOutcome {
        handle,
        status,
        extracted_files: extracted
            .into_iter()
            .map(|p| p.display().to_string())
            .collect(),
        runner_exit_code: runner.exit_code,
    })
}
