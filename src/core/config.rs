use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::poll::PollOptions;

/// Platforms the farm knows how to build for.
pub const KNOWN_PLATFORMS: &[&str] = &["ios", "android"];

/// Reject unrecognized target platforms before anything touches the network.
pub fn validate_platform(platform: &str) -> Result<()> {
    let normalized = platform.to_lowercase();
    if !KNOWN_PLATFORMS.contains(&normalized.as_str()) {
        return Err(Error::validation_invalid_argument(
            "platform",
            format!(
                "Unknown platform '{}' (expected one of: {})",
                platform,
                KNOWN_PLATFORMS.join(", ")
            ),
            Some(platform.to_string()),
        ));
    }
    Ok(())
}

/// Default trigger properties sent with every build request.
/// Individual invocations may override any of them with --property.
pub fn default_properties() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("force_chain_rebuild".to_string(), "true".to_string()),
        ("force_rebuild".to_string(), "true".to_string()),
        ("priority".to_string(), "50".to_string()),
    ])
}

/// Result-file suffixes included in the diagnostic bundle by default.
pub const DEFAULT_BUNDLE_SUFFIXES: &[&str] = &[".log", ".xml"];

/// Well-known name of the output bundle, written into the working directory.
pub const BUNDLE_FILE_NAME: &str = "artifacts.zip";

/// Farm endpoint and credential. Credential *sourcing* lives in the CLI
/// layer; this struct only carries the resolved values.
#[derive(Debug, Clone)]
pub struct FarmConfig {
    pub base_url: String,
    pub token: String,
}

/// How the pipeline locates the upstream CI job whose archive it downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactSource {
    /// The job id is already known.
    JobId(String),
    /// Resolve the job id by listing a pipeline's jobs and matching a name.
    PipelineJob {
        project_path: String,
        pipeline_id: String,
        job_name: String,
    },
}

/// Immutable per-invocation configuration, passed explicitly through the
/// pipeline rather than held in shared mutable state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub project: String,
    pub platform: String,
    pub properties: BTreeMap<String, String>,
    pub artifact_source: ArtifactSource,
    pub working_dir: PathBuf,
    pub runner_argv: Vec<String>,
    pub bundle_suffixes: Vec<String>,
    pub bundle_file_name: String,
    pub poll: PollOptions,
}

impl PipelineConfig {
    /// Validate user-supplied inputs before any network activity.
    pub fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(Error::validation_missing_argument(vec![
                "project".to_string()
            ]));
        }

        validate_platform(&self.platform)?;

        if self.runner_argv.is_empty() {
            return Err(Error::validation_missing_argument(vec![
                "runner".to_string()
            ]));
        }

        Ok(())
    }

    /// Project identifier sent to the farm: the configured project plus the
    /// target platform, e.g. `proj-burst iOS`.
    pub fn farm_project(&self) -> String {
        format!("{} {}", self.project, self.platform)
    }
}
