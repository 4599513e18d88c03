//! Build farm HTTP client: trigger builds, query status, fetch artifacts.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::artifact;
use crate::config::FarmConfig;
use crate::error::{Error, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const AUTH_HEADER: &str = "PRIVATE-TOKEN";

/// Build identifier as returned by the farm. Some farms number builds,
/// others hand back opaque strings; both serialize transparently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildNumber {
    Int(u64),
    Str(String),
}

impl std::fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildNumber::Int(n) => write!(f, "{}", n),
            BuildNumber::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Opaque handle for one triggered build. The sole key for every
/// subsequent status query; never reused across invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildHandle {
    pub build_number: BuildNumber,
    pub project: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Pending,
    Running,
    Success,
    Failed,
    /// Transient query failure or unrecognized farm state, not a build state.
    Unknown,
}

impl BuildStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStatus::Success | BuildStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Pending => "pending",
            BuildStatus::Running => "running",
            BuildStatus::Success => "success",
            BuildStatus::Failed => "failed",
            BuildStatus::Unknown => "unknown",
        }
    }

    fn from_farm_str(s: &str) -> BuildStatus {
        match s {
            "pending" | "queued" | "created" => BuildStatus::Pending,
            "running" => BuildStatus::Running,
            "success" => BuildStatus::Success,
            "failed" | "canceled" | "cancelled" => BuildStatus::Failed,
            _ => BuildStatus::Unknown,
        }
    }
}

/// The seam between the pipeline and the farm's HTTP surface. The poll
/// loop and pipeline tests run against scripted implementations.
pub trait BuildFarm {
    fn start_build(
        &self,
        project: &str,
        properties: &BTreeMap<String, String>,
    ) -> Result<BuildHandle>;

    fn build_status(&self, handle: &BuildHandle) -> Result<BuildStatus>;

    fn artifact_bytes(&self, job_id: &str) -> Result<Vec<u8>>;

    /// Resolve an upstream CI job id by listing a pipeline's jobs and
    /// matching on the job name.
    fn find_job_id(
        &self,
        project_path: &str,
        pipeline_id: &str,
        job_name: &str,
    ) -> Result<BuildNumber>;
}

pub struct FarmClient {
    base_url: String,
    token: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct StartBuildBody<'a> {
    project: &'a str,
    properties: &'a BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct StartBuildResponse {
    build_number: BuildNumber,
}

#[derive(Deserialize)]
struct BuildStatusResponse {
    status: String,
}

#[derive(Deserialize)]
struct PipelineJob {
    id: BuildNumber,
    name: String,
}

impl FarmClient {
    pub fn new(config: FarmConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("farmhand/{}", VERSION))
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::internal_io(e.to_string(), Some("create HTTP client".to_string())))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
            client,
        })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        let response = self
            .client
            .get(url)
            .header(AUTH_HEADER, &self.token)
            .send()
            .map_err(|e| Error::farm_network(url, e.to_string()))?;

        Self::check_status(url, response)
    }

    fn check_status(
        url: &str,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response> {
        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::farm_auth_rejected(url, status.as_u16()));
        }
        if !status.is_success() {
            return Err(Error::farm_http_status(url, status.as_u16()));
        }
        Ok(response)
    }

    fn artifact_url(&self, job_id: &str) -> String {
        format!("{}/jobs/{}/artifacts", self.base_url, job_id)
    }
}

/// Encode a project identifier for use as one URL path segment. Farm
/// projects routinely contain spaces and slashes (`proj-burst iOS`,
/// `group/project`).
fn encode_segment(raw: &str) -> String {
    raw.replace('%', "%25")
        .replace('/', "%2F")
        .replace(' ', "%20")
}

impl BuildFarm for FarmClient {
    /// Issue exactly one trigger request. Retry policy belongs to the caller.
    fn start_build(
        &self,
        project: &str,
        properties: &BTreeMap<String, String>,
    ) -> Result<BuildHandle> {
        let url = format!("{}/projects/{}/builds", self.base_url, encode_segment(project));

        let response = self
            .client
            .post(&url)
            .header(AUTH_HEADER, &self.token)
            .json(&StartBuildBody {
                project,
                properties,
            })
            .send()
            .map_err(|e| Error::farm_network(&url, e.to_string()))?;

        let decoded: StartBuildResponse = Self::check_status(&url, response)?
            .json()
            .map_err(|e| Error::farm_parse(&url, e.to_string()))?;

        Ok(BuildHandle {
            build_number: decoded.build_number,
            project: project.to_string(),
        })
    }

    fn build_status(&self, handle: &BuildHandle) -> Result<BuildStatus> {
        let url = format!(
            "{}/projects/{}/builds/{}/status",
            self.base_url,
            encode_segment(&handle.project),
            handle.build_number
        );

        let decoded: BuildStatusResponse = self
            .get(&url)?
            .json()
            .map_err(|e| Error::farm_parse(&url, e.to_string()))?;

        Ok(BuildStatus::from_farm_str(&decoded.status))
    }

    fn artifact_bytes(&self, job_id: &str) -> Result<Vec<u8>> {
        let url = self.artifact_url(job_id);
        let headers = vec![(AUTH_HEADER.to_string(), self.token.clone())];
        artifact::download(&self.client, &url, &headers)
    }

    fn find_job_id(
        &self,
        project_path: &str,
        pipeline_id: &str,
        job_name: &str,
    ) -> Result<BuildNumber> {
        let url = format!(
            "{}/projects/{}/pipelines/{}/jobs",
            self.base_url,
            encode_segment(project_path),
            pipeline_id
        );

        let jobs: Vec<PipelineJob> = self
            .get(&url)?
            .json()
            .map_err(|e| Error::farm_parse(&url, e.to_string()))?;

        jobs.into_iter()
            .find(|job| job.name == job_name)
            .map(|job| job.id)
            .ok_or_else(|| {
                Error::farm_parse(
                    &url,
                    format!("no job named '{}' in pipeline {}", job_name, pipeline_id),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_terminal_only_for_success_and_failed() {
        assert!(BuildStatus::Success.is_terminal());
        assert!(BuildStatus::Failed.is_terminal());
        assert!(!BuildStatus::Pending.is_terminal());
        assert!(!BuildStatus::Running.is_terminal());
        assert!(!BuildStatus::Unknown.is_terminal());
    }

    #[test]
    fn unrecognized_farm_status_maps_to_unknown() {
        assert_eq!(BuildStatus::from_farm_str("warming_up"), BuildStatus::Unknown);
        assert_eq!(BuildStatus::from_farm_str("queued"), BuildStatus::Pending);
        assert_eq!(BuildStatus::from_farm_str("canceled"), BuildStatus::Failed);
    }

    #[test]
    fn build_number_decodes_from_int_or_string() {
        let n: BuildNumber = serde_json::from_str("1234").unwrap();
        assert_eq!(n, BuildNumber::Int(1234));
        assert_eq!(n.to_string(), "1234");

        let s: BuildNumber = serde_json::from_str("\"b-99\"").unwrap();
        assert_eq!(s, BuildNumber::Str("b-99".to_string()));
        assert_eq!(s.to_string(), "b-99");
    }

    #[test]
    fn project_segments_are_url_safe() {
        assert_eq!(encode_segment("proj-burst iOS"), "proj-burst%20iOS");
        assert_eq!(encode_segment("group/project"), "group%2Fproject");
        assert_eq!(encode_segment("50%"), "50%25");
    }

    #[test]
    fn handle_round_trips_through_json() {
        let handle = BuildHandle {
            build_number: BuildNumber::Int(7),
            project: "proj-burst ios".to_string(),
        };

        let json = serde_json::to_string(&handle).unwrap();
        let back: BuildHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }
}
