use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationMissingArgument,
    ValidationInvalidArgument,

    FarmAuthRejected,
    FarmNetwork,
    FarmParse,
    FarmBuildFailed,

    PollTimeout,
    PollCancelled,

    ArtifactDownloadFailed,
    ArtifactCorruptArchive,
    ArtifactFilesystem,

    RunnerFailed,

    BundleWriteFailed,

    InternalIoError,
    InternalJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::FarmAuthRejected => "farm.auth_rejected",
            ErrorCode::FarmNetwork => "farm.network",
            ErrorCode::FarmParse => "farm.parse",
            ErrorCode::FarmBuildFailed => "farm.build_failed",

            ErrorCode::PollTimeout => "poll.timeout",
            ErrorCode::PollCancelled => "poll.cancelled",

            ErrorCode::ArtifactDownloadFailed => "artifact.download_failed",
            ErrorCode::ArtifactCorruptArchive => "artifact.corrupt_archive",
            ErrorCode::ArtifactFilesystem => "artifact.filesystem",

            ErrorCode::RunnerFailed => "runner.failed",

            ErrorCode::BundleWriteFailed => "bundle.write_failed",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmResponseDetails {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerFailedDetails {
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            serde_json::json!({ "args": args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        let details = serde_json::to_value(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            value,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn farm_auth_rejected(url: impl Into<String>, status: u16) -> Self {
        Self::farm_response(
            ErrorCode::FarmAuthRejected,
            "Build farm rejected credentials",
            url,
            Some(status),
            None,
        )
        .with_hint("Check that FARMHAND_TOKEN is set and has not expired")
    }

    pub fn farm_network(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self::farm_response(
            ErrorCode::FarmNetwork,
            "Build farm request failed",
            url,
            None,
            Some(error.into()),
        )
    }

    pub fn farm_http_status(url: impl Into<String>, status: u16) -> Self {
        Self::farm_response(
            ErrorCode::FarmNetwork,
            "Build farm returned an error response",
            url,
            Some(status),
            None,
        )
    }

    pub fn farm_parse(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self::farm_response(
            ErrorCode::FarmParse,
            "Could not decode build farm response",
            url,
            None,
            Some(error.into()),
        )
    }

    fn farm_response(
        code: ErrorCode,
        message: &str,
        url: impl Into<String>,
        status: Option<u16>,
        error: Option<String>,
    ) -> Self {
        let details = serde_json::to_value(FarmResponseDetails {
            url: url.into(),
            status,
            error,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(code, message, details)
    }

    pub fn farm_build_failed(project: impl Into<String>, build: impl Into<String>) -> Self {
        let project: String = project.into();
        let build: String = build.into();
        Self::new(
            ErrorCode::FarmBuildFailed,
            "Remote build finished in a failed state",
            serde_json::json!({ "project": project, "build": build }),
        )
    }

    pub fn poll_timeout(attempts: u32, project: impl Into<String>) -> Self {
        let project: String = project.into();
        Self::new(
            ErrorCode::PollTimeout,
            format!("Build did not reach a terminal state after {} queries", attempts),
            serde_json::json!({ "attempts": attempts, "project": project }),
        )
        .with_hint("Raise --max-attempts or check the build on the farm dashboard")
    }

    pub fn poll_cancelled(project: impl Into<String>) -> Self {
        let project: String = project.into();
        Self::new(
            ErrorCode::PollCancelled,
            "Polling was cancelled before the build completed",
            serde_json::json!({ "project": project }),
        )
    }

    pub fn artifact_download_failed(
        url: impl Into<String>,
        status: Option<u16>,
        error: Option<String>,
    ) -> Self {
        let details = serde_json::to_value(FarmResponseDetails {
            url: url.into(),
            status,
            error,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(
            ErrorCode::ArtifactDownloadFailed,
            "Artifact download failed",
            details,
        )
    }

    pub fn artifact_corrupt_archive(error: impl Into<String>) -> Self {
        let error: String = error.into();
        Self::new(
            ErrorCode::ArtifactCorruptArchive,
            "Artifact archive is not a valid zip",
            serde_json::json!({ "error": error }),
        )
    }

    pub fn artifact_filesystem(path: impl Into<String>, error: impl Into<String>) -> Self {
        let path: String = path.into();
        let error: String = error.into();
        Self::new(
            ErrorCode::ArtifactFilesystem,
            "Could not write extracted artifact",
            serde_json::json!({ "path": path, "error": error }),
        )
    }

    pub fn runner_failed(details: RunnerFailedDetails) -> Self {
        let details =
            serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(ErrorCode::RunnerFailed, "Test runner failed", details)
    }

    pub fn bundle_write_failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        let path: String = path.into();
        let error: String = error.into();
        Self::new(
            ErrorCode::BundleWriteFailed,
            "Could not write artifact bundle",
            serde_json::json!({ "path": path, "error": error }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::to_value(InternalIoErrorDetails {
            error: error.into(),
            context,
        })
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let error: String = error.into();
        let details = serde_json::json!({
            "error": error,
            "context": context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_strings_are_dotted() {
        assert_eq!(ErrorCode::FarmAuthRejected.as_str(), "farm.auth_rejected");
        assert_eq!(ErrorCode::PollTimeout.as_str(), "poll.timeout");
        assert_eq!(ErrorCode::RunnerFailed.as_str(), "runner.failed");
    }

    #[test]
    fn runner_failed_preserves_streams() {
        let err = Error::runner_failed(RunnerFailedDetails {
            command: "false".to_string(),
            exit_code: 1,
            stdout: "out".to_string(),
            stderr: "boom".to_string(),
        });

        assert_eq!(err.code, ErrorCode::RunnerFailed);
        assert_eq!(err.details["stdout"], "out");
        assert_eq!(err.details["stderr"], "boom");
        assert_eq!(err.details["exitCode"], 1);
    }

    #[test]
    fn with_hint_appends() {
        let err = Error::poll_timeout(3, "proj").with_hint("extra");
        assert_eq!(err.hints.len(), 2);
    }
}
