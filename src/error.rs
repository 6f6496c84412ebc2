use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Task;

/// Failure of a call to an external collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Service responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed service response: {0}")]
    Malformed(String),
    #[error("Service is not configured: {0}")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_decode() {
            Self::Malformed(error.to_string())
        } else if let Some(status) = error.status() {
            Self::Status {
                status: status.as_u16(),
                body: error.to_string(),
            }
        } else {
            Self::Transport(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(error: serde_json::Error) -> Self {
        Self::Malformed(error.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("No locations found for task {:?}", .task.label())]
    NoLocationsFound { task: Task },
}

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Free-text intent parsing.
    Intent,
    /// Start location geocoding.
    Start,
    /// Per-task location resolution.
    Tasks,
    /// Route enumeration.
    Routes,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Cannot find start location {query:?} (tried {attempts:?})")]
    StartNotFound {
        query: String,
        attempts: Vec<String>,
    },
    #[error("Cannot resolve any location for task {:?}", .task.label())]
    TaskResolutionFailed { task: Task },
    #[error("Mandatory location {location:?} of task {:?} does not exist", .task.label())]
    MandatoryLocationNotFound { task: Task, location: String },
    #[error("None of the {combinations} route combinations could be optimized")]
    NoRouteCombinationsFound { combinations: usize },
    #[error("{stage:?} stage failed: {source}")]
    Service {
        stage: Stage,
        #[source]
        source: ServiceError,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::StartNotFound { .. } => Stage::Start,
            Self::TaskResolutionFailed { .. } | Self::MandatoryLocationNotFound { .. } => Stage::Tasks,
            Self::NoRouteCombinationsFound { .. } => Stage::Routes,
            Self::Service { stage, .. } => *stage,
        }
    }

    /// Stable identifier of the failure category.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StartNotFound { .. } => "START_NOT_FOUND",
            Self::TaskResolutionFailed { .. } => "TASK_RESOLUTION_FAILED",
            Self::MandatoryLocationNotFound { .. } => "MANDATORY_LOCATION_NOT_FOUND",
            Self::NoRouteCombinationsFound { .. } => "NO_ROUTE_COMBINATIONS_FOUND",
            Self::Service { .. } => "SERVICE_ERROR",
        }
    }
}

impl From<ResolutionError> for PipelineError {
    fn from(error: ResolutionError) -> Self {
        match error {
            ResolutionError::NoLocationsFound { task } => Self::TaskResolutionFailed { task },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_converts_to_task_failure() {
        let task = Task::new("groceries", "Get groceries");
        let error: PipelineError = ResolutionError::NoLocationsFound { task: task.clone() }.into();
        assert_eq!(error, PipelineError::TaskResolutionFailed { task });
        assert_eq!(error.stage(), Stage::Tasks);
        assert_eq!(error.code(), "TASK_RESOLUTION_FAILED");
    }

    #[test]
    fn test_messages_name_the_offending_input() {
        let error = PipelineError::TaskResolutionFailed {
            task: Task::new("gym", "Go to the gym"),
        };
        assert!(error.to_string().contains("Go to the gym"));

        let error = PipelineError::StartNotFound {
            query: "Nowhere, ZZ".to_string(),
            attempts: vec!["Nowhere, ZZ".to_string()],
        };
        assert!(error.to_string().contains("Nowhere, ZZ"));
        assert_eq!(error.stage(), Stage::Start);

        let error = PipelineError::MandatoryLocationNotFound {
            task: Task::new("restaurant", "Dinner"),
            location: "Atlantis".to_string(),
        };
        assert!(error.to_string().contains("Atlantis"));
        assert!(error.to_string().contains("Dinner"));
    }

    #[test]
    fn test_service_error_keeps_stage() {
        let error = PipelineError::Service {
            stage: Stage::Intent,
            source: ServiceError::NotConfigured("chat api key"),
        };
        assert_eq!(error.stage(), Stage::Intent);
        assert_eq!(error.code(), "SERVICE_ERROR");
    }
}
