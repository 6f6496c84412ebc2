//! Errand domain model: tasks, their preferences, resolved places and the
//! route options built from them.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::polyline::Polyline;

/// What a preference constrains. Serialized as its lowercase name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PreferenceKind {
    /// A specific place or area, e.g. "Dublin".
    Location,
    /// A brand, e.g. "Walmart".
    Chain,
    /// A kind of place, e.g. "Indian".
    Category,
    /// Kinds the scorer does not understand ("hours", "rating", ...), kept
    /// verbatim.
    Other(String),
}

impl PreferenceKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Location => "location",
            Self::Chain => "chain",
            Self::Category => "category",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for PreferenceKind {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "location" => Self::Location,
            "chain" => Self::Chain,
            "category" => Self::Category,
            _ => Self::Other(raw),
        }
    }
}

impl From<PreferenceKind> for String {
    fn from(kind: PreferenceKind) -> Self {
        match kind {
            PreferenceKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceConstraint {
    #[serde(rename = "type")]
    pub kind: PreferenceKind,
    pub value: String,
    #[serde(default)]
    pub is_mandatory: bool,
}

impl PreferenceConstraint {
    pub fn new(kind: PreferenceKind, value: impl Into<String>, is_mandatory: bool) -> Self {
        Self {
            kind,
            value: value.into(),
            is_mandatory,
        }
    }

    pub fn mandatory(kind: PreferenceKind, value: impl Into<String>) -> Self {
        Self::new(kind, value, true)
    }

    pub fn preferred(kind: PreferenceKind, value: impl Into<String>) -> Self {
        Self::new(kind, value, false)
    }
}

/// One errand to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub preferences: Vec<PreferenceConstraint>,
}

impl Task {
    pub fn new(task_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            task_type: task_type.into(),
            description: description.into(),
            preferences: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_preference(mut self, preference: PreferenceConstraint) -> Self {
        self.preferences.push(preference);
        self
    }

    pub fn has_mandatory_preference(&self) -> bool {
        self.preferences.iter().any(|p| p.is_mandatory)
    }

    /// Brand or place hint used when asking for suggestions.
    pub fn brand_hint(&self) -> Option<&str> {
        self.preferences
            .iter()
            .find(|p| matches!(p.kind, PreferenceKind::Location | PreferenceKind::Chain))
            .map(|p| p.value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Label used in logs and error messages.
    pub fn label(&self) -> &str {
        if !self.description.is_empty() {
            &self.description
        } else {
            &self.task_type
        }
    }
}

/// A geocoded place. Never partially filled: it either has a name, an
/// address and coordinates, or it does not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    pub name: String,
    pub address: String,
    pub coordinates: GeoPoint,
    #[serde(rename = "type")]
    pub task_type: String,
}

impl ResolvedLocation {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        coordinates: GeoPoint,
        task_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            coordinates,
            task_type: task_type.into(),
        }
    }
}

/// Candidate places found for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLocationSet {
    pub task: Task,
    pub locations: Vec<ResolvedLocation>,
}

/// A fully priced multi-stop route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOption {
    pub id: String,
    /// Stops after the start, in visiting order.
    pub stops: Vec<ResolvedLocation>,
    /// Meters.
    pub total_distance: f64,
    /// Seconds.
    pub total_duration: f64,
    /// Provider-specific leg breakdown, passed through untouched.
    pub legs: serde_json::Value,
    pub geometry: Polyline,
    /// 0..=100.
    pub preference_score: u8,
}
