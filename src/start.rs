//! Start location geocoding with normalized retries, and the existence check
//! for mandatory location preferences.
//!
//! Geocoders often miss bare "City, ST" strings, so after the raw query fails
//! the country, and then the spelled-out state, are appended.

use tracing::{debug, warn};

use crate::error::{PipelineError, ServiceError, Stage};
use crate::model::{PreferenceKind, ResolvedLocation, Task};
use crate::traits::{GeocodeQuery, Geocoder};

pub const START_TASK_TYPE: &str = "start";

const US_STATES: [(&str, &str); 51] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

fn state_name(code: &str) -> Option<&'static str> {
    US_STATES
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Queries to try, in order, for a raw start string.
pub fn query_variants(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let mut variants = vec![raw.to_string()];
    let lower = raw.to_lowercase();
    if lower.ends_with("usa") || lower.ends_with("united states") {
        return variants;
    }

    variants.push(format!("{raw}, USA"));
    if let Some((prefix, last)) = raw.rsplit_once(',') {
        let code = last.trim();
        if code.len() == 2 {
            if let Some(state) = state_name(code) {
                variants.push(format!("{}, {state}, USA", prefix.trim()));
            }
        }
    }
    variants
}

/// A geocoded start and the number of queries it took.
#[derive(Debug, Clone, PartialEq)]
pub struct StartMatch {
    pub location: ResolvedLocation,
    pub attempts: usize,
}

/// Geocodes the caller's start description.
///
/// Every variant coming back empty is [`PipelineError::StartNotFound`]; every
/// variant failing at the service is a [`Stage::Start`] service error.
pub fn resolve_start<G: Geocoder>(geocoder: &G, raw: &str) -> Result<StartMatch, PipelineError> {
    let variants = query_variants(raw);
    let mut last_error: Option<ServiceError> = None;
    let mut any_answered = false;

    for (attempt, query) in variants.iter().enumerate() {
        match geocoder.geocode(&GeocodeQuery::new(query.as_str()).limit(1)) {
            Ok(results) => {
                any_answered = true;
                if let Some(matched) = results.into_iter().next() {
                    debug!("Start {raw:?} matched {:?} on attempt {}", matched.display_name, attempt + 1);
                    let name = match matched.short_name.trim() {
                        "" => raw.split(',').next().unwrap_or(raw).trim(),
                        name => name,
                    };
                    let address = match matched.display_name.trim() {
                        "" => query.as_str(),
                        address => address,
                    };
                    return Ok(StartMatch {
                        location: ResolvedLocation::new(name, address, matched.coordinates, START_TASK_TYPE),
                        attempts: attempt + 1,
                    });
                }
            }
            Err(err) => {
                warn!("Start geocoding attempt {query:?} failed: {err}");
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(source) if !any_answered => Err(PipelineError::Service {
            stage: Stage::Start,
            source,
        }),
        _ => Err(PipelineError::StartNotFound {
            query: raw.to_string(),
            attempts: variants,
        }),
    }
}

/// Fails on the first mandatory location preference the geocoder cannot
/// place, before any suggestion is requested for it.
pub fn validate_mandatory_locations<G: Geocoder>(geocoder: &G, tasks: &[Task]) -> Result<(), PipelineError> {
    let mandatory = tasks.iter().flat_map(|task| {
        task.preferences
            .iter()
            .filter(|p| p.is_mandatory && p.kind == PreferenceKind::Location)
            .map(move |p| (task, p.value.as_str()))
    });

    for (task, location) in mandatory {
        match resolve_start(geocoder, location) {
            Ok(found) => debug!("Mandatory location {location:?} found at {:?}", found.location.address),
            Err(PipelineError::StartNotFound { .. }) => {
                return Err(PipelineError::MandatoryLocationNotFound {
                    task: task.clone(),
                    location: location.to_string(),
                });
            }
            Err(PipelineError::Service { source, .. }) => {
                return Err(PipelineError::Service {
                    stage: Stage::Tasks,
                    source,
                });
            }
            Err(other) => return Err(other),
        }
    }
    Ok(())
}
