//! Candidate places for a single task.
//!
//! 1. Ask the language model for address suggestions near the start.
//! 2. Geocode every suggestion on its own; failures are dropped.
//! 3. Collapse near-duplicates and keep at most `max_candidates`.

use tracing::{debug, warn};

use crate::dedupe::dedupe;
use crate::error::ResolutionError;
use crate::model::{ResolvedLocation, Task, TaskLocationSet};
use crate::suggest::{business_name, parse_suggestions, suggestion_messages};
use crate::traits::{ChatCompletion, GeocodeQuery, Geocoder};

#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    /// Suggestions requested and places kept per task.
    pub max_candidates: usize,
    /// Places closer than this are the same place.
    pub min_separation_meters: f64,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_candidates: 3,
            min_separation_meters: crate::dedupe::DEFAULT_MIN_SEPARATION_M,
        }
    }
}

pub struct TaskLocationResolver<'a, C, G> {
    chat: &'a C,
    geocoder: &'a G,
    options: ResolverOptions,
}

impl<'a, C, G> TaskLocationResolver<'a, C, G>
where
    C: ChatCompletion,
    G: Geocoder,
{
    pub fn new(chat: &'a C, geocoder: &'a G, options: ResolverOptions) -> Self {
        Self {
            chat,
            geocoder,
            options,
        }
    }

    pub fn resolve(&self, task: &Task, start: &ResolvedLocation) -> Result<TaskLocationSet, ResolutionError> {
        let suggestions = self.suggest(task, start);
        debug!("Task {:?} got {} suggestion(s)", task.label(), suggestions.len());

        let geocoded = suggestions
            .iter()
            .filter_map(|suggestion| self.geocode_suggestion(suggestion, task, start))
            .collect();

        let mut locations = dedupe(geocoded, self.options.min_separation_meters);
        locations.truncate(self.options.max_candidates);

        if locations.is_empty() {
            return Err(ResolutionError::NoLocationsFound { task: task.clone() });
        }

        Ok(TaskLocationSet {
            task: task.clone(),
            locations,
        })
    }

    fn suggest(&self, task: &Task, start: &ResolvedLocation) -> Vec<String> {
        let messages = suggestion_messages(task, start, self.options.max_candidates);
        match self.chat.complete(&messages) {
            Ok(reply) => parse_suggestions(&reply.content),
            Err(err) => {
                warn!("Suggestion request for {:?} failed: {err}", task.label());
                Vec::new()
            }
        }
    }

    /// Geocode-or-drop: a suggestion becomes a place only with both a name
    /// and an address.
    fn geocode_suggestion(
        &self,
        suggestion: &str,
        task: &Task,
        start: &ResolvedLocation,
    ) -> Option<ResolvedLocation> {
        let query = GeocodeQuery::new(suggestion).near(start.coordinates).limit(1);

        let matched = match self.geocoder.geocode(&query) {
            Ok(results) => results.into_iter().next(),
            Err(err) => {
                warn!("Geocoding {suggestion:?} failed: {err}");
                None
            }
        };
        let Some(matched) = matched else {
            debug!("No geocoding match for {suggestion:?}");
            return None;
        };

        // Geocoder labels are often street names; the suggestion carries the business.
        let name = match business_name(suggestion) {
            "" => matched.short_name.trim(),
            name => name,
        };
        let address = match matched.display_name.trim() {
            "" => suggestion,
            address => address,
        };
        if name.is_empty() || address.is_empty() {
            return None;
        }

        Some(ResolvedLocation::new(
            name,
            address,
            matched.coordinates,
            task.task_type.clone(),
        ))
    }
}
