//! Request boundary: one call in, one serializable answer out.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chat::ChatClient;
use crate::config::PlannerConfig;
use crate::error::{PipelineError, Stage};
use crate::events::{EventSink, PipelineEvent, TracingSink};
use crate::haversine::HaversineTrips;
use crate::intent::parse_intent;
use crate::mapbox::MapboxClient;
use crate::metrics::{RouteMetrics, alternative_label, reasoning};
use crate::model::{ResolvedLocation, RouteOption, Task, TaskLocationSet};
use crate::offline::{CatalogChat, OfflineGeocoder};
use crate::osrm::OsrmClient;
use crate::pipeline::{PipelineOptions, RouteOptimizationPipeline};
use crate::start::{resolve_start, validate_mandatory_locations};
use crate::traits::{ChatCompletion, Geocoder, TripOptimizer};

/// Either a start and task list, or a sentence for the language model to
/// turn into one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PlanRequest {
    #[serde(rename_all = "camelCase")]
    Structured { start: String, tasks: Vec<Task> },
    #[serde(rename_all = "camelCase")]
    FreeText {
        #[serde(alias = "text")]
        user_input: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRoute {
    /// 1 is best.
    pub ranking: usize,
    #[serde(flatten)]
    pub route: RouteOption,
    pub metrics: RouteMetrics,
    pub reasoning: String,
    /// "Best Overall", "Alternative 1", ...
    pub alternative_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanResponse {
    Success {
        start: ResolvedLocation,
        tasks: Vec<TaskLocationSet>,
        routes: Vec<RankedRoute>,
    },
    Failure {
        stage: Stage,
        code: String,
        error: String,
    },
}

impl PlanResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<&PipelineError> for PlanResponse {
    fn from(error: &PipelineError) -> Self {
        Self::Failure {
            stage: error.stage(),
            code: error.code().to_string(),
            error: error.to_string(),
        }
    }
}

/// Owns the collaborators and answers [`PlanRequest`]s.
pub struct Planner<C, G, T, E> {
    chat: C,
    geocoder: G,
    trips: T,
    events: E,
    options: PipelineOptions,
}

/// Planner wired from a [`PlannerConfig`].
pub type ConfiguredPlanner = Planner<
    Box<dyn ChatCompletion + Send + Sync>,
    Box<dyn Geocoder + Send + Sync>,
    Box<dyn TripOptimizer + Send + Sync>,
    TracingSink,
>;

impl ConfiguredPlanner {
    /// Suggestions come from the chat service when it has a key, else from
    /// the offline catalog. Geocoding uses Mapbox when it has a token, else
    /// the offline gazetteer. Trips go to OSRM when configured, else Mapbox
    /// when it has a token, else the straight-line estimator.
    pub fn from_config(config: PlannerConfig) -> Result<Self, reqwest::Error> {
        let chat: Box<dyn ChatCompletion + Send + Sync> = if config.has_chat() {
            Box::new(ChatClient::new(config.chat.clone())?)
        } else {
            info!("No chat api key, suggesting places from the offline catalog");
            Box::new(CatalogChat)
        };

        let geocoder: Box<dyn Geocoder + Send + Sync> = if config.has_mapbox() {
            Box::new(MapboxClient::new(config.mapbox.clone())?)
        } else {
            info!("No mapbox token, geocoding offline");
            Box::new(OfflineGeocoder)
        };

        let trips: Box<dyn TripOptimizer + Send + Sync> = if let Some(osrm) = config.osrm.clone() {
            info!("Optimizing trips with OSRM at {}", osrm.base_url);
            Box::new(OsrmClient::new(osrm)?)
        } else if config.has_mapbox() {
            info!("Optimizing trips with Mapbox");
            Box::new(MapboxClient::new(config.mapbox.clone())?)
        } else {
            info!("No routing service configured, estimating trips from straight-line distances");
            Box::new(HaversineTrips::default())
        };

        Ok(Planner::new(chat, geocoder, trips, TracingSink, config.pipeline))
    }
}

impl<C, G, T, E> Planner<C, G, T, E>
where
    C: ChatCompletion + Sync,
    G: Geocoder + Sync,
    T: TripOptimizer + Sync,
    E: EventSink + Sync,
{
    pub fn new(chat: C, geocoder: G, trips: T, events: E, options: PipelineOptions) -> Self {
        Self {
            chat,
            geocoder,
            trips,
            events,
            options,
        }
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    /// Never panics; every failure comes back as [`PlanResponse::Failure`].
    pub fn plan(&self, request: &PlanRequest) -> PlanResponse {
        match self.try_plan(request) {
            Ok(response) => response,
            Err(err) => PlanResponse::from(&err),
        }
    }

    pub fn try_plan(&self, request: &PlanRequest) -> Result<PlanResponse, PipelineError> {
        let (start_query, tasks) = match request {
            PlanRequest::Structured { start, tasks } => (start.clone(), with_ids(tasks.clone())),
            PlanRequest::FreeText { user_input } => {
                let intent = parse_intent(&self.chat, user_input).inspect_err(|err| self.report(err))?;
                (intent.start, intent.tasks)
            }
        };

        let start = resolve_start(&self.geocoder, &start_query).inspect_err(|err| self.report(err))?;
        self.events.emit(PipelineEvent::StartResolved {
            query: start_query,
            matched: start.location.address.clone(),
            attempts: start.attempts,
        });
        validate_mandatory_locations(&self.geocoder, &tasks).inspect_err(|err| self.report(err))?;

        let pipeline = RouteOptimizationPipeline::new(
            &self.chat,
            &self.geocoder,
            &self.trips,
            &self.events,
            self.options.clone(),
        );
        let output = pipeline.run_detailed(&start.location, &tasks)?;

        let routes = output
            .routes
            .into_iter()
            .enumerate()
            .map(|(index, route)| {
                let metrics = RouteMetrics::of(&route);
                RankedRoute {
                    ranking: index + 1,
                    reasoning: reasoning(&route, &metrics),
                    alternative_label: alternative_label(index),
                    metrics,
                    route,
                }
            })
            .collect();

        Ok(PlanResponse::Success {
            start: start.location,
            tasks: output.task_locations,
            routes,
        })
    }

    fn report(&self, error: &PipelineError) {
        self.events.emit(PipelineEvent::PipelineFailed {
            stage: error.stage(),
            message: error.to_string(),
        });
    }
}

/// Gives id-less tasks a positional id.
fn with_ids(mut tasks: Vec<Task>) -> Vec<Task> {
    for (index, task) in tasks.iter_mut().enumerate() {
        if task.id.trim().is_empty() {
            task.id = format!("task-{index}");
        }
    }
    tasks
}
