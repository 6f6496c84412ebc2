//! Route candidate generation and scoring pipeline.
//!
//! resolve tasks -> keep nearest candidates -> enumerate and score
//! combinations -> rank.
//!
//! A pipeline holds only references to its collaborators and its options, so
//! one instance can serve concurrent `run` calls.

use rayon::prelude::*;
use tracing::debug;

use crate::enumerate::RouteEnumerator;
use crate::error::{PipelineError, ResolutionError};
use crate::events::{EventSink, PipelineEvent};
use crate::model::{ResolvedLocation, RouteOption, Task, TaskLocationSet};
use crate::ranking::{DEFAULT_ROUTE_LIMIT, rank};
use crate::resolver::{ResolverOptions, TaskLocationResolver};
use crate::select::{DEFAULT_CLOSEST_PER_TASK, select_closest};
use crate::traits::{ChatCompletion, Geocoder, TripOptimizer};

/// What to do with a task that resolves to no location at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedTaskPolicy {
    /// Any unresolved task fails the whole request.
    #[default]
    FailRequest,
    /// Unresolved tasks without a mandatory preference are left out; a task
    /// with a mandatory preference still fails the request.
    DropOptional,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub resolver: ResolverOptions,
    /// Candidates per task entering enumeration.
    pub closest_per_task: usize,
    /// Route options returned.
    pub route_limit: usize,
    pub unresolved_policy: UnresolvedTaskPolicy,
    /// Fan task resolution and trip requests out over the rayon pool.
    pub parallel: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            resolver: ResolverOptions::default(),
            closest_per_task: DEFAULT_CLOSEST_PER_TASK,
            route_limit: DEFAULT_ROUTE_LIMIT,
            unresolved_policy: UnresolvedTaskPolicy::default(),
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Resolved tasks in input order; dropped tasks are absent.
    pub task_locations: Vec<TaskLocationSet>,
    /// Ranked best first.
    pub routes: Vec<RouteOption>,
}

pub struct RouteOptimizationPipeline<'a, C, G, T, E> {
    chat: &'a C,
    geocoder: &'a G,
    trips: &'a T,
    events: &'a E,
    options: PipelineOptions,
}

impl<'a, C, G, T, E> RouteOptimizationPipeline<'a, C, G, T, E>
where
    C: ChatCompletion + Sync,
    G: Geocoder + Sync,
    T: TripOptimizer + Sync,
    E: EventSink + Sync,
{
    pub fn new(chat: &'a C, geocoder: &'a G, trips: &'a T, events: &'a E, options: PipelineOptions) -> Self {
        Self {
            chat,
            geocoder,
            trips,
            events,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Ranked route options from `start` covering every resolved task.
    pub fn run(&self, start: &ResolvedLocation, tasks: &[Task]) -> Result<Vec<RouteOption>, PipelineError> {
        self.run_detailed(start, tasks).map(|output| output.routes)
    }

    /// Like [`run`](Self::run), also returning the places found per task.
    pub fn run_detailed(&self, start: &ResolvedLocation, tasks: &[Task]) -> Result<PipelineOutput, PipelineError> {
        let result = self.execute(start, tasks);
        if let Err(err) = &result {
            self.events.emit(PipelineEvent::PipelineFailed {
                stage: err.stage(),
                message: err.to_string(),
            });
        }
        result
    }

    fn execute(&self, start: &ResolvedLocation, tasks: &[Task]) -> Result<PipelineOutput, PipelineError> {
        let task_locations = self.resolve_tasks(start, tasks)?;

        let candidates: Vec<Vec<ResolvedLocation>> = task_locations
            .iter()
            .map(|set| select_closest(&set.locations, start.coordinates, self.options.closest_per_task))
            .collect();
        let combinations = if candidates.is_empty() {
            0
        } else {
            candidates.iter().map(Vec::len).product()
        };
        debug!("Enumerating {combinations} route combination(s)");

        let resolved_tasks: Vec<Task> = task_locations.iter().map(|set| set.task.clone()).collect();
        let enumerator = RouteEnumerator::new(self.trips, self.events, self.options.parallel);
        let options = enumerator.enumerate(start, &resolved_tasks, &candidates);
        if options.is_empty() {
            return Err(PipelineError::NoRouteCombinationsFound { combinations });
        }

        Ok(PipelineOutput {
            task_locations,
            routes: rank(options, self.options.route_limit),
        })
    }

    fn resolve_tasks(&self, start: &ResolvedLocation, tasks: &[Task]) -> Result<Vec<TaskLocationSet>, PipelineError> {
        let resolver = TaskLocationResolver::new(self.chat, self.geocoder, self.options.resolver);

        let outcomes: Vec<Result<TaskLocationSet, ResolutionError>> = if self.options.parallel {
            tasks.par_iter().map(|task| resolver.resolve(task, start)).collect()
        } else {
            tasks.iter().map(|task| resolver.resolve(task, start)).collect()
        };

        let mut resolved = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(set) => {
                    self.events.emit(PipelineEvent::TaskResolved {
                        task: set.task.label().to_string(),
                        locations: set.locations.len(),
                    });
                    resolved.push(set);
                }
                Err(ResolutionError::NoLocationsFound { task })
                    if self.options.unresolved_policy == UnresolvedTaskPolicy::DropOptional
                        && !task.has_mandatory_preference() =>
                {
                    self.events.emit(PipelineEvent::TaskDropped {
                        task: task.label().to_string(),
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(resolved)
    }
}
