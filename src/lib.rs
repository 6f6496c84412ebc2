//! errand-planner
//!
//! Plans multi-stop errand routes. A language model suggests real places for
//! each errand, a geocoder pins them down, and a trip optimizer prices every
//! combination of candidates so the fastest routes can be offered.

pub mod chat;
pub mod config;
pub mod dedupe;
pub mod enumerate;
pub mod error;
pub mod events;
pub mod geo;
pub mod haversine;
pub mod intent;
pub mod mapbox;
pub mod metrics;
pub mod model;
pub mod offline;
pub mod osrm;
pub mod pipeline;
pub mod planner;
pub mod polyline;
pub mod ranking;
pub mod resolver;
pub mod scoring;
pub mod select;
pub mod start;
pub mod suggest;
pub mod traits;

pub use error::{PipelineError, ServiceError, Stage};
pub use geo::GeoPoint;
pub use model::{PreferenceConstraint, PreferenceKind, ResolvedLocation, RouteOption, Task, TaskLocationSet};
pub use pipeline::{PipelineOptions, RouteOptimizationPipeline, UnresolvedTaskPolicy};
pub use planner::{PlanRequest, PlanResponse, Planner};
