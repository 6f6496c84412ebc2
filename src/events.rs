//! Stage-boundary events.
//!
//! The pipeline reports progress through an [`EventSink`] instead of ad hoc
//! log lines, so callers and tests can observe what happened without parsing
//! text. [`TracingSink`] forwards every event to `tracing`.

use std::sync::Mutex;

use tracing::{error, info, warn};

use crate::error::Stage;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StartResolved {
        query: String,
        matched: String,
        attempts: usize,
    },
    TaskResolved {
        task: String,
        locations: usize,
    },
    /// An optional task with no locations left out of enumeration.
    TaskDropped {
        task: String,
    },
    CombinationEnumerated {
        route_id: String,
        stops: Vec<String>,
        duration: f64,
    },
    CombinationSkipped {
        stops: Vec<String>,
        reason: String,
    },
    PipelineFailed {
        stage: Stage,
        message: String,
    },
}

pub trait EventSink {
    fn emit(&self, event: PipelineEvent);
}

/// Logs events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::StartResolved {
                query,
                matched,
                attempts,
            } => info!("Start {query:?} resolved to {matched:?} after {attempts} attempt(s)"),
            PipelineEvent::TaskResolved { task, locations } => {
                info!("Task {task:?} resolved to {locations} location(s)")
            }
            PipelineEvent::TaskDropped { task } => warn!("Task {task:?} dropped, no locations found"),
            PipelineEvent::CombinationEnumerated {
                route_id,
                stops,
                duration,
            } => info!("Enumerated {route_id} via {stops:?} ({duration:.0}s)"),
            PipelineEvent::CombinationSkipped { stops, reason } => {
                warn!("Skipped combination {stops:?}: {reason}")
            }
            PipelineEvent::PipelineFailed { stage, message } => {
                error!("Pipeline failed at {stage:?}: {message}")
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn emit(&self, event: PipelineEvent) {
        (**self).emit(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit(PipelineEvent::TaskDropped { task: "gym".into() });
        sink.emit(PipelineEvent::TaskResolved {
            task: "groceries".into(),
            locations: 2,
        });
        assert_eq!(
            sink.events(),
            vec![
                PipelineEvent::TaskDropped { task: "gym".into() },
                PipelineEvent::TaskResolved {
                    task: "groceries".into(),
                    locations: 2
                },
            ]
        );
    }
}
