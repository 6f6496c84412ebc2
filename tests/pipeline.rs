//! End-to-end pipeline tests against scripted collaborators.

mod fixtures;

use errand_planner::events::{PipelineEvent, RecordingSink};
use errand_planner::pipeline::PipelineOutput;
use errand_planner::{
    PipelineError, PipelineOptions, PreferenceConstraint, PreferenceKind, RouteOptimizationPipeline, ServiceError,
    Task, UnresolvedTaskPolicy,
};
use fixtures::*;
use test_log::test;

fn groceries() -> Task {
    Task::new("groceries", "Get groceries").with_id("task-0")
}

fn gym() -> Task {
    Task::new("gym", "Go to the gym").with_id("task-1")
}

fn banking() -> Task {
    Task::new("bank", "Deposit a check").with_id("task-2")
}

fn sequential() -> PipelineOptions {
    PipelineOptions {
        parallel: false,
        ..Default::default()
    }
}

/// Two grocery stores and two gyms around Union Square.
fn two_by_two() -> (ScriptedChat, TableGeocoder) {
    let chat = ScriptedChat::new()
        .reply("groceries near", suggestions(&[WALMART_SF, SAFEWAY_SF]))
        .reply("gym near", suggestions(&[EQUINOX_SF, FITNESS_SF]));
    let geocoder = TableGeocoder::new()
        .place(WALMART_SF)
        .place(SAFEWAY_SF)
        .place(EQUINOX_SF)
        .place(FITNESS_SF);
    (chat, geocoder)
}

#[test]
fn test_single_mandatory_chain_task() {
    let chat = ScriptedChat::new().reply("Walmart groceries near San Francisco, CA", suggestions(&[WALMART_SF]));
    let geocoder = TableGeocoder::new().place(WALMART_SF);
    let trips = StraightTrips::new();
    let events = RecordingSink::new();
    let task = groceries().with_preference(PreferenceConstraint::mandatory(PreferenceKind::Chain, "Walmart"));

    let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &trips, &events, PipelineOptions::default());
    let output = pipeline.run_detailed(&start(), &[task]).unwrap();

    assert_eq!(output.task_locations.len(), 1);
    let locations = &output.task_locations[0].locations;
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].name, "Walmart Supercenter");
    assert_eq!(locations[0].task_type, "groceries");
    assert_eq!(locations[0].coordinates, point(WALMART_SF));

    assert_eq!(output.routes.len(), 1);
    let route = &output.routes[0];
    assert_eq!(route.id, "route-1");
    assert_eq!(route.preference_score, 70);
    assert_eq!(route.stops.len(), 1);
    assert!(route.total_duration > 0.0);

    // The geocoder is biased to the start.
    assert_eq!(geocoder.queries(), vec![WALMART_SF.0.to_string()]);
}

#[test]
fn test_unparseable_suggestions_fail_mandatory_task() {
    let chat = ScriptedChat::new().reply("groceries near", "Sorry, I cannot look that up right now.");
    let geocoder = TableGeocoder::new();
    let trips = StraightTrips::new();
    let events = RecordingSink::new();
    let task = groceries().with_preference(PreferenceConstraint::mandatory(PreferenceKind::Chain, "Walmart"));

    let options = PipelineOptions {
        unresolved_policy: UnresolvedTaskPolicy::DropOptional,
        ..Default::default()
    };
    let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &trips, &events, options);
    let err = pipeline.run(&start(), std::slice::from_ref(&task)).unwrap_err();

    assert_eq!(err, PipelineError::TaskResolutionFailed { task });
    assert_eq!(trips.calls(), 0);
    assert!(matches!(
        events.events().last(),
        Some(PipelineEvent::PipelineFailed { .. })
    ));
}

#[test]
fn test_chat_outage_counts_as_no_suggestions() {
    let chat = ScriptedChat::new().fail("groceries near", ServiceError::Timeout("chat".into()));
    let geocoder = TableGeocoder::new();
    let trips = StraightTrips::new();
    let events = RecordingSink::new();

    let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &trips, &events, PipelineOptions::default());
    let err = pipeline.run(&start(), &[groceries()]).unwrap_err();
    assert!(matches!(err, PipelineError::TaskResolutionFailed { .. }));
    assert!(geocoder.queries().is_empty());
}

#[test]
fn test_every_combination_is_priced_once() {
    let (chat, geocoder) = two_by_two();
    let trips = StraightTrips::new();
    let events = RecordingSink::new();

    let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &trips, &events, PipelineOptions::default());
    let routes = pipeline.run(&start(), &[groceries(), gym()]).unwrap();

    assert_eq!(trips.calls(), 4);
    assert_eq!(routes.len(), 4);
    for route in &routes {
        assert_eq!(route.stops.len(), 2);
        assert_eq!(route.preference_score, 50);
    }
    assert!(routes.windows(2).all(|w| w[0].total_duration <= w[1].total_duration));
}

#[test]
fn test_failed_combination_is_skipped() {
    let (chat, geocoder) = two_by_two();
    let trips = StraightTrips::new().failing_with(&[point(SAFEWAY_SF), point(EQUINOX_SF)]);
    let events = RecordingSink::new();

    let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &trips, &events, sequential());
    let routes = pipeline.run(&start(), &[groceries(), gym()]).unwrap();

    assert_eq!(trips.calls(), 4);
    assert_eq!(routes.len(), 3);

    let mut ids: Vec<&str> = routes.iter().map(|r| r.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["route-1", "route-2", "route-3"]);

    for route in &routes {
        let names: Vec<&str> = route.stops.iter().map(|s| s.name.as_str()).collect();
        assert!(!(names.contains(&"Safeway") && names.contains(&"Equinox")));
    }

    let skipped: Vec<PipelineEvent> = events
        .events()
        .into_iter()
        .filter(|e| matches!(e, PipelineEvent::CombinationSkipped { .. }))
        .collect();
    assert_eq!(skipped.len(), 1);
    if let PipelineEvent::CombinationSkipped { stops, reason } = &skipped[0] {
        assert_eq!(stops, &vec!["Safeway".to_string(), "Equinox".to_string()]);
        assert!(reason.contains("422"));
    }
}

#[test]
fn test_events_follow_stage_order() {
    let (chat, geocoder) = two_by_two();
    let trips = StraightTrips::new().failing_with(&[point(WALMART_SF), point(FITNESS_SF)]);
    let events = RecordingSink::new();

    let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &trips, &events, PipelineOptions::default());
    pipeline.run(&start(), &[groceries(), gym()]).unwrap();

    let kinds: Vec<&str> = events
        .events()
        .iter()
        .map(|e| match e {
            PipelineEvent::TaskResolved { .. } => "resolved",
            PipelineEvent::CombinationEnumerated { .. } => "enumerated",
            PipelineEvent::CombinationSkipped { .. } => "skipped",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["resolved", "resolved", "enumerated", "skipped", "enumerated", "enumerated"]
    );
}

#[test]
fn test_no_trip_anywhere() {
    let (chat, geocoder) = two_by_two();
    let events = RecordingSink::new();

    let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &NoTrips, &events, PipelineOptions::default());
    let err = pipeline.run(&start(), &[groceries(), gym()]).unwrap_err();
    assert_eq!(err, PipelineError::NoRouteCombinationsFound { combinations: 4 });
}

#[test]
fn test_empty_task_list() {
    let chat = ScriptedChat::new();
    let geocoder = TableGeocoder::new();
    let trips = StraightTrips::new();
    let events = RecordingSink::new();

    let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &trips, &events, PipelineOptions::default());
    let err = pipeline.run(&start(), &[]).unwrap_err();
    assert_eq!(err, PipelineError::NoRouteCombinationsFound { combinations: 0 });
    assert_eq!(chat.calls(), 0);
    assert_eq!(trips.calls(), 0);
}

#[test]
fn test_unresolved_optional_task() {
    let chat = ScriptedChat::new().reply("groceries near", suggestions(&[WALMART_SF]));
    let geocoder = TableGeocoder::new().place(WALMART_SF);
    let trips = StraightTrips::new();

    let events = RecordingSink::new();
    let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &trips, &events, PipelineOptions::default());
    let err = pipeline.run(&start(), &[groceries(), gym()]).unwrap_err();
    assert_eq!(err, PipelineError::TaskResolutionFailed { task: gym() });

    let options = PipelineOptions {
        unresolved_policy: UnresolvedTaskPolicy::DropOptional,
        ..Default::default()
    };
    let events = RecordingSink::new();
    let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &trips, &events, options);
    let output = pipeline.run_detailed(&start(), &[groceries(), gym()]).unwrap();

    assert_eq!(output.task_locations.len(), 1);
    assert_eq!(output.task_locations[0].task, groceries());
    assert_eq!(output.routes.len(), 1);
    assert_eq!(output.routes[0].stops[0].name, "Walmart Supercenter");
    assert!(events.events().contains(&PipelineEvent::TaskDropped {
        task: "Go to the gym".into()
    }));
}

#[test]
fn test_routes_are_capped() {
    let chat = ScriptedChat::new()
        .reply("groceries near", suggestions(&[WALMART_SF, SAFEWAY_SF]))
        .reply("gym near", suggestions(&[EQUINOX_SF, FITNESS_SF]))
        .reply("bank near", suggestions(&[CHASE_SF, WELLS_SF]));
    let geocoder = TableGeocoder::new()
        .place(WALMART_SF)
        .place(SAFEWAY_SF)
        .place(EQUINOX_SF)
        .place(FITNESS_SF)
        .place(CHASE_SF)
        .place(WELLS_SF);
    let trips = StraightTrips::new();
    let events = RecordingSink::new();

    let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &trips, &events, PipelineOptions::default());
    let routes = pipeline.run(&start(), &[groceries(), gym(), banking()]).unwrap();

    assert_eq!(trips.calls(), 8);
    assert_eq!(routes.len(), 5);
    assert!(routes.windows(2).all(|w| w[0].total_duration <= w[1].total_duration));
}

#[test]
fn test_parallel_matches_sequential() {
    let run = |parallel: bool| -> (PipelineOutput, Vec<PipelineEvent>) {
        let (chat, geocoder) = two_by_two();
        let trips = StraightTrips::new().failing_with(&[point(WALMART_SF), point(EQUINOX_SF)]);
        let events = RecordingSink::new();
        let options = PipelineOptions {
            parallel,
            ..Default::default()
        };
        let pipeline = RouteOptimizationPipeline::new(&chat, &geocoder, &trips, &events, options);
        let output = pipeline.run_detailed(&start(), &[groceries(), gym()]).unwrap();
        (output, events.events())
    };

    assert_eq!(run(true), run(false));
}
