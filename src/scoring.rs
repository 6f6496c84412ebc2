//! Preference satisfaction score of a task-to-place assignment.

use crate::model::{PreferenceConstraint, PreferenceKind, ResolvedLocation, Task};

pub const BASE_SCORE: i64 = 50;
pub const MANDATORY_POINTS: i64 = 20;
pub const PREFERRED_POINTS: i64 = 10;

/// Linear heuristic: 50 points base, +20 per satisfied mandatory preference,
/// +10 per satisfied optional one, clamped into `0..=100`.
pub fn score<'a, I>(assignment: I) -> u8
where
    I: IntoIterator<Item = (&'a Task, &'a ResolvedLocation)>,
{
    let mut total = BASE_SCORE;

    for (task, location) in assignment {
        for preference in &task.preferences {
            if !is_satisfied(preference, location) {
                continue;
            }
            total += if preference.is_mandatory {
                MANDATORY_POINTS
            } else {
                PREFERRED_POINTS
            };
        }
    }

    total.clamp(0, 100) as u8
}

/// Mandatory: location matches name or address, chain matches name.
/// Optional: chain matches name, category matches name or address.
fn is_satisfied(preference: &PreferenceConstraint, location: &ResolvedLocation) -> bool {
    let needle = preference.value.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }

    let in_name = || location.name.to_lowercase().contains(&needle);
    let in_address = || location.address.to_lowercase().contains(&needle);

    match (preference.is_mandatory, &preference.kind) {
        (true, PreferenceKind::Location) => in_name() || in_address(),
        (true, PreferenceKind::Chain) => in_name(),
        (false, PreferenceKind::Chain) => in_name(),
        (false, PreferenceKind::Category) => in_name() || in_address(),
        _ => false,
    }
}
