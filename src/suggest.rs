//! Place suggestions from the language model.
//!
//! The model is asked for a bare JSON array of
//! `"Business Name, Street Address, City, State ZIP"` strings. Replies are
//! often wrapped in code fences or prose, so the first `[` .. last `]` span is
//! extracted before parsing. A reply without a usable array means no
//! suggestions.

use tracing::debug;

use crate::model::{ResolvedLocation, Task};
use crate::traits::ChatMessage;

const REQUEST_PREFIX: &str = "Get me the top ";
const REQUEST_INFIX: &str = " addresses of ";

/// Search phrase for a task, e.g. "Walmart groceries near San Ramon, CA".
pub fn search_phrase(task: &Task, start: &ResolvedLocation) -> String {
    let subject = match task.brand_hint() {
        Some(brand) => format!("{brand} {}", task.task_type),
        None => task.task_type.clone(),
    };
    format!("{subject} near {}", start.address)
}

pub fn suggestion_messages(task: &Task, start: &ResolvedLocation, count: usize) -> Vec<ChatMessage> {
    let phrase = search_phrase(task, start);
    let system = format!(
        "You are a local business address finder. Return ONLY a JSON array of exactly {count} \
         real addresses for: {phrase}.\n\n\
         Every entry must use this exact format, which works with geocoding APIs:\n\
         \"Business Name, Street Address, City, State ZIP\"\n\n\
         Example:\n\
         [\n  \"Walmart Supercenter, 2551 San Ramon Valley Blvd, San Ramon, CA 94583\",\n  \
         \"Target, 3141 Crow Canyon Pl, San Ramon, CA 94583\"\n]\n\n\
         Return ONLY the JSON array, no markdown, no extra text."
    );
    let user = format!("{REQUEST_PREFIX}{count}{REQUEST_INFIX}{phrase}");

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Reads a suggestion request back into its count and the subject searched
/// for, e.g. `(3, "Walmart groceries")`.
pub(crate) fn read_suggestion_request(content: &str) -> Option<(usize, &str)> {
    let (count, phrase) = content.strip_prefix(REQUEST_PREFIX)?.split_once(REQUEST_INFIX)?;
    let count = count.trim().parse().ok()?;
    let subject = phrase.split_once(" near ").map_or(phrase, |(subject, _)| subject);
    Some((count, subject.trim()))
}

/// Extracts address strings from a model reply. Non-string and blank entries
/// are skipped.
pub fn parse_suggestions(content: &str) -> Vec<String> {
    let content = strip_code_fence(content);

    let Some(array) = json_array_span(content) else {
        debug!("No JSON array in suggestion reply: {content:?}");
        return Vec::new();
    };

    match serde_json::from_str::<Vec<serde_json::Value>>(array) {
        Ok(values) => values
            .into_iter()
            .filter_map(|value| value.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect(),
        Err(err) => {
            debug!("Suggestion array is not valid JSON: {err}");
            Vec::new()
        }
    }
}

/// Business name part of a suggestion: everything before the first comma.
pub fn business_name(suggestion: &str) -> &str {
    suggestion.split(',').next().unwrap_or_default().trim()
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or_default();
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn json_array_span(content: &str) -> Option<&str> {
    let start = content.find('[')?;
    let end = content.rfind(']')?;
    (start < end).then(|| &content[start..=end])
}
