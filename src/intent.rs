//! Free-text request parsing.
//!
//! The language model extracts the start location and tasks as JSON. Its
//! output is then normalized and backed up by keyword rules for the common
//! errands it tends to miss.

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{PipelineError, ServiceError, Stage};
use crate::model::{PreferenceConstraint, PreferenceKind, Task};
use crate::traits::{ChatCompletion, ChatMessage};

const SYSTEM_PROMPT: &str = r#"You are an intelligent task parser for a route optimization application.
Your job is to extract tasks, locations, and preferences from natural language input.

Extract the following information:
1. Starting location (city/address)
2. List of tasks (gym, groceries, restaurant, etc.)
3. Preferences (specific locations, chains, categories)
4. Whether preferences are mandatory or preferred

Return JSON format:
{
  "startingLocation": "city name or address",
  "tasks": [
    {
      "type": "gym|groceries|restaurant|custom",
      "description": "task description",
      "preferences": [
        {"type": "location|chain|category", "value": "preference value", "isMandatory": true}
      ]
    }
  ]
}"#;

const REQUIREMENT_PHRASES: [&str; 6] = ["must", "only", "exactly", "required", "have to", "need to"];

const CUISINES: [&str; 9] = [
    "indian", "chinese", "japanese", "korean", "thai", "mexican", "italian", "pizza", "sushi",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedIntent {
    pub start: String,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIntent {
    #[serde(default)]
    starting_location: Option<String>,
    #[serde(default)]
    tasks: Vec<Task>,
}

pub fn parse_intent<C: ChatCompletion>(chat: &C, text: &str) -> Result<ParsedIntent, PipelineError> {
    let fail = |source: ServiceError| PipelineError::Service {
        stage: Stage::Intent,
        source,
    };

    let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(text)];
    let reply = chat.complete(&messages).map_err(fail)?;

    let object = json_object_span(&reply.content)
        .ok_or_else(|| fail(ServiceError::Malformed("no JSON object in intent reply".into())))?;
    let raw: RawIntent = serde_json::from_str(object).map_err(|err| fail(err.into()))?;

    let mut tasks: Vec<Task> = raw
        .tasks
        .into_iter()
        .filter(|task| !task.task_type.trim().is_empty())
        .collect();
    augment_tasks(text, &mut tasks);
    for (index, task) in tasks.iter_mut().enumerate() {
        task.id = format!("task-{index}");
    }

    let start = explicit_start(text)
        .or(raw.starting_location)
        .map(|start| start.trim().to_string())
        .filter(|start| !start.is_empty())
        .ok_or_else(|| fail(ServiceError::Malformed("no starting location in request".into())))?;

    info!("Parsed {} task(s) starting from {start:?}", tasks.len());
    Ok(ParsedIntent { start, tasks })
}

/// Adds groceries, gym and restaurant tasks the model left out.
fn augment_tasks(text: &str, tasks: &mut Vec<Task>) {
    let lower = text.to_lowercase();
    let tokens = words(&lower);
    let has_word = |options: &[&str]| tokens.iter().any(|w| options.contains(w));
    let has_type = |tasks: &[Task], task_type: &str| tasks.iter().any(|t| t.task_type == task_type);

    if has_word(&["grocery", "groceries", "supermarket", "walmart"]) && !has_type(tasks, "groceries") {
        let preference = if tokens.contains(&"walmart") {
            PreferenceConstraint::new(PreferenceKind::Chain, "Walmart", is_required(&lower, "walmart"))
        } else {
            PreferenceConstraint::preferred(PreferenceKind::Chain, "Costco")
        };
        debug!("Adding groceries task from keywords");
        tasks.push(Task::new("groceries", "Get groceries").with_preference(preference));
    }

    let has_24_hour = lower.contains("24 hour fitness");
    if (has_word(&["gym", "fitness", "equinox"]) || has_24_hour) && !has_type(tasks, "gym") {
        let chain = if tokens.contains(&"equinox") {
            Some(("Equinox", "equinox"))
        } else if has_24_hour {
            Some(("24 Hour Fitness", "24 hour fitness"))
        } else {
            None
        };
        let mut task = Task::new("gym", "Go to the gym");
        if let Some((chain, keyword)) = chain {
            task = task.with_preference(PreferenceConstraint::new(
                PreferenceKind::Chain,
                chain,
                is_required(&lower, keyword),
            ));
        }
        debug!("Adding gym task from keywords");
        tasks.push(task);
    }

    let cuisine = tokens.iter().find(|w| CUISINES.contains(w));
    if let Some(cuisine) = cuisine {
        if !has_type(tasks, "restaurant") {
            let category = capitalize(cuisine);
            debug!("Adding {category} restaurant task from keywords");
            tasks.push(
                Task::new("restaurant", format!("Eat at a {cuisine} restaurant")).with_preference(
                    PreferenceConstraint::new(PreferenceKind::Category, category, is_required(&lower, cuisine)),
                ),
            );
        }
    }
}

/// True when a requirement phrase precedes `keyword` within its sentence.
fn is_required(lower: &str, keyword: &str) -> bool {
    lower
        .split(['.', '!', '?', ';'])
        .filter_map(|sentence| sentence.find(keyword).map(|at| &sentence[..at]))
        .any(|before| {
            let before_words = words(before).join(" ");
            let padded = format!(" {before_words} ");
            REQUIREMENT_PHRASES
                .iter()
                .any(|phrase| padded.contains(&format!(" {phrase} ")))
        })
}

/// "City, ST" following "in" or "at", e.g. "I'm in San Ramon, CA."
fn explicit_start(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();

    let mut search_from = 0;
    while let Some(found) = find_preposition(&lower[search_from..]) {
        let rest_at = search_from + found;
        search_from = rest_at;

        let rest = &text[rest_at..];
        let Some(comma) = rest.find(',') else {
            break;
        };
        let city = &rest[..comma];
        if city.trim().is_empty() || city.contains('.') {
            continue;
        }

        let after = rest[comma + 1..].trim_start();
        let code: String = after.chars().take(2).collect();
        let terminated = after.chars().nth(2).is_none_or(|c| !c.is_ascii_alphabetic());
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) && terminated {
            return Some(format!("{}, {}", city.trim(), code.to_ascii_uppercase()));
        }
    }
    None
}

/// Byte offset just past the next standalone "in " / "at ".
fn find_preposition(lower: &str) -> Option<usize> {
    let bytes = lower.as_bytes();
    (0..bytes.len().saturating_sub(2)).find_map(|i| {
        let word = &bytes[i..i + 3];
        let boundary = i == 0 || !bytes[i - 1].is_ascii_alphanumeric();
        (boundary && (word == b"in " || word == b"at ")).then_some(i + 3)
    })
}

fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn json_object_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (start < end).then(|| &content[start..=end])
}
