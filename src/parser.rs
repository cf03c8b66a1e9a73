//! Response parser: model text to lore records.
//!
//! Models often wrap their JSON in a markdown fence; exactly one fence
//! layer is stripped. Anything that still fails to parse is reported as
//! [`LoreError::MalformedModelOutput`] with the raw text attached.

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::error::{LoreError, Result};
use crate::models::{Faction, Npcs, Quest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedShape {
    /// A JSON array; a bare value is wrapped into a one-element array.
    List,
    /// A JSON object.
    Object,
}

/// Drop the first and last line of fenced text.
fn strip_code_fence(text: &str) -> &str {
    if !text.starts_with("```") {
        return text;
    }
    let Some((_, rest)) = text.split_once('\n') else {
        return "";
    };
    match rest.rfind('\n') {
        Some(pos) => &rest[..pos],
        None => "",
    }
}

/// Parse the model's final text as JSON of the given shape.
pub fn extract_json(final_text: &str, shape: ExpectedShape) -> Result<Value> {
    let trimmed = final_text.trim();
    let body = strip_code_fence(trimmed).trim();

    let value: Value = serde_json::from_str(body).map_err(|e| {
        error!("Failed to parse JSON response: {}", e);
        error!("Response content: {}", final_text);
        LoreError::malformed(e.to_string(), final_text)
    })?;

    match (shape, value) {
        (ExpectedShape::List, Value::Array(items)) => Ok(Value::Array(items)),
        (ExpectedShape::List, other) => Ok(Value::Array(vec![other])),
        (ExpectedShape::Object, obj @ Value::Object(_)) => Ok(obj),
        (ExpectedShape::Object, other) => Err(LoreError::malformed(
            format!("expected a JSON object, got {other}"),
            final_text,
        )),
    }
}

/// Parse a faction list and enforce the requested count.
///
/// Extra records are dropped; too few is malformed output.
pub fn parse_factions(final_text: &str, count: usize) -> Result<Vec<Faction>> {
    let value = extract_json(final_text, ExpectedShape::List)?;
    let mut factions: Vec<Faction> = serde_json::from_value(value).map_err(|e| {
        LoreError::malformed(format!("invalid faction record: {e}"), final_text)
    })?;

    if factions.len() < count {
        return Err(LoreError::malformed(
            format!("expected {count} faction(s), got {}", factions.len()),
            final_text,
        ));
    }
    if factions.len() > count {
        warn!(
            "Model returned {} factions, keeping the first {}",
            factions.len(),
            count
        );
        factions.truncate(count);
    }
    Ok(factions)
}

#[derive(Deserialize)]
struct QuestDraft {
    title: String,
    quest_brief: String,
    npcs: Value,
    conflict: String,
    location: String,
}

/// Parse a quest object; `npcs` is mapped leniently.
pub fn parse_quest(final_text: &str) -> Result<Quest> {
    let value = extract_json(final_text, ExpectedShape::Object)?;
    let draft: QuestDraft = serde_json::from_value(value)
        .map_err(|e| LoreError::malformed(format!("invalid quest record: {e}"), final_text))?;

    Ok(Quest {
        title: draft.title,
        quest_brief: draft.quest_brief,
        npcs: Npcs::from_value(draft.npcs),
        conflict: draft.conflict,
        location: draft.location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Npc;
    use serde_json::json;

    fn ashen_vale() -> Faction {
        Faction {
            name: "The Ashen Vale".into(),
            symbol: "a cracked hourglass".into(),
            values: "...".into(),
            soundtrack_vibe: "dark ambient".into(),
        }
    }

    fn fenced(body: &str, lang: &str) -> String {
        format!("```{lang}\n{body}\n```")
    }

    #[test]
    fn ashen_vale_scenario() {
        let text = r#"[{"name":"The Ashen Vale","symbol":"a cracked hourglass","values":"...","soundtrack_vibe":"dark ambient"}]"#;
        assert_eq!(parse_factions(text, 1).unwrap(), vec![ashen_vale()]);
    }

    #[test]
    fn factions_round_trip_with_and_without_fence() {
        let mut second = ashen_vale();
        second.name = "Choir of Rust".into();
        let factions = vec![ashen_vale(), second];
        let text = serde_json::to_string_pretty(&factions).unwrap();

        assert_eq!(parse_factions(&text, 2).unwrap(), factions);
        assert_eq!(parse_factions(&fenced(&text, "json"), 2).unwrap(), factions);
        assert_eq!(parse_factions(&fenced(&text, ""), 2).unwrap(), factions);
    }

    #[test]
    fn quest_round_trips_with_and_without_fence() {
        let quest = Quest {
            title: "The Hollow Bell".into(),
            quest_brief: "Recover the bell.".into(),
            npcs: Npcs::Roster(vec![Npc {
                name: "Mara".into(),
                role: Some("guide".into()),
                faction: None,
                description: None,
            }]),
            conflict: "The bell is cursed.".into(),
            location: "Saltmarsh".into(),
        };
        let text = serde_json::to_string(&quest).unwrap();
        assert_eq!(parse_quest(&text).unwrap(), quest);
        assert_eq!(parse_quest(&fenced(&text, "json")).unwrap(), quest);

        let text_npcs = Quest {
            npcs: Npcs::Text("Mara the guide".into()),
            ..quest
        };
        let text = serde_json::to_string(&text_npcs).unwrap();
        assert_eq!(parse_quest(&text).unwrap(), text_npcs);
    }

    #[test]
    fn bare_object_is_wrapped_for_lists() {
        let text = serde_json::to_string(&ashen_vale()).unwrap();
        assert_eq!(parse_factions(&text, 1).unwrap(), vec![ashen_vale()]);
    }

    #[test]
    fn not_json_is_malformed() {
        let err = parse_factions("not json", 1).unwrap_err();
        assert!(matches!(err, LoreError::MalformedModelOutput { .. }));
        assert_eq!(err.raw_output(), Some("not json"));
        assert!(parse_quest("not json").is_err());
    }

    #[test]
    fn double_fence_is_malformed() {
        let text = serde_json::to_string(&vec![ashen_vale()]).unwrap();
        let double = fenced(&fenced(&text, "json"), "json");
        assert!(matches!(
            parse_factions(&double, 1),
            Err(LoreError::MalformedModelOutput { .. })
        ));
    }

    #[test]
    fn fence_only_is_malformed() {
        assert!(extract_json("```json", ExpectedShape::Object).is_err());
        assert!(extract_json("```\n```", ExpectedShape::Object).is_err());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let value = extract_json("\n\n  {\"a\": 1}  \n", ExpectedShape::Object).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn faction_count_is_enforced() {
        let text = serde_json::to_string(&vec![ashen_vale(), ashen_vale()]).unwrap();
        assert_eq!(parse_factions(&text, 1).unwrap().len(), 1);
        assert!(parse_factions(&text, 3).is_err());
    }

    #[test]
    fn incomplete_faction_is_malformed() {
        let err = parse_factions(r#"[{"name": "Nameless"}]"#, 1).unwrap_err();
        assert!(err.to_string().contains("invalid faction record"));
    }

    #[test]
    fn quest_must_be_an_object() {
        assert!(parse_quest("[1, 2]").is_err());
    }

    #[test]
    fn quest_with_invalid_npc_degrades_to_text() {
        let text = json!({
            "title": "t",
            "quest_brief": "b",
            "npcs": [{"name": "Mara"}, 42],
            "conflict": "c",
            "location": "l"
        })
        .to_string();
        let quest = parse_quest(&text).unwrap();
        assert_eq!(quest.npcs, Npcs::Text(r#"[{"name":"Mara"},42]"#.into()));
    }
}
