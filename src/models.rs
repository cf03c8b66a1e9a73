//! Lore records and the HTTP request/response bodies built from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A faction for worldbuilding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    pub name: String,
    /// Description of the faction's symbol or emblem
    pub symbol: String,
    /// Core beliefs and values
    pub values: String,
    /// Musical genre/style that represents the faction
    pub soundtrack_vibe: String,
}

/// Factions supplied by the caller to seed quest characters.
pub type FactionInput = Faction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionsResponse {
    pub factions: Vec<Faction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Quest NPCs: a structured roster, or free text when the model's output
/// doesn't fit one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Npcs {
    Roster(Vec<Npc>),
    Text(String),
}

impl Npcs {
    /// Lenient conversion from model output.
    ///
    /// A single element that is not an NPC record degrades the whole field
    /// to the JSON text of the original value.
    pub fn from_value(value: Value) -> Self {
        let items = match value {
            Value::String(s) => return Self::Text(s),
            Value::Array(items) => items,
            other => return Self::Text(other.to_string()),
        };

        let roster: Option<Vec<Npc>> = items
            .iter()
            .map(|item| match item {
                Value::Object(_) => serde_json::from_value(item.clone()).ok(),
                _ => None,
            })
            .collect();

        match roster {
            Some(npcs) => Self::Roster(npcs),
            None => Self::Text(Value::Array(items).to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub title: String,
    /// Brief description of the quest
    pub quest_brief: String,
    pub npcs: Npcs,
    /// The main conflict or challenge
    pub conflict: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestRequest {
    #[serde(default)]
    pub factions: Option<Vec<FactionInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub version: String,
}
