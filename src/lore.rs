//! Faction and quest generation.
//!
//! Builds the seed conversation for each kind of lore, runs it through the
//! [`Agent`], and parses the final answer.

use std::sync::Arc;
use tracing::{debug, info};

use crate::adapter::McpTool;
use crate::agent::{Agent, AgentSettings, CallBudget};
use crate::error::{LoreError, Result};
use crate::llm::LlmProvider;
use crate::models::{Faction, FactionInput, Quest};
use crate::parser;
use crate::types::Message;

pub const GENRE_TOOL: &str = "fetch_genre";
pub const STORY_TOOL: &str = "fetch_story";
pub const MAX_FACTIONS: usize = 10;

pub struct LoreGenerator {
    agent: Agent,
}

impl LoreGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, tools: Vec<McpTool>, settings: AgentSettings) -> Self {
        info!("Initialized LoreGenerator with model: {}", settings.model);
        Self {
            agent: Agent::new(llm, tools, settings),
        }
    }

    fn system_prompt(&self) -> String {
        let catalog: Vec<String> = self
            .agent
            .tools()
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect();

        format!(
            "You are a creative worldbuilding assistant specialized in generating factions and \
             quests for tabletop RPGs.\n\n\
             Your purpose is to create rich, detailed, and imaginative content for game masters \
             and world builders.\n\n\
             Available tools:\n{}\n\n\
             Guidelines:\n\
             - Use the available tools as the main seed for your creativity\n\
             - Generate creative, original content with vivid details\n\
             - For factions: include name, symbol, core values, and soundtrack vibe\n\
             - For quests: include title, brief, NPCs, conflict, and location\n\
             - Always respond with valid JSON matching the requested format\n\
             - Be creative and surprising in your generation",
            catalog.join("\n")
        )
    }

    /// Generate `count` factions (1 to 10), one genre fetch per faction.
    pub async fn generate_factions(&self, count: usize) -> Result<Vec<Faction>> {
        if !(1..=MAX_FACTIONS).contains(&count) {
            return Err(LoreError::InvalidRequest(format!(
                "count must be between 1 and {MAX_FACTIONS}, got {count}"
            )));
        }
        info!("Generating {} faction(s)", count);

        let seed = vec![
            Message::system(self.system_prompt()),
            Message::user(faction_task(count)),
        ];
        let run = self
            .agent
            .run(seed, CallBudget::unlimited().limit(GENRE_TOOL, count))
            .await?;
        debug!(
            "Agent stopped ({:?}) after {} iteration(s), {} genre call(s) requested",
            run.stop,
            run.iterations,
            run.tool_calls_named(GENRE_TOOL)
        );

        let factions = parser::parse_factions(&run.content, count)?;
        info!("Successfully generated {} faction(s)", factions.len());
        Ok(factions)
    }

    /// Generate one quest, optionally casting NPCs from the given factions.
    pub async fn generate_quest(&self, factions: Option<&[FactionInput]>) -> Result<Quest> {
        let factions = factions.filter(|f| !f.is_empty());
        match factions {
            Some(f) => info!("Generating quest with {} faction(s)", f.len()),
            None => info!("Generating quest"),
        }

        let seed = vec![
            Message::system(self.system_prompt()),
            Message::user(quest_task(factions)),
        ];
        let run = self
            .agent
            .run(seed, CallBudget::unlimited().limit(STORY_TOOL, 1))
            .await?;
        debug!(
            "Agent stopped ({:?}) after {} iteration(s), {} story call(s) requested",
            run.stop,
            run.iterations,
            run.tool_calls_named(STORY_TOOL)
        );

        let quest = parser::parse_quest(&run.content)?;
        info!("Successfully generated quest '{}'", quest.title);
        Ok(quest)
    }
}

fn faction_task(count: usize) -> String {
    let faction_word = if count == 1 { "faction" } else { "factions" };
    format!(
        "Generate {count} unique {faction_word} for a fantasy world.\n\n\
         Each faction should have:\n\
         - name: A creative faction name\n\
         - symbol: Description of their symbol or emblem\n\
         - values: Core beliefs and values (2-3 sentences)\n\
         - soundtrack_vibe: Musical genre/style that represents them\n\n\
         Base each faction on a random genre or theme: call the {GENRE_TOOL} tool exactly \
         once per faction ({count} call(s) in total).\n\n\
         Respond with ONLY a JSON array of {count} faction object(s), no additional text.\n\
         Format: [{{\"name\": \"...\", \"symbol\": \"...\", \"values\": \"...\", \
         \"soundtrack_vibe\": \"...\"}}]"
    )
}

fn quest_task(factions: Option<&[FactionInput]>) -> String {
    let mut task = String::from(
        "Generate a unique quest for a tabletop RPG.\n\n\
         The quest should have:\n\
         - title: A compelling quest title\n\
         - quest_brief: Brief description of the quest (2-3 sentences)\n\
         - npcs: Key NPCs involved in the quest, each with name, role, faction and description\n\
         - conflict: The main conflict or challenge\n\
         - location: Where the quest takes place\n\n",
    );
    task.push_str(&format!(
        "Call the {STORY_TOOL} tool once to get random story elements to inspire your quest.\n\n"
    ));

    if let Some(factions) = factions {
        task.push_str("Base the quest's NPCs on these factions; each NPC belongs to one of them:\n");
        for f in factions {
            task.push_str(&format!(
                "- {} (symbol: {}; values: {}; soundtrack: {})\n",
                f.name, f.symbol, f.values, f.soundtrack_vibe
            ));
        }
        task.push('\n');
    }

    task.push_str(
        "Respond with ONLY a JSON object, no additional text.\n\
         Format: {\"title\": \"...\", \"quest_brief\": \"...\", \"npcs\": [{\"name\": \"...\", \
         \"role\": \"...\", \"faction\": \"...\", \"description\": \"...\"}], \
         \"conflict\": \"...\", \"location\": \"...\"}",
    );
    task
}
