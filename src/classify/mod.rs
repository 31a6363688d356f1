//! Decides how an accumulated chat message should be displayed and pulls out any
//! structured payload embedded in its text.
//!
//! Rules are checked in a fixed order and the first match wins. Classification
//! only reads the message, so it is safe to run on every partial update.

pub mod extract;
pub mod relevance;

use log::warn;
use serde::Deserialize;
use serde_json::Value;

use crate::models::analyze::{ AlumniProfile, CareerExample };
use crate::models::chat::ChatMessage;
use crate::models::company::{ CompanyCard, CompanyEntry };
use crate::models::moves::MoveEntry;

pub const THINKING_MARKERS: [&str; 2] = ["**Thinking ⌄**", "**Parsing user intent ⌄**"];
pub const COMPANIES_HEADER: &str = "**Companies to Consider**";
pub const MOVES_HEADER: &str = "**High-Leverage Next Moves**";
pub const ALUMNI_HEADERS: [&str; 2] = ["**Yale Alumni at Companies**", "**Similar Yale Alumni**"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataCategory {
    Companies,
    Moves,
    Alumni,
}

impl DataCategory {
    pub fn title(&self) -> &'static str {
        match self {
            DataCategory::Companies => "Companies to Consider",
            DataCategory::Moves => "High-Leverage Next Moves",
            DataCategory::Alumni => "Yale Alumni at Target Companies",
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            DataCategory::Companies => "Error loading companies. Please try again.",
            DataCategory::Moves => "Error loading pathways moves. Please try again.",
            DataCategory::Alumni => "Error loading alumni data",
        }
    }
}

pub const NO_VALID_ALUMNI: &str = "No valid alumni data found";

/// What sits under the narrative of an alumni reply.
#[derive(Clone, Debug, PartialEq)]
pub enum AlumniTable {
    Rows(Vec<CareerExample>),
    NoValidData,
    Failed,
    /// No complete JSON array in the text (yet).
    Absent,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParsedBlock {
    Markdown,
    Thinking,
    Companies(Vec<CompanyEntry>),
    Moves(Vec<MoveEntry>),
    Alumni {
        narrative: String,
        table: AlumniTable,
    },
    LoadError(DataCategory),
    AttachedAlumni(Vec<AlumniProfile>),
    AttachedContacts(Vec<AlumniProfile>),
    AttachedCompanies(Vec<CompanyCard>),
}

impl ParsedBlock {
    pub fn kind(&self) -> &'static str {
        match self {
            ParsedBlock::Markdown => "markdown",
            ParsedBlock::Thinking => "thinking",
            ParsedBlock::Companies(_) => "companies",
            ParsedBlock::Moves(_) => "moves",
            ParsedBlock::Alumni { .. } => "alumni",
            ParsedBlock::LoadError(_) => "load-error",
            ParsedBlock::AttachedAlumni(_) => "attached-alumni",
            ParsedBlock::AttachedContacts(_) => "attached-contacts",
            ParsedBlock::AttachedCompanies(_) => "attached-companies",
        }
    }
}

fn has_listing(content: &str, header: &str, field: &str) -> bool {
    content.contains(header) &&
        (content.contains(extract::JSON_FENCE) || content.contains(&format!("\"{}\"", field)))
}

fn listing_block<T, F>(content: &str, field: &'static str, category: DataCategory, wrap: F) -> ParsedBlock
    where T: serde::de::DeserializeOwned, F: FnOnce(Vec<T>) -> ParsedBlock
{
    match extract::listing::<T>(content, field) {
        Ok(entries) => wrap(entries),
        Err(e) => {
            warn!("Error parsing {} JSON: {}", field, e);
            ParsedBlock::LoadError(category)
        }
    }
}

fn non_empty_str(entry: &Value, key: &str) -> bool {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false)
}

fn alumni_table(content: &str) -> AlumniTable {
    let Some(candidate) = extract::array_candidate(content) else {
        return AlumniTable::Absent;
    };
    let parsed: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            warn!("Error parsing alumni JSON: {}", e);
            return AlumniTable::Failed;
        }
    };
    let Value::Array(entries) = parsed else {
        return AlumniTable::Absent;
    };
    let valid: Result<Vec<CareerExample>, _> = entries
        .iter()
        .filter(|entry| {
            non_empty_str(entry, "name") &&
                non_empty_str(entry, "current_role") &&
                non_empty_str(entry, "current_company")
        })
        .map(CareerExample::deserialize)
        .collect();
    match valid {
        Ok(rows) if rows.is_empty() => AlumniTable::NoValidData,
        Ok(rows) => AlumniTable::Rows(rows),
        Err(e) => {
            warn!("Error reading alumni rows: {}", e);
            AlumniTable::Failed
        }
    }
}

/// Rules that look only at the text. `None` means the text alone says nothing.
pub fn classify_text(content: &str) -> Option<ParsedBlock> {
    if THINKING_MARKERS.iter().any(|marker| content.contains(marker)) {
        return Some(ParsedBlock::Thinking);
    }
    if has_listing(content, COMPANIES_HEADER, "companies") {
        return Some(listing_block(content, "companies", DataCategory::Companies, ParsedBlock::Companies));
    }
    if has_listing(content, MOVES_HEADER, "moves") {
        return Some(listing_block(content, "moves", DataCategory::Moves, ParsedBlock::Moves));
    }
    if ALUMNI_HEADERS.iter().any(|header| content.contains(header)) {
        return Some(ParsedBlock::Alumni {
            narrative: extract::narrative(content).to_string(),
            table: alumni_table(content),
        });
    }
    None
}

/// Picks the display for a message: embedded payloads first, then anything
/// attached out-of-band, then plain markdown.
pub fn classify(message: &ChatMessage) -> ParsedBlock {
    if !message.is_assistant() {
        return ParsedBlock::Markdown;
    }
    if let Some(block) = classify_text(&message.content) {
        return block;
    }
    if let Some(alumni) = &message.alumni_data {
        return ParsedBlock::AttachedAlumni(alumni.clone());
    }
    if let Some(contacts) = &message.people_to_contact {
        return ParsedBlock::AttachedContacts(contacts.clone());
    }
    if let Some(companies) = &message.company_data {
        return ParsedBlock::AttachedCompanies(companies.clone());
    }
    ParsedBlock::Markdown
}
