use serde::{ Serialize, Deserialize };

use super::lenient::{ loose_opt_string, loose_string };

/// Match strength as sent by the backend: either a label ("High", "Medium", ...)
/// or a 0-100 score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Relevance {
    Score(f64),
    Label(String),
    Other(serde_json::Value),
}

/// A company card embedded in a "Companies to Consider" reply.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyEntry {
    #[serde(deserialize_with = "loose_string")]
    pub name: String,
    #[serde(deserialize_with = "loose_string")]
    pub domain: String,
    pub relevance: Option<Relevance>,
    #[serde(deserialize_with = "loose_opt_string")]
    pub team: Option<String>,
    #[serde(deserialize_with = "loose_opt_string")]
    pub career_url: Option<String>,
}

impl CompanyEntry {
    pub fn team_label(&self) -> &str {
        match self.team.as_deref() {
            Some(team) if !team.is_empty() => team,
            _ => "Team not specified",
        }
    }

    pub fn apply_url(&self) -> String {
        match self.career_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("https://{}/careers", self.domain),
        }
    }

    pub fn logo_url(&self) -> String {
        format!("https://img.logo.dev/{}", self.domain)
    }

    /// Placeholder shown when the logo cannot be loaded.
    pub fn initial(&self) -> String {
        self.name.chars().next().map(|c| c.to_uppercase().collect()).unwrap_or_default()
    }
}

/// A company attached to a message out-of-band rather than embedded in its text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyCard {
    pub name: String,
    pub domain: String,
    pub industry: String,
    pub relevance: f64,
}
