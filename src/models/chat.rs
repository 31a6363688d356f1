use chrono::{ DateTime, NaiveDateTime, Utc };
use serde::{ Serialize, Deserialize, Deserializer };
use uuid::Uuid;

use super::analyze::AlumniProfile;
use super::company::CompanyCard;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default = "generated_id")]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "alumniData")]
    pub alumni_data: Option<Vec<AlumniProfile>>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "peopleToContact")]
    pub people_to_contact: Option<Vec<AlumniProfile>>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "companyData")]
    pub company_data: Option<Vec<CompanyCard>>,
}

fn generated_id() -> String {
    Uuid::new_v4().to_string()
}

/// The backend stamps history entries with naive ISO-8601 local times; those are
/// taken as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where D: Deserializer<'de>
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

impl ChatMessage {
    fn new(role: Role, content: String) -> Self {
        Self {
            id: format!("{}-{}", role.as_str(), Uuid::new_v4()),
            role,
            content,
            timestamp: Utc::now(),
            alumni_data: None,
            people_to_contact: None,
            company_data: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    /// An empty assistant message, ready to receive streamed chunks.
    pub fn assistant() -> Self {
        Self::new(Role::Assistant, String::new())
    }

    /// Appends a streamed chunk. User messages are immutable once created.
    pub fn append(&mut self, chunk: &str) -> bool {
        if self.role != Role::Assistant {
            return false;
        }
        self.content.push_str(chunk);
        true
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}
