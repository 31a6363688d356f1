use serde::{ Serialize, Deserialize };

use super::lenient::loose_string;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelineTier {
    Immediate,
    ThisSemester,
    Later,
}

/// One card of a "High-Leverage Next Moves" reply.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveEntry {
    #[serde(deserialize_with = "loose_string")]
    pub title: String,
    #[serde(deserialize_with = "loose_string")]
    pub domain: String,
    #[serde(deserialize_with = "loose_string")]
    pub timeline: String,
    #[serde(deserialize_with = "loose_string")]
    pub description: String,
    #[serde(deserialize_with = "loose_string")]
    pub how_to_start: String,
}

/// Splits a sentence run into at most two display bullets.
pub fn bullet_points(text: &str) -> Vec<&str> {
    text.split(". ")
        .map(str::trim)
        .filter(|point| !point.is_empty())
        .take(2)
        .collect()
}

impl MoveEntry {
    pub fn description_points(&self) -> Vec<&str> {
        bullet_points(&self.description)
    }

    pub fn start_points(&self) -> Vec<&str> {
        bullet_points(&self.how_to_start)
    }

    pub fn timeline_tier(&self) -> TimelineTier {
        match self.timeline.as_str() {
            "immediate" => TimelineTier::Immediate,
            "this semester" => TimelineTier::ThisSemester,
            _ => TimelineTier::Later,
        }
    }

    pub fn logo_url(&self) -> String {
        format!("https://logo.clearbit.com/{}", self.domain)
    }
}
