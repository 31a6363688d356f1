use serde_json::Value;

use crate::models::company::{ CompanyCard, CompanyEntry, Relevance };

/// Colour ramp for match scores, strongest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreTier {
    Top,
    Mid,
    LowMid,
    Lowest,
}

impl ScoreTier {
    pub fn label(&self) -> &'static str {
        match self {
            ScoreTier::Top => "strong",
            ScoreTier::Mid => "good",
            ScoreTier::LowMid => "fair",
            ScoreTier::Lowest => "weak",
        }
    }
}

fn numeric(relevance: Option<&Relevance>) -> f64 {
    let n = match relevance {
        Some(Relevance::Score(n)) => *n,
        Some(Relevance::Other(Value::Bool(true))) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

/// Half-up rounding, matching how the web client displays scores.
fn round_half_up(n: f64) -> i64 {
    (n + 0.5).floor() as i64
}

/// Score shown on a company card. Labels map to fixed scores, numbers are rounded.
pub fn display_score(relevance: Option<&Relevance>) -> i64 {
    match relevance {
        Some(Relevance::Label(label)) =>
            match label.as_str() {
                "High" => 95,
                "Medium" => 75,
                _ => 60,
            }
        other => round_half_up(numeric(other)),
    }
}

/// Labels use a three-step ramp, numbers a four-step one.
pub fn score_tier(relevance: Option<&Relevance>) -> ScoreTier {
    match relevance {
        Some(Relevance::Label(label)) =>
            match label.to_lowercase().as_str() {
                "high" => ScoreTier::Top,
                "medium" => ScoreTier::Mid,
                _ => ScoreTier::LowMid,
            }
        other => {
            let n = numeric(other);
            if n >= 90.0 {
                ScoreTier::Top
            } else if n >= 70.0 {
                ScoreTier::Mid
            } else if n >= 50.0 {
                ScoreTier::LowMid
            } else {
                ScoreTier::Lowest
            }
        }
    }
}

impl CompanyEntry {
    pub fn display_score(&self) -> i64 {
        display_score(self.relevance.as_ref())
    }

    pub fn score_tier(&self) -> ScoreTier {
        score_tier(self.relevance.as_ref())
    }
}

impl CompanyCard {
    /// Attached cards only distinguish three tiers.
    pub fn score_tier(&self) -> ScoreTier {
        if self.relevance >= 90.0 {
            ScoreTier::Top
        } else if self.relevance >= 70.0 {
            ScoreTier::Mid
        } else {
            ScoreTier::LowMid
        }
    }
}
