use serde::{ Serialize, Deserialize };

use super::lenient::loose_string;

#[derive(Clone, Debug, Serialize)]
pub struct AnalyzeRequest {
    pub user_input: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub company: String,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerProgression {
    pub progression_type: String,
    pub years_experience: f64,
    pub career_stage: String,
    pub total_positions: u32,
}

/// An alumni record as returned by the analyze endpoint and attached to messages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlumniProfile {
    pub name: String,
    pub position: String,
    pub company: String,
    pub location: String,
    pub connections: u32,
    pub followers: u32,
    pub recommendations: u32,
    pub major: String,
    pub degree: String,
    pub graduation_year: String,
    pub about: String,
    pub experience_history: Vec<ExperienceEntry>,
    pub company_industry: String,
    pub company_size: String,
    pub yale_alumni_at_company: u32,
    pub career_progression: Option<CareerProgression>,
    pub key_skills: Vec<String>,
    pub networking_score: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerExample {
    #[serde(deserialize_with = "loose_string")]
    pub name: String,
    #[serde(deserialize_with = "loose_string")]
    pub current_role: String,
    #[serde(deserialize_with = "loose_string")]
    pub current_company: String,
    #[serde(deserialize_with = "loose_string")]
    pub career_path: String,
    #[serde(deserialize_with = "loose_string")]
    pub major: String,
    #[serde(deserialize_with = "loose_string")]
    pub graduation_year: String,
    #[serde(deserialize_with = "loose_string")]
    pub location: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerPath {
    pub path: String,
    pub count: u32,
    pub examples: Vec<CareerExample>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    pub target_companies: Vec<String>,
    pub target_roles: Vec<String>,
    pub industry: String,
    pub motivation: String,
    pub timeline: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionPlan {
    pub plan: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessedQuery {
    pub query_type: String,
    pub original_query: String,
    pub expanded_query: String,
    pub detected_industry: Option<String>,
    pub detected_companies: Vec<String>,
    pub detected_roles: Vec<String>,
    pub confidence: f64,
    pub student_intent: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiloResponse {
    pub analysis: Analysis,
    pub target_company_alumni: Vec<AlumniProfile>,
    pub career_paths: Vec<CareerPath>,
    pub people_to_contact: Vec<AlumniProfile>,
    pub action_plan: ActionPlan,
    pub success_odds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_query: Option<ProcessedQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const FALLBACK_PLAN: &str =
    "Hey there, you want to work at your target company? I'm having trouble connecting to the Yale alumni database right now, but I can still help you with your career goals.

**IMMEDIATE ACTIONS (Next 7 Days):**
1. Research companies in your field of interest
2. Update your LinkedIn profile with relevant skills
3. Start networking with professionals in your target industry

**THIS SEMESTER:**
- Take relevant courses to build skills
- Join professional organizations
- Attend career fairs and networking events

**CAREER TIMELINE:**
- Apply for internships in your target field
- Build a strong portfolio of projects
- Network with alumni and professionals

Please try again in a moment, and I'll connect you with specific Yale alumni who can help with your career goals!";

pub const FALLBACK_ERROR: &str = "Unable to connect to Yale alumni database";

impl MiloResponse {
    /// Local stand-in served when the analyze endpoint cannot be reached.
    pub fn fallback(user_input: &str) -> Self {
        Self {
            analysis: Analysis {
                target_companies: vec!["Technology Companies".to_string()],
                target_roles: vec!["Software Engineer".to_string()],
                industry: "Technology".to_string(),
                motivation: "Career growth and development".to_string(),
                timeline: "1-2 years".to_string(),
            },
            target_company_alumni: Vec::new(),
            career_paths: Vec::new(),
            people_to_contact: Vec::new(),
            action_plan: ActionPlan { plan: FALLBACK_PLAN.to_string() },
            success_odds: 60.0,
            processed_query: Some(ProcessedQuery {
                query_type: "general".to_string(),
                original_query: user_input.to_string(),
                expanded_query: user_input.to_string(),
                detected_industry: Some("Technology".to_string()),
                detected_companies: Vec::new(),
                detected_roles: Vec::new(),
                confidence: 0.5,
                student_intent: None,
            }),
            error: Some(FALLBACK_ERROR.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.as_deref() == Some(FALLBACK_ERROR)
    }
}
