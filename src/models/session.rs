use serde::{ Serialize, Deserialize };
use std::collections::HashMap;

use super::chat::ChatMessage;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    pub session_id: String,
    pub current_step: u32,
    pub student_interests: Vec<String>,
    pub career_paths: Vec<String>,
    pub message_count: usize,
    pub created_at: String,
    pub last_updated: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatHistory {
    pub messages: Vec<ChatMessage>,
    pub session_info: Option<SessionInfo>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionList {
    pub sessions: HashMap<String, SessionInfo>,
}
