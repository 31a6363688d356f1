pub mod error;

use async_trait::async_trait;
use log::{ debug, error, info, warn };
use reqwest::{ Client as HttpClient, Response };
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub use self::error::ApiError;
use crate::config::ClientConfig;
use crate::models::analyze::{ AnalyzeRequest, MiloResponse };
use crate::models::chat::ChatMessage;
use crate::models::session::{ ChatHistory, SessionInfo, SessionList };
use crate::models::stream::ChatStreamRequest;
use crate::stream::{ ChatStream, IngestOptions };

/// The part of the backend a chat session needs.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Starts a streamed reply. Transport failures come back as a stream holding a
    /// single error event.
    async fn stream_chat(&self, message: &str, session_id: &str) -> ChatStream;

    async fn clear_session(&self, session_id: &str) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct MiloClient {
    http: HttpClient,
    base_url: Url,
    request_timeout: Duration,
    stream_options: IngestOptions,
}

impl MiloClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        // No overall client timeout: it would also cut off long-running streams.
        let http = HttpClient::builder().connect_timeout(config.connect_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            request_timeout: config.request_timeout,
            stream_options: config.ingest_options(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn checked(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(ApiError::Status {
                status,
                url: resp.url().to_string(),
            })
        }
    }

    pub async fn stream_chat(&self, message: &str, session_id: &str) -> ChatStream {
        let url = match self.endpoint(&["chat", "stream"]) {
            Ok(url) => url,
            Err(e) => {
                return ChatStream::failed(e.to_string());
            }
        };
        info!("Streaming chat reply for session {} from {}", session_id, url);
        let request = ChatStreamRequest { message, session_id };
        let pending = self.http.post(url).json(&request).send();
        let sent = match self.stream_options.idle_timeout {
            Some(limit) =>
                match tokio::time::timeout(limit, pending).await {
                    Ok(sent) => sent,
                    Err(_) => {
                        warn!("No response headers within {:?}, giving up", limit);
                        return ChatStream::failed(format!("Stream timed out after {:?} without data", limit));
                    }
                }
            None => pending.await,
        };
        let resp = match sent {
            Ok(resp) => resp,
            Err(e) => {
                error!("Chat stream request failed: {}", e);
                return ChatStream::failed(format!("Failed to reach chat server: {}", e));
            }
        };
        match Self::checked(resp) {
            Ok(resp) => ChatStream::spawn(resp.bytes_stream(), self.stream_options),
            Err(e) => {
                error!("Chat stream rejected: {}", e);
                ChatStream::failed(e.to_string())
            }
        }
    }

    pub async fn chat_history(&self, session_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let url = self.endpoint(&["chat", "history", session_id])?;
        debug!("Fetching chat history from {}", url);
        let resp = self.http.get(url).timeout(self.request_timeout).send().await?;
        let history: ChatHistory = Self::checked(resp)?.json().await?;
        Ok(history.messages)
    }

    pub async fn session_info(&self, session_id: &str) -> Result<SessionInfo, ApiError> {
        let url = self.endpoint(&["chat", "session", session_id])?;
        let resp = self.http.get(url).timeout(self.request_timeout).send().await?;
        Ok(Self::checked(resp)?.json().await?)
    }

    pub async fn clear_session(&self, session_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["chat", "session", session_id])?;
        let resp = self.http.delete(url).timeout(self.request_timeout).send().await?;
        Self::checked(resp)?;
        info!("Session {} cleared", session_id);
        Ok(())
    }

    pub async fn list_sessions(&self) -> Result<HashMap<String, SessionInfo>, ApiError> {
        let url = self.endpoint(&["chat", "sessions"])?;
        let resp = self.http.get(url).timeout(self.request_timeout).send().await?;
        let list: SessionList = Self::checked(resp)?.json().await?;
        Ok(list.sessions)
    }

    pub async fn health(&self) -> Result<Value, ApiError> {
        let url = self.endpoint(&["health"])?;
        let resp = self.http.get(url).timeout(self.request_timeout).send().await?;
        Ok(Self::checked(resp)?.json().await?)
    }

    async fn try_analyze(&self, user_input: &str) -> Result<MiloResponse, ApiError> {
        let url = self.endpoint(&["analyze"])?;
        let request = AnalyzeRequest { user_input: user_input.to_string() };
        let resp = self.http.post(url).json(&request).timeout(self.request_timeout).send().await?;
        let data: MiloResponse = Self::checked(resp)?.json().await?;
        debug!("Analyze response: {} alumni, {} paths", data.target_company_alumni.len(), data.career_paths.len());
        Ok(data)
    }

    /// Legacy one-shot analysis. Never fails: when the backend cannot be reached
    /// the local fallback response is returned instead.
    pub async fn analyze(&self, user_input: &str) -> MiloResponse {
        match self.try_analyze(user_input).await {
            Ok(data) => data,
            Err(e) => {
                error!("Error calling Milo API: {}", e);
                MiloResponse::fallback(user_input)
            }
        }
    }
}

#[async_trait]
impl ChatBackend for MiloClient {
    async fn stream_chat(&self, message: &str, session_id: &str) -> ChatStream {
        MiloClient::stream_chat(self, message, session_id).await
    }

    async fn clear_session(&self, session_id: &str) -> Result<(), ApiError> {
        MiloClient::clear_session(self, session_id).await
    }
}
