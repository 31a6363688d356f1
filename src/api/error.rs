use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP error! status: {status} ({url})")]
    Status {
        status: StatusCode,
        url: String,
    },
    #[error("cannot build endpoint url from base '{0}'")]
    BaseUrl(String),
}
