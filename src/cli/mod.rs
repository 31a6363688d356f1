use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Terminal client for the Milo career advisor", long_about = None)]
pub struct Args {
    // --- Backend Args ---
    /// Base URL of the Milo API (e.g., http://localhost:8001)
    #[arg(long, env = "MILO_API_URL", default_value = "http://localhost:8001")]
    pub api_url: String,

    /// Chat session identifier shared with the backend.
    #[arg(long, env = "MILO_SESSION_ID", default_value = "default")]
    pub session_id: String,

    /// Timeout in seconds for non-streaming requests (history, sessions, analyze).
    #[arg(long, env = "MILO_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Timeout in seconds for establishing a connection.
    #[arg(long, env = "MILO_CONNECT_TIMEOUT", default_value = "10")]
    pub connect_timeout: u64,

    /// Give up on a streamed reply after this many seconds without data. 0 waits forever.
    #[arg(long, env = "MILO_STREAM_IDLE_TIMEOUT", default_value = "0")]
    pub stream_idle_timeout: u64,

    // --- One-shot Args ---
    /// Send a single chat message, print the reply and exit.
    #[arg(short = 'm', long)]
    pub message: Option<String>,

    /// Run the legacy analyze endpoint for this input, print the result and exit.
    #[arg(long)]
    pub analyze: Option<String>,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
