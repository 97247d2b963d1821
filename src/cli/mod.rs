use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Chat LLM Provider Args ---
    /// API Key for the Gemini text-generation backend.
    #[arg(long, env = "GEMINI_API_KEY", default_value = "")]
    pub api_key: String,

    /// Model name for chat completion (e.g., gemini-1.5-flash-latest)
    #[arg(long, env = "CHAT_MODEL")]
    pub chat_model: Option<String>,

    /// Base URL for the Gemini models endpoint. Adapter default used if unset.
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    /// Sampling temperature for responses.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub temperature: f32,

    /// Nucleus sampling probability mass.
    #[arg(long, env = "CHAT_TOP_P", default_value = "0.95")]
    pub top_p: f32,

    /// Top-k sampling cutoff.
    #[arg(long, env = "CHAT_TOP_K", default_value = "40")]
    pub top_k: u32,

    // --- History Store Args ---
    /// Path to the local audit history file (bounded, deduplicated by URL).
    #[arg(long, env = "HISTORY_PATH", default_value = "audit_history.json")]
    pub history_path: String,

    // --- Renderer Args ---
    /// Characters revealed per tick during the opening typing simulation.
    #[arg(long, env = "REVEAL_CHARS", default_value = "10")]
    pub reveal_chars: usize,

    /// Tick period in milliseconds for the opening typing simulation.
    #[arg(long, env = "REVEAL_INTERVAL_MS", default_value = "1")]
    pub reveal_interval_ms: u64,

    /// Rotation period in milliseconds for the pending-response captions.
    #[arg(long, env = "STATUS_INTERVAL_MS", default_value = "1500")]
    pub status_interval_ms: u64,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
