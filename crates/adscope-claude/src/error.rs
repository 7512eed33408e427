use thiserror::Error;

/// Errors returned by the Anthropic Messages API client.
#[derive(Debug, Error)]
pub enum ClaudeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("Claude API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response carried no text content blocks.
    #[error("Claude response contained no text")]
    EmptyResponse,

    /// The client could not be built from the supplied settings.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}
