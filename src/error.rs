use thiserror::Error;

/// Errors raised while talking to a capability provider or the operator.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The provider process or transport could not be brought up.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A request to the provider failed at the protocol level.
    #[error("Service error: {0}")]
    Service(#[from] rmcp::ServiceError),

    /// A remote payload did not have the expected shape.
    #[error("Malformed {what}: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A result carried no text where text was required.
    #[error("No text content in {0}")]
    MissingText(&'static str),

    /// Resource content was not valid JSON.
    #[error("Resource content is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The generation collaborator failed.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// HTTP transport error reaching the generation collaborator.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Operator input could not be read.
    #[error("Input error: {0}")]
    Io(#[from] std::io::Error),

    /// The operator's input stream was closed.
    #[error("Input closed")]
    InputClosed,
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub(crate) fn malformed(what: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| ClientError::Malformed { what, source }
    }
}
