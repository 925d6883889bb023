use thiserror::Error;

/// Failure delivering a funnel event to its sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend rejected insert ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to append to local log: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure loading or talking to the product-analytics collector
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("collector not configured: {0}")]
    NotConfigured(String),

    #[error("collector not loaded")]
    NotLoaded,

    #[error("collector request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("collector rejected event ({status})")]
    Rejected { status: u16 },
}
