#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid graph state: {0}")]
    InvalidState(#[source] serde_json::Error),
    #[error("invalid layout config: {0}")]
    InvalidConfig(#[source] serde_json::Error),
    #[error("failed to encode graph state: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("node `{id}` does not exist in the graph state")]
    UnknownNode { id: String },
    #[error("position ({x}, {y}) is not finite")]
    NonFinitePosition { x: f64, y: f64 },
    #[error("unknown graph kind `{kind}` (expected `environment` or `engine`)")]
    UnknownGraphKind { kind: String },
}

impl Error {
    /// Stable machine-readable tag for the host.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidState(_) => "invalid_state",
            Error::InvalidConfig(_) => "invalid_config",
            Error::Encode(_) => "encode",
            Error::UnknownNode { .. } => "unknown_node",
            Error::NonFinitePosition { .. } => "non_finite_position",
            Error::UnknownGraphKind { .. } => "unknown_graph_kind",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
