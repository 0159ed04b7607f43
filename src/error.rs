pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Graph construction error: {0}")]
    GraphConstruction(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Insufficient removable edges: requested {requested}, removed {removed} without disconnecting the graph")]
    InsufficientRemovableEdges { requested: usize, removed: usize },

    #[error("Negative sample exhaustion: requested {requested} non-edges, {available} available")]
    NegativeSampleExhaustion { requested: usize, available: usize },

    #[error("Empty evaluation set: {0}")]
    EmptyEvaluationSet(String),

    #[error("Shape mismatch: {what} (expected {expected}, got {actual})")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported label shape: {0}")]
    UnsupportedLabelShape(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EvalError {
    pub fn graph_construction<S: Into<String>>(msg: S) -> Self {
        EvalError::GraphConstruction(msg.into())
    }

    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        EvalError::InvalidParameter(msg.into())
    }

    pub fn node_not_found<S: Into<String>>(node_id: S) -> Self {
        EvalError::NodeNotFound(node_id.into())
    }

    pub fn empty_evaluation_set<S: Into<String>>(msg: S) -> Self {
        EvalError::EmptyEvaluationSet(msg.into())
    }

    pub fn unsupported_label_shape<S: Into<String>>(msg: S) -> Self {
        EvalError::UnsupportedLabelShape(msg.into())
    }

    pub fn numerical<S: Into<String>>(msg: S) -> Self {
        EvalError::Numerical(msg.into())
    }

    pub fn shape_mismatch<S: Into<String>>(what: S, expected: usize, actual: usize) -> Self {
        EvalError::ShapeMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }
}
