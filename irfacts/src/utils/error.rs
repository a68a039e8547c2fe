use std::path::PathBuf;

use irgraph::{
    graph::{NodeId, NodeKind},
    utils::Error as GraphError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FactError {
    #[error(
        "Relation '{relation}' has {expected} columns but a tuple with {found} columns was inserted"
    )]
    SchemaMismatch {
        relation: String,
        expected: usize,
        found: usize,
    },

    #[error("Node `{id}` has no registered handling (found {})", .found.map_or("nothing", |kind| kind.into()))]
    UnhandledNodeKind { id: NodeId, found: Option<NodeKind> },

    #[error("Graph error: {0}")]
    Graph(GraphError),

    #[error("Failed to persist diff to '{}': {source}", .path.display())]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParse {
        source: toml::de::Error,
        file: String,
    },

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

/// Kind errors from the graph mean a handle resolved to something the caller
/// cannot handle; every other graph error is passed through.
impl From<GraphError> for FactError {
    fn from(error: GraphError) -> Self {
        match error {
            GraphError::KindMismatch { id, found, .. } => FactError::UnhandledNodeKind {
                id,
                found: Some(found),
            },
            GraphError::DanglingNode { id, .. } => FactError::UnhandledNodeKind { id, found: None },
            other => FactError::Graph(other),
        }
    }
}

pub type FactResult<T> = Result<T, FactError>;
