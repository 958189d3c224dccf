//! Error types for graph mutations and persistence.

use thiserror::Error;

use super::types::NodeId;

/// Rejected user input. Returned before the model is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
	/// The trimmed name was empty.
	#[error("node name must not be empty")]
	EmptyName,
	/// Source and target are the same node.
	#[error("cannot link node `{0}` to itself")]
	SelfLink(NodeId),
	/// The link is already present.
	#[error("link `{from}` -> `{to}` already exists")]
	DuplicateLink { from: NodeId, to: NodeId },
	/// An id that is not in the graph.
	#[error("unknown node `{0}`")]
	UnknownNode(NodeId),
	/// A node with this id already exists.
	#[error("node `{0}` already exists")]
	DuplicateNode(NodeId),
	/// Ids that clash with the synthetic tree root.
	#[error("id `{0}` is reserved for the synthetic root")]
	ReservedId(NodeId),
}

/// Failure reported by the storage collaborator. In-memory state is never changed by it.
#[derive(Debug, Error)]
pub enum StorageError {
	/// The backend could not be reached or refused the request.
	#[error("storage unavailable: {0}")]
	Unavailable(String),
	/// A stored document could not be parsed or written.
	#[error("malformed document: {0}")]
	Serialization(#[from] serde_json::Error),
}
