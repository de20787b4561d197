use thiserror::Error;

use super::types::NodeKind;

/// Recoverable errors reported by topology mutations.
///
/// A failed operation never leaves a partial mutation behind.
#[derive(Debug, Error)]
pub enum TopologyError {
	/// A node with this id already exists.
	#[error("node {id} already exists")]
	DuplicateNode { id: String },
	/// A node describing the same backend object already exists.
	#[error("{kind} \"{name}\" is already on the canvas")]
	DuplicateIdentity { kind: NodeKind, name: String },
	/// A link with this id already exists.
	#[error("link {id} already exists")]
	DuplicateLink { id: String },
	/// A link endpoint does not reference an existing node.
	#[error("link endpoint {id} does not exist")]
	MissingEndpoint { id: String },
	/// A link would connect a node to itself.
	#[error("cannot connect node {id} to itself")]
	SelfLoop { id: String },
	/// Another drag session is still in flight.
	#[error("another drag is still in progress")]
	DragInProgress,
	/// A sidebar drop carried an unusable payload.
	#[error("invalid drop payload: {0}")]
	InvalidPayload(String),
	/// A topology document could not be (de)serialized.
	#[error("topology document error: {0}")]
	Json(#[from] serde_json::Error),
}
