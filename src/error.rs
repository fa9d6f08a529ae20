use thiserror::Error;

/// Failures surfaced by the renderer and its pages.
#[derive(Error, Debug)]
pub enum GraphError {
	#[error("rendering backend unavailable: {0}")]
	BackendUnavailable(String),

	#[error("storage error: {0}")]
	Storage(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("{name} {id} not found", name = .kind.display_name())]
	EntityNotFound {
		kind: crate::components::force_graph::EntityType,
		id: String,
	},

	#[error("unknown entity type: {0}")]
	UnknownEntityType(String),
}

/// Result alias for renderer operations.
pub type Result<T> = std::result::Result<T, GraphError>;
