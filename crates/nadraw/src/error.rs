use crate::model::Side;

/// Recoverable conditions met while routing or applying overlay data.
///
/// These never abort a pass: the offending edge or request is skipped, the diagnostic is logged
/// and kept on the diagram until drained.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Diagnostic {
    #[error("edge {edge_id} references missing metadata: {reference}")]
    MissingMetadata { edge_id: String, reference: String },

    #[error("edge {edge_id} has unknown kind {kind:?}; not drawn")]
    UnknownEdgeKind { edge_id: String, kind: String },

    #[error(
        "bus {bus_id} is not in the voltage level of edge {edge_id} side {side:?}; reassignment rejected"
    )]
    InvalidTargetBus {
        edge_id: String,
        side: Side,
        bus_id: String,
    },

    #[error("edge {edge_id} joins coincident positions; direction defaults to 0")]
    DegenerateEdge { edge_id: String },
}

impl Diagnostic {
    pub(crate) fn log(&self) {
        match self {
            Diagnostic::MissingMetadata { edge_id, reference } => {
                tracing::warn!(%edge_id, %reference, "skipping edge with missing metadata");
            }
            Diagnostic::UnknownEdgeKind { edge_id, kind } => {
                tracing::warn!(%edge_id, %kind, "skipping edge of unknown kind");
            }
            Diagnostic::InvalidTargetBus {
                edge_id,
                side,
                bus_id,
            } => {
                tracing::warn!(%edge_id, ?side, %bus_id, "rejected bus reassignment across voltage levels");
            }
            Diagnostic::DegenerateEdge { edge_id } => {
                tracing::warn!(%edge_id, "edge endpoints coincide");
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown node: {id}")]
    UnknownNode { id: String },

    #[error("unknown edge: {id}")]
    UnknownEdge { id: String },

    #[error("unknown bus node: {id}")]
    UnknownBusNode { id: String },

    #[error("unknown text node: {id}")]
    UnknownTextNode { id: String },

    #[error("invalid diagram metadata: {message}")]
    InvalidMetadata { message: String },

    #[error(transparent)]
    Rejected(#[from] Diagnostic),

    #[error("metadata JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
