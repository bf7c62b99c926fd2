#![forbid(unsafe_code)]

//! Headless geometry engine for network-area diagrams (NAD).
//!
//! Given the metadata of an already laid-out diagram (node positions, buses, edges, labels) this
//! crate computes every piece of derived geometry a renderer needs:
//! - edge polylines, forks for parallel edges, self-loops and three-terminal legs;
//! - bus rings, fragmented where lower-index buses' edges cross them;
//! - label connectors.
//!
//! After the initial batch pass, dragging a node only recomputes what depends on it (see
//! [`Diagram::move_node`] and the pointer API). Rendering itself is out of scope.

pub mod angles;
pub mod bus;
pub mod config;
pub mod diagram;
pub mod error;
pub mod geom;
pub mod graph;
pub mod model;
pub mod overlay;
pub mod path;
pub mod redraw;
pub mod route;
pub mod slots;
pub mod text;
pub mod viewport;

pub use angles::{EdgeAngle, EdgeAngleMap};
pub use bus::{BusRadius, BusShape};
pub use config::DiagramParameters;
pub use diagram::{Diagram, DiagramSnapshot};
pub use error::{Diagnostic, Error, Result};
pub use geom::Point;
pub use model::{DiagramMetadata, EdgeKind, Side};
pub use overlay::{BranchState, BusState, EdgeInfo, FlowDirection};
pub use redraw::{DragTarget, NodeMoved, PointerOutcome, RedrawReport, Selection, TextNodeMoved};
pub use route::{EdgeGeometry, EdgeSymbol, HalfEdge};
pub use text::TextNodeGeometry;
pub use viewport::{DisplayClass, ViewportScale};
