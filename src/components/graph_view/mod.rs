//! Integration-channel graph view.
//!
//! Renders channels, destinations and transformers on an HTML canvas in one of
//! four layouts:
//! - Collapsible tree with expandable subtrees
//! - Hierarchical tree in vertical, horizontal or radial orientation
//! - Force-directed layout over the whole graph
//! - Disjoint force layout that keeps unconnected groups apart
//!
//! Layout math lives in plain modules ([`hierarchy`], [`tree_layout`],
//! [`simulation`], [`view`]) so it can be exercised without a browser. The
//! [`coordinator::RenderCoordinator`] ties them together and the Leptos
//! component only forwards input and draws frames.
//!
//! # Example
//!
//! ```ignore
//! use channel_graph::{GraphDocument, GraphViewCanvas, LayoutMode};
//!
//! let document = GraphDocument::from_json(r#"{"nodes":[],"links":[]}"#)?;
//!
//! view! { <GraphViewCanvas document=document.into() mode=LayoutMode::ForceDirected fullscreen=true /> }
//! ```

pub mod annotations;
mod component;
pub mod coordinator;
mod error;
pub mod geometry;
pub mod hierarchy;
pub mod model;
mod render;
pub mod scale;
pub mod settings;
pub mod simulation;
pub mod storage;
pub mod theme;
pub mod tree_layout;
pub mod types;
pub mod view;

pub use annotations::{AnnotationStore, Status};
pub use component::GraphViewCanvas;
pub use coordinator::RenderCoordinator;
pub use error::{GraphError, StorageError};
pub use theme::Theme;
pub use types::{AnnotationDocument, GraphDocument, LayoutMode, Link, LinkKind, Node, NodeId, NodeKind};
