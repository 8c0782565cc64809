//! es-graph: node connectivity for graph diffusion.
//!
//! Provides:
//! - An immutable edge-list graph with source-ordered adjacency
//! - Incremental builder with validation
//! - Self-loop completion (`with_remaining_self_loops`)
//!
//! # Example
//!
//! ```
//! use es_graph::GraphBuilder;
//!
//! let mut builder = GraphBuilder::new(2);
//! builder.add_undirected_edge(0, 1);
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.num_nodes(), 2);
//! assert_eq!(graph.num_edges(), 2);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod self_loops;
pub(crate) mod validate;

pub use builder::GraphBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{Edge, Graph};
