//! Segment reductions and graph batching.
//!
//! `segraph-core` provides the two numerical building blocks underneath
//! graph neural network code:
//!
//! - [`scatter`](mod@scatter): grouped reductions (`add`, `max`, `softmax`) of a tensor's
//!   rows keyed by an integer index
//! - [`batch`]: merging many graphs into one disjoint-union graph, with a
//!   `graph_indicator` that maps nodes back to their graph
//!
//! plus graph records ([`GraphData`]), datasets and a batching
//! [`Dataloader`], and configuration.
//!
//! Tensors are [`ndarray`] arrays; every operation borrows its inputs and
//! returns new arrays.
//!
//! # Example: graph-level sum pooling
//!
//! ```rust
//! use segraph_core::{collate, scatter, Aggregation, GraphData};
//! use ndarray::arr2;
//!
//! let a = GraphData::from_edges(&[(0, 1)], 2)?
//!     .with_node_features(arr2(&[[1.0f32, 2.0], [3.0, 4.0]]))?;
//! let b = GraphData::from_edges(&[(0, 0)], 1)?
//!     .with_node_features(arr2(&[[5.0f32, 6.0]]))?;
//!
//! let batch = collate(&[a, b])?;
//! let x = batch.node_features().unwrap();
//! let pooled = scatter(x, batch.graph_indicator(), Some(batch.num_graphs()), Aggregation::Add)?;
//!
//! assert_eq!(pooled, arr2(&[[4.0f32, 6.0], [5.0, 6.0]]).into_dyn());
//! # Ok::<(), segraph_core::Error>(())
//! ```

pub mod batch;
pub mod config;
pub mod error;
mod graph;
mod interop;
pub mod loader;
pub mod scatter;

pub use batch::{collate, BatchedGraphData};
pub use config::Config;
pub use error::{Error, Result};
pub use graph::GraphData;
pub use loader::{Dataloader, Dataset, InMemoryDataset};
pub use scatter::{scatter, scatter_add, scatter_max, scatter_softmax, Aggregation};
