//! Segment reductions and disjoint-union batching for graph neural networks.
//!
//! `segraph` is a Rust library for the data plumbing underneath GNN training:
//!
//! - Scatter `add` / `max` / `softmax` of tensor rows keyed by a group index
//! - Collating many small graphs into one batch with a graph indicator
//! - In-memory datasets and a seeded, shuffling dataloader
//! - Message passing and graph-level readout built on the two above
//!
//! # Crate Structure
//!
//! - [`segraph_core`] - Scatter, GraphData, collate, datasets, config
//! - [`segraph_nn`] - Message passing, pooling, Glorot initialisation
//!
//! # Example
//!
//! ```rust
//! use segraph::prelude::*;
//! use ndarray::arr2;
//!
//! let graphs: InMemoryDataset = (0..5)
//!     .map(|i| {
//!         GraphData::from_edges(&[(0, 1)], 2)?
//!             .with_node_features(arr2(&[[i as f32], [1.0]]))
//!     })
//!     .collect::<Result<_>>()?;
//!
//! let config = Config { batch_size: 2, ..Config::default() };
//! let loader = Dataloader::new(&graphs, config)?;
//! assert_eq!(loader.len(), 3);
//!
//! for batch in loader {
//!     let batch = batch?;
//!     let x = batch.node_features().unwrap();
//!     let pooled = pool_batch(x, &batch, Pooling::Mean)?;
//!     assert_eq!(pooled.shape()[0], batch.num_graphs());
//! }
//! # Ok::<(), segraph::Error>(())
//! ```

pub use segraph_core;
pub use segraph_nn;

pub use segraph_core::{
    batch, collate, config, error, loader, scatter, scatter_add, scatter_max, scatter_softmax,
    Aggregation, BatchedGraphData, Config, Dataloader, Dataset, Error, GraphData,
    InMemoryDataset, Result,
};
pub use segraph_nn::{init, message, pool};

/// Everything needed to batch graphs and run a message-passing step.
pub mod prelude {
    pub use segraph_core::{
        collate, scatter, scatter_add, scatter_max, scatter_softmax, Aggregation,
        BatchedGraphData, Config, Dataloader, Dataset, Error, GraphData, InMemoryDataset, Result,
    };
    pub use segraph_nn::{
        degree, edge_softmax, gather, glorot_init, glorot_init_seeded, propagate, pool_batch,
        Pooling,
    };
}
