//! Graph neural network building blocks on top of `segraph-core`.
//!
//! Layers themselves live in application code; this crate provides the
//! pieces they are assembled from:
//!
//! - [`message`]: gather/scatter message passing, edge softmax, degree
//! - [`pool`]: graph-level readout keyed on a batch's graph indicator
//! - [`init`]: Glorot initialisation
//!
//! # Example: one round of sum aggregation, then readout
//!
//! ```rust
//! use segraph_core::{collate, Aggregation, GraphData};
//! use segraph_nn::{pool_batch, propagate, Pooling};
//! use ndarray::arr2;
//!
//! let g = GraphData::from_edges(&[(0, 1), (1, 0)], 2)?
//!     .with_node_features(arr2(&[[1.0f32], [2.0]]))?;
//! let batch = collate(&[g.clone(), g])?;
//!
//! let x = batch.node_features().unwrap();
//! let h = propagate(x, batch.edge_index(), Aggregation::Add)?;
//! let readout = pool_batch(&h, &batch, Pooling::Add)?;
//!
//! assert_eq!(readout.shape(), &[2, 1]);
//! assert_eq!(readout[[0, 0]], 3.0);
//! # Ok::<(), segraph_core::Error>(())
//! ```

pub mod init;
pub mod message;
pub mod pool;

pub use init::{glorot_init, glorot_init_seeded};
pub use message::{degree, edge_softmax, gather, propagate};
pub use pool::{global_add_pool, global_max_pool, global_mean_pool, pool_batch, Pooling};
