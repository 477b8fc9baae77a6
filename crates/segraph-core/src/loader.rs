//! Datasets and mini-batch loading.
//!
//! A [`Dataset`] yields single graphs by position; a [`Dataloader`] groups
//! positions into batches (optionally shuffled) and runs [`collate`] on each.
//!
//! ```rust
//! use segraph_core::{Config, Dataloader, GraphData, InMemoryDataset};
//!
//! let dataset: InMemoryDataset = (1..=5).map(GraphData::empty).collect();
//! let config = Config { batch_size: 2, ..Default::default() };
//!
//! let sizes: Vec<usize> = Dataloader::new(&dataset, config)?
//!     .map(|batch| batch.map(|b| b.num_graphs()))
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(sizes, vec![2, 2, 1]);
//! # Ok::<(), segraph_core::Error>(())
//! ```

use crate::batch::{collate, BatchedGraphData};
use crate::config::Config;
use crate::graph::GraphData;
use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use rayon::prelude::*;

/// Random-access source of graphs.
pub trait Dataset {
    /// Number of graphs.
    fn len(&self) -> usize;

    /// Graph at `index`.
    fn get(&self, index: usize) -> Result<GraphData>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Dataset + ?Sized> Dataset for &T {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Result<GraphData> {
        (**self).get(index)
    }
}

/// Graphs held in a `Vec`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryDataset {
    graphs: Vec<GraphData>,
}

impl InMemoryDataset {
    pub fn new(graphs: Vec<GraphData>) -> Self {
        Self { graphs }
    }

    pub fn graphs(&self) -> &[GraphData] {
        &self.graphs
    }

    pub fn push(&mut self, graph: GraphData) {
        self.graphs.push(graph);
    }
}

impl FromIterator<GraphData> for InMemoryDataset {
    fn from_iter<I: IntoIterator<Item = GraphData>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.graphs.len()
    }

    fn get(&self, index: usize) -> Result<GraphData> {
        self.graphs
            .get(index)
            .cloned()
            .ok_or(Error::IndexOutOfBounds {
                context: "dataset",
                index,
                bound: self.graphs.len(),
            })
    }
}

/// Iterates a dataset in batches of collated graphs.
///
/// One pass over the dataset is an epoch. The iterator ends after the last
/// batch; [`reset`](Self::reset) starts the next epoch, reshuffling when
/// `config.shuffle` is set. Shuffling is seeded with `config.seed + epoch`,
/// so runs are reproducible.
#[derive(Debug, Clone)]
pub struct Dataloader<D> {
    dataset: D,
    config: Config,
    order: Vec<usize>,
    cursor: usize,
    epoch: u64,
}

impl<D: Dataset> Dataloader<D> {
    /// Create a loader positioned at the start of epoch 0.
    pub fn new(dataset: D, config: Config) -> Result<Self> {
        config.validate()?;
        let mut loader = Self {
            order: Vec::new(),
            dataset,
            config,
            cursor: 0,
            epoch: 0,
        };
        loader.arrange();
        Ok(loader)
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Batches per epoch.
    pub fn num_batches(&self) -> usize {
        let len = self.dataset.len();
        if self.config.drop_last {
            len / self.config.batch_size
        } else {
            len.div_ceil(self.config.batch_size)
        }
    }

    /// Start the next epoch.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.cursor = 0;
        self.arrange();
    }

    /// Collate every batch of the current epoch on the rayon thread pool.
    ///
    /// Does not advance the iterator.
    pub fn collate_all_parallel(&self) -> Result<Vec<BatchedGraphData>>
    where
        D: Sync,
    {
        let batches: Vec<&[usize]> = self
            .order
            .chunks(self.config.batch_size)
            .take(self.num_batches())
            .collect();
        batches
            .into_par_iter()
            .map(|indices| self.load(indices))
            .collect()
    }

    fn arrange(&mut self) {
        self.order = (0..self.dataset.len()).collect();
        if self.config.shuffle {
            let mut rng = XorShiftRng::seed_from_u64(self.config.seed.wrapping_add(self.epoch));
            self.order.shuffle(&mut rng);
        }
        log::debug!(
            "epoch {}: {} graphs in {} batches (shuffle = {})",
            self.epoch,
            self.order.len(),
            self.num_batches(),
            self.config.shuffle
        );
    }

    fn load(&self, indices: &[usize]) -> Result<BatchedGraphData> {
        let graphs = indices
            .iter()
            .map(|&i| self.dataset.get(i))
            .collect::<Result<Vec<_>>>()?;
        collate(&graphs)
    }
}

impl<D: Dataset> Iterator for Dataloader<D> {
    type Item = Result<BatchedGraphData>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.num_batches() {
            return None;
        }
        let start = self.cursor * self.config.batch_size;
        let end = (start + self.config.batch_size).min(self.order.len());
        self.cursor += 1;
        Some(self.load(&self.order[start..end]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.num_batches().saturating_sub(self.cursor);
        (remaining, Some(remaining))
    }
}

impl<D: Dataset> ExactSizeIterator for Dataloader<D> {}
