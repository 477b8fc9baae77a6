//! Graph-level readout.
//!
//! After [`collate`](segraph_core::collate), node rows of every graph are
//! tagged by the batch's graph indicator. Pooling reduces those rows into
//! one row per graph:
//!
//! ```text
//! x                 [N, *F]
//! graph_indicator   [N]        values in 0..num_graphs
//! pooled            [num_graphs, *F]
//! ```
//!
//! Graphs without nodes pool to a zero row.

use crate::message::degree;
use ndarray::{Array, ArrayBase, Axis, Data, Dimension, Ix1, RemoveAxis};
use segraph_core::{scatter_add, scatter_max, BatchedGraphData, Result};

/// Readout reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pooling {
    /// Sum of node rows.
    Add,
    /// Elementwise maximum of node rows.
    Max,
    /// Average of node rows.
    Mean,
}

/// Sum node rows per graph.
pub fn global_add_pool<S, I, D>(
    x: &ArrayBase<S, D>,
    graph_indicator: &ArrayBase<I, Ix1>,
    num_graphs: Option<usize>,
) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    I: Data<Elem = usize>,
    D: Dimension + RemoveAxis,
{
    scatter_add(x, graph_indicator, num_graphs)
}

/// Elementwise maximum of node rows per graph.
pub fn global_max_pool<S, I, D>(
    x: &ArrayBase<S, D>,
    graph_indicator: &ArrayBase<I, Ix1>,
    num_graphs: Option<usize>,
) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    I: Data<Elem = usize>,
    D: Dimension + RemoveAxis,
{
    scatter_max(x, graph_indicator, num_graphs)
}

/// Mean of node rows per graph.
pub fn global_mean_pool<S, I, D>(
    x: &ArrayBase<S, D>,
    graph_indicator: &ArrayBase<I, Ix1>,
    num_graphs: Option<usize>,
) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    I: Data<Elem = usize>,
    D: Dimension + RemoveAxis,
{
    let mut pooled = scatter_add(x, graph_indicator, num_graphs)?;
    let counts = degree(graph_indicator, Some(pooled.len_of(Axis(0))))?;
    for (mut row, &count) in pooled.axis_iter_mut(Axis(0)).zip(&counts) {
        if count > 0.0 {
            row.mapv_inplace(|v| v / count);
        }
    }
    Ok(pooled)
}

/// Pool `x` over the graphs of `batch`.
///
/// `x` must have one row per node of the batch. The result has exactly
/// `batch.num_graphs()` rows, including trailing graphs without nodes.
pub fn pool_batch<S, D>(
    x: &ArrayBase<S, D>,
    batch: &BatchedGraphData,
    pooling: Pooling,
) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    D: Dimension + RemoveAxis,
{
    let indicator = batch.graph_indicator();
    let num_graphs = Some(batch.num_graphs());
    match pooling {
        Pooling::Add => global_add_pool(x, indicator, num_graphs),
        Pooling::Max => global_max_pool(x, indicator, num_graphs),
        Pooling::Mean => global_mean_pool(x, indicator, num_graphs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};
    use segraph_core::{collate, Error, GraphData};

    fn batch() -> BatchedGraphData {
        let a = GraphData::empty(2)
            .with_node_features(arr2(&[[1.0f32, -2.0], [3.0, -4.0]]))
            .unwrap();
        let b = GraphData::empty(1)
            .with_node_features(arr2(&[[5.0f32, 6.0]]))
            .unwrap();
        let c = GraphData::empty(0)
            .with_node_features(ndarray::Array2::<f32>::zeros((0, 2)))
            .unwrap();
        collate(&[a, b, c]).unwrap()
    }

    #[test]
    fn test_pooling_modes() {
        let batch = batch();
        let x = batch.node_features().unwrap();

        let add = pool_batch(x, &batch, Pooling::Add).unwrap();
        assert_eq!(
            add,
            arr2(&[[4.0f32, -6.0], [5.0, 6.0], [0.0, 0.0]]).into_dyn()
        );

        let max = pool_batch(x, &batch, Pooling::Max).unwrap();
        assert_eq!(
            max,
            arr2(&[[3.0f32, -2.0], [5.0, 6.0], [0.0, 0.0]]).into_dyn()
        );

        let mean = pool_batch(x, &batch, Pooling::Mean).unwrap();
        assert_eq!(
            mean,
            arr2(&[[2.0f32, -3.0], [5.0, 6.0], [0.0, 0.0]]).into_dyn()
        );
    }

    #[test]
    fn test_inferred_graph_count() {
        let x = arr1(&[1.0f32, 2.0, 3.0]);
        let indicator = arr1(&[0usize, 0, 1]);
        assert_eq!(
            global_mean_pool(&x, &indicator, None).unwrap(),
            arr1(&[1.5, 3.0])
        );
    }

    #[test]
    fn test_row_count_must_match_batch() {
        let batch = batch();
        let x = arr2(&[[1.0f32, 1.0]]);
        assert!(matches!(
            pool_batch(&x, &batch, Pooling::Add),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
