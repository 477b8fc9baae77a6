//! Neighbourhood aggregation over an edge index.
//!
//! Message passing reads features at the source of every edge and reduces
//! them at the destination:
//!
//! ```text
//! h_i' = AGG({ x_j : (j, i) in E })
//! ```
//!
//! [`propagate`] does this with an `add` or `max` scatter keyed on the
//! destination row of `edge_index`. Attention-style layers instead need
//! per-edge weights normalized over each destination's incoming edges, which
//! is [`edge_softmax`].

use ndarray::{Array, Array1, Array2, ArrayBase, Axis, Data, Dimension, Ix1, RemoveAxis};
use segraph_core::{scatter, scatter_add, scatter_softmax, Aggregation, Error, Result};

/// Select rows of `x` by `index`: `out[k] = x[index[k]]`.
pub fn gather<S, I, D>(x: &ArrayBase<S, D>, index: &ArrayBase<I, Ix1>) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    I: Data<Elem = usize>,
    D: Dimension + RemoveAxis,
{
    if x.ndim() == 0 {
        return Err(Error::ShapeMismatch {
            context: "gather source rank",
            expected: 1,
            got: 0,
        });
    }
    let rows = x.len_of(Axis(0));
    if let Some(&bad) = index.iter().find(|&&i| i >= rows) {
        return Err(Error::IndexOutOfBounds {
            context: "gather index",
            index: bad,
            bound: rows,
        });
    }
    Ok(x.select(Axis(0), &index.to_vec()))
}

/// Aggregate source features at every destination node.
///
/// # Arguments
/// - `x`: node features `[num_nodes, *F]`
/// - `edge_index`: `(2, E)` source/destination pairs
/// - `aggregation`: [`Aggregation::Add`] or [`Aggregation::Max`]
///
/// # Returns
/// `[num_nodes, *F]`; nodes without incoming edges are zero.
///
/// # Errors
/// [`Error::InvalidAggregation`] for [`Aggregation::Softmax`], which weights
/// edges rather than reducing them (see [`edge_softmax`]).
pub fn propagate<S, D>(
    x: &ArrayBase<S, D>,
    edge_index: &Array2<usize>,
    aggregation: Aggregation,
) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    D: Dimension + RemoveAxis,
{
    if aggregation == Aggregation::Softmax {
        return Err(Error::InvalidAggregation(
            "softmax does not reduce a neighbourhood; use edge_softmax".into(),
        ));
    }
    check_edge_index(edge_index)?;
    log::trace!(
        "propagate {} edges with {aggregation}",
        edge_index.ncols()
    );
    let messages = gather(x, &edge_index.row(0))?;
    scatter(
        &messages,
        &edge_index.row(1),
        Some(x.len_of(Axis(0))),
        aggregation,
    )
}

/// Softmax of per-edge scores over each destination's incoming edges.
///
/// `scores` has one row per edge (`[E, *F]`); the result has the same shape
/// and, for every destination and feature column, its incoming weights sum
/// to 1.
pub fn edge_softmax<S, D>(
    scores: &ArrayBase<S, D>,
    edge_index: &Array2<usize>,
    num_nodes: usize,
) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    D: Dimension + RemoveAxis,
{
    check_edge_index(edge_index)?;
    scatter_softmax(scores, &edge_index.row(1), Some(num_nodes))
}

/// Number of occurrences of every node in `index`.
///
/// Pass the destination row of an edge index for in-degree, the source row
/// for out-degree, or a graph indicator for per-graph node counts.
pub fn degree<I>(index: &ArrayBase<I, Ix1>, num_nodes: Option<usize>) -> Result<Array1<f32>>
where
    I: Data<Elem = usize>,
{
    let ones = Array1::<f32>::ones(index.len());
    scatter_add(&ones, index, num_nodes)
}

fn check_edge_index(edge_index: &Array2<usize>) -> Result<()> {
    if edge_index.nrows() != 2 {
        return Err(Error::ShapeMismatch {
            context: "edge_index rows",
            expected: 2,
            got: edge_index.nrows(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};
    use segraph_core::GraphData;

    fn triangle_into_2() -> GraphData {
        // 0 -> 2, 1 -> 2, 2 -> 0
        GraphData::from_edges(&[(0, 2), (1, 2), (2, 0)], 3).unwrap()
    }

    #[test]
    fn test_gather() {
        let x = arr2(&[[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let out = gather(&x, &arr1(&[2usize, 0, 2])).unwrap();
        assert_eq!(out, arr2(&[[5.0, 6.0], [1.0, 2.0], [5.0, 6.0]]));

        assert!(matches!(
            gather(&x, &arr1(&[3usize])),
            Err(Error::IndexOutOfBounds { index: 3, bound: 3, .. })
        ));
    }

    #[test]
    fn test_propagate_add_and_max() {
        let graph = triangle_into_2();
        let x = arr2(&[[1.0f32, -1.0], [2.0, -5.0], [10.0, 0.0]]);

        let add = propagate(&x, graph.edge_index(), Aggregation::Add).unwrap();
        assert_eq!(add, arr2(&[[10.0, 0.0], [0.0, 0.0], [3.0, -6.0]]));

        let max = propagate(&x, graph.edge_index(), Aggregation::Max).unwrap();
        assert_eq!(max, arr2(&[[10.0, 0.0], [0.0, 0.0], [2.0, -1.0]]));
    }

    #[test]
    fn test_propagate_rejects_softmax() {
        let graph = triangle_into_2();
        let x = arr1(&[1.0f32, 2.0, 3.0]);
        assert!(matches!(
            propagate(&x, graph.edge_index(), Aggregation::Softmax),
            Err(Error::InvalidAggregation(_))
        ));
    }

    #[test]
    fn test_edge_softmax() {
        let graph = triangle_into_2();
        let scores = arr1(&[0.0f32, 0.0, 7.0]);
        let weights = edge_softmax(&scores, graph.edge_index(), graph.num_nodes()).unwrap();
        assert_eq!(weights, arr1(&[0.5, 0.5, 1.0]));
    }

    #[test]
    fn test_degree() {
        let graph = triangle_into_2();
        let in_degree = degree(&graph.edge_index().row(1), Some(3)).unwrap();
        assert_eq!(in_degree, arr1(&[1.0, 0.0, 2.0]));
        let out_degree = degree(&graph.edge_index().row(0), Some(3)).unwrap();
        assert_eq!(out_degree, arr1(&[1.0, 1.0, 1.0]));
    }
}
