use crate::{Error, Result};
use ndarray::{Array, Array2, ArrayD, Axis, Dimension};
use std::collections::HashSet;

/// One graph as a set of tensors.
///
/// Edges are stored in COO form: `edge_index` has shape `(2, E)` and column
/// `e` is the directed edge `(edge_index[[0, e]], edge_index[[1, e]])`.
/// Node-level tensors have one row per node and edge-level tensors one row
/// per edge.
///
/// All invariants are checked when a field is set, so a `GraphData` that
/// exists is always consistent:
///
/// - every edge endpoint is `< num_nodes`
/// - node-level tensors have `num_nodes` rows
/// - edge-level tensors have `num_edges` rows
///
/// # Example
///
/// ```rust
/// use segraph_core::GraphData;
/// use ndarray::arr2;
///
/// let graph = GraphData::from_edges(&[(0, 1), (1, 2)], 3)?
///     .with_node_features(arr2(&[[1.0f32, 0.0], [0.0, 1.0], [1.0, 1.0]]))?;
///
/// assert_eq!(graph.num_nodes(), 3);
/// assert_eq!(graph.num_edges(), 2);
/// assert_eq!(graph.num_node_features(), 2);
/// # Ok::<(), segraph_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GraphData {
    edge_index: Array2<usize>,
    num_nodes: usize,
    node_features: Option<ArrayD<f32>>,
    node_labels: Option<ArrayD<f32>>,
    edge_features: Option<ArrayD<f32>>,
    graph_label: Option<ArrayD<f32>>,
}

impl GraphData {
    /// Create a graph from a `(2, E)` edge index.
    pub fn new(edge_index: Array2<usize>, num_nodes: usize) -> Result<Self> {
        if edge_index.nrows() != 2 {
            return Err(Error::ShapeMismatch {
                context: "edge_index rows",
                expected: 2,
                got: edge_index.nrows(),
            });
        }
        if let Some(&bad) = edge_index.iter().find(|&&v| v >= num_nodes) {
            return Err(Error::IndexOutOfBounds {
                context: "edge_index",
                index: bad,
                bound: num_nodes,
            });
        }
        Ok(Self {
            edge_index,
            num_nodes,
            node_features: None,
            node_labels: None,
            edge_features: None,
            graph_label: None,
        })
    }

    /// Create a graph from `(src, dst)` pairs.
    pub fn from_edges(edges: &[(usize, usize)], num_nodes: usize) -> Result<Self> {
        let mut edge_index = Array2::zeros((2, edges.len()));
        for (e, &(src, dst)) in edges.iter().enumerate() {
            edge_index[[0, e]] = src;
            edge_index[[1, e]] = dst;
        }
        Self::new(edge_index, num_nodes)
    }

    /// A graph with nodes but no edges.
    pub fn empty(num_nodes: usize) -> Self {
        Self {
            edge_index: Array2::zeros((2, 0)),
            num_nodes,
            node_features: None,
            node_labels: None,
            edge_features: None,
            graph_label: None,
        }
    }

    /// Attach node features (`[num_nodes, *F]`).
    pub fn with_node_features<D: Dimension>(mut self, features: Array<f32, D>) -> Result<Self> {
        let features = features.into_dyn();
        check_rows(&features, self.num_nodes, "node_features rows")?;
        self.node_features = Some(features);
        Ok(self)
    }

    /// Attach node labels (`[num_nodes, *L]`).
    pub fn with_node_labels<D: Dimension>(mut self, labels: Array<f32, D>) -> Result<Self> {
        let labels = labels.into_dyn();
        check_rows(&labels, self.num_nodes, "node_labels rows")?;
        self.node_labels = Some(labels);
        Ok(self)
    }

    /// Attach edge features (`[num_edges, *F]`).
    pub fn with_edge_features<D: Dimension>(mut self, features: Array<f32, D>) -> Result<Self> {
        let features = features.into_dyn();
        check_rows(&features, self.num_edges(), "edge_features rows")?;
        self.edge_features = Some(features);
        Ok(self)
    }

    /// Attach a graph-level label of any shape (a 0-d scalar is fine).
    pub fn with_graph_label<D: Dimension>(mut self, label: Array<f32, D>) -> Self {
        self.graph_label = Some(label.into_dyn());
        self
    }

    /// Edge index, shape `(2, num_edges)`.
    pub fn edge_index(&self) -> &Array2<usize> {
        &self.edge_index
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.edge_index.ncols()
    }

    pub fn node_features(&self) -> Option<&ArrayD<f32>> {
        self.node_features.as_ref()
    }

    pub fn node_labels(&self) -> Option<&ArrayD<f32>> {
        self.node_labels.as_ref()
    }

    pub fn edge_features(&self) -> Option<&ArrayD<f32>> {
        self.edge_features.as_ref()
    }

    pub fn graph_label(&self) -> Option<&ArrayD<f32>> {
        self.graph_label.as_ref()
    }

    /// Trailing shape of the node features (empty for 1-d features).
    pub fn node_feature_shape(&self) -> Option<&[usize]> {
        self.node_features.as_ref().map(|x| &x.shape()[1..])
    }

    /// Number of scalar features per node; 0 without node features.
    pub fn num_node_features(&self) -> usize {
        self.node_feature_shape()
            .map_or(0, |shape| shape.iter().product())
    }

    /// True unless every edge `(u, v)` has a matching `(v, u)`.
    pub fn is_directed(&self) -> bool {
        let edges: HashSet<(usize, usize)> = self.edges().collect();
        edges.iter().any(|&(u, v)| !edges.contains(&(v, u)))
    }

    pub fn has_self_loops(&self) -> bool {
        self.edges().any(|(u, v)| u == v)
    }

    /// True if some node is neither source nor destination of any edge.
    pub fn has_isolated_nodes(&self) -> bool {
        let touched: HashSet<usize> = self.edge_index.iter().copied().collect();
        touched.len() < self.num_nodes
    }

    /// Iterate edges as `(src, dst)` pairs, in column order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edge_index
            .axis_iter(Axis(1))
            .map(|column| (column[0], column[1]))
    }

    /// Assemble from fields the caller has already validated.
    pub(crate) fn from_fields(fields: GraphFields) -> Self {
        Self {
            edge_index: fields.edge_index,
            num_nodes: fields.num_nodes,
            node_features: fields.node_features,
            node_labels: fields.node_labels,
            edge_features: fields.edge_features,
            graph_label: fields.graph_label,
        }
    }
}

/// Raw fields, used by the batcher to assemble graphs without revalidating.
pub(crate) struct GraphFields {
    pub edge_index: Array2<usize>,
    pub num_nodes: usize,
    pub node_features: Option<ArrayD<f32>>,
    pub node_labels: Option<ArrayD<f32>>,
    pub edge_features: Option<ArrayD<f32>>,
    pub graph_label: Option<ArrayD<f32>>,
}

fn check_rows(tensor: &ArrayD<f32>, rows: usize, context: &'static str) -> Result<()> {
    let got = if tensor.ndim() == 0 {
        0
    } else {
        tensor.len_of(Axis(0))
    };
    if tensor.ndim() == 0 || got != rows {
        return Err(Error::ShapeMismatch {
            context,
            expected: rows,
            got,
        });
    }
    Ok(())
}
