//! Disjoint-union batching of graphs.
//!
//! [`collate`] merges graphs `G_0 .. G_{B-1}` into one graph in which the
//! originals are disconnected components. Node `v` of graph `i` becomes node
//! `v + offset_i`, where `offset_i` is the number of nodes in `G_0 .. G_{i-1}`:
//!
//! ```text
//! G_0: 3 nodes, edges (0,1) (1,2)       G_1: 2 nodes, edge (1,0)
//!
//! batched edge_index   [[0, 1, 4],
//!                       [1, 2, 3]]
//! graph_indicator      [0, 0, 0, 1, 1]
//! ```
//!
//! The graph indicator is what graph-level pooling scatters on.

use crate::graph::{GraphData, GraphFields};
use crate::{Error, Result};
use ndarray::{concatenate, s, stack, Array1, Array2, ArrayD, ArrayView2, ArrayViewD, Axis, Slice};
use std::ops::{Deref, Range};

/// Several graphs merged into one disjoint-union graph.
///
/// Dereferences to the combined [`GraphData`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedGraphData {
    graph: GraphData,
    graph_indicator: Array1<usize>,
    /// `node_offsets[i]..node_offsets[i + 1]` are the nodes of graph `i`.
    node_offsets: Vec<usize>,
    /// Same for edge columns.
    edge_offsets: Vec<usize>,
}

/// Merge `graphs` into one batched graph.
///
/// Node- and edge-level tensors are concatenated row-wise in order, edge
/// indices are shifted by the node offset of their graph, and graph labels
/// are stacked into `[num_graphs, *L]`.
///
/// # Errors
/// - [`Error::EmptyBatch`] for an empty slice
/// - [`Error::FeatureShapeMismatch`] if a field is present on some graphs but
///   not others, or its trailing shape differs between graphs
pub fn collate(graphs: &[GraphData]) -> Result<BatchedGraphData> {
    if graphs.is_empty() {
        return Err(Error::EmptyBatch);
    }

    let node_offsets = prefix_sum(graphs.iter().map(GraphData::num_nodes));
    let edge_offsets = prefix_sum(graphs.iter().map(GraphData::num_edges));
    let total_nodes = node_offsets[graphs.len()];

    let shifted: Vec<Array2<usize>> = graphs
        .iter()
        .zip(&node_offsets)
        .map(|(graph, &offset)| graph.edge_index().mapv(|v| v + offset))
        .collect();
    let views: Vec<ArrayView2<'_, usize>> = shifted.iter().map(Array2::view).collect();
    let edge_index = concatenate(Axis(1), &views)?;

    let mut graph_indicator = Vec::with_capacity(total_nodes);
    for (i, graph) in graphs.iter().enumerate() {
        graph_indicator.extend(std::iter::repeat(i).take(graph.num_nodes()));
    }

    let node_features = concat_rows(graphs, "node_features", GraphData::node_features)?;
    let node_labels = concat_rows(graphs, "node_labels", GraphData::node_labels)?;
    let edge_features = concat_rows(graphs, "edge_features", GraphData::edge_features)?;
    let graph_label = stack_rows(graphs, "graph_label", GraphData::graph_label)?;

    log::debug!(
        "collated {} graphs: {} nodes, {} edges",
        graphs.len(),
        total_nodes,
        edge_index.ncols()
    );

    let graph = GraphData::from_fields(GraphFields {
        edge_index,
        num_nodes: total_nodes,
        node_features,
        node_labels,
        edge_features,
        graph_label,
    });

    Ok(BatchedGraphData {
        graph,
        graph_indicator: Array1::from(graph_indicator),
        node_offsets,
        edge_offsets,
    })
}

impl BatchedGraphData {
    /// The combined graph.
    pub fn graph(&self) -> &GraphData {
        &self.graph
    }

    /// Batch position of every node's source graph. Non-decreasing.
    pub fn graph_indicator(&self) -> &Array1<usize> {
        &self.graph_indicator
    }

    pub fn num_graphs(&self) -> usize {
        self.node_offsets.len() - 1
    }

    /// Cumulative node counts, `num_graphs + 1` entries starting at 0.
    pub fn node_offsets(&self) -> &[usize] {
        &self.node_offsets
    }

    /// Cumulative edge counts, `num_graphs + 1` entries starting at 0.
    pub fn edge_offsets(&self) -> &[usize] {
        &self.edge_offsets
    }

    /// Batched node ids belonging to graph `i`.
    ///
    /// # Panics
    /// If `i >= num_graphs()`.
    pub fn node_range(&self, i: usize) -> Range<usize> {
        self.node_offsets[i]..self.node_offsets[i + 1]
    }

    /// Batched edge columns belonging to graph `i`.
    ///
    /// # Panics
    /// If `i >= num_graphs()`.
    pub fn edge_range(&self, i: usize) -> Range<usize> {
        self.edge_offsets[i]..self.edge_offsets[i + 1]
    }

    /// Recover graph `i` with its original, local node numbering.
    pub fn get(&self, i: usize) -> Result<GraphData> {
        if i >= self.num_graphs() {
            return Err(Error::IndexOutOfBounds {
                context: "batched graph",
                index: i,
                bound: self.num_graphs(),
            });
        }
        let nodes = self.node_range(i);
        let edges = self.edge_range(i);
        let offset = nodes.start;

        let edge_index = self
            .graph
            .edge_index()
            .slice(s![.., edges.clone()])
            .mapv(|v| v - offset);

        Ok(GraphData::from_fields(GraphFields {
            edge_index,
            num_nodes: nodes.len(),
            node_features: self.graph.node_features().map(|t| rows(t, &nodes)),
            node_labels: self.graph.node_labels().map(|t| rows(t, &nodes)),
            edge_features: self.graph.edge_features().map(|t| rows(t, &edges)),
            graph_label: self
                .graph
                .graph_label()
                .map(|t| t.index_axis(Axis(0), i).to_owned()),
        }))
    }

    /// Split back into the graphs that were collated, in order.
    pub fn unbatch(&self) -> Result<Vec<GraphData>> {
        (0..self.num_graphs()).map(|i| self.get(i)).collect()
    }

    /// Take the combined graph and the graph indicator.
    pub fn into_parts(self) -> (GraphData, Array1<usize>) {
        (self.graph, self.graph_indicator)
    }
}

impl Deref for BatchedGraphData {
    type Target = GraphData;

    fn deref(&self) -> &GraphData {
        &self.graph
    }
}

fn prefix_sum(counts: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut offsets = vec![0];
    let mut total = 0;
    for count in counts {
        total += count;
        offsets.push(total);
    }
    offsets
}

fn rows(tensor: &ArrayD<f32>, range: &Range<usize>) -> ArrayD<f32> {
    tensor
        .slice_axis(Axis(0), Slice::from(range.clone()))
        .to_owned()
}

fn presence(present: bool) -> String {
    (if present { "present" } else { "absent" }).to_string()
}

/// The field's tensor from every graph, or `None` if no graph has it.
///
/// Presence must agree with the first graph.
fn uniform_field<'a>(
    graphs: &'a [GraphData],
    field: &'static str,
    get: impl Fn(&GraphData) -> Option<&ArrayD<f32>>,
) -> Result<Option<Vec<&'a ArrayD<f32>>>> {
    let expected = get(&graphs[0]).is_some();
    let mut tensors = Vec::with_capacity(graphs.len());
    for (i, graph) in graphs.iter().enumerate() {
        match get(graph) {
            Some(tensor) if expected => tensors.push(tensor),
            None if !expected => {}
            found => {
                return Err(Error::FeatureShapeMismatch {
                    graph: i,
                    field,
                    expected: presence(expected),
                    got: presence(found.is_some()),
                })
            }
        }
    }
    Ok(expected.then_some(tensors))
}

/// Concatenate a per-row field along axis 0. Trailing shapes must agree.
fn concat_rows(
    graphs: &[GraphData],
    field: &'static str,
    get: impl Fn(&GraphData) -> Option<&ArrayD<f32>>,
) -> Result<Option<ArrayD<f32>>> {
    let Some(tensors) = uniform_field(graphs, field, get)? else {
        return Ok(None);
    };
    let expected = &tensors[0].shape()[1..];
    for (i, tensor) in tensors.iter().enumerate() {
        let trailing = &tensor.shape()[1..];
        if trailing != expected {
            return Err(Error::FeatureShapeMismatch {
                graph: i,
                field,
                expected: format!("trailing shape {expected:?}"),
                got: format!("trailing shape {trailing:?}"),
            });
        }
    }
    let views: Vec<ArrayViewD<'_, f32>> = tensors.iter().map(|t| t.view()).collect();
    Ok(Some(concatenate(Axis(0), &views)?))
}

/// Stack a per-graph field into `[num_graphs, *shape]`. Shapes must agree.
fn stack_rows(
    graphs: &[GraphData],
    field: &'static str,
    get: impl Fn(&GraphData) -> Option<&ArrayD<f32>>,
) -> Result<Option<ArrayD<f32>>> {
    let Some(tensors) = uniform_field(graphs, field, get)? else {
        return Ok(None);
    };
    let expected = tensors[0].shape();
    for (i, tensor) in tensors.iter().enumerate() {
        if tensor.shape() != expected {
            return Err(Error::FeatureShapeMismatch {
                graph: i,
                field,
                expected: format!("shape {expected:?}"),
                got: format!("shape {:?}", tensor.shape()),
            });
        }
    }
    let views: Vec<ArrayViewD<'_, f32>> = tensors.iter().map(|t| t.view()).collect();
    Ok(Some(stack(Axis(0), &views)?))
}
