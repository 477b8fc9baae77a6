//! Segment reductions ("scatter") over ragged groups of rows.
//!
//! Every function takes a value tensor of shape `[N, *F]` and a group index of
//! length `N`, and reduces rows that share an index entry:
//!
//! ```text
//! values = [a, b, c, d]        index = [0, 0, 1, 2]
//!
//!   add  -> [a + b, c, d]
//!   max  -> [max(a, b), c, d]
//!   softmax -> [e^a / (e^a + e^b), e^b / (e^a + e^b), 1, 1]
//! ```
//!
//! `add` and `max` produce one row per group (`[num_groups, *F]`); `softmax`
//! produces one weight per input row (`[N, *F]`), normalized within the row's
//! group and independently for every feature column.
//!
//! The group count is either given explicitly or inferred as `max(index) + 1`.
//!
//! # Empty groups
//!
//! Groups that receive no rows are zero for both `add` and `max`. Non-empty
//! `max` groups are reduced from `-inf`, so all-negative groups keep their true
//! maximum.

use crate::{Error, Result};
use ndarray::{Array, ArrayBase, Axis, Data, Dimension, Ix1, RemoveAxis, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reduction applied within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Sum of member rows.
    Add,
    /// Elementwise maximum of member rows.
    Max,
    /// Per-row softmax weight, normalized within the group.
    Softmax,
}

impl Aggregation {
    /// All aggregations, in declaration order.
    pub const ALL: [Aggregation; 3] = [Aggregation::Add, Aggregation::Max, Aggregation::Softmax];

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Add => "add",
            Aggregation::Max => "max",
            Aggregation::Softmax => "softmax",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(Aggregation::Add),
            "max" => Ok(Aggregation::Max),
            "softmax" => Ok(Aggregation::Softmax),
            other => Err(Error::InvalidAggregation(format!(
                "{other:?} (expected add, max or softmax)"
            ))),
        }
    }
}

/// Reduce `values` by group with the given aggregation.
///
/// # Arguments
/// - `values`: `[N, *F]` tensor
/// - `index`: group of every row, length `N`
/// - `num_groups`: group count; inferred as `max(index) + 1` when `None`
/// - `aggregation`: reduction to apply
///
/// # Returns
/// - `[num_groups, *F]` for [`Aggregation::Add`] and [`Aggregation::Max`]
/// - `[N, *F]` for [`Aggregation::Softmax`]
///
/// # Errors
/// - [`Error::ShapeMismatch`] if `values` is 0-dimensional or `index.len() != N`
/// - [`Error::EmptyInput`] if `N == 0` and `num_groups` is `None`
/// - [`Error::IndexOutOfBounds`] if an index entry is `>= num_groups`
pub fn scatter<S, I, D>(
    values: &ArrayBase<S, D>,
    index: &ArrayBase<I, Ix1>,
    num_groups: Option<usize>,
    aggregation: Aggregation,
) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    I: Data<Elem = usize>,
    D: Dimension + RemoveAxis,
{
    match aggregation {
        Aggregation::Add => scatter_add(values, index, num_groups),
        Aggregation::Max => scatter_max(values, index, num_groups),
        Aggregation::Softmax => scatter_softmax(values, index, num_groups),
    }
}

/// Per-group sum. Empty groups are zero.
pub fn scatter_add<S, I, D>(
    values: &ArrayBase<S, D>,
    index: &ArrayBase<I, Ix1>,
    num_groups: Option<usize>,
) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    I: Data<Elem = usize>,
    D: Dimension + RemoveAxis,
{
    let groups = resolve_groups(values, index, num_groups)?;
    log::trace!(
        "scatter add: {} rows into {groups} groups",
        values.len_of(Axis(0))
    );
    Ok(accumulate(values, index, groups, 0.0, |acc, v| *acc += v))
}

/// Per-group elementwise maximum. Empty groups are zero.
pub fn scatter_max<S, I, D>(
    values: &ArrayBase<S, D>,
    index: &ArrayBase<I, Ix1>,
    num_groups: Option<usize>,
) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    I: Data<Elem = usize>,
    D: Dimension + RemoveAxis,
{
    let groups = resolve_groups(values, index, num_groups)?;
    log::trace!(
        "scatter max: {} rows into {groups} groups",
        values.len_of(Axis(0))
    );

    let mut out = accumulate(values, index, groups, f32::NEG_INFINITY, max_in_place);

    let mut populated = vec![false; groups];
    for &g in index {
        populated[g] = true;
    }
    for (mut row, _) in out
        .axis_iter_mut(Axis(0))
        .zip(populated)
        .filter(|(_, populated)| !populated)
    {
        row.fill(0.0);
    }
    Ok(out)
}

/// Softmax of every row within its group, per feature column.
///
/// Subtracts the group maximum before exponentiating, so large inputs do not
/// overflow. A group with a single member yields exactly `1.0`.
pub fn scatter_softmax<S, I, D>(
    values: &ArrayBase<S, D>,
    index: &ArrayBase<I, Ix1>,
    num_groups: Option<usize>,
) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    I: Data<Elem = usize>,
    D: Dimension + RemoveAxis,
{
    let groups = resolve_groups(values, index, num_groups)?;
    log::trace!(
        "scatter softmax: {} rows over {groups} groups",
        values.len_of(Axis(0))
    );

    let maxes = accumulate(values, index, groups, f32::NEG_INFINITY, max_in_place);

    let mut out = values.to_owned();
    for (mut row, &g) in out.axis_iter_mut(Axis(0)).zip(index) {
        Zip::from(&mut row)
            .and(&maxes.index_axis(Axis(0), g))
            .for_each(|v, &m| *v = (*v - m).exp());
    }

    let sums = accumulate(&out, index, groups, 0.0, |acc, v| *acc += v);
    for (mut row, &g) in out.axis_iter_mut(Axis(0)).zip(index) {
        Zip::from(&mut row)
            .and(&sums.index_axis(Axis(0), g))
            .for_each(|v, &s| *v /= s);
    }
    Ok(out)
}

fn max_in_place(acc: &mut f32, v: f32) {
    if v > *acc {
        *acc = v;
    }
}

/// Validate shapes and work out the group count.
fn resolve_groups<S, I, D>(
    values: &ArrayBase<S, D>,
    index: &ArrayBase<I, Ix1>,
    num_groups: Option<usize>,
) -> Result<usize>
where
    S: Data<Elem = f32>,
    I: Data<Elem = usize>,
    D: Dimension,
{
    if values.ndim() == 0 {
        return Err(Error::ShapeMismatch {
            context: "scatter values rank",
            expected: 1,
            got: 0,
        });
    }
    let rows = values.len_of(Axis(0));
    if index.len() != rows {
        return Err(Error::ShapeMismatch {
            context: "scatter index length",
            expected: rows,
            got: index.len(),
        });
    }

    let groups = match num_groups {
        Some(n) => n,
        None => index
            .iter()
            .max()
            .map(|&m| m + 1)
            .ok_or(Error::EmptyInput(
                "cannot infer the number of groups from zero rows",
            ))?,
    };

    if let Some(&bad) = index.iter().find(|&&g| g >= groups) {
        return Err(Error::IndexOutOfBounds {
            context: "scatter index",
            index: bad,
            bound: groups,
        });
    }
    Ok(groups)
}

/// One pass over the rows, folding each into its group's accumulator row.
fn accumulate<S, I, D, F>(
    values: &ArrayBase<S, D>,
    index: &ArrayBase<I, Ix1>,
    groups: usize,
    identity: f32,
    combine: F,
) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    I: Data<Elem = usize>,
    D: Dimension + RemoveAxis,
    F: Fn(&mut f32, f32),
{
    let mut shape = values.raw_dim();
    shape[0] = groups;
    let mut out = Array::from_elem(shape, identity);
    for (row, &g) in values.axis_iter(Axis(0)).zip(index) {
        Zip::from(out.index_axis_mut(Axis(0), g))
            .and(&row)
            .for_each(|acc, &v| combine(acc, v));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array1, Array2, Array3};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_scatter_1d() {
        let values = arr1(&[1.0f32, 1.0, 1.0, 1.0]);
        let index = arr1(&[0usize, 0, 1, 2]);

        let softmax = scatter(&values, &index, None, Aggregation::Softmax).unwrap();
        let add = scatter(&values, &index, Some(3), Aggregation::Add).unwrap();
        let max = scatter(&values, &index, Some(3), Aggregation::Max).unwrap();

        assert_eq!(softmax, arr1(&[0.5, 0.5, 1.0, 1.0]));
        assert_eq!(add, arr1(&[2.0, 1.0, 1.0]));
        assert_eq!(max, arr1(&[1.0, 1.0, 1.0]));
    }

    #[test]
    fn test_scatter_2d() {
        let values = arr2(&[[1.0f32, 2.0], [1.0, 3.0], [1.0, 4.0], [1.0, 5.0]]);
        let index = arr1(&[0usize, 0, 1, 2]);

        let softmax = scatter(&values, &index, None, Aggregation::Softmax).unwrap();
        let add = scatter(&values, &index, Some(3), Aggregation::Add).unwrap();
        let max = scatter(&values, &index, Some(3), Aggregation::Max).unwrap();

        let expected = arr2(&[[0.5f32, 0.269], [0.5, 0.731], [1.0, 1.0], [1.0, 1.0]]);
        assert_eq!(softmax.dim(), (4, 2));
        for (got, want) in softmax.iter().zip(expected.iter()) {
            assert!(close(*got, *want), "{got} vs {want}");
        }
        assert_eq!(add, arr2(&[[2.0, 5.0], [1.0, 4.0], [1.0, 5.0]]));
        assert_eq!(max, arr2(&[[1.0, 3.0], [1.0, 4.0], [1.0, 5.0]]));
    }

    #[test]
    fn test_unsorted_index() {
        let values = arr1(&[1.0f32, 2.0, 3.0, 4.0]);
        let index = arr1(&[2usize, 0, 2, 0]);
        let add = scatter_add(&values, &index, None).unwrap();
        assert_eq!(add, arr1(&[6.0, 0.0, 4.0]));
    }

    #[test]
    fn test_trailing_feature_shape_preserved() {
        let values = Array3::<f32>::ones((5, 2, 3));
        let index = arr1(&[0usize, 1, 1, 3, 3]);
        let add = scatter_add(&values, &index, None).unwrap();
        assert_eq!(add.dim(), (4, 2, 3));
        assert_eq!(add[[1, 1, 2]], 2.0);
        assert_eq!(add[[2, 0, 0]], 0.0);
    }

    #[test]
    fn test_max_of_negative_group() {
        let values = arr1(&[-3.0f32, -1.0, -2.0]);
        let index = arr1(&[0usize, 0, 0]);
        let max = scatter_max(&values, &index, None).unwrap();
        assert_eq!(max, arr1(&[-1.0]));
    }

    #[test]
    fn test_max_empty_group_is_zero() {
        let values = arr1(&[-3.0f32, 5.0]);
        let index = arr1(&[0usize, 2]);
        let max = scatter_max(&values, &index, Some(4)).unwrap();
        assert_eq!(max, arr1(&[-3.0, 0.0, 5.0, 0.0]));
    }

    #[test]
    fn test_softmax_large_magnitudes_stable() {
        let values = arr1(&[1000.0f32, 1000.0, -1000.0]);
        let index = arr1(&[0usize, 0, 1]);
        let softmax = scatter_softmax(&values, &index, None).unwrap();
        assert_eq!(softmax, arr1(&[0.5, 0.5, 1.0]));
    }

    #[test]
    fn test_softmax_columns_sum_to_one() {
        let values = arr2(&[[0.1f32, -4.0], [2.0, 7.5], [3.3, 0.0], [-1.0, 1.0]]);
        let index = arr1(&[1usize, 0, 1, 1]);
        let softmax = scatter_softmax(&values, &index, None).unwrap();
        let sums = scatter_add(&softmax, &index, None).unwrap();
        for s in sums.iter() {
            assert!(close(*s, 1.0));
        }
    }

    #[test]
    fn test_empty_rows_without_count() {
        let values = Array1::<f32>::zeros(0);
        let index = Array1::<usize>::zeros(0);
        for aggregation in Aggregation::ALL {
            let err = scatter(&values, &index, None, aggregation).unwrap_err();
            assert!(matches!(err, Error::EmptyInput(_)), "{aggregation}");
        }
    }

    #[test]
    fn test_empty_rows_with_count() {
        let values = Array2::<f32>::zeros((0, 3));
        let index = Array1::<usize>::zeros(0);
        let add = scatter_add(&values, &index, Some(2)).unwrap();
        assert_eq!(add, Array2::<f32>::zeros((2, 3)));
        let max = scatter_max(&values, &index, Some(2)).unwrap();
        assert_eq!(max, Array2::<f32>::zeros((2, 3)));
        let softmax = scatter_softmax(&values, &index, Some(2)).unwrap();
        assert_eq!(softmax.dim(), (0, 3));
    }

    #[test]
    fn test_index_length_mismatch() {
        let values = arr1(&[1.0f32, 2.0]);
        let index = arr1(&[0usize]);
        let err = scatter(&values, &index, None, Aggregation::Add).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_index_out_of_bounds() {
        let values = arr1(&[1.0f32, 2.0]);
        let index = arr1(&[0usize, 5]);
        let err = scatter(&values, &index, Some(3), Aggregation::Max).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexOutOfBounds {
                index: 5,
                bound: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_scalar_values_rejected() {
        let values = ndarray::ArrayD::<f32>::zeros(ndarray::IxDyn(&[]));
        let index = Array1::<usize>::zeros(0);
        assert!(matches!(
            scatter_add(&values, &index, Some(1)),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_aggregation_parsing() {
        for aggregation in Aggregation::ALL {
            assert_eq!(aggregation.to_string().parse::<Aggregation>().unwrap(), aggregation);
        }
        let err = "bogus".parse::<Aggregation>().unwrap_err();
        assert!(matches!(err, Error::InvalidAggregation(ref msg) if msg.contains("bogus")));
    }

    #[test]
    fn test_aggregation_serde_names() {
        let json = serde_json::to_string(&Aggregation::Softmax).unwrap();
        assert_eq!(json, "\"softmax\"");
        let parsed: Aggregation = serde_json::from_str("\"max\"").unwrap();
        assert_eq!(parsed, Aggregation::Max);
    }
}
