//! Grouped summaries and derived ratios over a [`Dataset`].
//!
//! Every function here is pure. Ratios check their denominator and report a
//! gap (`None` for a single value, [`DataGap`] for a whole result) instead
//! of dividing by zero.
use crate::error::DataGap;
use crate::types::{Dataset, Dimension, GroupKey, Measure};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

fn group_values(
    dataset: &Dataset,
    dims: &[Dimension],
    measure: Measure,
) -> BTreeMap<GroupKey, Vec<Option<f64>>> {
    let mut map: BTreeMap<GroupKey, Vec<Option<f64>>> = BTreeMap::new();
    for r in dataset.records() {
        let key: GroupKey = dims.iter().map(|d| d.key_of(r)).collect();
        map.entry(key).or_default().push(measure.value_of(r));
    }
    map
}

/// Sum of `measure` per group. Undefined values (zero-area yields) are
/// skipped.
pub fn sum_by(dataset: &Dataset, dims: &[Dimension], measure: Measure) -> BTreeMap<GroupKey, f64> {
    group_values(dataset, dims, measure)
        .into_iter()
        .map(|(k, vals)| (k, vals.into_iter().flatten().sum::<f64>()))
        .collect()
}

/// Mean of the defined values of `measure` per group; `None` when a group
/// has no defined value.
pub fn mean_by(
    dataset: &Dataset,
    dims: &[Dimension],
    measure: Measure,
) -> BTreeMap<GroupKey, Option<f64>> {
    group_values(dataset, dims, measure)
        .into_iter()
        .map(|(k, vals)| {
            let defined: Vec<f64> = vals.into_iter().flatten().collect();
            (k, mean(&defined))
        })
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn count_distinct(dataset: &Dataset, dim: Dimension) -> usize {
    dataset
        .records()
        .iter()
        .map(|r| dim.key_of(r))
        .collect::<HashSet<_>>()
        .len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

/// The first `n` rows ranked by `metric`. The sort is stable, so ties keep
/// their input order; rows with an undefined metric rank last.
pub fn top_n<T, F>(mut rows: Vec<T>, n: usize, order: SortOrder, metric: F) -> Vec<T>
where
    F: Fn(&T) -> Option<f64>,
{
    rows.sort_by(|a, b| match (metric(a), metric(b)) {
        (Some(x), Some(y)) => match order {
            SortOrder::Descending => y.partial_cmp(&x),
            SortOrder::Ascending => x.partial_cmp(&y),
        }
        .unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    rows.truncate(n);
    rows
}

/// Period-over-period change in percent. The first element has no prior
/// value and is always `None`, as is any element whose predecessor is zero.
pub fn percent_change(series: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(series.len());
    for (i, v) in series.iter().enumerate() {
        let change = if i == 0 {
            None
        } else {
            let prev = series[i - 1];
            if prev == 0.0 || !prev.is_finite() || !v.is_finite() {
                None
            } else {
                Some((v - prev) / prev * 100.0)
            }
        };
        out.push(change);
    }
    out
}

/// Each group's share of the total, in percent, in input order.
pub fn share_of_total<K: Clone>(group_sums: &[(K, f64)]) -> Result<Vec<(K, f64)>, DataGap> {
    if group_sums.is_empty() {
        return Err(DataGap::EmptyResult);
    }
    let total: f64 = group_sums.iter().map(|(_, v)| v).sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(DataGap::UndefinedRatio);
    }
    Ok(group_sums
        .iter()
        .map(|(k, v)| (k.clone(), v / total * 100.0))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<&'static str>,
    /// Row-major; `None` where a column is constant or has too few values.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i)?.get(j).copied().flatten()
    }
}

/// Pearson correlation between every pair of `measures`, over the rows
/// where both values are defined.
pub fn correlation_matrix(dataset: &Dataset, measures: &[Measure]) -> Result<CorrelationMatrix, DataGap> {
    if dataset.is_empty() {
        return Err(DataGap::EmptyResult);
    }
    let columns: Vec<Vec<Option<f64>>> = measures
        .iter()
        .map(|m| dataset.records().iter().map(|r| m.value_of(r)).collect())
        .collect();

    let k = measures.len();
    let mut values = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = pearson(&columns[i], &columns[j]);
            let r = if i == j { r.map(|_| 1.0) } else { r };
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    Ok(CorrelationMatrix {
        columns: measures.iter().map(|m| m.header()).collect(),
        values,
    })
}

fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut vx, mut vy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mx, y - my);
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx <= 0.0 || vy <= 0.0 {
        return None;
    }
    let r = cov / (vx.sqrt() * vy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Area and production summed over one year, with the aggregate yield.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearTotals {
    pub year: i32,
    pub area: f64,
    pub production: f64,
    pub yield_value: Option<f64>,
}

/// Per-year totals in ascending year order.
pub fn yearly_totals(dataset: &Dataset) -> Vec<YearTotals> {
    let mut map: BTreeMap<i32, (f64, f64)> = BTreeMap::new();
    for r in dataset.records() {
        let e = map.entry(r.year).or_insert((0.0, 0.0));
        e.0 += r.area;
        e.1 += r.production;
    }
    map.into_iter()
        .map(|(year, (area, production))| YearTotals {
            year,
            area,
            production,
            yield_value: (area > 0.0).then(|| production / area),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallMetrics {
    pub total_production: f64,
    pub total_area: f64,
    /// Mean of the per-row yields.
    pub mean_yield: Option<f64>,
    pub crops: usize,
    pub states: usize,
    pub years: usize,
}

pub fn overall_metrics(dataset: &Dataset) -> Result<OverallMetrics, DataGap> {
    if dataset.is_empty() {
        return Err(DataGap::EmptyResult);
    }
    let yields: Vec<f64> = dataset.records().iter().filter_map(|r| r.yield_value()).collect();
    Ok(OverallMetrics {
        total_production: dataset.records().iter().map(|r| r.production).sum(),
        total_area: dataset.records().iter().map(|r| r.area).sum(),
        mean_yield: mean(&yields),
        crops: count_distinct(dataset, Dimension::Crop),
        states: count_distinct(dataset, Dimension::State),
        years: count_distinct(dataset, Dimension::Year),
    })
}
