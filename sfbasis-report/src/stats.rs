//! Descriptive statistics over the wide basis table.
//!
//! Conventions follow pandas so figures agree with notebook output: sample
//! standard deviation (ddof = 1), bias-corrected skewness and excess kurtosis,
//! and Pearson correlation over pairwise-complete observations. Missing cells
//! are skipped. Undefined statistics are `None`.

use serde::Serialize;
use sfbasis_core::DateTable;

/// Relative magnitude below which a moment sum is treated as zero.
const FP_ZERO: f64 = 1e-14;

/// Summary of one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesStats {
    pub series: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

impl SeriesStats {
    pub fn from_values(series: impl Into<String>, values: &[Option<f64>]) -> Self {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        Self {
            series: series.into(),
            count: present.len(),
            mean: mean(&present),
            std: sample_std(&present),
            min: present.iter().copied().reduce(f64::min),
            max: present.iter().copied().reduce(f64::max),
            skewness: skewness(&present),
            kurtosis: kurtosis(&present),
        }
    }
}

/// Per-column statistics in column order.
pub fn describe(table: &DateTable) -> Vec<SeriesStats> {
    table
        .columns()
        .iter()
        .map(|c| SeriesStats::from_values(c.name.clone(), &c.values))
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; undefined below two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

/// Central moment sums `(m2, m3, m4)`, with floating-point noise flushed to zero.
fn moment_sums(values: &[f64]) -> Option<(f64, f64, f64)> {
    let m = mean(values)?;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    let flush = |x: f64| if x.abs() < FP_ZERO { 0.0 } else { x };
    Some((flush(m2), flush(m3), flush(m4)))
}

/// Adjusted Fisher-Pearson skewness. Needs three observations; zero variance gives 0.
pub fn skewness(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    let (m2, m3, _) = moment_sums(values)?;
    if m2 == 0.0 {
        return Some(0.0);
    }
    let n = values.len() as f64;
    Some(n * (n - 1.0).sqrt() / (n - 2.0) * (m3 / m2.powf(1.5)))
}

/// Bias-corrected excess kurtosis. Needs four observations; zero variance gives 0.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    if values.len() < 4 {
        return None;
    }
    let (m2, _, m4) = moment_sums(values)?;
    let n = values.len() as f64;
    let numerator = n * (n + 1.0) * (n - 1.0) * m4;
    let denominator = (n - 2.0) * (n - 3.0) * m2 * m2;
    if denominator == 0.0 {
        return Some(0.0);
    }
    let adj = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    Some(numerator / denominator - adj)
}

/// Pearson correlation over rows where both cells are present.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}

/// Square correlation matrix over a table's columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row)?.get(col).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub fn correlation_matrix(table: &DateTable) -> CorrelationMatrix {
    let columns = table.columns();
    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(&a.values, &b.values)).collect())
        .collect();
    CorrelationMatrix {
        labels: columns.iter().map(|c| c.name.clone()).collect(),
        values,
    }
}
