//! Observation data: per-node trace columns with content fingerprinting and
//! local quality scans.

use std::collections::HashMap;

/// Column-oriented observation data, one column of floats per graph node.
#[derive(Debug, Clone, Default)]
pub struct TraceData {
    columns: HashMap<String, Vec<f64>>,
}

impl TraceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: HashMap<String, Vec<f64>>) -> Self {
        Self { columns }
    }

    pub fn insert_column(&mut self, node: impl Into<String>, values: Vec<f64>) {
        self.columns.insert(node.into(), values);
    }

    pub fn columns(&self) -> &HashMap<String, Vec<f64>> {
        &self.columns
    }

    pub fn has_column(&self, node: &str) -> bool {
        self.columns.contains_key(node)
    }

    /// Usable row count: the shortest column. Zero when there are no columns.
    pub fn num_rows(&self) -> usize {
        self.columns.values().map(Vec::len).min().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// blake3 fingerprint over sorted column names and raw sample bits.
    /// Feeds the fitted-model cache key so new data invalidates old fits.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        let mut names: Vec<&String> = self.columns.keys().collect();
        names.sort();
        for name in names {
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
            for value in &self.columns[name] {
                hasher.update(&value.to_le_bytes());
            }
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Columns whose sample standard deviation falls below `epsilon`,
    /// sorted. Near-constant variables make mechanism fits meaningless and
    /// are surfaced as data-quality warnings.
    pub fn near_constant_columns(&self, epsilon: f64) -> Vec<String> {
        let mut flagged: Vec<String> = self
            .columns
            .iter()
            .filter(|(_, values)| values.len() > 1 && std_dev(values) < epsilon)
            .map(|(name, _)| name.clone())
            .collect();
        flagged.sort();
        flagged
    }
}

fn std_dev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_rows_is_shortest_column() {
        let mut traces = TraceData::new();
        traces.insert_column("x", vec![1.0, 2.0, 3.0]);
        traces.insert_column("y", vec![1.0, 2.0]);
        assert_eq!(traces.num_rows(), 2);
    }

    #[test]
    fn fingerprint_changes_with_data() {
        let mut a = TraceData::new();
        a.insert_column("x", vec![1.0, 2.0]);
        let mut b = TraceData::new();
        b.insert_column("x", vec![1.0, 3.0]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_ignores_insertion_order() {
        let mut a = TraceData::new();
        a.insert_column("x", vec![1.0]);
        a.insert_column("y", vec![2.0]);
        let mut b = TraceData::new();
        b.insert_column("y", vec![2.0]);
        b.insert_column("x", vec![1.0]);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn flags_near_constant_columns() {
        let mut traces = TraceData::new();
        traces.insert_column("flat", vec![5.0; 50]);
        traces.insert_column("varying", (0..50).map(f64::from).collect());
        assert_eq!(traces.near_constant_columns(1e-9), vec!["flat".to_string()]);
    }
}
