use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Row-oriented table of named `f64` columns of equal length.
///
/// The accumulation target for streamed passes: one row per pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableData {
    columns: BTreeMap<String, Vec<f64>>,
    rows: usize,
}

impl TableData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|s| s.as_str())
    }

    /// Append one row. Columns are created on first use; a column missing
    /// from `values` is padded with NaN so lengths stay equal.
    pub fn push_row(&mut self, values: &[(&str, f64)]) {
        for (name, value) in values {
            self.columns
                .entry((*name).to_string())
                .or_insert_with(|| vec![f64::NAN; self.rows])
                .push(*value);
        }
        self.rows += 1;
        for column in self.columns.values_mut() {
            if column.len() < self.rows {
                column.resize(self.rows, f64::NAN);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_rows() {
        let mut t = TableData::new();
        t.push_row(&[("time", 0.0), ("mean", 1.5)]);
        t.push_row(&[("time", 0.5), ("mean", 2.5)]);

        assert_eq!(t.num_rows(), 2);
        assert_eq!(t.column("time"), Some(&[0.0, 0.5][..]));
        assert_eq!(t.column("mean"), Some(&[1.5, 2.5][..]));
    }

    #[test]
    fn test_late_column_is_padded() {
        let mut t = TableData::new();
        t.push_row(&[("a", 1.0)]);
        t.push_row(&[("a", 2.0), ("b", 3.0)]);

        let b = t.column("b").unwrap();
        assert!(b[0].is_nan());
        assert_eq!(b[1], 3.0);
    }
}
