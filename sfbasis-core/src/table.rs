//! Date-indexed table of optional `f64` columns.
//!
//! Every tabular stage of the pipeline (raw pulls, merged rates, basis output,
//! pivoted long data) is a `DateTable`. The date axis is always strictly
//! ascending: construction sorts rows by date and keeps the first row of any
//! duplicated date. Cells are `Option<f64>`; NaN is stored as `None`.

use crate::data::DataError;
use chrono::NaiveDate;
use std::collections::HashSet;

/// A named column of optional values.
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of non-missing cells.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DateTable {
    dates: Vec<NaiveDate>,
    columns: Vec<TableColumn>,
}

impl DateTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from a raw date axis and columns.
    ///
    /// Rows are sorted by date (stable) and duplicate dates keep their first row.
    /// Fails if a column's length differs from the date axis or a name repeats.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<TableColumn>,
    ) -> Result<Self, DataError> {
        {
            let mut seen = HashSet::new();
            for column in &columns {
                if column.values.len() != dates.len() {
                    return Err(DataError::Validation(format!(
                        "column '{}' has {} values for {} dates",
                        column.name,
                        column.values.len(),
                        dates.len()
                    )));
                }
                if !seen.insert(column.name.as_str()) {
                    return Err(DataError::Validation(format!(
                        "duplicate column '{}'",
                        column.name
                    )));
                }
            }
        }

        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);
        order.dedup_by_key(|i| dates[*i]);

        let sorted_dates = order.iter().map(|&i| dates[i]).collect();
        let sorted_columns = columns
            .into_iter()
            .map(|c| TableColumn {
                values: order.iter().map(|&i| c.values[i].filter(|v| !v.is_nan())).collect(),
                name: c.name,
            })
            .collect();

        Ok(Self {
            dates: sorted_dates,
            columns: sorted_columns,
        })
    }

    /// A table with a date axis and no columns.
    pub fn with_dates(dates: Vec<NaiveDate>) -> Self {
        let mut dates = dates;
        dates.sort();
        dates.dedup();
        Self {
            dates,
            columns: Vec::new(),
        }
    }

    /// Add a column, replacing any existing column with the same name.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), DataError> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(DataError::Validation(format!(
                "column '{name}' has {} values for {} dates",
                values.len(),
                self.dates.len()
            )));
        }
        let values = values.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(TableColumn { name, values }),
        }
        Ok(())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows (dates).
    pub fn height(&self) -> usize {
        self.dates.len()
    }

    /// Number of value columns (the date axis is not counted).
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Rename columns through `rename`; columns it maps to `None` are dropped.
    /// When two columns map to the same new name the first one wins.
    pub fn rename_columns<F>(self, mut rename: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut columns: Vec<TableColumn> = Vec::with_capacity(self.columns.len());
        for column in self.columns {
            let Some(new_name) = rename(&column.name) else {
                continue;
            };
            if columns.iter().any(|c| c.name == new_name) {
                continue;
            }
            columns.push(TableColumn {
                name: new_name,
                values: column.values,
            });
        }
        Self {
            dates: self.dates,
            columns,
        }
    }

    /// Strict inner join on date. Left columns come first, then right columns.
    pub fn inner_join(&self, other: &DateTable) -> Result<DateTable, DataError> {
        for column in &other.columns {
            if self.has_column(&column.name) {
                return Err(DataError::Validation(format!(
                    "column '{}' present on both sides of join",
                    column.name
                )));
            }
        }

        // Both axes are strictly ascending, so a merge walk finds the intersection.
        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.dates.len() && j < other.dates.len() {
            match self.dates[i].cmp(&other.dates[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    left_rows.push(i);
                    right_rows.push(j);
                    i += 1;
                    j += 1;
                }
            }
        }

        let dates = left_rows.iter().map(|&i| self.dates[i]).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| take_rows(c, &left_rows))
            .chain(other.columns.iter().map(|c| take_rows(c, &right_rows)))
            .collect();

        Ok(DateTable { dates, columns })
    }

    /// Keep rows dated on or before `end`.
    pub fn truncate_after(self, end: NaiveDate) -> Self {
        let keep = self.dates.partition_point(|d| *d <= end);
        self.slice_rows(0, keep)
    }

    /// Keep rows inside the inclusive window `[start, end]`; `None` leaves that side open.
    pub fn restrict(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let from = start.map_or(0, |s| self.dates.partition_point(|d| *d < s));
        let to = end.map_or(self.dates.len(), |e| self.dates.partition_point(|d| *d <= e));
        self.clone().slice_rows(from, to.max(from))
    }

    /// Columns named in `names`, in that order. Names not present are skipped.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let columns = names
            .iter()
            .filter_map(|n| self.columns.iter().find(|c| c.name == n.as_ref()))
            .cloned()
            .collect();
        Self {
            dates: self.dates.clone(),
            columns,
        }
    }

    /// Carry the last observed value forward over missing cells, without bound.
    /// Cells before a column's first observation stay missing.
    pub fn forward_fill(mut self) -> Self {
        for column in &mut self.columns {
            let mut last = None;
            for cell in column.values.iter_mut() {
                match cell {
                    Some(v) => last = Some(*v),
                    None => *cell = last,
                }
            }
        }
        self
    }

    /// Value of `column` at row `row`.
    pub fn value(&self, column: &str, row: usize) -> Option<f64> {
        self.column(column).and_then(|v| v.get(row).copied().flatten())
    }

    fn slice_rows(self, from: usize, to: usize) -> Self {
        Self {
            dates: self.dates[from..to].to_vec(),
            columns: self
                .columns
                .into_iter()
                .map(|c| TableColumn {
                    values: c.values[from..to].to_vec(),
                    name: c.name,
                })
                .collect(),
        }
    }
}

fn take_rows(column: &TableColumn, rows: &[usize]) -> TableColumn {
    TableColumn {
        name: column.name.clone(),
        values: rows.iter().map(|&r| column.values[r]).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn table(dates: &[&str], cols: &[(&str, Vec<Option<f64>>)]) -> DateTable {
        DateTable::from_columns(
            dates.iter().map(|s| d(s)).collect(),
            cols.iter()
                .map(|(n, v)| TableColumn::new(*n, v.clone()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn construction_sorts_and_keeps_first_duplicate() {
        let t = table(
            &["2024-01-03", "2024-01-02", "2024-01-03"],
            &[("a", vec![Some(3.0), Some(2.0), Some(99.0)])],
        );
        assert_eq!(t.dates(), &[d("2024-01-02"), d("2024-01-03")]);
        assert_eq!(t.column("a").unwrap(), &[Some(2.0), Some(3.0)]);
    }

    #[test]
    fn construction_turns_nan_into_missing() {
        let t = table(&["2024-01-02"], &[("a", vec![Some(f64::NAN)])]);
        assert_eq!(t.value("a", 0), None);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = DateTable::from_columns(
            vec![d("2024-01-02")],
            vec![TableColumn::new("a", vec![Some(1.0), Some(2.0)])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("column 'a'"));
    }

    #[test]
    fn duplicate_column_names_are_rejected() {
        let result = DateTable::from_columns(
            vec![d("2024-01-02")],
            vec![
                TableColumn::new("a", vec![Some(1.0)]),
                TableColumn::new("a", vec![Some(2.0)]),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn inner_join_keeps_only_shared_dates() {
        let left = table(
            &["2024-01-02", "2024-01-03", "2024-01-04"],
            &[("l", vec![Some(1.0), Some(2.0), Some(3.0)])],
        );
        let right = table(
            &["2024-01-03", "2024-01-04", "2024-01-05"],
            &[("r", vec![Some(20.0), None, Some(50.0)])],
        );

        let joined = left.inner_join(&right).unwrap();
        assert_eq!(joined.dates(), &[d("2024-01-03"), d("2024-01-04")]);
        assert_eq!(joined.column_names(), vec!["l", "r"]);
        assert_eq!(joined.column("l").unwrap(), &[Some(2.0), Some(3.0)]);
        assert_eq!(joined.column("r").unwrap(), &[Some(20.0), None]);
    }

    #[test]
    fn inner_join_of_disjoint_dates_is_empty() {
        let left = table(&["2024-01-02"], &[("l", vec![Some(1.0)])]);
        let right = table(&["2024-01-03"], &[("r", vec![Some(2.0)])]);
        let joined = left.inner_join(&right).unwrap();
        assert!(joined.is_empty());
        assert_eq!(joined.width(), 2);
    }

    #[test]
    fn inner_join_rejects_column_collision() {
        let left = table(&["2024-01-02"], &[("x", vec![Some(1.0)])]);
        let right = table(&["2024-01-02"], &[("x", vec![Some(2.0)])]);
        assert!(left.inner_join(&right).is_err());
    }

    #[test]
    fn rename_drops_unmapped_and_keeps_first_duplicate() {
        let t = table(
            &["2024-01-02"],
            &[
                ("a", vec![Some(1.0)]),
                ("b", vec![Some(2.0)]),
                ("c", vec![Some(3.0)]),
            ],
        );
        let renamed = t.rename_columns(|n| match n {
            "a" | "c" => Some("x".to_string()),
            _ => None,
        });
        assert_eq!(renamed.column_names(), vec!["x"]);
        assert_eq!(renamed.value("x", 0), Some(1.0));
    }

    #[test]
    fn truncate_after_is_inclusive() {
        let t = table(
            &["2024-01-02", "2024-01-03", "2024-01-04"],
            &[("a", vec![Some(1.0), Some(2.0), Some(3.0)])],
        );
        let cut = t.truncate_after(d("2024-01-03"));
        assert_eq!(cut.height(), 2);
        assert_eq!(cut.last_date(), Some(d("2024-01-03")));
    }

    #[test]
    fn restrict_window_is_inclusive_on_both_ends() {
        let t = table(
            &["2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"],
            &[("a", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)])],
        );
        let w = t.restrict(Some(d("2024-01-03")), Some(d("2024-01-04")));
        assert_eq!(w.dates(), &[d("2024-01-03"), d("2024-01-04")]);

        let open_end = t.restrict(Some(d("2024-01-04")), None);
        assert_eq!(open_end.height(), 2);

        let inverted = t.restrict(Some(d("2024-01-05")), Some(d("2024-01-02")));
        assert!(inverted.is_empty());
    }

    #[test]
    fn select_follows_requested_order_and_skips_missing() {
        let t = table(
            &["2024-01-02"],
            &[("a", vec![Some(1.0)]), ("b", vec![Some(2.0)])],
        );
        let s = t.select(&["b", "zzz", "a"]);
        assert_eq!(s.column_names(), vec!["b", "a"]);
    }

    #[test]
    fn forward_fill_never_fills_backward() {
        let t = table(
            &["2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"],
            &[("a", vec![None, Some(1.5), None, None])],
        );
        let filled = t.forward_fill();
        assert_eq!(
            filled.column("a").unwrap(),
            &[None, Some(1.5), Some(1.5), Some(1.5)]
        );
    }

    #[test]
    fn push_column_replaces_existing() {
        let mut t = DateTable::with_dates(vec![d("2024-01-02")]);
        t.push_column("a", vec![Some(1.0)]).unwrap();
        t.push_column("a", vec![Some(2.0)]).unwrap();
        assert_eq!(t.width(), 1);
        assert_eq!(t.value("a", 0), Some(2.0));
        assert!(t.push_column("b", vec![]).is_err());
    }
}
