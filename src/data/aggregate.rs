use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::filter::DatasetView;
use super::model::Column;

// ---------------------------------------------------------------------------
// EmptyResult – the filter pipeline left nothing to aggregate
// ---------------------------------------------------------------------------

/// Returned by every aggregation entry point when the narrowed view holds no
/// rows. Callers must surface it to the user and skip the rest of the
/// pipeline instead of charting an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no rows match the current filter selection")]
pub struct EmptyResult;

// ---------------------------------------------------------------------------
// Group-sum by (year, institution)
// ---------------------------------------------------------------------------

/// Summed enrollment for one (year, institution) bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentSum {
    pub year: i32,
    pub institution: String,
    pub enrolled: u64,
}

/// Group the view by (year, institution) and sum the measure.
/// Rows come back sorted ascending by year, then institution.
pub fn enrollment_by_institution(view: &DatasetView<'_>) -> Result<Vec<EnrollmentSum>, EmptyResult> {
    if view.is_empty() {
        return Err(EmptyResult);
    }

    let mut sums: BTreeMap<(i32, String), u64> = BTreeMap::new();
    for record in view.records() {
        *sums
            .entry((record.year, record.institution.clone()))
            .or_default() += record.enrolled;
    }

    // BTreeMap iteration order is already (year asc, institution asc).
    Ok(sums
        .into_iter()
        .map(|((year, institution), enrolled)| EnrollmentSum {
            year,
            institution,
            enrolled,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Pivoted aggregation: (row key × pivot category) matrix, zero-filled
// ---------------------------------------------------------------------------

/// A dense pivot: every (row, column) cell has a value, zero when the
/// combination is absent from the source data. Rows are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotTable {
    /// Distinct row-key values (years), ascending.
    pub rows: Vec<i64>,
    /// Distinct pivot-category values, ascending.
    pub columns: Vec<String>,
    /// `values[row][column]`, aligned with `rows` × `columns`.
    pub values: Vec<Vec<u64>>,
}

impl PivotTable {
    /// The series for one pivot category across all rows. A category absent
    /// from the table yields an all-zero series, so chart traces stay
    /// aligned with `rows` no matter what survived filtering.
    pub fn series(&self, column: &str) -> Vec<u64> {
        match self.columns.iter().position(|c| c == column) {
            Some(idx) => self.values.iter().map(|row| row[idx]).collect(),
            None => vec![0; self.rows.len()],
        }
    }

    /// Per-row sum across all pivot categories.
    pub fn row_totals(&self) -> Vec<u64> {
        self.values.iter().map(|row| row.iter().sum()).collect()
    }
}

/// Shared scaffolding: the full cross-product of observed row keys and pivot
/// categories, as a zero matrix. Cells are filled afterwards; anything not
/// filled keeps its explicit zero.
fn empty_pivot(view: &DatasetView<'_>, row_key: Column, col_key: Column) -> PivotTable {
    let rows: Vec<i64> = view
        .unique_values(row_key)
        .into_iter()
        .filter_map(|v| v.as_int())
        .collect();
    let columns: Vec<String> = view
        .unique_values(col_key)
        .into_iter()
        .map(|v| v.to_string())
        .collect();
    let values = vec![vec![0u64; columns.len()]; rows.len()];
    PivotTable {
        rows,
        columns,
        values,
    }
}

fn cell_position(table: &PivotTable, row: i64, column: &str) -> Option<(usize, usize)> {
    let r = table.rows.iter().position(|&y| y == row)?;
    let c = table.columns.iter().position(|c| c == column)?;
    Some((r, c))
}

/// Sum the measure per (row key, pivot category), zero-filling missing
/// cells. The row key must be an integer column (Year).
pub fn pivot_sum(
    view: &DatasetView<'_>,
    row_key: Column,
    col_key: Column,
) -> Result<PivotTable, EmptyResult> {
    if view.is_empty() {
        return Err(EmptyResult);
    }

    let mut table = empty_pivot(view, row_key, col_key);
    for record in view.records() {
        let Some(row) = row_key.value(record).as_int() else {
            continue;
        };
        let column = col_key.value(record).to_string();
        if let Some((r, c)) = cell_position(&table, row, &column) {
            table.values[r][c] += record.enrolled;
        }
    }
    Ok(table)
}

/// Count *distinct* values of `counted` per (row key, pivot category).
/// Same shape and ordering as [`pivot_sum`] over the same view, so the two
/// results align index-for-index.
pub fn pivot_distinct(
    view: &DatasetView<'_>,
    row_key: Column,
    col_key: Column,
    counted: Column,
) -> Result<PivotTable, EmptyResult> {
    if view.is_empty() {
        return Err(EmptyResult);
    }

    let mut table = empty_pivot(view, row_key, col_key);
    let mut seen: BTreeMap<(usize, usize), BTreeSet<String>> = BTreeMap::new();
    for record in view.records() {
        let Some(row) = row_key.value(record).as_int() else {
            continue;
        };
        let column = col_key.value(record).to_string();
        if let Some(pos) = cell_position(&table, row, &column) {
            seen.entry(pos)
                .or_default()
                .insert(counted.value(record).to_string());
        }
    }
    for ((r, c), values) in seen {
        table.values[r][c] = values.len() as u64;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterSpec, Selection};
    use crate::data::model::{Dataset, FieldValue, Record};

    fn mk_record(year: i32, level: &str, institution: &str, enrolled: u64) -> Record {
        Record {
            year,
            region: "SIERRA".to_string(),
            funding: "PARTICULAR".to_string(),
            level: level.to_string(),
            faculty: "INGENIERIA".to_string(),
            program: "SISTEMAS".to_string(),
            institution: institution.to_string(),
            enrolled,
        }
    }

    fn sample_dataset() -> Dataset {
        Dataset::from_records(vec![
            mk_record(2020, "TECNICO", "INSTITUTO A", 40),
            mk_record(2020, "TECNICO", "INSTITUTO A", 10),
            mk_record(2020, "TERCER NIVEL", "U1", 100),
            mk_record(2021, "TERCER NIVEL", "U1", 80),
            mk_record(2021, "TERCER NIVEL", "U2", 20),
        ])
    }

    #[test]
    fn group_sum_merges_buckets_and_sorts_by_year() {
        let ds = sample_dataset();
        let view = DatasetView::all(&ds);
        let sums = enrollment_by_institution(&view).unwrap();

        assert_eq!(sums.len(), 4);
        assert_eq!(sums[0].year, 2020);
        assert_eq!(sums[0].institution, "INSTITUTO A");
        assert_eq!(sums[0].enrolled, 50);
        assert!(sums.windows(2).all(|w| w[0].year <= w[1].year));
    }

    #[test]
    fn empty_view_short_circuits_every_aggregation() {
        let ds = sample_dataset();
        let spec = FilterSpec::new(Column::Year, Selection::Equals(FieldValue::Int(1999)));
        let view = DatasetView::all(&ds).narrow(&spec);

        assert_eq!(enrollment_by_institution(&view), Err(EmptyResult));
        assert_eq!(pivot_sum(&view, Column::Year, Column::Level), Err(EmptyResult));
        assert_eq!(
            pivot_distinct(&view, Column::Year, Column::Level, Column::Institution),
            Err(EmptyResult)
        );
    }

    #[test]
    fn pivot_zero_fills_missing_combinations() {
        let ds = sample_dataset();
        let view = DatasetView::all(&ds);
        let table = pivot_sum(&view, Column::Year, Column::Level).unwrap();

        assert_eq!(table.rows, vec![2020, 2021]);
        assert_eq!(table.columns, vec!["TECNICO", "TERCER NIVEL"]);
        // 2021 has no TECNICO rows: the cell exists and is zero.
        assert_eq!(table.series("TECNICO"), vec![50, 0]);
        assert_eq!(table.series("TERCER NIVEL"), vec![100, 100]);
    }

    #[test]
    fn distinct_count_ignores_duplicate_institutions() {
        let ds = sample_dataset();
        let view = DatasetView::all(&ds);
        let table = pivot_distinct(&view, Column::Year, Column::Level, Column::Institution).unwrap();

        // INSTITUTO A appears twice in 2020/TECNICO but counts once.
        assert_eq!(table.series("TECNICO"), vec![1, 0]);
        assert_eq!(table.series("TERCER NIVEL"), vec![1, 2]);
        assert_eq!(table.row_totals(), vec![2, 2]);
    }

    #[test]
    fn sum_and_distinct_pivots_align() {
        let ds = sample_dataset();
        let view = DatasetView::all(&ds);
        let sums = pivot_sum(&view, Column::Year, Column::Level).unwrap();
        let counts =
            pivot_distinct(&view, Column::Year, Column::Level, Column::Institution).unwrap();

        assert_eq!(sums.rows, counts.rows);
        assert_eq!(sums.columns, counts.columns);
    }

    #[test]
    fn absent_category_series_is_all_zero() {
        let ds = sample_dataset();
        let view = DatasetView::all(&ds);
        let table = pivot_sum(&view, Column::Year, Column::Level).unwrap();
        assert_eq!(table.series("CUARTO NIVEL"), vec![0, 0]);
    }
}
