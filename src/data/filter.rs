use std::collections::BTreeSet;

use super::model::{Column, Dataset, FieldValue, Record};

// ---------------------------------------------------------------------------
// Filter predicate: which values of a column are admitted
// ---------------------------------------------------------------------------

/// Selection state of a single filter stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// No restriction.
    Any,
    /// Row passes when its value is in the set. An empty set means the user
    /// has selected nothing yet, which is "no restriction" as well.
    AnyOf(BTreeSet<FieldValue>),
    /// Row passes only on an exact match (single-select widgets).
    Equals(FieldValue),
    /// Row passes unless its value matches (fixed exclusion stages).
    Excludes(FieldValue),
}

impl Selection {
    /// Build an `AnyOf` selection, collapsing the empty set to `Any`.
    pub fn any_of(values: BTreeSet<FieldValue>) -> Self {
        if values.is_empty() {
            Selection::Any
        } else {
            Selection::AnyOf(values)
        }
    }
}

/// One stage of the filter pipeline: a column plus its selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub column: Column,
    pub selection: Selection,
}

impl FilterSpec {
    pub fn new(column: Column, selection: Selection) -> Self {
        FilterSpec { column, selection }
    }

    /// Whether a record passes this stage.
    pub fn admits(&self, record: &Record) -> bool {
        match &self.selection {
            Selection::Any => true,
            Selection::AnyOf(values) => {
                values.is_empty() || values.contains(&self.column.value(record))
            }
            Selection::Equals(value) => self.column.value(record) == *value,
            Selection::Excludes(value) => self.column.value(record) != *value,
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetView – a narrowed, immutable view over the dataset
// ---------------------------------------------------------------------------

/// Indices of records surviving the filter stages applied so far.
/// Narrowing produces a new view; the base dataset is never touched.
#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> DatasetView<'a> {
    /// A view over the whole dataset (no filters applied).
    pub fn all(dataset: &'a Dataset) -> Self {
        DatasetView {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// Apply one filter stage, returning the narrowed view.
    pub fn narrow(&self, spec: &FilterSpec) -> Self {
        DatasetView {
            dataset: self.dataset,
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|&i| spec.admits(&self.dataset.records[i]))
                .collect(),
        }
    }

    /// Apply an ordered list of filter stages, each over the previous
    /// stage's output.
    pub fn apply(&self, specs: &[FilterSpec]) -> Self {
        specs.iter().fold(self.clone(), |view, spec| view.narrow(spec))
    }

    /// Sorted distinct values of a column *within this view*. Filter widgets
    /// must call this on the view narrowed by all prior stages so option
    /// lists reflect earlier selections.
    pub fn unique_values(&self, column: Column) -> BTreeSet<FieldValue> {
        self.records().map(|r| column.value(r)).collect()
    }

    /// Iterate over the surviving records.
    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.indices.iter().map(|&i| &self.dataset.records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_record(year: i32, level: &str, faculty: &str, program: &str) -> Record {
        Record {
            year,
            region: "SIERRA".to_string(),
            funding: "PARTICULAR".to_string(),
            level: level.to_string(),
            faculty: faculty.to_string(),
            program: program.to_string(),
            institution: "U1".to_string(),
            enrolled: 10,
        }
    }

    fn sample_dataset() -> Dataset {
        Dataset::from_records(vec![
            mk_record(2020, "TECNICO", "INGENIERIA", "SISTEMAS"),
            mk_record(2020, "TERCER NIVEL", "INGENIERIA", "CIVIL"),
            mk_record(2021, "TERCER NIVEL", "MEDICINA", "ENFERMERIA"),
            mk_record(2021, "CUARTO NIVEL", "MEDICINA", "ENFERMERIA"),
        ])
    }

    #[test]
    fn narrowing_never_grows_and_respects_predicates() {
        let ds = sample_dataset();
        let spec = FilterSpec::new(
            Column::Year,
            Selection::any_of([FieldValue::Int(2020)].into_iter().collect()),
        );
        let view = DatasetView::all(&ds).narrow(&spec);

        assert!(view.len() <= ds.len());
        assert!(view.records().all(|r| r.year == 2020));
    }

    #[test]
    fn empty_selection_is_pass_through() {
        let ds = sample_dataset();
        let spec = FilterSpec::new(Column::Region, Selection::any_of(BTreeSet::new()));
        let view = DatasetView::all(&ds).narrow(&spec);
        assert_eq!(view.len(), ds.len());
    }

    #[test]
    fn excludes_stage_drops_only_the_excluded_value() {
        let ds = sample_dataset();
        let spec = FilterSpec::new(
            Column::Level,
            Selection::Excludes(FieldValue::from("CUARTO NIVEL")),
        );
        let view = DatasetView::all(&ds).narrow(&spec);
        assert_eq!(view.len(), 3);
        assert!(view.records().all(|r| r.level != "CUARTO NIVEL"));
    }

    #[test]
    fn option_lists_follow_prior_stages() {
        let ds = sample_dataset();
        let base = DatasetView::all(&ds);
        assert_eq!(base.unique_values(Column::Program).len(), 3);

        // After narrowing to one faculty, career options shrink accordingly.
        let spec = FilterSpec::new(
            Column::Faculty,
            Selection::Equals(FieldValue::from("MEDICINA")),
        );
        let narrowed = base.narrow(&spec);
        let programs = narrowed.unique_values(Column::Program);
        assert_eq!(
            programs.into_iter().collect::<Vec<_>>(),
            vec![FieldValue::from("ENFERMERIA")]
        );
    }

    #[test]
    fn pipeline_is_idempotent() {
        let ds = sample_dataset();
        let specs = vec![
            FilterSpec::new(
                Column::Level,
                Selection::Excludes(FieldValue::from("CUARTO NIVEL")),
            ),
            FilterSpec::new(
                Column::Year,
                Selection::any_of([FieldValue::Int(2021)].into_iter().collect()),
            ),
        ];
        let once = DatasetView::all(&ds).apply(&specs);
        let twice = once.apply(&specs);

        let a: Vec<&Record> = once.records().collect();
        let b: Vec<&Record> = twice.records().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn stages_can_narrow_to_empty() {
        let ds = sample_dataset();
        let specs = vec![
            FilterSpec::new(
                Column::Year,
                Selection::any_of([FieldValue::Int(2020)].into_iter().collect()),
            ),
            FilterSpec::new(
                Column::Faculty,
                Selection::Equals(FieldValue::from("MEDICINA")),
            ),
        ];
        let view = DatasetView::all(&ds).apply(&specs);
        assert!(view.is_empty());
    }
}
