use crate::chart::{
    self, MarketShareChart, MarketShareSelection, ProgramChart, ProgramSelection,
};
use crate::color::HighlightTable;
use crate::data::aggregate::EmptyResult;
use crate::data::filter::DatasetView;
use crate::data::model::{Column, Dataset};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The two dashboard views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    MarketShare,
    Programs,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// Which view is active.
    pub page: Page,

    /// Market-share view filter selections.
    pub market: MarketShareSelection,

    /// Programs view filter selections.
    pub program: ProgramSelection,

    /// Fixed-color overrides for distinguished institutions.
    pub highlights: HighlightTable,

    /// Chart specs rebuilt after every filter change (None until a dataset
    /// is loaded). `Err(EmptyResult)` renders as a warning instead of a plot.
    pub market_chart: Option<Result<MarketShareChart, EmptyResult>>,
    pub program_chart: Option<Result<ProgramChart, EmptyResult>>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            page: Page::default(),
            market: MarketShareSelection::default(),
            program: ProgramSelection::default(),
            highlights: HighlightTable::default(),
            market_chart: None,
            program_chart: None,
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset and initialise the default selections:
    /// all years selected on both views, first faculty/career on the
    /// programs view.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        let base = DatasetView::all(&dataset);
        let years: std::collections::BTreeSet<i64> = base
            .unique_values(Column::Year)
            .into_iter()
            .filter_map(|v| v.as_int())
            .collect();

        self.market = MarketShareSelection {
            years: years.clone(),
            ..Default::default()
        };

        let without_excluded = base.narrow(&ProgramSelection::exclusion_spec());
        let faculty = without_excluded
            .unique_values(Column::Faculty)
            .into_iter()
            .next()
            .map(|v| v.to_string());
        let career = faculty.as_ref().and_then(|f| {
            first_career_in_faculty(&without_excluded, f)
        });
        self.program = ProgramSelection {
            years,
            faculty,
            career,
        };

        self.dataset = Some(dataset);
        self.status_message = None;
        self.loading = false;
        self.recompute();
    }

    /// Rebuild both chart specs from the current selections. Called after
    /// every filter interaction.
    pub fn recompute(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.market_chart = None;
            self.program_chart = None;
            return;
        };
        log::debug!(
            "recomputing charts over {} records (market: {:?}, program: {:?})",
            dataset.len(),
            self.market,
            self.program
        );
        self.market_chart = Some(chart::market_share_chart(
            dataset,
            &self.market,
            &self.highlights,
        ));
        self.program_chart = Some(chart::program_chart(dataset, &self.program));
    }
}

/// First career (sorted) offered by a faculty, used as the default selection.
pub fn first_career_in_faculty(view: &DatasetView<'_>, faculty: &str) -> Option<String> {
    use crate::data::filter::{FilterSpec, Selection};
    use crate::data::model::FieldValue;

    let spec = FilterSpec::new(
        Column::Faculty,
        Selection::Equals(FieldValue::from(faculty)),
    );
    view.narrow(&spec)
        .unique_values(Column::Program)
        .into_iter()
        .next()
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn mk_record(year: i32, level: &str, faculty: &str, program: &str) -> Record {
        Record {
            year,
            region: "SIERRA".to_string(),
            funding: "PARTICULAR".to_string(),
            level: level.to_string(),
            faculty: faculty.to_string(),
            program: program.to_string(),
            institution: "U1".to_string(),
            enrolled: 25,
        }
    }

    #[test]
    fn loading_a_dataset_selects_all_years_and_first_career() {
        let mut state = AppState::default();
        state.set_dataset(Dataset::from_records(vec![
            mk_record(2020, "TERCER NIVEL", "INGENIERIA", "SISTEMAS"),
            mk_record(2021, "TERCER NIVEL", "INGENIERIA", "CIVIL"),
            mk_record(2021, "CUARTO NIVEL", "POSGRADOS", "MBA"),
        ]));

        assert_eq!(state.market.years.len(), 2);
        // CUARTO NIVEL rows are excluded before defaults are derived, so the
        // posgrado faculty never becomes the default.
        assert_eq!(state.program.faculty.as_deref(), Some("INGENIERIA"));
        assert_eq!(state.program.career.as_deref(), Some("CIVIL"));
        assert!(state.market_chart.is_some());
        assert!(matches!(state.program_chart, Some(Ok(_))));
    }
}
