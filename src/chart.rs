use std::collections::BTreeSet;

use eframe::egui::Color32;

use crate::color::{bar_color, level_style, HighlightTable, LevelStyle};
use crate::data::aggregate::{
    enrollment_by_institution, pivot_distinct, pivot_sum, EmptyResult,
};
use crate::data::filter::{DatasetView, FilterSpec, Selection};
use crate::data::model::{Column, Dataset, FieldValue};
use crate::data::share::shares_by_year;

/// Level unconditionally excluded from the programs view.
pub const EXCLUDED_LEVEL: &str = "CUARTO NIVEL";

/// The level series drawn on the programs chart: (level value, bar trace
/// name, trend trace name).
const LEVEL_SERIES: [(&str, &str, &str); 2] = [
    ("TECNICO", "Technical institutes", "Technical enrollment"),
    ("TERCER NIVEL", "Universities", "University enrollment"),
];

// ---------------------------------------------------------------------------
// Per-view filter selections
// ---------------------------------------------------------------------------

/// Market-share view selections, in pipeline order. Empty sets and `None`
/// mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarketShareSelection {
    pub years: BTreeSet<i64>,
    pub regions: BTreeSet<String>,
    pub fundings: BTreeSet<String>,
    pub levels: BTreeSet<String>,
    pub faculty: Option<String>,
    pub programs: BTreeSet<String>,
}

impl MarketShareSelection {
    /// The ordered filter pipeline this selection describes.
    pub fn specs(&self) -> Vec<FilterSpec> {
        let text_set = |values: &BTreeSet<String>| {
            Selection::any_of(values.iter().map(|v| FieldValue::from(v.clone())).collect())
        };
        let mut specs = vec![
            FilterSpec::new(
                Column::Year,
                Selection::any_of(self.years.iter().map(|&y| FieldValue::Int(y)).collect()),
            ),
            FilterSpec::new(Column::Region, text_set(&self.regions)),
            FilterSpec::new(Column::Funding, text_set(&self.fundings)),
            FilterSpec::new(Column::Level, text_set(&self.levels)),
        ];
        if let Some(faculty) = &self.faculty {
            specs.push(FilterSpec::new(
                Column::Faculty,
                Selection::Equals(FieldValue::from(faculty.clone())),
            ));
        }
        specs.push(FilterSpec::new(Column::Program, text_set(&self.programs)));
        specs
    }
}

/// Programs view selections. The faculty narrows only the career option
/// list; the rows themselves are filtered by years and career (observed
/// behavior of the source dashboard).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramSelection {
    pub years: BTreeSet<i64>,
    pub faculty: Option<String>,
    pub career: Option<String>,
}

impl ProgramSelection {
    /// The fixed level-exclusion stage applied before any user selection.
    pub fn exclusion_spec() -> FilterSpec {
        FilterSpec::new(
            Column::Level,
            Selection::Excludes(FieldValue::from(EXCLUDED_LEVEL)),
        )
    }

    /// The ordered row-filter pipeline this selection describes.
    pub fn specs(&self) -> Vec<FilterSpec> {
        let mut specs = vec![
            Self::exclusion_spec(),
            FilterSpec::new(
                Column::Year,
                Selection::any_of(self.years.iter().map(|&y| FieldValue::Int(y)).collect()),
            ),
        ];
        if let Some(career) = &self.career {
            specs.push(FilterSpec::new(
                Column::Program,
                Selection::Equals(FieldValue::from(career.clone())),
            ));
        }
        specs
    }
}

// ---------------------------------------------------------------------------
// Market-share chart spec
// ---------------------------------------------------------------------------

/// One horizontal bar: an institution's share of its year's enrollment.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareBar {
    pub institution: String,
    pub enrolled: u64,
    pub share: f64,
    pub color: Color32,
    /// Percentage label drawn on the bar, e.g. `"25.00%"`.
    pub label: String,
}

/// One year's group of bars, ascending by share.
#[derive(Debug, Clone, PartialEq)]
pub struct YearTrace {
    pub year: i32,
    pub name: String,
    pub bars: Vec<ShareBar>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketShareChart {
    pub title: String,
    pub traces: Vec<YearTrace>,
}

/// Filter → aggregate → normalize → color, producing the market-share chart
/// spec. Fails with [`EmptyResult`] when the selection leaves no rows.
pub fn market_share_chart(
    dataset: &Dataset,
    selection: &MarketShareSelection,
    highlights: &HighlightTable,
) -> Result<MarketShareChart, EmptyResult> {
    let view = DatasetView::all(dataset).apply(&selection.specs());
    let sums = enrollment_by_institution(&view)?;
    let groups = shares_by_year(&sums);

    let traces = groups
        .iter()
        .map(|group| {
            let (min, max) = group.share_bounds().unwrap_or((0.0, 0.0));
            let bars = group
                .rows
                .iter()
                .map(|row| ShareBar {
                    institution: row.institution.clone(),
                    enrolled: row.enrolled,
                    share: row.share,
                    color: bar_color(highlights, &row.institution, row.share, min, max),
                    label: format!("{:.2}%", row.share * 100.0),
                })
                .collect();
            YearTrace {
                year: group.year,
                name: format!("Year {}", group.year),
                bars,
            }
        })
        .collect();

    Ok(MarketShareChart {
        title: "Market share by institution and year".to_string(),
        traces,
    })
}

// ---------------------------------------------------------------------------
// Programs chart spec
// ---------------------------------------------------------------------------

/// Stacked bar series: distinct institutions of one level, per year.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedBarTrace {
    pub name: String,
    pub style: LevelStyle,
    pub counts: Vec<u64>,
}

/// Trend series: summed enrollment of one level, per year. Rendered against
/// the secondary axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendTrace {
    pub name: String,
    pub color: Color32,
    pub values: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgramChart {
    pub title: String,
    /// Years in ascending order; every series below is aligned with this.
    pub years: Vec<i64>,
    pub bars: Vec<StackedBarTrace>,
    /// Per-year total of the stacked counts, drawn as text above the bars.
    pub totals: Vec<u64>,
    pub lines: Vec<TrendTrace>,
}

/// Build the programs chart spec: institution counts stacked by level with
/// enrollment trend lines. Both pivots come from the same narrowed view, so
/// their rows align index-for-index.
pub fn program_chart(
    dataset: &Dataset,
    selection: &ProgramSelection,
) -> Result<ProgramChart, EmptyResult> {
    let view = DatasetView::all(dataset).apply(&selection.specs());
    let institutions = pivot_distinct(&view, Column::Year, Column::Level, Column::Institution)?;
    let enrollment = pivot_sum(&view, Column::Year, Column::Level)?;

    let years = institutions.rows.clone();
    let mut bars = Vec::new();
    let mut lines = Vec::new();
    for (level, bar_name, line_name) in LEVEL_SERIES {
        let style = level_style(level);
        bars.push(StackedBarTrace {
            name: bar_name.to_string(),
            style,
            counts: institutions.series(level),
        });
        lines.push(TrendTrace {
            name: line_name.to_string(),
            color: style.line,
            values: enrollment.series(level),
        });
    }

    let totals = (0..years.len())
        .map(|i| bars.iter().map(|b| b.counts[i]).sum())
        .collect();

    let career = selection.career.as_deref().unwrap_or("all careers");
    Ok(ProgramChart {
        title: format!("Institutions and enrollment: {career}"),
        years,
        bars,
        totals,
        lines,
    })
}
