use std::collections::BTreeSet;
use std::fmt::Display;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::{DatasetView, FilterSpec, Selection};
use crate::data::model::{Column, Dataset, FieldValue};
use crate::chart::{MarketShareSelection, ProgramSelection};
use crate::state::{first_career_in_faculty, AppState, Page};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the filter panel for the active view. Option lists are derived
/// stage by stage from the view narrowed by all prior stages, so a selection
/// higher up immediately restricts the menus below it.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let AppState {
        dataset,
        page,
        market,
        program,
        ..
    } = state;

    let Some(dataset) = dataset.as_ref() else {
        ui.label("No dataset loaded.");
        return;
    };

    let changed = ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match page {
            Page::MarketShare => market_filters(ui, dataset, market),
            Page::Programs => program_filters(ui, dataset, program),
        })
        .inner;

    if changed {
        state.recompute();
    }
}

fn market_filters(ui: &mut Ui, dataset: &Dataset, market: &mut MarketShareSelection) -> bool {
    let mut changed = false;
    let mut view = DatasetView::all(dataset);

    let years = int_options(&view, Column::Year);
    changed |= checkbox_list(ui, Column::Year.label(), &years, &mut market.years);
    view = view.narrow(&FilterSpec::new(
        Column::Year,
        Selection::any_of(market.years.iter().map(|&y| FieldValue::Int(y)).collect()),
    ));

    for (column, selected) in [
        (Column::Region, &mut market.regions),
        (Column::Funding, &mut market.fundings),
        (Column::Level, &mut market.levels),
    ] {
        let options = text_options(&view, column);
        changed |= checkbox_list(ui, column.label(), &options, selected);
        view = view.narrow(&FilterSpec::new(
            column,
            Selection::any_of(selected.iter().map(|v| FieldValue::from(v.clone())).collect()),
        ));
    }

    let faculties = text_options(&view, Column::Faculty);
    changed |= combo_select(ui, Column::Faculty.label(), &faculties, &mut market.faculty, true);
    if let Some(faculty) = &market.faculty {
        view = view.narrow(&FilterSpec::new(
            Column::Faculty,
            Selection::Equals(FieldValue::from(faculty.clone())),
        ));
    }

    let programs = text_options(&view, Column::Program);
    changed |= checkbox_list(ui, Column::Program.label(), &programs, &mut market.programs);

    changed
}

fn program_filters(ui: &mut Ui, dataset: &Dataset, program: &mut ProgramSelection) -> bool {
    let mut changed = false;
    // The level exclusion applies before any user selection.
    let view = DatasetView::all(dataset).narrow(&ProgramSelection::exclusion_spec());

    let years = int_options(&view, Column::Year);
    changed |= checkbox_list(ui, Column::Year.label(), &years, &mut program.years);

    // Faculty only narrows the career menu; it is not a row filter itself.
    let faculties = text_options(&view, Column::Faculty);
    if let Some(faculty) = &program.faculty {
        if !faculties.contains(faculty) {
            program.faculty = faculties.first().cloned();
            changed = true;
        }
    } else if !faculties.is_empty() {
        program.faculty = faculties.first().cloned();
        changed = true;
    }
    let faculty_changed =
        combo_select(ui, Column::Faculty.label(), &faculties, &mut program.faculty, false);
    if faculty_changed {
        // Career selection becomes stale once the faculty changes.
        program.career = None;
        changed = true;
    }

    let careers: Vec<String> = match &program.faculty {
        Some(faculty) => {
            let in_faculty = view.narrow(&FilterSpec::new(
                Column::Faculty,
                Selection::Equals(FieldValue::from(faculty.clone())),
            ));
            text_options(&in_faculty, Column::Program)
        }
        None => Vec::new(),
    };
    match &program.career {
        Some(career) if careers.contains(career) => {}
        _ => {
            if let Some(faculty) = &program.faculty {
                program.career = first_career_in_faculty(&view, faculty);
                changed = true;
            }
        }
    }
    changed |= combo_select(ui, Column::Program.label(), &careers, &mut program.career, false);

    changed
}

// ---------------------------------------------------------------------------
// Widget helpers
// ---------------------------------------------------------------------------

fn int_options(view: &DatasetView<'_>, column: Column) -> Vec<i64> {
    view.unique_values(column)
        .into_iter()
        .filter_map(|v| v.as_int())
        .collect()
}

fn text_options(view: &DatasetView<'_>, column: Column) -> Vec<String> {
    view.unique_values(column)
        .into_iter()
        .map(|v| v.to_string())
        .collect()
}

/// Collapsible checkbox list with All/None buttons. An empty selection
/// means "no restriction", so the header shows `all` rather than `0/n`.
fn checkbox_list<T: Ord + Clone + Display>(
    ui: &mut Ui,
    heading: &str,
    options: &[T],
    selected: &mut BTreeSet<T>,
) -> bool {
    let mut changed = false;

    let summary = if selected.is_empty() {
        "all".to_string()
    } else {
        format!("{}/{}", selected.len(), options.len())
    };
    let header_text = format!("{heading}  ({summary})");

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(heading)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    *selected = options.iter().cloned().collect();
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    selected.clear();
                    changed = true;
                }
            });

            for option in options {
                let mut checked = selected.contains(option);
                if ui.checkbox(&mut checked, option.to_string()).changed() {
                    if checked {
                        selected.insert(option.clone());
                    } else {
                        selected.remove(option);
                    }
                    changed = true;
                }
            }
        });

    changed
}

/// Single-select combo box. `allow_none` adds a "(any)" entry that clears
/// the selection.
fn combo_select(
    ui: &mut Ui,
    heading: &str,
    options: &[String],
    selected: &mut Option<String>,
    allow_none: bool,
) -> bool {
    let mut changed = false;

    ui.strong(heading);
    let current = selected.clone().unwrap_or_else(|| "(any)".to_string());
    egui::ComboBox::from_id_salt(heading)
        .selected_text(current)
        .show_ui(ui, |ui: &mut Ui| {
            if allow_none && ui.selectable_label(selected.is_none(), "(any)").clicked() {
                *selected = None;
                changed = true;
            }
            for option in options {
                let is_selected = selected.as_deref() == Some(option.as_str());
                if ui.selectable_label(is_selected, option).clicked() && !is_selected {
                    *selected = Some(option.clone());
                    changed = true;
                }
            }
        });
    ui.separator();

    changed
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar: file menu, view switcher, status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if ui
            .selectable_label(state.page == Page::MarketShare, "Market share")
            .clicked()
        {
            state.page = Page::MarketShare;
        }
        if ui
            .selectable_label(state.page == Page::Programs, "Programs")
            .clicked()
        {
            state.page = Page::Programs;
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!("{} enrollment records loaded", ds.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open enrollment data")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} enrollment records from {}",
                    dataset.len(),
                    path.display()
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}
