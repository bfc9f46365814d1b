use std::collections::HashMap;

use eframe::egui::{Align2, Color32, RichText, Ui};
use egui_plot::{
    Bar, BarChart, GridMark, Legend, Line, MarkerShape, Plot, PlotPoint, PlotPoints, Points, Text,
};

use crate::chart::{MarketShareChart, ProgramChart};
use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Central panel – chart rendering
// ---------------------------------------------------------------------------

/// Render the active view's chart, or the empty-result / no-data notices.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    match state.page {
        Page::MarketShare => match &state.market_chart {
            None => no_data_notice(ui),
            Some(Err(_)) => empty_result_notice(ui),
            Some(Ok(chart)) => market_share_plot(ui, chart),
        },
        Page::Programs => match &state.program_chart {
            None => no_data_notice(ui),
            Some(Err(_)) => empty_result_notice(ui),
            Some(Ok(chart)) => programs_plot(ui, chart),
        },
    }
}

fn no_data_notice(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.heading("Open a file to explore enrollment  (File → Open…)");
    });
}

/// Shown instead of a chart when the filter pipeline left no rows.
fn empty_result_notice(ui: &mut Ui) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.label(
            RichText::new("No rows match the current filter selection.")
                .color(Color32::from_rgb(0xc8, 0x88, 0x00))
                .heading(),
        );
    });
}

// ---------------------------------------------------------------------------
// Market-share view: grouped horizontal bars, one group per year
// ---------------------------------------------------------------------------

fn market_share_plot(ui: &mut Ui, chart: &MarketShareChart) {
    ui.heading(&chart.title);

    // Lay the bars out bottom-to-top, one slot per bar with a gap between
    // year groups. The y axis shows institution names at the slot positions.
    let mut slot_labels: HashMap<i64, String> = HashMap::new();
    let mut bar_charts: Vec<BarChart> = Vec::new();
    let mut texts: Vec<(PlotPoint, String)> = Vec::new();

    let mut slot: i64 = 0;
    for trace in &chart.traces {
        let mut bars = Vec::new();
        for bar in &trace.bars {
            bars.push(
                Bar::new(slot as f64, bar.share)
                    .fill(bar.color)
                    .name(&bar.institution)
                    .width(0.8),
            );
            slot_labels.insert(slot, bar.institution.clone());
            texts.push((PlotPoint::new(bar.share, slot as f64), bar.label.clone()));
            slot += 1;
        }
        slot += 1; // gap between year groups
        bar_charts.push(BarChart::new(bars).horizontal().name(&trace.name));
    }

    Plot::new("market_share_plot")
        .legend(Legend::default())
        .x_axis_label("Share of enrollment")
        .y_axis_label("Institution")
        .y_axis_formatter(move |mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            let rounded = mark.value.round();
            if (mark.value - rounded).abs() < 1e-6 {
                slot_labels.get(&(rounded as i64)).cloned().unwrap_or_default()
            } else {
                String::new()
            }
        })
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for bar_chart in bar_charts {
                plot_ui.bar_chart(bar_chart);
            }
            for (position, label) in texts {
                plot_ui.text(
                    Text::new(position, RichText::new(label).color(Color32::WHITE).size(10.0))
                        .anchor(Align2::RIGHT_CENTER),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Programs view: stacked institution counts with enrollment trend overlay
// ---------------------------------------------------------------------------

fn programs_plot(ui: &mut Ui, chart: &ProgramChart) {
    ui.heading(&chart.title);

    // egui_plot has no secondary axis: rescale the enrollment lines so their
    // peak sits just under the institution-count maximum.
    let count_peak = chart.totals.iter().copied().max().unwrap_or(0) as f64;
    let enrollment_peak = chart
        .lines
        .iter()
        .flat_map(|line| line.values.iter().copied())
        .max()
        .unwrap_or(0) as f64;
    let scale = if enrollment_peak > 0.0 && count_peak > 0.0 {
        0.95 * count_peak / enrollment_peak
    } else {
        1.0
    };

    let mut bar_charts: Vec<BarChart> = Vec::new();
    for trace in &chart.bars {
        let bars: Vec<Bar> = chart
            .years
            .iter()
            .zip(&trace.counts)
            .map(|(&year, &count)| {
                Bar::new(year as f64, count as f64)
                    .width(0.6)
                    .fill(trace.style.fill)
                    .stroke(eframe::egui::Stroke::new(1.5, trace.style.line))
            })
            .collect();
        let mut bar_chart = BarChart::new(bars).name(&trace.name);
        {
            let below: Vec<&BarChart> = bar_charts.iter().collect();
            bar_chart = bar_chart.stack_on(&below);
        }
        bar_charts.push(bar_chart);
    }

    let markers = [MarkerShape::Circle, MarkerShape::Square];

    Plot::new("programs_plot")
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Number of institutions")
        .x_axis_formatter(|mark: GridMark, _range: &std::ops::RangeInclusive<f64>| {
            let rounded = mark.value.round();
            if (mark.value - rounded).abs() < 1e-6 {
                format!("{}", rounded as i64)
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            for bar_chart in bar_charts {
                plot_ui.bar_chart(bar_chart);
            }

            // Per-year totals above the stacks.
            for (&year, &total) in chart.years.iter().zip(&chart.totals) {
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(year as f64, total as f64 + 0.3),
                        RichText::new(total.to_string()).strong(),
                    )
                    .anchor(Align2::CENTER_BOTTOM),
                );
            }

            // Enrollment trends on the rescaled secondary axis.
            for (i, trend) in chart.lines.iter().enumerate() {
                let points: Vec<[f64; 2]> = chart
                    .years
                    .iter()
                    .zip(&trend.values)
                    .map(|(&year, &value)| [year as f64, value as f64 * scale])
                    .collect();

                plot_ui.line(
                    Line::new(PlotPoints::from(points.clone()))
                        .name(&trend.name)
                        .color(trend.color)
                        .width(2.0),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .shape(markers[i % markers.len()])
                        .radius(4.0)
                        .color(trend.color)
                        .name(&trend.name),
                );
            }
        });

    ui.small("Trend lines show enrollment, rescaled to the institution-count axis.");
}
