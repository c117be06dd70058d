//! Chart generation using plotters.
//!
//! One image with two panels: stat values per turn with each ideal drawn as a
//! faint horizontal line (top) and percentage gap to ideal per turn (bottom).
//! Styling comes from the `chart` section of config.json.

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use super::config::ChartConfig;
use crate::model::{IdealStats, Stat, StatMap, StatSnapshot};

type Series = StatMap<Vec<(f64, f64)>>;

/// `(turn, value)` points per stat, turns numbered from 1.
pub fn stat_series(history: &[StatSnapshot]) -> Series {
    StatMap::from_fn(|stat| {
        history
            .iter()
            .enumerate()
            .map(|(i, s)| ((i + 1) as f64, s[stat] as f64))
            .collect()
    })
}

/// `(turn, percent)` gap to ideal per stat. Stats with ideal 0 have no points.
pub fn gap_series(history: &[StatSnapshot], ideal: &IdealStats) -> Series {
    StatMap::from_fn(|stat| {
        if ideal[stat] == 0 {
            return Vec::new();
        }
        let target = ideal[stat] as f64;
        history
            .iter()
            .enumerate()
            .map(|(i, s)| ((i + 1) as f64, (s[stat] as f64 / target - 1.0) * 100.0))
            .collect()
    })
}

/// Smallest and largest y over all series, padded so flat lines stay visible.
fn y_range(series: &Series, extra: &[f64]) -> (f64, f64) {
    let ys = series
        .values()
        .iter()
        .flat_map(|points| points.iter().map(|&(_, y)| y))
        .chain(extra.iter().copied());
    let (min, max) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
    });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.1).max(1.0);
    (min - pad, max + pad)
}

fn rgb(c: [u8; 3]) -> RGBColor {
    RGBColor(c[0], c[1], c[2])
}

/// Render the two-panel stat graph to a PNG.
pub fn generate_stat_graph(
    trainee: &str,
    history: &[StatSnapshot],
    ideal: &IdealStats,
    output_path: &Path,
    config: &ChartConfig,
) -> Result<()> {
    let root = BitMapBackend::new(
        output_path,
        (config.layout.chart_width, config.layout.chart_height),
    )
    .into_drawing_area();
    root.fill(&WHITE)
        .context("Failed to fill chart background")?;

    let (title_area, rest) = root.split_vertically(config.layout.title_height);
    let title_font = ("sans-serif", config.font.title_size)
        .into_font()
        .style(FontStyle::Bold);
    title_area.draw_text(
        &format!("{} - {} turns", trainee, history.len()),
        &title_font.color(&BLACK),
        (20, 10),
    )?;

    let panel_height = config.layout.chart_height.saturating_sub(config.layout.title_height) / 2;
    let (top, bottom) = rest.split_vertically(panel_height);

    let values = stat_series(history);
    let ideal_lines: Vec<f64> = ideal.values().iter().map(|&v| v as f64).collect();
    draw_panel(
        &top,
        "Stats over time",
        "Value",
        &values,
        &ideal_lines,
        history.len(),
        ideal,
        config,
    )?;

    let gaps = gap_series(history, ideal);
    draw_panel(
        &bottom,
        "Gap to ideal",
        "% of ideal",
        &gaps,
        &[0.0],
        history.len(),
        ideal,
        config,
    )?;

    root.present().context("Failed to save chart")?;
    crate::log(&format!("Saved stat graph: {}", output_path.display()));
    Ok(())
}

/// One line per stat plus horizontal reference lines at `references`.
#[allow(clippy::too_many_arguments)]
fn draw_panel(
    area: &DrawingArea<BitMapBackend, Shift>,
    caption: &str,
    y_desc: &str,
    series: &Series,
    references: &[f64],
    turns: usize,
    ideal: &IdealStats,
    config: &ChartConfig,
) -> Result<()> {
    let background = rgb(config.colors.background);
    let grid_color = rgb(config.colors.grid_color);
    let colors = config.colors.stat_colors();

    area.fill(&background)?;

    let x_max = (turns.max(2)) as f64;
    let (y_min, y_max) = y_range(series, references);

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", config.font.caption_size))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(1.0f64..x_max, y_min..y_max)
        .context("Failed to build chart")?;

    chart
        .configure_mesh()
        .x_desc("Turn")
        .y_desc(y_desc)
        .x_label_formatter(&|x| format!("{:.0}", x))
        .y_label_formatter(&|y| format!("{:.0}", y))
        .light_line_style(grid_color)
        .bold_line_style(grid_color.mix(0.8))
        .draw()
        .context("Failed to draw mesh")?;

    // Ideal lines use the stat color when they are per stat.
    for (i, &y) in references.iter().enumerate() {
        let color = if references.len() == Stat::ALL.len() {
            rgb(colors.values()[i]).mix(0.35)
        } else {
            BLACK.mix(0.35)
        };
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(1.0, y), (x_max, y)],
            color.stroke_width(1),
        )))?;
    }

    for (stat, points) in series.iter() {
        if points.is_empty() {
            continue;
        }
        let color = rgb(colors[stat]);
        let label = if ideal[stat] > 0 {
            stat.label().to_string()
        } else {
            format!("{} (no target)", stat.label())
        };
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(2)))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 3, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .label_font(("sans-serif", config.font.legend_size))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()
        .context("Failed to draw legend")?;

    Ok(())
}
