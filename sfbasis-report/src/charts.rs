//! Static SVG charts for the summary report.
//!
//! - Full time series, one line per tenor, with a dashed zero line
//! - Term structure on the latest date (maturity in years vs basis)
//! - Correlation heatmap with annotated cells
//!
//! Each chart renders into a `.tmp` sibling that is renamed into place.

use crate::error::ReportError;
use crate::output::replace_with;
use crate::stats::CorrelationMatrix;
use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use sfbasis_core::{DateTable, Tenor};
use std::path::Path;

pub const TIME_SERIES_TITLE: &str = "Treasury-SF Basis (Treasury Yield - SOFR OIS Rate)";
pub const CORRELATION_TITLE: &str = "Treasury-SF Basis Correlations";

const WIDE: (u32, u32) = (1200, 600);
const SQUARE: (u32, u32) = (800, 700);
const FONT: &str = "sans-serif";

const SERIES_COLORS: [RGBColor; 5] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
];

fn chart_err<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Chart(e.to_string())
}

fn series_label(column: &str) -> String {
    Tenor::from_basis_column(column)
        .map(|t| t.label().to_string())
        .unwrap_or_else(|| column.to_string())
}

/// `(min, max)` of the values, padded by 5% of the span.
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1.0);
    (lo - pad, hi + pad)
}

fn day_number(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

fn day_label(day: &i32) -> String {
    NaiveDate::from_num_days_from_ce_opt(*day)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

/// Every basis series over the full history with a dashed zero reference line.
pub fn render_time_series(basis: &DateTable, path: &Path) -> Result<(), ReportError> {
    let (Some(first), Some(last)) = (basis.first_date(), basis.last_date()) else {
        return Err(ReportError::Empty("basis table has no rows".into()));
    };
    let x_range = day_number(first)..day_number(last).max(day_number(first) + 1);
    let (y_lo, y_hi) = padded_range(
        basis
            .columns()
            .iter()
            .flat_map(|c| c.values.iter().flatten().copied())
            .chain([0.0]),
    );

    replace_with(path, |tmp| {
        let root = SVGBackend::new(tmp, WIDE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(TIME_SERIES_TITLE, (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range.clone(), y_lo..y_hi)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Basis (bps)")
            .x_label_formatter(&day_label)
            .draw()
            .map_err(chart_err)?;

        for (idx, column) in basis.columns().iter().enumerate() {
            let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
            let points: Vec<(i32, f64)> = basis
                .dates()
                .iter()
                .zip(&column.values)
                .filter_map(|(d, v)| v.map(|v| (day_number(*d), v)))
                .collect();
            chart
                .draw_series(LineSeries::new(points, color.stroke_width(1)))
                .map_err(chart_err)?
                .label(series_label(&column.name))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .draw_series(DashedLineSeries::new(
                [(x_range.start, 0.0), (x_range.end, 0.0)],
                6,
                4,
                BLACK.mix(0.6).stroke_width(1),
            ))
            .map_err(chart_err)?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)
    })
}

/// Cross-tenor basis on the table's last date. Returns that date.
///
/// Tenors without a value on the last date are left out.
pub fn render_term_structure(basis: &DateTable, path: &Path) -> Result<NaiveDate, ReportError> {
    let Some(date) = basis.last_date() else {
        return Err(ReportError::Empty("basis table has no rows".into()));
    };
    let row = basis.height() - 1;
    let points: Vec<(f64, f64)> = Tenor::ALL
        .iter()
        .filter_map(|t| {
            basis
                .value(&t.basis_column(), row)
                .map(|v| (f64::from(t.years()), v))
        })
        .collect();
    let (y_lo, y_hi) = padded_range(points.iter().map(|p| p.1).chain([0.0]));
    let title = format!("Treasury-SF Basis Term Structure ({date})");

    replace_with(path, |tmp| {
        let root = SVGBackend::new(tmp, WIDE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&title, (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..32.0, y_lo..y_hi)
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_desc("Maturity (years)")
            .y_desc("Basis (bps)")
            .draw()
            .map_err(chart_err)?;

        let color = SERIES_COLORS[0];
        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
            .map_err(chart_err)?;
        chart
            .draw_series(points.iter().map(|p| Circle::new(*p, 5, color.filled())))
            .map_err(chart_err)?;

        root.present().map_err(chart_err)
    })?;
    Ok(date)
}

/// Diverging blue-white-red scale over [-1, 1].
fn correlation_color(value: Option<f64>) -> RGBColor {
    let Some(v) = value else {
        return RGBColor(220, 220, 220);
    };
    let v = v.clamp(-1.0, 1.0);
    let blend = |from: u8, to: u8, t: f64| {
        (f64::from(from) + (f64::from(to) - f64::from(from)) * t).round() as u8
    };
    if v >= 0.0 {
        RGBColor(255, blend(255, 40, v), blend(255, 40, v))
    } else {
        RGBColor(blend(255, 40, -v), blend(255, 40, -v), 255)
    }
}

/// Annotated heatmap of a correlation matrix, first series at the top.
pub fn render_correlation(matrix: &CorrelationMatrix, path: &Path) -> Result<(), ReportError> {
    if matrix.is_empty() {
        return Err(ReportError::Empty("no series to correlate".into()));
    }
    let n = matrix.len() as i32;
    let labels: Vec<String> = matrix.labels.iter().map(|l| series_label(l)).collect();
    // Row 0 is drawn at the top.
    let flip = |row: i32| n - 1 - row;

    replace_with(path, |tmp| {
        let root = SVGBackend::new(tmp, SQUARE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(CORRELATION_TITLE, (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())
            .map_err(chart_err)?;

        let label_at = |v: &SegmentValue<i32>, flipped: bool| match v {
            SegmentValue::CenterOf(i) => {
                let idx = if flipped { flip(*i) } else { *i };
                usize::try_from(idx)
                    .ok()
                    .and_then(|i| labels.get(i))
                    .cloned()
                    .unwrap_or_default()
            }
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n as usize)
            .y_labels(n as usize)
            .x_label_formatter(&|v| label_at(v, false))
            .y_label_formatter(&|v| label_at(v, true))
            .draw()
            .map_err(chart_err)?;

        let cells = (0..n).flat_map(|row| (0..n).map(move |col| (row, col)));
        chart
            .draw_series(cells.clone().map(|(row, col)| {
                let value = matrix.get(row as usize, col as usize);
                let y = flip(row);
                Rectangle::new(
                    [
                        (SegmentValue::Exact(col), SegmentValue::Exact(y)),
                        (SegmentValue::Exact(col + 1), SegmentValue::Exact(y + 1)),
                    ],
                    correlation_color(value).filled(),
                )
            }))
            .map_err(chart_err)?;

        let text_style = TextStyle::from((FONT, 16).into_font())
            .pos(Pos::new(HPos::Center, VPos::Center))
            .color(&BLACK);
        chart
            .draw_series(cells.map(|(row, col)| {
                let text = matrix
                    .get(row as usize, col as usize)
                    .map(|v| format!("{v:.2}"))
                    .unwrap_or_else(|| "n/a".to_string());
                Text::new(
                    text,
                    (SegmentValue::CenterOf(col), SegmentValue::CenterOf(flip(row))),
                    text_style.clone(),
                )
            }))
            .map_err(chart_err)?;

        root.present().map_err(chart_err)
    })
}
