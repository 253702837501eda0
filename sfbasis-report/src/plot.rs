//! Interactive time-series plot of the basis, one line per tenor.
//!
//! The figure is a plain serde model of a plotly.js figure (`data` traces plus
//! `layout`). It is written as a standalone HTML page that loads plotly.js and
//! renders the embedded JSON, so the browser handles zoom, pan and hover.

use crate::error::ReportError;
use crate::output::write_atomic;
use crate::settings::Settings;
use chrono::NaiveDate;
use serde::Serialize;
use sfbasis_core::data::{read_long_file, LONG_BASIS_FILE};
use sfbasis_core::{from_long, DateTable, Tenor};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the interactive chart in the output directory.
pub const PLOT_FILE: &str = "treasury_sf_basis.html";

pub const PLOT_TITLE: &str = "Treasury-SF Basis";
pub const X_AXIS_TITLE: &str = "Date";
pub const Y_AXIS_TITLE: &str = "Basis Spread (bps)";

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const PLOT_DIV_ID: &str = "treasury-sf-basis";

/// First date shown by [`plot_main`] unless configured otherwise.
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default()
}

/// One line series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub name: String,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
}

impl Trace {
    fn line(name: impl Into<String>, x: Vec<NaiveDate>, y: Vec<f64>) -> Self {
        Self {
            kind: "scatter",
            mode: "lines",
            name: name.into(),
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: Title,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.data.iter().find(|t| t.name == name)
    }

    pub fn trace_names(&self) -> Vec<&str> {
        self.data.iter().map(|t| t.name.as_str()).collect()
    }

    /// Standalone HTML page rendering this figure with plotly.js.
    pub fn to_html(&self) -> Result<String, ReportError> {
        // A literal "</" inside the JSON would close the script element.
        let json = serde_json::to_string(self)?.replace("</", "<\\/");
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_JS}" charset="utf-8"></script>
</head>
<body>
<div id="{PLOT_DIV_ID}" style="width:100%;height:95vh;"></div>
<script>
var figure = {json};
Plotly.newPlot("{PLOT_DIV_ID}", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
            title = html_escape(&self.layout.title.text),
        ))
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Build the figure for `basis` over `[start, end]` and write it to `save_path`.
///
/// Either bound may be open: `None` keeps the full history on that side.
/// Tenors without a column are skipped and missing cells are left out of
/// their trace.
pub fn plot_figure(
    basis: &DateTable,
    save_path: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Figure, ReportError> {
    let window = basis.restrict(start, end);
    debug!(?start, ?end, rows = window.height(), "plot window");

    let mut data = Vec::new();
    for tenor in Tenor::ALL {
        let Some(values) = window.column(&tenor.basis_column()) else {
            continue;
        };
        let (x, y): (Vec<NaiveDate>, Vec<f64>) = window
            .dates()
            .iter()
            .zip(values)
            .filter_map(|(date, value)| value.map(|v| (*date, v)))
            .unzip();
        data.push(Trace::line(tenor.label(), x, y));
    }
    if data.is_empty() {
        warn!("no basis series to plot");
    }

    let figure = Figure {
        data,
        layout: Layout {
            title: Title {
                text: PLOT_TITLE.into(),
            },
            xaxis: Axis {
                title: Title {
                    text: X_AXIS_TITLE.into(),
                },
            },
            yaxis: Axis {
                title: Title {
                    text: Y_AXIS_TITLE.into(),
                },
            },
        },
    };

    write_atomic(save_path, figure.to_html()?.as_bytes())?;
    info!(path = %save_path.display(), traces = figure.data.len(), "wrote plot");
    Ok(figure)
}

/// Load a long-format basis table and pivot it to wide.
pub fn load_treasury_sf_data(path: &Path) -> Result<DateTable, ReportError> {
    let records = read_long_file(path)?;
    Ok(from_long(&records)?)
}

/// Plot the stored long-format basis into the output directory.
pub fn plot_main(settings: &Settings) -> Result<PathBuf, ReportError> {
    let basis = load_treasury_sf_data(&settings.data_dir.join(LONG_BASIS_FILE))?;
    let path = settings.output_dir.join(PLOT_FILE);
    plot_figure(
        &basis,
        &path,
        Some(settings.plot_start_date),
        settings.plot_end_date,
    )?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfbasis_core::TableColumn;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn basis() -> DateTable {
        DateTable::from_columns(
            vec![d("2017-12-29"), d("2018-01-02"), d("2018-01-03")],
            vec![
                TableColumn::new("Treasury_SF_10Y", vec![Some(1.0), Some(2.0), None]),
                TableColumn::new("Treasury_SF_2Y", vec![Some(5.0), Some(6.0), Some(7.0)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn traces_follow_tenor_order_and_drop_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let fig = plot_figure(&basis(), &dir.path().join("p.html"), None, None).unwrap();

        assert_eq!(fig.trace_names(), vec!["2Y", "10Y"]);
        let ten = fig.trace("10Y").unwrap();
        assert_eq!(ten.x, vec![d("2017-12-29"), d("2018-01-02")]);
        assert_eq!(ten.y, vec![1.0, 2.0]);
    }

    #[test]
    fn layout_titles() {
        let dir = tempfile::tempdir().unwrap();
        let fig = plot_figure(&basis(), &dir.path().join("p.html"), None, None).unwrap();

        assert_eq!(fig.layout.title.text, "Treasury-SF Basis");
        assert_eq!(fig.layout.xaxis.title.text, "Date");
        assert_eq!(fig.layout.yaxis.title.text, "Basis Spread (bps)");
    }

    #[test]
    fn open_start_keeps_history_before_the_end_bound() {
        let dir = tempfile::tempdir().unwrap();
        let fig = plot_figure(&basis(), &dir.path().join("p.html"), None, Some(d("2018-01-02")))
            .unwrap();

        assert_eq!(fig.trace("2Y").unwrap().x, vec![d("2017-12-29"), d("2018-01-02")]);
    }

    #[test]
    fn start_bound_is_inclusive() {
        let dir = tempfile::tempdir().unwrap();
        let fig = plot_figure(
            &basis(),
            &dir.path().join("p.html"),
            Some(default_start_date()),
            None,
        )
        .unwrap();

        assert_eq!(fig.trace("2Y").unwrap().x, vec![d("2018-01-02"), d("2018-01-03")]);
    }

    #[test]
    fn html_embeds_figure_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("p.html");
        plot_figure(&basis(), &path, Some(d("2017-01-01")), None).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains("\"name\":\"2Y\""));
        assert!(html.contains("\"2017-12-29\""));
    }

    #[test]
    fn script_close_tag_is_escaped() {
        let mut fig = Figure {
            data: vec![],
            layout: Layout {
                title: Title {
                    text: "</script>".into(),
                },
                xaxis: Axis {
                    title: Title { text: "x".into() },
                },
                yaxis: Axis {
                    title: Title { text: "y".into() },
                },
            },
        };
        let html = fig.to_html().unwrap();
        assert_eq!(html.matches("</script>").count(), 2);

        fig.layout.title.text = "a & b".into();
        assert!(fig.to_html().unwrap().contains("<title>a &amp; b</title>"));
    }
}
