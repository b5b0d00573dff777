use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use plotly::common::color::NamedColor;
use plotly::common::{Anchor, DashType, Font, HoverInfo, Marker, Mode, Visible};
use plotly::layout::update_menu::{Button, ButtonMethod, UpdateMenu, UpdateMenuDirection};
use plotly::layout::{Annotation, Axis, Shape, ShapeLine, ShapeType};
use plotly::{Layout, Plot, Scatter};
use polars::prelude::*;
use polars::sql::SQLContext;
use serde_json::json;
use tracing::{debug, info};

use crate::df_utils::{distinct_values, f64_values, filter_equal, string_values};
use crate::error::PhewasError;
use crate::plot_utils::write_plot_html;
use crate::qc::{check_positive, check_range_f64};
use crate::schema::{TableSchema, unique_in_order};
use crate::types::{ALL_OPTION, NEG_LOG10_P, PreparedTable, Selection};

/// Plotly's default qualitative colorway, assigned to color groups in order.
const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const MISSING_GROUP: &str = "NA";
const QUERY_TABLE: &str = "phewas";

#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub x_col: String,
    pub y_col: String,
    pub color_col: String,
    pub filter_col: String,
    pub hover_cols: Vec<String>,
    /// Significance threshold drawn as a dashed line at `-log10(threshold)`.
    pub threshold: f64,
    /// SQL predicate applied once to the whole table, e.g. `"P-value" < 0.05`.
    pub query: Option<String>,
    pub title: String,
    pub width: usize,
    pub height: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            x_col: "trait_reported".to_string(),
            y_col: NEG_LOG10_P.to_string(),
            color_col: "trait_category".to_string(),
            filter_col: "program_name".to_string(),
            hover_cols: vec![
                "Term".to_string(),
                "P-value".to_string(),
                "Genes".to_string(),
                "study_id".to_string(),
            ],
            threshold: 0.05,
            query: None,
            title: "PheWAS".to_string(),
            width: 1200,
            height: 600,
        }
    }
}

impl PlotConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        check_range_f64(self.threshold, f64::MIN_POSITIVE, 1.0, true, "threshold")?;
        check_positive(self.width, "width")?;
        check_positive(self.height, "height")?;
        Ok(())
    }

    fn required_columns(&self) -> Vec<String> {
        let mut cols = vec![
            self.x_col.clone(),
            self.y_col.clone(),
            self.color_col.clone(),
            self.filter_col.clone(),
        ];
        cols.extend(self.hover_cols.iter().cloned());
        unique_in_order(cols)
    }
}

/// Dropdown state over a prepared table.
///
/// The row-filter query is applied once on construction; afterwards the
/// selection is the only thing that changes, and every change re-renders the
/// whole plot.
#[derive(Debug, Clone)]
pub struct PhewasView {
    config: PlotConfig,
    data: DataFrame,
    options: Vec<String>,
    selection: Selection,
}

impl PhewasView {
    pub fn new(table: &PreparedTable, config: PlotConfig) -> Result<Self> {
        config.validate()?;
        TableSchema::new("prepared", config.required_columns().as_slice()).validate(&table.df)?;

        let data = match config.query.as_deref() {
            Some(query) => apply_query(&table.df, query)?,
            None => table.df.clone(),
        };
        debug!("{} of {} rows pass the query", data.height(), table.height());

        let mut options = vec![ALL_OPTION.to_string()];
        options.extend(distinct_values(&data, &config.filter_col)?);

        Ok(Self {
            config,
            data,
            options,
            selection: Selection::All,
        })
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Query-filtered rows, before any dropdown selection.
    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn filtered(&self) -> Result<DataFrame> {
        filtered_view(&self.data, &self.config.filter_col, &self.selection)
    }

    pub fn current_plot(&self) -> Result<Plot> {
        render(&self.config, &self.data, &self.selection)
    }

    /// Switches to `option` (one of [`PhewasView::options`]) and redraws.
    pub fn select(&mut self, option: &str) -> Result<Plot> {
        if !self.options.iter().any(|o| o == option) {
            return Err(PhewasError::UnknownSelection {
                value: option.to_string(),
                options: self.options.clone(),
            }
            .into());
        }
        self.selection = Selection::from_option(option);
        info!("Selected {}", self.selection.label());
        self.current_plot()
    }

    /// One figure holding the traces of every option, with a plotly dropdown
    /// that toggles which option's traces are visible.
    pub fn dropdown_plot(&self) -> Result<Plot> {
        let colors = color_map(&self.config, &self.data)?;
        let mut plot = Plot::new();
        let mut spans = Vec::with_capacity(self.options.len());
        let mut total = 0usize;

        for (idx, option) in self.options.iter().enumerate() {
            let selection = Selection::from_option(option);
            let view = filtered_view(&self.data, &self.config.filter_col, &selection)?;
            let traces = group_traces(&self.config, &view, &colors)?;
            spans.push((total, traces.len()));
            total += traces.len();
            let visible = if idx == 0 { Visible::True } else { Visible::False };
            for trace in traces {
                plot.add_trace(trace.visible(visible.clone()));
            }
        }

        let buttons = self
            .options
            .iter()
            .zip(&spans)
            .map(|(option, (start, len))| {
                let visible: Vec<bool> = (0..total)
                    .map(|i| i >= *start && i < start + len)
                    .collect();
                let selection = Selection::from_option(option);
                Button::new()
                    .label(option.clone())
                    .method(ButtonMethod::Update)
                    .args(json!([
                        { "visible": visible },
                        { "title": { "text": plot_title(&self.config, &selection) } }
                    ]))
            })
            .collect::<Vec<_>>();

        let menu = UpdateMenu::new()
            .buttons(buttons)
            .direction(UpdateMenuDirection::Down)
            .show_active(true)
            .x(0.0)
            .y(1.15);

        let layout = base_layout(&self.config, &Selection::All).update_menus(vec![menu]);
        plot.set_layout(layout);
        Ok(plot)
    }
}

/// Builds the plot for `selection` from the query-filtered `data`.
///
/// Colors are assigned from the color groups of `data`, so a group keeps its
/// color whatever is selected.
pub fn render(config: &PlotConfig, data: &DataFrame, selection: &Selection) -> Result<Plot> {
    let colors = color_map(config, data)?;
    let view = filtered_view(data, &config.filter_col, selection)?;
    let mut plot = Plot::new();
    for trace in group_traces(config, &view, &colors)? {
        plot.add_trace(trace);
    }
    plot.set_layout(base_layout(config, selection));
    Ok(plot)
}

/// Writes the dropdown plot for `table` as a standalone HTML page.
pub fn plot_interactive_phewas(
    table: &PreparedTable,
    config: &PlotConfig,
    path: &Path,
) -> Result<PhewasView> {
    let view = PhewasView::new(table, config.clone())?;
    let plot = view.dropdown_plot()?;
    write_plot_html(&plot, path)?;
    info!(
        "Wrote PheWAS plot with {} dropdown options to {}",
        view.options().len(),
        path.display()
    );
    Ok(view)
}

pub fn filtered_view(data: &DataFrame, filter_col: &str, selection: &Selection) -> Result<DataFrame> {
    match selection {
        Selection::All => Ok(data.clone()),
        Selection::Value(value) => filter_equal(data, filter_col, value),
    }
}

pub fn apply_query(df: &DataFrame, query: &str) -> Result<DataFrame> {
    let mut ctx = SQLContext::new();
    ctx.register(QUERY_TABLE, df.clone().lazy());
    let filtered = ctx
        .execute(&format!("SELECT * FROM {QUERY_TABLE} WHERE {query}"))
        .with_context(|| format!("parse query {query:?}"))?
        .collect()
        .with_context(|| format!("apply query {query:?}"))?;
    Ok(filtered)
}

/// Significance level on the score axis.
pub fn threshold_score(threshold: f64) -> f64 {
    -threshold.log10()
}

fn plot_title(config: &PlotConfig, selection: &Selection) -> String {
    format!("{} ({})", config.title, selection.label())
}

fn color_map(config: &PlotConfig, data: &DataFrame) -> Result<HashMap<String, &'static str>> {
    let mut groups = distinct_values(data, &config.color_col)?;
    groups.push(MISSING_GROUP.to_string());
    Ok(groups
        .into_iter()
        .enumerate()
        .map(|(idx, group)| (group, PALETTE[idx % PALETTE.len()]))
        .collect())
}

fn group_traces(
    config: &PlotConfig,
    df: &DataFrame,
    colors: &HashMap<String, &'static str>,
) -> Result<Vec<Box<Scatter<String, f64>>>> {
    let xs = string_values(df, &config.x_col)?;
    let ys = f64_values(df, &config.y_col)?;
    let groups = string_values(df, &config.color_col)?;
    let hover = hover_texts(config, df, &xs, &ys)?;

    let mut order: Vec<String> = Vec::new();
    let mut rows: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, group) in groups.iter().enumerate() {
        let key = group.clone().unwrap_or_else(|| MISSING_GROUP.to_string());
        rows.entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(idx);
    }

    let traces = order
        .into_iter()
        .map(|group| {
            let idxs = &rows[&group];
            let x: Vec<String> = idxs
                .iter()
                .map(|&i| xs[i].clone().unwrap_or_default())
                .collect();
            let y: Vec<f64> = idxs.iter().map(|&i| ys[i].unwrap_or(f64::NAN)).collect();
            let text: Vec<String> = idxs.iter().map(|&i| hover[i].clone()).collect();
            let color = colors.get(&group).copied().unwrap_or(PALETTE[0]);
            Scatter::new(x, y)
                .mode(Mode::Markers)
                .name(group.clone())
                .legend_group(group)
                .marker(Marker::new().color(color).size(8))
                .hover_text_array(text)
                .hover_info(HoverInfo::Text)
        })
        .collect();
    Ok(traces)
}

fn hover_texts(
    config: &PlotConfig,
    df: &DataFrame,
    xs: &[Option<String>],
    ys: &[Option<f64>],
) -> Result<Vec<String>> {
    let extra: Vec<(&str, Vec<Option<String>>)> = config
        .hover_cols
        .iter()
        .filter(|c| **c != config.x_col && **c != config.y_col)
        .map(|c| Ok((c.as_str(), string_values(df, c)?)))
        .collect::<Result<_>>()?;

    Ok((0..df.height())
        .map(|i| {
            let mut lines = vec![
                format!("{}: {}", config.x_col, xs[i].as_deref().unwrap_or(MISSING_GROUP)),
                match ys[i] {
                    Some(y) => format!("{}: {y:.3}", config.y_col),
                    None => format!("{}: {MISSING_GROUP}", config.y_col),
                },
            ];
            for (name, values) in &extra {
                lines.push(format!(
                    "{name}: {}",
                    values[i].as_deref().unwrap_or(MISSING_GROUP)
                ));
            }
            lines.join("<br>")
        })
        .collect())
}

fn base_layout(config: &PlotConfig, selection: &Selection) -> Layout {
    let line_y = threshold_score(config.threshold);
    let threshold_line = Shape::new()
        .shape_type(ShapeType::Line)
        .x_ref("paper")
        .x0(0.0)
        .x1(1.0)
        .y_ref("y")
        .y0(line_y)
        .y1(line_y)
        .line(
            ShapeLine::new()
                .color(NamedColor::Red)
                .width(1.5)
                .dash(DashType::Dash),
        );
    let threshold_label = Annotation::new()
        .x_ref("paper")
        .x(1.0)
        .y_ref("y")
        .y(line_y)
        .x_anchor(Anchor::Right)
        .y_anchor(Anchor::Bottom)
        .show_arrow(false)
        .text(format!("p = {}", config.threshold))
        .font(Font::new().color(NamedColor::Red));

    Layout::new()
        .title(plot_title(config, selection))
        .width(config.width)
        .height(config.height)
        .x_axis(
            Axis::new()
                .title(config.x_col.clone())
                .tick_font(Font::new().size(8)),
        )
        .y_axis(Axis::new().title(config.y_col.clone()).tick_format(".1f"))
        .shapes(vec![threshold_line])
        .annotations(vec![threshold_label])
}
