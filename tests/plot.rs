use std::collections::HashSet;

use polars::prelude::*;
use serde_json::Value;

use phewas::df_utils::string_values;
use phewas::error::PhewasError;
use phewas::plot::{PhewasView, PlotConfig, plot_interactive_phewas, render, threshold_score};
use phewas::prepare::{PrepareConfig, process_enrichment_data};
use phewas::types::{ALL_OPTION, PreparedTable, Selection};

fn prepared() -> PreparedTable {
    let enrichment = df!(
        "Term" => ["A", "B", "C", "A", "D"],
        "P-value" => [1e-6, 0.02, 0.3, 0.0, 0.04],
        "Genes" => ["g1", "g2", "g3", "g4", "g5"],
        "program_name" => ["p1", "p2", "p1", "p2", "p1"]
    )
    .expect("enrichment frame");
    let metadata = df!(
        "trait_efos" => ["A", "B", "C", "D"],
        "trait_category" => ["blood", "immune", "blood", "metabolic"],
        "trait_reported" => ["Height", "Asthma", "Platelets", "BMI"]
    )
    .expect("metadata frame");
    let config = PrepareConfig {
        annotation_cols: vec!["trait_reported".to_string(), "Genes".to_string()],
        ..Default::default()
    };
    process_enrichment_data(&enrichment.into(), &metadata.into(), &config).expect("prepare")
}

fn plot_config() -> PlotConfig {
    PlotConfig {
        hover_cols: vec!["Term".to_string(), "Genes".to_string()],
        ..Default::default()
    }
}

fn plot_json(plot: &plotly::Plot) -> Value {
    serde_json::from_str(&plot.to_json()).expect("plot json")
}

#[test]
fn options_start_with_all_then_distinct_values() {
    let view = PhewasView::new(&prepared(), plot_config()).expect("view");
    let options = view.options();
    assert_eq!(options[0], ALL_OPTION);
    assert_eq!(options.len(), 3);
    let rest: HashSet<&str> = options[1..].iter().map(|s| s.as_str()).collect();
    assert_eq!(rest, HashSet::from(["p1", "p2"]));
    assert_eq!(view.selection(), &Selection::All);
}

#[test]
fn selection_filters_exactly_matching_rows() {
    let table = prepared();
    let mut view = PhewasView::new(&table, plot_config()).expect("view");
    assert_eq!(view.filtered().expect("all").height(), table.height());

    view.select("p1").expect("select p1");
    assert_eq!(view.selection(), &Selection::Value("p1".to_string()));
    let filtered = view.filtered().expect("p1");
    assert_eq!(filtered.height(), 3);
    let programs = string_values(&filtered, "program_name").expect("programs");
    assert!(programs.iter().all(|p| p.as_deref() == Some("p1")));

    view.select(ALL_OPTION).expect("select all");
    assert_eq!(view.filtered().expect("all").height(), table.height());
}

#[test]
fn unknown_selection_is_rejected() {
    let mut view = PhewasView::new(&prepared(), plot_config()).expect("view");
    let err = view.select("p9").err().expect("p9 is not an option");
    assert!(matches!(
        err.downcast_ref::<PhewasError>(),
        Some(PhewasError::UnknownSelection { .. })
    ));
    assert_eq!(view.selection(), &Selection::All);
}

#[test]
fn query_is_applied_before_options() {
    let config = PlotConfig {
        query: Some("\"P-value\" < 0.03".to_string()),
        ..plot_config()
    };
    let view = PhewasView::new(&prepared(), config).expect("view");
    // A (twice, once from a zero p-value) and B survive.
    assert_eq!(view.data().height(), 3);
    let mut view = view;
    view.select("p2").expect("select p2");
    assert_eq!(view.filtered().expect("p2").height(), 2);
}

#[test]
fn render_draws_groups_threshold_and_axes() {
    let view = PhewasView::new(&prepared(), plot_config()).expect("view");
    let json = plot_json(&view.current_plot().expect("plot"));

    let traces = json["data"].as_array().expect("traces");
    let names: HashSet<&str> = traces
        .iter()
        .map(|t| t["name"].as_str().expect("trace name"))
        .collect();
    assert_eq!(names, HashSet::from(["blood", "immune", "metabolic"]));
    let points: usize = traces
        .iter()
        .map(|t| t["x"].as_array().expect("x").len())
        .sum();
    assert_eq!(points, 5);

    let layout = &json["layout"];
    let shape = &layout["shapes"][0];
    let expected = threshold_score(0.05);
    assert!((shape["y0"].as_f64().expect("y0") - expected).abs() < 1e-12);
    assert!((shape["y1"].as_f64().expect("y1") - expected).abs() < 1e-12);
    assert_eq!(shape["line"]["dash"], "dash");
    assert!(
        layout["annotations"][0]["text"]
            .as_str()
            .expect("label")
            .contains("0.05")
    );
    assert_eq!(layout["yaxis"]["tickformat"], ".1f");
    assert_eq!(layout["width"], 1200);
    assert_eq!(layout["height"], 600);
}

#[test]
fn group_colors_do_not_depend_on_selection() {
    let config = plot_config();
    let view = PhewasView::new(&prepared(), config.clone()).expect("view");
    let color_of = |selection: &Selection, group: &str| -> Value {
        let json = plot_json(&render(&config, view.data(), selection).expect("render"));
        json["data"]
            .as_array()
            .expect("traces")
            .iter()
            .find(|t| t["name"] == group)
            .map(|t| t["marker"]["color"].clone())
            .expect("group trace")
    };
    assert_eq!(
        color_of(&Selection::All, "metabolic"),
        color_of(&Selection::Value("p1".to_string()), "metabolic")
    );
}

#[test]
fn dropdown_has_one_button_per_option() {
    let view = PhewasView::new(&prepared(), plot_config()).expect("view");
    let json = plot_json(&view.dropdown_plot().expect("dropdown"));

    let buttons = json["layout"]["updatemenus"][0]["buttons"]
        .as_array()
        .expect("buttons");
    assert_eq!(buttons.len(), view.options().len());
    assert_eq!(buttons[0]["label"], ALL_OPTION);

    let total = json["data"].as_array().expect("traces").len();
    for button in buttons {
        let visible = button["args"][0]["visible"].as_array().expect("visible");
        assert_eq!(visible.len(), total);
        assert!(visible.iter().any(|v| v.as_bool() == Some(true)));
    }
}

#[test]
fn writes_interactive_html() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("phewas.html");
    let view = plot_interactive_phewas(&prepared(), &plot_config(), &path).expect("write");
    assert_eq!(view.options().len(), 3);
    let html = std::fs::read_to_string(&path).expect("read html");
    assert!(html.contains("updatemenus"));
}

#[test]
fn bad_threshold_and_missing_columns_fail_fast() {
    let config = PlotConfig {
        threshold: 0.0,
        ..plot_config()
    };
    let err = PhewasView::new(&prepared(), config).expect_err("threshold 0");
    assert!(matches!(
        err.downcast_ref::<PhewasError>(),
        Some(PhewasError::InvalidArgument(_))
    ));

    let config = PlotConfig {
        filter_col: "tissue".to_string(),
        ..plot_config()
    };
    let err = PhewasView::new(&prepared(), config).expect_err("tissue is absent");
    assert!(matches!(
        err.downcast_ref::<PhewasError>(),
        Some(PhewasError::MissingColumn(_))
    ));
}

#[test]
fn html_output_creates_missing_folders() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("deeper").join("phewas.html");
    plot_interactive_phewas(&prepared(), &plot_config(), &path).expect("write nested");
    assert!(path.is_file());
}

#[test]
fn html_output_to_unwritable_path_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    // The target is an existing directory, so the file cannot be created.
    let result = plot_interactive_phewas(&prepared(), &plot_config(), dir.path());
    assert!(result.is_err());
}
