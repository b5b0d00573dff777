use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use phewas::logging::{init_tracing, log_line, warn_line};
use phewas::plot::{PhewasView, PlotConfig, plot_interactive_phewas};
use phewas::plot_utils::{
    ensure_parent_dir, ensure_plots_dir, plot_path, slug, write_plot_html,
};
use phewas::prepare::{PrepareConfig, process_enrichment_data};
use phewas::types::{NEG_LOG10_P, PreparedTable, TableSource};

#[derive(Parser)]
#[command(name = "phewas")]
#[command(about = "Enrichment x trait metadata PheWAS plots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct InputArgs {
    #[arg(long, required = true)]
    enrichment: PathBuf,
    #[arg(long, required = true)]
    metadata: PathBuf,
    #[arg(long, default_value = "Term")]
    enrichment_id_col: String,
    #[arg(long, default_value = "trait_efos")]
    metadata_id_col: String,
    #[arg(long, default_value = "P-value")]
    p_col: String,
    #[arg(long, default_value = "trait_category")]
    category_col: String,
    /// Program/grouping label column; pass an empty string to skip it.
    #[arg(long, default_value = "program_name")]
    program_col: String,
    #[arg(long, default_value = "trait_reported,Genes,study_id,pmid")]
    annotation_cols: String,
}

#[derive(Subcommand)]
enum Command {
    /// Join, deduplicate and score the inputs, then print the table.
    Prepare {
        #[command(flatten)]
        inputs: InputArgs,
        #[arg(long, default_value_t = 20)]
        head: usize,
    },
    /// Write the interactive PheWAS plot as HTML.
    Plot {
        #[command(flatten)]
        inputs: InputArgs,
        #[arg(long, default_value = "trait_reported")]
        x_col: String,
        #[arg(long, default_value = NEG_LOG10_P)]
        y_col: String,
        #[arg(long, default_value = "trait_category")]
        color_col: String,
        #[arg(long, default_value = "program_name")]
        filter_col: String,
        #[arg(long, default_value = "Term,P-value,Genes,study_id")]
        hover_cols: String,
        #[arg(long, default_value_t = 0.05)]
        threshold: f64,
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value = "PheWAS")]
        title: String,
        #[arg(long, default_value_t = 1200)]
        width: usize,
        #[arg(long, default_value_t = 600)]
        height: usize,
        /// Render a single dropdown option instead of the interactive page.
        #[arg(long)]
        select: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        log_name: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Prepare { inputs, head } => {
            let table = prepare(&inputs)?;
            println!("{}", table.df.head(Some(head)));
        }
        Command::Plot {
            inputs,
            x_col,
            y_col,
            color_col,
            filter_col,
            hover_cols,
            threshold,
            query,
            title,
            width,
            height,
            select,
            output,
            prefix,
            log_name,
        } => {
            let mut log = open_log_file(log_name.as_deref())?;
            log_line(
                log.as_mut(),
                &format!(
                    "Preparing {} against {}",
                    inputs.enrichment.display(),
                    inputs.metadata.display()
                ),
            )?;
            let table = prepare(&inputs)?;
            log_line(
                log.as_mut(),
                &format!("Prepared table has {} rows", table.height()),
            )?;
            if table.height() == 0 {
                warn_line(log.as_mut(), "No rows to plot; the plot will be empty.")?;
            }

            let config = PlotConfig {
                x_col,
                y_col,
                color_col,
                filter_col,
                hover_cols: split_string_list(&hover_cols),
                threshold,
                query,
                title,
                width,
                height,
            };

            match select {
                Some(option) => {
                    let name = format!("phewas_{}", slug(&option));
                    let path = resolve_output(output, prefix.as_deref(), &name)?;
                    let mut view = PhewasView::new(&table, config)?;
                    let plot = view.select(&option)?;
                    write_plot_html(&plot, &path)?;
                    log_line(
                        log.as_mut(),
                        &format!("Wrote {option} plot to {}", path.display()),
                    )?;
                }
                None => {
                    let path = resolve_output(output, prefix.as_deref(), "phewas")?;
                    let view = plot_interactive_phewas(&table, &config, &path)?;
                    log_line(
                        log.as_mut(),
                        &format!(
                            "Wrote plot with options [{}] to {}",
                            view.options().join(", "),
                            path.display()
                        ),
                    )?;
                }
            }
        }
    }

    Ok(())
}

fn prepare(inputs: &InputArgs) -> anyhow::Result<PreparedTable> {
    let program_col = Some(inputs.program_col.trim().to_string()).filter(|s| !s.is_empty());
    let config = PrepareConfig {
        enrichment_id_col: inputs.enrichment_id_col.clone(),
        metadata_id_col: inputs.metadata_id_col.clone(),
        p_col: inputs.p_col.clone(),
        category_col: inputs.category_col.clone(),
        program_col,
        annotation_cols: split_string_list(&inputs.annotation_cols),
    };
    process_enrichment_data(
        &TableSource::Path(inputs.enrichment.clone()),
        &TableSource::Path(inputs.metadata.clone()),
        &config,
    )
}

fn resolve_output(
    output: Option<PathBuf>,
    prefix: Option<&str>,
    name: &str,
) -> anyhow::Result<PathBuf> {
    match output {
        Some(path) => {
            ensure_parent_dir(&path)?;
            Ok(path)
        }
        None => {
            ensure_plots_dir()?;
            Ok(plot_path(prefix, name))
        }
    }
}

fn open_log_file(log_name: Option<&str>) -> anyhow::Result<Option<File>> {
    log_name
        .map(|name| {
            let path = format!("{name}.log");
            File::create(&path).with_context(|| format!("create log file {path}"))
        })
        .transpose()
}

fn split_string_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
