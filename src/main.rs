use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use course_visit_analytics::config::{self, Config, OutputFormat};
use course_visit_analytics::ingest::{self, ColumnAliases};
use course_visit_analytics::models::VisitRecord;
use course_visit_analytics::{analytics, logging, report};

#[derive(Parser)]
#[command(name = "course-visit-analytics")]
#[command(about = "Aggregate reports over a course visit log", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every report and write the result
    Report {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Activity span in days for the multi-course report
        #[arg(long)]
        window_days: Option<i64>,
        /// Rows per markdown section, 0 for all
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print course totals and top visitors
    Summary {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the first rows of the normalized visit log
    Preview {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    logging::init(&config.logging.level);

    let aliases = ColumnAliases::with_extra(&config.columns.aliases)
        .context("invalid column aliases in config")?;

    match cli.command {
        Commands::Report {
            csv,
            out,
            format,
            window_days,
            limit,
        } => {
            let window_days = window_days.unwrap_or(config.report.window_days);
            if window_days < 0 {
                anyhow::bail!("--window-days must be zero or positive");
            }
            let limit = limit.unwrap_or(config.report.limit);
            let format = format.unwrap_or(config.report.format);

            let records = load(&csv, &aliases)?;
            let reports = analytics::generate(records, window_days).await?;

            let rendered = match format {
                OutputFormat::Markdown => report::build_report(
                    &csv.display().to_string(),
                    window_days,
                    &reports,
                    limit,
                ),
                OutputFormat::Json => {
                    report::to_json(&reports).context("failed to serialize reports")?
                }
            };
            std::fs::write(&out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!(out = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
        Commands::Summary { csv, limit } => {
            let records = load(&csv, &aliases)?;
            let totals = analytics::total_visits_per_course(&records);

            if totals.is_empty() {
                println!("No visits found in {}.", csv.display());
                return Ok(());
            }

            println!("Courses by total visits:");
            for course in totals.iter().take(limit) {
                match &course.course_title {
                    Some(title) => println!(
                        "- {} ({}) {} visits",
                        course.course_code, title, course.total_visits
                    ),
                    None => println!("- {} {} visits", course.course_code, course.total_visits),
                }
            }

            println!();
            println!("Top visitor per course:");
            for top in analytics::top_visitor_per_course(&records).iter().take(limit) {
                println!(
                    "- {}: {} with {} visits",
                    top.course_code, top.user_name, top.visit_count
                );
            }
        }
        Commands::Preview { csv, rows } => {
            let records = load(&csv, &aliases)?;
            print!("{}", report::preview(&records, rows));
        }
    }

    Ok(())
}

fn load(csv: &Path, aliases: &ColumnAliases) -> anyhow::Result<Arc<[VisitRecord]>> {
    let records = ingest::read_visits(csv, aliases)
        .with_context(|| format!("failed to load visit log {}", csv.display()))?;
    Ok(records.into())
}
