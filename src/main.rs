mod cell;
mod error;
mod extract;
mod init;
mod model;
mod report;
mod template;
#[cfg(test)]
mod testutil;

use anyhow::{Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::{model::RunContext, template::Template};

#[derive(Parser, Debug)]
#[command(author, version, about = "Equipment discharge alert report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the alert report from a monthly discharge workbook
    Report {
        input: PathBuf,

        /// Reference hour (0-23); defaults to the current hour
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=23))]
        hour: Option<u32>,

        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Layout template (TOML); see `init`
        #[arg(short, long)]
        template: Option<PathBuf>,
    },
    /// Write the default layout template
    Init {
        #[arg(default_value = "template.toml")]
        filename: String,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("descarga=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            hour,
            output_dir,
            template,
        } => {
            let template = match template {
                Some(path) => Template::load(path)?,
                None => Template::default(),
            };
            let output = run_report(&input, hour, &output_dir, &template)?;
            println!("Report saved: {}", output.display());
        }
        Commands::Init { filename } => {
            init::init_template(&filename)?;
        }
    }
    Ok(())
}

fn run_report(
    input: &Path,
    hour: Option<u32>,
    output_dir: &Path,
    template: &Template,
) -> Result<PathBuf> {
    if !is_xlsx(input) {
        bail!("Formato inválido. Envie um arquivo .xlsx");
    }
    let ctx = RunContext::new(Local::now().naive_local(), hour);
    let outcomes = extract::extract_workbook(input, &ctx, template)?;
    let records = extract::collect_records(outcomes);
    report::generate_report(&records, input, ctx.now, output_dir)
}

fn is_xlsx(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "xlsx")
}
