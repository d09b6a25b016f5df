//! Command-line interface for the extractor.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{parse_date, ExtractorOptions};
use crate::error::Result;
use crate::extractor::{get_echr, get_echr_extra, get_nodes_edges};
use crate::init_logging;

/// ECHR Extractor - Extract case law data from the European Court of Human Rights (HUDOC).
#[derive(Parser)]
#[command(name = "echr-extractor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract ECHR metadata.
    Extract(ExtractArgs),

    /// Extract ECHR metadata and full text.
    ExtractFull {
        #[command(flatten)]
        args: ExtractArgs,

        /// Number of parallel full-text downloads (default: 10)
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Generate nodes and edges for network analysis.
    Network {
        /// Metadata CSV produced by `extract`
        #[arg(long)]
        metadata_path: PathBuf,

        /// Don't save files, only print a summary
        #[arg(long)]
        no_save: bool,

        /// Output directory (default: data)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show progress information
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Options shared by the extraction commands.
#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Offset of the first case to download
    #[arg(long, default_value_t = 0)]
    pub start_id: u32,

    /// Offset at which to stop downloading
    #[arg(long)]
    pub end_id: Option<u32>,

    /// Maximum number of cases to download
    #[arg(long)]
    pub count: Option<usize>,

    /// Start publication date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// End publication date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Language to download; repeat for several (default: ENG)
    #[arg(long = "language")]
    pub languages: Vec<String>,

    /// Comma-separated HUDOC fields to select
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// HUDOC search URL whose filters are applied
    #[arg(long)]
    pub link: Option<String>,

    /// Raw HUDOC query fragment
    #[arg(long)]
    pub query: Option<String>,

    /// Show progress information
    #[arg(short, long)]
    pub verbose: bool,

    /// Don't save files, only print a summary
    #[arg(long)]
    pub no_save: bool,

    /// Output directory (default: data)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ExtractArgs {
    /// Convert parsed arguments into extraction options.
    pub fn to_options(&self) -> Result<ExtractorOptions> {
        let mut options = ExtractorOptions::from_env()
            .with_start_id(self.start_id)
            .with_fields(self.fields.iter().cloned())
            .with_verbose(self.verbose)
            .with_save_file(!self.no_save);

        if let Some(output) = &self.output {
            options = options.with_output_dir(output.clone());
        }
        if let Some(end_id) = self.end_id {
            options = options.with_end_id(end_id);
        }
        if let Some(count) = self.count {
            options = options.with_count(count);
        }
        if let Some(date) = self.start_date.as_deref() {
            options = options.with_start_date(parse_date(date)?);
        }
        if let Some(date) = self.end_date.as_deref() {
            options = options.with_end_date(parse_date(date)?);
        }
        if !self.languages.is_empty() {
            options = options.with_languages(self.languages.iter().map(|l| l.to_uppercase()));
        }
        if let Some(link) = &self.link {
            options = options.with_link(link.clone());
        }
        if let Some(query) = &self.query {
            options = options.with_query_payload(query.clone());
        }

        options.validate()?;
        Ok(options)
    }
}

/// Parse the command line and run it.
pub async fn run() -> Result<()> {
    run_with(Cli::parse()).await
}

/// Run an already parsed command line.
pub async fn run_with(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract(args) => {
            init_logging(args.verbose);
            extract_command(&args.to_options()?).await
        }
        Commands::ExtractFull { args, threads } => {
            init_logging(args.verbose);
            let mut options = args.to_options()?;
            if let Some(threads) = threads {
                options = options.with_threads(threads);
                options.validate()?;
            }
            extract_full_command(&options).await
        }
        Commands::Network {
            metadata_path,
            no_save,
            output,
            verbose,
        } => {
            init_logging(verbose);
            let output = output.unwrap_or_else(|| ExtractorOptions::from_env().output_dir);
            network_command(&metadata_path, !no_save, &output)
        }
    }
}

async fn extract_command(options: &ExtractorOptions) -> Result<()> {
    println!("{}", style("Downloading ECHR metadata").bold());

    let pb = spinner("Querying HUDOC...");
    let result = get_echr(options).await;
    pb.finish_and_clear();
    let cases = result?;

    println!("Extracted {} cases", style(cases.len()).green().bold());
    print_saved_location(options);
    Ok(())
}

async fn extract_full_command(options: &ExtractorOptions) -> Result<()> {
    println!("{}", style("Downloading ECHR metadata and full text").bold());

    let pb = spinner("Querying HUDOC and downloading documents...");
    let result = get_echr_extra(options).await;
    pb.finish_and_clear();
    let (_, full_text_cases) = result?;

    let missing = full_text_cases
        .iter()
        .filter(|c| c.full_text.is_empty())
        .count();
    println!(
        "Extracted {} cases with full text",
        style(full_text_cases.len()).green().bold()
    );
    if missing > 0 {
        println!("  Missing full text: {}", style(missing).yellow().bold());
    }
    print_saved_location(options);
    Ok(())
}

fn network_command(metadata_path: &std::path::Path, save: bool, output: &std::path::Path) -> Result<()> {
    let (nodes, edges) = get_nodes_edges(None, Some(metadata_path), save, output)?;

    println!(
        "Generated {} nodes and {} edges",
        style(nodes.len()).green().bold(),
        style(edges.len()).green().bold()
    );
    if save {
        println!("{} {}", style("Saved to:").green().bold(), output.display());
    }
    Ok(())
}

fn print_saved_location(options: &ExtractorOptions) {
    if options.save_file {
        println!(
            "{} {}",
            style("Saved to:").green().bold(),
            options.output_dir.display()
        );
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
