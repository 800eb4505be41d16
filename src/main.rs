use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use siterank::pipeline::{Analyzer, Diagnostics, Outcome};
use siterank::tokenizer::{Layout, SectionMode};
use siterank::{ComparisonInput, ComparisonResponse, Config, ReportSection};

mod render;

use render::Format;

/// siterank - Rank compared websites per page section and plan which parts to reuse
#[derive(Parser)]
#[command(name = "siterank")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = ".siterank.toml")]
    config: PathBuf,

    /// Quiet mode - suppress warnings
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a ranking report into sections
    Parse {
        #[command(flatten)]
        report: ReportArgs,

        /// Input URLs, used to show hostnames instead of source ids
        #[arg(short, long = "url")]
        urls: Vec<String>,
    },

    /// Print the implementation plan for a report
    Plan {
        #[command(flatten)]
        report: ReportArgs,

        /// Compared URLs, in the order they were submitted (2-3)
        #[arg(short, long = "url", required = true)]
        urls: Vec<String>,
    },

    /// Full comparison report: rankings, top performers, per-site suggestions and plan
    Report {
        #[command(flatten)]
        report: ReportArgs,

        /// Compared URLs, in the order they were submitted (2-3)
        #[arg(short, long = "url", required = true)]
        urls: Vec<String>,
    },

    /// Validate the URLs to compare
    Check {
        /// URLs to compare
        #[arg(short, long = "url", required = true)]
        urls: Vec<String>,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Comparison reply (JSON) or raw report text; "-" reads stdin
    file: PathBuf,

    /// Treat the file as raw report text even if it looks like JSON
    #[arg(long)]
    raw: bool,

    /// Keep sections with unknown names instead of skipping them
    #[arg(long)]
    permissive: bool,

    /// How sections are delimited in the report
    #[arg(long, value_enum)]
    layout: Option<Layout>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    sections: &'a [ReportSection],
    diagnostics: &'a Diagnostics,
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);
    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Parse { report, urls } => cmd_parse(&config, &report, &urls),
        Commands::Plan { report, urls } => cmd_plan(&config, &report, &urls, cli.quiet),
        Commands::Report { report, urls } => cmd_report(&config, &report, &urls, cli.quiet),
        Commands::Check { urls } => cmd_check(&urls, cli.quiet),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn analyzer_for(config: &Config, args: &ReportArgs) -> Analyzer {
    let mut options = config.analyze_options();
    if args.permissive {
        options.tokenizer.mode = SectionMode::Permissive;
    }
    if let Some(layout) = args.layout {
        options.tokenizer.layout = layout;
    }
    Analyzer::new(options)
}

/// Read the comparison reply. JSON bodies are decoded as the service's reply
/// envelope; anything else is taken as the bare report text.
fn load_response(path: &Path, raw: bool) -> Result<ComparisonResponse, Box<dyn std::error::Error>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?
    };

    if !raw && content.trim_start().starts_with('{') {
        Ok(ComparisonResponse::from_json(&content)?)
    } else {
        Ok(ComparisonResponse::from_raw(content))
    }
}

fn comparison_input(urls: &[String], quiet: bool) -> Result<ComparisonInput, Box<dyn std::error::Error>> {
    let input = ComparisonInput::from_form(urls)?;
    if input.mixed_domains() && !quiet {
        eprintln!(
            "{}: For best results, compare websites from the same domain",
            "warning".yellow().bold()
        );
    }
    Ok(input)
}

fn print_empty(format: Format) -> Result<(), Box<dyn std::error::Error>> {
    match render::structured(format, &Outcome::EmptyReport) {
        Some(out) => println!("{}", out?),
        None => println!("{}", "No analyzable data in report.".yellow()),
    }
    Ok(())
}

fn cmd_parse(config: &Config, args: &ReportArgs, urls: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let response = load_response(&args.file, args.raw)?;
    if response.rankings.trim().is_empty() {
        return Err(siterank::RequestError::MissingReport.into());
    }

    let analyzer = analyzer_for(config, args);
    let (sections, diagnostics) = analyzer.parse_report(&response.rankings);
    if sections.is_empty() {
        return print_empty(args.format);
    }

    if let Some(out) = render::structured(
        args.format,
        &ParseOutput {
            sections: &sections,
            diagnostics: &diagnostics,
        },
    ) {
        println!("{}", out?);
        return Ok(());
    }

    let urls: Vec<String> = urls.iter().map(|u| u.trim().to_string()).collect();
    print!("{}", render::sections_text(&sections, &diagnostics, &urls));
    Ok(())
}

fn cmd_plan(
    config: &Config,
    args: &ReportArgs,
    urls: &[String],
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = comparison_input(urls, quiet)?;
    let response = load_response(&args.file, args.raw)?;

    let analysis = match analyzer_for(config, args).analyze(&response.rankings, &input, &response.suggestions)? {
        Outcome::Analyzed(analysis) => analysis,
        Outcome::EmptyReport => return print_empty(args.format),
    };

    match render::structured(args.format, &analysis.plan) {
        Some(out) => println!("{}", out?),
        None => print!("{}", render::plan_text(&analysis.plan)),
    }
    Ok(())
}

fn cmd_report(
    config: &Config,
    args: &ReportArgs,
    urls: &[String],
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = comparison_input(urls, quiet)?;
    let response = load_response(&args.file, args.raw)?;

    let outcome = analyzer_for(config, args).analyze(&response.rankings, &input, &response.suggestions)?;

    if let Some(out) = render::structured(args.format, &outcome) {
        println!("{}", out?);
        return Ok(());
    }

    match outcome {
        Outcome::Analyzed(analysis) => print!("{}", render::report_text(&analysis, input.urls())),
        Outcome::EmptyReport => return print_empty(args.format),
    }
    Ok(())
}

fn cmd_check(urls: &[String], quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let input = comparison_input(urls, quiet)?;

    println!("{} {} URLs ready for comparison", "OK".green().bold(), input.len());
    for (source_id, url) in input.source_ids().zip(input.urls()) {
        let host = siterank::resolve_hostname(&source_id, input.urls())?;
        println!("  {}  {}  {}", source_id.dimmed(), host.cyan(), url);
    }
    Ok(())
}
