use std::process::ExitCode;
use std::time::Instant;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use nfz_icd10_explorer::cache::CachedPipeline;
use nfz_icd10_explorer::config::{ConfigLoader, ResolvedConfig};
use nfz_icd10_explorer::domain::{Limit, QueryParams, SearchTerm, Year};
use nfz_icd10_explorer::error::ExplorerError;
use nfz_icd10_explorer::export;
use nfz_icd10_explorer::nfz::NfzHttpClient;
use nfz_icd10_explorer::output::{JsonOutput, OutputMode};
use nfz_icd10_explorer::pipeline::{FetchOutcome, ProgressEvent, ProgressSink};
use nfz_icd10_explorer::session::FilterMode;
use nfz_icd10_explorer::tui::Dashboard;

#[derive(Parser)]
#[command(name = "nfz-icd10")]
#[command(about = "Explore ICD-10 disease statistics from the Polish NFZ JGP API")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the three-stage fetch once and print or export the result")]
    Fetch(FetchArgs),
}

#[derive(Args)]
struct FetchArgs {
    /// Fragment of a benefit name, e.g. "rozrodcz".
    term: Option<String>,

    #[arg(long)]
    year: Option<u16>,

    #[arg(long)]
    limit: Option<u16>,

    #[arg(long)]
    filter_code: Option<String>,

    #[arg(long)]
    filter_name: Option<String>,

    #[arg(long)]
    csv: bool,

    #[arg(long)]
    xlsx: bool,

    #[arg(long)]
    errors_csv: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(explorer) = report.downcast_ref::<ExplorerError>() {
            return ExitCode::from(map_exit_code(explorer));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ExplorerError) -> u8 {
    match error {
        ExplorerError::EmptySearchTerm
        | ExplorerError::YearOutOfRange(_)
        | ExplorerError::LimitOutOfRange(_)
        | ExplorerError::ConfigRead(_)
        | ExplorerError::ConfigParse(_) => 2,
        ExplorerError::NfzHttp(_) | ExplorerError::NfzStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };
    let resolved = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;

    match cli.command {
        Some(Commands::Fetch(args)) => run_fetch(args, resolved, output_mode),
        None => match output_mode {
            OutputMode::Interactive => {
                let client = NfzHttpClient::with_base_url(&resolved.base_url).into_diagnostic()?;
                let pipeline = CachedPipeline::new(client);
                Dashboard::new(pipeline, &resolved, FilterMode::default()).run()
            }
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `nfz-icd10 fetch --help`)",
            )),
        },
    }
}

fn run_fetch(
    args: FetchArgs,
    resolved: ResolvedConfig,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let params = QueryParams {
        term: match args.term {
            Some(value) => value.parse::<SearchTerm>().into_diagnostic()?,
            None => resolved.term,
        },
        year: match args.year {
            Some(value) => Year::new(value).into_diagnostic()?,
            None => resolved.year,
        },
        limit: match args.limit {
            Some(value) => Limit::new(value).into_diagnostic()?,
            None => resolved.limit,
        },
    };

    let client = NfzHttpClient::with_base_url(&resolved.base_url).into_diagnostic()?;
    let pipeline = CachedPipeline::new(client);

    let start = Instant::now();
    let outcome = match output_mode {
        OutputMode::NonInteractive => pipeline.fetch(&params, &JsonOutput),
        OutputMode::Interactive => pipeline.fetch(&params, &StderrProgress),
    };
    let runtime = start.elapsed();

    let filtered = apply_filters(&outcome, args.filter_code.as_deref(), args.filter_name.as_deref());

    let mut written = Vec::new();
    if args.csv {
        let path = Utf8PathBuf::from(export::disease_csv_name(&params.term, params.year));
        let bytes = export::disease_csv_bytes(&filtered.diseases).into_diagnostic()?;
        export::write_bytes(&path, &bytes).into_diagnostic()?;
        written.push(path);
    }
    if args.xlsx {
        let xlsx_path = Utf8PathBuf::from(export::disease_xlsx_name(&params.term, params.year));
        let csv_path = Utf8PathBuf::from(export::disease_csv_name(&params.term, params.year));
        let path = export::write_spreadsheet_or_csv(&filtered.diseases, &xlsx_path, &csv_path)
            .into_diagnostic()?;
        written.push(path);
    }
    if args.errors_csv {
        let path = Utf8PathBuf::from(export::errors_csv_name(&params.term, params.year));
        let bytes = export::error_csv_bytes(&filtered.errors).into_diagnostic()?;
        export::write_bytes(&path, &bytes).into_diagnostic()?;
        written.push(path);
    }

    match output_mode {
        OutputMode::NonInteractive => {
            JsonOutput::print_outcome(&filtered).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            print_fetch_summary(&params, &filtered, runtime.as_secs_f64(), &written);
        }
    }
    Ok(())
}

fn apply_filters(
    outcome: &FetchOutcome,
    code: Option<&str>,
    name: Option<&str>,
) -> FetchOutcome {
    let diseases = outcome
        .diseases
        .filter_code_contains(code.unwrap_or(""))
        .filter_name_contains(name.unwrap_or(""));
    FetchOutcome {
        diseases,
        errors: outcome.errors.clone(),
        fetched_at: outcome.fetched_at.clone(),
    }
}

fn print_fetch_summary(
    params: &QueryParams,
    outcome: &FetchOutcome,
    seconds: f64,
    written: &[Utf8PathBuf],
) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!(
        "{cyan}NFZ ICD-10 statistics for benefit \"{}\" in {}{reset}",
        params.term, params.year
    );
    println!(
        "{green}{} ICD-10 rows fetched in {seconds:.1} s{reset}",
        outcome.diseases.len()
    );
    if outcome.errors.is_empty() {
        println!("{green}no errors{reset}");
    } else {
        println!(
            "{yellow}{} errors (re-run with --errors-csv for details){reset}",
            outcome.errors.len()
        );
    }
    for path in written {
        println!("{cyan}saved {path}{reset}");
    }
}

struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn event(&self, event: ProgressEvent) {
        match event.fraction {
            Some(fraction) => eprintln!("[{:>3.0}%] {}", fraction * 100.0, event.message),
            None => eprintln!("       {}", event.message),
        }
    }
}
