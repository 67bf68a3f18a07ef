use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dicom_deidentify::Anonymizer;
use dicom_deidentify::batch::anonymize_dir;
use dicom_deidentify::config::{DEFAULT_EXTENSION, DEFAULT_SEQUENCE_START, RunConfig};
use dicom_deidentify::config::allow_list::AllowList;
use dicom_deidentify::config::builder::RunConfigBuilder;
use dicom_deidentify::config::prefix::IdPrefix;
use dicom_deidentify::ledger::Ledger;
use dicom_deidentify::pipeline;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// De-identify DICOM files and keep a ledger of surrogate patient ids
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Show more verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stage, relabel and anonymize a directory of DICOM files
    Run(RunArgs),

    /// Build the ledger for a directory of DICOM files, without changing any file
    Ledger(LedgerArgs),

    /// Anonymize a single file, stdin ('-') or a directory, without relabeling
    Anonymize(AnonymizeArgs),

    /// Print the attributes that are kept as JSON
    AllowList,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON configuration file, individual options override its values
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Directory with the original DICOM files
    #[arg(short, long, value_name = "INPUT_DIR")]
    input: Option<PathBuf>,

    /// Directory for the relabeled files
    #[arg(short, long, value_name = "WORKING_DIR")]
    working: Option<PathBuf>,

    /// Directory for the anonymized files
    #[arg(short, long, value_name = "OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Ledger CSV file (default: 'patient_ids.csv' next to the working directory)
    #[arg(short, long, value_name = "LEDGER_FILE")]
    ledger: Option<PathBuf>,

    #[command(flatten)]
    ids: IdArgs,

    /// Set the Patient ID of each file to its file name before building the ledger
    #[arg(long)]
    stamp_file_names: bool,

    /// Write a JSON report of all files to this path
    #[arg(long, value_name = "REPORT_FILE")]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct IdArgs {
    /// Prefix of the surrogate ids (default: 'ANON')
    #[arg(short, long, env = "DCMDEID_PREFIX")]
    prefix: Option<String>,

    /// First sequence number (default: 1)
    #[arg(short, long)]
    start: Option<u32>,

    /// Extension of the files to process (default: 'dcm')
    #[arg(short, long)]
    extension: Option<String>,
}

#[derive(Args, Debug)]
struct LedgerArgs {
    /// Directory with the DICOM files
    #[arg(short, long, value_name = "DIR")]
    dir: PathBuf,

    /// Ledger CSV file ('-' for stdout)
    #[arg(short, long, value_name = "LEDGER_FILE", default_value = "-")]
    output: PathBuf,

    #[command(flatten)]
    ids: IdArgs,
}

#[derive(Args, Debug)]
struct AnonymizeArgs {
    /// Input file ('-' for stdin) or directory
    #[arg(short, long, value_name = "INPUT_PATH")]
    input: PathBuf,

    /// Output file ('-' for stdout) or directory
    #[arg(short, long, value_name = "OUTPUT_PATH")]
    output: PathBuf,

    /// Extension of the files to process in an input directory
    #[arg(short, long, default_value = DEFAULT_EXTENSION)]
    extension: String,
}

fn init_logging(verbose: bool) {
    // per-file failures are warnings and should show up by default
    let log_level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    let mut builder = Builder::from_default_env();
    builder
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "Error",
                Level::Warn => "Warning",
                Level::Info => "Info",
                Level::Debug => "Debug",
                Level::Trace => "Trace",
            };
            writeln!(buf, "{}: {}", level, record.args())
        })
        .filter(None, log_level);
    builder.init();
}

fn parse_prefix(prefix: &str) -> Result<IdPrefix> {
    match prefix.parse::<IdPrefix>() {
        Ok(prefix) => Ok(prefix),
        Err(e) => bail!(e),
    }
}

fn run_config(args: &RunArgs) -> Result<RunConfig> {
    let mut builder = match &args.config {
        Some(path) => RunConfigBuilder::from_config(&RunConfig::from_json_file(path)?),
        None => RunConfigBuilder::new(),
    };

    if let Some(input) = &args.input {
        builder = builder.input_dir(input);
    }
    if let Some(working) = &args.working {
        builder = builder.working_dir(working);
    }
    if let Some(output) = &args.output {
        builder = builder.output_dir(output);
    }
    if let Some(ledger) = &args.ledger {
        builder = builder.ledger_path(ledger);
    }
    if let Some(prefix) = &args.ids.prefix {
        builder = builder.prefix(parse_prefix(prefix)?);
    }
    if let Some(start) = args.ids.start {
        builder = builder.start(start);
    }
    if let Some(extension) = &args.ids.extension {
        builder = builder.extension(extension);
    }
    if args.stamp_file_names {
        builder = builder.stamp_file_names(true);
    }

    builder
        .build()
        .context("invalid configuration, input, working and output directories are required")
}

fn run(args: RunArgs) -> Result<()> {
    let config = run_config(&args)?;
    let report = pipeline::run(&config).context("de-identification run failed")?;

    if let Some(path) = &args.report {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    println!("{report}");
    Ok(())
}

fn ledger(args: LedgerArgs) -> Result<()> {
    let prefix = match &args.ids.prefix {
        Some(prefix) => parse_prefix(prefix)?,
        None => IdPrefix::default(),
    };
    let start = args.ids.start.unwrap_or(DEFAULT_SEQUENCE_START);
    let extension = args.ids.extension.as_deref().unwrap_or(DEFAULT_EXTENSION);

    let ledger = Ledger::from_dir(&args.dir, extension, &prefix, start)
        .with_context(|| format!("failed to build ledger for {}", args.dir.display()))?;

    if args.output == Path::new("-") {
        ledger.to_writer(io::stdout().lock())?;
    } else {
        ledger
            .write_csv(&args.output)
            .with_context(|| format!("failed to write {}", args.output.display()))?;
    }

    eprintln!("{} files in ledger", ledger.len());
    Ok(())
}

fn anonymize_stream(
    anonymizer: &Anonymizer,
    input_path: &Path,
    output_path: &Path,
) -> Result<()> {
    let input_src: Box<dyn Read> = if input_path == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(
            File::open(input_path)
                .with_context(|| format!("failed to open {}", input_path.display()))?,
        )
    };

    let result = anonymizer
        .anonymize(input_src)
        .with_context(|| format!("failed to anonymize {}", input_path.display()))?;

    if output_path == Path::new("-") {
        result.write(io::stdout().lock())?;
    } else {
        // an output directory keeps the input file name
        let output_file_path = match input_path.file_name() {
            Some(name) if output_path.is_dir() => output_path.join(name),
            _ => output_path.to_path_buf(),
        };
        let file = File::create(&output_file_path)
            .with_context(|| format!("failed to create {}", output_file_path.display()))?;
        result
            .write(file)
            .with_context(|| format!("failed to write {}", output_file_path.display()))?;
    }

    eprintln!("1 file anonymized");
    Ok(())
}

fn anonymize(args: AnonymizeArgs) -> Result<()> {
    let anonymizer = Anonymizer::default();

    // Input is stdin or a file
    if args.input == Path::new("-") || args.input.is_file() {
        return anonymize_stream(&anonymizer, &args.input, &args.output);
    }

    // Input is a directory
    if args.input.is_dir() {
        if args.output == Path::new("-") {
            bail!("output path should be a directory");
        }
        let report = anonymize_dir(&anonymizer, &args.input, &args.output, &args.extension)
            .with_context(|| format!("failed to anonymize {}", args.input.display()))?;
        println!(
            "{} of {} files anonymized, {} failed",
            report.succeeded(),
            report.outcomes().len(),
            report.failed()
        );
        return Ok(());
    }

    bail!("Input should either be a file, stdin ('-') or a directory");
}

fn allow_list() -> Result<()> {
    let json = serde_json::to_string_pretty(&AllowList::default())?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run(args) => run(args),
        Command::Ledger(args) => ledger(args),
        Command::Anonymize(args) => anonymize(args),
        Command::AllowList => allow_list(),
    }
}
