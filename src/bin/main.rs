//! CLI tool for RAG Bench (ragbench)

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use colored::Colorize;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "ragbench")]
#[command(about = "RAG Bench: latency and GPU memory benchmarking for question-answering endpoints", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Ask every question once and record latency and GPU telemetry to CSV
    Run {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Endpoint URL (overrides the config file)
        #[arg(short, long)]
        url: Option<String>,

        /// Question file, one question per line (overrides the config file)
        #[arg(short, long)]
        questions: Option<PathBuf>,

        /// CSV output path (overrides the config file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Per-request timeout in seconds (default: wait forever)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Abort on the first connection failure instead of recording an error row
        #[arg(long)]
        fail_fast: bool,

        /// GPU index to sample
        #[arg(short, long)]
        device: Option<u32>,

        /// Do not write the JSON metadata sidecar
        #[arg(long)]
        no_metadata: bool,
    },
    /// Take one reading from both telemetry sources
    Probe {
        /// GPU index to sample
        #[arg(short, long, default_value_t = 0)]
        device: u32,

        /// nvidia-smi executable
        #[arg(long, default_value = ragbench::telemetry::DEFAULT_SMI_PROGRAM)]
        smi: String,

        /// Output format (json or text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Compare result files: LABEL=PATH or PATH (labeled by file name)
    Summarize {
        /// Result CSV files
        #[arg(required = true)]
        runs: Vec<String>,

        /// Output format (json or text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Print a sample configuration file
    Config,
}

#[cfg(feature = "cli")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            url,
            questions,
            output,
            timeout,
            fail_fast,
            device,
            no_metadata,
        } => {
            let mut bench_config = match config {
                Some(path) => ragbench::BenchConfig::from_toml_file(path)?,
                None => ragbench::BenchConfig::default(),
            };
            if let Some(url) = url {
                bench_config.server_url = url;
            }
            if let Some(path) = questions {
                bench_config.questions = ragbench::config::load_questions(path)?;
            }
            if let Some(output) = output {
                bench_config.output = output;
            }
            if timeout.is_some() {
                bench_config.request_timeout_secs = timeout;
            }
            if fail_fast {
                bench_config.fail_fast = true;
            }
            if let Some(device) = device {
                bench_config.device_index = device;
            }
            if no_metadata {
                bench_config.write_metadata = false;
            }
            handle_run(&bench_config)?;
        }

        Commands::Probe {
            device,
            smi,
            format,
        } => {
            handle_probe(device, &smi, &format)?;
        }

        Commands::Summarize { runs, format } => {
            handle_summarize(&runs, &format)?;
        }

        Commands::Config => {
            print!("{}", ragbench::BenchConfig::sample_toml());
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn handle_run(config: &ragbench::BenchConfig) -> Result<(), Box<dyn std::error::Error>> {
    use ragbench::{BenchmarkRunner, HttpEndpoint, ProbeSet};

    if config.questions.is_empty() {
        return Err("No questions to ask: the question list is empty".into());
    }

    println!("{}", "═══ RAG Benchmark ═══".cyan().bold());
    println!(
        "  {} {}",
        "Endpoint:".white().bold(),
        config.server_url.yellow()
    );
    println!(
        "  {} {}",
        "Questions:".white().bold(),
        config.questions.len().to_string().green()
    );
    println!(
        "  {} {}",
        "Timeout:".white().bold(),
        config
            .request_timeout_secs
            .map_or_else(|| "none".to_string(), |t| format!("{}s", t))
            .green()
    );
    println!();

    let endpoint = HttpEndpoint::new(config.server_url.clone(), config.request_timeout())?;
    let probes = ProbeSet::for_device(config.device_index, &config.smi_program);
    let runner = BenchmarkRunner::new(endpoint, probes).with_fail_fast(config.fail_fast);

    let report = runner.run_with_progress(&config.questions, |row| {
        let line = ragbench::format_progress(row);
        if row.is_error() {
            println!("{} {}", "[-]".red().bold(), line);
        } else {
            println!("{} {}", "[+]".green().bold(), line);
        }
    })?;

    let metadata_path = config.metadata_path();
    let metadata_path = if config.write_metadata {
        Some(metadata_path.as_path())
    } else {
        None
    };
    report.write(&config.output, metadata_path)?;

    println!();
    println!(
        "{} Baseline results saved to {}",
        "[+]".green().bold(),
        config.output.display().to_string().yellow()
    );
    if report.metadata.error_count > 0 {
        println!(
            "{} {} of {} question(s) failed",
            "[!]".yellow().bold(),
            report.metadata.error_count,
            report.metadata.question_count
        );
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn handle_probe(device: u32, smi: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    use ragbench::{ProbeSet, TelemetrySnapshot};

    let readings = ProbeSet::for_device(device, smi).sample();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&readings)?);
        return Ok(());
    }

    fn print_source(label: &str, snapshot: Option<&TelemetrySnapshot>) {
        match snapshot {
            Some(s) => {
                println!(
                    "  {} {} / {} MB, {:.1}% load{}",
                    label.white().bold(),
                    s.mem_used_mb.to_string().green(),
                    s.mem_total_mb,
                    s.gpu_load_pct,
                    s.gpu_name
                        .as_deref()
                        .map(|n| format!(" ({})", n))
                        .unwrap_or_default()
                );
            }
            None => println!("  {} {}", label.white().bold(), "unavailable".red()),
        }
    }

    println!("{}", format!("═══ GPU {} ═══", device).cyan().bold());
    print_source("NVML:", readings.nvml.as_ref());
    print_source("nvidia-smi:", readings.nvsmi.as_ref());

    Ok(())
}

#[cfg(feature = "cli")]
fn handle_summarize(runs: &[String], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    use ragbench::summary::format_table;
    use ragbench::{RunSpec, RunSummary};

    let mut summaries = Vec::with_capacity(runs.len());
    for arg in runs {
        let spec = RunSpec::parse(arg)?;
        let summary = RunSummary::from_csv(spec.label, &spec.path)
            .map_err(|e| format!("{}: {}", spec.path.display(), e))?;
        summaries.push(summary);
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        println!("{}", "═══ Run Comparison ═══".cyan().bold());
        print!("{}", format_table(&summaries));
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features not enabled. Please compile with --features cli");
    std::process::exit(1);
}
