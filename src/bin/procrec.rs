use clap::Parser;
use colored::*;
use procrec::output::ChartOutcome;
use procrec::{MonitorConfig, Report, Session, Summary, Target, Termination};
use std::path::PathBuf;
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Record CPU and memory usage for a process
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// The process id or command
    process_id_or_command: String,

    /// Output the statistics to a file
    #[clap(long, value_name = "PATH")]
    log: Option<PathBuf>,

    /// Output the statistics to a plot (format from the extension)
    #[clap(long, value_name = "PATH")]
    plot: Option<PathBuf>,

    /// How long to record for (in seconds). If not specified, the recording
    /// is continuous until the job exits.
    #[clap(long, value_name = "SECONDS", allow_negative_numbers = true)]
    duration: Option<f64>,

    /// How long to wait between each sample (in seconds). By default the
    /// process is sampled as often as possible.
    #[clap(long, value_name = "SECONDS", allow_negative_numbers = true)]
    interval: Option<f64>,

    /// Include sub-processes in statistics (results in a slower maximum
    /// sampling rate)
    #[clap(long)]
    include_children: bool,

    /// Include I/O statistics in the plot
    #[clap(long)]
    include_io: bool,

    /// Use 100% per logical core as the CPU axis ceiling
    #[clap(long)]
    max_cpu_scale: bool,

    /// Print a summary of the run when monitoring ends
    #[clap(long)]
    summary: bool,

    /// Print the summary as JSON
    #[clap(long, requires = "summary")]
    json: bool,

    /// Enable debug logging
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(err) = run(&args) {
        eprintln!("{} {}", "Error:".red().bold(), err);
        exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(args: &Args) -> procrec::Result<()> {
    let target = Target::parse(&args.process_id_or_command);

    let mut builder = MonitorConfig::builder(target.clone())
        .include_children(args.include_children)
        .include_io(args.include_io)
        .max_cpu_scale(args.max_cpu_scale);
    if let Some(path) = &args.log {
        builder = builder.log_path(path);
    }
    if let Some(path) = &args.plot {
        builder = builder.chart_path(path);
    }
    if let Some(secs) = args.duration {
        builder = builder.duration_secs(secs);
    }
    if let Some(secs) = args.interval {
        builder = builder.interval_secs(secs);
    }
    let config = builder.build()?;

    // Setup signal handling for clean shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    let session = Session::start(config)?;
    match &target {
        Target::Pid(pid) => println!("Attaching to process {}", pid.to_string().cyan()),
        Target::Command(command) => println!(
            "Starting up command '{}' and attaching to process {}",
            command.cyan(),
            session.pid().to_string().cyan()
        ),
    }

    let report = session.run(Some(running))?;
    report_outcome(&report);

    if args.summary {
        print_summary(&report.summary, args.json)?;
    }

    Ok(())
}

fn report_outcome(report: &Report) {
    match &report.termination {
        Termination::ProcessFinished | Termination::ProcessGone => println!(
            "Process finished ({:.2} seconds)",
            report.elapsed.as_secs_f64()
        ),
        Termination::Unobservable(e) => log::warn!("Stopped sampling: {}", e),
        Termination::DurationExceeded | Termination::Interrupted => {}
    }

    if let Some(ChartOutcome::SkippedEmpty) = report.chart {
        eprintln!("{}", "No samples were collected, plot not written".yellow());
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn print_summary(summary: &Summary, json: bool) -> procrec::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    let rows = vec![
        SummaryRow {
            metric: "Samples",
            value: summary.sample_count.to_string(),
        },
        SummaryRow {
            metric: "Elapsed (s)",
            value: format!("{:.3}", summary.elapsed_secs),
        },
        SummaryRow {
            metric: "Peak CPU (%)",
            value: format!("{:.1}", summary.peak_cpu_percent),
        },
        SummaryRow {
            metric: "Average CPU (%)",
            value: format!("{:.1}", summary.avg_cpu_percent),
        },
        SummaryRow {
            metric: "Peak real (MB)",
            value: format!("{:.1}", summary.peak_resident_mb),
        },
        SummaryRow {
            metric: "Average real (MB)",
            value: format!("{:.1}", summary.avg_resident_mb),
        },
        SummaryRow {
            metric: "Peak virtual (MB)",
            value: format!("{:.1}", summary.peak_virtual_mb),
        },
        SummaryRow {
            metric: "I/O read (MB)",
            value: format!("{:.1}", summary.io_read_mb),
        },
        SummaryRow {
            metric: "I/O written (MB)",
            value: format!("{:.1}", summary.io_write_mb),
        },
        SummaryRow {
            metric: "Peak processes",
            value: summary.peak_process_count.to_string(),
        },
    ];

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    Ok(())
}
