use clap::{Args, Parser, Subcommand};
use delaysim::config::{LteConfig, WifiConfig};
use delaysim::error::ScenarioError;
use delaysim::flow;
use delaysim::scenario::{lte, wifi};
use delaysim::Console;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "delaysim", version, about = "Network scenarios with randomized per-hop delays")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the two-cell cellular scenario with random delays at the cells and the gateway
    Lte(LteArgs),
    /// Run the WiFi to LAN echo scenario
    Wifi(WifiArgs),
    /// Print per-flow delay and bitrate from a flow monitor document
    Summarize {
        /// Flow monitor XML file written by a previous run
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
struct LteArgs {
    /// Number of cells, and of UEs
    #[arg(long = "nodes")]
    nodes: Option<u16>,
    /// Simulated time, in seconds
    #[arg(long = "sim-time")]
    sim_time: Option<f64>,
    /// Seed of the delay generator
    #[arg(long = "seed")]
    seed: Option<u64>,
    /// Mean of the injected delay, in milliseconds
    #[arg(long = "delay-mean")]
    delay_mean: Option<f64>,
    /// Variance of the injected delay
    #[arg(long = "delay-variance")]
    delay_variance: Option<f64>,
    /// Directory the trace files are written to
    #[arg(long = "output-dir")]
    output_dir: Option<PathBuf>,
    /// Log scenario progress
    #[arg(long = "verbose")]
    verbose: bool,
}

#[derive(Args, Debug)]
struct WifiArgs {
    /// Number of CSMA nodes besides the point-to-point end
    #[arg(long = "n-csma")]
    n_csma: Option<u32>,
    /// Number of WiFi stations
    #[arg(long = "n-wifi")]
    n_wifi: Option<u32>,
    /// Directory the trace files are written to
    #[arg(long = "output-dir")]
    output_dir: Option<PathBuf>,
    /// Log echo traffic (the default)
    #[arg(long = "verbose", conflicts_with = "no_verbose")]
    verbose: bool,
    /// Keep the echo applications quiet
    #[arg(long = "no-verbose")]
    no_verbose: bool,
}

fn init_logging(default_filter: &str) {
    let _ = {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init()
    };
}

fn lte_config(args: LteArgs) -> Result<LteConfig, ScenarioError> {
    let mut config = LteConfig::default();
    if let Some(nodes) = args.nodes {
        config.nodes = nodes;
    }
    if let Some(secs) = args.sim_time {
        config.sim_time = Duration::try_from_secs_f64(secs).map_err(|err| {
            delaysim::ConfigError::Invalid {
                name: "simulation time",
                reason: err.to_string(),
            }
        })?;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(mean) = args.delay_mean {
        config.delay_mean_ms = mean;
    }
    if let Some(variance) = args.delay_variance {
        config.delay_variance = variance;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    config.validate()?;
    Ok(config)
}

fn wifi_config(args: WifiArgs) -> Result<WifiConfig, ScenarioError> {
    let mut config = WifiConfig::default();
    if let Some(n_csma) = args.n_csma {
        config.n_csma = n_csma;
    }
    if let Some(n_wifi) = args.n_wifi {
        config.n_wifi = n_wifi;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    config.verbose = args.verbose || !args.no_verbose;
    config.validate()?;
    Ok(config)
}

fn run(command: Command) -> Result<(), ScenarioError> {
    match command {
        Command::Lte(args) => {
            init_logging(if args.verbose { "info" } else { "warn" });
            let config = lte_config(args)?;
            lte::run(&config, Console::stdout())?;
        },
        Command::Wifi(args) => {
            let config = wifi_config(args)?;
            init_logging(if config.verbose { "warn,delaysim::app::echo=info" } else { "warn" });
            let outcome = wifi::run(&config)?;
            if outcome.echo_client().map(|client| client.received()).unwrap_or(0) == 0 {
                log::warn!("the echo client never heard back from the server");
            }
        },
        Command::Summarize { path } => {
            init_logging("warn");
            let document = flow::xml::read_flow_monitor_file(&path, LteConfig::default().bin_widths)?;
            let summaries = flow::summarize_document(&document);
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            flow::write_document_summary(&mut out, &summaries)?;
            out.flush()?;
        },
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        },
    }
}
