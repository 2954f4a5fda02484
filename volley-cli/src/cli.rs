use crate::push::{PushError, PushTarget};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use volley::core::{DEFAULT_CONCURRENCY, DEFAULT_ENDPOINT, DEFAULT_RATE};
use volley::{ConfigError, RunConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Phased load generation against a JSON-RPC endpoint")]
pub struct Cli {
    /// Benchmarks to run, in order. Repeats are ignored.
    #[arg(short, long, value_delimiter = ',')]
    pub benchmarks: Vec<String>,

    /// Number of concurrent workers.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Total run time, including ramp-up and ramp-down.
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    pub duration: Duration,

    /// Maximum iterations per second per worker (0 = unlimited).
    #[arg(long, default_value_t = DEFAULT_RATE)]
    pub rate: u32,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Extremely verbose debug logging. Only honoured with `--log-level debug`.
    #[arg(long)]
    pub log_verbose_debug: bool,

    /// Log file (default stdout).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// JSON-RPC gateway URL.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub gateway_url: String,

    /// Benchmark specific option, e.g. `-p playback.dataset=txns.hex`.
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Print the registered benchmarks and exit.
    #[arg(long)]
    pub list: bool,

    /// Prometheus push gateway address.
    #[arg(long)]
    pub prometheus_push_addr: Option<String>,

    /// Prometheus push `job` name.
    #[arg(long)]
    pub prometheus_push_job_name: Option<String>,

    /// Prometheus push `instance` label.
    #[arg(long)]
    pub prometheus_push_instance_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let concurrency = if self.concurrency == 0 {
            warn!("Concurrency 0 requested, using 1");
            1
        } else {
            self.concurrency
        };

        self.params
            .iter()
            .fold(RunConfig::builder(&self.gateway_url), |builder, (k, v)| {
                builder.param(k, v)
            })
            .concurrency(concurrency)
            .duration(self.duration)
            .rate(self.rate)
            .verbose(self.verbose())
            .build()
    }

    pub fn verbose(&self) -> bool {
        self.log_verbose_debug && self.log_level == LogLevel::Debug
    }

    pub fn push_target(&self) -> Result<Option<PushTarget>, PushError> {
        PushTarget::from_flags(
            self.prometheus_push_addr.as_deref(),
            self.prometheus_push_job_name.as_deref(),
            self.prometheus_push_instance_label.as_deref(),
        )
    }
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("volley").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        let config = cli.run_config().unwrap();
        assert_eq!(config.concurrency(), 1);
        assert_eq!(config.duration(), Duration::from_secs(30));
        assert_eq!(config.rate(), 1);
        assert_eq!(config.endpoint().as_str(), "http://127.0.0.1:8545/");
        assert!(!config.verbose());
        assert!(cli.push_target().unwrap().is_none());
    }

    #[test]
    fn flags_build_the_config() {
        let cli = parse(&[
            "-b",
            "net_version,eth_blockNumber",
            "-b",
            "net_version",
            "--concurrency",
            "0",
            "--duration",
            "1m 30s",
            "--rate",
            "0",
            "--log-level",
            "debug",
            "--log-verbose-debug",
            "-p",
            "playback.dataset=/tmp/txns=1.hex",
        ]);
        assert_eq!(
            cli.benchmarks,
            ["net_version", "eth_blockNumber", "net_version"]
        );

        let config = cli.run_config().unwrap();
        assert_eq!(config.concurrency(), 1);
        assert_eq!(config.duration(), Duration::from_secs(90));
        assert_eq!(config.rate_interval(), None);
        assert!(config.verbose());
        assert_eq!(config.param("playback.dataset"), Some("/tmp/txns=1.hex"));
    }

    #[test]
    fn verbose_needs_debug_level() {
        let cli = parse(&["--log-verbose-debug"]);
        assert!(!cli.verbose());
    }

    #[test]
    fn malformed_param_is_rejected() {
        let res = Cli::try_parse_from(["volley", "-p", "novalue"]);
        assert!(res.is_err());
    }

    #[test]
    fn bad_gateway_url_is_a_config_error() {
        let cli = parse(&["--gateway-url", "not a url"]);
        assert!(matches!(
            cli.run_config(),
            Err(ConfigError::InvalidEndpoint(_))
        ));
    }
}
