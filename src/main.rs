//! Website Audit CLI - run a single auditor against a website

use clap::{ArgAction, Parser, ValueEnum};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::process::ExitCode;
use std::time::Duration;

use website_audit::{
    AuditConfig, Orchestrator, PerformanceAuditor, ScanRequest,
    config::API_KEY_ENV,
    output::{OutputFormat, output_response},
};

/// Website auditor - performance/SEO audits and WordPress fingerprinting
#[derive(Parser, Debug)]
#[command(name = "website-audit")]
#[command(version, about, long_about = None)]
struct Args {
    /// URL of the site to scan
    url: String,

    /// Auditor to run (performance, tech-fingerprint)
    #[arg(short = 'a', long = "auditor", default_value = PerformanceAuditor::NAME)]
    auditor: String,

    /// Ignore cached results
    #[arg(long = "force-new-results")]
    force_new_results: bool,

    /// Output format
    #[arg(short = 'o', long = "output", default_value = "human", value_enum)]
    output_format: OutputFormatArg,

    /// Allow scanning private/internal IP addresses (localhost, 192.168.x.x, etc.)
    #[arg(long = "allow-private")]
    allow_private: bool,

    /// Locale requested from PageSpeed Insights
    #[arg(long = "locale", default_value = "en_US")]
    locale: String,

    /// Timeout in seconds for page, stylesheet and registry requests
    #[arg(long = "timeout", default_value_t = 30)]
    timeout: u64,

    /// Timeout in seconds for the PageSpeed analysis
    #[arg(long = "analysis-timeout", default_value_t = 3600)]
    analysis_timeout: u64,

    /// Read a style.css header under another label, e.g. version="Stable tag"
    #[arg(long = "theme-header", value_name = "FIELD=LABEL", value_parser = parse_theme_header)]
    theme_headers: Vec<(String, String)>,

    /// PageSpeed Insights API key
    #[arg(long = "api-key", env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

/// Output format argument
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
    None,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::None => OutputFormat::None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("Warning: could not initialize logger: {}", e);
    }

    // Print banner for human output
    if matches!(args.output_format, OutputFormatArg::Human) {
        print_banner();
    }

    match run_scan(&args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_scan(args: &Args) -> website_audit::Result<bool> {
    let config = args.theme_headers.iter().fold(
        AuditConfig::default()
            .with_api_key(args.api_key.clone())
            .with_locale(&args.locale)
            .with_request_timeout(Duration::from_secs(args.timeout))
            .with_analysis_timeout(Duration::from_secs(args.analysis_timeout))
            .allow_private(args.allow_private),
        |config, (field, label)| config.with_theme_header(field, label),
    );
    let orchestrator = Orchestrator::new(config)?;

    let request =
        ScanRequest::new(&args.auditor, &args.url).force_new_results(args.force_new_results);
    let response = orchestrator.scan(&request).await;

    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    output_response(
        &args.auditor,
        &response,
        args.output_format.into(),
        &mut writer,
    )?;

    Ok(response.success)
}

fn parse_theme_header(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((field, label)) if !field.trim().is_empty() && !label.trim().is_empty() => {
            Ok((field.trim().to_string(), label.trim().to_string()))
        }
        _ => Err(format!("expected FIELD=LABEL, got '{}'", value)),
    }
}

fn print_banner() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    println!("Website Audit v{}", VERSION);
    println!();
}
