//! httping - Main CLI Application
//!
//! Sends sequential HTTP requests to one destination over fresh connections
//! and prints ping-style lines and statistics.

use clap::Parser;
use httping::{
    cli::Cli,
    config::{display_config_summary, load_config, validate_config, EnvManager, ValidationLevel},
    error::{AppError, ErrorReporter},
    executor::{cancellation_pair, ProbeLoop},
    logging::LoggerFactory,
    log_debug, log_info,
    models::{Config, ProbeConfig},
    output::{summary_to_json, ConsoleReporter, OutputFormatterFactory},
    stats::ProbeStatistics,
    PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let cli = Cli::parse();

    if cli.env_help {
        print!("{}", EnvManager::display_env_help());
        return;
    }

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(1);
    }

    let use_color = cli.color_override().unwrap_or_else(httping::cli::supports_color);
    let verbose = cli.verbose;

    let config = match load_config(cli) {
        Ok(config) => config,
        Err(error) => {
            ErrorReporter::new(use_color, verbose).report_error(&error);
            process::exit(error.exit_code());
        }
    };

    if let Err(error) = run(config).await {
        ErrorReporter::new(use_color, verbose).report_error(&error);
        process::exit(error.exit_code());
    }
}

/// Probe the configured destination and print the summary
async fn run(config: Config) -> httping::Result<()> {
    let show_info = config.verbose || config.debug;
    for warning in validate_config(&config)? {
        if warning.level != ValidationLevel::Info || show_info {
            eprintln!("{}", warning.format(config.enable_color));
        }
    }

    let factory = LoggerFactory::new(config.clone());
    let logger = factory.create_logger("httping");

    log_info!(logger, "{} v{} starting", PKG_NAME, VERSION);
    log_debug!(
        logger,
        "build {} ({})",
        option_env!("BUILD_TIME").unwrap_or("unknown"),
        option_env!("GIT_COMMIT").unwrap_or("unknown")
    );
    if config.debug {
        log_debug!(logger, "configuration:\n{}", display_config_summary(&config));
    }

    let (handle, token) = cancellation_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let probe_config = ProbeConfig::from(&config);
    let probe_loop = ProbeLoop::new(probe_config, token).with_logger(factory.create_probe_logger());
    let formatter = OutputFormatterFactory::create_formatter(config.enable_color, config.verbose);
    let mut reporter = ConsoleReporter::new(formatter).quiet(config.json_output);
    let mut stats = ProbeStatistics::new(config.destination.clone(), config.count);

    let probe = tokio::spawn(async move {
        let termination = probe_loop.run(&mut stats, &mut reporter).await;
        (stats, reporter, termination)
    });

    let (stats, reporter, termination) = probe
        .await
        .map_err(|e| AppError::internal(format!("Probe task failed: {}", e)))?;

    log_info!(logger, "probe finished: {}", termination);

    match stats.summarize(config.aggregation_mode(), termination) {
        Ok(summary) if config.json_output => println!("{}", summary_to_json(&summary)?),
        Ok(summary) => println!("{}", reporter.formatter().format_summary(&summary)),
        Err(AppError::Statistics(_)) => {
            println!("{}", reporter.formatter().format_no_attempts(stats.destination()));
        }
        Err(error) => return Err(error),
    }

    Ok(())
}
