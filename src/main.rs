//! WordPulse CLI entry point

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordpulse::config::cli::{Cli, ExecutionMode};
use wordpulse::config::{toml, validator, Config};
use wordpulse::distributed::{CoordinatorService, StopReason, Volunteer};
use wordpulse::output;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.validate()?;

    init_logging(cli.debug);

    println!("WordPulse v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config = toml::load_config(&cli)?;
    validator::validate_config(&config).context("Configuration validation failed")?;

    if cli.dry_run {
        print_configuration(&config, cli.mode);
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    match cli.mode {
        ExecutionMode::Coordinator => run_coordinator(config),
        ExecutionMode::Volunteer => run_volunteer(config),
    }
}

/// Log to stderr; RUST_LOG overrides the default level
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

/// Run in coordinator mode
fn run_coordinator(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?;

    let report = runtime.block_on(async {
        let service = CoordinatorService::bind(&config.coordinator)
            .await
            .context("Failed to start coordinator")?;

        let addr = service.local_addr()?;
        println!("Listening on {}", addr);
        println!();

        service.run().await
    })?;

    println!("All work is done. Here are the results.");
    println!();
    output::text::print_results(&report, config.output.top);

    if let Some(ref path) = config.output.json_output {
        let json = output::json::build_json_report(&report, config.output.top);
        output::json::write_json_output(path, &json, true)
            .context("Failed to write JSON output")?;
        println!();
        println!("JSON results written to {}", path.display());
    }

    Ok(())
}

/// Run in volunteer mode
fn run_volunteer(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?;

    let summary = runtime.block_on(async {
        let volunteer = Volunteer::from_config(config.volunteer.clone())
            .context("Failed to create volunteer")?;

        println!(
            "Volunteer {} working for coordinator {}",
            volunteer.volunteer_id(),
            config.volunteer.coordinator_address()
        );

        Ok::<_, anyhow::Error>(volunteer.keep_working_until_done().await)
    })?;

    println!();
    println!("Documents completed: {}", summary.completed);
    if summary.skipped > 0 {
        println!("Documents skipped:   {}", summary.skipped);
    }

    match summary.stopped {
        StopReason::NoWork => {
            println!("No work left.");
            Ok(())
        }
        // A coordinator that already finished and closed looks the same as
        // one that is down; only fail if nothing got done.
        StopReason::CoordinatorUnavailable(reason) if summary.completed == 0 => {
            anyhow::bail!("Could not work with coordinator: {}", reason)
        }
        StopReason::CoordinatorUnavailable(reason) => {
            println!("Coordinator went away: {}", reason);
            Ok(())
        }
        StopReason::FetchFailures => {
            anyhow::bail!("Giving up after repeated document download failures")
        }
    }
}

/// Print configuration summary
fn print_configuration(config: &Config, mode: ExecutionMode) {
    println!("Configuration:");
    match mode {
        ExecutionMode::Coordinator => {
            let coordinator = &config.coordinator;
            println!("  Mode: coordinator");
            println!("  Bind: {}:{}", coordinator.bind_address, coordinator.listen_port);
            println!("  Document host: {}", coordinator.document_host);
            let corpus = coordinator.corpus();
            println!("  Documents: {}", corpus.len());
            for path in &corpus {
                println!("    {}", path);
            }
            if let Some(top) = config.output.top {
                println!("  Print top: {}", top);
            }
            if let Some(ref path) = config.output.json_output {
                println!("  JSON output: {}", path.display());
            }
        }
        ExecutionMode::Volunteer => {
            let volunteer = &config.volunteer;
            println!("  Mode: volunteer");
            println!("  Coordinator: {}", volunteer.coordinator_address());
            println!("  Minimum word length: {}", volunteer.min_word_len);
            if volunteer.top_n == 0 {
                println!("  Words reported: all");
            } else {
                println!("  Words reported: top {}", volunteer.top_n);
            }
            println!("  Fetch: {:?}", volunteer.fetch);
        }
    }
}
