use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lognorm_core::config::Settings;
use lognorm_core::Normalizer;
use lognorm_delivery::stdio::{feed_lines, LinePublisher};
use lognorm_delivery::{AdapterConverter, Converter, DeliveryPipeline, PipelineOptions};
use lognorm_sources::{ContainerAdapter, JournalAdapter, StructuredAdapter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lognorm", about = "Normalise log records into one canonical schema")]
struct Cli {
    /// TOML settings file layered over the built-in defaults.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Shape of the records read from stdin.
    #[arg(long, value_enum, default_value_t = Source::Container)]
    source: Source,

    /// Write debug logs to /tmp/lognorm-debug.log (tail -f to inspect).
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Container,
    Journal,
    Ecs,
}

fn init_logging(debug: bool, default_filter: &str) -> anyhow::Result<()> {
    if debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/lognorm-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("lognorm debug log started, tail -f /tmp/lognorm-debug.log");
    } else {
        // stdout carries the published documents.
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| EnvFilter::new(default_filter)),
            )
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    init_logging(cli.debug, &settings.log.filter)?;

    let normalizer = Arc::new(Normalizer::new().context("failed to build normalizer")?);
    let (subject, converter): (&str, Arc<dyn Converter>) = match cli.source {
        Source::Container => (
            &settings.sources.container_subject,
            Arc::new(AdapterConverter::new(ContainerAdapter, normalizer)),
        ),
        Source::Journal => (
            &settings.sources.journal_subject,
            Arc::new(AdapterConverter::new(JournalAdapter, normalizer)),
        ),
        Source::Ecs => (
            &settings.sources.structured_subject,
            Arc::new(AdapterConverter::new(StructuredAdapter, normalizer)),
        ),
    };

    let options = PipelineOptions {
        egress_subject: settings.broker.egress_subject.clone(),
        ack_timeout: settings.broker.ack_timeout(),
        nack_delay: settings.broker.nack_delay(),
        queue_capacity: settings.broker.queue_capacity,
    };
    tracing::info!(
        endpoints = ?settings.broker.endpoints,
        egress_subject = %settings.broker.egress_subject,
        "publishing to stdout instead of the configured broker endpoints"
    );
    let publisher = Arc::new(LinePublisher::new(tokio::io::stdout()));
    let (pipeline, handle) = DeliveryPipeline::new(publisher, options);
    let running = tokio::spawn(pipeline.run());

    tracing::info!(subject, "reading records from stdin");
    tokio::select! {
        fed = feed_lines(tokio::io::stdin(), subject, &handle, converter) => {
            let submitted = fed.context("failed to read stdin")?;
            tracing::info!(submitted, "end of input");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, finishing in-flight messages");
        }
    }
    drop(handle);

    let stats = running.await.context("delivery pipeline panicked")?;
    tracing::info!(
        received = stats.received,
        acked = stats.acked,
        nacked = stats.nacked,
        timed_out = stats.timed_out,
        unresolved = stats.unresolved,
        "done"
    );
    Ok(())
}
