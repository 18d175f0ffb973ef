use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig as _;

use lm_domain::config::{
    active_env_overrides, Config, LogFormat, LoggingConfig, ObservabilityConfig,
};
use lm_gateway::cli::{Cli, Command, ConfigCommand, LoadedConfig};
use lm_gateway::{api, bootstrap, cors};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            let loaded = lm_gateway::cli::load_config()?;
            let tracer_provider = init_tracing(&loaded.config.logging, &loaded.config.observability);
            run_server(loaded, tracer_provider).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let loaded = lm_gateway::cli::load_config()?;
            report_rejected_overrides(&loaded);
            if !lm_gateway::cli::config::validate(&loaded.config, &loaded.path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let loaded = lm_gateway::cli::load_config()?;
            report_rejected_overrides(&loaded);
            let overrides = active_env_overrides(|key| std::env::var(key).ok());
            print!(
                "{}",
                lm_gateway::cli::config::render(&loaded.config, &overrides)?
            );
            Ok(())
        }
        Some(Command::Status) => {
            init_cli_tracing();
            let loaded = lm_gateway::cli::load_config()?;
            if !lm_gateway::cli::status::run(&loaded.config).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Version) => {
            println!("leadmsg {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn report_rejected_overrides(loaded: &LoadedConfig) {
    for msg in &loaded.rejected_overrides {
        eprintln!("[WARN] env: {msg}");
    }
}

/// Initialize structured tracing for the `serve` command.
///
/// `RUST_LOG` wins over `logging.level`. When `otlp_endpoint` is
/// configured an OpenTelemetry layer exports every span over OTLP/gRPC;
/// the returned provider must be shut down on exit to flush pending spans.
fn init_tracing(
    logging: &LoggingConfig,
    obs: &ObservabilityConfig,
) -> Option<opentelemetry_sdk::trace::SdkTracerProvider> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = match logging.format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().pretty().boxed(),
    };

    let tracer_provider = obs.exporter_endpoint().and_then(|endpoint| {
        let exporter = match opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
        {
            Ok(e) => e,
            Err(e) => {
                eprintln!(
                    "WARNING: failed to create OTLP exporter for {endpoint}: {e}; \
                     starting without OpenTelemetry"
                );
                return None;
            }
        };

        let resource = opentelemetry_sdk::Resource::builder()
            .with_service_name(obs.service_name.clone())
            .build();

        Some(
            opentelemetry_sdk::trace::SdkTracerProvider::builder()
                .with_batch_exporter(exporter)
                .with_sampler(opentelemetry_sdk::trace::Sampler::TraceIdRatioBased(
                    obs.sample_rate,
                ))
                .with_resource(resource)
                .build(),
        )
    });

    let otel_layer = tracer_provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("leadmsg")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    tracer_provider
}

/// Compact stderr-only tracing for one-shot CLI commands, so stdout stays
/// machine-readable.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Validate the config, build the state and serve until a shutdown signal.
async fn run_server(
    loaded: LoadedConfig,
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
) -> anyhow::Result<()> {
    tracing::info!(config_path = %loaded.path, "leadmsg starting");
    for msg in &loaded.rejected_overrides {
        tracing::warn!(reason = %msg, "environment override ignored");
    }

    let config = Arc::new(loaded.config);
    check_config(&config)?;

    let state = bootstrap::build_app_state(config.clone());

    // ── Layers ──────────────────────────────────────────────────────
    let cors_layer = cors::build_cors_layer(&config.server.cors);
    let max_concurrent = config.server.max_concurrent_requests;
    tracing::info!(max_concurrent, "concurrency limit set");

    let app = api::router(state.clone())
        .layer(cors_layer)
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state);

    // ── Bind ────────────────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(
        addr = %addr,
        environment = %config.server.environment,
        api_version = %config.server.api_version,
        "leadmsg listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server error")?;

    // Flush the OTel tracer provider so pending spans are exported
    // before the process exits.
    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = ?e, "OpenTelemetry tracer provider shutdown failed");
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}

/// Log every validation issue; any error-severity issue aborts startup.
fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            lm_domain::config::ConfigSeverity::Error => {
                tracing::error!(field = %issue.field, "{}", issue.message)
            }
            lm_domain::config::ConfigSeverity::Warning => {
                tracing::warn!(field = %issue.field, "{}", issue.message)
            }
        }
    }
    let errors = lm_gateway::cli::config::error_count(&issues);
    if errors > 0 {
        anyhow::bail!("configuration has {errors} error(s); run `leadmsg config validate`");
    }
    Ok(())
}

/// Wait for SIGINT or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                ctrl_c.await;
                tracing::info!("received SIGINT, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        tracing::info!("received SIGINT, shutting down");
    }
}
