use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use approvals::cache::{DirectoryCache, SystemClock};
use approvals::config::{self, Config};
use approvals::models::directory::eligible_approvers;
use approvals::notification::slack::SlackClient;
use approvals::workflow::ApprovalWorkflow;
use approvals::{api, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Approvers { requester }) => print_approvers(cfg, &requester).await,
        None => run_server(cfg, None).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

/// stdout logging filtered by RUST_LOG, plus OTLP export when
/// OTEL_EXPORTER_OTLP_ENDPOINT is set.
fn init_tracing() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "approval-bot"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "approvals=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry_layer)
        .init();
    Ok(())
}

fn build_workflow(cfg: &Config) -> anyhow::Result<ApprovalWorkflow> {
    let slack = Arc::new(SlackClient::new(
        &cfg.slack_api_base_url,
        cfg.bot_token.clone(),
    )?);
    let directory = DirectoryCache::new(
        slack.clone(),
        Arc::new(SystemClock),
        cfg.directory_ttl_secs,
    );
    Ok(ApprovalWorkflow::new(slack, directory))
}

async fn run_server(cfg: Config, port: Option<u16>) -> anyhow::Result<()> {
    let port = port.unwrap_or(cfg.port);
    let workflow = build_workflow(&cfg)?;

    let state = Arc::new(AppState {
        workflow,
        signing_secret: cfg.signing_secret,
        command: cfg.command,
    });

    let app = api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Slack app running on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn print_approvers(cfg: Config, requester: &str) -> anyhow::Result<()> {
    let workflow = build_workflow(&cfg)?;
    let snapshot = workflow
        .directory()
        .get_directory()
        .await
        .context("failed to fetch slack directory")?;

    let options = eligible_approvers(&snapshot.entries, requester);
    if options.is_empty() {
        println!("No eligible approvers.");
        return Ok(());
    }

    println!("{:<14} NAME", "ID");
    for o in options {
        println!("{:<14} {}", o.user_id, o.label);
    }
    Ok(())
}
