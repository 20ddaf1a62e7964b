use anyhow::Context;
use tagwatch_cloud::{AuthSession, Credentials, ReqwestTransport};
use tagwatch_core::{SystemClock, TerminalConfig};
use tagwatch_hardware::console::ConsoleDisplay;
use tagwatch_hardware::line::LineTagReader;
use tagwatch_hardware::{AnyDisplay, AnyTagReader, DetectionListener};
use tagwatch_terminal::{EventOrchestrator, wait_for_clock_sync_default};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("tagwatch {} starting", tagwatch_core::VERSION);

    let config = TerminalConfig::load().context("failed to load configuration")?;
    let transport =
        ReqwestTransport::from_config(&config.cloud).context("failed to build HTTP client")?;

    wait_for_clock_sync_default(&SystemClock).await;

    let mut session = AuthSession::from_config(&config.cloud);
    if let Err(e) = session
        .sign_in(&transport, &Credentials::from_config(&config.cloud))
        .await
    {
        error!("Continuing without a token, access logs will not be submitted: {}", e);
    }

    let display = AnyDisplay::Console(ConsoleDisplay::with_geometry(
        config.display.width,
        config.display.height,
        config.display.max_transfer_pixels,
    ));
    let mut orchestrator = EventOrchestrator::from_config(&config, display, transport, session)
        .context("invalid terminal configuration")?;
    orchestrator
        .paint_idle()
        .await
        .context("failed to initialize display")?;

    let reader = AnyTagReader::Line(LineTagReader::stdin());
    let mut listener = DetectionListener::new(reader).start();

    let reason = tokio::select! {
        _ = orchestrator.run(&mut listener) => "reader closed",
        _ = tokio::signal::ctrl_c() => "interrupted",
    };
    info!("Shutting down: {}", reason);

    listener.shutdown().await?;
    info!("Final stats: {:?}", orchestrator.stats());
    Ok(())
}
