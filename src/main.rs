//! VtPuppet - Headless avatar puppeteering service
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vtpuppet::{
    avatar::RigModel,
    config::Config,
    frame::FrameLoop,
    tracking::{check_engine_available, EngineSubprocess, LandmarkReceiver},
    web::WebServer,
    AppState,
};

/// VtPuppet - drive a humanoid avatar from webcam landmarks
#[derive(Parser, Debug)]
#[command(name = "vtpuppet", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rig manifest to load on startup (overrides config)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// HTTP server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Frame loop rate (overrides config)
    #[arg(long)]
    fps: Option<u32>,

    /// Disable HTTP server
    #[arg(long)]
    no_http: bool,

    /// Do not launch the landmark engine subprocess
    #[arg(long)]
    no_engine: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", vtpuppet::NAME, vtpuppet::VERSION);

    let state = setup_and_spawn_services(&args).await?;

    shutdown_signal().await;
    info!("Shutdown signal received");
    state.shutdown();

    // Give tasks a moment to clean up
    tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;

    info!("VtPuppet stopped");
    Ok(())
}

/// Setup config, create AppState, attach the initial avatar and spawn all
/// background services.
async fn setup_and_spawn_services(args: &Args) -> anyhow::Result<Arc<AppState>> {
    // Load configuration
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    if let Some(ref model) = args.model {
        config.avatar.model_path = Some(model.clone());
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if let Some(fps) = args.fps {
        config.render.fps = fps;
    }
    if args.no_http {
        config.http.enabled = false;
    }
    if args.no_engine {
        config.tracking.auto_launch = false;
    }

    // Validate configuration
    config.validate()?;

    info!(
        "Landmark port: {}, engine auto-launch: {}",
        config.tracking.port, config.tracking.auto_launch
    );
    info!("Frame rate: {} fps", config.render.fps);
    info!("HTTP server: {}", config.http.enabled);

    let state = AppState::new(config.clone());

    // Initial avatar
    let attached = match config.avatar.model_path {
        Some(ref path) => match state.load_avatar(path).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to load rig from {}: {}", path.display(), e);
                false
            }
        },
        None => false,
    };
    if !attached {
        info!("Using full humanoid rig");
        state.set_avatar(RigModel::full("default")).await?;
    }

    // Start HTTP server if enabled
    if config.http.enabled {
        let server = WebServer::new(Arc::clone(&state), &config.http);
        tokio::spawn(async move {
            if let Err(e) = server.serve().await {
                error!("HTTP server error: {}", e);
            }
        });
    }

    // Start landmark tracking
    let tracking_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = run_tracking(tracking_state).await {
            error!("Tracking error: {}", e);
        }
    });

    // Start frame loop
    let frame_loop = FrameLoop::new(Arc::clone(&state)).await;
    tokio::spawn(async move {
        if let Err(e) = frame_loop.run().await {
            error!("Frame loop error: {}", e);
        }
    });

    Ok(state)
}

async fn run_tracking(state: Arc<AppState>) -> anyhow::Result<()> {
    let config = state.config.read().await;
    let tracking_config = config.tracking.clone();
    drop(config);

    let mut shutdown_rx = state.subscribe_shutdown();

    // Optionally launch the subprocess
    let mut subprocess = if tracking_config.auto_launch {
        if !check_engine_available() {
            warn!("Python 'mediapipe' package not found; the landmark engine will likely fail");
        }
        let mut sp = EngineSubprocess::new(&tracking_config);
        if let Err(e) = sp.start() {
            error!("Failed to auto-launch landmark engine: {}", e);
        }
        Some(sp)
    } else {
        None
    };

    let mut receiver = LandmarkReceiver::new(&tracking_config);
    receiver.start().await?;

    let mut health = tokio::time::interval(tokio::time::Duration::from_secs(1));

    loop {
        tokio::select! {
            result = receiver.recv_bundle() => {
                match result {
                    Ok(Some(bundle)) => state.submit_bundle(bundle),
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Landmark receive error: {}", e);
                    }
                }
            }
            _ = health.tick() => {
                // Check subprocess health and auto-restart once the delay has passed
                if let Some(ref mut sp) = subprocess {
                    if sp.restart_due(tokio::time::Instant::now()) {
                        if let Err(e) = sp.start() {
                            error!("Failed to restart landmark engine: {}", e);
                        }
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Tracking shutting down");
                break;
            }
        }
    }

    // Cleanup
    receiver.stop();
    if let Some(ref mut sp) = subprocess {
        sp.stop().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
