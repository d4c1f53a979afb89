use anyhow::{Context, Result};
use axum::serve;
use qbit_warden::api::client::QbClient;
use qbit_warden::core::config::Config;
use qbit_warden::core::state::AppState;
use qbit_warden::core::startup::{build_scheduler, probe_client};
use qbit_warden::core::{routes, tracing_init};
use qbit_warden::utils::disk::SysinfoDisk;
use qbit_warden::utils::time::SystemClock;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn, Level};

fn main() -> Result<()> {
    let config_path = env::args().nth(1).map(PathBuf::from);

    // Load and validate configuration
    let config = Config::load(config_path.as_deref())
        .context(format!(
            "Failed to load configuration from '{}'",
            config_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "config.toml".to_string())
        ))?;

    tracing_init::init_tracing(&config.logging)?;

    // Build Tokio runtime with configured number of threads
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> Result<()> {
    info!(
        base_url = %config.client.base_url,
        max_seeders = config.policy.max_seeders,
        max_filesize_bytes = config.policy.max_filesize_bytes,
        disk_floor_gb = config.policy.disk_floor_gb,
        upload_limit = config.policy.upload_limit,
        hourly_limit_bytes = config.budget.hourly_limit_bytes,
        status_port = ?config.server.port,
        "qbit-warden starting"
    );

    let client = QbClient::new(&config.client).context("Failed to create torrent client")?;
    if let Err(e) = client.login().await {
        warn!(error = %e, "Login to torrent client failed, continuing without a session");
    }

    let disk = Arc::new(SysinfoDisk::new(config.policy.disk_path.clone()));
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(client),
        disk,
        Arc::new(SystemClock),
    ));

    probe_client(&state).await;

    let mut scheduler = build_scheduler(&state);
    scheduler.start();

    let (server_stop, server_handle) = match config.server.port {
        Some(port) => {
            let (stop, handle) = spawn_status_server(Arc::clone(&state), port).await?;
            (Some(stop), Some(handle))
        }
        None => (None, None),
    };

    info!("Policy jobs started, waiting for shutdown signal");

    tokio::select! {
        _ = shutdown_signal() => {}
        _ = scheduler.faulted() => {
            error!("A policy job failed unexpectedly, shutting down");
        }
    }

    scheduler.shutdown().await;

    if let Some(stop) = server_stop {
        let _ = stop.send(());
    }
    if let Some(handle) = server_handle {
        if let Err(e) = handle.await {
            error!(error = %e, "Status server task failed");
        }
    }

    let snapshot = state.metrics.get_snapshot();
    for job in &snapshot.jobs {
        info!(
            job = %job.name,
            passes = job.passes,
            abandoned = job.abandoned,
            actions_applied = job.actions_applied,
            actions_failed = job.actions_failed,
            "Job summary"
        );
    }

    info!("qbit-warden stopped");

    Ok(())
}

/// Serve `/health` and `/status` until told to stop
async fn spawn_status_server(
    state: Arc<AppState>,
    port: u16,
) -> Result<(oneshot::Sender<()>, tokio::task::JoinHandle<()>)> {
    let app = routes::build_router(state).layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        ),
    );

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind status listener to {}", addr))?;

    info!(address = %addr, "Status listener bound successfully");

    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let result = serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stopped.await;
            })
            .await;
        if let Err(e) = result {
            error!(error = %e, "Status server error");
        }
    });

    Ok((stop, handle))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutdown signal received, stopping scheduler");
}
