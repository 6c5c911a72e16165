use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use tokio::net::TcpListener;

use crate::config::Config;

pub async fn serve(config: Config, in_memory: bool) -> anyhow::Result<()> {
    let app = match in_memory {
        true => {
            tracing::warn!("serving from in-memory storage, nothing will be persisted");
            crate::constructors::in_memory(&config)
        },
        false => crate::constructors::mongo(&config)
            .await
            .context("cannot connect to mongodb")?,
    };

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;

    tracing::info!(
        "SparkHub server running in {} mode on {}",
        config.environment,
        addr
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("cannot listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            },
            Err(e) => {
                tracing::error!("cannot listen for SIGTERM: {}", e);
                futures::future::pending::<()>().await
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = futures::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutting down gracefully...");
}
