//! Warden application server entry point.
//!
//! # Purpose
//! Loads configuration, registers route permissions, wires identity and the
//! HTTP router, then serves the API and the metrics endpoint.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use appserver::app::{AppState, build_router};
use appserver::auth::principal::{IdentityResolver, StaticTokenResolver};
use appserver::bootstrap::bootstrap;
use appserver::config::AppConfig;
use appserver::observability;
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env_or_yaml().context("appserver config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("warden-appserver");
    let state = build_state(&config)?;
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);

    let addr = config.bind_addr;
    tracing::info!(%addr, prefix = %config.api_prefix, "appserver listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let booted = bootstrap(config)?;
    let identity: Arc<dyn IdentityResolver> = match &config.principals_file {
        Some(path) => Arc::new(StaticTokenResolver::from_file(path)?),
        None => {
            tracing::warn!("no principals file configured; every caller is anonymous");
            Arc::new(StaticTokenResolver::new())
        }
    };
    Ok(AppState::new(booted.iam, booted.routes, identity))
}
