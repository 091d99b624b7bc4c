mod api;
mod middleware;

use std::sync::Arc;

use mobsync_db::{OfferStore, PgOfferStore};
use mobsync_sync::OfferSynchronizer;
use mobsync_upstream::{MobgranClient, OfferSource, UpstreamSettings};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = mobsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, bind_addr = %config.bind_addr, "starting mobsync-server");

    let pool = mobsync_db::connect_pool_from_config(&config).await?;
    let applied = mobsync_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let client = MobgranClient::new(&UpstreamSettings::from_app_config(&config))?;
    let source: Arc<dyn OfferSource> = Arc::new(client);
    let store: Arc<dyn OfferStore> = Arc::new(PgOfferStore::new(pool.clone()));
    let synchronizer = Arc::new(OfferSynchronizer::new(
        source,
        store,
        config.provider_domain.clone(),
    ));

    let auth = AuthState::from_env(matches!(
        config.env,
        mobsync_core::Environment::Development
    ))?;
    let app = build_app(
        AppState { pool, synchronizer },
        auth,
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
