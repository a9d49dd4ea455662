use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use aerobook_api::{app, state::{AppState, AuthConfig, PaymentSettings}};
use aerobook_core::payment::{MockPaymentGateway, PaymentGateway};
use aerobook_core::Store;
use aerobook_store::app_config::{Config, PaymentProvider, StoreBackend};
use aerobook_store::{DbClient, MemoryStore, PgStore, RazorpayClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aerobook_api=debug,aerobook_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Aerobook API on port {}", config.server.port);

    let store: Arc<dyn Store> = match config.store.backend {
        StoreBackend::Postgres => {
            let db = DbClient::new(&config.database.url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Arc::new(PgStore::new(db.pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, nothing survives a restart");
            let seed = &config.store.seed;
            let store = MemoryStore::with_accounts(seed.users(), seed.admins()).await;
            tracing::info!("Seeded {} users and {} admins", seed.users.len(), seed.admins.len());
            Arc::new(store)
        }
    };

    let payment = &config.payment;
    let gateway: Arc<dyn PaymentGateway> = match payment.provider {
        PaymentProvider::Razorpay => Arc::new(
            RazorpayClient::new(
                &payment.key_id,
                &payment.key_secret,
                &payment.base_url,
                Duration::from_secs(payment.timeout_seconds),
            )
            .context("Failed to build payment gateway client")?,
        ),
        PaymentProvider::Mock => {
            tracing::warn!("Using the mock payment gateway");
            Arc::new(MockPaymentGateway)
        }
    };

    let app_state = AppState::new(
        store,
        gateway,
        PaymentSettings { currency: &payment.currency, key_secret: &payment.key_secret },
        AuthConfig { secret: config.auth.jwt_secret.clone() },
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
