use std::net::SocketAddr;

use anyhow::Context as _;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use rxdesk_auth_types::token::TokenKeys;
use rxdesk_core::envelope::expose_internal_detail;
use rxdesk_core::health::mark_started;
use rxdesk_core::tracing::init_tracing;
use rxdesk_pharmacy::config::PharmacyConfig;
use rxdesk_pharmacy::router::build_router;
use rxdesk_pharmacy::state::AppState;
use rxdesk_pharmacy::usecase::bootstrap::SeedAdminUseCase;
use rxdesk_pharmacy_migration::Migrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    mark_started();

    let config = PharmacyConfig::from_env()?;
    expose_internal_detail(config.is_development());

    let mut options = ConnectOptions::new(&config.database_url);
    options.sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .context("failed to connect to database")?;
    Migrator::up(&db, None)
        .await
        .context("failed to apply migrations")?;

    let state = AppState::new(
        db.clone(),
        TokenKeys::new(&config.jwt_secret, config.jwt_ttl_secs),
    );

    if let Some(seed) = &config.admin_seed {
        let usecase = SeedAdminUseCase {
            repo: state.user_repo(),
        };
        let created = usecase
            .execute(&seed.email, &seed.password)
            .await
            .context("failed to seed admin account")?;
        if created {
            info!(email = %seed.email, "default admin created");
        }
    }

    let router = build_router(state, &config.cors_origins, config.rate_limit);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        env = %config.app_env,
        rate_limit = ?config.rate_limit,
        "pharmacy service listening on {addr}"
    );
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await.context("failed to close database")?;
    info!("pharmacy service stopped");
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}
