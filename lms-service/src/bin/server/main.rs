use std::sync::Arc;

use auth::PasswordHasher;
use auth::Role;
use auth::TokenCodec;
use chrono::Utc;
use lms_service::account::models::Account;
use lms_service::account::models::AccountId;
use lms_service::account::models::EmailAddress;
use lms_service::account::ports::AccountRepository;
use lms_service::account::service::AccountService;
use lms_service::config::Config;
use lms_service::config::SeedConfig;
use lms_service::inbound::http::router::create_router;
use lms_service::outbound::repositories::PostgresAccountRepository;
use lms_service::outbound::repositories::PostgresEnrollmentStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lms_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "lms-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    // Fails here if no signing secret is configured; an unsigned deployment
    // must not come up.
    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        import_concurrency = config.import.concurrency,
        import_allow_tutor = config.import.allow_tutor,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let token_codec = Arc::new(TokenCodec::new(
        config.jwt.secret.as_bytes(),
        config.jwt.expiration_hours,
    ));
    let account_repository = Arc::new(PostgresAccountRepository::new(pg_pool.clone()));
    let enrollment_store = Arc::new(PostgresEnrollmentStore::new(pg_pool));

    if let Some(seed) = &config.seed {
        seed_admin(account_repository.as_ref(), seed).await?;
    }

    let account_service = Arc::new(AccountService::new(
        Arc::clone(&account_repository),
        enrollment_store,
        Arc::clone(&token_codec),
        config.import.concurrency,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let application = create_router(account_service, token_codec, config.import.allow_tutor);

    axum::serve(http_listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited");

    Ok(())
}

/// Ensure the administrator account exists.
///
/// The seeded administrator is the one account that starts without a
/// pending password reset; every provisioned account starts with one.
async fn seed_admin(
    accounts: &PostgresAccountRepository,
    seed: &SeedConfig,
) -> Result<(), anyhow::Error> {
    if accounts.find_by_email(&seed.admin_email).await?.is_some() {
        return Ok(());
    }

    let password_hash = PasswordHasher::new().hash(&seed.admin_password)?;

    accounts
        .create(Account {
            id: AccountId::new(),
            email: EmailAddress::new(seed.admin_email.clone())?,
            password_hash,
            role: Role::Admin,
            must_reset_password: false,
            login_attempts: 0,
            tutor_id: None,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(email = %seed.admin_email, "Seeded administrator account");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
