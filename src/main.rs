use library_lending::{
    adapters::memory::{InMemoryAccounts, InMemoryLibrary},
    adapters::postgres::{
        PostgresAccountRepository, PostgresBookRepository, PostgresBorrowRecordRepository,
        PostgresLendingStore,
    },
    api::{handlers::AppState, router::create_router},
    application::{ServiceDependencies, accounts},
    config::{AppConfig, DatabaseConfig, StorageBackend},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// PostgreSQLに接続し、マイグレーションを適用した依存関係を作成
async fn postgres_dependencies(config: &DatabaseConfig) -> Result<ServiceDependencies, BoxError> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(ServiceDependencies {
        books: Arc::new(PostgresBookRepository::new(pool.clone())),
        borrow_records: Arc::new(PostgresBorrowRecordRepository::new(pool.clone())),
        lending_store: Arc::new(PostgresLendingStore::new(pool.clone())),
        accounts: Arc::new(PostgresAccountRepository::new(pool)),
    })
}

/// プロセス内メモリの依存関係（再起動でデータは消える）
fn memory_dependencies() -> ServiceDependencies {
    let library = Arc::new(InMemoryLibrary::new());

    ServiceDependencies {
        books: library.clone(),
        borrow_records: library.clone(),
        lending_store: library,
        accounts: Arc::new(InMemoryAccounts::new()),
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let service_deps = match config.storage.backend {
        StorageBackend::Postgres => {
            tracing::info!(
                max_connections = config.database.max_connections,
                "Using PostgreSQL storage"
            );
            postgres_dependencies(&config.database).await?
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            memory_dependencies()
        }
    };

    if let (Some(username), Some(password)) =
        (&config.auth.admin_username, &config.auth.admin_password)
    {
        accounts::ensure_admin(&service_deps, username, password).await?;
    }

    // Create application state
    let app_state = Arc::new(AppState {
        service_deps,
        auth: config.auth.clone(),
    });

    // Create router
    let app = create_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
