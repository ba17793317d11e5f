use std::{future::IntoFuture, process, sync::Arc};

use ddd_directory::{
    application::{
        contacts::ContactService,
        error::AppError,
        regions::RegionService,
        repos::{ContactsRepo, ContactsWriteRepo, RegionsRepo, RegionsWriteRepo, StoreHealth},
    },
    cache::{CacheBackend, CacheConfig, CacheCoordinator, MemoryCache, RedisCache},
    config::{self, CacheBackendKind},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    PostgresRepositories::run_migrations(repositories.pool())
        .await
        .map_err(|err| AppError::from(InfraError::Migrate(err)))?;
    info!(target = "directory::migrate", "Migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    PostgresRepositories::run_migrations(repositories.pool())
        .await
        .map_err(|err| AppError::from(InfraError::Migrate(err)))?;

    let cache = build_cache(&settings.cache)?;
    info!(
        target = "directory::serve",
        enabled = cache.config().enabled,
        backend = cache.backend_name(),
        "Cache configured"
    );

    let state = build_app_state(repositories, cache);
    serve_http(&settings, state).await
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| AppError::from(InfraError::MissingDatabaseUrl))?;

    let pool = PostgresRepositories::connect(database_url, &settings.database)
        .await
        .map_err(|err| AppError::from(InfraError::Connect(err)))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_cache(settings: &config::CacheSettings) -> Result<CacheCoordinator, AppError> {
    let config = CacheConfig::from(settings);
    let backend: Arc<dyn CacheBackend> = match settings.backend {
        CacheBackendKind::Redis => Arc::new(
            RedisCache::open(&settings.redis_url).map_err(InfraError::from)?,
        ),
        CacheBackendKind::Memory => Arc::new(MemoryCache::new(config.memory_capacity_non_zero())),
    };
    Ok(CacheCoordinator::new(config, backend))
}

fn build_app_state(repositories: Arc<PostgresRepositories>, cache: CacheCoordinator) -> AppState {
    let regions_repo: Arc<dyn RegionsRepo> = repositories.clone();
    let regions_write_repo: Arc<dyn RegionsWriteRepo> = repositories.clone();
    let contacts_repo: Arc<dyn ContactsRepo> = repositories.clone();
    let contacts_write_repo: Arc<dyn ContactsWriteRepo> = repositories.clone();
    let store: Arc<dyn StoreHealth> = repositories;

    let regions = RegionService::new(
        regions_repo.clone(),
        regions_write_repo,
        contacts_repo.clone(),
        cache.clone(),
    );
    let contacts = ContactService::new(contacts_repo, contacts_write_repo, regions_repo, cache);

    AppState {
        regions: Arc::new(regions),
        contacts: Arc::new(contacts),
        store,
    }
}

async fn serve_http(settings: &config::Settings, state: AppState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|source| {
            AppError::from(InfraError::Bind {
                addr: settings.server.addr,
                source,
            })
        })?;
    info!(
        target = "directory::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move { shutdown.notified().await }
        })
        .into_future();
    let mut server = tokio::spawn(server);

    tokio::select! {
        joined = &mut server => return flatten_server_result(joined),
        () = shutdown_signal() => {}
    }

    info!(target = "directory::serve", "Shutdown signal received, draining");
    shutdown.notify_one();
    match tokio::time::timeout(settings.server.graceful_shutdown, &mut server).await {
        Ok(joined) => flatten_server_result(joined),
        Err(_) => {
            warn!(
                target = "directory::serve",
                grace_secs = settings.server.graceful_shutdown.as_secs(),
                "Graceful shutdown timed out, aborting open connections"
            );
            server.abort();
            Ok(())
        }
    }
}

fn flatten_server_result(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(AppError::from(InfraError::Server(err))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
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
}
