use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_appender::rolling;

use hr_ledger::auth::jwt::generate_access_token;
use hr_ledger::config::Config;
use hr_ledger::db::init_db;
use hr_ledger::ledger::LedgerEngine;
use hr_ledger::model::role::Role;
use hr_ledger::routes;
use hr_ledger::store::{MemoryStore, MySqlStore, Store};

#[get("/")]
async fn index() -> impl Responder {
    "HR ledger is running"
}

/// `hr-ledger token <employee_id> <role>` prints a bearer token for local use.
fn print_token(config: &Config, mut args: impl Iterator<Item = String>) -> anyhow::Result<()> {
    let employee_id = args.next().context("usage: hr-ledger token <employee_id> <role>")?;
    let role: Role = args
        .next()
        .context("usage: hr-ledger token <employee_id> <role>")?
        .parse()
        .context("role must be admin, supervisor or worker")?;
    let token = generate_access_token(
        &employee_id,
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )?;
    println!("{token}");
    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database_url {
        Some(url) => {
            let pool = init_db(url, config.store_timeout_secs)
                .await
                .context("Failed to connect to database")?;
            info!("Using MySQL store");
            Ok(Arc::new(MySqlStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Logs every committed ledger change. Stands in for the notification channel.
async fn run_notifier(engine: Arc<LedgerEngine>) {
    let mut events = engine.subscribe();
    loop {
        match events.recv().await {
            Ok(event) => info!(employee_id = event.employee_id(), ?event, "Ledger event"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Notifier fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("token") {
        return print_token(&config, args);
    }

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store = open_store(&config).await?;
    let engine = Data::new(LedgerEngine::new(store).await.map_err(|e| {
        error!(error = %e, "Failed to load leave types");
        anyhow::anyhow!("ledger startup failed: {e}")
    })?);

    actix_web::rt::spawn(run_notifier(engine.clone().into_inner()));

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .app_data(engine.clone())
            .app_data(config_data.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config_data))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
