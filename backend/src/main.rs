//! Backend entry-point: wires the GraphQL endpoint, sessions, and probes.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::SameSite;
use actix_web::{App, HttpServer, web};
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::graphql;
use backend::outbound::persistence::{DbPool, PoolConfig};
use backend::server::health::{HealthState, live, ready};
use backend::server::{AppConfig, build_production_schema};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

fn run_migrations(database_url: &str) -> Result<(), std::io::Error> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| std::io::Error::other(format!("database connection failed: {err}")))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| std::io::Error::other(format!("migrations failed: {err}")))?;
    Ok(())
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %err, "tracing init failed");
    }

    let config = AppConfig::from_env(&mockable::DefaultEnv::new())
        .map_err(|err| std::io::Error::other(err.to_string()))?;

    let database_url = config.database_url.clone();
    tokio::task::spawn_blocking(move || run_migrations(&database_url))
        .await
        .map_err(|err| std::io::Error::other(err.to_string()))??;

    let pool = DbPool::new(
        PoolConfig::new(&config.database_url).with_max_size(config.pool_max_size),
    )
    .await
    .map_err(|err| std::io::Error::other(err.to_string()))?;
    let schema = build_production_schema(&config, pool)
        .map_err(|err| std::io::Error::other(err.to_string()))?;

    let key = config.session.key.clone();
    let cookie_secure = config.session.cookie_secure;
    let schema_data = web::Data::new(schema);
    let health_state = web::Data::new(HealthState::new());
    // Clone for the server factory so the readiness probe stays reachable.
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".into())
            .cookie_path("/".into())
            .cookie_secure(cookie_secure)
            .cookie_http_only(true)
            .cookie_same_site(SameSite::Lax)
            .build();

        App::new()
            .app_data(schema_data.clone())
            .app_data(server_health_state.clone())
            .service(
                web::scope("/api")
                    .wrap(session)
                    .route("", web::post().to(graphql::graphql)),
            )
            .service(ready)
            .service(live)
    })
    .bind(config.bind_addr)?;

    info!(addr = %config.bind_addr, "server listening");
    health_state.mark_ready();
    server.run().await
}
