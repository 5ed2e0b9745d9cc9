use actix_web::{App, HttpResponse, HttpServer, middleware, web};

use rollcall::config::{AppConfig, StoreKind};
use rollcall::db;
use rollcall::errors::{AppError, ApiErrorResponse};
use rollcall::handlers::{self, AppState};
use rollcall::store::{MemoryStore, PgStore, Store};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    match config.store {
        StoreKind::Postgres => {
            let url = config.database_url.as_deref().unwrap_or_default();
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .map_err(into_io)?;
            db::run_migrations(&pool).await.map_err(into_io)?;
            serve(PgStore::new(pool), &config).await
        }
        StoreKind::Memory => {
            log::warn!("Using the in-memory store; all data is lost on restart");
            serve(MemoryStore::new(), &config).await
        }
    }
}

async fn serve<S: Store>(store: S, config: &AppConfig) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(store, config.unmarked_policy));

    log::info!(
        "Starting server at http://{} (unmarked events: {:?})",
        config.bind_addr,
        config.unmarked_policy
    );

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure::<S>)
            .default_service(web::to(not_found))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiErrorResponse {
        error: "Not found".to_string(),
        details: vec![],
    })
}

fn into_io(e: AppError) -> std::io::Error {
    log::error!("Startup failed: {e}");
    std::io::Error::other(e.to_string())
}
