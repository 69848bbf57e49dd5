use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tokio::sync::Semaphore;
use tracing::info;

use crate::config::ServerConfig;
use crate::server_handlers::{
    datafiles_list_handler, generate_handler, help_handler, solve_get_handler, solve_handler,
};

/// Estado compartido por los handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Limita las búsquedas bloqueantes simultáneas.
    pub semaphore: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let permits = config.max_concurrent_searches.max(1);
        Self { config, semaphore: Arc::new(Semaphore::new(permits)) }
    }
}

/// Rutas de la API (se reutiliza en los tests con `actix_web::test`).
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/solve", web::post().to(solve_handler))
        .route("/solve", web::get().to(solve_get_handler))
        .route("/generate", web::get().to(generate_handler))
        .route("/datafiles", web::get().to(datafiles_list_handler))
        .route("/help", web::get().to(help_handler));
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let bind = config.bind.clone();
    info!(
        bind = %bind,
        max_concurrent_searches = config.max_concurrent_searches,
        constraints = ?config.constraints_path,
        "iniciando servidor"
    );
    let state = web::Data::new(AppState::new(config));
    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(bind.as_str())?
        .run()
        .await
}
