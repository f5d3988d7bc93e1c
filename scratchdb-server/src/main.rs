use actix_web::{middleware, web, App, HttpServer};
use scratchdb::Engine;

mod handlers;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let db_path = std::env::var("SCRATCHDB_DB").unwrap_or_else(|_| "db.json".to_string());
    let host = std::env::var("SCRATCHDB_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("SCRATCHDB_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    log::info!("Opening database at: {db_path}");
    let engine = web::Data::new(Engine::open(db_path));

    // Touch the backing file up front so a bad path fails at startup
    // instead of on the first request.
    engine
        .store()
        .load()
        .map_err(|e| std::io::Error::other(format!("Failed to open database: {e}")))?;

    log::info!("Listening on {host}:{port}");
    HttpServer::new(move || {
        App::new()
            .app_data(engine.clone())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
