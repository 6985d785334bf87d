pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::checkout_service::CheckoutService;
use application::order_service::OrderService;
use domain::ports::IdentityProvider;
use errors::AppError;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Shared by every worker. The services own their ports.
pub struct AppState {
    pub checkout: CheckoutService,
    pub orders: OrderService,
    pub identity: Arc<dyn IdentityProvider>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::payments::create_order,
        handlers::payments::verify_payment,
        handlers::orders::get_order,
        handlers::admin::list_orders,
        handlers::admin::update_order_status,
        handlers::admin::delete_order,
    ),
    tags(
        (name = "payments", description = "Two-phase checkout against the payment gateway"),
        (name = "orders", description = "Order lookup"),
        (name = "admin", description = "Order management, admin sessions only"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

/// Registers every route. Shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected request body: {}", err);
        AppError::BadRequest("Invalid request body".to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected query string: {}", err);
        AppError::BadRequest("Invalid query parameters".to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected path: {}", err);
        AppError::BadRequest("Invalid path parameters".to_string()).into()
    }))
    .route("/health", web::get().to(handlers::health))
    .service(
        web::scope("/payments")
            .route("/create-order", web::post().to(handlers::payments::create_order))
            .route("/verify", web::post().to(handlers::payments::verify_payment)),
    )
    .route("/orders/{id}", web::get().to(handlers::orders::get_order))
    .service(
        web::scope("/admin/orders")
            .route("", web::get().to(handlers::admin::list_orders))
            .route("/{id}/status", web::patch().to(handlers::admin::update_order_status))
            .route("/{id}", web::delete().to(handlers::admin::delete_order)),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: web::Data<AppState>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
            .configure(configure)
    })
    .bind((host.to_string(), port))?
    .run())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();

        for path in [
            "/health",
            "/payments/create-order",
            "/payments/verify",
            "/orders/{id}",
            "/admin/orders",
            "/admin/orders/{id}/status",
            "/admin/orders/{id}",
        ] {
            assert!(paths.contains_key(path), "{path} missing from OpenAPI document");
        }
        assert!(doc["paths"]["/health"].get("get").is_some());
    }
}
