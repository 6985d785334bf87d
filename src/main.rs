use std::io;
use std::sync::Arc;

use actix_web::web;
use dotenvy::dotenv;
use saree_checkout::application::checkout_service::CheckoutService;
use saree_checkout::application::order_service::OrderService;
use saree_checkout::config::AppConfig;
use saree_checkout::domain::ports::OrderRepository;
use saree_checkout::infrastructure::catalog_repo::DieselCatalogReader;
use saree_checkout::infrastructure::identity_repo::DieselIdentityProvider;
use saree_checkout::infrastructure::order_repo::DieselOrderRepository;
use saree_checkout::infrastructure::razorpay::RazorpayGateway;
use saree_checkout::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let pool = create_pool(&config.database_url, config.db_connect_timeout)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    run_migrations(&pool).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let gateway = RazorpayGateway::new(&config.razorpay)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let orders: Arc<dyn OrderRepository> = Arc::new(DieselOrderRepository::new(pool.clone()));

    let state = web::Data::new(AppState {
        checkout: CheckoutService::new(
            Arc::new(DieselCatalogReader::new(pool.clone())),
            Arc::new(gateway),
            orders.clone(),
            config.currency.clone(),
        ),
        orders: OrderService::new(orders),
        identity: Arc::new(DieselIdentityProvider::new(pool)),
    });

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
