pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use application::order_service::OrderService;
use domain::geo::DeliveryRange;
use errors::AppError;
use infrastructure::directory_repo::DieselDirectory;
use infrastructure::order_repo::DieselOrderRepository;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// The order service as wired against PostgreSQL.
pub type AppOrderService = OrderService<DieselOrderRepository, DieselDirectory>;

type MigrationError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), MigrationError> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    if !applied.is_empty() {
        log::info!("Applied {} migration(s)", applied.len());
    }
    Ok(())
}

pub fn order_service(pool: &DbPool, max_delivery_km: f64) -> AppOrderService {
    OrderService::new(
        DieselOrderRepository::new(pool.clone()),
        DieselDirectory::new(pool.clone()),
        DeliveryRange::new(max_delivery_km),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::place_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::rate_order,
        handlers::employer::my_orders,
        handlers::employer::active_delivery,
        handlers::employer::accept_order,
        handlers::employer::update_status,
        handlers::employer::mark_delivered,
        handlers::employer::update_location,
        handlers::employer::dashboard,
        handlers::employer::delivery_history,
        handlers::employer::performance_stats,
        handlers::admin::list_orders,
        handlers::admin::get_order,
        handlers::admin::assign_employer,
        handlers::admin::delete_order,
    ),
    tags(
        (name = "customer", description = "Placing, viewing and rating orders"),
        (name = "employer", description = "Courier workflow"),
        (name = "admin", description = "Order administration"),
    )
)]
pub struct ApiDoc;

/// Route table plus extractor error handling, shared by the server and the
/// HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    use handlers::{admin, employer, orders};

    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::validation("body", err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::validation("query", err.to_string()).into()
    }))
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| AppError::NotFound("Order not found.".to_string()).into()),
    )
    .service(
        web::scope("/orders")
            .route("", web::post().to(orders::place_order))
            .route("", web::get().to(orders::list_orders))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}/rate", web::post().to(orders::rate_order))
            .route("/{id}/assign", web::put().to(admin::assign_employer))
            .route("/{id}/status", web::put().to(employer::update_status))
            .route("/{id}/status", web::patch().to(employer::update_status)),
    )
    .service(
        web::scope("/employer")
            .route("/orders", web::get().to(employer::my_orders))
            .route("/orders/active", web::get().to(employer::active_delivery))
            .route("/orders/{id}/accept", web::post().to(employer::accept_order))
            .route("/orders/{id}/status", web::put().to(employer::update_status))
            .route("/orders/{id}/status", web::patch().to(employer::update_status))
            .route("/orders/{id}/deliver", web::post().to(employer::mark_delivered))
            .route("/location", web::post().to(employer::update_location))
            .route("/dashboard", web::get().to(employer::dashboard))
            .route("/history", web::get().to(employer::delivery_history))
            .route("/stats", web::get().to(employer::performance_stats)),
    )
    .service(
        web::scope("/admin")
            .route("/orders", web::get().to(admin::list_orders))
            .route("/orders/{id}", web::get().to(admin::get_order))
            .route("/orders/{id}", web::delete().to(admin::delete_order))
            .route("/orders/{id}/assign", web::put().to(admin::assign_employer))
            .route("/orders/{id}/status", web::put().to(employer::update_status))
            .route("/orders/{id}/status", web::patch().to(employer::update_status)),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    service: web::Data<AppOrderService>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
