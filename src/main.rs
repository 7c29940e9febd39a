use std::error::Error;
use std::sync::Arc;

use actix_web::web;
use delivery_service::application::dispatcher::NotificationDispatcher;
use delivery_service::config::AppConfig;
use delivery_service::infrastructure::directory_repo::DieselDirectory;
use delivery_service::infrastructure::notifier::Notifier;
use delivery_service::infrastructure::outbox_repo::DieselOutboxStore;
use delivery_service::{build_server, create_pool, order_service, run_migrations};
use dotenvy::dotenv;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, config.pool_size)?;
    run_migrations(&pool)?;

    let sink = Notifier::from_webhook_url(config.notification_webhook_url.as_deref())?;
    match &sink {
        Notifier::Webhook(_) => log::info!("Notifications will be POSTed to the configured webhook"),
        Notifier::Log(_) => log::info!("No notification webhook configured; notifications are logged"),
    }
    let dispatcher = NotificationDispatcher::new(
        Arc::new(DieselOutboxStore::new(pool.clone())),
        Arc::new(DieselDirectory::new(pool.clone())),
        sink,
        config.dispatch_batch_size,
    );
    actix_web::rt::spawn(dispatcher.run(config.dispatch_interval));

    let service = web::Data::new(order_service(&pool, config.max_delivery_km));

    log::info!(
        "Starting server at http://{}:{} (delivery range {} km)",
        config.host,
        config.port,
        config.max_delivery_km
    );

    build_server(service, &config.host, config.port)?.await?;
    Ok(())
}
