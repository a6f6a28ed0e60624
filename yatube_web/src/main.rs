use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use yatube_core::{config, Yatube};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("yatube_core=debug,yatube_web=debug,info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter)
        .init();

    let config = config::get_or_init()
        .await
        .context("failed to load config")?;
    let addr = (config.bind_address.clone(), config.port);

    let yatube = Yatube::start(config)
        .await
        .context("failed to start yatube")?;
    let state = web::Data::new(yatube.clone());

    tracing::info!(address = %addr.0, port = addr.1, "yatube listening");

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .configure(yatube_web::configure)
    })
    .bind(addr)
    .context("failed to bind http listener")?
    .run()
    .await?;

    yatube.shutdown().await?;
    Ok(())
}
