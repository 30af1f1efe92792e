// Web server entry point
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use candle::Device;
use clap::Parser;
use cosplay_classifier::api;
use cosplay_classifier::config::Args;
use cosplay_classifier::{AppState, ClassNames, CosplayCnn, Predictor};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // Artifacts are loaded before binding so a broken model never serves traffic.
    let class_names = ClassNames::load(&args.labels)
        .with_context(|| format!("failed to load class names from {}", args.labels.display()))?;
    log::info!(
        "loaded {} class names from {}",
        class_names.len(),
        args.labels.display()
    );

    let model = CosplayCnn::load(&args.model, class_names.len(), Device::Cpu)
        .with_context(|| format!("failed to load classifier from {}", args.model.display()))?;

    let predictor = Predictor::new(Arc::new(model), Arc::new(class_names), args.top_k)?;
    let shared_state = web::Data::new(AppState {
        predictor,
        max_upload_bytes: args.max_upload_bytes,
    });

    log::info!("listening on {}:{}", args.host, args.port);
    HttpServer::new(move || {
        App::new()
            .wrap(api::cors())
            .wrap(Logger::default())
            .app_data(shared_state.clone())
            .configure(api::configure)
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await?;

    Ok(())
}
