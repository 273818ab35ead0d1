//! HTTP front end.
//!
//! Every route lives under `/api`. Invalid bodies are rejected with a JSON
//! 400 before the pipeline runs; pipeline failures are reported inside a 200
//! body, never as HTTP errors.

pub mod dto;
pub mod handlers;

use std::sync::Mutex;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use tracing::{error, info};

use crate::brain::IntentPipeline;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::rate_limiter::RateLimiter;

const DEFAULT_WORKER_COUNT: usize = 4;

pub struct AppState {
    pub config: AppConfig,
    pub pipeline: IntentPipeline,
    pub limiter: Mutex<RateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: IntentPipeline) -> Self {
        let limiter = RateLimiter::new(
            config.rate_limit_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        );
        Self {
            config,
            pipeline,
            limiter: Mutex::new(limiter),
        }
    }
}

/// Turns body deserialisation failures into the API's JSON 400.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/categories", web::get().to(handlers::categories))
            .route("/classify", web::post().to(handlers::classify))
            .route("/classify/batch", web::post().to(handlers::classify_batch)),
    );
}

pub async fn run(config: AppConfig, pipeline: IntentPipeline) -> Result<(), AppError> {
    let address = config.bind_address();
    let app_state = web::Data::new(AppState::new(config, pipeline));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .configure(app_config)
    })
    .workers(DEFAULT_WORKER_COUNT)
    .bind(&address)
    .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", address, e)))?
    .run();

    info!("Soul Buddy API listening on http://{}", address);

    server.await.map_err(|e| {
        error!("Web server error: {}", e);
        AppError::Internal(format!("Web server error: {}", e))
    })
}
