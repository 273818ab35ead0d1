use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::dto::{
    check_message, BatchClassifyRequest, BatchClassifyResponse, BatchMetadata, CategoriesResponse,
    CategoryInfo, ClassifyRequest, ClassifyResponse, HealthResponse,
};
use super::AppState;
use crate::brain::Intent;
use crate::error::AppError;

/// Client IP used as the rate-limit key; the port is dropped.
///
/// Forwarding headers are client-controlled, so they are only read when
/// `trust_proxy_headers` is set. Otherwise the TCP peer decides.
fn client_key(req: &HttpRequest, trust_proxy_headers: bool) -> String {
    if !trust_proxy_headers {
        return req
            .peer_addr()
            .map(|socket| socket.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
    }

    let info = req.connection_info();
    let addr = info.realip_remote_addr().unwrap_or("unknown");
    addr.parse::<SocketAddr>()
        .map(|socket| socket.ip().to_string())
        .unwrap_or_else(|_| addr.to_string())
}

/// Applies the per-client request limit.
fn enforce_rate_limit(state: &AppState, req: &HttpRequest) -> Result<(), AppError> {
    let client = client_key(req, state.config.trust_proxy_headers);
    let mut limiter = state
        .limiter
        .lock()
        .map_err(|e| AppError::Internal(format!("Rate limiter lock poisoned: {}", e)))?;
    if limiter.check(&client) {
        Ok(())
    } else {
        warn!(
            client = %client,
            tracked_clients = limiter.tracked_clients(),
            "Rate limit exceeded"
        );
        Err(AppError::RateLimited)
    }
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let llm_available = state.pipeline.llm_available().await;
    HttpResponse::Ok().json(HealthResponse {
        status: if llm_available { "ok" } else { "degraded" }.to_string(),
        model: state.config.llm.model.clone(),
        llm_available,
        timestamp: Utc::now(),
    })
}

pub async fn categories() -> HttpResponse {
    HttpResponse::Ok().json(CategoriesResponse {
        categories: Intent::ALL
            .iter()
            .map(|intent| CategoryInfo {
                name: *intent,
                description: intent.description().to_string(),
            })
            .collect(),
    })
}

#[instrument(skip(state, req, body))]
pub async fn classify(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ClassifyRequest>,
) -> Result<HttpResponse, AppError> {
    enforce_rate_limit(&state, &req)?;
    let body = body.into_inner();
    body.validate()?;
    check_message(&body.message, state.config.max_message_length)?;

    let with_reasoning = body.include_reasoning || state.config.enable_reasoning;
    let turn = state.pipeline.run(&body.message, with_reasoning).await;

    Ok(HttpResponse::Ok().json(ClassifyResponse::from_turn(turn, &state.config.llm.model)))
}

#[instrument(skip(state, req, body))]
pub async fn classify_batch(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<BatchClassifyRequest>,
) -> Result<HttpResponse, AppError> {
    enforce_rate_limit(&state, &req)?;
    let body = body.into_inner();
    body.validate()?;

    let limit = state.config.max_batch_size;
    if body.messages.len() > limit {
        return Err(AppError::Validation(format!(
            "Batch holds {} messages, the limit is {}",
            body.messages.len(),
            limit
        )));
    }
    for (index, message) in body.messages.iter().enumerate() {
        if let Err(AppError::Validation(reason)) =
            check_message(message, state.config.max_message_length)
        {
            return Err(AppError::Validation(format!("messages[{}]: {}", index, reason)));
        }
    }

    info!(count = body.messages.len(), "Classifying batch");
    let started = Instant::now();
    let with_reasoning = body.include_reasoning || state.config.enable_reasoning;
    let turns = state.pipeline.run_batch(&body.messages, with_reasoning).await;

    let model = &state.config.llm.model;
    let results: Vec<ClassifyResponse> = turns
        .into_iter()
        .map(|turn| ClassifyResponse::from_turn(turn, model))
        .collect();

    Ok(HttpResponse::Ok().json(BatchClassifyResponse {
        total: results.len(),
        results,
        metadata: BatchMetadata {
            processing_time_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
            model: model.clone(),
        },
    }))
}
