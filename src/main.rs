//! Plate Lookup - Brazilian license plate recognition and vehicle status server.

mod config;
mod error;
mod ocr;
mod plate;
mod recognizer;
mod report;
mod schema;
mod supabase;
mod vehicle;

use anyhow::Context;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use config::AppConfig;
use error::RecognitionError;
use ocr::tesseract::TesseractSidecar;
use ocr::OcrInput;
use recognizer::Recognizer;
use report::{ReportClient, VehicleReport};
use schema::{ApiResponse, OcrRequest, PlateRequest, RecognitionOutcome, RecognizedPlate};
use std::sync::Arc;
use supabase::{QueryLog, QueryLogClient};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vehicle::{validate_manual_entry, ConsultaClient, VehicleData, VehicleService};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    recognizer: Recognizer,
    vehicles: VehicleService,
    consulta: Option<ConsultaClient>,
    reports: ReportClient,
    query_log: Option<QueryLogClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "plate_lookup=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    info!(
        "Recovery strategy {:?}, correction factor {}, OCR sidecar at {}",
        config.recovery_strategy, config.correction.confidence_factor, config.ocr_sidecar_url
    );

    let http = reqwest::Client::new();
    let provider = TesseractSidecar::new(config.ocr_sidecar_url.clone(), http.clone());

    let consulta = ConsultaClient::new(
        http.clone(),
        config.vehicle_api_url.as_deref(),
        config.vehicle_api_token.as_deref(),
    );
    if consulta.is_none() {
        info!("External vehicle API not configured; /api/consulta disabled");
    }

    let state = AppState {
        recognizer: Recognizer::new(
            Arc::new(provider),
            config.recovery_strategy,
            config.correction,
        ),
        vehicles: VehicleService::new(),
        consulta,
        reports: ReportClient::new(http.clone(), config.vehicle_report_url.as_deref()),
        query_log: QueryLogClient::from_env(http),
    };

    let app = router(state, config.body_limit_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Server listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/ocr", post(recognize_image))
        .route("/api/ocr/upload", post(recognize_upload))
        .route("/api/vehicle", post(lookup_vehicle))
        .route("/api/vehicle/:plate", get(vehicle_report))
        .route("/api/consulta", get(consulta))
        .route("/api/history", get(history))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

fn outcome_response(
    result: Result<RecognizedPlate, RecognitionError>,
) -> (StatusCode, Json<RecognitionOutcome>) {
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status(),
    };
    (status, Json(Recognizer::into_outcome(result)))
}

fn error_response<T: serde::Serialize>(e: &RecognitionError) -> (StatusCode, Json<ApiResponse<T>>) {
    (e.status(), Json(ApiResponse::err(e.to_string())))
}

/// Request the extractor could not parse (bad JSON, content type, body size...).
fn rejected(rejection: impl std::fmt::Display) -> RecognitionError {
    info!("Rejected request: {}", rejection);
    RecognitionError::Input(format!("invalid request: {}", rejection))
}

/// Recognize a plate from a base64 data URL.
async fn recognize_image(
    State(state): State<AppState>,
    request: Result<Json<OcrRequest>, JsonRejection>,
) -> (StatusCode, Json<RecognitionOutcome>) {
    let result = match request {
        Ok(Json(request)) => {
            state
                .recognizer
                .try_recognize_data_url(request.image.as_deref())
                .await
        }
        Err(rejection) => Err(rejected(rejection)),
    };
    outcome_response(result)
}

/// Recognize a plate from a multipart upload (`file` field).
async fn recognize_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> (StatusCode, Json<RecognitionOutcome>) {
    let result = async {
        let mut multipart = multipart.map_err(rejected)?;
        let mut upload = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| RecognitionError::Input(format!("Multipart error: {}", e)))?
        {
            if field.name() == Some("file") {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| RecognitionError::Input(format!("Failed to read file: {}", e)))?;
                upload = Some((filename, data.to_vec()));
                break;
            }
        }

        let (filename, data) =
            upload.ok_or_else(|| RecognitionError::Input("image not provided".to_string()))?;
        let input = OcrInput::from_bytes(filename, data)?;
        state.recognizer.try_recognize(&input).await
    }
    .await;

    outcome_response(result)
}

/// Validate a typed plate and run the vehicle-status lookups.
async fn lookup_vehicle(
    State(state): State<AppState>,
    request: Result<Json<PlateRequest>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse<VehicleData>>) {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return error_response(&rejected(rejection)),
    };
    let plate = match validate_manual_entry(request.plate.as_deref()) {
        Ok(plate) => plate,
        Err(e) => return error_response(&e),
    };

    let data = state.vehicles.lookup(&plate).await;

    if let Some(query_log) = state.query_log.clone() {
        let result_data = serde_json::to_value(&data).unwrap_or_default();
        let plate = plate.as_str().to_string();
        tokio::spawn(async move {
            query_log.log_query(&plate, result_data).await;
        });
    }

    (StatusCode::OK, Json(ApiResponse::ok(data)))
}

/// Detailed report for one plate; demo data when the upstream is unavailable.
async fn vehicle_report(
    State(state): State<AppState>,
    plate: Result<Path<String>, PathRejection>,
) -> (StatusCode, Json<ApiResponse<VehicleReport>>) {
    let plate = plate
        .map_err(rejected)
        .and_then(|Path(raw)| validate_manual_entry(Some(&raw)));
    match plate {
        Ok(plate) => (
            StatusCode::OK,
            Json(ApiResponse::ok(state.reports.report(&plate).await)),
        ),
        Err(e) => error_response(&e),
    }
}

#[derive(serde::Deserialize)]
struct ConsultaQuery {
    placa: Option<String>,
}

/// Proxy a validated plate to the external vehicle API.
async fn consulta(
    State(state): State<AppState>,
    query: Result<Query<ConsultaQuery>, QueryRejection>,
) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let plate = query
        .map_err(rejected)
        .and_then(|Query(query)| validate_manual_entry(query.placa.as_deref()));
    let plate = match plate {
        Ok(plate) => plate,
        Err(e) => return error_response(&e),
    };

    let Some(client) = state.consulta.as_ref() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::err("vehicle API not configured")),
        );
    };

    match client.fetch(&plate).await {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => {
            error!("Vehicle API lookup for {} failed: {:#}", plate, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("failed to query vehicle API. Check the API token.")),
            )
        }
    }
}

#[derive(serde::Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

/// Recent lookups, newest first.
async fn history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<QueryLog>>, (StatusCode, Json<ApiResponse<()>>)> {
    let Query(query) = query.map_err(|rejection| error_response::<()>(&rejected(rejection)))?;
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    match state.query_log.as_ref() {
        Some(client) => Ok(Json(client.fetch_history(limit).await)),
        None => Ok(Json(Vec::new())),
    }
}
