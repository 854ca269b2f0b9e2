use crate::config::Config;
use crate::engines::{EngineInfo, EngineRegistry};
use crate::error::OcrError;
use crate::geometry::Rectangle;
use crate::pixels;
use crate::processor::{OcrResult, PlateProcessor, ProcessorOptions};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engines: Arc<EngineRegistry>,
    pub config: Arc<Config>,
}

/// Recognition response
#[derive(Serialize)]
pub struct ProcessResponse {
    pub engine: String,
    pub processing_time_ms: u64,
    pub results: Vec<OcrResult>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub default_engine: String,
    pub available_engines: Vec<EngineInfo>,
    pub char_whitelist: String,
    pub max_file_size_bytes: usize,
}

/// Which processor entry point a request runs
#[derive(Debug, Clone, Copy)]
enum Mode {
    Track,
    TrackInner,
    Rect,
}

/// Parsed multipart request
struct ProcessRequest {
    image: DynamicImage,
    options: ProcessorOptions,
    rect: Option<Rectangle>,
    engine: Option<String>,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let engines = EngineRegistry::new(&config)?;
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState {
        engines: Arc::new(engines),
        config: Arc::new(config),
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/track", post(handle_track))
        .route("/track-inner", post(handle_track_inner))
        .route("/recognize", post(handle_recognize))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_file_size)),
        )
        .with_state(state)
}

async fn handle_track(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, OcrError> {
    process(state, multipart, Mode::Track).await
}

async fn handle_track_inner(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, OcrError> {
    process(state, multipart, Mode::TrackInner).await
}

async fn handle_recognize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ProcessResponse>, OcrError> {
    process(state, multipart, Mode::Rect).await
}

async fn process(
    state: AppState,
    multipart: Multipart,
    mode: Mode,
) -> Result<Json<ProcessResponse>, OcrError> {
    let start = Instant::now();
    let request = parse_request(&state, multipart).await?;

    let engine = match &request.engine {
        Some(name) => state
            .engines
            .get(name)
            .ok_or_else(|| OcrError::InvalidRequest(format!("Unknown engine: {}", name)))?,
        None => state
            .engines
            .default_engine()
            .ok_or_else(|| OcrError::Internal("No default engine".to_string()))?,
    };

    let rect = match mode {
        Mode::Rect => Some(request.rect.ok_or_else(|| {
            OcrError::InvalidRequest("Missing 'rect' field for /recognize".to_string())
        })?),
        _ => None,
    };

    let processor = PlateProcessor::new(engine, state.config.char_whitelist.clone());
    let engine_name = processor.engine_name().to_string();
    let ProcessRequest { image, options, .. } = request;

    // Pixel work and recognition are blocking; keep them off the async workers
    let results = tokio::task::spawn_blocking(move || match (mode, rect) {
        (Mode::Track, _) => processor.track(&image, &options),
        (Mode::TrackInner, _) => processor.track_inner(&image, &options),
        (Mode::Rect, Some(rect)) => processor.recognize_from_rect(&image, rect, &options),
        (Mode::Rect, None) => Ok(Vec::new()),
    })
    .await
    .map_err(|e| OcrError::Internal(format!("Recognition task failed: {}", e)))?
    .inspect_err(|e| {
        if e.is_recognition_failure() {
            tracing::warn!("{:?} aborted by {}: {}", mode, engine_name, e);
        }
    })?;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "{:?} completed in {}ms with {}: {} results",
        mode,
        processing_time_ms,
        engine_name,
        results.len()
    );

    Ok(Json(ProcessResponse {
        engine: engine_name,
        processing_time_ms,
        results,
    }))
}

/// Read `file`, optional raw-buffer `width`/`height`, `options`, `rect` and `engine` fields
async fn parse_request(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<ProcessRequest, OcrError> {
    let mut file_data: Option<Bytes> = None;
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut options = ProcessorOptions::default();
    let mut rect: Option<Rectangle> = None;
    let mut engine: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OcrError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                file_data = Some(field.bytes().await.map_err(|e| {
                    OcrError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?);
            }
            "options" => {
                let text = field_text(field, "options").await?;
                options = serde_json::from_str(&text)
                    .map_err(|e| OcrError::InvalidRequest(format!("Invalid options: {}", e)))?;
            }
            "rect" => {
                let text = field_text(field, "rect").await?;
                rect = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| OcrError::InvalidRequest(format!("Invalid rect: {}", e)))?,
                );
            }
            "width" => width = Some(parse_dimension(&field_text(field, "width").await?)?),
            "height" => height = Some(parse_dimension(&field_text(field, "height").await?)?),
            "engine" => engine = Some(field_text(field, "engine").await?),
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or(OcrError::MissingFile)?;

    if data.len() > state.config.max_file_size {
        return Err(OcrError::ImageTooLarge {
            size: data.len(),
            max: state.config.max_file_size,
        });
    }

    let image = match (width, height) {
        (Some(w), Some(h)) => pixels::from_raw_pixels(data.to_vec(), w, h)?,
        (None, None) => pixels::decode_image(&data)?,
        _ => {
            return Err(OcrError::InvalidRequest(
                "Raw pixel buffers need both 'width' and 'height'".to_string(),
            ))
        }
    };

    Ok(ProcessRequest {
        image,
        options,
        rect,
        engine,
    })
}

async fn field_text(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, OcrError> {
    field
        .text()
        .await
        .map_err(|e| OcrError::InvalidRequest(format!("Invalid {}: {}", name, e)))
}

fn parse_dimension(text: &str) -> Result<u32, OcrError> {
    text.trim()
        .parse()
        .map_err(|_| OcrError::InvalidRequest(format!("Invalid dimension: {}", text)))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        default_engine: state.engines.default_name().to_string(),
        available_engines: state.engines.info(),
        char_whitelist: state.config.char_whitelist.clone(),
        max_file_size_bytes: state.config.max_file_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimension() {
        assert_eq!(parse_dimension(" 640 ").unwrap(), 640);
        assert!(matches!(
            parse_dimension("wide"),
            Err(OcrError::InvalidRequest(_))
        ));
    }
}
