use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod dispatch;
pub mod form;
pub mod geo;
pub mod photo;
pub mod report;
pub mod state;
pub mod status;

pub use crate::config::AppConfig;
pub use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn conflict(message: &str) -> Self {
        Self::new("Conflict", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::form::handlers::create_form,
        crate::form::handlers::get_form,
        crate::form::handlers::update_fields,
        crate::form::handlers::upload_image,
        crate::form::handlers::remove_image,
        crate::form::handlers::reset_form,
        crate::form::handlers::submit_form,
        crate::form::handlers::share_form,
        crate::form::handlers::locate_form,
        crate::form::handlers::get_preview,
        crate::form::handlers::reverse_address
    ),
    components(
        schemas(
            form::models::FormView,
            form::models::ShareResponse,
            form::models::LocateResponse,
            form::models::ValidationFailure,
            form::models::UploadImageRequest,
            report::ReportFields,
            report::ValidationError,
            photo::ImageSource,
            photo::ControlValues,
            photo::PreviewElement,
            geo::AddressResult,
            geo::PositionReport,
            status::StatusMessage,
            status::StatusKind,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Report Form", description = "Completion report form, PDF generation and sharing."),
        (name = "Address Lookup", description = "Reverse geocoding of device coordinates.")
    )
)]
pub struct ApiDoc;

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let bind_addr = (config.host.clone(), config.port);
    let allowed_origins = config.allowed_origins.clone();

    let app_state =
        web::Data::new(AppState::new(config).context("failed to create HTTP client")?);

    let prometheus = PrometheusMetricsBuilder::new("obra_report_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create Prometheus middleware: {:?}", e))?;

    log::info!("Starting server at http://{}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![
                header::CONTENT_DISPOSITION,
                header::HeaderName::from_static("x-report-outcome"),
                header::HeaderName::from_static("x-report-status-kind"),
                header::HeaderName::from_static("x-report-image-skipped"),
            ])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .service(web::scope("/api").configure(form::handlers::config))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
