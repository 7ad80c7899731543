//! # Server Configuration
//!
//! Router assembly, shared application state, OpenAPI document and the HTTP
//! serve loop for the Delivery Tracker API.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::db::SharedStore;
use crate::handlers::{self, deliveries, documents, stats, suppliers, whatsapp_messages};
use crate::processing::ProcessingQueue;
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: SharedStore,
    pub processing: ProcessingQueue,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    let api = Router::new()
        .route("/api/stats", get(stats::get_stats))
        .route(
            "/api/suppliers",
            get(suppliers::list_suppliers).post(suppliers::create_supplier),
        )
        .route(
            "/api/suppliers/{id}",
            get(suppliers::get_supplier)
                .put(suppliers::update_supplier)
                .delete(suppliers::delete_supplier),
        )
        .route(
            "/api/deliveries",
            get(deliveries::list_deliveries).post(deliveries::create_delivery),
        )
        .route(
            "/api/deliveries/{id}",
            get(deliveries::get_delivery)
                .put(deliveries::update_delivery)
                .delete(deliveries::delete_delivery),
        )
        .route(
            "/api/documents",
            get(documents::list_documents).post(documents::create_document),
        )
        .route(
            "/api/documents/upload",
            post(documents::upload_document).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/documents/{id}",
            get(documents::get_document).put(documents::update_document),
        )
        .route(
            "/api/whatsapp-messages",
            get(whatsapp_messages::list_whatsapp_messages)
                .post(whatsapp_messages::create_whatsapp_message),
        )
        .route(
            "/api/whatsapp-messages/{id}",
            get(whatsapp_messages::get_whatsapp_message)
                .put(whatsapp_messages::update_whatsapp_message),
        )
        .route(
            "/api/webhook/whatsapp",
            post(whatsapp_messages::whatsapp_webhook),
        );

    Router::new()
        .route("/", get(handlers::root))
        .merge(api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the application until `shutdown` fires
pub async fn run_server(
    config: Arc<AppConfig>,
    state: AppState,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile = %config.profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::stats::get_stats,
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::delete_supplier,
        crate::handlers::deliveries::list_deliveries,
        crate::handlers::deliveries::get_delivery,
        crate::handlers::deliveries::create_delivery,
        crate::handlers::deliveries::update_delivery,
        crate::handlers::deliveries::delete_delivery,
        crate::handlers::documents::list_documents,
        crate::handlers::documents::get_document,
        crate::handlers::documents::create_document,
        crate::handlers::documents::update_document,
        crate::handlers::documents::upload_document,
        crate::handlers::whatsapp_messages::list_whatsapp_messages,
        crate::handlers::whatsapp_messages::get_whatsapp_message,
        crate::handlers::whatsapp_messages::create_whatsapp_message,
        crate::handlers::whatsapp_messages::update_whatsapp_message,
        crate::handlers::whatsapp_messages::whatsapp_webhook,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::ProcessingStatus,
            crate::models::ProcessingStats,
            crate::models::Supplier,
            crate::models::NewSupplier,
            crate::models::SupplierPatch,
            crate::models::Delivery,
            crate::models::DeliveryStatus,
            crate::models::DeliverySource,
            crate::models::NewDelivery,
            crate::models::DeliveryPatch,
            crate::models::Document,
            crate::models::DocumentStatus,
            crate::models::NewDocument,
            crate::models::DocumentPatch,
            crate::models::WhatsappMessage,
            crate::models::NewWhatsappMessage,
            crate::models::WhatsappMessagePatch,
            crate::handlers::documents::DocumentUploadForm,
            crate::handlers::whatsapp_messages::WhatsappWebhookPayload,
            crate::handlers::whatsapp_messages::WebhookSender,
            crate::handlers::whatsapp_messages::WebhookMessage,
            crate::handlers::whatsapp_messages::WebhookAck,
            crate::error::ApiError,
        )
    ),
    tags(
        (name = "root", description = "Service information"),
        (name = "stats", description = "Aggregate processing statistics"),
        (name = "suppliers", description = "Supplier records"),
        (name = "deliveries", description = "Delivery records"),
        (name = "documents", description = "Uploaded documents and OCR results"),
        (name = "whatsapp-messages", description = "Incoming WhatsApp messages"),
    ),
    info(
        title = "Delivery Tracker API",
        description = "Supply-chain delivery tracking with simulated document and message processing",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
