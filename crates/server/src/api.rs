//! JSON API under `/api/chat`.
//!
//! - `POST /pdf-upload`   multipart field `pdf`; text extraction, catalog ingestion
//! - `POST /catalog`      ingestion of already-extracted text
//! - `POST /ask`          question against the session's last uploaded document
//! - `POST /recommend`    ranked recommendations with an explanation
//! - `GET  /products`     catalog listing (`category`, `limit`)
//! - `POST /products`     manual product creation
//! - `GET  /interactions` interaction log (`sessionId`, `userId`, `type`, `limit`)

use std::sync::Arc;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use pickwise_agent::AgentRuntime;
use pickwise_core::document::{extract_pdf_text, preview, DocumentError};
use pickwise_core::domain::behavior::UserBehaviorProfile;
use pickwise_core::domain::interaction::{
    InteractionId, InteractionProduct, InteractionType, UserInteraction,
};
use pickwise_core::domain::product::{Product, ProductId};
use pickwise_core::domain::upload::{CatalogUpload, UploadStatus};
use pickwise_core::errors::{ApplicationError, DomainError};
use pickwise_core::extraction::DEFAULT_CATEGORY;
use pickwise_core::normalize::{derive_tags, normalize_title, synthesize_sku};
use pickwise_core::scoring::{score_and_rank, MatchedSignal, DEFAULT_TOP_N};
use pickwise_db::repositories::{
    effective_limit, CatalogUploadRepository, InteractionFilter, InteractionRepository,
    ProductFilter, ProductRepository, SqlCatalogUploadRepository, SqlInteractionRepository,
    SqlProductRepository,
};
use pickwise_db::DbPool;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::catalog::{ingest_text, IngestReport};
use crate::error::ApiError;
use crate::session::SessionContext;

pub const UPLOAD_FIELD: &str = "pdf";
pub const PREVIEW_CHARS: usize = 200;
// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    products: Arc<dyn ProductRepository>,
    uploads: Arc<dyn CatalogUploadRepository>,
    interactions: Arc<dyn InteractionRepository>,
    agent: AgentRuntime,
    max_upload_bytes: u64,
}

impl AppState {
    pub fn new(pool: DbPool, agent: AgentRuntime, max_upload_bytes: u64) -> Self {
        Self {
            products: Arc::new(SqlProductRepository::new(pool.clone())),
            uploads: Arc::new(SqlCatalogUploadRepository::new(pool.clone())),
            interactions: Arc::new(SqlInteractionRepository::new(pool)),
            agent,
            max_upload_bytes,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = (state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES) as usize;

    Router::new()
        .route("/pdf-upload", post(pdf_upload).layer(DefaultBodyLimit::max(body_limit)))
        .route("/catalog", post(ingest_catalog))
        .route("/ask", post(ask))
        .route("/recommend", post(recommend))
        .route("/products", get(list_products).post(create_product))
        .route("/interactions", get(list_interactions))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub upload_id: String,
    pub file_name: String,
    pub text_length: usize,
    pub preview: String,
    #[serde(flatten)]
    pub ingest: IngestReport,
}

#[derive(Debug, Deserialize)]
pub struct CatalogRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub message: String,
    #[serde(flatten)]
    pub ingest: IngestReport,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub behavior: Option<Value>,
    #[serde(rename = "topN")]
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendedProduct {
    #[serde(flatten)]
    pub product: Product,
    pub score: u32,
    pub signals: Vec<MatchedSignal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub recommendations: Vec<RecommendedProduct>,
    pub explanation: String,
    pub explanation_source: pickwise_agent::ExplanationSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    pub sku: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionQuery {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub interaction_type: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct InteractionList {
    pub interactions: Vec<UserInteraction>,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn pdf_upload(
    State(state): State<AppState>,
    session: SessionContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let corr = session.correlation_id.as_str();
    let mut multipart = multipart.map_err(|_| ApiError::bad_request("No file uploaded", corr))?;

    let max_bytes = state.max_upload_bytes;
    let multipart_error = |error: MultipartError| {
        if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::document(DocumentError::TooLarge { size: 0, limit: max_bytes }, corr)
        } else {
            ApiError::bad_request(error.body_text(), corr)
        }
    };

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name != UPLOAD_FIELD {
            if field.file_name().is_some() {
                return Err(ApiError::bad_request(
                    format!("Unexpected field error. Expected field name: \"{UPLOAD_FIELD}\""),
                    corr,
                ));
            }
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, bytes.to_vec()));
    }

    let Some((file_name, bytes)) = upload else {
        return Err(ApiError::bad_request("No file uploaded", corr));
    };
    let file_size = bytes.len() as u64;

    let text = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes, max_bytes))
        .await
        .map_err(|error| {
            ApiError::application(ApplicationError::Persistence(error.to_string()), corr)
        })?
        .map_err(|error| {
            warn!(
                event_name = "upload.rejected",
                correlation_id = corr,
                session_id = %session.session_id,
                error = %error,
                "uploaded document rejected"
            );
            ApiError::document(error, corr)
        })?;

    let text_length = text.chars().count();
    let mut record = CatalogUpload::new(
        session.session_id.clone(),
        session.user_id.clone(),
        file_name.clone(),
        file_size,
        text.clone(),
    );
    state.uploads.save(record.clone()).await.map_err(|error| ApiError::repository(error, corr))?;
    info!(
        event_name = "upload.stored",
        correlation_id = corr,
        session_id = %session.session_id,
        upload_id = %record.id.0,
        text_length,
        "catalog document stored"
    );

    let chain = state.agent.extraction_chain();
    let ingest = match ingest_text(&chain, state.products.as_ref(), &text, corr).await {
        Ok(report) => report,
        Err(error) => {
            record.status = UploadStatus::Failed;
            record.metadata = json!({ "error": error.to_string() });
            if let Err(save_error) = state.uploads.save(record).await {
                warn!(event_name = "upload.status_update_failed", error = %save_error);
            }
            return Err(ApiError::application(error, corr));
        }
    };

    record.status = UploadStatus::Processed;
    record.products_extracted = ingest.products_extracted as u32;
    record.metadata = json!({
        "strategy": ingest.strategy.map(|kind| kind.as_str()),
        "duplicatesSkipped": ingest.duplicates_skipped,
    });
    let upload_id = record.id.0.clone();
    state.uploads.save(record).await.map_err(|error| ApiError::repository(error, corr))?;

    Ok(Json(UploadResponse {
        message: "PDF uploaded and text extracted successfully.".to_string(),
        upload_id,
        file_name,
        text_length,
        preview: preview(&text, PREVIEW_CHARS),
        ingest,
    }))
}

async fn ingest_catalog(
    State(state): State<AppState>,
    session: SessionContext,
    body: Result<Json<CatalogRequest>, JsonRejection>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let corr = session.correlation_id.as_str();
    let Json(body) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text(), corr))?;

    let chain = state.agent.extraction_chain();
    let ingest = ingest_text(&chain, state.products.as_ref(), &body.text, corr)
        .await
        .map_err(|error| ApiError::application(error, corr))?;

    let message = match ingest.strategy {
        Some(_) => format!("Catalog ingested: {} product(s) added.", ingest.products_extracted),
        None => "No products found in catalog text.".to_string(),
    };
    Ok(Json(CatalogResponse { message, ingest }))
}

async fn ask(
    State(state): State<AppState>,
    session: SessionContext,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<pickwise_agent::Answer>, ApiError> {
    let corr = session.correlation_id.as_str();
    let Json(body) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text(), corr))?;

    let document = state
        .uploads
        .latest_for_session(&session.session_id)
        .await
        .map_err(|error| ApiError::repository(error, corr))?
        .map(|upload| upload.extracted_text)
        .unwrap_or_default();

    let answer = state
        .agent
        .answerer()
        .ask(&document, &body.query)
        .await
        .map_err(|error| ApiError::ask(error, corr))?;

    record_interaction(
        &state,
        &session,
        InteractionType::Query,
        Some(body.query.trim().to_string()),
        Vec::new(),
        Some(answer.answer.clone()),
        json!({ "contextLength": answer.context_length }),
    )
    .await;

    Ok(Json(answer))
}

async fn recommend(
    State(state): State<AppState>,
    session: SessionContext,
    body: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let corr = session.correlation_id.as_str();
    let Json(body) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text(), corr))?;

    let behavior = body
        .behavior
        .filter(Value::is_object)
        .ok_or_else(|| ApiError::bad_request("Behavior object is required", corr))?;
    let profile = UserBehaviorProfile::from_value(&behavior)
        .map_err(|error| ApiError::application(error.into(), corr))?;

    let catalog = state
        .products
        .list(&ProductFilter::all())
        .await
        .map_err(|error| ApiError::repository(error, corr))?;
    if catalog.is_empty() {
        return Err(ApiError::bad_request(
            "No product catalog available. Upload via /api/chat/pdf-upload or /api/chat/catalog",
            corr,
        ));
    }

    let top_n = body.top_n.unwrap_or(DEFAULT_TOP_N);
    let ranked = score_and_rank(&catalog, &profile, top_n);
    let explanation = state.agent.explainer().explain(&catalog, &behavior, &ranked).await;

    info!(
        event_name = "recommend.ranked",
        correlation_id = corr,
        session_id = %session.session_id,
        catalog = catalog.len(),
        top_n,
        returned = ranked.len(),
        "recommendations ranked"
    );

    record_interaction(
        &state,
        &session,
        InteractionType::RecommendationShown,
        None,
        ranked
            .iter()
            .map(|scored| InteractionProduct {
                product_id: scored.product.id.clone(),
                product_title: scored.product.title.clone(),
                relevance_score: scored.score,
            })
            .collect(),
        Some(explanation.text.clone()),
        json!({ "behavior": behavior, "topN": top_n, "explanationSource": explanation.source }),
    )
    .await;

    Ok(Json(RecommendResponse {
        recommendations: ranked
            .into_iter()
            .map(|scored| RecommendedProduct {
                product: scored.product,
                score: scored.score,
                signals: scored.signals,
            })
            .collect(),
        explanation: explanation.text,
        explanation_source: explanation.source,
        notice: explanation.notice,
    }))
}

async fn list_products(
    State(state): State<AppState>,
    session: SessionContext,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<ProductList>, ApiError> {
    let corr = session.correlation_id.as_str();
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text(), corr))?;

    let filter = ProductFilter {
        category: query.category.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
        limit: Some(effective_limit(query.limit)),
    };
    let products =
        state.products.list(&filter).await.map_err(|error| ApiError::repository(error, corr))?;

    Ok(Json(ProductList { count: products.len(), products }))
}

async fn create_product(
    State(state): State<AppState>,
    session: SessionContext,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let corr = session.correlation_id.as_str();
    let Json(body) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text(), corr))?;

    let product = product_from_request(body).map_err(|error| ApiError::application(error.into(), corr))?;
    state
        .products
        .insert(product.clone())
        .await
        .map_err(|error| ApiError::repository(error, corr))?;

    info!(
        event_name = "catalog.product.created",
        correlation_id = corr,
        product_id = %product.id,
        sku = %product.sku,
        "product created"
    );
    Ok((StatusCode::CREATED, Json(product)))
}

async fn list_interactions(
    State(state): State<AppState>,
    session: SessionContext,
    query: Result<Query<InteractionQuery>, QueryRejection>,
) -> Result<Json<InteractionList>, ApiError> {
    let corr = session.correlation_id.as_str();
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text(), corr))?;

    let interaction_type = query
        .interaction_type
        .as_deref()
        .map(str::parse::<InteractionType>)
        .transpose()
        .map_err(|error| ApiError::bad_request(error.to_string(), corr))?;

    let filter = InteractionFilter {
        session_id: query.session_id,
        user_id: query.user_id,
        interaction_type,
        limit: query.limit,
    };
    let interactions = state
        .interactions
        .list(&filter)
        .await
        .map_err(|error| ApiError::repository(error, corr))?;

    Ok(Json(InteractionList { count: interactions.len(), interactions }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn product_from_request(body: CreateProductRequest) -> Result<Product, DomainError> {
    let title = body.title.trim().to_string();
    if title.is_empty() {
        return Err(DomainError::InvalidProduct("title is required".to_string()));
    }
    let price = body
        .price
        .ok_or_else(|| DomainError::InvalidProduct("price is required".to_string()))?;
    if price.is_sign_negative() {
        return Err(DomainError::InvalidProduct("price must not be negative".to_string()));
    }

    let category = body
        .category
        .map(|category| category.trim().to_lowercase())
        .filter(|category| !category.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let description = body.description.trim().to_string();
    let tags = derive_tags(&body.tags, &description, &category);
    let sku = body
        .sku
        .map(|sku| sku.trim().to_string())
        .filter(|sku| !sku.is_empty())
        .unwrap_or_else(|| synthesize_sku(&category, &normalize_title(&title)));

    Ok(Product {
        id: ProductId::generate(),
        title,
        description,
        category,
        price,
        tags,
        stock: body.stock,
        sku,
        metadata: body.metadata.unwrap_or_else(|| json!({ "source": "manual" })),
        created_at: Utc::now(),
    })
}

/// Interaction logging never fails the request it describes.
async fn record_interaction(
    state: &AppState,
    session: &SessionContext,
    interaction_type: InteractionType,
    query: Option<String>,
    products: Vec<InteractionProduct>,
    ai_response: Option<String>,
    metadata: Value,
) {
    let interaction = UserInteraction {
        id: InteractionId::generate(),
        session_id: session.session_id.clone(),
        user_id: session.user_id.clone(),
        interaction_type,
        query,
        products,
        ai_response,
        metadata,
        created_at: Utc::now(),
    };

    if let Err(error) = state.interactions.record(interaction).await {
        warn!(
            event_name = "interaction.record_failed",
            correlation_id = %session.correlation_id,
            interaction_type = interaction_type.as_str(),
            error = %error,
            "interaction could not be recorded"
        );
    }
}
