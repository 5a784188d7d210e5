//! JSON HTTP gateway.
//!
//! One POST route per façade operation, named grpc-gateway style
//! (`/archive.ArchiveService/<Method>`), JSON request and response bodies.
//! Errors map to `404` (not found), `400` (invalid argument) and `500`
//! (internal).

use crate::service::{ArchiveService, ArchiveStatus, ServiceError};
use archive_proto as proto;
use archive_store::AssetTransactionsPage;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;

struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> ApiError {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            ServiceError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            ServiceError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "query failed");
        }
        let body = serde_json::json!({
            "code": code,
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(serde::Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct TickRequest {
    tick_number: u32,
}

#[derive(serde::Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct TransactionRequest {
    tx_id: String,
}

#[derive(serde::Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct EpochRequest {
    epoch: u32,
}

#[derive(serde::Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct IdentityRequest {
    identity: String,
}

#[derive(serde::Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct TransferTransactionsRequest {
    identity: String,
    start_tick: u32,
    end_tick: u32,
}

#[derive(serde::Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct AssetTransactionsRequest {
    identity: String,
    asset_issuer: String,
    asset_name: String,
    end_tick: u32,
    start_index: u32,
    limit: u32,
    include_failed: bool,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionsResponse {
    transactions: Vec<proto::Transaction>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferTransactionsResponse {
    transfer_transactions_per_tick: Vec<proto::TransferTransactionsPerTick>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessedTickIntervalsResponse {
    processed_tick_intervals_per_epoch: Vec<proto::ProcessedTickIntervalsPerEpoch>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct IdentityInfoResponse {
    identity: String,
    balance: i64,
    incoming_amount: i64,
    outgoing_amount: i64,
    number_of_incoming_transfers: u32,
    number_of_outgoing_transfers: u32,
    latest_incoming_transfer_tick: u32,
    latest_outgoing_transfer_tick: u32,
    tick: u32,
}

pub fn router(service: Arc<ArchiveService>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/archive.ArchiveService/GetTickData", post(get_tick_data))
        .route(
            "/archive.ArchiveService/GetTickTransactions",
            post(get_tick_transactions),
        )
        .route(
            "/archive.ArchiveService/GetTickTransferTransactions",
            post(get_tick_transfer_transactions),
        )
        .route(
            "/archive.ArchiveService/GetTransaction",
            post(get_transaction),
        )
        .route(
            "/archive.ArchiveService/GetTransactionStatus",
            post(get_transaction_status),
        )
        .route(
            "/archive.ArchiveService/GetTickTransactionsStatus",
            post(get_tick_transactions_status),
        )
        .route(
            "/archive.ArchiveService/GetQuorumTickData",
            post(get_quorum_tick_data),
        )
        .route("/archive.ArchiveService/GetComputors", post(get_computors))
        .route(
            "/archive.ArchiveService/GetIdentityInfo",
            post(get_identity_info),
        )
        .route(
            "/archive.ArchiveService/GetLastProcessedTick",
            post(get_last_processed_tick),
        )
        .route(
            "/archive.ArchiveService/GetProcessedTickIntervals",
            post(get_processed_tick_intervals),
        )
        .route(
            "/archive.ArchiveService/GetTransferTransactions",
            post(get_transfer_transactions),
        )
        .route(
            "/archive.ArchiveService/GetAssetTransactions",
            post(get_asset_transactions),
        )
        .route("/archive.ArchiveService/GetStatus", post(get_status))
        .with_state(service)
}

/// Serve the gateway until the task is cancelled.
pub async fn serve(addr: SocketAddr, service: Arc<ArchiveService>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "JSON gateway listening");
    axum::serve(listener, router(service)).await
}

async fn get_tick_data(
    State(service): State<Arc<ArchiveService>>,
    Json(req): Json<TickRequest>,
) -> ApiResult<proto::TickData> {
    Ok(Json(service.tick_data(req.tick_number)?))
}

async fn get_tick_transactions(
    State(service): State<Arc<ArchiveService>>,
    Json(req): Json<TickRequest>,
) -> ApiResult<TransactionsResponse> {
    Ok(Json(TransactionsResponse {
        transactions: service.tick_transactions(req.tick_number)?,
    }))
}

async fn get_tick_transfer_transactions(
    State(service): State<Arc<ArchiveService>>,
    Json(req): Json<TickRequest>,
) -> ApiResult<TransactionsResponse> {
    Ok(Json(TransactionsResponse {
        transactions: service.tick_transfer_transactions(req.tick_number)?,
    }))
}

async fn get_transaction(
    State(service): State<Arc<ArchiveService>>,
    Json(req): Json<TransactionRequest>,
) -> ApiResult<proto::Transaction> {
    Ok(Json(service.transaction(&req.tx_id)?))
}

async fn get_transaction_status(
    State(service): State<Arc<ArchiveService>>,
    Json(req): Json<TransactionRequest>,
) -> ApiResult<proto::TransactionStatus> {
    Ok(Json(service.transaction_status(&req.tx_id)?))
}

async fn get_tick_transactions_status(
    State(service): State<Arc<ArchiveService>>,
    Json(req): Json<TickRequest>,
) -> ApiResult<proto::TickTransactionsStatus> {
    Ok(Json(service.tick_transactions_status(req.tick_number)?))
}

async fn get_quorum_tick_data(
    State(service): State<Arc<ArchiveService>>,
    Json(req): Json<TickRequest>,
) -> ApiResult<proto::QuorumTickData> {
    Ok(Json(service.quorum_tick_data(req.tick_number)?))
}

async fn get_computors(
    State(service): State<Arc<ArchiveService>>,
    Json(req): Json<EpochRequest>,
) -> ApiResult<proto::Computors> {
    Ok(Json(service.computors(req.epoch)?))
}

async fn get_identity_info(
    State(service): State<Arc<ArchiveService>>,
    Json(req): Json<IdentityRequest>,
) -> ApiResult<IdentityInfoResponse> {
    let info = service.identity_info(&req.identity).await?;
    Ok(Json(IdentityInfoResponse {
        identity: info.identity.clone().into(),
        balance: info.balance(),
        incoming_amount: info.incoming_amount,
        outgoing_amount: info.outgoing_amount,
        number_of_incoming_transfers: info.number_of_incoming_transfers,
        number_of_outgoing_transfers: info.number_of_outgoing_transfers,
        latest_incoming_transfer_tick: info.latest_incoming_transfer_tick,
        latest_outgoing_transfer_tick: info.latest_outgoing_transfer_tick,
        tick: info.tick,
    }))
}

async fn get_last_processed_tick(
    State(service): State<Arc<ArchiveService>>,
) -> ApiResult<proto::ProcessedTick> {
    Ok(Json(service.last_processed_tick()?))
}

async fn get_processed_tick_intervals(
    State(service): State<Arc<ArchiveService>>,
) -> ApiResult<ProcessedTickIntervalsResponse> {
    Ok(Json(ProcessedTickIntervalsResponse {
        processed_tick_intervals_per_epoch: service.processed_tick_intervals()?,
    }))
}

async fn get_transfer_transactions(
    State(service): State<Arc<ArchiveService>>,
    Json(req): Json<TransferTransactionsRequest>,
) -> ApiResult<TransferTransactionsResponse> {
    Ok(Json(TransferTransactionsResponse {
        transfer_transactions_per_tick: service.transfer_transactions(
            &req.identity,
            req.start_tick,
            req.end_tick,
        )?,
    }))
}

async fn get_asset_transactions(
    State(service): State<Arc<ArchiveService>>,
    Json(req): Json<AssetTransactionsRequest>,
) -> ApiResult<AssetTransactionsPage> {
    Ok(Json(service.asset_transactions(
        &req.identity,
        &req.asset_issuer,
        &req.asset_name,
        req.end_tick,
        req.start_index,
        req.limit,
        req.include_failed,
    )?))
}

async fn get_status(State(service): State<Arc<ArchiveService>>) -> ApiResult<ArchiveStatus> {
    Ok(Json(service.status()?))
}
