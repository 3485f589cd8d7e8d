//! Route handlers. Each one parses its input, calls the ledger service and
//! serializes the outcome; no business rules live here.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::application::LedgerService;
use crate::domain::{Account, AccountId, AccountNumber, Cents, TransferRequest, TransferResult};

use super::ApiError;

/// Header carrying the caller's own account number for transfers.
pub const SOURCE_ACCOUNT_HEADER: &str = "x-account-number";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    pub account_number: AccountNumber,
    pub delta: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub deleted_id: AccountId,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn list_accounts(State(service): State<LedgerService>) -> ApiResult<Vec<Account>> {
    Ok(Json(service.list_accounts().await?))
}

pub async fn create_account(
    State(service): State<LedgerService>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<Account> {
    let Json(req) = payload?;
    let account = service
        .create_account(&req.first_name, &req.last_name)
        .await?;
    Ok(Json(account))
}

pub async fn get_account(
    State(service): State<LedgerService>,
    id: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<Account> {
    let Path(id) = id?;
    Ok(Json(service.get_account(id).await?))
}

pub async fn delete_account(
    State(service): State<LedgerService>,
    id: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<DeletedResponse> {
    let Path(id) = id?;
    service.delete_account(id).await?;
    Ok(Json(DeletedResponse { deleted_id: id }))
}

pub async fn transfer(
    State(service): State<LedgerService>,
    headers: HeaderMap,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<TransferResult> {
    let source = source_account(&headers)?;
    let Json(req) = payload?;
    let result = service.transfer(source, req.to_account, req.amount).await?;
    Ok(Json(result))
}

pub async fn adjust_balance(
    State(service): State<LedgerService>,
    payload: Result<Json<AdjustmentRequest>, JsonRejection>,
) -> ApiResult<Account> {
    let Json(req) = payload?;
    let account = service.adjust_balance(req.account_number, req.delta).await?;
    Ok(Json(account))
}

pub async fn health_check(State(service): State<LedgerService>) -> ApiResult<Value> {
    service.health().await?;
    Ok(Json(json!({ "status": "ok" })))
}

fn source_account(headers: &HeaderMap) -> Result<AccountNumber, ApiError> {
    let value = headers
        .get(SOURCE_ACCOUNT_HEADER)
        .ok_or_else(|| ApiError::BadRequest("missing X-Account-Number header".to_string()))?;

    value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| ApiError::BadRequest("invalid X-Account-Number header".to_string()))
}
