//! Transfer transaction handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use ironbank_core::{TransactionId, Transfer};
use ironbank_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::ApiResponse;
use crate::state::AppState;
use crate::transfer::{self, TransferRequest};

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Debited account.
    pub source_account_id: String,
    /// Credited account.
    pub destination_account_id: String,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Free-text note.
    pub notes: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&Transfer> for TransactionResponse {
    fn from(tx: &Transfer) -> Self {
        Self {
            id: tx.id.to_string(),
            source_account_id: tx.source_account_id.to_string(),
            destination_account_id: tx.destination_account_id.to_string(),
            amount_cents: tx.amount_cents,
            notes: tx.notes.clone(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// Transaction list response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Number of transactions.
    pub total: usize,
    /// The transactions, newest first.
    pub transactions: Vec<TransactionResponse>,
}

/// Create a transfer on behalf of the authenticated user.
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<TransferRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionResponse>>), ApiError> {
    let transfer = transfer::execute(state.store.as_ref(), &body, auth.user_id)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Transaction created",
            TransactionResponse::from(&transfer),
        )),
    ))
}

/// List all transactions.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ListTransactionsResponse>>, ApiError> {
    let transactions = state.store.list_transactions()?;

    let response = ListTransactionsResponse {
        total: transactions.len(),
        transactions: transactions.iter().map(TransactionResponse::from).collect(),
    };

    Ok(Json(ApiResponse::success("Transactions found", response)))
}

/// Get a transaction by ID.
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TransactionResponse>>, ApiError> {
    let transaction_id = id
        .parse::<TransactionId>()
        .map_err(|_| ApiError::NotFound("Transaction not found".into()))?;

    let transaction = state
        .store
        .get_transaction(&transaction_id)?
        .ok_or_else(|| ApiError::NotFound("Transaction not found".into()))?;

    Ok(Json(ApiResponse::success(
        "Transaction Found",
        TransactionResponse::from(&transaction),
    )))
}
