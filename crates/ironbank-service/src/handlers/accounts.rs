//! Bank account handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use ironbank_core::{AccountId, BankAccount};
use ironbank_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::transactions::TransactionResponse;
use crate::handlers::ApiResponse;
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: String,
    /// Owning user ID.
    pub owner_id: String,
    /// Bank name.
    pub bank_name: String,
    /// Bank account number.
    pub bank_account_number: String,
    /// Current balance in cents.
    pub balance_cents: i64,
    /// Balance formatted as dollars.
    pub balance_formatted: String,
    /// Created timestamp.
    pub created_at: String,
    /// Last updated timestamp.
    pub updated_at: String,
}

impl From<&BankAccount> for AccountResponse {
    fn from(account: &BankAccount) -> Self {
        Self {
            id: account.id.to_string(),
            owner_id: account.owner_id.to_string(),
            bank_name: account.bank_name.clone(),
            bank_account_number: account.bank_account_number.clone(),
            balance_cents: account.balance_cents,
            balance_formatted: format!("${:.2}", account.balance_cents as f64 / 100.0),
            created_at: account.created_at.to_rfc3339(),
            updated_at: account.updated_at.to_rfc3339(),
        }
    }
}

/// Account detail response: the account plus its transfer history.
#[derive(Debug, Serialize)]
pub struct AccountDetailResponse {
    /// The account.
    #[serde(flatten)]
    pub account: AccountResponse,
    /// Transfers touching this account, newest first.
    pub transactions: Vec<TransactionResponse>,
}

/// Account list response.
#[derive(Debug, Serialize)]
pub struct ListAccountsResponse {
    /// Number of accounts.
    pub total: usize,
    /// The accounts, in creation order.
    pub accounts: Vec<AccountResponse>,
}

/// Create account request.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Bank name.
    #[serde(default)]
    pub bank_name: Option<String>,
    /// Bank account number (must be unique).
    #[serde(default)]
    pub bank_account_number: Option<String>,
    /// Opening balance in cents.
    #[serde(default)]
    pub balance_cents: Option<i64>,
}

/// Update account request. Balance is deliberately absent: balances change
/// only through the transfer engine.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    /// New bank name, if changing.
    #[serde(default)]
    pub bank_name: Option<String>,
    /// New bank account number, if changing.
    #[serde(default)]
    pub bank_account_number: Option<String>,
}

/// Create a new bank account owned by the authenticated user.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountResponse>>), ApiError> {
    let (Some(bank_name), Some(bank_account_number)) = (body.bank_name, body.bank_account_number)
    else {
        return Err(ApiError::BadRequest("Please fill all fields".into()));
    };
    if bank_name.is_empty() || bank_account_number.is_empty() {
        return Err(ApiError::BadRequest("Please fill all fields".into()));
    }

    let balance_cents = body.balance_cents.unwrap_or(0);
    if balance_cents < 0 {
        return Err(ApiError::BadRequest(
            "Opening balance can't be negative".into(),
        ));
    }

    let account = BankAccount::new(auth.user_id, bank_name, bank_account_number, balance_cents);
    state.store.create_account(&account)?;

    tracing::info!(
        account_id = %account.id,
        user_id = %auth.user_id,
        "Account created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Account created",
            AccountResponse::from(&account),
        )),
    ))
}

/// List all accounts.
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ListAccountsResponse>>, ApiError> {
    let accounts = state.store.list_accounts()?;

    let response = ListAccountsResponse {
        total: accounts.len(),
        accounts: accounts.iter().map(AccountResponse::from).collect(),
    };

    Ok(Json(ApiResponse::success("Accounts found", response)))
}

/// Get an account by ID, with its transfer history.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AccountDetailResponse>>, ApiError> {
    let account_id = parse_account_id(&id)?;

    let account = state
        .store
        .get_account(&account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let transactions = state.store.list_transactions_by_account(&account_id)?;

    Ok(Json(ApiResponse::success(
        "Account Found",
        AccountDetailResponse {
            account: AccountResponse::from(&account),
            transactions: transactions.iter().map(TransactionResponse::from).collect(),
        },
    )))
}

/// Update an account's bank name and account number.
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let account_id = parse_account_id(&id)?;

    let mut account = state
        .store
        .get_account(&account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    if !account.is_owned_by(&auth.user_id) {
        return Err(ApiError::Forbidden(
            "You are not authorized to update".into(),
        ));
    }

    if let Some(bank_name) = body.bank_name {
        account.bank_name = bank_name;
    }
    if let Some(bank_account_number) = body.bank_account_number {
        account.bank_account_number = bank_account_number;
    }

    state.store.update_account(&account)?;

    // Re-read: the store owns the balance and the updated_at stamp.
    let account = state
        .store
        .get_account(&account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    tracing::info!(account_id = %account_id, user_id = %auth.user_id, "Account updated");

    Ok(Json(ApiResponse::success(
        "Account updated",
        AccountResponse::from(&account),
    )))
}

/// Delete an account.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let account_id = parse_account_id(&id)?;

    let account = state
        .store
        .get_account(&account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    if !account.is_owned_by(&auth.user_id) {
        return Err(ApiError::Forbidden(
            "You are not authorized to delete account".into(),
        ));
    }

    state.store.delete_account(&account_id)?;

    tracing::info!(account_id = %account_id, user_id = %auth.user_id, "Account deleted");

    Ok(Json(ApiResponse::success(
        "Account deleted",
        serde_json::json!({ "deleted": true }),
    )))
}

/// An identifier that does not parse cannot name an existing account.
fn parse_account_id(id: &str) -> Result<AccountId, ApiError> {
    id.parse::<AccountId>()
        .map_err(|_| ApiError::NotFound("Account not found".into()))
}
