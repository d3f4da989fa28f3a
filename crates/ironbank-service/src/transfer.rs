//! The transfer engine.
//!
//! Validates and executes a funds transfer as a single unit of work. The
//! acting identity is an explicit parameter so the engine can be exercised
//! without an HTTP context; the validation pipeline short-circuits on the
//! first violated rule and every outcome is returned as data, never thrown.

use serde::Deserialize;

use ironbank_core::{AccountId, Transfer, UserId};
use ironbank_store::{Store, StoreError};

use crate::error::ApiError;

/// A transfer request as submitted by the caller.
///
/// Identifiers arrive as raw strings; an identifier that does not parse
/// cannot name an existing account and is treated as absent.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    /// Account to debit.
    #[serde(default)]
    pub source_account_id: String,
    /// Account to credit.
    #[serde(default)]
    pub destination_account_id: String,
    /// Amount to move, in cents.
    #[serde(default)]
    pub amount_cents: i64,
    /// Optional free-text note.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validate and execute a transfer on behalf of `acting_user`.
///
/// Authorization is checked before balance sufficiency so an unauthorized
/// caller learns nothing about the source account's funds. The sufficiency
/// check here is advisory; the store re-runs it under the account locks and
/// a race loser surfaces as the same failure.
///
/// # Errors
///
/// - `ApiError::BadRequest` for missing identifiers, a non-positive amount,
///   or a same-account transfer.
/// - `ApiError::NotFound` if either account does not exist.
/// - `ApiError::Forbidden` if the caller does not own the source account or
///   the source balance cannot cover the amount.
/// - `ApiError::Internal` on storage faults.
pub fn execute(
    store: &dyn Store,
    request: &TransferRequest,
    acting_user: UserId,
) -> Result<Transfer, ApiError> {
    if request.source_account_id.is_empty() || request.destination_account_id.is_empty() {
        return Err(ApiError::BadRequest(
            "Source and Destination account is required".into(),
        ));
    }

    if request.amount_cents <= 0 {
        return Err(ApiError::BadRequest("Amount must be positive".into()));
    }

    let source_id = request
        .source_account_id
        .parse::<AccountId>()
        .map_err(|_| ApiError::NotFound("Source account not found".into()))?;
    let destination_id = request
        .destination_account_id
        .parse::<AccountId>()
        .map_err(|_| ApiError::NotFound("Destination account not found".into()))?;

    let source = store
        .get_account(&source_id)?
        .ok_or_else(|| ApiError::NotFound("Source account not found".into()))?;
    store
        .get_account(&destination_id)?
        .ok_or_else(|| ApiError::NotFound("Destination account not found".into()))?;

    if source_id == destination_id {
        return Err(ApiError::BadRequest(
            "Can't transaction with same account".into(),
        ));
    }

    if !source.is_owned_by(&acting_user) {
        return Err(ApiError::Forbidden(
            "You are not authorized to create transaction".into(),
        ));
    }

    if !source.has_sufficient_funds(request.amount_cents) {
        return Err(ApiError::Forbidden("Insufficient balance".into()));
    }

    let transfer = Transfer::new(
        source_id,
        destination_id,
        request.amount_cents,
        request.notes.clone().unwrap_or_default(),
    );

    match store.post_transfer(&transfer) {
        Ok((source_balance, destination_balance)) => {
            tracing::info!(
                transaction_id = %transfer.id,
                source_account_id = %source_id,
                destination_account_id = %destination_id,
                amount_cents = %transfer.amount_cents,
                source_balance = %source_balance,
                destination_balance = %destination_balance,
                user_id = %acting_user,
                "Transaction created"
            );
            Ok(transfer)
        }
        // The authoritative check under the account locks lost a race.
        Err(StoreError::InsufficientFunds { .. }) => {
            Err(ApiError::Forbidden("Insufficient balance".into()))
        }
        // An account was deleted between validation and commit.
        Err(StoreError::NotFound {
            entity: "source account",
            ..
        }) => Err(ApiError::NotFound("Source account not found".into())),
        Err(StoreError::NotFound { .. }) => {
            Err(ApiError::NotFound("Destination account not found".into()))
        }
        Err(e) => Err(e.into()),
    }
}
