//! API handlers.

// Allow precision loss in handlers - formatted amounts are well within f64 precision
#![allow(clippy::cast_precision_loss)]

pub mod accounts;
pub mod health;
pub mod transactions;

use serde::Serialize;

/// Uniform success envelope: `{"status": "success", "message": ..., "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always "success"; failures are serialized by `ApiError`.
    pub status: &'static str,
    /// Human-readable outcome.
    pub message: &'static str,
    /// The payload.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wrap a payload in the success envelope.
    pub fn success(message: &'static str, data: T) -> Self {
        Self {
            status: "success",
            message,
            data,
        }
    }
}
