//! Core types for ironbank.
//!
//! This crate provides the foundational types used throughout the ironbank
//! platform:
//!
//! - **Identifiers**: `UserId`, `AccountId`, `TransactionId`
//! - **Accounts**: `BankAccount`
//! - **Transfers**: `Transfer`
//!
//! # Money representation
//!
//! All monetary amounts are stored as `i64` integer cents to avoid floating
//! point precision issues. An account balance is never negative, and a
//! transfer amount is always strictly positive.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod ids;
pub mod transaction;

pub use account::BankAccount;
pub use ids::{AccountId, IdError, TransactionId, UserId};
pub use transaction::Transfer;
