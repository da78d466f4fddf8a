//! Shared types for the POS inventory backend
//!
//! This crate holds everything both the server and external tooling agree on:
//!
//! - **Domain models** (`models`): the canonical normalized catalog schema
//!   (Shop → Category → Item → {Batch, SellingUnit}) plus stock transactions.
//! - **Error system** (`error`): standardized error codes, [`AppError`],
//!   and the unified [`ApiResponse`] envelope.

pub mod error;
pub mod models;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{
    Batch, BatchLink, Category, Item, ItemType, SellingUnit, Shop, StockTransaction,
};
