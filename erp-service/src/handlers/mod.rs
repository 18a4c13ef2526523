//! HTTP handlers. Each module is a thin dispatcher: resolve the request
//! context, check the permission, call the repository or lifecycle
//! service, record the activity, and shape the JSON response.

pub mod activity;
pub mod categories;
pub mod customers;
pub mod invoices;
pub mod orders;
pub mod products;
pub mod purchases;
pub mod stock;
pub mod suppliers;
pub mod users;

use erp_core::pagination::Page;
use serde::Serialize;

/// Successful single-record response.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Successful listing response with its pagination window.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Page,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, pagination: Page) -> Self {
        Self {
            success: true,
            data,
            pagination,
        }
    }
}

/// Successful response carrying only a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
