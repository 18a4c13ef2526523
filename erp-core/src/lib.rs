//! erp-core: Shared infrastructure for the ERP service.
pub mod authz;
pub mod config;
pub mod context;
pub mod error;
pub mod observability;
pub mod pagination;
