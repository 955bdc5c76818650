//! Personal cloud drive backend.
//!
//! A REST API that keeps file and folder metadata in SQLite and hands
//! clients presigned URLs for the actual bytes, which live in an
//! S3-compatible object store. Uploads are two-phase (intent → finalize)
//! with per-user storage quotas enforced at both steps.

pub mod auth;
pub mod blob_store;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
