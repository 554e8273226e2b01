//! HTTP REST API
//!
//! - `common`: response envelopes, error mapping, validated JSON extractor
//! - `middleware`: JWT authentication and role gates
//! - `modules`: DTOs and handlers per resource
//! - `router`: route table, shared state and OpenAPI document

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, AppState};
