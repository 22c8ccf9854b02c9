//! # Axum Helpers
//!
//! HTTP plumbing shared by the storefront API.
//!
//! - **[`server`]**: router assembly with OpenAPI UIs, health, graceful shutdown
//! - **[`http`]**: CORS and security headers
//! - **[`errors`]**: [`AppError`] and the `{code, error, message, details}` body
//! - **[`extractors`]**: hashed id paths, acting-user context, validated bodies
//! - **[`audit`]**: audit events on the `audit` tracing target

pub mod audit;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    CleanupCoordinator, HealthCheckFuture, HealthResponse, ShutdownCoordinator, close_postgres,
    create_production_app, create_router, health_router, run_health_checks, shutdown_signal,
};

pub use http::{create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{Actor, HashedIdPath, ValidatedJson, ValidatedQuery};

pub use audit::{
    AuditEvent, AuditOutcome, extract_ip_from_headers, extract_ip_from_socket, extract_user_agent,
};
