//! Router Module Index
//!
//! Splits the routing table by access level. Authentication is applied per router with
//! an axum layer in `create_router`, so a protected endpoint cannot be exposed by
//! forgetting an extractor.

/// Routes accessible to anonymous callers (read-only content and credential issuance).
pub mod public;

/// Routes that require a valid bearer token.
pub mod authenticated;

/// Routes that additionally require the Admin role.
pub mod admin;
