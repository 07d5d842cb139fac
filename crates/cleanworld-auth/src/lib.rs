//! CleanWorld Authentication and Authorization
//!
//! This crate provides token-based authentication and role-based
//! access control for the CleanWorld backend: password hashing,
//! signed-token issuance/validation, the per-request authentication
//! filter, and the route-rule authorization policy.

pub mod error;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod principal;
pub mod token;

pub use error::AuthError;
pub use middleware::{AuthState, authenticate, authorize};
pub use password::{hash_password, verify_password};
pub use policy::{Access, Policy, RouteRule};
pub use principal::Principal;
pub use token::{Claims, TokenService};
