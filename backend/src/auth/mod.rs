//! Authentication module: credential checks, token grants, refresh-token
//! revocation and the bearer-token middleware guarding protected routes.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
