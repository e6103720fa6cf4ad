//! Collection of self-contained helpers used by the auth service: password
//! hashing, access-token signing and refresh-token generation.

pub mod jwt;
pub mod password;
pub mod refresh_token;
