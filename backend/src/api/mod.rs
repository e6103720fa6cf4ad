//! HTTP-facing helpers shared by all routers.

pub mod common;
