//! HTTP surface: the webhook endpoint, health check, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
