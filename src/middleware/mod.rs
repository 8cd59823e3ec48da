//! Middleware del sistema
//!
//! Este módulo contiene el middleware HTTP compartido (CORS).

pub mod cors;

pub use cors::cors_middleware;
