//! Context-aware track recommendations.
//!
//! A listener names a few reference tracks and a situation ("rainy Sunday
//! reading"); the service returns catalog tracks that sound like the
//! references, bent towards the situation and the listener's own feedback.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
