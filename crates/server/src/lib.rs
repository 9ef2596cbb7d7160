//! Web surface for the delivery ETA predictor
//!
//! Serves the single-page prediction form, a small JSON API and the
//! health/metrics endpoints.

pub mod api;
pub mod config;
pub mod render;
