//! HTTP service around the hideout prediction engine.

pub mod api;
pub mod backoff;
pub mod config;
pub mod state;
pub mod terrain;
