//! # Delivery Tracker Library
//!
//! Core of the delivery-tracking service: the in-memory entity store and its
//! repositories, the background processing worker, and the HTTP surface.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod processing;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
