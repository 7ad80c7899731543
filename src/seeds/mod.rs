//! Store seeding functionality
//!
//! Populates a fresh store with demo suppliers, deliveries and processing
//! statistics so the dashboard has something to show.

pub mod demo;

pub use demo::seed_demo_data;
