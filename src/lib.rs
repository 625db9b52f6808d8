// ==============================================================================
// lib.rs - Manhattan Plot Generator Library
// ==============================================================================
// Description: Library interface for Manhattan plot generation modules
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

pub mod config;
pub mod coordinates;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod significance;
pub mod store;

pub use error::PlotError;
