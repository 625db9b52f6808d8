// ==============================================================================
// significance.rs - Significant SNP Extraction
// ==============================================================================
// Description: Selects SNPs above the -log10(p) threshold for the mplot table
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use tracing::debug;

use crate::models::{PlotCoordinate, SignificantSnp};

/// Keep coordinates with `y > threshold`, in input order
pub fn extract_significant(coordinates: &[PlotCoordinate], threshold: f64) -> Vec<SignificantSnp> {
    let significant: Vec<SignificantSnp> = coordinates
        .iter()
        .filter(|coord| coord.y > threshold)
        .map(SignificantSnp::from)
        .collect();

    debug!(
        "Found {} SNPs above threshold -log10(p-value) > {}",
        significant.len(),
        threshold
    );

    significant
}
