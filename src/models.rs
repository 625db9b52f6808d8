// ==============================================================================
// models.rs - Manhattan Plot Data Models
// ==============================================================================
// Description: Data structures flowing through the per-test plot pipeline
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the X-axis slot reserved for each chromosome
pub const CHROMOSOME_GAP: i64 = 1000;

/// -log10(p) cut-off for significant SNPs (p < 0.001)
pub const DEFAULT_SIGNIFICANCE_THRESHOLD: f64 = 3.0;

/// One SNP result row for a single test, as fetched from the module database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnpRecord {
    /// SNP index (`ind`)
    pub variant_id: i32,

    /// Test column number (`col`)
    pub test_number: i32,

    /// Chromosome number
    pub chromosome: i32,

    /// Row within the chromosome, used as the genomic coordinate
    pub row_index: i32,

    /// Association p-value, expected in (0, 1]
    pub p_value: f64,

    /// Human-readable test name, if the module defines one
    pub test_name: Option<String>,
}

/// Plot-space position of one SNP
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotCoordinate {
    pub variant_id: i32,
    pub test_number: i32,
    pub chromosome: i32,
    pub row_index: i32,
    /// Chromosome offset + row index
    pub x: i64,
    /// -log10(p), or 0 when p <= 0
    pub y: f64,
    pub p_value: f64,
    pub y_raw: f64,
}

impl PlotCoordinate {
    /// Whether the SNP carries a usable p-value and should be drawn
    pub fn is_plottable(&self) -> bool {
        self.p_value > 0.0
    }
}

/// Significant SNP row as persisted in the `mplot` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificantSnp {
    pub variant_id: i32,
    pub test_number: i32,
    pub chromosome: i32,
    pub row_index: i32,
    pub x: i64,
    pub y: f64,
}

impl From<&PlotCoordinate> for SignificantSnp {
    fn from(coord: &PlotCoordinate) -> Self {
        Self {
            variant_id: coord.variant_id,
            test_number: coord.test_number,
            chromosome: coord.chromosome,
            row_index: coord.row_index,
            x: coord.x,
            y: coord.y,
        }
    }
}

/// Storage result for one test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    pub image_stored: bool,
    pub metadata_stored: bool,
}

impl TestOutcome {
    /// A test only counts as failed when neither store succeeded
    pub fn failed(&self) -> bool {
        !self.image_stored && !self.metadata_stored
    }
}

/// Per-module batch summary
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub module_id: i32,
    pub total: usize,
    pub png_success: usize,
    pub metadata_success: usize,
    pub failed: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchSummary {
    pub fn new(module_id: i32, total: usize) -> Self {
        Self {
            module_id,
            total,
            png_success: 0,
            metadata_success: 0,
            failed: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Fold one test outcome into the counters
    pub fn record(&mut self, outcome: TestOutcome) {
        if outcome.image_stored {
            self.png_success += 1;
        }
        if outcome.metadata_stored {
            self.metadata_success += 1;
        }
        if outcome.failed() {
            self.failed += 1;
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{}", rule)?;
        writeln!(f, "PROCESSING COMPLETE")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total tests processed: {}", self.total)?;
        writeln!(f, "PNG generation successful: {}", self.png_success)?;
        writeln!(f, "Metadata storage successful: {}", self.metadata_success)?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f)?;
        if self.all_succeeded() {
            write!(f, "All tests processed successfully")
        } else {
            write!(f, "{} tests failed. Check logs for details.", self.failed)
        }
    }
}
