// ==============================================================================
// pipeline.rs - Per-Test Pipeline & Batch Orchestration
// ==============================================================================
// Description: fetch -> map -> {render, filter} -> persist, for every test
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Failure policy:
//   - enumerating tests fails    -> whole batch fails (caller decides exit code)
//   - a test has no rows         -> warning, (false, false), no writes
//   - fetch / render fails       -> logged, (false, false)
//   - image / metadata store     -> reported independently per operation
// A single test never aborts the remaining ones.
// ==============================================================================

use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::config::PipelineSettings;
use crate::coordinates::map_coordinates;
use crate::error::PlotError;
use crate::models::{BatchSummary, SignificantSnp, TestOutcome};
use crate::render::{plot_caption, PlotRenderer};
use crate::significance::extract_significant;
use crate::store::PlotStore;

/// Rendered image and significant rows, ready to persist
struct PreparedTest {
    png: Vec<u8>,
    significant: Vec<SignificantSnp>,
}

async fn prepare_test<S: PlotStore, R: PlotRenderer>(
    store: &mut S,
    renderer: &R,
    settings: &PipelineSettings,
    test_number: i32,
) -> Result<PreparedTest, PlotError> {
    let records = store.fetch_snps(test_number).await?;
    if records.is_empty() {
        return Err(PlotError::EmptyInput { test_number });
    }
    info!("Retrieved {} SNPs for test {}", records.len(), test_number);

    let mapped = map_coordinates(&records, settings.gap);
    for slot in mapped.layout.overlapping() {
        warn!(
            "Test {}: chromosome {} reaches row {} which spills past its {}-unit slot",
            test_number, slot.chromosome, slot.max_row_index, settings.gap
        );
    }

    let caption = plot_caption(test_number, records[0].test_name.as_deref());
    let png = renderer.render(test_number, &caption, &mapped)?;
    info!(
        "Generated PNG plot for test {} ({} bytes, sha256 {:x})",
        test_number,
        png.len(),
        Sha256::digest(&png)
    );

    let significant = extract_significant(&mapped.coordinates, settings.threshold);
    info!(
        "Found {} SNPs above threshold -log10(p-value) > {} for test {}",
        significant.len(),
        settings.threshold,
        test_number
    );

    Ok(PreparedTest { png, significant })
}

/// Run the full pipeline for one test
///
/// Never fails: every error is logged and folded into the returned outcome.
pub async fn process_one<S: PlotStore, R: PlotRenderer>(
    store: &mut S,
    renderer: &R,
    settings: &PipelineSettings,
    test_number: i32,
) -> TestOutcome {
    info!("Processing test {}...", test_number);

    let prepared = match prepare_test(store, renderer, settings, test_number).await {
        Ok(prepared) => prepared,
        Err(e) if e.is_soft() => {
            warn!("{}", e);
            return TestOutcome::default();
        }
        Err(e) => {
            error!(test_number, step = e.step(), "Error processing test {}: {}", test_number, e);
            return TestOutcome::default();
        }
    };

    let image_stored = match store.store_image(test_number, &prepared.png).await {
        Ok(()) => {
            info!("Stored PNG data for test {}", test_number);
            true
        }
        Err(e) => {
            error!(test_number, step = e.step(), "{}", e);
            false
        }
    };

    let metadata_stored = match store.store_metadata(test_number, &prepared.significant).await {
        Ok(()) => {
            info!(
                "Stored metadata for {} SNPs in test {}",
                prepared.significant.len(),
                test_number
            );
            true
        }
        Err(e) => {
            error!(test_number, step = e.step(), "{}", e);
            false
        }
    };

    info!(
        "Test {} completed - PNG: {}, Metadata: {}",
        test_number, image_stored, metadata_stored
    );

    TestOutcome {
        image_stored,
        metadata_stored,
    }
}

/// Process every test in the module (or the `selection`, when non-empty)
pub async fn process_all<S: PlotStore, R: PlotRenderer>(
    store: &mut S,
    renderer: &R,
    settings: &PipelineSettings,
    module_id: i32,
    selection: &[i32],
) -> Result<BatchSummary, PlotError> {
    let mut test_numbers = store.test_numbers().await?;
    test_numbers.sort_unstable();
    test_numbers.dedup();
    info!("Found {} tests: {:?}", test_numbers.len(), test_numbers);

    if !selection.is_empty() {
        for missing in selection.iter().filter(|t| !test_numbers.contains(*t)) {
            warn!("Requested test {} does not exist in Module_{}", missing, module_id);
        }
        test_numbers.retain(|t| selection.contains(t));
    }

    let mut summary = BatchSummary::new(module_id, test_numbers.len());

    if test_numbers.is_empty() {
        warn!("No tests found to process");
        summary.finish();
        return Ok(summary);
    }

    info!("Processing {} tests...", test_numbers.len());

    for test_number in test_numbers {
        let outcome = process_one(store, renderer, settings, test_number).await;
        summary.record(outcome);
    }

    summary.finish();
    info!(
        "Processing complete. total={} png_success={} metadata_success={} failed={}",
        summary.total, summary.png_success, summary.metadata_success, summary.failed
    );

    Ok(summary)
}
