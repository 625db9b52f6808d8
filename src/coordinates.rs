// ==============================================================================
// coordinates.rs - Chromosome Layout & Plot Coordinate Mapping
// ==============================================================================
// Description: Maps ordered SNP rows into concatenated-chromosome plot space
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Layout: every chromosome gets a fixed-width slot of `gap` units, assigned in
// the order chromosomes are first seen in the input. Slot width does not
// depend on how far the chromosome's rows extend.
//
//   chr 1 -> [0, 1000)   chr 2 -> [1000, 2000)   chr X -> [2000, 3000) ...
//
// A chromosome with row_index >= gap spills into the next slot. Such slots are
// reported by `ChromosomeLayout::overlapping`.
// ==============================================================================

use std::collections::HashMap;
use tracing::debug;

use crate::models::{PlotCoordinate, SnpRecord};

/// X-axis slot assigned to one chromosome
#[derive(Debug, Clone, PartialEq)]
pub struct ChromosomeSlot {
    pub chromosome: i32,
    /// Starting X coordinate
    pub offset: i64,
    /// Largest row index seen for this chromosome
    pub max_row_index: i64,
    pub snp_count: usize,
}

/// Chromosome offsets in first-seen order
#[derive(Debug, Clone)]
pub struct ChromosomeLayout {
    gap: i64,
    slots: Vec<ChromosomeSlot>,
    index: HashMap<i32, usize>,
}

impl ChromosomeLayout {
    pub fn new(gap: i64) -> Self {
        Self {
            gap,
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build the layout alone, without computing coordinates
    pub fn from_records(records: &[SnpRecord], gap: i64) -> Self {
        let mut layout = Self::new(gap);
        let mut next_offset = 0;
        for record in records {
            layout.place(record, &mut next_offset);
        }
        layout
    }

    /// Offset for the record's chromosome, opening a new slot on first sight
    fn place(&mut self, record: &SnpRecord, next_offset: &mut i64) -> i64 {
        let row_index = i64::from(record.row_index);

        let idx = match self.index.get(&record.chromosome) {
            Some(&idx) => idx,
            None => {
                let idx = self.slots.len();
                self.slots.push(ChromosomeSlot {
                    chromosome: record.chromosome,
                    offset: *next_offset,
                    max_row_index: row_index,
                    snp_count: 0,
                });
                self.index.insert(record.chromosome, idx);
                *next_offset += self.gap;
                idx
            }
        };

        let slot = &mut self.slots[idx];
        slot.snp_count += 1;
        slot.max_row_index = slot.max_row_index.max(row_index);
        slot.offset
    }

    pub fn gap(&self) -> i64 {
        self.gap
    }

    pub fn slots(&self) -> &[ChromosomeSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn offset_of(&self, chromosome: i32) -> Option<i64> {
        self.index.get(&chromosome).map(|&idx| self.slots[idx].offset)
    }

    /// First-seen position of a chromosome (drives palette colour)
    pub fn index_of(&self, chromosome: i32) -> Option<usize> {
        self.index.get(&chromosome).copied()
    }

    /// Slots whose rows reach into the following chromosome's range
    pub fn overlapping(&self) -> Vec<&ChromosomeSlot> {
        let followed = self.slots.len().saturating_sub(1);
        self.slots[..followed]
            .iter()
            .filter(|slot| slot.max_row_index >= self.gap)
            .collect()
    }

    /// Rightmost X coordinate covered by any slot
    pub fn span(&self) -> i64 {
        self.slots
            .iter()
            .map(|slot| slot.offset + slot.max_row_index.max(self.gap))
            .max()
            .unwrap_or(0)
    }
}

/// Layout plus per-SNP coordinates for one test
#[derive(Debug, Clone)]
pub struct MappedTest {
    pub layout: ChromosomeLayout,
    pub coordinates: Vec<PlotCoordinate>,
}

impl MappedTest {
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Largest Y among SNPs that are actually drawn
    pub fn max_plotted_y(&self) -> Option<f64> {
        self.coordinates
            .iter()
            .filter(|c| c.is_plottable())
            .map(|c| c.y)
            .fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |m| m.max(y))))
    }
}

/// -log10(p), collapsing zero, negative and NaN p-values to 0
pub fn neg_log10(p_value: f64) -> f64 {
    if p_value > 0.0 {
        -p_value.log10()
    } else {
        0.0
    }
}

/// Map SNP rows (ordered by chromosome, then row index) to plot coordinates
///
/// Input order is trusted: chromosomes get offsets in the order they first
/// appear, and the output keeps the input's length and order.
pub fn map_coordinates(records: &[SnpRecord], gap: i64) -> MappedTest {
    let mut layout = ChromosomeLayout::new(gap);
    let mut next_offset = 0;

    let coordinates: Vec<PlotCoordinate> = records
        .iter()
        .map(|record| {
            let offset = layout.place(record, &mut next_offset);
            let y = neg_log10(record.p_value);

            PlotCoordinate {
                variant_id: record.variant_id,
                test_number: record.test_number,
                chromosome: record.chromosome,
                row_index: record.row_index,
                x: offset + i64::from(record.row_index),
                y,
                p_value: record.p_value,
                y_raw: y,
            }
        })
        .collect();

    debug!(
        "Calculated coordinates for {} SNPs across {} chromosomes",
        coordinates.len(),
        layout.len()
    );

    MappedTest {
        layout,
        coordinates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CHROMOSOME_GAP;

    fn snp(variant_id: i32, chromosome: i32, row_index: i32, p_value: f64) -> SnpRecord {
        SnpRecord {
            variant_id,
            test_number: 7,
            chromosome,
            row_index,
            p_value,
            test_name: None,
        }
    }

    #[test]
    fn test_worked_example() {
        let records = vec![
            snp(1, 1, 10, 0.5),
            snp(2, 1, 20, 0.0001),
            snp(3, 2, 5, 0.2),
        ];

        let mapped = map_coordinates(&records, CHROMOSOME_GAP);

        assert_eq!(mapped.layout.offset_of(1), Some(0));
        assert_eq!(mapped.layout.offset_of(2), Some(1000));

        let xs: Vec<i64> = mapped.coordinates.iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![10, 20, 1005]);

        let ys: Vec<f64> = mapped.coordinates.iter().map(|c| c.y).collect();
        assert!((ys[0] - 0.30103).abs() < 1e-4);
        assert!((ys[1] - 4.0).abs() < 1e-9);
        assert!((ys[2] - 0.69897).abs() < 1e-4);
    }

    #[test]
    fn test_offsets_follow_first_seen_order() {
        let records = vec![
            snp(1, 5, 1, 0.1),
            snp(2, 5, 2, 0.1),
            snp(3, 2, 1, 0.1),
            snp(4, 9, 1, 0.1),
            snp(5, 9, 3, 0.1),
            snp(6, 1, 1, 0.1),
        ];

        let layout = ChromosomeLayout::from_records(&records, CHROMOSOME_GAP);
        let chromosomes: Vec<i32> = layout.slots().iter().map(|s| s.chromosome).collect();
        assert_eq!(chromosomes, vec![5, 2, 9, 1]);

        for pair in layout.slots().windows(2) {
            assert_eq!(pair[1].offset - pair[0].offset, CHROMOSOME_GAP);
        }
        assert_eq!(layout.slots()[0].offset, 0);
        assert_eq!(layout.index_of(9), Some(2));
        assert_eq!(layout.slots()[2].snp_count, 2);
    }

    #[test]
    fn test_returning_chromosome_keeps_first_offset() {
        // Not grouped by chromosome: chr 1 comes back after chr 2
        let records = vec![snp(1, 1, 10, 0.1), snp(2, 2, 10, 0.1), snp(3, 1, 30, 0.1)];

        let mapped = map_coordinates(&records, CHROMOSOME_GAP);

        assert_eq!(mapped.layout.len(), 2);
        assert_eq!(mapped.coordinates[2].x, 30);
        assert_eq!(mapped.layout.slots()[0].max_row_index, 30);
    }

    #[test]
    fn test_invalid_p_values_collapse_to_zero() {
        let records = vec![
            snp(1, 1, 1, 0.0),
            snp(2, 1, 2, -0.5),
            snp(3, 1, 3, f64::NAN),
            snp(4, 1, 4, 1.0),
        ];

        let mapped = map_coordinates(&records, CHROMOSOME_GAP);

        for coord in &mapped.coordinates {
            assert_eq!(coord.y, 0.0);
            assert_eq!(coord.y_raw, coord.y);
        }
        assert!(!mapped.coordinates[0].is_plottable());
        assert!(mapped.coordinates[3].is_plottable());
        assert_eq!(mapped.max_plotted_y(), Some(0.0));
    }

    #[test]
    fn test_neg_log10() {
        assert!((neg_log10(0.001) - 3.0).abs() < 1e-12);
        assert!((neg_log10(1e-8) - 8.0).abs() < 1e-9);
        assert_eq!(neg_log10(0.0), 0.0);
    }

    #[test]
    fn test_empty_input() {
        let mapped = map_coordinates(&[], CHROMOSOME_GAP);

        assert!(mapped.is_empty());
        assert!(mapped.layout.is_empty());
        assert_eq!(mapped.layout.span(), 0);
        assert_eq!(mapped.max_plotted_y(), None);
    }

    #[test]
    fn test_single_chromosome() {
        let records = vec![snp(1, 3, 0, 0.01), snp(2, 3, 999, 0.02)];

        let mapped = map_coordinates(&records, CHROMOSOME_GAP);

        assert_eq!(mapped.layout.len(), 1);
        assert_eq!(mapped.layout.offset_of(3), Some(0));
        assert_eq!(mapped.coordinates[1].x, 999);
        assert!(mapped.layout.overlapping().is_empty());
        assert_eq!(mapped.layout.span(), 1000);
    }

    #[test]
    fn test_long_chromosome_overlaps_next_slot() {
        // Fixed-width slots: row 1500 on chr 1 lands past chr 2's offset
        let records = vec![snp(1, 1, 1500, 0.1), snp(2, 2, 5, 0.1)];

        let mapped = map_coordinates(&records, CHROMOSOME_GAP);

        assert_eq!(mapped.coordinates[0].x, 1500);
        assert_eq!(mapped.coordinates[1].x, 1005);
        assert!(mapped.coordinates[0].x > mapped.coordinates[1].x);

        let overlapping = mapped.layout.overlapping();
        assert_eq!(overlapping.len(), 1);
        assert_eq!(overlapping[0].chromosome, 1);
    }

    #[test]
    fn test_custom_gap() {
        let records = vec![snp(1, 1, 10, 0.1), snp(2, 2, 10, 0.1), snp(3, 3, 10, 0.1)];

        let mapped = map_coordinates(&records, 50_000);

        let offsets: Vec<i64> = mapped.layout.slots().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 50_000, 100_000]);
        assert_eq!(mapped.layout.gap(), 50_000);
    }
}
