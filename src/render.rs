// ==============================================================================
// render.rs - Manhattan Plot Rendering
// ==============================================================================
// Description: Draws mapped coordinates to an in-memory PNG
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Drawing rules:
//   - points coloured by first-seen chromosome index (cyclic palette)
//   - horizontal reference line at the significance threshold
//   - X ticks at each chromosome's starting offset, labelled with its number
//   - no grid lines, no legend
//   - SNPs with p <= 0 are not drawn
// ==============================================================================

use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use tracing::debug;

use crate::coordinates::MappedTest;
use crate::error::PlotError;
use crate::models::DEFAULT_SIGNIFICANCE_THRESHOLD;

/// Chromosome colours, cycled by first-seen index
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

pub fn palette_color(chromosome_index: usize) -> RGBColor {
    PALETTE[chromosome_index % PALETTE.len()]
}

/// Caption drawn above the plot
pub fn plot_caption(test_number: i32, test_name: Option<&str>) -> String {
    match test_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => format!("Test {}: {}", test_number, name),
        None => format!("Test {}", test_number),
    }
}

/// Produces an image artifact for one test's mapped coordinates
pub trait PlotRenderer {
    fn render(&self, test_number: i32, caption: &str, mapped: &MappedTest) -> Result<Vec<u8>, PlotError>;
}

/// PNG renderer backed by the plotters bitmap backend
#[derive(Debug, Clone)]
pub struct PngRenderer {
    width: u32,
    height: u32,
    threshold: f64,
    point_size: u32,
}

impl Default for PngRenderer {
    fn default() -> Self {
        Self::new(1200, 800, DEFAULT_SIGNIFICANCE_THRESHOLD)
    }
}

impl PngRenderer {
    pub fn new(width: u32, height: u32, threshold: f64) -> Self {
        Self {
            width,
            height,
            threshold,
            point_size: 2,
        }
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        caption: &str,
        mapped: &MappedTest,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;

        let x_min = mapped
            .coordinates
            .iter()
            .map(|c| c.x)
            .min()
            .unwrap_or(0)
            .min(0) as f64;
        let x_max = mapped
            .coordinates
            .iter()
            .map(|c| c.x)
            .max()
            .unwrap_or(0)
            .max(mapped.layout.span()) as f64
            + 1.0;
        let y_max = (mapped.max_plotted_y().unwrap_or(0.0) * 1.1).max(self.threshold + 1.0);

        let mut chart = ChartBuilder::on(root)
            .caption(caption, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)?;

        // X labels are drawn per chromosome start below
        chart
            .configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .x_desc("Chromosome")
            .y_desc("-log10(p-value)")
            .label_style(("sans-serif", 14))
            .axis_desc_style(("sans-serif", 16))
            .draw()?;

        chart.draw_series(LineSeries::new(
            vec![(x_min, 0.0), (x_max, 0.0)],
            BLACK.stroke_width(1),
        ))?;

        let tick_len = y_max * 0.015;
        for slot in mapped.layout.slots() {
            let x = slot.offset as f64;
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x, 0.0), (x, -tick_len)],
                BLACK.stroke_width(1),
            )))?;
            chart.draw_series(std::iter::once(Text::new(
                slot.chromosome.to_string(),
                (x, -tick_len * 2.0),
                ("sans-serif", 14).into_font().color(&BLACK),
            )))?;
        }

        chart.draw_series(
            mapped
                .coordinates
                .iter()
                .filter(|coord| coord.is_plottable())
                .map(|coord| {
                    let idx = mapped.layout.index_of(coord.chromosome).unwrap_or(0);
                    Circle::new(
                        (coord.x as f64, coord.y),
                        self.point_size,
                        palette_color(idx).mix(0.6).filled(),
                    )
                }),
        )?;

        chart.draw_series(LineSeries::new(
            vec![(x_min, self.threshold), (x_max, self.threshold)],
            RED.mix(0.7).stroke_width(2),
        ))?;

        Ok(())
    }
}

impl PlotRenderer for PngRenderer {
    fn render(&self, test_number: i32, caption: &str, mapped: &MappedTest) -> Result<Vec<u8>, PlotError> {
        if mapped.is_empty() {
            return Err(PlotError::Render {
                test_number,
                message: "no coordinates provided".to_string(),
            });
        }

        let render_err = |message: String| PlotError::Render {
            test_number,
            message,
        };

        let mut pixels = vec![0u8; self.width as usize * self.height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(pixels.as_mut_slice(), (self.width, self.height))
                .into_drawing_area();

            self.draw(&root, caption, mapped)
                .map_err(|e| render_err(format!("drawing failed: {}", e)))?;

            root.present()
                .map_err(|e| render_err(format!("bitmap flush failed: {}", e)))?;
        }

        let image = RgbImage::from_raw(self.width, self.height, pixels)
            .ok_or_else(|| render_err("pixel buffer does not match image size".to_string()))?;

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| render_err(format!("PNG encoding failed: {}", e)))?;

        debug!("Generated PNG plot for test {} ({} bytes)", test_number, png.len());
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::map_coordinates;
    use crate::models::{SnpRecord, CHROMOSOME_GAP};
    use image::GenericImageView;

    fn sample_test() -> MappedTest {
        let records: Vec<SnpRecord> = (0..30)
            .map(|i| SnpRecord {
                variant_id: i,
                test_number: 7,
                chromosome: i / 10 + 1,
                row_index: (i % 10) * 50,
                p_value: if i == 4 { 0.0 } else { 10f64.powi(-(i % 6)) * 0.5 },
                test_name: None,
            })
            .collect();
        map_coordinates(&records, CHROMOSOME_GAP)
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(palette_color(0), PALETTE[0]);
        assert_eq!(palette_color(9), PALETTE[9]);
        assert_eq!(palette_color(10), PALETTE[0]);
        assert_eq!(palette_color(23), PALETTE[3]);
    }

    #[test]
    fn test_plot_caption() {
        assert_eq!(plot_caption(7, None), "Test 7");
        assert_eq!(plot_caption(7, Some("  ")), "Test 7");
        assert_eq!(plot_caption(7, Some("BMI")), "Test 7: BMI");
    }

    #[test]
    fn test_empty_coordinates_rejected() {
        let mapped = map_coordinates(&[], CHROMOSOME_GAP);

        let err = PngRenderer::default()
            .render(3, "Test 3", &mapped)
            .unwrap_err();

        assert!(matches!(err, PlotError::Render { test_number: 3, .. }));
    }

    #[test]
    fn test_renders_deterministic_png() {
        let renderer = PngRenderer::new(640, 480, 3.0);
        let mapped = sample_test();

        let first = renderer.render(7, "Test 7", &mapped).unwrap();
        let second = renderer.render(7, "Test 7", &mapped).unwrap();

        assert_eq!(&first[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_p_value_renders_at_configured_size() {
        let records = vec![
            SnpRecord {
                variant_id: 1,
                test_number: 8,
                chromosome: 1,
                row_index: 10,
                p_value: 0.0,
                test_name: None,
            },
            SnpRecord {
                variant_id: 2,
                test_number: 8,
                chromosome: 1,
                row_index: 20,
                p_value: 1e-6,
                test_name: None,
            },
            SnpRecord {
                variant_id: 3,
                test_number: 8,
                chromosome: 2,
                row_index: 5,
                p_value: 0.3,
                test_name: None,
            },
        ];
        let mapped = map_coordinates(&records, CHROMOSOME_GAP);
        assert_eq!(mapped.layout.len(), 2);

        let png = PngRenderer::new(800, 600, 3.0)
            .render(8, "Test 8", &mapped)
            .unwrap();

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.dimensions(), (800, 600));
    }
}
