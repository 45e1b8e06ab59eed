//! Donut chart rendering
//!
//! Ranks a frequency table, keeps the ten largest entries, and rasterizes
//! them as a donut chart straight into a PNG. A chart can carry a nested
//! inner ring that splits each ranked key into its accepted and failed
//! shares. Every successful write is announced on stdout.

use std::f64::consts::PI;
use std::path::PathBuf;

use image::{Rgb, RgbImage};
use log::info;

use crate::aggregator::FrequencyTable;
use crate::errors::Result;

/// How many ranked entries a chart shows.
pub const TOP_ENTRIES: usize = 10;

const CANVAS_SIZE: u32 = 800;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Slice colors, applied to ranked entries in order.
const PALETTE: [Rgb<u8>; 10] = [
    Rgb([102, 179, 255]),
    Rgb([255, 215, 0]),
    Rgb([128, 249, 173]),
    Rgb([255, 102, 102]),
    Rgb([138, 241, 254]),
    Rgb([73, 132, 184]),
    Rgb([253, 150, 31]),
    Rgb([154, 205, 50]),
    Rgb([172, 79, 6]),
    Rgb([196, 142, 253]),
];

const ACCEPTED_COLOR: Rgb<u8> = Rgb([98, 220, 100]);
const FAILED_COLOR: Rgb<u8> = Rgb([220, 40, 57]);

/// Entries of `table` sorted by descending count, cut to `limit`. The sort
/// is stable, so equal counts keep their first-seen order and repeated
/// runs over the same log rank identically.
pub fn rank_top(table: &FrequencyTable, limit: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = table
        .iter()
        .map(|(key, count)| (key.clone(), *count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(limit);
    entries
}

/// Cumulative slice boundaries in [0, 1] for a list of counts. Empty when
/// the counts sum to zero, in which case nothing is drawn.
fn cumulative_bounds(counts: &[u64]) -> Vec<f64> {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return Vec::new();
    }
    let mut bounds = Vec::with_capacity(counts.len() + 1);
    bounds.push(0.0);
    let mut acc = 0u64;
    for count in counts {
        acc += count;
        bounds.push(acc as f64 / total as f64);
    }
    if let Some(last) = bounds.last_mut() {
        *last = 1.0;
    }
    bounds
}

/// Fraction of a full turn measured from twelve o'clock, counterclockwise.
fn angular_fraction(dx: f64, dy: f64) -> f64 {
    let theta = dy.atan2(dx);
    let mut from_top = theta - PI / 2.0;
    if from_top < 0.0 {
        from_top += 2.0 * PI;
    }
    from_top / (2.0 * PI)
}

fn slice_at(bounds: &[f64], fraction: f64) -> Option<usize> {
    if bounds.len() < 2 {
        return None;
    }
    for i in 0..bounds.len() - 1 {
        if fraction >= bounds[i] && fraction < bounds[i + 1] {
            return Some(i);
        }
    }
    Some(bounds.len() - 2)
}

/// Writes ranked donut charts into one output directory.
pub struct ChartRenderer {
    out_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        ChartRenderer {
            out_dir: out_dir.into(),
        }
    }

    /// Renders the top entries of `table` as `<base_name>.png` in the
    /// output directory and prints the written path to stdout.
    pub fn render(&self, table: &FrequencyTable, title: &str, base_name: &str) -> Result<PathBuf> {
        self.draw_donut(table, None, title, base_name)
    }

    /// Like [`render`](Self::render), with a nested ring splitting each
    /// ranked key into its accepted and failed counts.
    pub fn render_split(
        &self,
        table: &FrequencyTable,
        accepted: &FrequencyTable,
        failed: &FrequencyTable,
        title: &str,
        base_name: &str,
    ) -> Result<PathBuf> {
        self.draw_donut(table, Some((accepted, failed)), title, base_name)
    }

    fn draw_donut(
        &self,
        table: &FrequencyTable,
        split: Option<(&FrequencyTable, &FrequencyTable)>,
        title: &str,
        base_name: &str,
    ) -> Result<PathBuf> {
        let ranked = rank_top(table, TOP_ENTRIES);
        let counts: Vec<u64> = ranked.iter().map(|(_, count)| *count).collect();
        let outer_bounds = cumulative_bounds(&counts);

        // Accepted and failed counts interleaved per ranked key, mirroring
        // the outer slice order.
        let split_counts: Vec<u64> = match split {
            Some((accepted, failed)) => ranked
                .iter()
                .flat_map(|(key, _)| {
                    [
                        accepted.get(key).copied().unwrap_or(0),
                        failed.get(key).copied().unwrap_or(0),
                    ]
                })
                .collect(),
            None => Vec::new(),
        };
        let inner_bounds = cumulative_bounds(&split_counts);

        let radius = CANVAS_SIZE as f64 * 0.45;
        let ring_ratio = if split.is_some() { 0.75 } else { 0.70 };
        let ring_floor = radius * ring_ratio;
        let inner_ring = split.map(|_| (radius * 0.50, ring_floor));

        let center = CANVAS_SIZE as f64 / 2.0;
        let mut canvas = RgbImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, WHITE);

        for (x, y, pixel) in canvas.enumerate_pixels_mut() {
            let dx = x as f64 - center + 0.5;
            let dy = center - y as f64 - 0.5;
            let r = (dx * dx + dy * dy).sqrt();
            if r > radius {
                continue;
            }
            let fraction = angular_fraction(dx, dy);
            if r >= ring_floor {
                if let Some(slice) = slice_at(&outer_bounds, fraction) {
                    *pixel = PALETTE[slice % PALETTE.len()];
                }
            } else if let Some((lo, hi)) = inner_ring {
                if r >= lo && r < hi {
                    if let Some(slice) = slice_at(&inner_bounds, fraction) {
                        *pixel = if slice % 2 == 0 {
                            ACCEPTED_COLOR
                        } else {
                            FAILED_COLOR
                        };
                    }
                }
            }
        }

        let path = self.out_dir.join(format!("{base_name}.png"));
        canvas.save(&path)?;
        info!(
            "Chart '{}' ({} slices) written to {}",
            title,
            counts.len(),
            path.display()
        );
        println!("{}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table(entries: &[(&str, u64)]) -> FrequencyTable {
        entries
            .iter()
            .map(|(key, count)| (key.to_string(), *count))
            .collect()
    }

    #[test]
    fn test_rank_top_orders_descending_and_truncates() {
        let mut big = FrequencyTable::new();
        for i in 0..15 {
            big.insert(format!("10.0.0.{}", i), (i as u64) + 1);
        }
        let ranked = rank_top(&big, TOP_ENTRIES);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0], ("10.0.0.14".to_string(), 15));
        assert_eq!(ranked[9], ("10.0.0.5".to_string(), 6));
    }

    #[test]
    fn test_rank_top_ties_keep_first_seen_order() {
        let t = table(&[("beta", 2), ("alpha", 2), ("gamma", 5)]);
        let ranked = rank_top(&t, 10);
        assert_eq!(
            ranked,
            vec![
                ("gamma".to_string(), 5),
                ("beta".to_string(), 2),
                ("alpha".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_cumulative_bounds_cover_unit_interval() {
        let bounds = cumulative_bounds(&[3, 1]);
        assert_eq!(bounds.len(), 3);
        assert_eq!(bounds[0], 0.0);
        assert!((bounds[1] - 0.75).abs() < 1e-9);
        assert_eq!(bounds[2], 1.0);
        assert!(cumulative_bounds(&[0, 0]).is_empty());
        assert!(cumulative_bounds(&[]).is_empty());
    }

    #[test]
    fn test_angular_fraction_quadrants() {
        // Counterclockwise from twelve o'clock: left is a quarter turn,
        // bottom a half, right three quarters.
        assert!(angular_fraction(0.0, 1.0).abs() < 1e-9);
        assert!((angular_fraction(-1.0, 0.0) - 0.25).abs() < 1e-9);
        assert!((angular_fraction(0.0, -1.0) - 0.5).abs() < 1e-9);
        assert!((angular_fraction(1.0, 0.0) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_render_writes_png_with_ring_and_hole() {
        let dir = tempdir().unwrap();
        let renderer = ChartRenderer::new(dir.path());
        let t = table(&[("a", 3), ("b", 1)]);

        let path = renderer.render(&t, "Top 10 IPs", "sship").unwrap();
        assert_eq!(path, dir.path().join("sship.png"));

        let png = image::open(&path).unwrap().into_rgb8();
        assert_eq!(png.dimensions(), (CANVAS_SIZE, CANVAS_SIZE));
        // Center sits in the donut hole.
        assert_eq!(*png.get_pixel(400, 400), WHITE);
        // Nine o'clock is a quarter turn into the first slice.
        assert_eq!(*png.get_pixel(50, 400), PALETTE[0]);
    }

    #[test]
    fn test_render_split_draws_inner_ring() {
        let dir = tempdir().unwrap();
        let renderer = ChartRenderer::new(dir.path());
        let totals = table(&[("bob", 2)]);
        let accepted = table(&[("bob", 1)]);
        let failed = table(&[("bob", 1)]);

        let path = renderer
            .render_split(&totals, &accepted, &failed, "Top 10 Users", "sshusers")
            .unwrap();

        let png = image::open(&path).unwrap().into_rgb8();
        // Outer ring belongs to the single ranked user.
        assert_eq!(*png.get_pixel(50, 400), PALETTE[0]);
        // First half of the inner ring is the accepted share, second half
        // the failed share.
        assert_eq!(*png.get_pixel(175, 400), ACCEPTED_COLOR);
        assert_eq!(*png.get_pixel(625, 400), FAILED_COLOR);
        // The hole shrinks but stays white.
        assert_eq!(*png.get_pixel(400, 400), WHITE);
    }

    #[test]
    fn test_render_empty_table_still_writes_file() {
        let dir = tempdir().unwrap();
        let renderer = ChartRenderer::new(dir.path());
        let path = renderer
            .render(&FrequencyTable::new(), "Top 10 IPs", "apacheip")
            .unwrap();
        assert!(path.exists());
        let png = image::open(&path).unwrap().into_rgb8();
        assert_eq!(*png.get_pixel(50, 400), WHITE);
    }
}
