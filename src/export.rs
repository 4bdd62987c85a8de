//! Image export of clusters: a still PNG colored by arrival order and an
//! animated GIF replaying the growth.

use crate::braille::age_color;
use crate::cluster::{Cluster, Point};
use crate::error::DlaError;
use image::{Rgb, RgbImage};
use ratatui::style::Color;
use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

/// Empty border around the cluster, in lattice cells
const MARGIN: u32 = 2;

/// Largest image side in pixels
const MAX_IMAGE_SIDE: u32 = 16_384;

/// Upper bound on GIF frames regardless of cluster size
const MAX_GIF_FRAMES: usize = 60;

/// Delay between GIF frames in hundredths of a second
const GIF_FRAME_DELAY: u16 = 8;

/// Pixel geometry for drawing a cluster at `scale` pixels per cell
struct Layout {
    /// Lattice coordinate drawn at pixel (0, 0)
    origin: (i64, i64),
    scale: u32,
    width: u32,
    height: u32,
}

impl Layout {
    fn new(cluster: &Cluster, scale: u32) -> Result<Self, DlaError> {
        let (min, max) = cluster
            .bounds()
            .ok_or_else(|| DlaError::Export("cannot draw an empty cluster".to_string()))?;
        let scale = scale.max(1);
        let width = side_pixels(min.x, max.x, scale)?;
        let height = side_pixels(min.y, max.y, scale)?;
        Ok(Self {
            origin: (min.x as i64 - MARGIN as i64, min.y as i64 - MARGIN as i64),
            scale,
            width,
            height,
        })
    }

    /// Top-left pixel of a lattice cell
    fn pixel(&self, p: Point) -> (u32, u32) {
        (
            (p.x as i64 - self.origin.0) as u32 * self.scale,
            (p.y as i64 - self.origin.1) as u32 * self.scale,
        )
    }
}

/// Pixel length of one side covering `min..=max` plus margins
fn side_pixels(min: i32, max: i32, scale: u32) -> Result<u32, DlaError> {
    let cells = (max as i64 - min as i64 + 1 + 2 * MARGIN as i64) as u64;
    cells
        .checked_mul(scale as u64)
        .and_then(|px| u32::try_from(px).ok())
        .filter(|&px| px <= MAX_IMAGE_SIDE)
        .ok_or_else(|| {
            DlaError::Export(format!(
                "image side of {} cells at scale {} exceeds {} pixels",
                cells, scale, MAX_IMAGE_SIDE
            ))
        })
}

fn to_rgb(color: Color) -> Rgb<u8> {
    match color {
        Color::Rgb(r, g, b) => Rgb([r, g, b]),
        _ => Rgb([255, 255, 255]),
    }
}

/// Draw the cluster on a black background, colored by arrival order
pub fn render_image(cluster: &Cluster, scale: u32) -> Result<RgbImage, DlaError> {
    let layout = Layout::new(cluster, scale)?;
    let mut img = RgbImage::from_pixel(layout.width, layout.height, Rgb([0, 0, 0]));
    let inv_len = 1.0 / cluster.len().saturating_sub(1).max(1) as f32;

    for (age, &p) in cluster.iter().enumerate() {
        let color = to_rgb(age_color(age as f32 * inv_len));
        let (px, py) = layout.pixel(p);
        for dy in 0..layout.scale {
            for dx in 0..layout.scale {
                img.put_pixel(px + dx, py + dy, color);
            }
        }
    }
    Ok(img)
}

/// Save the cluster as an image; the format follows the file extension
pub fn write_png(cluster: &Cluster, path: &Path, scale: u32) -> Result<(), DlaError> {
    let img = render_image(cluster, scale)?;
    img.save(path)?;
    tracing::info!(path = %path.display(), width = img.width(), height = img.height(), "Wrote cluster image");
    Ok(())
}

/// Save an animated GIF that adds particles in arrival order
pub fn write_growth_gif(cluster: &Cluster, path: &Path, scale: u32) -> Result<(), DlaError> {
    let layout = Layout::new(cluster, scale)?;
    let width = u16::try_from(layout.width)
        .map_err(|_| DlaError::Export(format!("GIF width {} exceeds 65535", layout.width)))?;
    let height = u16::try_from(layout.height)
        .map_err(|_| DlaError::Export(format!("GIF height {} exceeds 65535", layout.height)))?;

    // Index 0 = background, 1 = particle
    let palette = [0u8, 0, 0, 255, 255, 255];
    let mut file = File::create(path)?;
    let mut encoder = gif::Encoder::new(&mut file, width, height, &palette)?;
    encoder.set_repeat(gif::Repeat::Infinite)?;

    let mut pixels = vec![0u8; layout.width as usize * layout.height as usize];
    let frames = cluster.len().min(MAX_GIF_FRAMES);
    let points = cluster.points();
    let mut drawn = 0;

    for frame_idx in 1..=frames {
        let target = points.len() * frame_idx / frames;
        for &p in &points[drawn..target] {
            let (px, py) = layout.pixel(p);
            for dy in 0..layout.scale {
                let row = (py + dy) as usize * layout.width as usize;
                for dx in 0..layout.scale {
                    pixels[row + (px + dx) as usize] = 1;
                }
            }
        }
        drawn = target;

        let mut frame = gif::Frame {
            width,
            height,
            delay: GIF_FRAME_DELAY,
            ..gif::Frame::default()
        };
        frame.buffer = Cow::Borrowed(&pixels);
        encoder.write_frame(&frame)?;
    }

    tracing::info!(path = %path.display(), frames, "Wrote growth animation");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn small_cluster() -> Cluster {
        let mut cluster = Cluster::with_seed(Point::new(5, 5));
        cluster.insert(Point::new(6, 5));
        cluster.insert(Point::new(6, 6));
        cluster
    }

    #[test]
    fn test_image_dimensions_include_margin() {
        let img = render_image(&small_cluster(), 3).unwrap();
        // 2x2 cells plus a margin of 2 on each side, 3 pixels per cell
        assert_eq!(img.width(), 18);
        assert_eq!(img.height(), 18);
    }

    #[test]
    fn test_image_marks_cluster_cells() {
        let img = render_image(&small_cluster(), 1).unwrap();
        // Seed at (5,5) maps to (MARGIN, MARGIN)
        assert_eq!(*img.get_pixel(2, 2), to_rgb(age_color(0.0)));
        assert_eq!(*img.get_pixel(3, 3), to_rgb(age_color(1.0)));
        assert_eq!(*img.get_pixel(2, 3), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_empty_cluster_cannot_be_drawn() {
        assert!(matches!(render_image(&Cluster::new(), 1), Err(DlaError::Export(_))));
    }

    #[test]
    fn test_oversized_cluster_is_an_export_error() {
        let cluster = Cluster::read_from("0 0\n2147483647 0\n".as_bytes()).unwrap();
        assert!(matches!(render_image(&cluster, 4), Err(DlaError::Export(_))));

        let dir = tempdir().unwrap();
        let gif = dir.path().join("growth.gif");
        assert!(matches!(write_growth_gif(&cluster, &gif, 16), Err(DlaError::Export(_))));
    }

    #[test]
    fn test_png_and_gif_written() {
        let dir = tempdir().unwrap();
        let png = dir.path().join("cluster.png");
        let gif = dir.path().join("growth.gif");

        write_png(&small_cluster(), &png, 4).unwrap();
        write_growth_gif(&small_cluster(), &gif, 4).unwrap();

        let decoded = image::open(&png).unwrap();
        assert_eq!(decoded.width(), 24);
        assert!(std::fs::metadata(&gif).unwrap().len() > 0);
    }
}
