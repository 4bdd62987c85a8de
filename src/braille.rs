use crate::cluster::Cluster;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// Gradient endpoints for arrival order: seed is cold, newest particles warm
const OLDEST_COLOR: (u8, u8, u8) = (40, 120, 255);
const NEWEST_COLOR: (u8, u8, u8) = (255, 80, 160);

/// A single rendered Braille cell with position and color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Linear color ramp over arrival order (0.0 = seed, 1.0 = last particle)
pub fn age_color(t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color::Rgb(
        lerp(OLDEST_COLOR.0, NEWEST_COLOR.0),
        lerp(OLDEST_COLOR.1, NEWEST_COLOR.1),
        lerp(OLDEST_COLOR.2, NEWEST_COLOR.2),
    )
}

/// Render the cluster into a canvas of `canvas_width` x `canvas_height` characters.
///
/// The cluster's bounding box is scaled uniformly to fit the Braille dot
/// resolution (never magnified) and centred. Each cell is colored by the
/// newest particle it contains.
pub fn render_to_braille(cluster: &Cluster, canvas_width: u16, canvas_height: u16) -> Vec<BrailleCell> {
    let Some((min, max)) = cluster.bounds() else {
        return Vec::new();
    };
    if canvas_width == 0 || canvas_height == 0 {
        return Vec::new();
    }

    // Braille effective resolution
    let braille_width = canvas_width as usize * 2;
    let braille_height = canvas_height as usize * 4;

    let span_x = (max.x as i64 - min.x as i64 + 1) as f32;
    let span_y = (max.y as i64 - min.y as i64 + 1) as f32;
    let scale = (span_x / braille_width as f32)
        .max(span_y / braille_height as f32)
        .max(1.0);

    // Centre the drawing in the canvas
    let offset_x = (braille_width as f32 - span_x / scale).max(0.0) / 2.0;
    let offset_y = (braille_height as f32 - span_y / scale).max(0.0) / 2.0;

    let cols = canvas_width as usize;
    let mut patterns = vec![0u8; cols * canvas_height as usize];
    let mut newest = vec![0f32; patterns.len()];
    let inv_len = 1.0 / (cluster.len().saturating_sub(1)).max(1) as f32;

    for (age, p) in cluster.iter().enumerate() {
        let bx = (((p.x - min.x) as f32 / scale + offset_x) as usize).min(braille_width - 1);
        let by = (((p.y - min.y) as f32 / scale + offset_y) as usize).min(braille_height - 1);
        let idx = (by / 4) * cols + bx / 2;
        patterns[idx] |= BRAILLE_DOTS[bx % 2][by % 4];
        newest[idx] = newest[idx].max(age as f32 * inv_len);
    }

    patterns
        .iter()
        .zip(newest.iter())
        .enumerate()
        .filter(|(_, (pattern, _))| **pattern != 0)
        .map(|(idx, (&pattern, &t))| BrailleCell {
            x: (idx % cols) as u16,
            y: (idx / cols) as u16,
            char: char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' '),
            color: age_color(t),
        })
        .collect()
}
