use crate::error::DlaError;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A lattice coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Point shifted by a lattice offset
    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Point) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// True if the point lies in `[0, size)` on both axes
    pub fn in_bounds(self, size: usize) -> bool {
        let size = size as i64;
        (0..size).contains(&(self.x as i64)) && (0..size).contains(&(self.y as i64))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Stuck particles in arrival order. The first point is the seed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cluster {
    points: Vec<Point>,
    members: HashSet<Point>,
}

impl Cluster {
    /// Empty cluster, used when reading points back from a file
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: Point) -> Self {
        let mut cluster = Self::new();
        cluster.insert(seed);
        cluster
    }

    /// Append a point. Returns false (and keeps the cluster unchanged) on a duplicate.
    pub fn insert(&mut self, point: Point) -> bool {
        if self.members.insert(point) {
            self.points.push(point);
            true
        } else {
            false
        }
    }

    pub fn seed(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Inclusive bounding box `(min, max)`
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold((first, first), |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        }))
    }

    /// Side length of the smallest square covering the bounding box
    pub fn span(&self) -> usize {
        self.bounds()
            .map(|(min, max)| {
                let dx = max.x as i64 - min.x as i64;
                let dy = max.y as i64 - min.y as i64;
                (dx.max(dy) + 1) as usize
            })
            .unwrap_or(0)
    }

    /// Farthest distance of any point from the seed
    pub fn radius(&self) -> f32 {
        match self.seed() {
            Some(seed) => self
                .points
                .iter()
                .map(|p| p.distance(seed))
                .fold(0.0, f32::max),
            None => 0.0,
        }
    }

    /// Write one `x y` line per point, seed first
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), DlaError> {
        let mut writer = BufWriter::new(writer);
        for p in &self.points {
            writeln!(writer, "{} {}", p.x, p.y)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), DlaError> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Parse `x y` lines. Blank lines are skipped, duplicates are dropped.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, DlaError> {
        let mut cluster = Cluster::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let point = parse_line(trimmed).ok_or_else(|| {
                DlaError::InvalidArgument(format!(
                    "malformed cluster line {}: {:?} (expected two non-negative integers)",
                    idx + 1,
                    trimmed
                ))
            })?;
            if !cluster.insert(point) {
                tracing::warn!(line = idx + 1, x = point.x, y = point.y, "duplicate point in cluster file, skipped");
            }
        }
        Ok(cluster)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, DlaError> {
        if !path.is_file() {
            return Err(DlaError::InvalidArgument(format!(
                "cluster file not found: {}",
                path.display()
            )));
        }
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }
}

fn parse_line(line: &str) -> Option<Point> {
    let mut parts = line.split_whitespace();
    let x = parts.next()?.parse::<i32>().ok()?;
    let y = parts.next()?.parse::<i32>().ok()?;
    if parts.next().is_some() || x < 0 || y < 0 {
        return None;
    }
    Some(Point::new(x, y))
}
