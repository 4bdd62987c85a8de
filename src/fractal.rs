//! Fractal dimension estimation for lattice clusters.
//!
//! Two estimators share one least-squares fit:
//! - box counting: `log N(s)` against `log(1/s)` over box sizes `s`
//! - mass-radius: `log M(R)` against `log R` for squares of half-width `R`
//!   centred on the seed
//!
//! In both cases the fitted slope is the dimension estimate.

use crate::cluster::Cluster;
use crate::error::DlaError;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Which estimator produced a fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EstimationMethod {
    #[default]
    BoxCounting,
    MassRadius,
}

impl EstimationMethod {
    pub fn name(&self) -> &str {
        match self {
            EstimationMethod::BoxCounting => "Box counting",
            EstimationMethod::MassRadius => "Mass-radius",
        }
    }

    /// Axis labels for the log-log plot
    pub fn axis_labels(&self) -> (&str, &str) {
        match self {
            EstimationMethod::BoxCounting => ("ln(1/s)", "ln N(s)"),
            EstimationMethod::MassRadius => ("ln R", "ln M(R)"),
        }
    }
}

/// Count at one scale. For mass-radius fits `box_size` is the side of the
/// square around the seed (`2R`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoxCountSample {
    pub box_size: usize,
    pub count: usize,
}

/// Least-squares line through a set of points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Result of a dimension estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub method: EstimationMethod,
    pub slope: f64,
    pub intercept: f64,
    /// Fractal dimension, equal to the slope. Larger means denser.
    pub dimension: f64,
    pub r_squared: f64,
    pub samples: Vec<BoxCountSample>,
    /// The `(x, y)` log-log points the line was fitted to
    pub log_points: Vec<(f64, f64)>,
}

impl FitResult {
    fn from_fit(method: EstimationMethod, fit: LineFit, samples: Vec<BoxCountSample>, log_points: Vec<(f64, f64)>) -> Self {
        Self {
            method,
            slope: fit.slope,
            intercept: fit.intercept,
            dimension: fit.slope,
            r_squared: fit.r_squared,
            samples,
            log_points,
        }
    }

    /// Value of the fitted line at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Number of `box_size` x `box_size` cells, aligned to the origin, that
/// contain at least one cluster point.
pub fn box_count(cluster: &Cluster, box_size: usize) -> Result<usize, DlaError> {
    if box_size == 0 {
        return Err(DlaError::InvalidArgument(
            "box size must be positive".to_string(),
        ));
    }
    if box_size == 1 {
        return Ok(cluster.len());
    }
    let size = i32::try_from(box_size).unwrap_or(i32::MAX);
    let boxes: HashSet<(i32, i32)> = cluster
        .iter()
        .map(|p| (p.x.div_euclid(size), p.y.div_euclid(size)))
        .collect();
    Ok(boxes.len())
}

/// Number of points in the half-open square `[c - r, c + r)^2` around the seed
pub fn mass_within(cluster: &Cluster, radius: usize) -> usize {
    let Some(seed) = cluster.seed() else {
        return 0;
    };
    let r = radius as i64;
    let (cx, cy) = (seed.x as i64, seed.y as i64);
    cluster
        .iter()
        .filter(|p| {
            let (x, y) = (p.x as i64, p.y as i64);
            (cx - r..cx + r).contains(&x) && (cy - r..cy + r).contains(&y)
        })
        .count()
}

/// Ordinary least squares fit of `y = slope * x + intercept`
pub fn linear_fit(points: &[(f64, f64)]) -> Result<LineFit, DlaError> {
    if points.len() < 2 {
        return Err(DlaError::InsufficientData(format!(
            "need at least 2 points for a fit, got {}",
            points.len()
        )));
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|&(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|&(_, y)| y).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for &(x, y) in points {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if sxx <= f64::EPSILON {
        return Err(DlaError::InsufficientData(
            "all scales are identical".to_string(),
        ));
    }
    if syy <= f64::EPSILON {
        return Err(DlaError::InsufficientData(
            "counts do not change across scales; cluster is too small for these sizes".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let ss_res: f64 = points
        .iter()
        .map(|&(x, y)| {
            let e = y - (slope * x + intercept);
            e * e
        })
        .sum();

    Ok(LineFit {
        slope,
        intercept,
        r_squared: 1.0 - ss_res / syy,
    })
}

/// Distinct positive scales in ascending order
fn distinct_scales(scales: &[usize], what: &str) -> Result<Vec<usize>, DlaError> {
    if scales.contains(&0) {
        return Err(DlaError::InvalidArgument(format!("{} must be positive", what)));
    }
    let distinct: Vec<usize> = scales.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    if distinct.len() < 2 {
        return Err(DlaError::InsufficientData(format!(
            "need at least 2 distinct {}, got {}",
            what,
            distinct.len()
        )));
    }
    Ok(distinct)
}

/// Box-counting dimension of `cluster` over `box_sizes`
pub fn estimate(cluster: &Cluster, box_sizes: &[usize]) -> Result<FitResult, DlaError> {
    let sizes = distinct_scales(box_sizes, "box sizes")?;
    if cluster.is_empty() {
        return Err(DlaError::InsufficientData("cluster is empty".to_string()));
    }

    let mut samples = Vec::with_capacity(sizes.len());
    let mut log_points = Vec::with_capacity(sizes.len());
    for box_size in sizes {
        let count = box_count(cluster, box_size)?;
        samples.push(BoxCountSample { box_size, count });
        log_points.push(((1.0 / box_size as f64).ln(), (count as f64).ln()));
    }

    let fit = linear_fit(&log_points)?;
    tracing::debug!(dimension = fit.slope, r_squared = fit.r_squared, "Box-counting fit");
    Ok(FitResult::from_fit(EstimationMethod::BoxCounting, fit, samples, log_points))
}

/// Mass-radius dimension of `cluster` around its seed over `radii`
pub fn estimate_mass_radius(cluster: &Cluster, radii: &[usize]) -> Result<FitResult, DlaError> {
    let radii = distinct_scales(radii, "radii")?;
    if cluster.is_empty() {
        return Err(DlaError::InsufficientData("cluster is empty".to_string()));
    }

    let mut samples = Vec::with_capacity(radii.len());
    let mut log_points = Vec::with_capacity(radii.len());
    for radius in radii {
        let count = mass_within(cluster, radius);
        samples.push(BoxCountSample {
            box_size: radius * 2,
            count,
        });
        log_points.push(((radius as f64).ln(), (count as f64).ln()));
    }

    let fit = linear_fit(&log_points)?;
    tracing::debug!(dimension = fit.slope, r_squared = fit.r_squared, "Mass-radius fit");
    Ok(FitResult::from_fit(EstimationMethod::MassRadius, fit, samples, log_points))
}

/// Powers of two from 1 up to the cluster span (at least `[1, 2]`)
pub fn default_box_sizes(cluster: &Cluster) -> Vec<usize> {
    let limit = cluster.span().max(2);
    std::iter::successors(Some(1usize), |s| s.checked_mul(2))
        .take_while(|&s| s <= limit)
        .collect()
}

/// Powers of two from 1 up to the first radius whose square covers the
/// whole cluster (at least `[1, 2]`)
pub fn default_radii(cluster: &Cluster) -> Vec<usize> {
    let covering = match cluster.seed() {
        Some(seed) => cluster
            .iter()
            .map(|p| {
                let dx = p.x as i64 - seed.x as i64;
                let dy = p.y as i64 - seed.y as i64;
                (-dx).max(dx + 1).max(-dy).max(dy + 1)
            })
            .max()
            .unwrap_or(1),
        None => 1,
    };
    let limit = usize::try_from(covering).unwrap_or(usize::MAX).max(2);
    let mut radii = vec![1usize];
    while let Some(&last) = radii.last() {
        if last >= limit {
            break;
        }
        match last.checked_mul(2) {
            Some(next) => radii.push(next),
            None => break,
        }
    }
    radii
}
