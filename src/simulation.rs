use crate::cluster::{Cluster, Point};
use crate::error::DlaError;
use crate::grid::OccupancyGrid;
use crate::settings::{SimulationSettings, SpawnMode};
use crate::walker::RandomWalker;
use rand::Rng;
use std::time::Instant;
use tracing::{debug, info};

/// Counters collected during one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Particles released (stuck + escaped)
    pub attempts: usize,
    /// Particles discarded for leaving the grid or the kill circle
    pub escapes: usize,
    /// Lattice steps taken by all walkers
    pub steps: u64,
}

/// Lattice DLA driver. Releases particles one at a time until the
/// requested number has stuck to the cluster grown from the grid center.
pub struct AggregationEngine<R: Rng> {
    walker: RandomWalker<R>,
    settings: SimulationSettings,
    stats: RunStats,
}

impl<R: Rng> AggregationEngine<R> {
    pub fn new(settings: SimulationSettings, rng: R) -> Self {
        let walker = RandomWalker::new(rng, settings.neighborhood, settings.spawn_mode);
        Self {
            walker,
            settings,
            stats: RunStats::default(),
        }
    }

    /// Counters from the most recent run
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Grow a cluster of `particle_count` particles plus the seed on a
    /// `grid_size` x `grid_size` lattice.
    ///
    /// Escaped particles are respawned and never counted. Unless
    /// `max_attempts` is set this keeps releasing particles until the
    /// cluster is complete.
    pub fn run(&mut self, grid_size: usize, particle_count: usize) -> Result<Cluster, DlaError> {
        validate_run_args(grid_size, particle_count)?;

        let started = Instant::now();
        self.stats = RunStats::default();

        let half = (grid_size / 2) as i32;
        let center = Point::new(half, half);
        let mut grid = OccupancyGrid::new(grid_size, self.settings.neighborhood);
        grid.occupy(center)?;
        let mut cluster = Cluster::with_seed(center);
        let mut cluster_radius: f32 = 1.0;

        info!(
            grid_size,
            particle_count,
            neighborhood = self.settings.neighborhood.name(),
            spawn_mode = self.settings.spawn_mode.name(),
            "Starting aggregation"
        );

        let report_every = (particle_count / 10).max(1);

        while cluster.len() <= particle_count {
            if let Some(max) = self.settings.max_attempts {
                if self.stats.attempts >= max {
                    return Err(DlaError::RetryLimitExceeded {
                        attempts: self.stats.attempts,
                        stuck: cluster.len() - 1,
                    });
                }
            }
            self.stats.attempts += 1;

            match self.release_particle(&grid, center, cluster_radius) {
                Some(p) => {
                    grid.occupy(p)?;
                    cluster.insert(p);
                    cluster_radius = cluster_radius.max(p.distance(center).ceil());

                    let stuck = cluster.len() - 1;
                    if stuck % report_every == 0 {
                        debug!(stuck, cluster_radius, escapes = self.stats.escapes, "Aggregation progress");
                    }
                }
                None => self.stats.escapes += 1,
            }
        }

        info!(
            points = grid.occupied_count(),
            cluster_radius,
            escapes = self.stats.escapes,
            steps = self.stats.steps,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Aggregation complete"
        );

        Ok(cluster)
    }

    /// Walk one particle until it sticks (`Some`) or escapes (`None`).
    fn release_particle(
        &mut self,
        grid: &OccupancyGrid,
        center: Point,
        cluster_radius: f32,
    ) -> Option<Point> {
        let grid_size = grid.size();
        let spawn_radius = self.settings.spawn_radius(cluster_radius);

        // The kill circle only makes sense when walkers start inside it
        let escape_dist_sq = match self.settings.spawn_mode {
            SpawnMode::Circle => self.settings.escape_distance_sq(spawn_radius),
            SpawnMode::Edges => None,
        };

        let mut pos = self.walker.spawn_position(grid_size, center, spawn_radius);

        loop {
            pos = self.walker.step(pos);
            self.stats.steps += 1;

            if !pos.in_bounds(grid_size) {
                return None;
            }

            if let Some(limit) = escape_dist_sq {
                let dx = (pos.x - center.x) as f32;
                let dy = (pos.y - center.y) as f32;
                if dx * dx + dy * dy > limit {
                    return None;
                }
            }

            // Occupied cells are walked over, never stuck to
            if !grid.is_occupied(pos) && grid.is_adjacent_to_cluster(pos) {
                return Some(pos);
            }
        }
    }
}

/// Reject runs that cannot start or can never finish
pub fn validate_run_args(grid_size: usize, particle_count: usize) -> Result<(), DlaError> {
    if grid_size == 0 {
        return Err(DlaError::InvalidArgument(
            "grid size must be positive".to_string(),
        ));
    }
    if particle_count == 0 {
        return Err(DlaError::InvalidArgument(
            "particle count must be positive".to_string(),
        ));
    }
    let capacity = grid_size.checked_mul(grid_size).unwrap_or(usize::MAX);
    if particle_count >= capacity {
        return Err(DlaError::InvalidArgument(format!(
            "{} particles plus the seed do not fit on a {}x{} grid",
            particle_count, grid_size, grid_size
        )));
    }
    Ok(())
}
