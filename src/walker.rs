use crate::cluster::Point;
use crate::settings::{NeighborhoodType, SpawnMode};
use rand::Rng;

/// Random source for particle spawning and lattice steps.
///
/// The RNG is injected so seeded runs are reproducible.
pub struct RandomWalker<R: Rng> {
    rng: R,
    neighborhood: NeighborhoodType,
    spawn_mode: SpawnMode,
}

impl<R: Rng> RandomWalker<R> {
    pub fn new(rng: R, neighborhood: NeighborhoodType, spawn_mode: SpawnMode) -> Self {
        Self {
            rng,
            neighborhood,
            spawn_mode,
        }
    }

    /// Pick a release position strictly inside `[0, grid_size)`.
    ///
    /// Circle mode picks a uniform angle on a circle of `spawn_radius` around
    /// `center`. Edges mode picks a uniform cell on the grid's outer ring.
    pub fn spawn_position(&mut self, grid_size: usize, center: Point, spawn_radius: f32) -> Point {
        let max = grid_size.saturating_sub(1) as i32;

        match self.spawn_mode {
            SpawnMode::Circle => {
                let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
                let x = center.x as f32 + spawn_radius * angle.cos();
                let y = center.y as f32 + spawn_radius * angle.sin();
                Point::new(
                    (x.round() as i32).clamp(0, max),
                    (y.round() as i32).clamp(0, max),
                )
            }
            SpawnMode::Edges => {
                let along = self.rng.gen_range(0..=max);
                match self.rng.gen_range(0..4) {
                    0 => Point::new(along, 0),   // Top
                    1 => Point::new(along, max), // Bottom
                    2 => Point::new(0, along),   // Left
                    _ => Point::new(max, along), // Right
                }
            }
        }
    }

    /// Move one lattice step in a uniformly chosen neighbor direction
    pub fn step(&mut self, position: Point) -> Point {
        let offsets = self.neighborhood.offsets();
        let offset = offsets[self.rng.gen_range(0..offsets.len())];
        position.offset(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn walker(neighborhood: NeighborhoodType, spawn_mode: SpawnMode) -> RandomWalker<StdRng> {
        RandomWalker::new(StdRng::seed_from_u64(42), neighborhood, spawn_mode)
    }

    #[test]
    fn test_step_moves_to_a_neighbor() {
        let mut w = walker(NeighborhoodType::VonNeumann, SpawnMode::Circle);
        let start = Point::new(10, 10);
        for _ in 0..200 {
            let next = w.step(start);
            let dist = (next.x - start.x).abs() + (next.y - start.y).abs();
            assert_eq!(dist, 1);
        }
    }

    #[test]
    fn test_step_directions_are_roughly_uniform() {
        let mut w = walker(NeighborhoodType::VonNeumann, SpawnMode::Circle);
        let start = Point::new(0, 0);
        let mut counts = [0usize; 4];
        for _ in 0..4000 {
            let next = w.step(start);
            let idx = NeighborhoodType::VonNeumann
                .offsets()
                .iter()
                .position(|&(dx, dy)| dx == next.x && dy == next.y)
                .unwrap();
            counts[idx] += 1;
        }
        for count in counts {
            assert!((800..1200).contains(&count), "skewed direction count {}", count);
        }
    }

    #[test]
    fn test_moore_step_reaches_diagonals() {
        let mut w = walker(NeighborhoodType::Moore, SpawnMode::Circle);
        let start = Point::new(5, 5);
        let diagonal = (0..500)
            .map(|_| w.step(start))
            .any(|p| p.x != start.x && p.y != start.y);
        assert!(diagonal);
    }

    #[test]
    fn test_circle_spawn_stays_in_bounds() {
        let mut w = walker(NeighborhoodType::VonNeumann, SpawnMode::Circle);
        let center = Point::new(25, 25);
        for _ in 0..500 {
            let p = w.spawn_position(50, center, 40.0);
            assert!(p.in_bounds(50));
        }
    }

    #[test]
    fn test_circle_spawn_radius() {
        let mut w = walker(NeighborhoodType::VonNeumann, SpawnMode::Circle);
        let center = Point::new(50, 50);
        for _ in 0..200 {
            let d = w.spawn_position(100, center, 10.0).distance(center);
            assert!((9.0..=11.0).contains(&d), "distance {}", d);
        }
    }

    #[test]
    fn test_edge_spawn_is_on_outer_ring() {
        let mut w = walker(NeighborhoodType::VonNeumann, SpawnMode::Edges);
        for _ in 0..500 {
            let p = w.spawn_position(20, Point::new(10, 10), 0.0);
            assert!(p.in_bounds(20));
            assert!(p.x == 0 || p.y == 0 || p.x == 19 || p.y == 19);
        }
    }
}
