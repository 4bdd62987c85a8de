use crate::cluster::Point;
use crate::error::DlaError;
use crate::settings::NeighborhoodType;

/// Dense N x N occupancy store for the growing cluster
pub struct OccupancyGrid {
    size: usize,
    cells: Vec<bool>,
    neighborhood: NeighborhoodType,
    occupied: usize,
}

impl OccupancyGrid {
    pub fn new(size: usize, neighborhood: NeighborhoodType) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
            neighborhood,
            occupied: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.occupied
    }

    fn index(&self, p: Point) -> Option<usize> {
        p.in_bounds(self.size)
            .then(|| p.y as usize * self.size + p.x as usize)
    }

    /// O(1) lookup, false outside the grid
    pub fn is_occupied(&self, p: Point) -> bool {
        self.index(p).is_some_and(|idx| self.cells[idx])
    }

    /// Mark a cell as part of the cluster
    pub fn occupy(&mut self, p: Point) -> Result<(), DlaError> {
        let idx = self.index(p).ok_or_else(|| {
            DlaError::InvalidArgument(format!(
                "({}, {}) is outside the {}x{} grid",
                p.x, p.y, self.size, self.size
            ))
        })?;
        if self.cells[idx] {
            return Err(DlaError::AlreadyOccupied(p));
        }
        self.cells[idx] = true;
        self.occupied += 1;
        Ok(())
    }

    /// True if any neighbor of `p` is occupied
    pub fn is_adjacent_to_cluster(&self, p: Point) -> bool {
        self.neighborhood
            .offsets()
            .iter()
            .any(|&offset| self.is_occupied(p.offset(offset)))
    }
}
