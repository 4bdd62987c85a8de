use serde::{Deserialize, Serialize};

/// Lattice neighborhood used both for walk steps and sticking checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NeighborhoodType {
    /// 4 neighbors (orthogonal only) - classic lattice DLA
    #[default]
    VonNeumann,
    /// 8 neighbors (orthogonal + diagonal)
    Moore,
}

impl NeighborhoodType {
    pub fn name(&self) -> &str {
        match self {
            NeighborhoodType::VonNeumann => "VonNeumann",
            NeighborhoodType::Moore => "Moore",
        }
    }

    /// Get the neighbor offsets for this neighborhood type
    pub fn offsets(&self) -> &'static [(i32, i32)] {
        match self {
            NeighborhoodType::VonNeumann => &[(-1, 0), (1, 0), (0, -1), (0, 1)],
            NeighborhoodType::Moore => &[
                (-1, -1), (0, -1), (1, -1),
                (-1, 0),          (1, 0),
                (-1, 1),  (0, 1),  (1, 1),
            ],
        }
    }
}

/// Spawn mode - where particles are released from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpawnMode {
    /// Spawn on a circle just outside the current cluster radius
    #[default]
    Circle,
    /// Spawn on the outer ring of the grid
    Edges,
}

impl SpawnMode {
    pub fn name(&self) -> &str {
        match self {
            SpawnMode::Circle => "Circle",
            SpawnMode::Edges => "Edges",
        }
    }
}

/// All simulation settings consolidated into one struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Neighborhood for steps and adjacency, fixed for a run
    pub neighborhood: NeighborhoodType,
    /// Where particles spawn from
    pub spawn_mode: SpawnMode,
    /// Gap between the cluster radius and the spawn circle (Circle mode)
    pub spawn_radius_offset: f32,
    /// Walkers farther than `spawn_radius * escape_multiplier` from the center
    /// are discarded and respawned. `None` keeps them until they leave the grid.
    pub escape_multiplier: Option<f32>,
    /// Upper bound on released particles (stuck + escaped). `None` retries forever.
    pub max_attempts: Option<usize>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            neighborhood: NeighborhoodType::default(),
            spawn_mode: SpawnMode::default(),
            spawn_radius_offset: 5.0,
            escape_multiplier: Some(3.0),
            max_attempts: None,
        }
    }
}

impl SimulationSettings {
    /// Radius of the circle particles are released on for a given cluster radius
    pub fn spawn_radius(&self, cluster_radius: f32) -> f32 {
        cluster_radius + self.spawn_radius_offset.max(1.0)
    }

    /// Squared kill distance for a given spawn radius, if the kill circle is enabled
    pub fn escape_distance_sq(&self, spawn_radius: f32) -> Option<f32> {
        self.escape_multiplier.map(|mult| {
            let d = spawn_radius * mult.max(1.0);
            d * d
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_count() {
        assert_eq!(NeighborhoodType::VonNeumann.offsets().len(), 4);
        assert_eq!(NeighborhoodType::Moore.offsets().len(), 8);
        assert!(!NeighborhoodType::Moore.offsets().contains(&(0, 0)));
    }

    #[test]
    fn test_defaults_match_lattice_dla() {
        let settings = SimulationSettings::default();
        assert_eq!(settings.neighborhood, NeighborhoodType::VonNeumann);
        assert_eq!(settings.spawn_mode, SpawnMode::Circle);
        assert!(settings.max_attempts.is_none());
    }

    #[test]
    fn test_escape_distance_never_inside_spawn_circle() {
        let settings = SimulationSettings {
            escape_multiplier: Some(0.5),
            ..Default::default()
        };
        assert_eq!(settings.escape_distance_sq(10.0), Some(100.0));

        let disabled = SimulationSettings {
            escape_multiplier: None,
            ..Default::default()
        };
        assert_eq!(disabled.escape_distance_sq(10.0), None);
    }

    #[test]
    fn test_partial_settings_json_uses_defaults() {
        let parsed: SimulationSettings =
            serde_json::from_str(r#"{"neighborhood":"Moore"}"#).unwrap();
        assert_eq!(parsed.neighborhood, NeighborhoodType::Moore);
        assert_eq!(parsed.spawn_radius_offset, 5.0);
    }
}
