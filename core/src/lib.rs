#![no_std]

extern crate alloc;

use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use cell::*;
pub use engine::*;
pub use error::*;
pub use event::*;
pub use generator::*;
pub use types::*;

mod cell;
mod engine;
mod error;
mod event;
mod generator;
mod types;

/// Default side length of the square index space.
pub const DEFAULT_GRID_SIZE: Coord = 17;

/// Default number of fire cells hidden in the field.
pub const DEFAULT_FIRE_COUNT: CellCount = 30;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Side length of the square index space; the playable region is the
    /// inscribed circle.
    pub size: Coord,
    pub fires: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord, fires: CellCount) -> Self {
        Self { size, fires }
    }

    pub fn new(size: Coord, fires: CellCount) -> Self {
        let size = size.max(1);
        let config = Self::new_unchecked(size, fires);
        let fires = fires.clamp(1, config.playable_cell_count().max(1));
        Self::new_unchecked(size, fires)
    }

    pub const fn radius(&self) -> Coord {
        self.size / 2
    }

    /// Whether `(row, col)` lies inside the circular playable region.
    ///
    /// Compares squared distances in integers, which is exact and agrees
    /// with `sqrt((r - radius)² + (c - radius)²) < radius` on floats.
    pub fn is_playable(&self, (row, col): Coord2) -> bool {
        if row >= self.size || col >= self.size {
            return false;
        }
        let radius = i32::from(self.radius());
        let dr = i32::from(row) - radius;
        let dc = i32::from(col) - radius;
        dr * dr + dc * dc < radius * radius
    }

    pub fn playable_mask(&self) -> Array2<bool> {
        let size = usize::from(self.size);
        Array2::from_shape_fn((size, size), |(row, col)| {
            self.is_playable((row as Coord, col as Coord))
        })
    }

    pub fn playable_cell_count(&self) -> CellCount {
        self.playable_mask()
            .iter()
            .filter(|&&playable| playable)
            .count()
            .try_into()
            .unwrap()
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size, self.size)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new_unchecked(DEFAULT_GRID_SIZE, DEFAULT_FIRE_COUNT)
    }
}

/// Immutable per-round layout: the playable mask and the hidden fire mask.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FireField {
    playable: Array2<bool>,
    fires: Array2<bool>,
    fire_count: CellCount,
}

impl FireField {
    pub(crate) fn from_parts(playable: Array2<bool>, fires: Array2<bool>) -> Self {
        let fire_count = fires
            .iter()
            .filter(|&&has_fire| has_fire)
            .count()
            .try_into()
            .unwrap();
        Self {
            playable,
            fires,
            fire_count,
        }
    }

    /// Builds a field from an explicit playable mask and fire list. Every
    /// fire must sit on a playable cell.
    pub fn with_mask(playable: Array2<bool>, fire_coords: &[Coord2]) -> Result<Self> {
        let mut fires: Array2<bool> = Array2::default(playable.dim());

        for &coords in fire_coords {
            let (rows, cols) = playable.dim();
            if usize::from(coords.0) >= rows || usize::from(coords.1) >= cols {
                return Err(GameError::InvalidCoords);
            }
            if !playable[coords.to_nd_index()] {
                return Err(GameError::InvalidCoords);
            }
            fires[coords.to_nd_index()] = true;
        }

        Ok(Self::from_parts(playable, fires))
    }

    /// Field with the circular playable mask of the given side length.
    pub fn circular(size: Coord, fire_coords: &[Coord2]) -> Result<Self> {
        let config = GameConfig::new_unchecked(size, 0);
        Self::with_mask(config.playable_mask(), fire_coords)
    }

    /// Field where the whole square is playable, mostly for tests and tools.
    pub fn square(size: Coord, fire_coords: &[Coord2]) -> Result<Self> {
        let size = usize::from(size);
        Self::with_mask(Array2::from_elem((size, size), true), fire_coords)
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            size: self.size(),
            fires: self.fire_count,
        }
    }

    pub fn size(&self) -> Coord {
        self.playable.dim().0.try_into().unwrap()
    }

    pub fn is_playable(&self, coords: Coord2) -> bool {
        let size = self.size();
        coords.0 < size && coords.1 < size && self.playable[coords.to_nd_index()]
    }

    /// Accepts only coordinates inside the playable mask.
    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.is_playable(coords) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn playable_cell_count(&self) -> CellCount {
        self.playable
            .iter()
            .filter(|&&playable| playable)
            .count()
            .try_into()
            .unwrap()
    }

    pub fn fire_count(&self) -> CellCount {
        self.fire_count
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.playable_cell_count() - self.fire_count
    }

    pub fn contains_fire(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn adjacent_fire_count(&self, coords: Coord2) -> u8 {
        self.fires
            .iter_neighbors(coords)
            .filter(|&pos| self[pos])
            .count()
            .try_into()
            .unwrap()
    }

    /// First adjacent fire cell in row-major scan order, if any.
    pub fn first_adjacent_fire(&self, coords: Coord2) -> Option<Coord2> {
        self.fires.iter_neighbors(coords).find(|&pos| self[pos])
    }

    /// All playable coordinates in row-major order.
    pub fn iter_playable(&self) -> impl Iterator<Item = Coord2> + '_ {
        let size = self.size();
        (0..size)
            .flat_map(move |row| (0..size).map(move |col| (row, col)))
            .filter(move |&coords| self.is_playable(coords))
    }

    pub(crate) fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.fires.iter_neighbors(coords)
    }
}

impl Index<Coord2> for FireField {
    type Output = bool;

    fn index(&self, (row, col): Coord2) -> &Self::Output {
        &self.fires[(row as usize, col as usize)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_mask_is_symmetric_around_the_center() {
        let config = GameConfig::new_unchecked(17, 30);
        for row in 0..config.size {
            for col in 0..config.size {
                let mirrored_row = config.size - 1 - row;
                let mirrored_col = config.size - 1 - col;
                assert_eq!(
                    config.is_playable((row, col)),
                    config.is_playable((mirrored_row, col))
                );
                assert_eq!(
                    config.is_playable((row, col)),
                    config.is_playable((row, mirrored_col))
                );
            }
        }
    }

    #[test]
    fn circular_mask_keeps_center_and_drops_corners() {
        let config = GameConfig::default();
        assert!(config.is_playable((8, 8)));
        assert!(!config.is_playable((0, 0)));
        assert!(!config.is_playable((16, 16)));
        assert!(!config.is_playable((17, 8)));
    }

    #[test]
    fn default_field_has_far_more_playable_cells_than_fires() {
        let count = GameConfig::default().playable_cell_count();
        assert!(count > 150);
        assert!(count < GameConfig::default().total_cells());
    }

    #[test]
    fn fires_must_sit_on_playable_cells() {
        assert_eq!(
            FireField::circular(17, &[(0, 0)]),
            Err(GameError::InvalidCoords)
        );
        let field = FireField::circular(17, &[(8, 8)]).unwrap();
        assert!(field.contains_fire((8, 8)));
        assert_eq!(field.fire_count(), 1);
    }

    #[test]
    fn adjacency_counts_only_fire_neighbors() {
        let field = FireField::square(3, &[(0, 0), (2, 2)]).unwrap();
        assert_eq!(field.adjacent_fire_count((1, 1)), 2);
        assert_eq!(field.adjacent_fire_count((0, 2)), 0);
        assert_eq!(field.first_adjacent_fire((1, 1)), Some((0, 0)));
        assert_eq!(field.first_adjacent_fire((0, 2)), None);
    }

    #[test]
    fn config_serde_round_trips() {
        let config = GameConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<GameConfig>(&json).unwrap(), config);
    }
}
