//! Bounded grid tracking which entities stand on which tile.

use std::collections::{BTreeMap, BTreeSet};

use runtag_core::{Direction, EntityId, GridError, PlacementFault, Position};

/// Bidirectional index between tiles and the entities standing on them.
///
/// Every tile holds a set of entities and every placed entity maps back to
/// exactly one tile; the two indexes are always updated together.
#[derive(Clone, Debug)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<BTreeSet<EntityId>>,
    entities: BTreeMap<EntityId, Position>,
}

impl Grid {
    /// Creates an empty `width × height` grid.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            tiles: vec![BTreeSet::new(); capacity],
            entities: BTreeMap::new(),
        }
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the position lies inside the grid.
    #[must_use]
    pub fn within(&self, position: Position) -> bool {
        self.index(position).is_some()
    }

    /// Reports whether the entity has been placed.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Places a new entity on the grid.
    pub fn add(&mut self, position: Position, entity: EntityId) -> Result<(), GridError> {
        let fault = if self.contains(entity) {
            Some(PlacementFault::AlreadyPlaced)
        } else if !self.within(position) {
            Some(PlacementFault::OutOfBounds)
        } else {
            None
        };
        if let Some(fault) = fault {
            return Err(GridError::InvalidPlacement {
                entity,
                position,
                fault,
            });
        }

        self.occupy(position, entity);
        Ok(())
    }

    /// Moves an entity one tile in `direction`.
    ///
    /// Moves that would leave the grid are clamped at the border, so an
    /// entity pushed into a wall stays where it is. Returns the new position.
    pub fn move_entity(
        &mut self,
        entity: EntityId,
        direction: Direction,
    ) -> Result<Position, GridError> {
        let from = self.position_of(entity)?;
        let to = from.translate(direction).clip(self.width, self.height);
        if to != from {
            if let Some(tile) = self.index(from).and_then(|index| self.tiles.get_mut(index)) {
                let _ = tile.remove(&entity);
            }
            self.occupy(to, entity);
        }
        Ok(to)
    }

    /// Takes an entity off the grid, returning where it stood.
    pub fn remove(&mut self, entity: EntityId) -> Result<Position, GridError> {
        let position = self
            .entities
            .remove(&entity)
            .ok_or(GridError::UnknownEntity(entity))?;
        if let Some(tile) = self.index(position).and_then(|index| self.tiles.get_mut(index)) {
            let _ = tile.remove(&entity);
        }
        Ok(position)
    }

    /// Current position of an entity.
    pub fn position_of(&self, entity: EntityId) -> Result<Position, GridError> {
        self.entities
            .get(&entity)
            .copied()
            .ok_or(GridError::UnknownEntity(entity))
    }

    /// Entities standing on a position, in identifier order.
    pub fn entities_at(&self, position: Position) -> Result<Vec<EntityId>, GridError> {
        self.index(position)
            .and_then(|index| self.tiles.get(index))
            .map(|tile| tile.iter().copied().collect())
            .ok_or(GridError::OutOfBounds(position))
    }

    /// Entities sharing a tile with `entity`, excluding the entity itself.
    pub fn entities_with(&self, entity: EntityId) -> Result<Vec<EntityId>, GridError> {
        let position = self.position_of(entity)?;
        let mut neighbours = self.entities_at(position)?;
        neighbours.retain(|other| *other != entity);
        Ok(neighbours)
    }

    /// Iterator over every placed entity and its position, in identifier order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, Position)> + '_ {
        self.entities
            .iter()
            .map(|(entity, position)| (*entity, *position))
    }

    fn occupy(&mut self, position: Position, entity: EntityId) {
        if let Some(tile) = self.index(position).and_then(|index| self.tiles.get_mut(index)) {
            let _ = tile.insert(entity);
        }
        let _ = self.entities.insert(entity, position);
    }

    fn index(&self, position: Position) -> Option<usize> {
        let column = u32::try_from(position.x()).ok()?;
        let row = u32::try_from(position.y()).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }
        usize::try_from(u64::from(row) * u64::from(self.width) + u64::from(column)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_and_entities_stay_consistent_across_moves() {
        let mut grid = Grid::new(3, 3);
        let walker = EntityId::new(1);
        grid.add(Position::new(1, 1), walker).expect("place");

        let to = grid.move_entity(walker, Direction::Right).expect("move");
        assert_eq!(to, Position::new(2, 1));
        assert!(grid
            .entities_at(Position::new(1, 1))
            .expect("in bounds")
            .is_empty());
        assert_eq!(
            grid.entities_at(Position::new(2, 1)).expect("in bounds"),
            vec![walker]
        );
    }

    #[test]
    fn removed_entities_leave_both_indexes() {
        let mut grid = Grid::new(3, 3);
        let walker = EntityId::new(1);
        grid.add(Position::new(2, 2), walker).expect("place");

        assert_eq!(grid.remove(walker), Ok(Position::new(2, 2)));
        assert!(!grid.contains(walker));
        assert_eq!(grid.entities_at(Position::new(2, 2)), Ok(Vec::new()));
        assert_eq!(grid.remove(walker), Err(GridError::UnknownEntity(walker)));
        grid.add(Position::new(0, 0), walker).expect("placeable again");
    }

    #[test]
    fn out_of_bounds_queries_are_rejected() {
        let grid = Grid::new(2, 2);
        assert_eq!(
            grid.entities_at(Position::new(-1, 0)),
            Err(GridError::OutOfBounds(Position::new(-1, 0)))
        );
        assert!(!grid.within(Position::new(2, 0)));
    }

    #[test]
    fn unknown_entity_cannot_move() {
        let mut grid = Grid::new(2, 2);
        let ghost = EntityId::new(9);
        assert_eq!(
            grid.move_entity(ghost, Direction::Up),
            Err(GridError::UnknownEntity(ghost))
        );
    }
}
