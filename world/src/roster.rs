//! Soldiers and the squads they form.

use std::time::Instant;

use runtag_core::{ActionError, Camp, EntityId, GridError, Observation, Order, Position, Rank};

use crate::{
    equipment::{Compass, Radio, Telescope, Transmission},
    grid::Grid,
    station::Stations,
};

/// Behaviour shared by every soldier regardless of rank.
pub trait Soldier {
    /// Entity representing the soldier on the grid.
    fn entity(&self) -> EntityId;

    /// Squad the soldier belongs to, if any.
    fn squad(&self) -> Option<Camp>;

    /// Role of the soldier.
    fn rank(&self) -> Rank;

    /// Assigns the soldier to the squad of `camp`.
    fn enlist(&mut self, camp: Camp);
}

/// Squad leader carrying a radio, a compass and a telescope.
///
/// The commander only knows what its instruments last reported: the cached
/// position and observation change only when it moves or observes.
#[derive(Clone, Debug)]
pub struct Commander {
    entity: EntityId,
    squad: Option<Camp>,
    radio: Radio,
    compass: Compass,
    telescope: Telescope,
    position: Option<Position>,
    observation: Option<Observation>,
}

impl Commander {
    /// Creates an unassigned commander for `entity`.
    #[must_use]
    pub const fn new(entity: EntityId) -> Self {
        Self {
            entity,
            squad: None,
            radio: Radio::new(entity),
            compass: Compass::new(entity),
            telescope: Telescope::new(entity),
            position: None,
            observation: None,
        }
    }

    /// Position reported by the last compass reading.
    #[must_use]
    pub const fn position(&self) -> Option<Position> {
        self.position
    }

    /// Observation reported by the last telescope sweep.
    #[must_use]
    pub const fn observation(&self) -> Option<&Observation> {
        self.observation.as_ref()
    }

    /// Refreshes the cached position and observation.
    pub fn observe(&mut self, grid: &Grid) -> Result<&Observation, GridError> {
        self.position = Some(self.compass.operate(grid)?);
        let observation = self.telescope.operate(grid)?;
        Ok(&*self.observation.insert(observation))
    }

    /// Moves one tile (or holds when `direction` is `None`) and refreshes the
    /// cached position.
    pub fn step(&mut self, grid: &mut Grid, direction: Order) -> Result<Position, GridError> {
        if let Some(direction) = direction {
            let _ = grid.move_entity(self.entity, direction)?;
        }
        let position = self.compass.operate(grid)?;
        self.position = Some(position);
        Ok(position)
    }

    /// Radios `order` to `receiver` on the squad channel.
    pub fn command(
        &self,
        stations: &mut Stations<Order>,
        receiver: EntityId,
        order: Order,
        now: Instant,
    ) -> Result<(), ActionError> {
        let _ = self.radio.operate(
            self.squad,
            stations,
            Transmission::Talk {
                receiver,
                payload: order,
            },
            now,
        )?;
        Ok(())
    }
}

impl Soldier for Commander {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn squad(&self) -> Option<Camp> {
        self.squad
    }

    fn rank(&self) -> Rank {
        Rank::Commander
    }

    fn enlist(&mut self, camp: Camp) {
        self.squad = Some(camp);
    }
}

/// Blind squad member carrying only a radio.
#[derive(Clone, Debug)]
pub struct Subordinate {
    entity: EntityId,
    identifier: u32,
    squad: Option<Camp>,
    radio: Radio,
    direction: Order,
}

impl Subordinate {
    /// Creates an unassigned subordinate with a squad-local identifier.
    #[must_use]
    pub const fn new(entity: EntityId, identifier: u32) -> Self {
        Self {
            entity,
            identifier,
            squad: None,
            radio: Radio::new(entity),
            direction: None,
        }
    }

    /// Squad-local identifier used by commanders to address orders.
    #[must_use]
    pub const fn identifier(&self) -> u32 {
        self.identifier
    }

    /// Last heard order that has not been acted upon.
    #[must_use]
    pub const fn direction(&self) -> Order {
        self.direction
    }

    /// Receives at most one pending order and caches it. When nothing is
    /// pending the cached order becomes `None`.
    pub fn listen(
        &mut self,
        stations: &mut Stations<Order>,
        now: Instant,
    ) -> Result<Order, ActionError> {
        let heard = self
            .radio
            .operate(self.squad, stations, Transmission::Listen, now)?;
        self.direction = heard.into_iter().next().flatten();
        Ok(self.direction)
    }

    /// Moves one tile (or holds when `direction` is `None`) and forgets the
    /// cached order.
    pub fn step(&mut self, grid: &mut Grid, direction: Order) -> Result<Position, GridError> {
        let position = match direction {
            Some(direction) => grid.move_entity(self.entity, direction)?,
            None => grid.position_of(self.entity)?,
        };
        self.direction = None;
        Ok(position)
    }
}

impl Soldier for Subordinate {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn squad(&self) -> Option<Camp> {
        self.squad
    }

    fn rank(&self) -> Rank {
        Rank::Subordinate
    }

    fn enlist(&mut self, camp: Camp) {
        self.squad = Some(camp);
    }
}

/// One commander and its subordinates, all enlisted in the same camp.
#[derive(Clone, Debug)]
pub struct Squad {
    camp: Camp,
    commander: Commander,
    subordinates: Vec<Subordinate>,
}

impl Squad {
    /// Forms a squad around `commander`, enlisting it into `camp`.
    #[must_use]
    pub fn new(camp: Camp, mut commander: Commander) -> Self {
        commander.enlist(camp);
        Self {
            camp,
            commander,
            subordinates: Vec::new(),
        }
    }

    /// Enlists a subordinate into the squad.
    pub fn assign(&mut self, mut subordinate: Subordinate) {
        subordinate.enlist(self.camp);
        self.subordinates.push(subordinate);
    }

    /// Camp of the squad.
    #[must_use]
    pub const fn camp(&self) -> Camp {
        self.camp
    }

    /// The squad's commander.
    #[must_use]
    pub const fn commander(&self) -> &Commander {
        &self.commander
    }

    /// Mutable access to the squad's commander.
    pub fn commander_mut(&mut self) -> &mut Commander {
        &mut self.commander
    }

    /// Subordinates in enlistment order.
    #[must_use]
    pub fn subordinates(&self) -> &[Subordinate] {
        &self.subordinates
    }

    /// Subordinate addressed by its squad-local identifier.
    #[must_use]
    pub fn subordinate(&self, identifier: u32) -> Option<&Subordinate> {
        self.subordinates
            .iter()
            .find(|subordinate| subordinate.identifier == identifier)
    }

    /// Mutable access to the subordinate represented by `entity`.
    pub fn subordinate_mut(&mut self, entity: EntityId) -> Option<&mut Subordinate> {
        self.subordinates
            .iter_mut()
            .find(|subordinate| subordinate.entity == entity)
    }

    /// Every soldier of the squad, commander first.
    pub fn soldiers(&self) -> impl Iterator<Item = &dyn Soldier> + '_ {
        std::iter::once(&self.commander as &dyn Soldier).chain(
            self.subordinates
                .iter()
                .map(|subordinate| subordinate as &dyn Soldier),
        )
    }

    /// Rank of `entity` within the squad, if it belongs to it.
    #[must_use]
    pub fn rank_of(&self, entity: EntityId) -> Option<Rank> {
        self.soldiers()
            .find(|soldier| soldier.entity() == entity)
            .map(|soldier| soldier.rank())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use runtag_core::Direction;

    use super::*;

    fn squad() -> Squad {
        let mut squad = Squad::new(Camp::Blue, Commander::new(EntityId::new(0)));
        squad.assign(Subordinate::new(EntityId::new(1), 0));
        squad.assign(Subordinate::new(EntityId::new(2), 1));
        squad
    }

    #[test]
    fn enlistment_sets_the_squad_of_every_soldier() {
        let squad = squad();
        assert!(squad.soldiers().all(|soldier| soldier.squad() == Some(Camp::Blue)));
        assert_eq!(squad.rank_of(EntityId::new(0)), Some(Rank::Commander));
        assert_eq!(squad.rank_of(EntityId::new(2)), Some(Rank::Subordinate));
        assert_eq!(squad.rank_of(EntityId::new(3)), None);
    }

    #[test]
    fn commander_caches_only_what_it_measured() {
        let mut grid = Grid::new(4, 4);
        let mut commander = Commander::new(EntityId::new(0));
        grid.add(Position::new(0, 0), EntityId::new(0)).expect("place");
        assert_eq!(commander.position(), None);

        let moved = commander
            .step(&mut grid, Some(Direction::Down))
            .expect("move");
        assert_eq!(moved, Position::new(0, 1));
        assert_eq!(commander.position(), Some(moved));
        assert!(commander.observation().is_none());

        let seen = commander.observe(&grid).expect("observe").len();
        assert_eq!(seen, 1);
    }

    #[test]
    fn subordinate_forgets_its_order_after_moving() {
        let mut squad = squad();
        let mut grid = Grid::new(4, 4);
        let mut stations = Stations::new(Duration::from_secs(5));
        let now = Instant::now();
        grid.add(Position::new(2, 2), EntityId::new(1)).expect("place");

        squad
            .commander()
            .command(&mut stations, EntityId::new(1), Some(Direction::Left), now)
            .expect("command");
        let subordinate = squad.subordinate_mut(EntityId::new(1)).expect("member");
        assert_eq!(
            subordinate.listen(&mut stations, now),
            Ok(Some(Direction::Left))
        );
        assert_eq!(subordinate.direction(), Some(Direction::Left));

        let position = subordinate
            .step(&mut grid, Some(Direction::Left))
            .expect("move");
        assert_eq!(position, Position::new(1, 2));
        assert_eq!(subordinate.direction(), None);
        assert_eq!(subordinate.listen(&mut stations, now), Ok(None));
    }
}
