//! Devices carried by soldiers.
//!
//! Equipment never sits on the grid; it always acts on behalf of the entity
//! that operates it.

use std::time::Instant;

use runtag_core::{ActionError, Camp, EntityId, GridError, Observation, Position, Sighting};

use crate::{grid::Grid, station::Stations};

/// Device bound to exactly one operator.
pub trait Equipment {
    /// Entity the device acts on behalf of.
    fn operator(&self) -> EntityId;
}

/// Reports the operator's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Compass {
    operator: EntityId,
}

impl Compass {
    /// Creates a compass bound to `operator`.
    #[must_use]
    pub const fn new(operator: EntityId) -> Self {
        Self { operator }
    }

    /// Reads the operator's current position.
    pub fn operate(&self, grid: &Grid) -> Result<Position, GridError> {
        grid.position_of(self.operator)
    }
}

impl Equipment for Compass {
    fn operator(&self) -> EntityId {
        self.operator
    }
}

/// Sweeps the operator's whole row and column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Telescope {
    operator: EntityId,
}

impl Telescope {
    /// Creates a telescope bound to `operator`.
    #[must_use]
    pub const fn new(operator: EntityId) -> Self {
        Self { operator }
    }

    /// Distinct positions covered by a sweep: the operator's row followed by
    /// the rest of its column.
    pub fn sweep(&self, grid: &Grid) -> Result<Vec<Position>, GridError> {
        let origin = grid.position_of(self.operator)?;
        let columns = (0..coordinate(grid.width())).map(|x| Position::new(x, origin.y()));
        let rows = (0..coordinate(grid.height()))
            .filter(|y| *y != origin.y())
            .map(|y| Position::new(origin.x(), y));
        Ok(columns.chain(rows).collect())
    }

    /// Lists the occupants of every occupied position in the sweep,
    /// the operator included.
    pub fn operate(&self, grid: &Grid) -> Result<Observation, GridError> {
        let sightings = self
            .sweep(grid)?
            .into_iter()
            .map(|position| {
                grid.entities_at(position)
                    .map(|entities| Sighting { position, entities })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Observation::from_sightings(sightings))
    }
}

impl Equipment for Telescope {
    fn operator(&self) -> EntityId {
        self.operator
    }
}

/// What a radio is asked to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transmission<P> {
    /// Send `payload` to `receiver` on the squad channel.
    Talk {
        /// Addressee of the message.
        receiver: EntityId,
        /// Transported payload.
        payload: P,
    },
    /// Receive at most one message addressed to the operator.
    Listen,
}

/// Talks and listens on the operator's squad channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Radio {
    operator: EntityId,
}

impl Radio {
    /// Creates a radio bound to `operator`.
    #[must_use]
    pub const fn new(operator: EntityId) -> Self {
        Self { operator }
    }

    /// Performs `transmission` on the channel of `squad`.
    ///
    /// Talking yields no payloads; listening yields at most one. Operators
    /// that do not belong to a squad have no channel to use.
    pub fn operate<P>(
        &self,
        squad: Option<Camp>,
        stations: &mut Stations<P>,
        transmission: Transmission<P>,
        now: Instant,
    ) -> Result<Vec<P>, ActionError> {
        let channel = squad.ok_or(ActionError::UngroupedSender(self.operator))?;
        let station = stations.tune(channel);
        match transmission {
            Transmission::Talk { receiver, payload } => {
                station.send(self.operator, payload, receiver, now);
                Ok(Vec::new())
            }
            Transmission::Listen => Ok(station
                .receive(None, Some(self.operator), 1, now)
                .into_iter()
                .map(|message| message.payload)
                .collect()),
        }
    }
}

impl Equipment for Radio {
    fn operator(&self) -> EntityId {
        self.operator
    }
}

fn coordinate(extent: u32) -> i32 {
    i32::try_from(extent).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn sweep_covers_row_and_column_once() {
        let mut grid = Grid::new(5, 5);
        let commander = EntityId::new(0);
        grid.add(Position::new(2, 2), commander).expect("place");

        let sweep = Telescope::new(commander).sweep(&grid).expect("sweep");
        assert_eq!(sweep.len(), 9);
        assert_eq!(sweep.iter().filter(|p| **p == Position::new(2, 2)).count(), 1);
        assert!(sweep.iter().all(|p| p.in_line(Position::new(2, 2))));
    }

    #[test]
    fn telescope_sees_only_its_cross() {
        let mut grid = Grid::new(4, 4);
        let commander = EntityId::new(0);
        let visible = EntityId::new(1);
        let hidden = EntityId::new(2);
        grid.add(Position::new(1, 1), commander).expect("place");
        grid.add(Position::new(1, 3), visible).expect("place");
        grid.add(Position::new(3, 3), hidden).expect("place");

        let observation = Telescope::new(commander).operate(&grid).expect("observe");
        assert!(observation.contains(commander));
        assert!(observation.contains(visible));
        assert!(!observation.contains(hidden));
        assert_eq!(observation.len(), 2);
    }

    #[test]
    fn radio_without_squad_is_rejected() {
        let mut stations: Stations<u8> = Stations::new(Duration::from_secs(1));
        let radio = Radio::new(EntityId::new(4));
        assert_eq!(radio.operator(), EntityId::new(4));
        let result = radio.operate(
            None,
            &mut stations,
            Transmission::Talk {
                receiver: EntityId::new(5),
                payload: 1,
            },
            Instant::now(),
        );
        assert_eq!(result, Err(ActionError::UngroupedSender(EntityId::new(4))));
    }
}
