//! Recruitment of squads with freshly allocated entities.

use runtag_core::{Camp, EntityId};

use crate::roster::{Commander, Squad, Subordinate};

/// Allocates entity identifiers and forms squads from them.
///
/// Identifiers are handed out sequentially, so every recruit of one bootcamp
/// is a distinct entity.
#[derive(Debug, Default)]
pub struct Bootcamp {
    next_entity: u32,
}

impl Bootcamp {
    /// Creates a bootcamp that starts allocating at `#0`.
    #[must_use]
    pub const fn new() -> Self {
        Self { next_entity: 0 }
    }

    /// Forms a squad for `camp` with one commander and `subordinates`
    /// subordinates numbered `0..subordinates`.
    pub fn recruit(&mut self, camp: Camp, subordinates: u32) -> Squad {
        let commander = Commander::new(self.allocate());
        let mut squad = Squad::new(camp, commander);
        for identifier in 0..subordinates {
            squad.assign(Subordinate::new(self.allocate(), identifier));
        }
        squad
    }

    fn allocate(&mut self) -> EntityId {
        let entity = EntityId::new(self.next_entity);
        self.next_entity = self.next_entity.saturating_add(1);
        entity
    }
}
