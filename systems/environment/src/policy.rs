//! Simple action providers for driving episodes without trained models.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    encoding::ActionSpace,
    observation::{AgentObservation, SubordinateObservation},
};

/// Chooses a discrete action from an observation.
pub trait Policy {
    /// Action index for the slot that produced `observation`.
    fn act(&mut self, observation: &AgentObservation) -> usize;
}

/// Listens until an order is pending, then carries it out.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObedientPolicy;

impl ObedientPolicy {
    fn decide(observation: &SubordinateObservation) -> usize {
        if observation.direction == 0 {
            0
        } else {
            1 + observation.direction
        }
    }
}

impl Policy for ObedientPolicy {
    fn act(&mut self, observation: &AgentObservation) -> usize {
        match observation {
            AgentObservation::Subordinate(observation) => Self::decide(observation),
            AgentObservation::Commander(_) => 0,
        }
    }
}

/// Samples uniformly from the action space of the observing rank.
#[derive(Clone, Debug)]
pub struct RandomPolicy {
    space: ActionSpace,
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    /// Creates a seeded random policy over `space`.
    #[must_use]
    pub fn new(space: ActionSpace, seed: u64) -> Self {
        Self {
            space,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, observation: &AgentObservation) -> usize {
        let actions = match observation {
            AgentObservation::Commander(_) => self.space.commander_actions(),
            AgentObservation::Subordinate(_) => self.space.subordinate_actions(),
        };
        self.rng.gen_range(0..actions.max(1))
    }
}

/// Random commanders with obedient subordinates.
#[derive(Clone, Debug)]
pub struct SquadPolicy {
    commander: RandomPolicy,
    subordinate: ObedientPolicy,
}

impl SquadPolicy {
    /// Creates the squad policy, seeding the commander's choices.
    #[must_use]
    pub fn new(space: ActionSpace, seed: u64) -> Self {
        Self {
            commander: RandomPolicy::new(space, seed),
            subordinate: ObedientPolicy,
        }
    }
}

impl Policy for SquadPolicy {
    fn act(&mut self, observation: &AgentObservation) -> usize {
        match observation {
            AgentObservation::Commander(_) => self.commander.act(observation),
            AgentObservation::Subordinate(_) => self.subordinate.act(observation),
        }
    }
}

#[cfg(test)]
mod tests {
    use runtag_core::Camp;

    use super::*;

    fn subordinate(direction: usize) -> AgentObservation {
        AgentObservation::Subordinate(SubordinateObservation {
            camp: Camp::Red,
            team: Camp::Red.index(),
            identifier: 0,
            direction,
        })
    }

    #[test]
    fn obedient_subordinates_listen_then_follow_orders() {
        let mut policy = ObedientPolicy;
        assert_eq!(policy.act(&subordinate(0)), 0, "nothing pending: listen");
        assert_eq!(policy.act(&subordinate(3)), 4, "pending down: move down");
    }

    #[test]
    fn random_choices_stay_inside_the_action_space() {
        let space = ActionSpace::new(2);
        let mut policy = RandomPolicy::new(space, 9);
        for _ in 0..200 {
            assert!(policy.act(&subordinate(0)) < space.subordinate_actions());
        }
    }
}
