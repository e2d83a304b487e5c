use std::time::Duration;

use runtag_core::{Camp, GameConfig, Position};
use runtag_system_environment::{
    observations, rewards, AgentObservation, Environment, EnvironmentError, Policy, SquadPolicy,
};
use runtag_world::{query, Bootcamp, Game};

fn config() -> GameConfig {
    GameConfig {
        max_steps: Some(3),
        ..GameConfig::new(6, 6, 2)
    }
}

#[test]
fn reset_yields_one_observation_per_slot_in_roster_order() {
    let mut environment = Environment::new(config(), 11);
    let observations = environment.reset().expect("reset");

    assert_eq!(observations.len(), 6);
    let ranks: Vec<bool> = observations
        .iter()
        .map(|o| matches!(o, AgentObservation::Commander(_)))
        .collect();
    assert_eq!(ranks, vec![true, false, false, true, false, false]);
    let AgentObservation::Commander(blue) = &observations[0] else {
        panic!("slot 0 is the blue commander");
    };
    assert_eq!(blue.camp, Camp::Blue);
    assert_eq!(blue.team, 0);
    let AgentObservation::Subordinate(red) = &observations[4] else {
        panic!("slot 4 is a red subordinate");
    };
    assert_eq!((red.team, red.identifier), (1, 0));
    assert_eq!(blue.position, Position::new(0, 0), "nothing observed yet");
    assert!(blue.commanders.iter().flatten().all(|cell| *cell == 0));
}

#[test]
fn stepping_requires_reset_and_one_action_per_slot() {
    let mut environment = Environment::new(config(), 1);
    assert_eq!(environment.step(&[0; 6]), Err(EnvironmentError::NotReset));

    let _ = environment.reset().expect("reset");
    assert_eq!(
        environment.step(&[0; 5]),
        Err(EnvironmentError::ActionCount {
            expected: 6,
            provided: 5,
        })
    );
    assert!(matches!(
        environment.step(&[99, 0, 0, 0, 0, 0]),
        Err(EnvironmentError::InvalidAction { index: 99, .. })
    ));
    assert_eq!(environment.steps(), 0, "rejected steps apply nothing");
}

#[test]
fn observing_fills_the_commander_grids() {
    let mut environment = Environment::new(config(), 5);
    let _ = environment.reset().expect("reset");
    let step = environment.step(&[0, 0, 0, 0, 0, 0]).expect("observe");

    let AgentObservation::Commander(blue) = &step.observations[0] else {
        panic!("slot 0 is the blue commander");
    };
    let snapshot = environment.snapshot().expect("snapshot");
    let commander = &snapshot.squad(Camp::Blue).expect("blue").commander;
    assert_eq!(blue.position, commander.position);
    let x = usize::try_from(commander.position.x()).expect("on grid");
    let y = usize::try_from(commander.position.y()).expect("on grid");
    assert_eq!(blue.commanders[y][x], 1, "a commander sees itself as friendly");
    assert!(!step.exceeded);
}

#[test]
fn step_limit_reports_exceeded_without_applying() {
    let mut environment = Environment::new(config(), 2);
    let _ = environment.reset().expect("reset");
    for _ in 0..3 {
        let step = environment.step(&[1; 6]).expect("hold");
        assert!(!step.exceeded);
    }
    let before = environment.snapshot().expect("snapshot");

    let step = environment.step(&[2; 6]).expect("over the limit");
    assert!(step.exceeded);
    assert_eq!(step.dones, vec![true; 6]);
    assert_eq!(environment.snapshot().expect("snapshot"), before);
}

#[test]
fn rewards_are_negated_distance_sums() {
    let mut game = Game::new(5, 5, Duration::from_secs(5));
    let mut bootcamp = Bootcamp::new();
    let blue = bootcamp.recruit(Camp::Blue, 1);
    let red = bootcamp.recruit(Camp::Red, 1);
    game.spawn(blue, Position::new(0, 0), &[Position::new(1, 0)])
        .expect("blue");
    game.spawn(red, Position::new(4, 4), &[Position::new(0, 3)])
        .expect("red");
    let snapshot = query::snapshot(&game).expect("snapshot");

    assert_eq!(rewards(&snapshot), vec![-3, -7, -7, -3]);
    assert_eq!(observations(&snapshot).len(), 4);
}

#[test]
fn seeded_episodes_are_reproducible() {
    let play = |seed| {
        let mut environment = Environment::new(config(), seed);
        let mut policy = SquadPolicy::new(environment.space(), seed);
        let mut observations = environment.reset().expect("reset");
        let mut trace = Vec::new();
        for _ in 0..3 {
            let actions: Vec<usize> = observations.iter().map(|o| policy.act(o)).collect();
            let step = environment.step(&actions).expect("step");
            trace.push(step.rewards.clone());
            observations = step.observations;
        }
        trace
    };
    assert_eq!(play(21), play(21));
}

fn duel_config() -> GameConfig {
    GameConfig {
        mailbox_ttl_secs: 5,
        ..GameConfig::new(6, 6, 1)
    }
}

fn heard_direction(observations: &[AgentObservation], slot: usize) -> usize {
    match &observations[slot] {
        AgentObservation::Subordinate(subordinate) => subordinate.direction,
        AgentObservation::Commander(_) => panic!("slot {slot} is a commander"),
    }
}

#[test]
fn commanders_act_before_subordinates_within_a_step() {
    let mut environment = Environment::new(duel_config(), 4);
    let _ = environment.reset().expect("reset");

    // Slots: blue commander, blue subordinate, red commander, red subordinate.
    // Index 9 commands subordinate 0 to go down; index 0 listens.
    let step = environment.step(&[9, 0, 9, 0]).expect("step");

    assert_eq!(heard_direction(&step.observations, 1), 3, "blue hears down");
    assert_eq!(heard_direction(&step.observations, 3), 3, "red hears down");
}

/// Commands down, holds for `holds` steps, then listens.
fn listen_after(holds: usize) -> usize {
    let mut environment = Environment::new(duel_config(), 8);
    let _ = environment.reset().expect("reset");
    let _ = environment.step(&[9, 1, 1, 1]).expect("command");
    for _ in 0..holds {
        let _ = environment.step(&[1, 1, 1, 1]).expect("hold");
    }
    let step = environment.step(&[1, 0, 1, 1]).expect("listen");
    heard_direction(&step.observations, 1)
}

#[test]
fn orders_expire_after_ttl_steps_of_virtual_time() {
    assert_eq!(listen_after(3), 3, "heard four seconds after sending");
    assert_eq!(listen_after(4), 0, "expired five seconds after sending");
}
