#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Text rendering of RunTag snapshots.
//!
//! Each tile is two lines tall: blue soldiers on the upper line and red on
//! the lower. Every soldier owns a fixed three-character slot within its
//! line, so a tile is `3n + (n - 1)` characters wide for squads of `n`.

use std::{collections::HashMap, fmt::Write};

use anyhow::{Context, Result as AnyResult};
use runtag_core::{Camp, EntityId, GameSnapshot, Position, Rank, RosterEntry};

const EMPTY_SLOT: &str = "   ";

/// Which soldiers a render shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// Every soldier at its authoritative position.
    Full,
    /// The camp's commander plus whatever its last telescope sweep saw, where
    /// it was seen.
    Fog(Camp),
}

/// Renders snapshots as bordered character grids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextRenderer {
    view: View,
}

impl TextRenderer {
    /// Creates a renderer for the provided view.
    #[must_use]
    pub const fn new(view: View) -> Self {
        Self { view }
    }

    /// Renders `snapshot` into a multi-line string.
    pub fn render(&self, snapshot: &GameSnapshot) -> AnyResult<String> {
        let layout = Layout::new(snapshot);
        let roster: HashMap<EntityId, RosterEntry> = snapshot
            .roster()
            .into_iter()
            .map(|entry| (entry.entity, entry))
            .collect();

        let mut tiles = layout.empty_tiles();
        for (entity, position) in self.visible(snapshot)? {
            let entry = roster
                .get(&entity)
                .with_context(|| format!("entity {entity} is not on the roster"))?;
            if let Some(slot) = layout.slot(position, entry) {
                if let Some(tile) = tiles.get_mut(slot) {
                    *tile = tag(entry);
                }
            }
        }

        layout.draw(&tiles)
    }

    fn visible(&self, snapshot: &GameSnapshot) -> AnyResult<Vec<(EntityId, Position)>> {
        match self.view {
            View::Full => Ok(snapshot
                .squads
                .iter()
                .flat_map(|squad| {
                    std::iter::once((squad.commander.entity, squad.commander.position)).chain(
                        squad
                            .subordinates
                            .iter()
                            .map(|subordinate| (subordinate.entity, subordinate.position)),
                    )
                })
                .collect()),
            View::Fog(camp) => {
                let squad = snapshot
                    .squad(camp)
                    .with_context(|| format!("snapshot has no {camp} squad"))?;
                let commander = &squad.commander;
                let mut visible = vec![(commander.entity, commander.position)];
                for sighting in commander.observation.iter().flat_map(|o| o.iter()) {
                    visible.extend(
                        sighting
                            .entities
                            .iter()
                            .filter(|entity| **entity != commander.entity)
                            .map(|entity| (*entity, sighting.position)),
                    );
                }
                Ok(visible)
            }
        }
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(View::Full)
    }
}

/// Tile geometry derived from a snapshot.
struct Layout {
    width: usize,
    height: usize,
    squad_size: usize,
}

impl Layout {
    fn new(snapshot: &GameSnapshot) -> Self {
        let squad_size = snapshot
            .squads
            .iter()
            .map(|squad| 1 + squad.subordinates.len())
            .max()
            .unwrap_or(1);
        Self {
            width: usize::try_from(snapshot.width).unwrap_or(0),
            height: usize::try_from(snapshot.height).unwrap_or(0),
            squad_size,
        }
    }

    fn tile_width(&self) -> usize {
        4 * self.squad_size - 1
    }

    fn empty_tiles(&self) -> Vec<String> {
        vec![EMPTY_SLOT.to_owned(); self.width * self.height * 2 * self.squad_size]
    }

    /// Index of the slot a soldier occupies on the tile at `position`.
    fn slot(&self, position: Position, entry: &RosterEntry) -> Option<usize> {
        let x = usize::try_from(position.x()).ok()?;
        let y = usize::try_from(position.y()).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        let line = entry.camp.index();
        let column = match entry.rank {
            Rank::Commander => 0,
            Rank::Subordinate => 1 + usize::try_from(entry.identifier?).ok()?,
        };
        if column >= self.squad_size {
            return None;
        }
        Some(self.index(x, y, line, column))
    }

    fn index(&self, x: usize, y: usize, line: usize, column: usize) -> usize {
        ((y * self.width + x) * 2 + line) * self.squad_size + column
    }

    fn draw(&self, tiles: &[String]) -> AnyResult<String> {
        let tile_width = self.tile_width();
        let mut out = String::new();

        out.push(' ');
        for x in 0..self.width {
            write!(out, " {x:<tile_width$}")?;
        }
        out.push('\n');

        let border = format!(" +{}\n", format!("{}+", "-".repeat(tile_width)).repeat(self.width));
        for y in 0..self.height {
            out.push_str(&border);
            for line in 0..2 {
                if line == 0 {
                    write!(out, "{y}|")?;
                } else {
                    out.push_str(" |");
                }
                for x in 0..self.width {
                    let slots: Vec<&str> = (0..self.squad_size)
                        .map(|column| {
                            tiles
                                .get(self.index(x, y, line, column))
                                .map_or(EMPTY_SLOT, String::as_str)
                        })
                        .collect();
                    write!(out, "{}|", slots.join(" "))?;
                }
                out.push('\n');
            }
        }
        out.push_str(&border);
        Ok(out)
    }
}

/// Three-character soldier tag: camp initial, rank initial, identifier.
fn tag(entry: &RosterEntry) -> String {
    let camp = match entry.camp {
        Camp::Blue => 'B',
        Camp::Red => 'R',
    };
    match (entry.rank, entry.identifier) {
        (Rank::Subordinate, Some(identifier)) => format!("{camp}S{identifier}"),
        _ => format!("{camp}C "),
    }
}

#[cfg(test)]
mod tests {
    use runtag_core::{
        CommanderSnapshot, Observation, Sighting, SquadSnapshot, SubordinateSnapshot,
    };

    use super::*;

    fn snapshot(observation: Option<Observation>) -> GameSnapshot {
        GameSnapshot {
            width: 2,
            height: 2,
            squads: vec![
                SquadSnapshot {
                    camp: Camp::Blue,
                    commander: CommanderSnapshot {
                        entity: EntityId::new(0),
                        position: Position::new(0, 0),
                        last_position: None,
                        observation,
                    },
                    subordinates: vec![SubordinateSnapshot {
                        entity: EntityId::new(1),
                        identifier: 0,
                        position: Position::new(1, 1),
                        direction: None,
                    }],
                },
                SquadSnapshot {
                    camp: Camp::Red,
                    commander: CommanderSnapshot {
                        entity: EntityId::new(2),
                        position: Position::new(1, 1),
                        last_position: None,
                        observation: None,
                    },
                    subordinates: vec![SubordinateSnapshot {
                        entity: EntityId::new(3),
                        identifier: 0,
                        position: Position::new(0, 0),
                        direction: None,
                    }],
                },
            ],
            done: false,
            winner: None,
        }
    }

    #[test]
    fn full_view_draws_every_soldier() {
        let rendered = TextRenderer::default()
            .render(&snapshot(None))
            .expect("render");
        let expected = [
            "  0       1      ",
            " +-------+-------+",
            "0|BC     |       |",
            " |    RS0|       |",
            " +-------+-------+",
            "1|       |    BS0|",
            " |       |RC     |",
            " +-------+-------+",
        ];
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines, expected);
    }

    #[test]
    fn fog_view_shows_only_what_was_seen() {
        let observation = Observation::from_sightings(vec![Sighting {
            position: Position::new(1, 0),
            entities: vec![EntityId::new(3)],
        }]);
        let rendered = TextRenderer::new(View::Fog(Camp::Blue))
            .render(&snapshot(Some(observation)))
            .expect("render");

        assert!(rendered.contains("BC "));
        assert!(rendered.contains("RS0"), "sighted subordinate is drawn");
        assert!(!rendered.contains("BS0"), "unseen friend stays hidden");
        assert!(!rendered.contains("RC "), "unseen enemy stays hidden");
        let second_line = rendered.lines().nth(3).expect("red line of row 0");
        assert_eq!(second_line, " |       |    RS0|");
    }
}
