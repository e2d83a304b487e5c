#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Randomized spawn layout for squads.
//!
//! Camps are anchored on distinct grid corners. Each squad is scattered over
//! a `radius × radius` block hugging its corner, where the radius grows with
//! the square root of the squad size so that roughly half of the block stays
//! empty. The first sampled cell belongs to the commander.

use rand::{seq::SliceRandom, Rng};
use runtag_core::Position;
use thiserror::Error;

const MAX_CAMPS: usize = 4;

/// Failures raised while laying out camps and squads.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FormationError {
    /// More camps were requested than the grid has corners.
    #[error("cannot place {requested} camps, a grid has only {MAX_CAMPS} corners")]
    TooManyCamps {
        /// Requested number of camps.
        requested: usize,
    },
    /// The corner block is too small for the squad.
    #[error("camp at {anchor} fits {available} soldiers, {required} requested")]
    InsufficientSpace {
        /// Corner the squad was anchored to.
        anchor: Position,
        /// Number of soldiers to place.
        required: usize,
        /// Number of cells available around the corner.
        available: usize,
    },
}

/// Spawn layout generator for a grid of fixed size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Formation {
    width: u32,
    height: u32,
}

impl Formation {
    /// Creates a formation for a `width × height` grid.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Side length of the block a squad of `squad_size` soldiers spawns in:
    /// `ceil(sqrt(2 × squad_size))`.
    #[must_use]
    pub fn radius(squad_size: usize) -> u32 {
        let area = 2 * squad_size;
        let mut radius = 0usize;
        while radius * radius < area {
            radius += 1;
        }
        u32::try_from(radius).unwrap_or(u32::MAX)
    }

    /// The four grid corners: top-left, top-right, bottom-left, bottom-right.
    #[must_use]
    pub fn corners(&self) -> [Position; 4] {
        let right = last_index(self.width);
        let bottom = last_index(self.height);
        [
            Position::new(0, 0),
            Position::new(right, 0),
            Position::new(0, bottom),
            Position::new(right, bottom),
        ]
    }

    /// Picks `count` distinct corners at random, in random order.
    pub fn place_camps<R>(&self, count: usize, rng: &mut R) -> Result<Vec<Position>, FormationError>
    where
        R: Rng + ?Sized,
    {
        if count > MAX_CAMPS {
            return Err(FormationError::TooManyCamps { requested: count });
        }

        let mut corners = self.corners();
        let (chosen, _) = corners.partial_shuffle(rng, count);
        Ok(chosen.to_vec())
    }

    /// Cells a squad of `squad_size` soldiers anchored at `anchor` may spawn on.
    ///
    /// The block extends `radius - 1` cells away from the corner along both
    /// axes and is clipped so that it never leaves the corner's quadrant.
    #[must_use]
    pub fn quadrant(&self, anchor: Position, squad_size: usize) -> Vec<Position> {
        let radius = i32::try_from(Self::radius(squad_size)).unwrap_or(i32::MAX);
        let (left, right) = span(anchor.x(), radius, self.width);
        let (top, bottom) = span(anchor.y(), radius, self.height);

        let mut cells = Vec::new();
        for x in left..=right {
            for y in top..=bottom {
                cells.push(Position::new(x, y));
            }
        }
        cells
    }

    /// Samples `squad_size` distinct cells around `anchor` without replacement.
    pub fn place_squad<R>(
        &self,
        anchor: Position,
        squad_size: usize,
        rng: &mut R,
    ) -> Result<Vec<Position>, FormationError>
    where
        R: Rng + ?Sized,
    {
        let mut candidates = self.quadrant(anchor, squad_size);
        if candidates.len() < squad_size {
            return Err(FormationError::InsufficientSpace {
                anchor,
                required: squad_size,
                available: candidates.len(),
            });
        }

        let (chosen, _) = candidates.partial_shuffle(rng, squad_size);
        Ok(chosen.to_vec())
    }

    /// Lays out `camps` squads of `squad_size` soldiers each.
    pub fn place<R>(
        &self,
        camps: usize,
        squad_size: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec<Position>>, FormationError>
    where
        R: Rng + ?Sized,
    {
        self.place_camps(camps, rng)?
            .into_iter()
            .map(|anchor| self.place_squad(anchor, squad_size, rng))
            .collect()
    }
}

fn last_index(extent: u32) -> i32 {
    i32::try_from(extent).unwrap_or(i32::MAX).saturating_sub(1).max(0)
}

/// Inclusive range covered along one axis by a block anchored at `origin`.
fn span(origin: i32, radius: i32, extent: u32) -> (i32, i32) {
    let last = last_index(extent);
    let half = i32::try_from(extent.div_ceil(2)).unwrap_or(i32::MAX).max(1);
    let reach = radius.saturating_sub(1).max(0);

    if origin == 0 {
        (0, reach.min(half - 1))
    } else {
        ((origin - reach).max(last + 1 - half), origin)
    }
}
