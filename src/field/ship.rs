//! Ship, ship part and cell mark primitives for the game field.

use alloc::vec::Vec;

/// A position on the field grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance to `other`: `max(|dx|, |dy|)`. Two cells are
    /// "touching" (including diagonally) iff this is less than 2.
    pub fn chebyshev(self, other: Pos) -> i32 {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        if dx > dy {
            dx
        } else {
            dy
        }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Pos {
        Pos::new(self.x + dx, self.y + dy)
    }
}

/// Orientation of a ship relative to its origin part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The opposite orientation.
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// The cell `i` steps from `origin` along this axis.
    pub(crate) fn step(self, origin: Pos, i: i32) -> Pos {
        match self {
            Orientation::Horizontal => origin.offset(i, 0),
            Orientation::Vertical => origin.offset(0, i),
        }
    }
}

/// Handle to a ship stored on a [`Field`](super::Field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShipId(pub(super) usize);

/// Handle to a ship part stored on a [`Field`](super::Field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartId(pub(super) usize);

/// One cell of a ship.
///
/// `ship == None` makes the part anonymous: a revealed hit on the enemy
/// field that belongs to no ship until a kill is reconstructed around it.
#[derive(Debug, Clone)]
pub struct ShipPart {
    pub position: Pos,
    pub destroyed: bool,
    /// The part orientation changes pivot around.
    pub origin: bool,
    pub ship: Option<ShipId>,
}

/// A ship: an ordered run of parts plus placement bookkeeping.
#[derive(Debug, Clone)]
pub struct Ship {
    pub orientation: Orientation,
    /// Insertion order is placement order; for ships built by the field
    /// the origin part comes first.
    pub parts: Vec<PartId>,
    /// Derived from the placement rules on every mutation; never an
    /// independent source of truth.
    pub placement_violated: bool,
    /// Transient preview/probe ship. Its own violations are still
    /// tracked, but it never blocks other ships' placement.
    pub phantom: bool,
}

/// Kind of a cell mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Miss,
    Checked,
}

/// A mark on a cell that holds no ship part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMark {
    pub position: Pos,
    pub kind: MarkKind,
}
