//! Game field state: ships, parts, marks and the placement rules.

mod drag;
mod ship;

pub use drag::Drag;
pub use ship::{CellMark, MarkKind, Orientation, PartId, Pos, Ship, ShipId, ShipPart};

use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;

use rand::Rng;

use crate::config::{FLEET, STARTUP_ANCHORS};

/// What the field is currently used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// Own field, ships may still be moved and rotated.
    Preparing,
    /// Own field, placement locked in.
    Ready,
    /// Enemy field before the game starts; no interaction.
    EnemyPreparing,
    /// Enemy field during our turn; shots may be fired at it.
    EnemyReady,
}

/// Result of a revealed shot applied to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    Miss,
    Hit,
    Destroyed,
}

/// Whose placement a cell is checked on behalf of.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Owner {
    Of(ShipId),
    /// A hypothetical ship that is not on the board.
    Probe,
}

/// One player's board: the ships, the flattened part set (anonymous
/// revealed parts included), the cell marks and the grid size.
///
/// Ships and parts live in slot vectors; removal tombstones the slot so
/// handed-out ids stay stable.
pub struct Field {
    size: Pos,
    state: FieldState,
    ships: Vec<Option<Ship>>,
    parts: Vec<Option<ShipPart>>,
    marks: Vec<CellMark>,
}

impl Field {
    pub fn new(size: Pos, state: FieldState) -> Self {
        Self {
            size,
            state,
            ships: Vec::new(),
            parts: Vec::new(),
            marks: Vec::new(),
        }
    }

    pub fn size(&self) -> Pos {
        self.size
    }

    pub fn state(&self) -> FieldState {
        self.state
    }

    pub fn set_state(&mut self, state: FieldState) {
        self.state = state;
    }

    /// Whether `position` lies on the grid.
    pub fn contains(&self, position: Pos) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.size.x && position.y < self.size.y
    }

    pub fn ship(&self, id: ShipId) -> Option<&Ship> {
        self.ships.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn part(&self, id: PartId) -> Option<&ShipPart> {
        self.parts.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut ShipPart> {
        self.parts.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    /// Iterate live ships with their ids.
    pub fn ships(&self) -> impl Iterator<Item = (ShipId, &Ship)> + '_ {
        self.ships
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (ShipId(i), s)))
    }

    /// Iterate live parts with their ids.
    pub fn parts(&self) -> impl Iterator<Item = (PartId, &ShipPart)> + '_ {
        self.parts
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|p| (PartId(i), p)))
    }

    pub fn marks(&self) -> &[CellMark] {
        &self.marks
    }

    /// Place a ship of `length` cells anchored at `origin`, stepping along
    /// `orientation`. The placement flag is recomputed immediately; an
    /// illegal position is recorded there, never reported as an error.
    pub fn add_ship(
        &mut self,
        origin: Pos,
        orientation: Orientation,
        length: usize,
        phantom: bool,
    ) -> ShipId {
        let ship_id = ShipId(self.ships.len());
        let mut part_ids = Vec::with_capacity(length);
        for i in 0..length {
            let part_id = PartId(self.parts.len());
            self.parts.push(Some(ShipPart {
                position: orientation.step(origin, i as i32),
                destroyed: false,
                origin: i == 0,
                ship: Some(ship_id),
            }));
            part_ids.push(part_id);
        }
        self.ships.push(Some(Ship {
            orientation,
            parts: part_ids,
            placement_violated: false,
            phantom,
        }));
        self.revalidate_with(ship_id, None);
        ship_id
    }

    /// Whether a ship of `length` anchored at `origin` along `orientation`
    /// could be placed legally, with `ignore`'s parts excluded from the
    /// check. The uncommitted counterpart of [`Field::add_ship`], used to
    /// probe rotations.
    pub fn placement_fits(
        &self,
        origin: Pos,
        orientation: Orientation,
        length: usize,
        ignore: Option<ShipId>,
    ) -> bool {
        (0..length).all(|i| self.cell_placement_ok(orientation.step(origin, i as i32), Owner::Probe, ignore))
    }

    /// Translate every part of `ship` by the delta between `new_origin`
    /// and the pivot part (an explicit `origin_part`, else the part marked
    /// as origin, else the first part), then revalidate. `ignore` excludes
    /// a ship from collision checks, e.g. the dragged ship's old position.
    pub fn move_ship(
        &mut self,
        ship: ShipId,
        new_origin: Pos,
        origin_part: Option<PartId>,
        ignore: Option<ShipId>,
    ) {
        let part_ids = match self.ship(ship) {
            Some(s) => s.parts.clone(),
            None => return,
        };
        let pivot = origin_part
            .filter(|pid| part_ids.contains(pid))
            .or_else(|| {
                part_ids
                    .iter()
                    .copied()
                    .find(|&pid| self.part(pid).is_some_and(|p| p.origin))
            })
            .or_else(|| part_ids.first().copied());
        let pivot_pos = match pivot.and_then(|pid| self.part(pid)) {
            Some(part) => part.position,
            None => return,
        };
        let (dx, dy) = (new_origin.x - pivot_pos.x, new_origin.y - pivot_pos.y);
        for pid in part_ids {
            if let Some(part) = self.part_mut(pid) {
                part.position = part.position.offset(dx, dy);
            }
        }
        self.revalidate_with(ship, ignore);
    }

    /// Detach and discard a ship and all of its parts.
    pub fn remove_ship(&mut self, ship: ShipId) {
        if let Some(removed) = self.ships.get_mut(ship.0).and_then(|slot| slot.take()) {
            for pid in removed.parts {
                if let Some(slot) = self.parts.get_mut(pid.0) {
                    *slot = None;
                }
            }
        }
    }

    /// Deep-copy a ship (positions, destroyed/origin flags). The copy is
    /// phantom when either the source or `phantom` says so, and is
    /// validated against the board with `ignore` excluded.
    pub fn copy_ship(&mut self, source: ShipId, phantom: bool, ignore: Option<ShipId>) -> Option<ShipId> {
        let src = self.ship(source)?;
        let orientation = src.orientation;
        let make_phantom = src.phantom || phantom;
        let violated = src.placement_violated;
        let blueprint: Vec<(Pos, bool, bool)> = src
            .parts
            .iter()
            .filter_map(|&pid| self.part(pid).map(|p| (p.position, p.destroyed, p.origin)))
            .collect();

        let ship_id = ShipId(self.ships.len());
        let mut part_ids = Vec::with_capacity(blueprint.len());
        for (position, destroyed, origin) in blueprint {
            let part_id = PartId(self.parts.len());
            self.parts.push(Some(ShipPart {
                position,
                destroyed,
                origin,
                ship: Some(ship_id),
            }));
            part_ids.push(part_id);
        }
        self.ships.push(Some(Ship {
            orientation,
            parts: part_ids,
            placement_violated: violated,
            phantom: make_phantom,
        }));
        self.revalidate_with(ship_id, ignore);
        Some(ship_id)
    }

    /// Flip a ship's orientation around its origin part. The flip is
    /// committed only when the rotated footprint is legal (probed with the
    /// ship itself ignored); otherwise this is a silent no-op.
    pub fn rotate_ship(&mut self, ship: ShipId) {
        let (length, flipped) = match self.ship(ship) {
            Some(s) => (s.parts.len(), s.orientation.flipped()),
            None => return,
        };
        let head_pos = match self.origin_part_of(ship).and_then(|pid| self.part(pid)) {
            Some(part) => part.position,
            None => return,
        };
        if !self.placement_fits(head_pos, flipped, length, Some(ship)) {
            return;
        }
        let part_ids = match self.ship(ship) {
            Some(s) => s.parts.clone(),
            None => return,
        };
        for (i, pid) in part_ids.into_iter().enumerate() {
            if let Some(part) = self.part_mut(pid) {
                part.position = flipped.step(head_pos, i as i32);
            }
        }
        if let Some(s) = self.ships.get_mut(ship.0).and_then(|slot| slot.as_mut()) {
            s.orientation = flipped;
        }
        self.revalidate_with(ship, None);
    }

    /// The part orientation changes pivot around, if the ship has one.
    pub fn origin_part_of(&self, ship: ShipId) -> Option<PartId> {
        self.ship(ship)?
            .parts
            .iter()
            .copied()
            .find(|&pid| self.part(pid).is_some_and(|p| p.origin))
    }

    /// Recompute a ship's placement flag against the current board.
    pub fn revalidate(&mut self, ship: ShipId) {
        self.revalidate_with(ship, None);
    }

    fn revalidate_with(&mut self, ship: ShipId, ignore: Option<ShipId>) {
        let positions: Vec<Pos> = match self.ship(ship) {
            Some(s) => s
                .parts
                .iter()
                .filter_map(|&pid| self.part(pid).map(|p| p.position))
                .collect(),
            None => return,
        };
        let violated = positions
            .iter()
            .any(|&p| !self.cell_placement_ok(p, Owner::Of(ship), ignore));
        if let Some(s) = self.ships.get_mut(ship.0).and_then(|slot| slot.as_mut()) {
            s.placement_violated = violated;
        }
    }

    /// Placement rule for one cell: in bounds, and no foreign part within
    /// Chebyshev distance 1. Parts of `ignore`, of the owning ship itself
    /// and of phantom ships do not count; anonymous parts always do.
    fn cell_placement_ok(&self, position: Pos, owner: Owner, ignore: Option<ShipId>) -> bool {
        if !self.contains(position) {
            return false;
        }
        for other in self.parts.iter().flatten() {
            if let Some(other_ship) = other.ship {
                if ignore == Some(other_ship) {
                    continue;
                }
                if owner == Owner::Of(other_ship) {
                    continue;
                }
                if self.ship(other_ship).is_some_and(|s| s.phantom) {
                    continue;
                }
            }
            if position.chebyshev(other.position) < 2 {
                return false;
            }
        }
        true
    }

    pub fn add_mark(&mut self, position: Pos, kind: MarkKind) {
        self.marks.push(CellMark { position, kind });
    }

    /// Remove the first mark at `position`, reporting whether one existed.
    pub fn remove_mark(&mut self, position: Pos) -> bool {
        match self.marks.iter().position(|m| m.position == position) {
            Some(i) => {
                self.marks.remove(i);
                true
            }
            None => false,
        }
    }

    /// Apply a revealed shot. A miss leaves a mark, a hit an anonymous
    /// destroyed part. A kill additionally reconstructs the sunk ship by
    /// flood-filling orthogonal neighbors among the existing parts and
    /// registers the set as a new ownerless ship; the parts themselves
    /// stay anonymous, the grouping exists for display only.
    pub fn shot_at(&mut self, position: Pos, outcome: ShotOutcome) {
        match outcome {
            ShotOutcome::Miss => self.add_mark(position, MarkKind::Miss),
            ShotOutcome::Hit => {
                self.add_anonymous_part(position);
            }
            ShotOutcome::Destroyed => {
                self.add_anonymous_part(position);
                let members = self.connected_parts(position);
                self.ships.push(Some(Ship {
                    orientation: Orientation::Horizontal,
                    parts: members,
                    placement_violated: false,
                    phantom: false,
                }));
            }
        }
    }

    fn add_anonymous_part(&mut self, position: Pos) -> PartId {
        let part_id = PartId(self.parts.len());
        self.parts.push(Some(ShipPart {
            position,
            destroyed: true,
            origin: false,
            ship: None,
        }));
        part_id
    }

    /// All parts orthogonally connected to `start` (the part at `start`
    /// included), found breadth-first with a position-keyed visited set.
    /// No diagonal connectivity.
    fn connected_parts(&self, start: Pos) -> Vec<PartId> {
        let mut members = Vec::new();
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);
        while let Some(pos) = queue.pop_front() {
            let Some(part_id) = self.find_at(pos) else {
                continue;
            };
            members.push(part_id);
            for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
                let next = pos.offset(dx, dy);
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        members
    }

    /// First part at `position` among all parts on the field.
    pub fn find_at(&self, position: Pos) -> Option<PartId> {
        self.parts().find(|(_, p)| p.position == position).map(|(id, _)| id)
    }

    /// First part at `position` among the given subset.
    pub fn find_at_in(&self, position: Pos, parts: &[PartId]) -> Option<PartId> {
        parts
            .iter()
            .copied()
            .find(|&pid| self.part(pid).is_some_and(|p| p.position == position))
    }

    /// True iff no part and no mark occupies `position`.
    pub fn is_cell_empty_at(&self, position: Pos) -> bool {
        self.find_at(position).is_none() && !self.marks.iter().any(|m| m.position == position)
    }

    /// Every part of `ship` is destroyed.
    pub fn ship_destroyed(&self, ship: ShipId) -> bool {
        match self.ship(ship) {
            Some(s) => s
                .parts
                .iter()
                .all(|&pid| self.part(pid).map_or(true, |p| p.destroyed)),
            None => true,
        }
    }

    /// No ship on the field violates the placement rules.
    pub fn all_ships_placed(&self) -> bool {
        self.ships().all(|(_, s)| !s.placement_violated)
    }

    /// Every part of every ship is destroyed.
    pub fn all_ships_destroyed(&self) -> bool {
        self.ships().all(|(id, _)| self.ship_destroyed(id))
    }

    /// Deal the standard fleet into the staging rows below the grid.
    /// Everything starts out of bounds, flagged, until dragged on.
    pub fn add_startup_ships(&mut self) {
        for (&length, &(x, y)) in FLEET.iter().zip(STARTUP_ANCHORS.iter()) {
            self.add_ship(Pos::new(x, y), Orientation::Horizontal, length, false);
        }
    }

    /// Place the standard fleet at random legal positions, retrying each
    /// ship up to a bounded number of attempts. Returns false when no
    /// arrangement was found within the limit.
    pub fn random_fleet<R: Rng>(&mut self, rng: &mut R) -> bool {
        for &length in FLEET.iter() {
            let mut placed = false;
            for _ in 0..100 {
                let orientation = if rng.random() {
                    Orientation::Horizontal
                } else {
                    Orientation::Vertical
                };
                let (max_x, max_y) = match orientation {
                    Orientation::Horizontal => (self.size.x - length as i32 + 1, self.size.y),
                    Orientation::Vertical => (self.size.x, self.size.y - length as i32 + 1),
                };
                if max_x <= 0 || max_y <= 0 {
                    break;
                }
                let origin = Pos::new(rng.random_range(0..max_x), rng.random_range(0..max_y));
                if self.placement_fits(origin, orientation, length, None) {
                    self.add_ship(origin, orientation, length, false);
                    placed = true;
                    break;
                }
            }
            if !placed {
                return false;
            }
        }
        true
    }
}
