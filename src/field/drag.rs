//! Phantom-marker drag flow for ship placement.
//!
//! The gesture layer feeds grid coordinates in; the real ship stays put
//! while a phantom marker copy follows the cursor, and the move commits
//! on release only when the marker sits on a legal spot.

use super::{Field, FieldState, PartId, Pos, ShipId};

/// An in-progress ship drag.
#[derive(Debug, Clone, Copy)]
pub struct Drag {
    target: ShipId,
    target_origin: PartId,
    marker: ShipId,
    marker_origin: PartId,
}

impl Drag {
    /// The ship being moved.
    pub fn target(&self) -> ShipId {
        self.target
    }

    /// The phantom preview copy.
    pub fn marker(&self) -> ShipId {
        self.marker
    }
}

impl Field {
    /// Grab the ship under `pos`. Only non-phantom ships on a field in the
    /// `Preparing` state can be dragged.
    pub fn begin_drag(&mut self, pos: Pos) -> Option<Drag> {
        if self.state() != FieldState::Preparing {
            return None;
        }
        let target_origin = self.find_at(pos)?;
        let target = self.part(target_origin)?.ship?;
        if self.ship(target)?.phantom {
            return None;
        }
        let marker = self.copy_ship(target, true, Some(target))?;
        let marker_parts = self.ship(marker)?.parts.clone();
        let marker_origin = self.find_at_in(pos, &marker_parts)?;
        Some(Drag {
            target,
            target_origin,
            marker,
            marker_origin,
        })
    }

    /// Track the cursor: move the marker, ignoring the dragged ship's own
    /// footprint when validating.
    pub fn update_drag(&mut self, drag: &Drag, pos: Pos) {
        if self.part(drag.marker_origin).map(|p| p.position) == Some(pos) {
            return;
        }
        self.move_ship(drag.marker, pos, Some(drag.marker_origin), Some(drag.target));
    }

    /// Drop the marker. The move commits when the marker's position is
    /// legal; otherwise the ship snaps back silently. The marker is
    /// removed either way. Returns whether the move was committed.
    pub fn finish_drag(&mut self, drag: Drag, pos: Pos) -> bool {
        let legal = self.ship(drag.marker).is_some_and(|s| !s.placement_violated);
        if legal {
            self.move_ship(drag.target, pos, Some(drag.target_origin), None);
        }
        self.remove_ship(drag.marker);
        legal
    }
}
