//! Game and server configuration constants.

use core::time::Duration;

/// Width and height of the square game field, in cells.
pub const FIELD_SIZE: i32 = 10;

/// Ship lengths of the standard fleet: one 4-cell, two 3-cell,
/// three 2-cell and four 1-cell ships.
pub const FLEET: [usize; 10] = [4, 3, 3, 2, 2, 2, 1, 1, 1, 1];

/// Staging-row anchors for the startup fleet, one per [`FLEET`] entry.
/// The rows sit below the grid, so a freshly dealt fleet is flagged as
/// misplaced until the player drags it onto the field.
pub const STARTUP_ANCHORS: [(i32, i32); 10] = [
    (0, 11),
    (0, 13),
    (4, 13),
    (0, 15),
    (3, 15),
    (6, 15),
    (0, 17),
    (2, 17),
    (4, 17),
    (6, 17),
];

/// How long the server waits for a connection's join query before
/// dropping it without reply.
pub const JOIN_TIMEOUT: Duration = Duration::from_millis(500);
