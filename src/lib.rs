#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod config;
pub mod field;
pub mod protocol;
#[cfg(feature = "std")]
pub mod client;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod net;
#[cfg(feature = "std")]
pub mod registry;
#[cfg(feature = "std")]
pub mod session;

pub use config::*;
pub use field::*;
pub use protocol::*;
#[cfg(feature = "std")]
pub use client::*;
#[cfg(feature = "std")]
pub use logging::init_logging;
#[cfg(feature = "std")]
pub use net::*;
#[cfg(feature = "std")]
pub use registry::*;
#[cfg(feature = "std")]
pub use session::*;
