//! A wiring-and-stepping engine for networks of synchronous Moore
//! finite-state machines.
//!
//! A [`Machine`] holds a packed-bit state, consumes a packed-bit input, and
//! produces a packed-bit output computed from state alone. Machines are
//! wired together at the granularity of individual input/output bits
//! through a [`Fabric`], which owns every machine and the bidirectional
//! connection graph between them, and advances a caller-chosen set of
//! machines by exactly one synchronous tick per [`Fabric::step`] call.
//!
//! Transition and output functions are opaque callbacks supplied by the
//! caller; the hard part this crate owns is the wiring bookkeeping and the
//! two-phase synchronous step, not the per-machine computation.

mod bits;
mod error;
mod fabric;
mod machine;
mod rng;

pub use bits::PackedBits;
pub use error::Error;
pub use fabric::Fabric;
pub use machine::{Consumer, Driver, Machine, OutFn, PMachine, TransFn};
pub use rng::LoomRng;
