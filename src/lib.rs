//! Plot boundary capture and registration.
//!
//! A field officer clicks the corners of a plot on a map; the clicks build a
//! draft boundary that is previewed live and, once it has enough corners, is
//! registered with the plot registry service and redrawn as a committed plot.
//!
//! - [`map`]: map surface over a pluggable rendering backend
//! - [`draft`]: boundary point buffer and commit lifecycle
//! - [`registry`]: HTTP client for the plot registry
//! - [`store`]: observable application state (plots, status, user)
//! - [`session`]: wires the above into one drawing workflow
//! - [`server`]: in-memory registry service speaking the same contract

pub mod draft;
pub mod geo;
pub mod map;
pub mod registry;
pub mod server;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;
