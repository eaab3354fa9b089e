//! Matching engine core for the market-making game.
//!
//! This crate implements only the engine: order books, the position/P&L
//! ledger, and the façade that routes requests between them. Everything
//! that talks to a network, a database, or a user sits outside this crate.

pub mod engine;

pub use engine::prelude;
