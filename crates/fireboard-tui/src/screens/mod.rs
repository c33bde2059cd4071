//! Screen implementations.

pub mod board;

pub use board::BoardScreen;
