// src/analyze/mod.rs

//! Ranking and merging of extracted datasets. Every function here is pure.

pub mod coerce;
pub mod combine;
pub mod rank;

pub use coerce::coerce_change;
pub use combine::combine;
pub use rank::{rank, Mover, MoverRanking};
