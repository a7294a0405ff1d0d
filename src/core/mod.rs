//! The probe contract and schedule parsing the engine is built on.

pub mod probe;
pub mod schedule;
pub mod terminal;
