//! CLI Commands

pub mod backup;
pub mod challenge;
pub mod extract;
pub mod history;
pub mod solve;
