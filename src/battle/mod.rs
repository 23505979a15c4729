pub mod ai;
pub mod commands;
pub mod effects;
pub mod engine;
pub mod runner;
pub mod state;
pub mod stats;

#[cfg(test)]
mod tests;
