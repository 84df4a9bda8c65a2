// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "points/mod.rs"]
pub mod points;

#[path = "trivia/mod.rs"]
pub mod trivia;

#[path = "ai/mod.rs"]
pub mod ai;
