// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "points/mod.rs"]
pub mod points;

#[path = "trivia/mod.rs"]
pub mod trivia;

#[path = "ai/mod.rs"]
pub mod ai;
