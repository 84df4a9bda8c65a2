// Points module - message activity rewards and the leaderboard

mod points_models;
mod points_service;

pub use points_models::{activity_kind, Activity, Transaction, User};
pub use points_service::{PointsConfig, PointsError, PointsService, PointsStore};
