// Discord commands module.
// Each feature gets its own command file.

pub mod general;

pub mod points;

pub mod leaderboard;

pub mod trivia;

// Bot presence management
pub mod presence;

use crate::discord::{Data, Error};

/// Every command the framework should register, in help order.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        general::ping(),
        points::points(),
        points::addpoints(),
        leaderboard::leaderboard(),
        trivia::trivia(),
        trivia::trivia_multi(),
        trivia::trivia_categories(),
        trivia::trivia_help(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_names_are_unique_and_prefix_enabled() {
        let commands = all();
        let mut names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), commands.len());

        assert!(commands.iter().all(|c| c.prefix_action.is_some()));
        assert!(commands.iter().all(|c| c.slash_action.is_some()));
    }
}
