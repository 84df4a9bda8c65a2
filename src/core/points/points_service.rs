// This is the points module - the business rules for message activity rewards.
// Like the rest of `core`, it has no serenity or poise imports and works with
// plain strings and integers so the Discord layer stays a thin adapter.

use super::points_models::{Activity, Transaction, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PointsError {
    #[error("Invalid Discord user ID")]
    InvalidId,

    #[error("Amount must not be zero")]
    InvalidAmount,

    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting users, transactions and activities.
///
/// Both point mutations are upserts: a user that has never been seen is
/// created with default values before the change is applied.
#[async_trait]
pub trait PointsStore: Send + Sync {
    /// Upsert the user, then add one point and one recorded message and set
    /// `last_msg`. Returns the user's points after the update.
    async fn record_message(&self, discord_id: &str, at: DateTime<Utc>)
        -> Result<i64, PointsError>;

    /// Upsert the user, then add `delta` to their points.
    /// Returns the new total.
    async fn add_points(&self, discord_id: &str, delta: i64) -> Result<i64, PointsError>;

    async fn get_user(&self, discord_id: &str) -> Result<Option<User>, PointsError>;

    /// Users ordered by points (highest first), ties by id.
    async fn top_users(&self, limit: usize) -> Result<Vec<User>, PointsError>;

    async fn log_transaction(&self, transaction: Transaction) -> Result<(), PointsError>;

    /// Most recent first.
    async fn recent_transactions(
        &self,
        discord_id: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, PointsError>;

    async fn record_activity(&self, activity: Activity) -> Result<(), PointsError>;
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct PointsConfig {
    /// Points per correct trivia answer. Zero turns trivia rewards off.
    pub trivia_points_per_correct: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            trivia_points_per_correct: 5,
        }
    }
}

const MAX_LEADERBOARD_SIZE: usize = 25;

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct PointsService<S: PointsStore> {
    store: S,
    config: PointsConfig,
}

impl<S: PointsStore> PointsService<S> {
    #[allow(dead_code)]
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: PointsConfig::default(),
        }
    }

    pub fn new_with_config(store: S, config: PointsConfig) -> Self {
        Self { store, config }
    }

    fn validate_id(discord_id: &str) -> Result<(), PointsError> {
        if discord_id.trim().is_empty() {
            Err(PointsError::InvalidId)
        } else {
            Ok(())
        }
    }

    /// Count a non-bot message: exactly one point and one recorded message.
    pub async fn track_message(&self, discord_id: &str) -> Result<i64, PointsError> {
        Self::validate_id(discord_id)?;
        self.store.record_message(discord_id, Utc::now()).await
    }

    /// Current points, or `None` for a user the bot has never recorded.
    pub async fn points_of(&self, discord_id: &str) -> Result<Option<i64>, PointsError> {
        Self::validate_id(discord_id)?;
        Ok(self.store.get_user(discord_id).await?.map(|u| u.points))
    }

    /// Manually adjust a user's points and log why.
    ///
    /// Negative amounts are allowed so moderators can take points back.
    pub async fn add_points(
        &self,
        discord_id: &str,
        amount: i64,
        reason: impl Into<String>,
    ) -> Result<i64, PointsError> {
        Self::validate_id(discord_id)?;
        if amount == 0 {
            return Err(PointsError::InvalidAmount);
        }

        let total = self.store.add_points(discord_id, amount).await?;
        self.store
            .log_transaction(Transaction {
                user_id: discord_id.to_string(),
                delta_points: amount,
                reason: reason.into(),
                timestamp: Utc::now(),
            })
            .await?;

        Ok(total)
    }

    /// Top users by points. The limit is clamped to 1..=25.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<User>, PointsError> {
        self.store
            .top_users(limit.clamp(1, MAX_LEADERBOARD_SIZE))
            .await
    }

    /// Award points for correct trivia answers.
    ///
    /// Returns the points awarded (0 when rewards are disabled or nothing
    /// was answered correctly, in which case the store is not touched).
    pub async fn reward_trivia(&self, discord_id: &str, correct: u32) -> Result<i64, PointsError> {
        Self::validate_id(discord_id)?;
        let award = self
            .config
            .trivia_points_per_correct
            .saturating_mul(correct as i64);
        if award <= 0 {
            return Ok(0);
        }

        self.add_points(
            discord_id,
            award,
            format!("Trivia: {} correct answer(s)", correct),
        )
        .await?;
        Ok(award)
    }

    #[allow(dead_code)]
    pub async fn recent_transactions(
        &self,
        discord_id: &str,
        limit: usize,
    ) -> Result<Vec<Transaction>, PointsError> {
        Self::validate_id(discord_id)?;
        self.store.recent_transactions(discord_id, limit).await
    }

    pub async fn log_activity(
        &self,
        kind: &str,
        content: impl Into<String>,
    ) -> Result<(), PointsError> {
        self.store
            .record_activity(Activity {
                kind: kind.to_string(),
                content: content.into(),
                timestamp: Utc::now(),
            })
            .await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryPointsStore {
        users: Mutex<HashMap<String, User>>,
        transactions: Mutex<Vec<Transaction>>,
        activities: Mutex<Vec<Activity>>,
    }

    #[async_trait]
    impl PointsStore for InMemoryPointsStore {
        async fn record_message(
            &self,
            discord_id: &str,
            at: DateTime<Utc>,
        ) -> Result<i64, PointsError> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .entry(discord_id.to_string())
                .or_insert_with(|| User::new(discord_id));
            user.points += 1;
            user.recorded_msgs += 1;
            user.last_msg = Some(at.to_rfc3339());
            Ok(user.points)
        }

        async fn add_points(&self, discord_id: &str, delta: i64) -> Result<i64, PointsError> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .entry(discord_id.to_string())
                .or_insert_with(|| User::new(discord_id));
            user.points += delta;
            Ok(user.points)
        }

        async fn get_user(&self, discord_id: &str) -> Result<Option<User>, PointsError> {
            Ok(self.users.lock().unwrap().get(discord_id).cloned())
        }

        async fn top_users(&self, limit: usize) -> Result<Vec<User>, PointsError> {
            let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
            users.sort_by(|a, b| {
                b.points
                    .cmp(&a.points)
                    .then_with(|| a.discord_id.cmp(&b.discord_id))
            });
            users.truncate(limit);
            Ok(users)
        }

        async fn log_transaction(&self, transaction: Transaction) -> Result<(), PointsError> {
            self.transactions.lock().unwrap().push(transaction);
            Ok(())
        }

        async fn recent_transactions(
            &self,
            discord_id: &str,
            limit: usize,
        ) -> Result<Vec<Transaction>, PointsError> {
            Ok(self
                .transactions
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.user_id == discord_id)
                .rev()
                .take(limit)
                .cloned()
                .collect())
        }

        async fn record_activity(&self, activity: Activity) -> Result<(), PointsError> {
            self.activities.lock().unwrap().push(activity);
            Ok(())
        }
    }

    fn make_service() -> PointsService<InMemoryPointsStore> {
        PointsService::new(InMemoryPointsStore::default())
    }

    #[tokio::test]
    async fn each_message_is_worth_exactly_one_point() {
        let service = make_service();

        assert_eq!(service.track_message("42").await.unwrap(), 1);
        assert_eq!(service.track_message("42").await.unwrap(), 2);
        assert_eq!(service.track_message("42").await.unwrap(), 3);

        let user = service.store.get_user("42").await.unwrap().unwrap();
        assert_eq!(user.points, 3);
        assert_eq!(user.recorded_msgs, 3);
        assert_eq!(user.level, 1);
        assert!(user.last_msg.is_some());
    }

    #[tokio::test]
    async fn unknown_user_has_no_points() {
        let service = make_service();
        assert_eq!(service.points_of("7").await.unwrap(), None);

        service.track_message("7").await.unwrap();
        assert_eq!(service.points_of("7").await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn add_points_logs_a_transaction() {
        let service = make_service();

        let total = service.add_points("1", 25, "Manual").await.unwrap();
        assert_eq!(total, 25);

        let total = service.add_points("1", -5, "Correction").await.unwrap();
        assert_eq!(total, 20);

        let history = service.recent_transactions("1", 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].delta_points, -5);
        assert_eq!(history[1].reason, "Manual");
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let service = make_service();
        let err = service.add_points("1", 0, "Nothing").await.unwrap_err();
        assert!(matches!(err, PointsError::InvalidAmount));
        assert_eq!(service.points_of("1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_id_is_rejected() {
        let service = make_service();
        assert!(matches!(
            service.track_message("  ").await,
            Err(PointsError::InvalidId)
        ));
    }

    #[tokio::test]
    async fn leaderboard_is_sorted_and_limited() {
        let service = make_service();
        service.add_points("a", 5, "seed").await.unwrap();
        service.add_points("b", 50, "seed").await.unwrap();
        service.add_points("c", 20, "seed").await.unwrap();
        service.add_points("d", 20, "seed").await.unwrap();

        let top = service.leaderboard(3).await.unwrap();
        let ids: Vec<&str> = top.iter().map(|u| u.discord_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "d"]);

        // A limit of zero still returns the top user.
        assert_eq!(service.leaderboard(0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn trivia_reward_scales_with_correct_answers() {
        let service = make_service();

        assert_eq!(service.reward_trivia("9", 3).await.unwrap(), 15);
        assert_eq!(service.points_of("9").await.unwrap(), Some(15));

        // Nothing correct means no transaction at all.
        assert_eq!(service.reward_trivia("9", 0).await.unwrap(), 0);
        assert_eq!(service.recent_transactions("9", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn trivia_reward_can_be_disabled() {
        let service = PointsService::new_with_config(
            InMemoryPointsStore::default(),
            PointsConfig {
                trivia_points_per_correct: 0,
            },
        );
        assert_eq!(service.reward_trivia("9", 4).await.unwrap(), 0);
        assert_eq!(service.points_of("9").await.unwrap(), None);
    }

    #[tokio::test]
    async fn activities_are_recorded() {
        let service = make_service();
        service
            .log_activity(super::super::activity_kind::TRIVIA_GAME, "3/5")
            .await
            .unwrap();
        let activities = service.store.activities.lock().unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].kind, "trivia_game");
    }
}
