use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{load_activity, load_user, require_not_creator, Effects, Engine};
use crate::db::{interactions, users};
use crate::error::Result;
use crate::models::{Review, ReviewOutcome, ReviewType};

impl Engine {
    /// Creates or updates a review and moves the creator's XP by the
    /// difference between the new and the previous score.
    ///
    /// Rewards are scaled by the creator's own skill in the activity type.
    /// Re-submitting the same score is a successful no-op.
    #[instrument(skip(self))]
    pub async fn review_activity(
        &self,
        activity_id: Uuid,
        reviewer_id: Uuid,
        review_type: ReviewType,
    ) -> Result<ReviewOutcome> {
        let now = self.now();

        let result = self.db.transaction(|conn| {
            let activity = load_activity(conn, activity_id)?;
            require_not_creator(&activity, reviewer_id)?;
            load_user(conn, reviewer_id)?;

            let creator_skill =
                users::skill_level(conn, activity.creator_id, activity.activity_type)?;
            let reward = |review_type| {
                self.tables
                    .review_reward(activity.activity_type, review_type, creator_skill)
            };
            let new_xp = reward(review_type);

            let outcome = match interactions::find_review(conn, reviewer_id, activity_id)? {
                None => {
                    let review = Review {
                        id: Uuid::new_v4(),
                        user_id: reviewer_id,
                        activity_id,
                        review_type,
                        created_at: now,
                        updated_at: now,
                    };
                    interactions::insert_review(conn, &review)?;
                    users::add_xp(conn, activity.creator_id, new_xp)?;
                    ReviewOutcome {
                        review,
                        xp_delta: new_xp,
                    }
                }
                Some(review) if review.review_type == review_type => {
                    debug!(%activity_id, %reviewer_id, "Review unchanged");
                    ReviewOutcome {
                        review,
                        xp_delta: 0,
                    }
                }
                Some(mut review) => {
                    let delta = new_xp - reward(review.review_type);
                    review.review_type = review_type;
                    review.updated_at = now;
                    interactions::update_review(conn, &review)?;
                    if delta != 0 {
                        users::add_xp(conn, activity.creator_id, delta)?;
                    }
                    ReviewOutcome {
                        review,
                        xp_delta: delta,
                    }
                }
            };

            Ok((outcome, Effects::default()))
        });

        let outcome = self.settle(result, &[]).await?;
        info!(%activity_id, %reviewer_id, xp_delta = outcome.xp_delta, "Reviewed activity");
        Ok(outcome)
    }
}
