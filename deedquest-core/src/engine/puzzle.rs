use tracing::{info, instrument};
use uuid::Uuid;

use super::{load_activity, load_user, require_not_creator, require_type, Effects, Engine};
use crate::db::{interactions, users};
use crate::error::{Error, Result};
use crate::models::{ActivityType, PuzzleAnswer};

impl Engine {
    /// Checks a solution and rewards the solver once per puzzle.
    #[instrument(skip(self, answer))]
    pub async fn answer_puzzle(
        &self,
        activity_id: Uuid,
        user_id: Uuid,
        answer: &str,
    ) -> Result<PuzzleAnswer> {
        let now = self.now();

        let result = self.db.transaction(|conn| {
            let activity = load_activity(conn, activity_id)?;
            require_type(&activity, ActivityType::Puzzle)?;
            require_not_creator(&activity, user_id)?;
            load_user(conn, user_id)?;

            if interactions::find_puzzle_answer(conn, user_id, activity_id)?.is_some() {
                return Err(Error::AlreadySolved);
            }

            let expected = activity
                .answer
                .as_deref()
                .ok_or_else(|| Error::Invalid("puzzle has no stored answer".into()))?;
            if !answers_match(expected, answer) {
                return Err(Error::IncorrectAnswer);
            }

            let solved = PuzzleAnswer {
                id: Uuid::new_v4(),
                user_id,
                activity_id,
                created_at: now,
            };
            interactions::insert_puzzle_answer(conn, &solved)?;
            users::add_xp(conn, user_id, self.tables.puzzle_solve_xp())?;

            Ok((solved, Effects::default()))
        });

        let solved = self.settle(result, &[]).await?;
        info!(%activity_id, %user_id, "Puzzle solved");
        Ok(solved)
    }
}

fn answers_match(expected: &str, given: &str) -> bool {
    expected.trim().to_lowercase() == given.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_ignores_case_and_surrounding_space() {
        assert!(answers_match("A Map", "  a map "));
        assert!(answers_match("ÉCLAIR", "éclair"));
        assert!(!answers_match("a map", "amap"));
    }
}
