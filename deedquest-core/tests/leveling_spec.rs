use speculate2::speculate;

mod common;

speculate! {
    use deedquest_core::models::*;
    use deedquest_core::Error;
    use tokio_test::block_on;
    use uuid::Uuid;

    use crate::common::harness;

    describe "register_user" {
        it "starts at level one with no skills" {
            let h = harness();
            let alice = h.user("alice@example.com");

            let profile = h.engine.get_user(alice).unwrap();
            assert_eq!(profile.user.xp, 0);
            assert_eq!(profile.user.level, 1);
            assert!(profile.skills.is_empty());
            assert!(profile.user.special_title.is_none());
        }

        it "refuses duplicate ids and malformed emails" {
            let h = harness();
            let alice = h.user("alice@example.com");

            let duplicate = block_on(h.engine.register_user(RegisterUserInput {
                id: alice,
                email: "other@example.com".into(),
            }));
            let malformed = block_on(h.engine.register_user(RegisterUserInput {
                id: Uuid::new_v4(),
                email: "not-an-email".into(),
            }));

            assert!(matches!(duplicate, Err(Error::Invalid(_))));
            assert!(matches!(malformed, Err(Error::Invalid(_))));
        }
    }

    describe "level_up" {
        it "needs enough XP for the next level" {
            let h = harness();
            let alice = h.user("alice@example.com");
            h.give_xp(alice, 99);

            let result = block_on(h.engine.level_up(alice, ActivityType::Joke));
            assert!(matches!(result, Err(Error::NotEnoughXp)));
        }

        it "invests one level into the chosen skill" {
            let h = harness();
            let alice = h.user("alice@example.com");
            h.give_xp(alice, 100);

            let profile = block_on(h.engine.level_up(alice, ActivityType::Joke)).unwrap();

            assert_eq!(profile.user.level, 2);
            assert_eq!(profile.skills.len(), 1);
            assert_eq!(profile.skills[0].activity_type, ActivityType::Joke);
            assert_eq!(profile.skills[0].level, 1);

            let again = block_on(h.engine.level_up(alice, ActivityType::Joke));
            assert!(matches!(again, Err(Error::NotEnoughXp)));
        }

        it "stops a skill at level seven" {
            let h = harness();
            let alice = h.user("alice@example.com");
            h.give_xp(alice, 1_000_000);
            for _ in 0..MAX_SKILL_LEVEL {
                block_on(h.engine.level_up(alice, ActivityType::Joke)).unwrap();
            }

            let result = block_on(h.engine.level_up(alice, ActivityType::Joke));

            assert!(matches!(result, Err(Error::SkillMaxed(ActivityType::Joke))));
            assert_eq!(h.engine.get_user(alice).unwrap().user.level, 8);
        }

        it "grants special titles for maxed skills" {
            let h = harness();
            let alice = h.user("alice@example.com");
            h.give_xp(alice, 1_000_000);

            for _ in 0..MAX_SKILL_LEVEL {
                block_on(h.engine.level_up(alice, ActivityType::Puzzle)).unwrap();
            }
            assert_eq!(
                h.engine.get_user(alice).unwrap().user.special_title.as_deref(),
                Some("The Riddler")
            );

            for _ in 0..MAX_SKILL_LEVEL {
                block_on(h.engine.level_up(alice, ActivityType::Joke)).unwrap();
            }
            assert_eq!(
                h.engine.get_user(alice).unwrap().user.special_title.as_deref(),
                Some("Witty Riddler")
            );
        }

        it "feeds second-tree skills into review rewards" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let bob = h.user("bob@example.com");
            h.give_xp(alice, 1_000_000);
            for _ in 0..5 {
                block_on(h.engine.level_up(alice, ActivityType::Joke)).unwrap();
            }
            let joke = h.approved(alice, ActivityType::Joke);

            let outcome = block_on(h.engine.review_activity(joke.id, bob, ReviewType::Awesome)).unwrap();
            assert_eq!(outcome.xp_delta, 200);
        }
    }

    describe "level_progress" {
        it "reports the next threshold" {
            let h = harness();
            let alice = h.user("alice@example.com");
            h.give_xp(alice, 150);

            let progress = h.engine.level_progress(alice).unwrap();

            assert_eq!(progress.xp, 150);
            assert_eq!(progress.level, 1);
            assert_eq!(progress.potential_level, 2);
            assert_eq!(progress.next_level_xp, Some(100));
        }
    }
}
