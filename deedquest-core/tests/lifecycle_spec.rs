use speculate2::speculate;

mod common;

speculate! {
    use chrono::Duration;
    use deedquest_core::models::*;
    use deedquest_core::{Error, ErrorKind, NotificationKind};
    use tokio_test::block_on;
    use uuid::Uuid;

    use crate::common::{harness, input_for, photo};

    fn counter_rows(h: &crate::common::Harness, user_id: Uuid) -> i64 {
        h.engine
            .db()
            .read(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM creation_counters WHERE user_id = ?1",
                    [user_id.to_string()],
                    |row| row.get(0),
                )?)
            })
            .unwrap()
    }

    describe "create_pending_activity" {
        it "lists the submission in the owner's pending queue" {
            let h = harness();
            let alice = h.user("alice@example.com");

            let pending = h.submit(alice, input_for(ActivityType::Joke));

            let mine = h.engine.list_user_pending(alice).unwrap();
            assert_eq!(mine.len(), 1);
            assert_eq!(mine[0].id, pending.id);
            assert_eq!(h.engine.list_pending_activities().unwrap().len(), 1);
        }

        it "consumes a creation slot on submission" {
            let h = harness();
            let alice = h.user("alice@example.com");

            h.submit(alice, input_for(ActivityType::Joke));
            assert_eq!(counter_rows(&h, alice), 1);
        }

        it "rejects submissions past the weekly cap" {
            let h = harness();
            let alice = h.user("alice@example.com");
            h.submit(alice, input_for(ActivityType::Joke));
            h.submit(alice, input_for(ActivityType::Joke));

            let result = block_on(h.engine.create_pending_activity(
                alice,
                input_for(ActivityType::Joke),
                vec![],
            ));

            match result {
                Err(Error::QuotaExceeded { used, cap, .. }) => {
                    assert_eq!(used, 2);
                    assert_eq!(cap, 2);
                }
                other => panic!("expected quota error, got {:?}", other),
            }
            assert_eq!(counter_rows(&h, alice), 2);
        }

        it "counts the cap per activity type" {
            let h = harness();
            let alice = h.user("alice@example.com");
            h.submit(alice, input_for(ActivityType::Joke));
            h.submit(alice, input_for(ActivityType::Joke));

            h.submit(alice, input_for(ActivityType::Quote));
        }

        it "frees slots and purges stale counters after seven days" {
            let h = harness();
            let alice = h.user("alice@example.com");
            h.submit(alice, input_for(ActivityType::Joke));
            h.submit(alice, input_for(ActivityType::Joke));

            h.clock.advance(Duration::days(7));
            h.submit(alice, input_for(ActivityType::Joke));

            assert_eq!(counter_rows(&h, alice), 1);
        }

        it "raises the cap with first-tree skill levels" {
            let h = harness();
            let alice = h.user("alice@example.com");
            h.set_skill(alice, ActivityType::Joke, 1);

            for _ in 0..3 {
                h.submit(alice, input_for(ActivityType::Joke));
            }
            let result = block_on(h.engine.create_pending_activity(
                alice,
                input_for(ActivityType::Joke),
                vec![],
            ));
            assert!(matches!(result, Err(Error::QuotaExceeded { cap: 3, .. })));
        }

        it "skips media that fails to upload" {
            let h = harness();
            let alice = h.user("alice@example.com");

            let pending = block_on(h.engine.create_pending_activity(
                alice,
                input_for(ActivityType::GoodDeed),
                vec![photo("before.jpg"), photo("broken.jpg"), photo("after.jpg")],
            ))
            .unwrap();
            let activity = h.approve(&pending);

            let stored = h.engine.get_activity(activity.id).unwrap();
            assert_eq!(stored.media.len(), 2);
            assert_eq!(h.media.inner.len(), 2);
        }

        it "does not upload anything when the quota is already used" {
            let h = harness();
            let alice = h.user("alice@example.com");
            h.submit(alice, input_for(ActivityType::Joke));
            h.submit(alice, input_for(ActivityType::Joke));

            let result = block_on(h.engine.create_pending_activity(
                alice,
                input_for(ActivityType::Joke),
                vec![photo("a.jpg")],
            ));

            assert!(result.is_err());
            assert!(h.media.inner.is_empty());
        }

        it "rejects unknown users" {
            let h = harness();
            let result = block_on(h.engine.create_pending_activity(
                Uuid::new_v4(),
                input_for(ActivityType::Quote),
                vec![],
            ));
            assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
        }
    }

    describe "resolve_pending_activity" {
        it "materializes an approved activity and removes the pending row" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let pending = block_on(h.engine.create_pending_activity(
                alice,
                input_for(ActivityType::Challenge),
                vec![photo("proof.jpg")],
            ))
            .unwrap();

            let activity = h.approve(&pending);

            assert_eq!(activity.creator_id, alice);
            assert_eq!(activity.title, pending.title);
            assert_eq!(activity.xp_reward, None);
            assert!(h.engine.list_pending_activities().unwrap().is_empty());
            assert_eq!(h.engine.get_activity(activity.id).unwrap().media.len(), 1);
            assert_eq!(
                h.notifier.sent_to("alice@example.com"),
                vec![NotificationKind::ActivityApproved]
            );
        }

        it "deletes the submission and its media when disapproved" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let pending = block_on(h.engine.create_pending_activity(
                alice,
                input_for(ActivityType::Quote),
                vec![photo("one.jpg"), photo("two.jpg")],
            ))
            .unwrap();
            assert_eq!(h.media.inner.len(), 2);

            let resolution = block_on(h.engine.resolve_pending_activity(pending.id, false)).unwrap();

            assert!(matches!(resolution, Resolution::Disapproved { pending_id } if pending_id == pending.id));
            assert!(h.engine.list_pending_activities().unwrap().is_empty());
            assert!(h.media.inner.is_empty());
            assert_eq!(
                h.notifier.sent_to("alice@example.com"),
                vec![NotificationKind::ActivityRejected]
            );
        }

        it "commits a disapproval when media deletes and notifications fail" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let pending = block_on(h.engine.create_pending_activity(
                alice,
                input_for(ActivityType::Quote),
                vec![photo("one.jpg")],
            ))
            .unwrap();
            h.break_collaborators();

            let resolution = block_on(h.engine.resolve_pending_activity(pending.id, false));

            assert!(matches!(resolution, Ok(Resolution::Disapproved { .. })));
            assert!(h.engine.list_pending_activities().unwrap().is_empty());
            assert_eq!(h.media_rows(), 0);
            // The remote file outlives the failed delete.
            assert_eq!(h.media.inner.len(), 1);
            assert_eq!(
                h.notifier.sent_to("alice@example.com"),
                vec![NotificationKind::ActivityRejected]
            );
        }

        it "keeps the creation slot after disapproval" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let first = h.submit(alice, input_for(ActivityType::Joke));
            h.submit(alice, input_for(ActivityType::Joke));
            block_on(h.engine.resolve_pending_activity(first.id, false)).unwrap();

            let result = block_on(h.engine.create_pending_activity(
                alice,
                input_for(ActivityType::Joke),
                vec![],
            ));
            assert!(matches!(result, Err(Error::QuotaExceeded { .. })));
        }

        it "cannot resolve the same submission twice" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let pending = h.submit(alice, input_for(ActivityType::Joke));
            h.approve(&pending);

            let again = block_on(h.engine.resolve_pending_activity(pending.id, true));
            assert!(matches!(again, Err(Error::NotFound(_))));
        }
    }

    describe "answer_puzzle" {
        it "rewards a correct answer regardless of case and spacing" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let bob = h.user("bob@example.com");
            let puzzle = h.approved(alice, ActivityType::Puzzle);

            block_on(h.engine.answer_puzzle(puzzle.id, bob, "  a shadow ")).unwrap();

            assert_eq!(h.xp(bob), h.engine.tables().puzzle_solve_xp());
        }

        it "leaves state untouched on a wrong answer" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let bob = h.user("bob@example.com");
            let puzzle = h.approved(alice, ActivityType::Puzzle);

            let result = block_on(h.engine.answer_puzzle(puzzle.id, bob, "a ghost"));

            assert!(matches!(result, Err(Error::IncorrectAnswer)));
            assert_eq!(h.xp(bob), 0);
            block_on(h.engine.answer_puzzle(puzzle.id, bob, "a shadow")).unwrap();
        }

        it "does not let the creator answer their own puzzle" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let puzzle = h.approved(alice, ActivityType::Puzzle);

            let result = block_on(h.engine.answer_puzzle(puzzle.id, alice, "a shadow"));

            assert_eq!(result.unwrap_err().kind(), ErrorKind::BadRequest);
            assert_eq!(h.xp(alice), 0);
        }

        it "rejects a second correct answer from the same solver" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let bob = h.user("bob@example.com");
            let puzzle = h.approved(alice, ActivityType::Puzzle);
            block_on(h.engine.answer_puzzle(puzzle.id, bob, "a shadow")).unwrap();

            let again = block_on(h.engine.answer_puzzle(puzzle.id, bob, "a shadow"));

            assert!(matches!(again, Err(Error::AlreadySolved)));
            assert_eq!(h.xp(bob), h.engine.tables().puzzle_solve_xp());
        }

        it "only applies to puzzles" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let bob = h.user("bob@example.com");
            let joke = h.approved(alice, ActivityType::Joke);

            let result = block_on(h.engine.answer_puzzle(joke.id, bob, "anything"));
            assert!(matches!(result, Err(Error::WrongActivityType { .. })));
        }
    }
}
