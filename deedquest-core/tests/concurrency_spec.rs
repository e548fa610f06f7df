use speculate2::speculate;

mod common;

speculate! {
    use std::thread;

    use deedquest_core::models::*;
    use tokio_test::block_on;

    use crate::common::harness;

    describe "concurrent use cases" {
        it "never leaves two confirmed answers" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let challenge = h.approved(alice, ActivityType::Challenge);
            let answers: Vec<_> = (0..6)
                .map(|i| {
                    let user = h.user(&format!("user{}@example.com", i));
                    block_on(h.engine.answer_to_challenge(challenge.id, user, "mine", vec![]))
                        .unwrap()
                        .answer
                        .id
                })
                .collect();

            let handles: Vec<_> = answers
                .iter()
                .map(|&answer_id| {
                    let engine = h.engine.clone();
                    thread::spawn(move || block_on(engine.confirm_challenge_answer(answer_id, alice)))
                })
                .collect();
            for handle in handles {
                handle.join().unwrap().unwrap();
            }

            let confirmed = h
                .engine
                .list_challenge_answers(challenge.id)
                .unwrap()
                .into_iter()
                .filter(|a| a.answer.confirmed)
                .count();
            assert_eq!(confirmed, 1);
        }

        it "does not lose review XP" {
            let h = harness();
            let alice = h.user("alice@example.com");
            let deed = h.approved(alice, ActivityType::GoodDeed);
            let reviewers: Vec<_> = (0..8)
                .map(|i| h.user(&format!("reviewer{}@example.com", i)))
                .collect();

            let handles: Vec<_> = reviewers
                .into_iter()
                .map(|reviewer| {
                    let engine = h.engine.clone();
                    thread::spawn(move || {
                        block_on(engine.review_activity(deed.id, reviewer, ReviewType::Awesome))?;
                        block_on(engine.review_activity(deed.id, reviewer, ReviewType::Good))
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap().unwrap();
            }

            assert_eq!(h.xp(alice), 8 * 50);
        }
    }
}
