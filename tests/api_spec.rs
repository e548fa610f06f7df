use speculate2::speculate;

speculate! {
    use std::sync::Arc;

    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use deedquest::api::{create_router, MediaPayload, USER_HEADER};
    use deedquest_core::{Database, Engine, InMemoryMediaService, LogNotifier, RewardTables};
    use serde_json::{json, Value};
    use tokio_test::block_on;
    use uuid::Uuid;

    fn server() -> TestServer {
        let db = Database::open_memory().unwrap();
        db.migrate().unwrap();
        let engine = Engine::new(
            db,
            Arc::new(RewardTables::default()),
            Arc::new(InMemoryMediaService::default()),
            Arc::new(LogNotifier),
        );
        TestServer::new(create_router(engine)).unwrap()
    }

    fn as_user(id: Uuid) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static(USER_HEADER),
            HeaderValue::from_str(&id.to_string()).unwrap(),
        )
    }

    async fn register(server: &TestServer, email: &str) -> Uuid {
        let response = server.post("/users").json(&json!({ "email": email })).await;
        response.assert_status(StatusCode::CREATED);
        let user: Value = response.json();
        user["id"].as_str().unwrap().parse().unwrap()
    }

    /// Submits and approves an activity, returning the approved activity id.
    async fn publish(server: &TestServer, creator: Uuid, body: Value) -> Uuid {
        let (name, value) = as_user(creator);
        let response = server.post("/activities").add_header(name, value).json(&body).await;
        response.assert_status(StatusCode::CREATED);
        let pending: Value = response.json();

        let response = server
            .post(&format!("/moderation/pending/{}", pending["id"].as_str().unwrap()))
            .json(&json!({ "approve": true }))
            .await;
        response.assert_status_ok();
        let resolution: Value = response.json();
        assert_eq!(resolution["status"], "approved");
        resolution["activity"]["id"].as_str().unwrap().parse().unwrap()
    }

    async fn xp_of(server: &TestServer, user: Uuid) -> i64 {
        let (name, value) = as_user(user);
        let progress: Value = server
            .get("/users/me/progress")
            .add_header(name, value)
            .await
            .json();
        progress["xp"].as_i64().unwrap()
    }

    describe "users" {
        it "registers and returns the caller's profile" {
            block_on(async {
                let server = server();
                let alice = register(&server, "alice@example.com").await;

                let (name, value) = as_user(alice);
                let response = server.get("/users/me").add_header(name, value).await;
                response.assert_status_ok();
                let profile: Value = response.json();
                assert_eq!(profile["email"], "alice@example.com");
                assert_eq!(profile["xp"], 0);
            });
        }

        it "answers 401 without a user header" {
            block_on(async {
                let server = server();
                let response = server.get("/users/me").await;
                response.assert_status(StatusCode::UNAUTHORIZED);
            });
        }

        it "answers 404 for an unknown user" {
            block_on(async {
                let server = server();
                let (name, value) = as_user(Uuid::new_v4());
                let response = server.get("/users/me").add_header(name, value).await;
                response.assert_status(StatusCode::NOT_FOUND);
            });
        }

        it "rejects a malformed email" {
            block_on(async {
                let server = server();
                let response = server.post("/users").json(&json!({ "email": "nope" })).await;
                response.assert_status(StatusCode::BAD_REQUEST);
            });
        }
    }

    describe "activities" {
        it "publishes an approved submission with its media" {
            block_on(async {
                let server = server();
                let alice = register(&server, "alice@example.com").await;
                let photo = MediaPayload::encode("deed.jpg", b"jpeg bytes");

                let id = publish(&server, alice, json!({
                    "activity_type": "good_deed",
                    "title": "Helped a neighbour move",
                    "files": [photo],
                })).await;

                let response = server.get(&format!("/activities/{}", id)).await;
                response.assert_status_ok();
                let activity: Value = response.json();
                assert_eq!(activity["title"], "Helped a neighbour move");
                assert_eq!(activity["media"].as_array().unwrap().len(), 1);
                assert!(server.get("/moderation/pending").await.json::<Vec<Value>>().is_empty());
            });
        }

        it "rejects undecodable media" {
            block_on(async {
                let server = server();
                let alice = register(&server, "alice@example.com").await;
                let (name, value) = as_user(alice);

                let response = server
                    .post("/activities")
                    .add_header(name, value)
                    .json(&json!({
                        "activity_type": "joke",
                        "title": "Knock knock",
                        "files": [{ "file_name": "a.jpg", "data": "!!!" }],
                    }))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
            });
        }

        it "answers 404 for an unknown activity" {
            block_on(async {
                let server = server();
                let response = server.get(&format!("/activities/{}", Uuid::new_v4())).await;
                response.assert_status(StatusCode::NOT_FOUND);
            });
        }
    }

    describe "reviews" {
        it "credits the creator and reports the delta" {
            block_on(async {
                let server = server();
                let alice = register(&server, "alice@example.com").await;
                let bob = register(&server, "bob@example.com").await;
                let joke = publish(&server, alice, json!({
                    "activity_type": "joke",
                    "title": "Why did the crab never share?",
                })).await;

                let (name, value) = as_user(bob);
                let response = server
                    .post(&format!("/activities/{}/reviews", joke))
                    .add_header(name, value)
                    .json(&json!({ "review_type": "awesome" }))
                    .await;
                response.assert_status_ok();
                let outcome: Value = response.json();
                assert_eq!(outcome["xp_delta"], 100);
                assert_eq!(xp_of(&server, alice).await, 100);
            });
        }

        it "refuses self-reviews" {
            block_on(async {
                let server = server();
                let alice = register(&server, "alice@example.com").await;
                let joke = publish(&server, alice, json!({
                    "activity_type": "joke",
                    "title": "Self-made",
                })).await;

                let (name, value) = as_user(alice);
                let response = server
                    .post(&format!("/activities/{}/reviews", joke))
                    .add_header(name, value)
                    .json(&json!({ "review_type": "awesome" }))
                    .await;
                response.assert_status(StatusCode::BAD_REQUEST);
            });
        }
    }

    describe "puzzles" {
        it "rewards a correct answer once" {
            block_on(async {
                let server = server();
                let alice = register(&server, "alice@example.com").await;
                let bob = register(&server, "bob@example.com").await;
                let puzzle = publish(&server, alice, json!({
                    "activity_type": "puzzle",
                    "title": "What follows you everywhere?",
                    "answer": "A Shadow",
                })).await;
                let path = format!("/activities/{}/puzzle-answers", puzzle);

                let (name, value) = as_user(bob);
                let wrong = server
                    .post(&path)
                    .add_header(name.clone(), value.clone())
                    .json(&json!({ "answer": "a dog" }))
                    .await;
                wrong.assert_status(StatusCode::BAD_REQUEST);

                let right = server
                    .post(&path)
                    .add_header(name.clone(), value.clone())
                    .json(&json!({ "answer": "  a shadow " }))
                    .await;
                right.assert_status(StatusCode::CREATED);
                assert_eq!(xp_of(&server, bob).await, 100);

                let again = server
                    .post(&path)
                    .add_header(name, value)
                    .json(&json!({ "answer": "a shadow" }))
                    .await;
                again.assert_status(StatusCode::BAD_REQUEST);
                assert_eq!(xp_of(&server, bob).await, 100);
            });
        }
    }

    describe "challenges" {
        it "only lets the creator confirm an answer" {
            block_on(async {
                let server = server();
                let alice = register(&server, "alice@example.com").await;
                let bob = register(&server, "bob@example.com").await;
                let challenge = publish(&server, alice, json!({
                    "activity_type": "challenge",
                    "title": "Plant a tree",
                })).await;

                let (name, value) = as_user(bob);
                let response = server
                    .post(&format!("/activities/{}/challenge-answers", challenge))
                    .add_header(name.clone(), value.clone())
                    .json(&json!({
                        "description": "Planted an oak",
                        "files": [MediaPayload::encode("oak.jpg", b"oak")],
                    }))
                    .await;
                response.assert_status_ok();
                let answer: Value = response.json();
                let confirm = format!("/challenge-answers/{}/confirm", answer["id"].as_str().unwrap());

                server
                    .post(&confirm)
                    .add_header(name, value)
                    .await
                    .assert_status(StatusCode::FORBIDDEN);

                let (name, value) = as_user(alice);
                let response = server.post(&confirm).add_header(name, value).await;
                response.assert_status_ok();
                assert_eq!(response.json::<Value>()["confirmed"], true);

                let response = server
                    .post(&format!(
                        "/moderation/challenge-answers/{}/approve",
                        answer["id"].as_str().unwrap()
                    ))
                    .await;
                response.assert_status_ok();
                let resolution: Value = response.json();
                assert_eq!(resolution["winner_id"], bob.to_string());
            });
        }
    }
}
