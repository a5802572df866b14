use serde::Deserialize;
use std::sync::Arc;
use warp::Filter;

use crate::invites::InviteBoard;
use crate::progression::ProgressionService;
use crate::round_manager::RoundManager;
use crate::websocket::ConnectionManager;

pub mod ai_opponent;
pub mod config;
pub mod invites;
pub mod progression;
pub mod round_manager;
pub mod websocket;

#[derive(Deserialize)]
struct LeaderboardQuery {
    limit: Option<u64>,
}

/// Body of the reflex game's score report. The reflex game runs on the
/// customer's device; only its final score comes back here.
#[derive(Deserialize)]
struct ScoreReport {
    score: u32,
}

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    invite_board: Arc<InviteBoard>,
    round_manager: Arc<RoundManager>,
    progression: Arc<ProgressionService>,
    restaurant_id: String,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // Clone for filters
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let invite_board_filter = warp::any().map({
        let invite_board = invite_board.clone();
        move || invite_board.clone()
    });

    let round_manager_filter = warp::any().map({
        let round_manager = round_manager.clone();
        move || round_manager.clone()
    });

    let progression_filter = warp::any().map({
        let progression = progression.clone();
        move || progression.clone()
    });

    let restaurant_filter = warp::any().map({
        let restaurant_id = restaurant_id.clone();
        move || restaurant_id.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter.clone())
        .and(invite_board_filter.clone())
        .and(round_manager_filter.clone())
        .and(progression_filter.clone())
        .and(restaurant_filter)
        .map(
            |ws: warp::ws::Ws, conn_mgr, invites, rounds, progression, restaurant| {
                ws.on_upgrade(move |socket| {
                    websocket::handle_connection(
                        socket,
                        conn_mgr,
                        invites,
                        rounds,
                        progression,
                        restaurant,
                    )
                })
            },
        );

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Reflex game score report
    let report_score = warp::path!("customers" / String / "score")
        .and(warp::post())
        .and(warp::body::json())
        .and(progression_filter.clone())
        .and_then(handle_score_report);

    // Progression lookup
    let get_progression = warp::path!("customers" / String / "progression")
        .and(warp::get())
        .and(progression_filter.clone())
        .and_then(handle_progression_request);

    // Leaderboard endpoint
    let leaderboard = warp::path("leaderboard")
        .and(warp::get())
        .and(warp::query::<LeaderboardQuery>())
        .and(progression_filter.clone())
        .and_then(handle_leaderboard_request);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST"]);

    websocket
        .or(health)
        .or(report_score)
        .or(get_progression)
        .or(leaderboard)
        .with(cors)
        .with(warp::log("blink_arcade"))
}

async fn handle_score_report(
    customer_id: String,
    report: ScoreReport,
    progression: Arc<ProgressionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match progression.apply_round_score(&customer_id, report.score).await {
        Ok(updated) => Ok(warp::reply::with_status(
            warp::reply::json(&updated),
            warp::http::StatusCode::OK,
        )),
        Err(err) => {
            tracing::warn!("Score report for {} failed: {}", customer_id, err);
            Ok(warp::reply::with_status(
                warp::reply::json(&serde_json::json!({
                    "error": "Customer not found"
                })),
                warp::http::StatusCode::NOT_FOUND,
            ))
        }
    }
}

async fn handle_progression_request(
    customer_id: String,
    progression: Arc<ProgressionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match progression.get_progression(&customer_id).await {
        Ok(Some(progression)) => Ok(warp::reply::with_status(
            warp::reply::json(&progression),
            warp::http::StatusCode::OK,
        )),
        Ok(None) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "Customer not found"
            })),
            warp::http::StatusCode::NOT_FOUND,
        )),
        Err(err) => {
            tracing::error!("Failed to fetch progression: {}", err);
            Ok(warp::reply::with_status(
                warp::reply::json(&serde_json::json!({
                    "error": "Failed to fetch progression"
                })),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn handle_leaderboard_request(
    query: LeaderboardQuery,
    progression: Arc<ProgressionService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let limit = query.limit.unwrap_or(10).min(100); // Default 10, max 100

    match progression.leaderboard(limit).await {
        Ok(leaderboard) => Ok(warp::reply::with_status(
            warp::reply::json(&leaderboard),
            warp::http::StatusCode::OK,
        )),
        Err(err) => {
            tracing::error!("Failed to fetch leaderboard: {}", err);
            Ok(warp::reply::with_status(
                warp::reply::json(&serde_json::json!({
                    "error": "Failed to fetch leaderboard"
                })),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use arcade_core::AiOpponent;
    use arcade_persistence::{CustomerRepository, LeaderboardEntry};
    use arcade_types::{
        AnswerSet, Category, ClientMessage, Opponent, Progression, RoundConclusion, ServerMessage,
    };
    use async_trait::async_trait;
    use migration::MigratorTrait;
    use std::time::Duration;

    struct UnreachableAi;

    #[async_trait]
    impl AiOpponent for UnreachableAi {
        async fn category_answers(&self, _letter: char) -> anyhow::Result<AnswerSet> {
            anyhow::bail!("no model in tests")
        }
    }

    async fn create_test_app()
    -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let connection_manager = Arc::new(ConnectionManager::new());
        let invite_board = Arc::new(InviteBoard::new(Duration::from_secs(5)));

        let db = arcade_persistence::connection::connect_to_memory_database()
            .await
            .unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let progression = Arc::new(ProgressionService::new(Arc::new(CustomerRepository::new(
            db,
        ))));

        let round_manager = Arc::new(RoundManager::new(
            Arc::new(UnreachableAi),
            progression.clone(),
            Duration::from_secs(10),
        ));

        create_routes(
            connection_manager,
            invite_board,
            round_manager,
            progression,
            "cafe-01".to_string(),
        )
    }

    async fn recv_server_message(ws: &mut warp::test::WsClient) -> ServerMessage {
        let msg = ws.recv().await.expect("Should receive a message");
        let text = msg.to_str().expect("Should be a text message");
        serde_json::from_str(text).expect("Should be a valid ServerMessage")
    }

    async fn send_client_message(ws: &mut warp::test::WsClient, message: &ClientMessage) {
        let json = serde_json::to_string(message).expect("Should serialize");
        ws.send_text(json).await;
    }

    /// Connect and identify, consuming the Welcome.
    async fn hello(ws: &mut warp::test::WsClient, id: &str, name: &str) -> Progression {
        send_client_message(
            ws,
            &ClientMessage::Hello {
                customer_id: id.to_string(),
                display_name: name.to_string(),
            },
        )
        .await;
        match recv_server_message(ws).await {
            ServerMessage::Welcome { progression, .. } => progression,
            other => panic!("Expected Welcome, got: {:?}", other),
        }
    }

    fn sheet_of(letter: char) -> AnswerSet {
        let mut answers = AnswerSet::default();
        for category in Category::ALL {
            answers.set(category, letter.to_string());
        }
        answers
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app().await;

        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), "OK");
    }

    #[tokio::test]
    async fn test_websocket_hello_and_welcome() {
        let app = create_test_app().await;

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        let progression = hello(&mut ws, "09121234567", "Sara").await;
        assert_eq!(progression.level, 1);
        assert_eq!(progression.total_score, 0);
    }

    #[tokio::test]
    async fn test_websocket_requires_hello_first() {
        let app = create_test_app().await;

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        send_client_message(&mut ws, &ClientMessage::ListOnline).await;

        match recv_server_message(&mut ws).await {
            ServerMessage::Error { message } => {
                assert!(message.contains("hello"));
            }
            other => panic!("Expected error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_websocket_invalid_message_handling() {
        let app = create_test_app().await;

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        ws.send_text("invalid json").await;

        // The connection closes on unparseable input
        assert!(ws.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_solo_ai_round_over_websocket() {
        let app = create_test_app().await;

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        hello(&mut ws, "09121234567", "Sara").await;

        send_client_message(&mut ws, &ClientMessage::StartAiRound { timer_seconds: 45 }).await;
        let (round_id, letter) = match recv_server_message(&mut ws).await {
            ServerMessage::RoundStarted {
                round_id,
                letter,
                timer_seconds,
                opponent,
            } => {
                assert_eq!(timer_seconds, 45);
                assert!(opponent.is_ai());
                (round_id, letter)
            }
            other => panic!("Expected RoundStarted, got: {:?}", other),
        };

        send_client_message(
            &mut ws,
            &ClientMessage::SubmitAnswers {
                round_id,
                answers: sheet_of(letter),
            },
        )
        .await;

        // the AI adapter always fails in tests, so the customer sweeps
        match recv_server_message(&mut ws).await {
            ServerMessage::RoundFinished {
                your_score,
                opponent_score,
                conclusion,
                progression,
                ..
            } => {
                assert_eq!(your_score, 70);
                assert_eq!(opponent_score, 0);
                assert_eq!(conclusion, RoundConclusion::Win);
                assert_eq!(progression.unwrap().total_score, 70);
            }
            other => panic!("Expected RoundFinished, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invite_flow_to_versus_round() {
        let app = create_test_app().await;

        let mut sara = warp::test::ws()
            .path("/ws")
            .handshake(app.clone())
            .await
            .expect("WebSocket handshake should succeed");
        let mut reza = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        hello(&mut sara, "0912", "Sara").await;
        hello(&mut reza, "0913", "Reza").await;

        // Sara sees Reza in the online list
        send_client_message(&mut sara, &ClientMessage::ListOnline).await;
        match recv_server_message(&mut sara).await {
            ServerMessage::OnlineCustomers { customers } => {
                assert_eq!(customers.len(), 1);
                assert_eq!(customers[0].customer.id, "0913");
                assert_eq!(customers[0].level, 1);
            }
            other => panic!("Expected OnlineCustomers, got: {:?}", other),
        }

        // Invite goes out to Reza, confirmation back to Sara
        send_client_message(
            &mut sara,
            &ClientMessage::SendInvite {
                to: "0913".to_string(),
                timer_seconds: 45,
            },
        )
        .await;
        match recv_server_message(&mut reza).await {
            ServerMessage::InviteReceived { invite } => {
                assert_eq!(invite.from.id, "0912");
                assert_eq!(invite.settings.timer_seconds, 45);
            }
            other => panic!("Expected InviteReceived, got: {:?}", other),
        }
        let _sara_confirmation = recv_server_message(&mut sara).await;

        // Accepting starts the round for both
        send_client_message(
            &mut reza,
            &ClientMessage::AcceptInvite {
                from: "0912".to_string(),
            },
        )
        .await;

        let _sara_update = recv_server_message(&mut sara).await;
        let _reza_update = recv_server_message(&mut reza).await;

        let (round_id, letter) = match recv_server_message(&mut sara).await {
            ServerMessage::RoundStarted {
                round_id,
                letter,
                opponent,
                ..
            } => {
                match opponent {
                    Opponent::Human { customer } => assert_eq!(customer.id, "0913"),
                    other => panic!("Expected human opponent, got: {:?}", other),
                }
                (round_id, letter)
            }
            other => panic!("Expected RoundStarted, got: {:?}", other),
        };
        match recv_server_message(&mut reza).await {
            ServerMessage::RoundStarted { round_id: id, .. } => assert_eq!(id, round_id),
            other => panic!("Expected RoundStarted, got: {:?}", other),
        }

        // Identical sheets: 5 points per category each, a draw
        send_client_message(
            &mut sara,
            &ClientMessage::SubmitAnswers {
                round_id: round_id.clone(),
                answers: sheet_of(letter),
            },
        )
        .await;
        send_client_message(
            &mut reza,
            &ClientMessage::SubmitAnswers {
                round_id: round_id.clone(),
                answers: sheet_of(letter),
            },
        )
        .await;

        for ws in [&mut sara, &mut reza] {
            match recv_server_message(ws).await {
                ServerMessage::RoundFinished {
                    your_score,
                    opponent_score,
                    conclusion,
                    ..
                } => {
                    assert_eq!(your_score, 35);
                    assert_eq!(opponent_score, 35);
                    assert_eq!(conclusion, RoundConclusion::Draw);
                }
                other => panic!("Expected RoundFinished, got: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_decline_invite_notifies_sender() {
        let app = create_test_app().await;

        let mut sara = warp::test::ws()
            .path("/ws")
            .handshake(app.clone())
            .await
            .expect("WebSocket handshake should succeed");
        let mut reza = warp::test::ws()
            .path("/ws")
            .handshake(app)
            .await
            .expect("WebSocket handshake should succeed");

        hello(&mut sara, "0912", "Sara").await;
        hello(&mut reza, "0913", "Reza").await;

        send_client_message(
            &mut sara,
            &ClientMessage::SendInvite {
                to: "0913".to_string(),
                timer_seconds: 30,
            },
        )
        .await;
        let _reza_invite = recv_server_message(&mut reza).await;
        let _sara_confirmation = recv_server_message(&mut sara).await;

        send_client_message(
            &mut reza,
            &ClientMessage::DeclineInvite {
                from: "0912".to_string(),
            },
        )
        .await;

        match recv_server_message(&mut sara).await {
            ServerMessage::InviteUpdated { invite } => {
                assert_eq!(invite.status, arcade_types::InviteStatus::Declined);
            }
            other => panic!("Expected InviteUpdated, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_score_report_and_progression_endpoints() {
        let app = create_test_app().await;

        // Register a customer over the websocket first
        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app.clone())
            .await
            .expect("WebSocket handshake should succeed");
        hello(&mut ws, "09121234567", "Sara").await;

        let response = warp::test::request()
            .method("POST")
            .path("/customers/09121234567/score")
            .json(&serde_json::json!({ "score": 450 }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let progression: Progression = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(progression.total_score, 450);
        assert_eq!(progression.level, 2);

        let response = warp::test::request()
            .method("GET")
            .path("/customers/09121234567/progression")
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let fetched: Progression = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(fetched, progression);

        // Unknown customers get a 404 on both
        let response = warp::test::request()
            .method("POST")
            .path("/customers/0000/score")
            .json(&serde_json::json!({ "score": 10 }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 404);

        let response = warp::test::request()
            .method("GET")
            .path("/customers/0000/progression")
            .reply(&app)
            .await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_leaderboard_endpoint() {
        let app = create_test_app().await;

        let response = warp::test::request()
            .method("GET")
            .path("/leaderboard")
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let leaderboard: Vec<LeaderboardEntry> =
            serde_json::from_slice(response.body()).unwrap();
        assert!(leaderboard.is_empty());

        let mut ws = warp::test::ws()
            .path("/ws")
            .handshake(app.clone())
            .await
            .expect("WebSocket handshake should succeed");
        hello(&mut ws, "0912", "Sara").await;

        warp::test::request()
            .method("POST")
            .path("/customers/0912/score")
            .json(&serde_json::json!({ "score": 120 }))
            .reply(&app)
            .await;

        let response = warp::test::request()
            .method("GET")
            .path("/leaderboard?limit=1")
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let leaderboard: Vec<LeaderboardEntry> =
            serde_json::from_slice(response.body()).unwrap();
        assert_eq!(leaderboard.len(), 1);
        assert_eq!(leaderboard[0].rank, 1);
        assert_eq!(leaderboard[0].customer.progression.total_score, 120);
    }

    #[tokio::test]
    async fn test_http_endpoints_cors() {
        let app = create_test_app().await;

        let response = warp::test::request()
            .method("OPTIONS")
            .path("/health")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "GET")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        assert!(
            response
                .headers()
                .contains_key("access-control-allow-origin")
        );
    }

    #[tokio::test]
    async fn test_invalid_routes() {
        let app = create_test_app().await;

        let response = warp::test::request()
            .method("GET")
            .path("/invalid")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 404);
    }
}
