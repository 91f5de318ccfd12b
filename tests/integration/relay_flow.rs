//! End-to-end relay tests against the in-memory contract.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tower::ServiceExt;

use scratcher_house::relay::{self, RelayClient, RelayState};
use scratcher_house::strategy::offer::NegotiationConfig;
use scratcher_house::strategy::sampler::FixedSampler;
use scratcher_house::strategy::HouseNegotiator;
use scratcher_house::types::GameState;

use crate::mock_contract::{MockContract, SentTx};

/// Router plus a handle on the contract behind it. Offers are priced at
/// the middle of the active band.
fn setup(contract: MockContract) -> (Router, Arc<MockContract>) {
    let contract = Arc::new(contract);
    let negotiator =
        HouseNegotiator::with_sampler(NegotiationConfig::default(), FixedSampler(dec!(0.5)));
    let state = Arc::new(RelayState::new(contract.clone(), negotiator));
    (relay::build_router(state), contract)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_generate_offer_after_round_one() {
    let (app, contract) =
        setup(MockContract::new().with_game(1, GameState::Round1Negotiation, [0, 0, 0]));

    let resp = app
        .clone()
        .oneshot(post_json("/api/house/generate-offer", r#"{"gameId":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["decision"]["proposal"]["strategy"], "NORMAL_EV_VARIABLE");
    assert_eq!(json["decision"]["offerFixedPoint"], "610000");

    assert_eq!(
        contract.sent(),
        vec![SentTx::SetOffer { game_id: 1, amount: 610_000 }]
    );

    let resp = app.oneshot(get("/api/games/1/offers")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["round1"].as_f64(), Some(0.61));
    assert!(json["round2"].is_null());
}

#[tokio::test]
async fn test_generate_offer_high_ev_round_two() {
    // 1.00 + 0.50 revealed, plus 0.60 continuation = 2.10 EV.
    let (app, contract) = setup(MockContract::new().with_game(
        2,
        GameState::Round2Negotiation,
        [1_000_000, 500_000, 0],
    ));

    let resp = app
        .oneshot(post_json("/api/house/generate-offer", r#"{"gameId":2}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["decision"]["round"], 2);
    assert_eq!(json["decision"]["proposal"]["strategy"], "HIGH_EV_CONSERVATIVE");

    // 80% of 2.10
    assert_eq!(
        contract.game(2).unwrap().offered_payouts,
        [0, 1_680_000, 0]
    );
}

#[tokio::test]
async fn test_duplicate_offer_is_conflict() {
    let (app, contract) =
        setup(MockContract::new().with_game(3, GameState::Round1Negotiation, [200_000, 0, 0]));

    let first = app
        .clone()
        .oneshot(post_json("/api/house/generate-offer", r#"{"gameId":3}"#))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json("/api/house/generate-offer", r#"{"gameId":3}"#))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(contract.sent().len(), 1);
}

#[tokio::test]
async fn test_concurrent_generate_single_submission() {
    let (app, contract) =
        setup(MockContract::new().with_game(4, GameState::Round1Negotiation, [0, 0, 0]));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.oneshot(post_json("/api/house/generate-offer", r#"{"gameId":4}"#))
                .await
                .unwrap()
                .status()
        }));
    }

    let mut ok = 0;
    for h in handles {
        match h.await.unwrap() {
            StatusCode::OK => ok += 1,
            status => assert_eq!(status, StatusCode::CONFLICT),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(contract.sent().len(), 1);
}

#[tokio::test]
async fn test_generate_offer_outside_negotiation() {
    let (app, contract) =
        setup(MockContract::new().with_game(5, GameState::AwaitingRandomnessRound2, [0, 0, 0]));

    let resp = app
        .oneshot(post_json("/api/house/generate-offer", r#"{"gameId":5}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp).await;
    assert!(json["error"].as_str().unwrap().contains("negotiation"));
    assert!(contract.sent().is_empty());
}

#[tokio::test]
async fn test_reverted_offer_can_be_retried() {
    let (app, contract) =
        setup(MockContract::new().with_game(6, GameState::Round1Negotiation, [0, 0, 0]));
    contract.set_revert(true);

    let resp = app
        .clone()
        .oneshot(post_json("/api/house/generate-offer", r#"{"gameId":6}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "Transaction failed");
    assert!(json["hash"].as_str().unwrap().starts_with("0x"));

    contract.set_revert(false);
    let resp = app
        .oneshot(post_json("/api/house/generate-offer", r#"{"gameId":6}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rpc_failure_is_server_error() {
    let (app, contract) =
        setup(MockContract::new().with_game(7, GameState::Round1Negotiation, [0, 0, 0]));
    contract.set_error("connection refused");

    let resp = app
        .oneshot(post_json("/api/house/accept-offer", r#"{"gameId":7}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "Server error");
    assert!(json["details"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_manual_offer_then_accept() {
    let (app, contract) =
        setup(MockContract::new().with_game(8, GameState::Round1Negotiation, [500_000, 0, 0]));

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/house/set-offer",
            r#"{"gameId":8,"offerAmount":0.987654321}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // Sub-micro precision is floored.
    assert_eq!(body_json(resp).await["offerAmount"], "987654");

    let resp = app
        .clone()
        .oneshot(post_json("/api/house/accept-offer", r#"{"gameId":8}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(contract.game(8).unwrap().state, GameState::Finished);

    let resp = app.oneshot(get("/api/offers")).await.unwrap();
    let json = body_json(resp).await;
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["gameId"], 8);
    assert_eq!(records[0]["round"], 1);
    assert!(records[0]["strategy"].is_null());
}

#[tokio::test]
async fn test_sub_micro_offer_is_rejected() {
    let (app, contract) =
        setup(MockContract::new().with_game(13, GameState::Round1Negotiation, [0, 0, 0]));

    let resp = app
        .oneshot(post_json(
            "/api/house/set-offer",
            r#"{"gameId":13,"offerAmount":0.0000009}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Invalid gameId or offerAmount");
    assert!(contract.sent().is_empty());
    assert_eq!(contract.game(13).unwrap().offered_payouts, [0, 0, 0]);
}

#[tokio::test]
async fn test_finished_game_releases_claims() {
    let contract = Arc::new(
        MockContract::new().with_game(12, GameState::Round1Negotiation, [0, 0, 0]),
    );
    let negotiator =
        HouseNegotiator::with_sampler(NegotiationConfig::default(), FixedSampler(dec!(0.5)));
    let state = Arc::new(RelayState::new(contract.clone(), negotiator));
    let app = relay::build_router(state.clone());

    let resp = app
        .clone()
        .oneshot(post_json("/api/house/generate-offer", r#"{"gameId":12}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(state.ledger.is_claimed(12, 1).await);

    let resp = app
        .oneshot(post_json("/api/house/accept-offer", r#"{"gameId":12}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(state.ledger.claim_count().await, 0);
    // The offer itself stays in the feed.
    assert_eq!(state.ledger.len().await, 1);
}

#[tokio::test]
async fn test_later_round_retires_earlier_claims() {
    let contract = Arc::new(
        MockContract::new().with_game(14, GameState::Round1Negotiation, [0, 0, 0]),
    );
    let negotiator =
        HouseNegotiator::with_sampler(NegotiationConfig::default(), FixedSampler(dec!(0.5)));
    let state = Arc::new(RelayState::new(contract.clone(), negotiator));
    let app = relay::build_router(state.clone());

    let resp = app
        .clone()
        .oneshot(post_json("/api/house/generate-offer", r#"{"gameId":14}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    contract.set_state(14, GameState::Round2Negotiation);
    let resp = app
        .oneshot(post_json("/api/house/generate-offer", r#"{"gameId":14}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!state.ledger.is_claimed(14, 1).await);
    assert!(state.ledger.is_claimed(14, 2).await);
    assert_eq!(state.ledger.claim_count().await, 1);
}

#[tokio::test]
async fn test_play_round() {
    let (app, contract) =
        setup(MockContract::new().with_game(9, GameState::Round1Negotiation, [0, 0, 0]));

    let resp = app
        .oneshot(post_json(
            "/api/house/play-round",
            r#"{"gameId":9,"cellIndexes":[3,4,5]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        contract.sent(),
        vec![SentTx::Play { game_id: 9, cells: [3, 4, 5] }]
    );
    assert_eq!(
        contract.game(9).unwrap().state,
        GameState::AwaitingRandomnessRound2
    );
}

#[tokio::test]
async fn test_request_validation() {
    let (app, contract) = setup(MockContract::new());

    let cases = [
        ("/api/house/set-offer", r#"{"gameId":0,"offerAmount":1}"#),
        ("/api/house/set-offer", r#"{"gameId":1,"offerAmount":-2}"#),
        ("/api/house/set-offer", r#"{"gameId":1,"offerAmount":0.0000001}"#),
        ("/api/house/set-offer", r#"{"gameId":1}"#),
        ("/api/house/generate-offer", r#"{"gameId":-1}"#),
        ("/api/house/accept-offer", r#"{}"#),
        ("/api/house/play-round", r#"{"gameId":1,"cellIndexes":[1,2,12]}"#),
    ];
    for (uri, body) in cases {
        let resp = app.clone().oneshot(post_json(uri, body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri} {body}");
        assert!(body_json(resp).await["error"].is_string());
    }
    assert!(contract.sent().is_empty());
}

#[tokio::test]
async fn test_relay_client_round_trip() {
    let contract = Arc::new(
        MockContract::new()
            .with_game(10, GameState::Round1Negotiation, [0, 0, 0])
            .with_game(11, GameState::Round1Negotiation, [500_000, 0, 0])
            .with_game(15, GameState::Round1Negotiation, [0, 0, 0]),
    );
    let negotiator =
        HouseNegotiator::with_sampler(NegotiationConfig::default(), FixedSampler(dec!(0)));
    let state = Arc::new(RelayState::new(contract.clone(), negotiator));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(relay::serve_listener(listener, state, async move {
        let _ = stop_rx.await;
    }));

    let client = RelayClient::new(&format!("http://{addr}")).unwrap();
    assert!(client.health().await.unwrap());

    // 80% of 0.61 = 0.488, rounded to 0.49.
    let receipt = client.generate_offer(10).await.unwrap();
    assert!(receipt.success);
    assert_eq!(
        contract.sent(),
        vec![SentTx::SetOffer { game_id: 10, amount: 490_000 }]
    );

    let offers = client.game_offers(10).await.unwrap();
    assert_eq!(offers.round1, Some(dec!(0.49)));

    let err = client.generate_offer(10).await.unwrap_err();
    assert!(err.to_string().contains("409"));

    let err = client.game_offers(404).await.unwrap_err();
    assert!(err.to_string().contains("Server error"));

    // Manual pricing, round play and acceptance on their own games.
    let receipt = client.set_offer(11, dec!(0.75)).await.unwrap();
    assert!(receipt.success);
    assert_eq!(receipt.offer_amount.as_deref(), Some("750000"));

    let receipt = client.play_round(15, [0, 4, 8]).await.unwrap();
    assert!(receipt.success);
    assert!(receipt.offer_amount.is_none());
    assert_eq!(
        contract.game(15).unwrap().state,
        GameState::AwaitingRandomnessRound2
    );

    let receipt = client.accept_offer(11).await.unwrap();
    assert!(receipt.success);
    assert_eq!(contract.game(11).unwrap().state, GameState::Finished);

    assert_eq!(
        contract.sent()[1..],
        [
            SentTx::SetOffer { game_id: 11, amount: 750_000 },
            SentTx::Play { game_id: 15, cells: [0, 4, 8] },
            SentTx::Accept { game_id: 11 },
        ]
    );

    let _ = stop_tx.send(());
    server.await.unwrap().unwrap();
}
