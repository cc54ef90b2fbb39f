mod common;

use std::collections::HashSet;

use async_graphql::Variables;
use chrono::{Duration, Utc};
use common::*;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_market_query_returns_derived_fields() {
    let app = setup_test_app();
    let market = seed_market(&app.store, "Will the merge ship this year?", 0.3);

    let query = format!(
        r#"{{ market(id: "{}") {{ id question probability yesPrice noPrice volume liquidity status oracle {{ name endpoint }} }} }}"#,
        market.id
    );
    let json = data(execute_graphql(&app.schema, &query, None, None).await);
    let m = &json["market"];

    assert_eq!(m["id"], market.id.to_string());
    assert_eq!(m["question"], "Will the merge ship this year?");
    assert_eq!(m["yesPrice"], 0.3);
    assert!((m["noPrice"].as_f64().unwrap() - 0.7).abs() < 1e-9);
    assert_eq!(m["volume"], "0");
    assert_eq!(m["liquidity"], "1000");
    assert_eq!(m["status"], "OPEN");
    assert_eq!(m["oracle"]["name"], "manual");
    assert_eq!(m["oracle"]["endpoint"], "manual://operator");
}

#[tokio::test]
async fn test_market_query_unknown_and_malformed_ids() {
    let app = setup_test_app();

    let query = format!(r#"{{ market(id: "{}") {{ id }} }}"#, Uuid::new_v4());
    let json = data(execute_graphql(&app.schema, &query, None, None).await);
    assert!(json["market"].is_null());

    let response =
        execute_graphql(&app.schema, r#"{ market(id: "not-a-uuid") { id } }"#, None, None).await;
    assert_eq!(error_code(&response).as_deref(), Some("BAD_USER_INPUT"));
}

#[tokio::test]
async fn test_markets_filter_order_and_limit() {
    let app = setup_test_app();
    let quiet = seed_market(&app.store, "Will rain fall in Lisbon?", 0.5);
    let busy = seed_market(&app.store, "Will RAIN fall in Porto?", 0.5);
    let closed = seed_market_with(
        &app.store,
        "Did rain fall yesterday?",
        0.5,
        50,
        Some(Utc::now() - Duration::hours(2)),
    );
    let other = app.store.add_oracle("weather-feed", "https://weather.example/feed");
    let mut foreign = seed_market(&app.store, "Will it be sunny?", 0.5);
    foreign.oracle_id = other.id;
    app.store.insert_market(foreign.clone());

    let trader = trader_user("0xtrader");
    data(place_bet(&app.schema, &trader, busy.id, "YES", "500").await);
    data(place_bet(&app.schema, &trader, quiet.id, "YES", "5").await);

    let query = r#"
        query Markets($filter: MarketFilter, $first: Int) {
            markets(filter: $filter, first: $first) { id status }
        }
    "#;

    let run = |filter: serde_json::Value, first: i64| {
        let schema = app.schema.clone();
        async move {
            let vars = Variables::from_json(json!({ "filter": filter, "first": first }));
            data(execute_graphql(&schema, query, Some(vars), None).await)
        }
    };

    let json = run(json!({ "search": "rain" }), 20).await;
    let ids: Vec<&str> = json["markets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 3);
    // Most traded first
    assert_eq!(ids[0], busy.id.to_string());
    assert_eq!(ids[1], quiet.id.to_string());

    let json = run(json!({ "status": "CLOSED" }), 20).await;
    assert_eq!(json["markets"][0]["id"], closed.id.to_string());
    assert_eq!(json["markets"].as_array().unwrap().len(), 1);

    let json = run(json!({ "oracleId": other.id.to_string() }), 20).await;
    assert_eq!(json["markets"][0]["id"], foreign.id.to_string());
    assert_eq!(json["markets"].as_array().unwrap().len(), 1);

    let json = run(json!({ "minLiquidity": "100" }), 20).await;
    assert_eq!(json["markets"].as_array().unwrap().len(), 3);

    let json = run(json!({}), 1).await;
    assert_eq!(json["markets"].as_array().unwrap().len(), 1);
    assert_eq!(json["markets"][0]["id"], busy.id.to_string());

    // Out-of-range page sizes are clamped rather than rejected
    let json = run(json!({}), 0).await;
    assert_eq!(json["markets"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_user_lookup_is_case_insensitive() {
    let app = setup_test_app();
    let market = seed_market(&app.store, "Will users be found?", 0.5);
    let trader = trader_user("0xDeadBeef");

    data(place_bet(&app.schema, &trader, market.id, "NO", "10").await);

    let json = data(
        execute_graphql(
            &app.schema,
            r#"{ user(address: "0xDEADBEEF") { id address rank } }"#,
            None,
            None,
        )
        .await,
    );
    assert_eq!(json["user"]["id"], trader.id.to_string());
    assert_eq!(json["user"]["address"], "0xdeadbeef");
    assert!(json["user"]["rank"].is_null());

    let json = data(
        execute_graphql(&app.schema, r#"{ user(address: "0xnobody") { id } }"#, None, None).await,
    );
    assert!(json["user"].is_null());
}

#[tokio::test]
async fn test_oracles_lists_registered_oracles_by_name() {
    let app = setup_test_app();
    app.store.add_oracle("chainlink", "https://oracle.example/chainlink");

    let json = data(execute_graphql(&app.schema, "{ oracles { name } }", None, None).await);
    let names: Vec<&str> = json["oracles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["chainlink", "manual"]);
}

#[tokio::test]
async fn test_trades_cursor_pagination() {
    let app = setup_test_app();
    let market = seed_market(&app.store, "Will pagination work?", 0.5);
    let trader = trader_user("0xpager");

    for amount in 1..=5 {
        data(place_bet(&app.schema, &trader, market.id, "YES", &amount.to_string()).await);
    }

    let query = r#"
        query Trades($id: ID!, $first: Int, $after: String) {
            market(id: $id) {
                trades(first: $first, after: $after) {
                    edges { cursor node { id createdAt } }
                    pageInfo { hasNextPage hasPreviousPage endCursor }
                }
            }
        }
    "#;

    let mut seen = Vec::new();
    let mut after: Option<String> = None;
    let mut pages = 0;
    loop {
        let vars = Variables::from_json(json!({
            "id": market.id.to_string(),
            "first": 2,
            "after": after,
        }));
        let json = data(execute_graphql(&app.schema, query, Some(vars), None).await);
        let trades = &json["market"]["trades"];
        pages += 1;

        assert_eq!(trades["pageInfo"]["hasPreviousPage"], after.is_some());
        for edge in trades["edges"].as_array().unwrap() {
            seen.push((
                edge["node"]["createdAt"].as_str().unwrap().to_string(),
                edge["node"]["id"].as_str().unwrap().to_string(),
            ));
        }

        if trades["pageInfo"]["hasNextPage"] == false {
            break;
        }
        after = trades["pageInfo"]["endCursor"].as_str().map(str::to_string);
        assert!(pages < 5, "pagination did not terminate");
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 5);
    let unique: HashSet<&String> = seen.iter().map(|(_, id)| id).collect();
    assert_eq!(unique.len(), 5);

    // Newest first
    let timestamps: Vec<chrono::DateTime<Utc>> = seen
        .iter()
        .map(|(ts, _)| ts.parse().unwrap())
        .collect();
    assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_trades_rejects_malformed_cursor() {
    let app = setup_test_app();
    let market = seed_market(&app.store, "Will bad cursors fail?", 0.5);

    let query = format!(
        r#"{{ market(id: "{}") {{ trades(after: "%%%") {{ edges {{ cursor }} }} }} }}"#,
        market.id
    );
    let response = execute_graphql(&app.schema, &query, None, None).await;
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn test_leaderboard_orders_by_volume_then_bet_count() {
    let app = setup_test_app();
    let market = seed_market(&app.store, "Who trades the most?", 0.5);

    let steady = trader_user("0xsteady");
    let whale = trader_user("0xwhale");
    let minnow = trader_user("0xminnow");

    data(place_bet(&app.schema, &steady, market.id, "YES", "100").await);
    data(place_bet(&app.schema, &steady, market.id, "NO", "200").await);
    data(place_bet(&app.schema, &whale, market.id, "YES", "300").await);
    data(place_bet(&app.schema, &minnow, market.id, "NO", "50").await);

    for period in ["DAY", "WEEK", "MONTH", "ALL_TIME"] {
        let query = format!(
            "{{ leaderboard(period: {period}) {{ address rank periodVolume betCount }} }}"
        );
        let json = data(execute_graphql(&app.schema, &query, None, None).await);
        let board = json["leaderboard"].as_array().unwrap();

        assert_eq!(board.len(), 3, "period {period}");
        assert_eq!(board[0]["address"], "0xsteady");
        assert_eq!(board[0]["rank"], 1);
        assert_eq!(board[0]["periodVolume"], "300");
        assert_eq!(board[0]["betCount"], 2);
        assert_eq!(board[1]["address"], "0xwhale");
        assert_eq!(board[1]["rank"], 2);
        assert_eq!(board[2]["address"], "0xminnow");
        assert_eq!(board[2]["rank"], 3);
    }
}
