mod common;

use common::*;
use serde_json::Value;

const TYPE_QUERY: &str = r#"
    query TypeShape($name: String!) {
        __type(name: $name) {
            name
            kind
            fields {
                name
                args { name defaultValue type { ...TypeRef } }
                type { ...TypeRef }
            }
            inputFields { name defaultValue type { ...TypeRef } }
            enumValues { name }
        }
    }

    fragment TypeRef on __Type {
        kind
        name
        ofType { kind name ofType { kind name ofType { kind name } } }
    }
"#;

async fn type_shape(name: &str) -> Value {
    let app = setup_test_app();
    let vars = async_graphql::Variables::from_json(serde_json::json!({ "name": name }));
    let json = data(execute_graphql(&app.schema, TYPE_QUERY, Some(vars), None).await);
    assert!(!json["__type"].is_null(), "type {name} missing from schema");
    json["__type"].clone()
}

/// Render a `__Type` reference in SDL notation, e.g. `[Market!]!`.
fn render(type_ref: &Value) -> String {
    match type_ref["kind"].as_str() {
        Some("NON_NULL") => format!("{}!", render(&type_ref["ofType"])),
        Some("LIST") => format!("[{}]", render(&type_ref["ofType"])),
        _ => type_ref["name"].as_str().unwrap_or_default().to_string(),
    }
}

fn field<'a>(shape: &'a Value, name: &str) -> &'a Value {
    shape["fields"]
        .as_array()
        .and_then(|fields| fields.iter().find(|f| f["name"] == name))
        .unwrap_or_else(|| panic!("field {name} missing"))
}

/// `name(arg: Type, ...): Return` for one field.
fn signature(shape: &Value, name: &str) -> String {
    let f = field(shape, name);
    let args: Vec<String> = f["args"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| format!("{}: {}", a["name"].as_str().unwrap(), render(&a["type"])))
        .collect();
    if args.is_empty() {
        format!("{name}: {}", render(&f["type"]))
    } else {
        format!("{name}({}): {}", args.join(", "), render(&f["type"]))
    }
}

#[tokio::test]
async fn test_query_fields_match_contract() {
    let query = type_shape("Query").await;

    assert_eq!(signature(&query, "market"), "market(id: ID!): Market");
    assert_eq!(
        signature(&query, "markets"),
        "markets(filter: MarketFilter, first: Int): [Market!]!"
    );
    assert_eq!(signature(&query, "user"), "user(address: String!): User");
    assert_eq!(
        signature(&query, "leaderboard"),
        "leaderboard(period: Period!): [User!]!"
    );
    assert_eq!(signature(&query, "oracles"), "oracles: [Oracle!]!");

    let first = field(&query, "markets")["args"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["name"] == "first")
        .cloned()
        .unwrap();
    assert_eq!(first["defaultValue"], "20");
}

#[tokio::test]
async fn test_mutation_and_subscription_fields_match_contract() {
    let mutation = type_shape("Mutation").await;
    assert_eq!(
        signature(&mutation, "placeBet"),
        "placeBet(input: BetInput!): BetResult!"
    );
    assert_eq!(
        signature(&mutation, "addLiquidity"),
        "addLiquidity(marketId: ID!, amount: BigInt!): LiquidityResult!"
    );
    assert_eq!(
        signature(&mutation, "createMarket"),
        "createMarket(input: MarketInput!): Market!"
    );

    let subscription = type_shape("Subscription").await;
    assert_eq!(
        signature(&subscription, "marketUpdate"),
        "marketUpdate(marketId: ID!): Market!"
    );
    assert_eq!(
        signature(&subscription, "priceChange"),
        "priceChange(marketId: ID!): PriceUpdate!"
    );
    assert_eq!(
        signature(&subscription, "tradeStream"),
        "tradeStream(marketId: ID): Trade!"
    );
}

#[tokio::test]
async fn test_market_type_shape() {
    let market = type_shape("Market").await;

    for (name, expected) in [
        ("id", "id: ID!"),
        ("question", "question: String!"),
        ("probability", "probability: Float!"),
        ("yesPrice", "yesPrice: Float!"),
        ("noPrice", "noPrice: Float!"),
        ("volume", "volume: BigInt!"),
        ("liquidity", "liquidity: BigInt!"),
        ("resolution", "resolution: DateTime"),
        ("status", "status: MarketStatus!"),
        ("createdAt", "createdAt: DateTime!"),
        ("oracle", "oracle: Oracle!"),
        ("bets", "bets: [Bet!]!"),
        (
            "trades",
            "trades(first: Int, after: String): TradeConnection!",
        ),
    ] {
        assert_eq!(signature(&market, name), expected);
    }

    // Internal ids never leak into the schema
    assert!(market["fields"]
        .as_array()
        .unwrap()
        .iter()
        .all(|f| f["name"] != "marketId" && f["name"] != "oracleId"));
}

#[tokio::test]
async fn test_inputs_and_enums() {
    let bet_input = type_shape("BetInput").await;
    let fields: Vec<String> = bet_input["inputFields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| format!("{}: {}", f["name"].as_str().unwrap(), render(&f["type"])))
        .collect();
    assert_eq!(
        fields,
        vec!["marketId: ID!", "outcome: Outcome!", "amount: BigInt!"]
    );

    let market_input = type_shape("MarketInput").await;
    let defaults: Vec<(String, Value)> = market_input["inputFields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| (f["name"].as_str().unwrap().to_string(), f["defaultValue"].clone()))
        .collect();
    assert!(defaults.contains(&("initialProbability".to_string(), Value::from("0.5"))));
    assert!(defaults.contains(&("initialLiquidity".to_string(), Value::from("\"0\""))));

    let filter = type_shape("MarketFilter").await;
    let names: Vec<&str> = filter["inputFields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["status", "search", "oracleId", "minLiquidity"]);

    for (name, values) in [
        ("Outcome", vec!["YES", "NO"]),
        ("Period", vec!["DAY", "WEEK", "MONTH", "ALL_TIME"]),
        ("MarketStatus", vec!["OPEN", "CLOSED"]),
    ] {
        let shape = type_shape(name).await;
        let actual: Vec<&str> = shape["enumValues"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["name"].as_str().unwrap())
            .collect();
        assert_eq!(actual, values, "enum {name}");
    }
}

#[tokio::test]
async fn test_introspection_can_be_disabled() {
    let mut config = test_config();
    config.introspection = false;
    let app = setup_with_config(config);

    let response = execute_graphql(&app.schema, "{ __schema { queryType { name } } }", None, None).await;
    assert!(!response.errors.is_empty());
}
