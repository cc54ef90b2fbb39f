use async_graphql::{ErrorExtensions, Result, Subscription, ID};
use futures_util::{Stream, StreamExt};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;
use uuid::Uuid;

use crate::gql::error::{GqlError, GqlResultExt};
use crate::gql::types::{Market, PriceUpdate, Trade};

/// Events buffered per channel before slow subscribers start lagging.
pub const CHANNEL_CAPACITY: usize = 100;

/// Per-market channels for real-time updates
struct MarketChannels {
    updates: broadcast::Sender<Market>,
    prices: broadcast::Sender<PriceUpdate>,
    trades: broadcast::Sender<Trade>,
}

impl MarketChannels {
    fn new() -> Self {
        Self {
            updates: broadcast::channel(CHANNEL_CAPACITY).0,
            prices: broadcast::channel(CHANNEL_CAPACITY).0,
            trades: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    fn is_idle(&self) -> bool {
        self.updates.receiver_count() == 0
            && self.prices.receiver_count() == 0
            && self.trades.receiver_count() == 0
    }
}

/// All subscription channels
struct SubscriptionChannels {
    markets: HashMap<Uuid, MarketChannels>,
    /// Every trade on every market
    all_trades: broadcast::Sender<Trade>,
}

impl SubscriptionChannels {
    fn new() -> Self {
        Self {
            markets: HashMap::new(),
            all_trades: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    fn get_or_create_market(&mut self, market_id: Uuid) -> &MarketChannels {
        self.markets
            .entry(market_id)
            .or_insert_with(MarketChannels::new)
    }
}

static CHANNELS: Lazy<Arc<Mutex<SubscriptionChannels>>> =
    Lazy::new(|| Arc::new(Mutex::new(SubscriptionChannels::new())));

fn parse_market_id(market_id: &ID) -> Result<Uuid> {
    Uuid::parse_str(market_id.as_str()).extended()
}

/// Receiver as a GraphQL event stream. A lagging subscriber gets one
/// `LAGGED` error item and then resumes with the oldest retained event.
fn event_stream<T>(receiver: broadcast::Receiver<T>) -> impl Stream<Item = Result<T>>
where
    T: Clone + Send + 'static,
{
    BroadcastStream::new(receiver).map(|item| {
        item.map_err(|e| {
            let err = GqlError::from(e);
            warn!(error = %err, "Subscriber lagged");
            err.extend()
        })
    })
}

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Market state after every bet or liquidity change on `market_id`
    async fn market_update(
        &self,
        market_id: ID,
    ) -> Result<impl Stream<Item = Result<Market>>> {
        let market_uuid = parse_market_id(&market_id)?;

        let receiver = {
            let mut channels = CHANNELS.lock();
            channels.get_or_create_market(market_uuid).updates.subscribe()
        };

        Ok(event_stream(receiver))
    }

    /// Price ticks for `market_id`
    async fn price_change(
        &self,
        market_id: ID,
    ) -> Result<impl Stream<Item = Result<PriceUpdate>>> {
        let market_uuid = parse_market_id(&market_id)?;

        let receiver = {
            let mut channels = CHANNELS.lock();
            channels.get_or_create_market(market_uuid).prices.subscribe()
        };

        Ok(event_stream(receiver))
    }

    /// Executed trades, either on one market or on all of them
    async fn trade_stream(
        &self,
        market_id: Option<ID>,
    ) -> Result<impl Stream<Item = Result<Trade>>> {
        let receiver = match market_id {
            Some(id) => {
                let market_uuid = parse_market_id(&id)?;
                let mut channels = CHANNELS.lock();
                channels.get_or_create_market(market_uuid).trades.subscribe()
            }
            None => CHANNELS.lock().all_trades.subscribe(),
        };

        Ok(event_stream(receiver))
    }
}

// ============================================================================
// Publish functions - nothing is created here, so markets nobody watches
// never allocate channels.
// ============================================================================

/// Publish the latest state of a market to its `marketUpdate` subscribers
pub fn publish_market_update(market: Market) {
    let channels = CHANNELS.lock();
    if let Some(market_channels) = channels.markets.get(&market.market_id) {
        let _ = market_channels.updates.send(market);
    }
}

/// Publish a price tick to a market's `priceChange` subscribers
pub fn publish_price_update(market_id: Uuid, update: PriceUpdate) {
    let channels = CHANNELS.lock();
    if let Some(market_channels) = channels.markets.get(&market_id) {
        let _ = market_channels.prices.send(update);
    }
}

/// Publish a trade to the market's channel and the global trade channel
pub fn publish_trade(trade: Trade) {
    let channels = CHANNELS.lock();
    if let Some(market_channels) = channels.markets.get(&trade.market_uuid) {
        let _ = market_channels.trades.send(trade.clone());
    }
    let _ = channels.all_trades.send(trade);
}

/// Drop market channels that no longer have any subscriber.
/// Returns how many markets were removed.
pub fn prune_idle_channels() -> usize {
    let mut channels = CHANNELS.lock();
    let before = channels.markets.len();
    channels.markets.retain(|_, market| !market.is_idle());
    before - channels.markets.len()
}
