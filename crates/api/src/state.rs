use std::sync::Arc;

use crate::auth::JwtService;
use crate::config::ServerConfig;
use crate::datasource::MarketApi;
use crate::gql::metrics::OperationMetrics;
use crate::rate_limit::BetRateLimiter;

#[derive(Clone)]
pub struct AppState {
    market_api: Arc<dyn MarketApi>,
    config: Arc<ServerConfig>,
    jwt_service: JwtService,
    bet_limiter: BetRateLimiter,
    metrics: OperationMetrics,
}

impl AppState {
    pub fn new(market_api: Arc<dyn MarketApi>, config: ServerConfig) -> Self {
        let jwt_service = JwtService::new(&config.auth);
        let bet_limiter = BetRateLimiter::new(config.bet_rate_limit);

        Self {
            market_api,
            config: Arc::new(config),
            jwt_service,
            bet_limiter,
            metrics: OperationMetrics::new(),
        }
    }

    pub fn market_api(&self) -> &Arc<dyn MarketApi> {
        &self.market_api
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn bet_limiter(&self) -> &BetRateLimiter {
        &self.bet_limiter
    }

    pub fn metrics(&self) -> &OperationMetrics {
        &self.metrics
    }
}
