pub mod bets;
pub mod leaderboard;
pub mod liquidity;
pub mod markets;
pub mod oracles;
pub mod trades;
pub mod users;

pub use bets::CreateBet;
pub use leaderboard::{LeaderboardPeriod, LEADERBOARD_SIZE};
pub use markets::{CreateMarket, MarketFilter, MarketState};
