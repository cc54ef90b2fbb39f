pub mod bets;
pub mod leaderboard;
pub mod liquidity;
pub mod markets;
pub mod users;
