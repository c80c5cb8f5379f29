pub mod auth;
pub mod handlers;
pub mod leaderboard;
pub mod notify;
pub mod stats;
