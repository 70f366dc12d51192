pub mod advance;
pub mod advancement;
pub mod batted_ball;
pub mod classify;
pub mod enhanced;
pub mod error;
pub mod game_state;
pub mod lineup;
pub mod outs;
pub mod pbp;
pub mod play;
pub mod schemas;
pub mod scoring;
pub mod traits;
