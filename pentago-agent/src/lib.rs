//! Pentago-Swap Agent - move selection under a time budget
//!
//! This crate turns a position into a move:
//! - Threat filtering of the candidate moves
//! - A search policy (MCTS, alpha-beta or a hybrid of both) over the survivors
//! - Self-play and match infrastructure
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: Agent::decide (orchestration)
//! - Level 2: play_match, threat screening (phases)
//! - Level 3: decision policies, single games (steps)
//! - Level 4: configuration, errors

mod agent;
mod config;
mod error;
mod game_runner;
mod match_play;
mod policy;

pub use agent::{Agent, Decision};
pub use config::{AgentConfig, PolicyKind};
pub use error::AgentError;
pub use game_runner::{GameOutcome, GameRunner};
pub use match_play::{play_match, MatchGame, MatchResult};
pub use policy::{select_policy, AlphaBetaPolicy, DecisionPolicy, MctsPolicy, SearchReport};
