//! Pentago-Swap Core - Game engine and threat analysis
//!
//! This crate provides the core game logic for Pentago-Swap:
//! - Board geometry (quadrants, swaps, compile-time win masks)
//! - Packed move encoding
//! - Bitboard game state with apply/undo and threat queries
//! - Threat filter that screens candidate moves into danger tiers
//! - Position evaluation and a CPU alpha-beta AI
//! - Adapter for external board representations

pub mod board;
pub mod error;
pub mod moves;
pub mod game;
pub mod external;
pub mod threat;
pub mod eval;
pub mod ai;

// Re-exports for convenient access
pub use board::{Quadrant, BOARD_SIZE, MAX_PLIES, QUAD_SWAPS, WIN_MASKS};
pub use error::{BoardError, MoveError};
pub use moves::{Move, Placement, MAX_PRIORITY};
pub use game::{Bitboard, GameResult, MoveStack, Player};
pub use external::{Cell, ExternalBoard, GridBoard};
pub use threat::{FilterConfig, Screening, ThreatFilter, Verdict};
pub use eval::{evaluate, Heuristics, WIN_VALUE};
pub use ai::AlphaBetaAI;
