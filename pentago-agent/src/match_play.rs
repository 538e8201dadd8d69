//! Match play - multiple games between two agent configurations
//!
//! Level 2 - Phase-level implementation

use pentago_core::Player;
use serde::Serialize;

use crate::config::AgentConfig;
use crate::game_runner::{GameOutcome, GameRunner};

/// One finished game of a match
#[derive(Clone, Debug, Serialize)]
pub struct MatchGame {
    /// Game index within the match
    pub index: usize,
    /// True if the first configuration played white
    pub first_was_white: bool,
    pub outcome: GameOutcome,
}

impl MatchGame {
    /// Winner from the match's point of view: Some(true) if the first
    /// configuration won, None for a draw
    pub fn first_won(&self) -> Option<bool> {
        self.outcome
            .winner()
            .map(|winner| (winner == Player::White) == self.first_was_white)
    }
}

/// Result of a match (multiple games)
#[derive(Clone, Debug, Default, Serialize)]
pub struct MatchResult {
    pub first_wins: u32,
    pub second_wins: u32,
    pub draws: u32,
    /// Wins by whichever side played white
    pub white_wins: u32,
    pub games_played: u32,
    /// Average game length in plies
    pub avg_plies: f32,
    pub games: Vec<MatchGame>,
}

impl MatchResult {
    /// Score of the first configuration: wins = 1.0, draws = 0.5
    pub fn score_for_first(&self) -> f32 {
        self.first_wins as f32 + 0.5 * self.draws as f32
    }

    pub fn score_for_second(&self) -> f32 {
        self.second_wins as f32 + 0.5 * self.draws as f32
    }

    pub fn draw_rate(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.draws as f32 / self.games_played as f32
        }
    }
}

/// Play a match, alternating colours each game (Level 2 phase).
///
/// `on_game` runs after every finished game.
pub fn play_match<F>(
    first: &AgentConfig,
    second: &AgentConfig,
    games: usize,
    seed: u64,
    on_game: F,
) -> MatchResult
where
    F: Fn(&MatchGame) + Sync,
{
    let schedule = prepare_schedule(games);
    let played = execute_games(first, second, &schedule, seed, &on_game);
    aggregate_results(played)
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Which configuration is white in each game
fn prepare_schedule(games: usize) -> Vec<(usize, bool)> {
    (0..games).map(|i| (i, i % 2 == 0)).collect()
}

fn play_single_game(
    first: &AgentConfig,
    second: &AgentConfig,
    index: usize,
    first_was_white: bool,
    seed: u64,
) -> MatchGame {
    let runner = if first_was_white {
        GameRunner::new(first.clone(), second.clone())
    } else {
        GameRunner::new(second.clone(), first.clone())
    };
    let outcome = runner.play_game(seed.wrapping_add(index as u64));
    MatchGame {
        index,
        first_was_white,
        outcome,
    }
}

/// Execute games sequentially
#[cfg(not(feature = "parallel"))]
fn execute_games<F>(
    first: &AgentConfig,
    second: &AgentConfig,
    schedule: &[(usize, bool)],
    seed: u64,
    on_game: &F,
) -> Vec<MatchGame>
where
    F: Fn(&MatchGame) + Sync,
{
    schedule
        .iter()
        .map(|&(index, first_was_white)| {
            let game = play_single_game(first, second, index, first_was_white, seed);
            on_game(&game);
            game
        })
        .collect()
}

/// Execute games in parallel using rayon
#[cfg(feature = "parallel")]
fn execute_games<F>(
    first: &AgentConfig,
    second: &AgentConfig,
    schedule: &[(usize, bool)],
    seed: u64,
    on_game: &F,
) -> Vec<MatchGame>
where
    F: Fn(&MatchGame) + Sync,
{
    use rayon::prelude::*;

    schedule
        .par_iter()
        .map(|&(index, first_was_white)| {
            let game = play_single_game(first, second, index, first_was_white, seed);
            on_game(&game);
            game
        })
        .collect()
}

/// Aggregate game outcomes into a match result
fn aggregate_results(games: Vec<MatchGame>) -> MatchResult {
    let mut result = MatchResult::default();
    let mut total_plies = 0u32;

    for game in &games {
        match game.first_won() {
            Some(true) => result.first_wins += 1,
            Some(false) => result.second_wins += 1,
            None => result.draws += 1,
        }
        if game.outcome.winner() == Some(Player::White) {
            result.white_wins += 1;
        }
        total_plies += game.outcome.plies;
    }

    result.games_played = games.len() as u32;
    if result.games_played > 0 {
        result.avg_plies = total_plies as f32 / result.games_played as f32;
    }
    result.games = games;
    result
}
