use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::game::{GameOutcome, GameState};

use super::agent::Agent;

/// Center, corners, then edges: good moves first for better pruning.
const MOVE_ORDER: [usize; 9] = [4, 0, 2, 6, 8, 1, 3, 5, 7];

/// Larger than any reachable score.
const INF: i32 = 1_000;
const WIN_SCORE: i32 = 100;

/// Perfect-play opponent: full-depth negamax with alpha-beta pruning.
///
/// Wins sooner and loses later where it can. Moves that score equally are
/// picked at random so games against it vary.
pub struct NegamaxAgent {
    rng: StdRng,
}

impl NegamaxAgent {
    pub fn new() -> Self {
        NegamaxAgent {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        NegamaxAgent {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Exact score of every legal move from the mover's perspective.
    pub fn score_moves(&self, state: &GameState) -> Vec<(usize, i32)> {
        let legal = state.legal_actions();
        MOVE_ORDER
            .iter()
            .filter(|pos| legal.contains(pos))
            .filter_map(|&pos| {
                let next = state.apply_move(pos).ok()?;
                Some((pos, -negamax(&next, 1, -INF, INF)))
            })
            .collect()
    }

    fn best_move(&mut self, state: &GameState) -> usize {
        let scored = self.score_moves(state);
        assert!(!scored.is_empty(), "No legal actions available");

        let best_score = scored.iter().map(|&(_, s)| s).max().unwrap_or(0);
        let best: Vec<usize> = scored
            .iter()
            .filter(|&&(_, s)| s == best_score)
            .map(|&(pos, _)| pos)
            .collect();
        best[self.rng.random_range(0..best.len())]
    }
}

impl Default for NegamaxAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn negamax(state: &GameState, ply: i32, mut alpha: i32, beta: i32) -> i32 {
    match state.outcome() {
        // The player who just moved won, so the side to move has lost.
        Some(GameOutcome::Winner(_)) => return -(WIN_SCORE - ply),
        Some(GameOutcome::Draw) => return 0,
        None => {}
    }

    let legal = state.legal_actions();
    let mut best = -INF;

    for &pos in &MOVE_ORDER {
        if !legal.contains(&pos) {
            continue;
        }
        let Ok(next) = state.apply_move(pos) else {
            continue;
        };
        let score = -negamax(&next, ply + 1, -beta, -alpha);
        best = best.max(score);
        alpha = alpha.max(score);
        if alpha >= beta {
            break;
        }
    }

    best
}

impl Agent for NegamaxAgent {
    fn select_action(&mut self, state: &GameState, _training: bool) -> usize {
        self.best_move(state)
    }

    fn name(&self) -> &str {
        "Negamax"
    }
}
