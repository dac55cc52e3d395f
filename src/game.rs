//! Per-game state machine: player seating, move submission, turn
//! resolution, and termination. Owns one `Board` plus the bookkeeping
//! the conflict analyzer in `resolver` needs between turns.

use crate::board::{Board, CastlingRights, Color, Square};
use crate::movegen::{self, HalfMove};
use crate::resolver::{self, ConflictOutcome};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub type GameId = Uuid;
pub type PlayerId = String;

const ONE_SIDED_THRESHOLD: u32 = 3;
const ONE_SIDED_PENALTY_SECONDS: u64 = 30;
const STARTING_CLOCK_SECONDS: u64 = 600;
const THREEFOLD_REPETITION_COUNT: usize = 3;

/// A value tracked independently per side. Serializes as `{"white": .., "black": ..}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideFlags<T> {
    pub white: T,
    pub black: T,
}

impl<T: Clone> SideFlags<T> {
    pub fn get(&self, color: Color) -> T {
        match color {
            Color::White => self.white.clone(),
            Color::Black => self.black.clone(),
        }
    }

    pub fn set(&mut self, color: Color, value: T) {
        match color {
            Color::White => self.white = value,
            Color::Black => self.black = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IllegalityType {
    Mutual,
    OneSided,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyApplied {
    pub color: Color,
    pub seconds: u64,
}

/// Everything a turn's resolution produces — the wire-facing "result" record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveOutcome {
    pub valid_moves: SideFlags<bool>,
    pub processed: bool,
    pub illegal_reason: SideFlags<Option<String>>,
    pub illegality_type: Option<IllegalityType>,
    pub illegal_attempt: Option<u32>,
    pub penalty_applied: Option<PenaltyApplied>,
    pub turn_complete: bool,
    pub fen: String,
    /// Coordinate-notation echo of each side's submitted half-move, present
    /// whenever both halves were parsed (i.e. on every branch except the
    /// pre-turn immobility short-circuit). No SAN generator exists in this
    /// crate, so this is the same raw-string fallback the original falls
    /// back to when SAN rendering fails.
    pub intended_moves: SideFlags<Option<String>>,
    /// Equal to `intended_moves`, set only once a turn is actually applied.
    pub moves_san: SideFlags<Option<String>>,
    pub king_captured: Option<bool>,
    /// Set alongside `winner` when the game ends because one side has no
    /// pseudo-legal move available (the immobility-win case). Absent for a
    /// mutual-immobility draw, since there's no winner to label.
    pub checkmate: Option<bool>,
    pub winner: Option<Color>,
    pub draw: Option<bool>,
    pub draw_reason: Option<String>,
    pub game_over: bool,
}

impl ResolveOutcome {
    fn pending(white_valid: bool, black_valid: bool) -> Self {
        Self {
            valid_moves: SideFlags { white: white_valid, black: black_valid },
            processed: false,
            illegal_reason: SideFlags::default(),
            illegality_type: None,
            illegal_attempt: None,
            penalty_applied: None,
            turn_complete: false,
            fen: String::new(),
            intended_moves: SideFlags::default(),
            moves_san: SideFlags::default(),
            king_captured: None,
            checkmate: None,
            winner: None,
            draw: None,
            draw_reason: None,
            game_over: false,
        }
    }
}

/// A read-only view of a game's current state, suitable for broadcasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub game_id: GameId,
    pub fen: String,
    pub turn_number: u32,
    pub illegal_attempt: u32,
    pub ready: SideFlags<bool>,
    pub game_over: bool,
    pub winner: Option<Color>,
    pub win_reason: Option<String>,
    pub draw_reason: Option<String>,
    pub last_illegal_moves: SideFlags<Option<String>>,
    pub mutual_illegal_count: u64,
    pub one_sided_illegal_counts: SideFlags<u32>,
    pub one_sided_threshold: u32,
    pub penalty_seconds: u64,
    pub clock_seconds: SideFlags<u64>,
}

/// A single game's full state: board, seated players, pending submissions,
/// and the illegality/termination bookkeeping the conflict analyzer needs.
#[derive(Debug, Clone)]
pub struct Game {
    pub id: GameId,
    pub board: Board,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,

    pub players: SideFlags<Option<PlayerId>>,
    pending_moves: SideFlags<Option<HalfMove>>,

    pub turn_number: u32,
    pub illegal_attempt: u32,
    pub mutual_illegal_count: u64,
    pub one_sided_illegal_counts: SideFlags<u32>,
    pub clock_seconds: SideFlags<u64>,
    pub position_history: Vec<String>,
    pub last_illegal_moves: SideFlags<Option<String>>,

    pub game_over: bool,
    pub winner: Option<Color>,
    pub win_reason: Option<String>,
    pub draw_reason: Option<String>,
}

impl Game {
    pub fn new(id: GameId) -> Self {
        let board = Board::starting_position();
        let position_history = vec![board.to_placement_fen()];
        Self {
            id,
            board,
            castling: CastlingRights::default(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            players: SideFlags::default(),
            pending_moves: SideFlags::default(),
            turn_number: 1,
            illegal_attempt: 0,
            mutual_illegal_count: 0,
            one_sided_illegal_counts: SideFlags::default(),
            clock_seconds: SideFlags { white: STARTING_CLOCK_SECONDS, black: STARTING_CLOCK_SECONDS },
            position_history,
            last_illegal_moves: SideFlags::default(),
            game_over: false,
            winner: None,
            win_reason: None,
            draw_reason: None,
        }
    }

    /// Seats a new player: White first, then Black. Returns `None` once
    /// both seats are taken.
    pub fn assign_player(&mut self, player_id: PlayerId) -> Option<Color> {
        if self.players.white.is_none() {
            self.players.white = Some(player_id);
            Some(Color::White)
        } else if self.players.black.is_none() {
            self.players.black = Some(player_id);
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn is_ready(&self, color: Color) -> bool {
        self.pending_moves.get(color).is_some()
    }

    /// Records `color`'s submission for this turn. If both sides are now
    /// ready, resolves the turn and returns the outcome.
    pub fn submit_move(&mut self, color: Color, move_text: &str) -> Result<Option<ResolveOutcome>, String> {
        if self.game_over {
            return Err("Game is already over".to_string());
        }
        let seated = match color {
            Color::White => self.players.white.is_some(),
            Color::Black => self.players.black.is_some(),
        };
        if !seated {
            return Err("Color is not seated".to_string());
        }
        let half = HalfMove::parse(move_text)?;
        self.pending_moves.set(color, Some(half));
        debug!("game {}: {} submitted {}", self.id, color, half);

        if self.pending_moves.white.is_some() && self.pending_moves.black.is_some() {
            Ok(Some(self.resolve()))
        } else {
            Ok(None)
        }
    }

    fn take_position_key(&self) -> String {
        self.board.to_placement_fen()
    }

    fn fen(&self) -> String {
        self.board.to_fen(Color::White, &self.castling, self.en_passant, self.halfmove_clock, self.fullmove_number)
    }

    /// Checks whether either side has no pseudo-legal move available on
    /// the current board. Used both as the pre-turn short-circuit and as
    /// a post-turn termination check.
    fn immobility_result(&self) -> Option<(Option<Color>, Option<String>)> {
        let white_has_move = movegen::has_any_move(&self.board, Color::White, &self.castling, self.en_passant);
        let black_has_move = movegen::has_any_move(&self.board, Color::Black, &self.castling, self.en_passant);

        if !white_has_move && !black_has_move {
            Some((None, Some("mutual immobility".to_string())))
        } else if !white_has_move {
            Some((Some(Color::Black), None))
        } else if !black_has_move {
            Some((Some(Color::White), None))
        } else {
            None
        }
    }

    fn clear_pending(&mut self) {
        self.pending_moves = SideFlags::default();
    }

    /// Resolves one completed turn: both half-moves are present. Consumes
    /// them in every branch (accepted, illegal, or short-circuited by a
    /// pre-existing immobility) to satisfy the invariant that a resolved
    /// turn always leaves both submission slots empty.
    fn resolve(&mut self) -> ResolveOutcome {
        // Short-circuit: if the position was already immobile before this
        // turn's moves are even considered, end the game now, consuming
        // the just-arrived submissions rather than leaving them pending.
        if let Some((winner, draw_reason)) = self.immobility_result() {
            self.clear_pending();
            self.game_over = true;
            self.winner = winner;
            self.draw_reason = draw_reason.clone();
            let mut outcome = ResolveOutcome::pending(true, true);
            outcome.processed = true;
            outcome.turn_complete = true;
            outcome.fen = self.fen();
            outcome.checkmate = winner.map(|_| true);
            outcome.winner = winner;
            outcome.draw = Some(draw_reason.is_some());
            outcome.draw_reason = draw_reason;
            outcome.game_over = true;
            return outcome;
        }

        let white = self.pending_moves.white.expect("resolve called with both slots filled");
        let black = self.pending_moves.black.expect("resolve called with both slots filled");
        let intended_moves = SideFlags { white: Some(white.to_string()), black: Some(black.to_string()) };

        let outcome_result = resolver::analyze(&self.board, &self.castling, self.en_passant, &white, &black);

        let mut outcome = match outcome_result {
            ConflictOutcome::Mutual { reason } => {
                self.last_illegal_moves.white = Some(white.to_string());
                self.last_illegal_moves.black = Some(black.to_string());
                self.illegal_attempt += 1;
                self.mutual_illegal_count += 1;

                let mut o = ResolveOutcome::pending(false, false);
                o.processed = true;
                o.illegal_reason = SideFlags { white: Some(reason.clone()), black: Some(reason) };
                o.illegality_type = Some(IllegalityType::Mutual);
                o.illegal_attempt = Some(self.illegal_attempt);
                o
            }
            ConflictOutcome::OneSided { offender, reason } => {
                self.last_illegal_moves.set(offender, Some(match offender {
                    Color::White => white.to_string(),
                    Color::Black => black.to_string(),
                }));
                self.illegal_attempt += 1;

                let count = self.one_sided_illegal_counts.get(offender) + 1;
                self.one_sided_illegal_counts.set(offender, count);

                let mut penalty = None;
                if count >= ONE_SIDED_THRESHOLD {
                    let remaining = self.clock_seconds.get(offender).saturating_sub(ONE_SIDED_PENALTY_SECONDS);
                    self.clock_seconds.set(offender, remaining);
                    self.one_sided_illegal_counts.set(offender, 0);
                    penalty = Some(PenaltyApplied { color: offender, seconds: ONE_SIDED_PENALTY_SECONDS });
                }

                let mut valid = SideFlags { white: true, black: true };
                valid.set(offender, false);
                let mut illegal_reason = SideFlags::default();
                illegal_reason.set(offender, Some(reason));

                let mut o = ResolveOutcome::pending(valid.white, valid.black);
                o.processed = true;
                o.illegal_reason = illegal_reason;
                o.illegality_type = Some(IllegalityType::OneSided);
                o.illegal_attempt = Some(self.illegal_attempt);
                o.penalty_applied = penalty;
                o
            }
            ConflictOutcome::Accepted { white: white_move, black: black_move } => {
                let white_kind = self.board.get(white_move.from).map(|p| p.kind);
                let black_kind = self.board.get(black_move.from).map(|p| p.kind);
                self.board = resolver::apply(&self.board, &white_move, &black_move);
                self.update_castling_rights(&white_move, &black_move);
                self.en_passant = Self::double_push_target(&white_move, white_kind, Color::White)
                    .or_else(|| Self::double_push_target(&black_move, black_kind, Color::Black));
                self.illegal_attempt = 0;
                self.turn_number += 1;
                self.fullmove_number += 1;

                let mut o = ResolveOutcome::pending(true, true);
                o.processed = true;
                o.turn_complete = true;
                o.moves_san = intended_moves.clone();

                self.check_termination(&mut o);
                o
            }
        };

        self.clear_pending();
        outcome.fen = self.fen();
        outcome.intended_moves = intended_moves;
        outcome.game_over = self.game_over;
        outcome
    }

    /// If `mv` was a pawn's two-square advance, returns the square it
    /// skipped over (the en passant target). Only one side's double push
    /// can be recorded per turn, matching FEN's single en-passant field.
    fn double_push_target(mv: &movegen::ChessMove, kind: Option<crate::board::PieceKind>, color: Color) -> Option<Square> {
        if kind != Some(crate::board::PieceKind::Pawn) {
            return None;
        }
        let rank_diff = (mv.to.rank as i8 - mv.from.rank as i8).abs();
        if rank_diff != 2 {
            return None;
        }
        let ep_rank = (mv.from.rank as i8 + color.pawn_direction()) as u8;
        Some(Square::new(mv.from.file, ep_rank))
    }

    fn update_castling_rights(&mut self, white: &movegen::ChessMove, black: &movegen::ChessMove) {
        for mv in [white, black] {
            for sq in [mv.from, mv.to] {
                match (sq.file, sq.rank) {
                    (4, 0) => self.castling.white = crate::board::SideCastlingRights { kingside: false, queenside: false },
                    (4, 7) => self.castling.black = crate::board::SideCastlingRights { kingside: false, queenside: false },
                    (0, 0) => self.castling.white.queenside = false,
                    (7, 0) => self.castling.white.kingside = false,
                    (0, 7) => self.castling.black.queenside = false,
                    (7, 7) => self.castling.black.kingside = false,
                    _ => {}
                }
            }
        }
    }

    /// Termination ordering: king capture, then immobility, then
    /// insufficient material, then threefold repetition. Each step only
    /// runs if the game isn't already over.
    fn check_termination(&mut self, outcome: &mut ResolveOutcome) {
        let white_king = self.board.find_king(Color::White).is_some();
        let black_king = self.board.find_king(Color::Black).is_some();
        if !white_king || !black_king {
            self.game_over = true;
            outcome.king_captured = Some(true);
            if !white_king && !black_king {
                self.draw_reason = Some("mutual king capture".to_string());
                outcome.draw = Some(true);
                outcome.draw_reason = self.draw_reason.clone();
            } else if !black_king {
                self.winner = Some(Color::White);
                outcome.winner = Some(Color::White);
            } else {
                self.winner = Some(Color::Black);
                outcome.winner = Some(Color::Black);
            }
        }

        if !self.game_over
            && let Some((winner, draw_reason)) = self.immobility_result()
        {
            self.game_over = true;
            self.winner = winner;
            self.draw_reason = draw_reason.clone();
            outcome.checkmate = winner.map(|_| true);
            outcome.winner = winner;
            outcome.draw = Some(draw_reason.is_some());
            outcome.draw_reason = draw_reason;
        }

        if !self.game_over && movegen::is_insufficient_material(&self.board) {
            self.game_over = true;
            self.draw_reason = Some("insufficient material".to_string());
            outcome.draw = Some(true);
            outcome.draw_reason = self.draw_reason.clone();
        }

        if !self.game_over {
            let key = self.take_position_key();
            self.position_history.push(key.clone());
            let repetitions = self.position_history.iter().filter(|k| **k == key).count();
            if repetitions >= THREEFOLD_REPETITION_COUNT {
                self.game_over = true;
                self.draw_reason = Some("threefold repetition".to_string());
                outcome.draw = Some(true);
                outcome.draw_reason = self.draw_reason.clone();
            }
        }
    }

    pub fn resign(&mut self, color: Color) -> Result<(), String> {
        if self.game_over {
            return Err("Game is already over".to_string());
        }
        self.game_over = true;
        self.winner = Some(color.opponent());
        self.win_reason = Some("resignation".to_string());
        warn!("game {}: {} resigned", self.id, color);
        Ok(())
    }

    pub fn timeout(&mut self, color: Color) -> Result<(), String> {
        if self.game_over {
            return Err("Game is already over".to_string());
        }
        self.game_over = true;
        self.winner = Some(color.opponent());
        self.win_reason = Some("timeout".to_string());
        Ok(())
    }

    /// Decrements `color`'s clock by `dt` seconds, floored at zero. Does
    /// not itself declare a timeout — the caller decides when zero means
    /// the game is over and calls `timeout`.
    pub fn tick(&mut self, color: Color, dt: u64) {
        let remaining = self.clock_seconds.get(color).saturating_sub(dt);
        self.clock_seconds.set(color, remaining);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            game_id: self.id,
            fen: self.fen(),
            turn_number: self.turn_number,
            illegal_attempt: self.illegal_attempt,
            ready: SideFlags { white: self.is_ready(Color::White), black: self.is_ready(Color::Black) },
            game_over: self.game_over,
            winner: self.winner,
            win_reason: self.win_reason.clone(),
            draw_reason: self.draw_reason.clone(),
            last_illegal_moves: self.last_illegal_moves.clone(),
            mutual_illegal_count: self.mutual_illegal_count,
            one_sided_illegal_counts: self.one_sided_illegal_counts,
            one_sided_threshold: ONE_SIDED_THRESHOLD,
            penalty_seconds: ONE_SIDED_PENALTY_SECONDS,
            clock_seconds: self.clock_seconds,
        }
    }
}

/// The set of live games, each guarded by its own mutex so that
/// resolving one game's turn never blocks a lookup into another.
#[derive(Default)]
pub struct GameRegistry {
    games: Mutex<HashMap<GameId, Arc<Mutex<Game>>>>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_game(&self) -> GameId {
        let id = Uuid::new_v4();
        let game = Arc::new(Mutex::new(Game::new(id)));
        self.games.lock().expect("game registry mutex poisoned").insert(id, game);
        id
    }

    pub fn get_game(&self, id: GameId) -> Option<Arc<Mutex<Game>>> {
        self.games.lock().expect("game registry mutex poisoned").get(&id).cloned()
    }

    pub fn delete_game(&self, id: GameId) -> bool {
        self.games.lock().expect("game registry mutex poisoned").remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit_both(game: &mut Game, white: &str, black: &str) -> ResolveOutcome {
        game.submit_move(Color::White, white).unwrap();
        game.submit_move(Color::Black, black).unwrap().expect("both sides submitted")
    }

    // P2 / I1: a pending submission from only one side never resolves.
    #[test]
    fn single_submission_stays_pending() {
        let mut game = Game::new(Uuid::new_v4());
        let result = game.submit_move(Color::White, "e2e4").unwrap();
        assert!(result.is_none());
        assert!(game.is_ready(Color::White));
        assert!(!game.is_ready(Color::Black));
    }

    // I3: after resolution, both pending slots are empty regardless of outcome.
    #[test]
    fn pending_slots_clear_after_resolution() {
        let mut game = Game::new(Uuid::new_v4());
        submit_both(&mut game, "e2e4", "e7e5");
        assert!(!game.is_ready(Color::White));
        assert!(!game.is_ready(Color::Black));
    }

    // Scenario: clean double advance completes the turn.
    #[test]
    fn clean_turn_advances_turn_number() {
        let mut game = Game::new(Uuid::new_v4());
        let outcome = submit_both(&mut game, "e2e4", "e7e5");
        assert!(outcome.turn_complete);
        assert_eq!(game.turn_number, 2);
        assert_eq!(game.illegal_attempt, 0);
    }

    // Scenario: same-target conflict leaves the turn unresolved and counts
    // a mutual illegality without advancing turn_number.
    #[test]
    fn mutual_conflict_increments_counters_and_does_not_advance_turn() {
        let mut game = Game::new(Uuid::new_v4());
        game.board = Board::default();
        game.board.set(Square::new(4, 0), Some(crate::board::Piece::new(crate::board::PieceKind::King, Color::White)));
        game.board.set(Square::new(4, 7), Some(crate::board::Piece::new(crate::board::PieceKind::King, Color::Black)));
        game.board.set(Square::new(3, 3), Some(crate::board::Piece::new(crate::board::PieceKind::Queen, Color::White))); // d4
        game.board.set(Square::new(5, 5), Some(crate::board::Piece::new(crate::board::PieceKind::Queen, Color::Black))); // f6

        let outcome = submit_both(&mut game, "d4d5", "f6d5");
        assert!(!outcome.turn_complete);
        assert_eq!(outcome.illegality_type, Some(IllegalityType::Mutual));
        assert_eq!(game.turn_number, 1);
        assert_eq!(game.mutual_illegal_count, 1);
        assert!(!game.is_ready(Color::White));
        assert!(!game.is_ready(Color::Black));
    }

    // Scenario: threshold penalty after three one-sided illegal attempts.
    #[test]
    fn one_sided_threshold_applies_penalty() {
        let mut game = Game::new(Uuid::new_v4());
        for _ in 0..3 {
            let outcome = submit_both(&mut game, "a1a2", "e7e5");
            if outcome.penalty_applied.is_some() {
                assert_eq!(game.clock_seconds.white, STARTING_CLOCK_SECONDS - ONE_SIDED_PENALTY_SECONDS);
                return;
            }
        }
        panic!("expected the threshold penalty to trigger within three attempts");
    }

    // Scenario: king capture ends the game immediately — Black moves a
    // different piece, leaving its king on the square White's rook takes.
    #[test]
    fn king_capture_ends_game() {
        let mut game = Game::new(Uuid::new_v4());
        game.board = Board::default();
        game.board.set(Square::new(4, 0), Some(crate::board::Piece::new(crate::board::PieceKind::King, Color::White)));
        game.board.set(Square::new(0, 0), Some(crate::board::Piece::new(crate::board::PieceKind::Rook, Color::White)));
        game.board.set(Square::new(0, 7), Some(crate::board::Piece::new(crate::board::PieceKind::King, Color::Black)));
        game.board.set(Square::new(3, 6), Some(crate::board::Piece::new(crate::board::PieceKind::Pawn, Color::Black))); // d7
        let outcome = submit_both(&mut game, "a1a8", "d7d6");
        assert!(game.game_over);
        assert_eq!(outcome.king_captured, Some(true));
        assert_eq!(outcome.winner, Some(Color::White));
    }

    // Scenario: resignation sets win_reason and ends the game.
    #[test]
    fn resign_ends_game_with_reason() {
        let mut game = Game::new(Uuid::new_v4());
        game.resign(Color::White).unwrap();
        assert!(game.game_over);
        assert_eq!(game.winner, Some(Color::Black));
        assert_eq!(game.win_reason.as_deref(), Some("resignation"));
        assert!(game.resign(Color::Black).is_err());
    }

    // Scenario: threefold repetition ends the game as a draw once the same
    // piece placement has recurred three times.
    #[test]
    fn threefold_repetition_ends_game_as_draw() {
        let mut game = Game::new(Uuid::new_v4());
        game.board = Board::default();
        game.board.set(Square::new(4, 0), Some(crate::board::Piece::new(crate::board::PieceKind::King, Color::White))); // e1
        game.board.set(Square::new(4, 7), Some(crate::board::Piece::new(crate::board::PieceKind::King, Color::Black))); // e8
        // Rooks that never move, purely to keep material sufficient so the
        // insufficient-material check doesn't end the game first.
        game.board.set(Square::new(0, 0), Some(crate::board::Piece::new(crate::board::PieceKind::Rook, Color::White))); // a1
        game.board.set(Square::new(0, 7), Some(crate::board::Piece::new(crate::board::PieceKind::Rook, Color::Black))); // a8
        game.position_history = vec![game.board.to_placement_fen()];

        submit_both(&mut game, "e1e2", "e8e7");
        submit_both(&mut game, "e2e1", "e7e8"); // back to the starting placement (2nd occurrence)
        submit_both(&mut game, "e1e2", "e8e7");
        let outcome = submit_both(&mut game, "e2e1", "e7e8"); // starting placement's 3rd occurrence

        assert!(game.game_over);
        assert_eq!(game.draw_reason.as_deref(), Some("threefold repetition"));
        assert_eq!(outcome.draw, Some(true));
        assert_eq!(outcome.draw_reason.as_deref(), Some("threefold repetition"));
    }

    // P4: the one-sided illegal counter never reaches the threshold — every
    // third offense triggers the penalty and resets it.
    #[test]
    fn one_sided_illegal_counter_stays_bounded_and_resets_on_penalty() {
        let mut game = Game::new(Uuid::new_v4());
        let mut penalty_turns = Vec::new();
        for turn in 1..=9 {
            let outcome = submit_both(&mut game, "a1a2", "e7e5");
            assert!(game.one_sided_illegal_counts.white < ONE_SIDED_THRESHOLD);
            if outcome.penalty_applied.is_some() {
                penalty_turns.push(turn);
            }
        }
        assert_eq!(penalty_turns, vec![3, 6, 9]);
    }

    // P5: a clock never goes negative; repeated ticks floor at zero.
    #[test]
    fn clock_never_goes_below_zero() {
        let mut game = Game::new(Uuid::new_v4());
        game.tick(Color::White, STARTING_CLOCK_SECONDS + 1000);
        assert_eq!(game.clock_seconds.white, 0);
        game.tick(Color::White, 50);
        assert_eq!(game.clock_seconds.white, 0);
    }

    // P6: snapshot is a pure function of state — two calls with no
    // intervening mutation produce equal results.
    #[test]
    fn snapshot_is_pure_without_mutation() {
        let game = Game::new(Uuid::new_v4());
        let a = game.snapshot();
        let b = game.snapshot();
        assert_eq!(a, b);
    }

    // P7: swapping which side's submission arrives first doesn't change the
    // resolver outcome for the same board and move pair.
    #[test]
    fn submission_order_does_not_change_outcome() {
        let mut game_a = Game::new(Uuid::new_v4());
        let outcome_a = submit_both(&mut game_a, "e2e4", "e7e5");

        let mut game_b = Game::new(Uuid::new_v4());
        game_b.submit_move(Color::Black, "e7e5").unwrap();
        let outcome_b = game_b.submit_move(Color::White, "e2e4").unwrap().expect("both sides submitted");

        assert_eq!(outcome_a.turn_complete, outcome_b.turn_complete);
        assert_eq!(outcome_a.fen, outcome_b.fen);
        assert_eq!(outcome_a.winner, outcome_b.winner);
    }

    #[test]
    fn registry_create_lookup_delete_round_trip() {
        let registry = GameRegistry::new();
        let id = registry.create_game();
        assert!(registry.get_game(id).is_some());
        assert!(registry.delete_game(id));
        assert!(registry.get_game(id).is_none());
    }
}
