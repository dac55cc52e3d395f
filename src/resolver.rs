//! Conflict analysis and move application for simultaneous-move turns.
//!
//! Every turn, White and Black each submit one [`HalfMove`] independently.
//! `analyze` decides whether the pair may both be applied, and if not,
//! which side (or both) is at fault. `apply` performs the actual board
//! mutation for an accepted pair, including the "White wins the contested
//! square" collision rule.

use crate::board::{Board, CastlingRights, Color, PieceKind, Square};
use crate::movegen::{self, ChessMove, HalfMove};

/// Outcome of analyzing one submitted pair of half-moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictOutcome {
    /// Both moves may be applied together.
    Accepted { white: ChessMove, black: ChessMove },
    /// Both sides are at fault (same-target, reciprocal capture,
    /// pawn-capture-escape, sliding-path collision, or both moves
    /// independently illegal).
    Mutual { reason: String },
    /// Exactly one side submitted an illegal move.
    OneSided { offender: Color, reason: String },
}

/// Returns `true` if the piece on `from` is a pawn making a capture
/// (its file changes between `from` and `to`).
fn is_pawn_capture(board: &Board, half: &HalfMove) -> bool {
    matches!(board.get(half.from), Some(p) if p.kind == PieceKind::Pawn) && half.from.file != half.to.file
}

/// Rules 1 through 5 of the conflict analyzer, ported directly from the
/// reference implementation's `process_moves`.
pub fn analyze(
    board: &Board,
    castling: &CastlingRights,
    en_passant: Option<Square>,
    white: &HalfMove,
    black: &HalfMove,
) -> ConflictOutcome {
    // Rule 1: same target square.
    if white.to == black.to {
        return ConflictOutcome::Mutual {
            reason: format!("Conflict: both moving to {}", white.to),
        };
    }

    // Rule 2: reciprocal captures.
    if white.to == black.from && black.to == white.from {
        return ConflictOutcome::Mutual { reason: "Conflict: reciprocal captures".to_string() };
    }

    // Rule 2.5 (pawn-capture-escape): if White targets Black's origin
    // square and it's a pawn capture, Black's piece has nowhere to have
    // gone except where it's headed, and this is a conflict — but the
    // same shape for a non-pawn piece is allowed to fall through (the
    // target square is simply wherever Black's piece used to be, which
    // is fine for a non-capturing piece that simply isn't there anymore).
    if white.to == black.from && is_pawn_capture(board, white) {
        return ConflictOutcome::Mutual {
            reason: format!("Conflict: pawn capture target on {} moved away", white.to),
        };
    }
    if black.to == white.from && is_pawn_capture(board, black) {
        return ConflictOutcome::Mutual {
            reason: format!("Conflict: pawn capture target on {} moved away", black.to),
        };
    }

    // Rule 3: sliding-path obstruction. A piece sliding through a square
    // the opponent is about to occupy (or vacate into) collides.
    let white_piece = board.get(white.from);
    let black_piece = board.get(black.from);
    let white_path = white_piece
        .map(|p| movegen::sliding_path(white.from, white.to, p.kind))
        .unwrap_or_default();
    let black_path = black_piece
        .map(|p| movegen::sliding_path(black.from, black.to, p.kind))
        .unwrap_or_default();

    if white_path.contains(&black.to) {
        return ConflictOutcome::Mutual {
            reason: format!("Path blocked: {} obstructs sliding piece", black.to),
        };
    }
    if black_path.contains(&white.to) {
        return ConflictOutcome::Mutual {
            reason: format!("Path blocked: {} obstructs sliding piece", white.to),
        };
    }

    // Rule 4 & 5: joint pseudo-legality, with the path-opening exception.
    let white_legal_now =
        movegen::match_pseudo_legal(board, Color::White, castling, en_passant, white).is_some();
    let black_legal_now =
        movegen::match_pseudo_legal(board, Color::Black, castling, en_passant, black).is_some();

    let white_valid = white_legal_now || path_opened(board, white_piece, white, black);
    let black_valid = black_legal_now || path_opened(board, black_piece, black, white);

    if !white_valid || !black_valid {
        let reason = "Not a legal chess move".to_string();
        return match (white_valid, black_valid) {
            (false, false) => ConflictOutcome::Mutual { reason },
            (false, true) => ConflictOutcome::OneSided { offender: Color::White, reason },
            (true, false) => ConflictOutcome::OneSided { offender: Color::Black, reason },
            (true, true) => unreachable!(),
        };
    }

    let white_resolved = movegen::match_pseudo_legal(board, Color::White, castling, en_passant, white)
        .unwrap_or_else(|| ChessMove::simple(white.from, white.to));
    let black_resolved = movegen::match_pseudo_legal(board, Color::Black, castling, en_passant, black)
        .unwrap_or_else(|| ChessMove::simple(black.from, black.to));

    ConflictOutcome::Accepted { white: white_resolved, black: black_resolved }
}

/// A move that is not pseudo-legal on its own may still be permitted if
/// the opponent's move clears the mover's path: the opponent vacates a
/// square that was blocking the slide, every other square along the path
/// is empty on the original board, and the destination is empty or held
/// by an enemy piece.
fn path_opened(board: &Board, piece: Option<crate::board::Piece>, mover: &HalfMove, opponent: &HalfMove) -> bool {
    let Some(piece) = piece else { return false };
    let path = movegen::sliding_path(mover.from, mover.to, piece.kind);
    if path.is_empty() {
        return false;
    }
    if !path.contains(&opponent.from) {
        return false;
    }
    if path.contains(&opponent.to) || opponent.to == mover.to {
        return false;
    }
    for &sq in &path {
        if sq == opponent.from {
            continue;
        }
        if board.get(sq).is_some() {
            return false;
        }
    }
    match board.get(mover.to) {
        None => true,
        Some(target) => target.color != piece.color,
    }
}

/// Applies an accepted pair of moves to `board`, returning the resulting
/// board. White's move is applied first; if both moves target the same
/// square as each other's origin (a collision that Rule 2 didn't catch,
/// since the targets differ), White's piece wins the contested square by
/// being placed back down after Black's move executes.
pub fn apply(board: &Board, white: &ChessMove, black: &ChessMove) -> Board {
    let orig_white_piece = board.get(white.from);
    let orig_black_piece = board.get(black.from);

    let mut working = board.clone();
    movegen::apply_move_to_board(&mut working, white, Color::White);

    let collision = white.to == black.from;
    if collision {
        working.set(black.from, orig_black_piece);
    }

    movegen::apply_move_to_board(&mut working, black, Color::Black);

    if collision {
        let kind = white.promotion.unwrap_or_else(|| orig_white_piece.map(|p| p.kind).unwrap_or(PieceKind::Pawn));
        working.set(white.to, Some(crate::board::Piece::new(kind, Color::White)));
    }

    working
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Piece;

    fn empty_with_kings() -> Board {
        let mut board = Board::default();
        board.set(Square::new(4, 0), Some(Piece::new(PieceKind::King, Color::White)));
        board.set(Square::new(4, 7), Some(Piece::new(PieceKind::King, Color::Black)));
        board
    }

    fn half(s: &str) -> HalfMove {
        HalfMove::parse(s).unwrap()
    }

    // P1 / scenario: clean double advance — both pawns move, no interaction.
    #[test]
    fn clean_double_advance_accepted() {
        let board = Board::starting_position();
        let castling = CastlingRights::default();
        let white = half("e2e4");
        let black = half("e7e5");
        let outcome = analyze(&board, &castling, None, &white, &black);
        assert!(matches!(outcome, ConflictOutcome::Accepted { .. }));
    }

    // Scenario: same-target conflict.
    #[test]
    fn same_target_is_mutual() {
        let mut board = empty_with_kings();
        board.set(Square::new(3, 3), Some(Piece::new(PieceKind::Queen, Color::White))); // d4
        board.set(Square::new(5, 5), Some(Piece::new(PieceKind::Queen, Color::Black))); // f6
        let castling = CastlingRights::default();
        let white = half("d4d5");
        let black = half("f6d5");
        // both target d5
        let outcome = analyze(&board, &castling, None, &white, &black);
        assert!(matches!(outcome, ConflictOutcome::Mutual { .. }));
    }

    // Scenario: reciprocal captures.
    #[test]
    fn reciprocal_capture_is_mutual() {
        let mut board = empty_with_kings();
        board.set(Square::new(3, 3), Some(Piece::new(PieceKind::Rook, Color::White))); // d4
        board.set(Square::new(3, 4), Some(Piece::new(PieceKind::Rook, Color::Black))); // d5
        let castling = CastlingRights::default();
        let white = half("d4d5");
        let black = half("d5d4");
        let outcome = analyze(&board, &castling, None, &white, &black);
        assert!(matches!(outcome, ConflictOutcome::Mutual { .. }));
    }

    // Scenario: pawn-capture-escape.
    #[test]
    fn pawn_capture_escape_is_mutual() {
        let mut board = empty_with_kings();
        board.set(Square::new(4, 3), Some(Piece::new(PieceKind::Pawn, Color::White))); // e4
        board.set(Square::new(3, 4), Some(Piece::new(PieceKind::Pawn, Color::Black))); // d5
        let castling = CastlingRights::default();
        let white = half("e4d5"); // captures toward d5
        let black = half("d5d4"); // escapes forward
        let outcome = analyze(&board, &castling, None, &white, &black);
        assert!(matches!(outcome, ConflictOutcome::Mutual { .. }));
    }

    // Scenario: non-pawn "capture-escape" is allowed through (not a conflict).
    #[test]
    fn non_pawn_target_escape_is_not_mutual() {
        let mut board = empty_with_kings();
        board.set(Square::new(3, 3), Some(Piece::new(PieceKind::Rook, Color::White))); // d4
        board.set(Square::new(3, 4), Some(Piece::new(PieceKind::Knight, Color::Black))); // d5
        let castling = CastlingRights::default();
        let white = half("d4d5");
        let black = half("d5b4"); // knight hops away, not a same/reciprocal target
        let outcome = analyze(&board, &castling, None, &white, &black);
        assert!(matches!(outcome, ConflictOutcome::Accepted { .. }));
    }

    // Scenario: sliding-path obstruction — Black moves into a square White's
    // rook must slide through.
    #[test]
    fn sliding_path_collision_is_mutual() {
        let mut board = empty_with_kings();
        board.set(Square::new(0, 3), Some(Piece::new(PieceKind::Rook, Color::White))); // a4
        board.set(Square::new(2, 4), Some(Piece::new(PieceKind::Pawn, Color::Black))); // c5
        let castling = CastlingRights::default();
        let white = half("a4d4"); // slides through b4, c4
        let black = half("c5c4"); // moves onto c4, inside White's path
        let outcome = analyze(&board, &castling, None, &white, &black);
        assert!(matches!(outcome, ConflictOutcome::Mutual { .. }));
    }

    // Scenario: collision tiebreak — White wins the contested square.
    #[test]
    fn collision_applier_white_wins_square() {
        let mut board = empty_with_kings();
        board.set(Square::new(0, 0), Some(Piece::new(PieceKind::Rook, Color::White))); // a1
        board.set(Square::new(3, 0), Some(Piece::new(PieceKind::Rook, Color::Black))); // d1
        let white_mv = ChessMove::simple(Square::new(0, 0), Square::new(3, 0)); // a1-d1
        let black_mv = ChessMove::simple(Square::new(3, 0), Square::new(0, 0)); // d1-a1
        // This shape is a reciprocal capture that `analyze` would reject
        // outright; exercising `apply` directly checks the collision
        // mechanics in isolation from that earlier rule.
        let result = apply(&board, &white_mv, &black_mv);
        let white_on_d1 = result.get(Square::new(3, 0));
        assert_eq!(white_on_d1.map(|p| p.color), Some(Color::White));
    }

    // P3: resolving never panics on arbitrary (possibly nonsensical) input.
    #[test]
    fn analyze_does_not_panic_on_empty_squares() {
        let board = empty_with_kings();
        let castling = CastlingRights::default();
        let white = half("a1a2");
        let black = half("h8h7");
        let outcome = analyze(&board, &castling, None, &white, &black);
        assert!(matches!(outcome, ConflictOutcome::Mutual { .. }));
    }

    // One-sided illegality: White's move is not pseudo-legal, Black's is fine.
    #[test]
    fn one_sided_illegal_move() {
        let board = Board::starting_position();
        let castling = CastlingRights::default();
        let white = half("e2e5"); // illegal triple-step
        let black = half("e7e5");
        let outcome = analyze(&board, &castling, None, &white, &black);
        assert_eq!(outcome, ConflictOutcome::OneSided { offender: Color::White, reason: "Not a legal chess move".to_string() });
    }

    // Scenario 6: a slide that's blocked on the original board becomes
    // legal because the opponent's own move vacates the blocking square
    // this same turn.
    #[test]
    fn path_opened_permits_previously_blocked_slide() {
        let mut board = empty_with_kings();
        board.set(Square::new(0, 0), Some(Piece::new(PieceKind::Rook, Color::White))); // a1
        board.set(Square::new(2, 0), Some(Piece::new(PieceKind::Knight, Color::Black))); // c1
        let rook = board.get(Square::new(0, 0));
        let mover = half("a1d1"); // blocked by the knight on c1
        let opponent = half("c1b3"); // vacates c1
        assert!(path_opened(&board, rook, &mover, &opponent));
    }

    // Same shape, end to end through `analyze`: White's slide isn't
    // pseudo-legal on the original board but is accepted once the
    // path-opening exception applies.
    #[test]
    fn analyze_accepts_slide_opened_by_opponents_move() {
        let mut board = empty_with_kings();
        board.set(Square::new(0, 0), Some(Piece::new(PieceKind::Rook, Color::White))); // a1
        board.set(Square::new(2, 0), Some(Piece::new(PieceKind::Knight, Color::Black))); // c1
        let castling = CastlingRights::default();
        let white = half("a1d1");
        let black = half("c1b3");
        let outcome = analyze(&board, &castling, None, &white, &black);
        assert!(matches!(outcome, ConflictOutcome::Accepted { .. }));
    }

    fn count_pieces(board: &Board) -> usize {
        board.squares.iter().filter(|s| s.is_some()).count()
    }

    // P8: when the analyzer accepts a pair, applying it never panics and
    // conserves piece count minus captures.
    #[test]
    fn apply_conserves_piece_count_with_no_captures() {
        let board = Board::starting_position();
        let before = count_pieces(&board);
        let white_mv = ChessMove::simple(Square::new(4, 1), Square::new(4, 3)); // e2e4
        let black_mv = ChessMove::simple(Square::new(4, 6), Square::new(4, 4)); // e7e5
        let result = apply(&board, &white_mv, &black_mv);
        assert_eq!(count_pieces(&result), before);
    }

    // P8: the "White wins the contested square" collision captures exactly
    // the one piece on the contested square, never more or less.
    #[test]
    fn apply_collision_removes_exactly_the_contested_piece() {
        let mut board = empty_with_kings();
        board.set(Square::new(0, 0), Some(Piece::new(PieceKind::Rook, Color::White))); // a1
        board.set(Square::new(3, 0), Some(Piece::new(PieceKind::Rook, Color::Black))); // d1
        let before = count_pieces(&board);
        let white_mv = ChessMove::simple(Square::new(0, 0), Square::new(3, 0)); // a1-d1
        let black_mv = ChessMove::simple(Square::new(3, 0), Square::new(0, 0)); // d1-a1
        let result = apply(&board, &white_mv, &black_mv);
        assert_eq!(count_pieces(&result), before - 1);
    }
}
