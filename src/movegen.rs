//! Pseudo-legal move generation for the SimChess resolver.
//!
//! SimChess never filters moves by king safety — both players submit
//! moves independently and simultaneously, so "does this leave my king
//! in check" has no meaning until after the opponent's move is known.
//! Legality here is purely piece-movement legality (FIDE Art. 3 minus
//! the check clause): a move is legal if it would be legal on an
//! otherwise-empty turn, full stop. The conflict analyzer in `resolver`
//! is what actually decides whether a pair of such moves may both be
//! applied.

use crate::board::{Board, CastlingRights, Color, Piece, PieceKind, Square};
use std::fmt;

// ---------------------------------------------------------------------------
// Move representations
// ---------------------------------------------------------------------------

/// A move as typed in over the wire: origin, destination, and an optional
/// promotion piece. Unvalidated — parsed straight from coordinate notation
/// (`e2e4`, `e7e8q`) without reference to any board state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl HalfMove {
    /// Parses coordinate notation: `<from><to>[promo]`, e.g. `e2e4`, `a7a8q`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.len() != 4 && s.len() != 5 {
            return Err(format!("malformed move '{}': expected 4 or 5 characters", s));
        }
        let from = Square::from_algebraic(&s[0..2])
            .ok_or_else(|| format!("invalid from square in '{}'", s))?;
        let to = Square::from_algebraic(&s[2..4])
            .ok_or_else(|| format!("invalid to square in '{}'", s))?;
        let promotion = if s.len() == 5 {
            let c = s.as_bytes()[4] as char;
            Some(
                PieceKind::from_promotion_letter(c.to_ascii_lowercase())
                    .ok_or_else(|| format!("invalid promotion piece '{}' in '{}'", c, s))?,
            )
        } else {
            None
        };
        Ok(HalfMove { from, to, promotion })
    }
}

impl fmt::Display for HalfMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion {
            write!(f, "{}", p.promotion_letter())?;
        }
        Ok(())
    }
}

/// A fully resolved move, with castling/en-passant flags determined by
/// matching against the pseudo-legal set. Produced by `match_pseudo_legal`
/// and consumed by `apply_move_to_board`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChessMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub is_castling: bool,
    pub is_en_passant: bool,
}

impl ChessMove {
    pub fn simple(from: Square, to: Square) -> Self {
        Self { from, to, promotion: None, is_castling: false, is_en_passant: false }
    }

    pub fn half_move(self) -> HalfMove {
        HalfMove { from: self.from, to: self.to, promotion: self.promotion }
    }
}

impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion {
            write!(f, "{}", p.promotion_letter())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pseudo-legal move generation
// ---------------------------------------------------------------------------

const ROOK_DIRS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DIRS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const QUEEN_DIRS: [(i8, i8); 8] = [
    (-1, 0), (1, 0), (0, -1), (0, 1),
    (-1, -1), (-1, 1), (1, -1), (1, 1),
];

/// Generates every pseudo-legal move for `turn` on `board`, given
/// `castling`/`en_passant` taken as a forced, caller-supplied state
/// (never mutated, never read off the board itself).
pub fn generate_pseudo_legal_moves(
    board: &Board,
    turn: Color,
    castling: &CastlingRights,
    en_passant: Option<Square>,
) -> Vec<ChessMove> {
    let mut moves = Vec::with_capacity(64);

    for rank in 0..8u8 {
        for file in 0..8u8 {
            let from = Square::new(file, rank);
            let piece = match board.get(from) {
                Some(p) if p.color == turn => p,
                _ => continue,
            };

            match piece.kind {
                PieceKind::King => generate_king_moves(board, from, turn, castling, &mut moves),
                PieceKind::Queen => generate_sliding_moves(board, from, turn, &QUEEN_DIRS, &mut moves),
                PieceKind::Rook => generate_sliding_moves(board, from, turn, &ROOK_DIRS, &mut moves),
                PieceKind::Bishop => generate_sliding_moves(board, from, turn, &BISHOP_DIRS, &mut moves),
                PieceKind::Knight => generate_knight_moves(board, from, turn, &mut moves),
                PieceKind::Pawn => generate_pawn_moves(board, from, turn, en_passant, &mut moves),
            }
        }
    }

    moves
}

fn generate_sliding_moves(
    board: &Board,
    from: Square,
    color: Color,
    directions: &[(i8, i8)],
    moves: &mut Vec<ChessMove>,
) {
    for &(df, dr) in directions {
        let mut cur = from;
        loop {
            match cur.offset(df, dr) {
                None => break,
                Some(to) => match board.get(to) {
                    None => {
                        moves.push(ChessMove::simple(from, to));
                        cur = to;
                    }
                    Some(target) => {
                        if target.color != color {
                            moves.push(ChessMove::simple(from, to));
                        }
                        break;
                    }
                },
            }
        }
    }
}

fn generate_knight_moves(board: &Board, from: Square, color: Color, moves: &mut Vec<ChessMove>) {
    let offsets: [(i8, i8); 8] = [
        (-2, -1), (-2, 1), (-1, -2), (-1, 2),
        (1, -2), (1, 2), (2, -1), (2, 1),
    ];
    for &(df, dr) in &offsets {
        if let Some(to) = from.offset(df, dr) {
            match board.get(to) {
                None => moves.push(ChessMove::simple(from, to)),
                Some(target) if target.color != color => moves.push(ChessMove::simple(from, to)),
                _ => {}
            }
        }
    }
}

/// King moves, including castling. Castling here only checks that the
/// squares are empty, the rights are set, and the rook is present — it
/// does not check whether the king passes through an attacked square,
/// since nothing in this crate computes attacked squares at all.
fn generate_king_moves(
    board: &Board,
    from: Square,
    color: Color,
    castling: &CastlingRights,
    moves: &mut Vec<ChessMove>,
) {
    for df in -1..=1i8 {
        for dr in -1..=1i8 {
            if df == 0 && dr == 0 {
                continue;
            }
            if let Some(to) = from.offset(df, dr) {
                match board.get(to) {
                    None => moves.push(ChessMove::simple(from, to)),
                    Some(target) if target.color != color => moves.push(ChessMove::simple(from, to)),
                    _ => {}
                }
            }
        }
    }

    let rights = castling.for_color(color);
    let rank = match color {
        Color::White => 0u8,
        Color::Black => 7u8,
    };
    let king_start = Square::new(4, rank);
    if from != king_start {
        return;
    }

    if rights.kingside {
        let f_sq = Square::new(5, rank);
        let g_sq = Square::new(6, rank);
        let rook_sq = Square::new(7, rank);
        let path_clear = board.get(f_sq).is_none() && board.get(g_sq).is_none();
        let rook_present = matches!(
            board.get(rook_sq),
            Some(Piece { kind: PieceKind::Rook, color: c }) if c == color
        );
        if path_clear && rook_present {
            moves.push(ChessMove { from, to: g_sq, promotion: None, is_castling: true, is_en_passant: false });
        }
    }

    if rights.queenside {
        let d_sq = Square::new(3, rank);
        let c_sq = Square::new(2, rank);
        let b_sq = Square::new(1, rank);
        let rook_sq = Square::new(0, rank);
        let path_clear = board.get(d_sq).is_none() && board.get(c_sq).is_none() && board.get(b_sq).is_none();
        let rook_present = matches!(
            board.get(rook_sq),
            Some(Piece { kind: PieceKind::Rook, color: c }) if c == color
        );
        if path_clear && rook_present {
            moves.push(ChessMove { from, to: c_sq, promotion: None, is_castling: true, is_en_passant: false });
        }
    }
}

fn generate_pawn_moves(
    board: &Board,
    from: Square,
    color: Color,
    en_passant: Option<Square>,
    moves: &mut Vec<ChessMove>,
) {
    let dir = color.pawn_direction();
    let start_rank = color.pawn_start_rank();
    let promo_rank = color.promotion_rank();

    let mut add_move = |from: Square, to: Square, is_ep: bool| {
        if to.rank == promo_rank {
            for kind in [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight] {
                moves.push(ChessMove { from, to, promotion: Some(kind), is_castling: false, is_en_passant: false });
            }
        } else {
            moves.push(ChessMove { from, to, promotion: None, is_castling: false, is_en_passant: is_ep });
        }
    };

    if let Some(one_ahead) = from.offset(0, dir)
        && board.get(one_ahead).is_none()
    {
        add_move(from, one_ahead, false);

        if from.rank == start_rank
            && let Some(two_ahead) = from.offset(0, dir * 2)
            && board.get(two_ahead).is_none()
        {
            add_move(from, two_ahead, false);
        }
    }

    for df in [-1i8, 1] {
        if let Some(to) = from.offset(df, dir) {
            if let Some(target) = board.get(to)
                && target.color != color
            {
                add_move(from, to, false);
            }
            if let Some(ep_sq) = en_passant
                && to == ep_sq
            {
                add_move(from, to, true);
            }
        }
    }
}

/// Finds the pseudo-legal move matching `half`, resolving castling/en
/// passant flags in the process. `None` means `half` is not a legal move
/// in this position for `turn`.
pub fn match_pseudo_legal(
    board: &Board,
    turn: Color,
    castling: &CastlingRights,
    en_passant: Option<Square>,
    half: &HalfMove,
) -> Option<ChessMove> {
    generate_pseudo_legal_moves(board, turn, castling, en_passant)
        .into_iter()
        .find(|m| m.from == half.from && m.to == half.to && m.promotion == half.promotion)
}

/// Applies a resolved move to a board (mutating it): handles castling's
/// rook move, en passant's captured-pawn removal, and promotion.
pub fn apply_move_to_board(board: &mut Board, mv: &ChessMove, color: Color) {
    let piece = board.get(mv.from).expect("apply_move_to_board: no piece on from square");

    board.set(mv.from, None);

    if mv.is_castling {
        let rank = mv.from.rank;
        if mv.to.file == 6 {
            let rook = board.get(Square::new(7, rank));
            board.set(Square::new(7, rank), None);
            board.set(Square::new(5, rank), rook);
        } else if mv.to.file == 2 {
            let rook = board.get(Square::new(0, rank));
            board.set(Square::new(0, rank), None);
            board.set(Square::new(3, rank), rook);
        }
    }

    if mv.is_en_passant {
        let captured_rank = match color {
            Color::White => mv.to.rank - 1,
            Color::Black => mv.to.rank + 1,
        };
        board.set(Square::new(mv.to.file, captured_rank), None);
    }

    let placed_piece = if let Some(promo_kind) = mv.promotion {
        Piece::new(promo_kind, color)
    } else {
        piece
    };
    board.set(mv.to, Some(placed_piece));
}

/// Returns the squares strictly between `from` and `to` for a sliding
/// piece (bishop/rook/queen) moving along a valid rank, file, or
/// diagonal. Empty for non-sliding kinds or a `to` that isn't reachable
/// along a straight line from `from`.
pub fn sliding_path(from: Square, to: Square, kind: PieceKind) -> Vec<Square> {
    if !matches!(kind, PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen) {
        return Vec::new();
    }
    let df = to.file as i8 - from.file as i8;
    let dr = to.rank as i8 - from.rank as i8;
    if df == 0 && dr == 0 {
        return Vec::new();
    }
    let is_diagonal = df.abs() == dr.abs();
    let is_straight = df == 0 || dr == 0;
    let diagonal_ok = is_diagonal && matches!(kind, PieceKind::Bishop | PieceKind::Queen);
    let straight_ok = is_straight && matches!(kind, PieceKind::Rook | PieceKind::Queen);
    if !diagonal_ok && !straight_ok {
        return Vec::new();
    }

    let step_f = df.signum();
    let step_r = dr.signum();
    let steps = df.abs().max(dr.abs());
    let mut path = Vec::new();
    let mut cur = from;
    for _ in 1..steps {
        cur = match cur.offset(step_f, step_r) {
            Some(sq) => sq,
            None => return Vec::new(),
        };
        path.push(cur);
    }
    path
}

/// Checks whether the position is a dead position per the usual
/// K-vs-K / K+minor-vs-K / same-colored-bishops exceptions.
pub fn is_insufficient_material(board: &Board) -> bool {
    let mut white_pieces: Vec<(PieceKind, Square)> = Vec::new();
    let mut black_pieces: Vec<(PieceKind, Square)> = Vec::new();

    for rank in 0..8u8 {
        for file in 0..8u8 {
            let sq = Square::new(file, rank);
            if let Some(piece) = board.get(sq) {
                match piece.color {
                    Color::White => white_pieces.push((piece.kind, sq)),
                    Color::Black => black_pieces.push((piece.kind, sq)),
                }
            }
        }
    }

    let white_non_king: Vec<_> = white_pieces.iter().filter(|(k, _)| *k != PieceKind::King).collect();
    let black_non_king: Vec<_> = black_pieces.iter().filter(|(k, _)| *k != PieceKind::King).collect();

    let wc = white_non_king.len();
    let bc = black_non_king.len();

    if wc == 0 && bc == 0 {
        return true;
    }
    if wc == 0 && bc == 1 {
        let kind = black_non_king[0].0;
        if kind == PieceKind::Bishop || kind == PieceKind::Knight {
            return true;
        }
    }
    if bc == 0 && wc == 1 {
        let kind = white_non_king[0].0;
        if kind == PieceKind::Bishop || kind == PieceKind::Knight {
            return true;
        }
    }
    if wc == 1 && bc == 1 {
        let (wk, wsq) = white_non_king[0];
        let (bk, bsq) = black_non_king[0];
        if *wk == PieceKind::Bishop && *bk == PieceKind::Bishop {
            let w_color = (wsq.file + wsq.rank) % 2;
            let b_color = (bsq.file + bsq.rank) % 2;
            if w_color == b_color {
                return true;
            }
        }
    }

    false
}

/// Returns `true` if `color` has at least one pseudo-legal move, i.e. is
/// not immobilized. Used by the game state machine's immobility check.
pub fn has_any_move(board: &Board, color: Color, castling: &CastlingRights, en_passant: Option<Square>) -> bool {
    !generate_pseudo_legal_moves(board, color, castling, en_passant).is_empty()
}
