//! Board primitives for the SimChess resolver.
//!
//! Squares, pieces, castling rights and the flat 64-square board, plus
//! full FEN encode/decode. Move generation lives in `movegen`; this
//! module only knows about placement, not legality.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Color & PieceKind
// ---------------------------------------------------------------------------

/// The side (color) of a piece or player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// 0-based home rank for pawns of this color.
    pub fn pawn_start_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// 0-based promotion rank.
    pub fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// +1 for White (advances toward rank 8), -1 for Black.
    pub fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// A chess piece type, independent of color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    /// Parses the promotion-piece letter used in coordinate notation
    /// (`q`, `r`, `b`, `n`, lowercase).
    pub fn from_promotion_letter(c: char) -> Option<PieceKind> {
        match c {
            'q' => Some(PieceKind::Queen),
            'r' => Some(PieceKind::Rook),
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            _ => None,
        }
    }

    pub fn promotion_letter(self) -> char {
        match self {
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            _ => '?',
        }
    }
}

/// A piece with both kind and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// FEN character: uppercase White, lowercase Black.
    pub fn to_fen_char(self) -> char {
        let c = match self.kind {
            PieceKind::King => 'K',
            PieceKind::Queen => 'Q',
            PieceKind::Rook => 'R',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Pawn => 'P',
        };
        match self.color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }

    pub fn from_fen_char(c: char) -> Option<Self> {
        let color = if c.is_uppercase() { Color::White } else { Color::Black };
        let kind = match c.to_ascii_uppercase() {
            'K' => PieceKind::King,
            'Q' => PieceKind::Queen,
            'R' => PieceKind::Rook,
            'B' => PieceKind::Bishop,
            'N' => PieceKind::Knight,
            'P' => PieceKind::Pawn,
            _ => return None,
        };
        Some(Piece { kind, color })
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A board square as 0-based file/rank (`file`: a=0..h=7, `rank`: 1=0..8=7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    pub file: u8,
    pub rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8, "square out of bounds");
        Self { file, rank }
    }

    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Square { file, rank })
        } else {
            None
        }
    }

    pub fn to_algebraic(self) -> String {
        format!("{}{}", (b'a' + self.file) as char, self.rank + 1)
    }

    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        let f = self.file as i8 + df;
        let r = self.rank as i8 + dr;
        if (0..8).contains(&f) && (0..8).contains(&r) {
            Some(Square::new(f as u8, r as u8))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        (self.rank as usize) * 8 + self.file as usize
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

// ---------------------------------------------------------------------------
// Castling rights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideCastlingRights {
    pub kingside: bool,
    pub queenside: bool,
}

impl Default for SideCastlingRights {
    fn default() -> Self {
        Self { kingside: true, queenside: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white: SideCastlingRights,
    pub black: SideCastlingRights,
}

impl CastlingRights {
    pub fn for_color(&self, color: Color) -> &SideCastlingRights {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn for_color_mut(&mut self, color: Color) -> &mut SideCastlingRights {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    pub fn to_fen(&self) -> String {
        let mut s = String::new();
        if self.white.kingside {
            s.push('K');
        }
        if self.white.queenside {
            s.push('Q');
        }
        if self.black.kingside {
            s.push('k');
        }
        if self.black.queenside {
            s.push('q');
        }
        if s.is_empty() { "-".to_string() } else { s }
    }

    fn from_fen(s: &str) -> Self {
        let mut rights = CastlingRights {
            white: SideCastlingRights { kingside: false, queenside: false },
            black: SideCastlingRights { kingside: false, queenside: false },
        };
        for c in s.chars() {
            match c {
                'K' => rights.white.kingside = true,
                'Q' => rights.white.queenside = true,
                'k' => rights.black.kingside = true,
                'q' => rights.black.queenside = true,
                _ => {}
            }
        }
        rights
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// The piece placement on a 64-square board. Index mapping: `rank*8 + file`.
///
/// Side-to-move, castling rights, en passant target, halfmove clock and
/// fullmove number are *not* stored here — they're owned by whatever
/// holds the board (`game::Game`), since move generation repeatedly
/// needs to evaluate the same placement under a forced, different
/// side-to-move without mutating the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub squares: [Option<Piece>; 64],
}

impl Default for Board {
    fn default() -> Self {
        Self { squares: [None; 64] }
    }
}

impl Board {
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.index()] = piece;
    }

    pub fn starting_position() -> Self {
        let mut board = Board::default();
        let mut place = |file: u8, rank: u8, kind: PieceKind, color: Color| {
            board.set(Square::new(file, rank), Some(Piece::new(kind, color)));
        };

        place(0, 0, PieceKind::Rook, Color::White);
        place(1, 0, PieceKind::Knight, Color::White);
        place(2, 0, PieceKind::Bishop, Color::White);
        place(3, 0, PieceKind::Queen, Color::White);
        place(4, 0, PieceKind::King, Color::White);
        place(5, 0, PieceKind::Bishop, Color::White);
        place(6, 0, PieceKind::Knight, Color::White);
        place(7, 0, PieceKind::Rook, Color::White);
        for f in 0..8 {
            place(f, 1, PieceKind::Pawn, Color::White);
        }
        for f in 0..8 {
            place(f, 6, PieceKind::Pawn, Color::Black);
        }
        place(0, 7, PieceKind::Rook, Color::Black);
        place(1, 7, PieceKind::Knight, Color::Black);
        place(2, 7, PieceKind::Bishop, Color::Black);
        place(3, 7, PieceKind::Queen, Color::Black);
        place(4, 7, PieceKind::King, Color::Black);
        place(5, 7, PieceKind::Bishop, Color::Black);
        place(6, 7, PieceKind::Knight, Color::Black);
        place(7, 7, PieceKind::Rook, Color::Black);

        board
    }

    /// Finds the king square for `color`, or `None` if it has been captured.
    pub fn find_king(&self, color: Color) -> Option<Square> {
        for rank in 0..8u8 {
            for file in 0..8u8 {
                let sq = Square::new(file, rank);
                if let Some(piece) = self.get(sq)
                    && piece.kind == PieceKind::King
                    && piece.color == color
                {
                    return Some(sq);
                }
            }
        }
        None
    }

    /// Piece-placement field of a FEN string (first whitespace-delimited
    /// field). Used as the threefold-repetition key.
    pub fn to_placement_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty_count = 0;
            for file in 0..8u8 {
                let sq = Square::new(file, rank);
                match self.get(sq) {
                    Some(piece) => {
                        if empty_count > 0 {
                            fen.push_str(&empty_count.to_string());
                            empty_count = 0;
                        }
                        fen.push(piece.to_fen_char());
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                fen.push_str(&empty_count.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }
        fen
    }

    fn from_placement_fen(s: &str) -> Result<Self, String> {
        let mut board = Board::default();
        let ranks: Vec<&str> = s.split('/').collect();
        if ranks.len() != 8 {
            return Err(format!("FEN placement must have 8 ranks, got {}", ranks.len()));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else {
                    let piece = Piece::from_fen_char(c)
                        .ok_or_else(|| format!("invalid FEN piece symbol '{}'", c))?;
                    if file >= 8 {
                        return Err(format!("FEN rank {} overflows", rank + 1));
                    }
                    board.set(Square::new(file, rank), Some(piece));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(format!("FEN rank {} does not sum to 8 files", rank + 1));
            }
        }
        Ok(board)
    }

    /// Encodes the full FEN-equivalent position: placement, side to move,
    /// castling rights, en passant target, halfmove clock, fullmove number.
    pub fn to_fen(
        &self,
        turn: Color,
        castling: &CastlingRights,
        en_passant: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> String {
        let turn_char = match turn {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let ep = en_passant.map(|sq| sq.to_algebraic()).unwrap_or_else(|| "-".to_string());
        format!(
            "{} {} {} {} {} {}",
            self.to_placement_fen(),
            turn_char,
            castling.to_fen(),
            ep,
            halfmove_clock,
            fullmove_number
        )
    }

    /// Decodes a full FEN string into its constituent parts.
    pub fn from_fen(fen: &str) -> Result<(Board, Color, CastlingRights, Option<Square>, u32, u32), String> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(format!("FEN must have 6 fields, got {}", fields.len()));
        }
        let board = Board::from_placement_fen(fields[0])?;
        let turn = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("invalid side to move '{}'", other)),
        };
        let castling = CastlingRights::from_fen(fields[2]);
        let en_passant = match fields[3] {
            "-" => None,
            s => Some(Square::from_algebraic(s).ok_or_else(|| format!("invalid en passant square '{}'", s))?),
        };
        let halfmove_clock: u32 = fields[4]
            .parse()
            .map_err(|_| format!("invalid halfmove clock '{}'", fields[4]))?;
        let fullmove_number: u32 = fields[5]
            .parse()
            .map_err(|_| format!("invalid fullmove number '{}'", fields[5]))?;
        Ok((board, turn, castling, en_passant, halfmove_clock, fullmove_number))
    }
}
