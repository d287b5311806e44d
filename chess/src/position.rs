use crate::attacks::{between, bishop_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::fen::{FenError, STARTING_FEN};
use crate::types::{CastlingRights, Color, Piece, Role, Square};
use std::fmt;

/// Full board state, mutated in place as SAN moves are applied.
///
/// The occupancy bitboards are kept in sync with `board` by the three
/// piece primitives (`set_piece`, `remove_piece`, `move_piece`); nothing
/// else writes them.
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    board: [Option<Piece>; 64],
    by_role: [Bitboard; 6],
    by_color: [Bitboard; 2],
    occupied: Bitboard,

    pub(crate) turn: Color,
    pub(crate) castles: CastlingRights,
    pub(crate) ep_square: Option<Square>,
    /// Plies since the last capture or pawn move
    pub(crate) halfmoves: u32,
    /// Plies since the start of the game, `2 * (fullmoves - 1) + turn`
    pub(crate) ply: u32,
}

impl Position {
    /// A position with no pieces, white to move and no rights
    pub fn empty() -> Position {
        Position {
            board: [None; 64],
            by_role: [Bitboard::EMPTY; 6],
            by_color: [Bitboard::EMPTY; 2],
            occupied: Bitboard::EMPTY,
            turn: Color::White,
            castles: CastlingRights::NONE,
            ep_square: None,
            halfmoves: 0,
            ply: 0,
        }
    }

    pub fn startpos() -> Position {
        Position::from_fen(STARTING_FEN).expect("starting FEN is valid")
    }

    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        crate::fen::parse(fen)
    }

    pub fn to_fen(&self) -> String {
        crate::fen::serialize(self)
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.index()]
    }

    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    pub fn by_role(&self, role: Role) -> Bitboard {
        self.by_role[role as usize]
    }

    pub fn by_color(&self, color: Color) -> Bitboard {
        self.by_color[color as usize]
    }

    pub fn by_piece(&self, piece: Piece) -> Bitboard {
        self.by_color(piece.color) & self.by_role(piece.role)
    }

    /// Pieces of the side to move
    pub fn our(&self, role: Role) -> Bitboard {
        self.by_piece(Piece::new(self.turn, role))
    }

    /// Pieces of the side not to move
    pub fn their(&self, role: Role) -> Bitboard {
        self.by_piece(Piece::new(self.turn.other(), role))
    }

    /// # Panics
    /// If `color` has no king, which no position built from a valid FEN allows
    pub fn king_of(&self, color: Color) -> Square {
        self.by_piece(Piece::new(color, Role::King))
            .first()
            .expect("each side has a king")
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn castles(&self) -> CastlingRights {
        self.castles
    }

    pub fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    pub fn halfmoves(&self) -> u32 {
        self.halfmoves
    }

    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn fullmoves(&self) -> u32 {
        1 + self.ply.saturating_sub(self.turn as u32) / 2
    }

    pub(crate) fn set_piece(&mut self, square: Square, piece: Piece) {
        debug_assert!(self.board[square.index()].is_none());
        self.board[square.index()] = Some(piece);
        self.by_role[piece.role as usize].add(square);
        self.by_color[piece.color as usize].add(square);
        self.occupied.add(square);
    }

    pub(crate) fn remove_piece(&mut self, square: Square) -> Option<Piece> {
        let piece = self.board[square.index()].take()?;
        self.by_role[piece.role as usize].discard(square);
        self.by_color[piece.color as usize].discard(square);
        self.occupied.discard(square);
        Some(piece)
    }

    pub(crate) fn move_piece(&mut self, from: Square, to: Square) {
        if let Some(piece) = self.remove_piece(from) {
            self.set_piece(to, piece);
        }
    }

    /// Pieces of the side to move that are the only blocker between their
    /// king and an enemy slider
    pub fn pinned(&self) -> Bitboard {
        let king = self.king_of(self.turn);
        let ours = self.by_color(self.turn);
        let theirs = self.by_color(self.turn.other());

        let diagonal = self.their(Role::Bishop) | self.their(Role::Queen);
        let orthogonal = self.their(Role::Rook) | self.their(Role::Queen);

        // x-ray through our own pieces: only their pieces block
        let snipers = (bishop_attacks(king, theirs) & diagonal)
            | (rook_attacks(king, theirs) & orthogonal);

        let mut pinned = Bitboard::EMPTY;
        for sniper in snipers {
            let blockers = between(king, sniper) & ours;
            if blockers.count() == 1 {
                pinned |= blockers;
            }
        }
        pinned
    }

    /// Checks that the occupancy bitboards agree with the board array
    pub fn is_consistent(&self) -> bool {
        let mut by_role = [Bitboard::EMPTY; 6];
        let mut by_color = [Bitboard::EMPTY; 2];

        for square in Square::all() {
            if let Some(piece) = self.piece_at(square) {
                by_role[piece.role as usize].add(square);
                by_color[piece.color as usize].add(square);
            }
        }

        by_role == self.by_role
            && by_color == self.by_color
            && (by_color[0] | by_color[1]) == self.occupied
    }
}

impl Default for Position {
    fn default() -> Position {
        Position::startpos()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hor = "+---+---+---+---+---+---+---+---+";
        for rank in (0..8).rev() {
            writeln!(f, "{}", hor)?;
            for file in 0..8 {
                let c = self
                    .piece_at(Square::from_coords(file, rank))
                    .map_or(' ', Piece::fen_char);
                write!(f, "| {} ", c)?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{}", hor)?;
        write!(f, "{}", self.to_fen())
    }
}

impl std::str::FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Position, FenError> {
        Position::from_fen(s)
    }
}
