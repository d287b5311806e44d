use std::fmt;
use std::ops::Not;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    pub fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank offset of a single pawn push for this color
    pub fn push(self) -> i8 {
        match self {
            Color::White => 8,
            Color::Black => -8,
        }
    }

    pub fn char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

impl Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        self.other()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Pawn,
        Role::Knight,
        Role::Bishop,
        Role::Rook,
        Role::Queen,
        Role::King,
    ];

    /// Uppercase SAN letter (also the white FEN letter)
    pub fn upper_char(self) -> char {
        match self {
            Role::Pawn => 'P',
            Role::Knight => 'N',
            Role::Bishop => 'B',
            Role::Rook => 'R',
            Role::Queen => 'Q',
            Role::King => 'K',
        }
    }

    pub fn from_upper_char(c: u8) -> Option<Role> {
        Some(match c {
            b'P' => Role::Pawn,
            b'N' => Role::Knight,
            b'B' => Role::Bishop,
            b'R' => Role::Rook,
            b'Q' => Role::Queen,
            b'K' => Role::King,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub role: Role,
}

impl Piece {
    pub const fn new(color: Color, role: Role) -> Piece {
        Piece { color, role }
    }

    /// Dense index in 0..12: white pieces first, pawn to king
    pub fn index(self) -> usize {
        self.color as usize * 6 + self.role as usize
    }

    pub fn from_index(index: usize) -> Piece {
        debug_assert!(index < 12);
        let color = if index < 6 { Color::White } else { Color::Black };
        Piece::new(color, Role::ALL[index % 6])
    }

    pub fn fen_char(self) -> char {
        let c = self.role.upper_char();
        match self.color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }
}

/// A square of the board, a1 = 0, b1 = 1, ..., h8 = 63
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub const A1: Square = Square(0);
    pub const C1: Square = Square(2);
    pub const D1: Square = Square(3);
    pub const E1: Square = Square(4);
    pub const F1: Square = Square(5);
    pub const G1: Square = Square(6);
    pub const H1: Square = Square(7);
    pub const A8: Square = Square(56);
    pub const E8: Square = Square(60);
    pub const H8: Square = Square(63);

    /// # Panics
    /// If the index is not in 0..64
    pub fn new(index: u8) -> Square {
        assert!(index < 64, "square index out of range: {}", index);
        Square(index)
    }

    pub fn from_coords(file: u8, rank: u8) -> Square {
        debug_assert!(file < 8 && rank < 8);
        Square(rank * 8 + file)
    }

    /// Parses a square from its two algebraic characters (e.g. `b"e4"`)
    pub fn from_ascii(s: &[u8]) -> Option<Square> {
        match s {
            [f @ b'a'..=b'h', r @ b'1'..=b'8'] => Some(Square::from_coords(f - b'a', r - b'1')),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn file(self) -> u8 {
        self.0 & 7
    }

    pub fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// Offsets the square index by `delta`, ignoring file wrap-around
    pub fn offset(self, delta: i8) -> Option<Square> {
        let index = self.0 as i8 + delta;
        (0..64).contains(&index).then(|| Square(index as u8))
    }

    pub fn flip_vertical(self) -> Square {
        Square(self.0 ^ 56)
    }

    /// Mirrors the square to the black side when `color` is black
    pub fn relative_to(self, color: Color) -> Square {
        match color {
            Color::White => self,
            Color::Black => self.flip_vertical(),
        }
    }

    /// Chebyshev (king move) distance
    pub fn distance(self, other: Square) -> u8 {
        let df = (self.file() as i8 - other.file() as i8).unsigned_abs();
        let dr = (self.rank() as i8 - other.rank() as i8).unsigned_abs();
        df.max(dr)
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.file()) as char,
            (b'1' + self.rank()) as char
        )
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Castling rights as a 4-bit mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KING_SIDE: CastlingRights = CastlingRights(1);
    pub const WHITE_QUEEN_SIDE: CastlingRights = CastlingRights(1 << 1);
    pub const BLACK_KING_SIDE: CastlingRights = CastlingRights(1 << 2);
    pub const BLACK_QUEEN_SIDE: CastlingRights = CastlingRights(1 << 3);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    /// The individual rights in FEN order: `K`, `Q`, `k`, `q`
    pub const EACH: [CastlingRights; 4] = [
        CastlingRights::WHITE_KING_SIDE,
        CastlingRights::WHITE_QUEEN_SIDE,
        CastlingRights::BLACK_KING_SIDE,
        CastlingRights::BLACK_QUEEN_SIDE,
    ];

    pub fn of_color(color: Color) -> CastlingRights {
        match color {
            Color::White => CastlingRights(0b0011),
            Color::Black => CastlingRights(0b1100),
        }
    }

    /// The single right tied to a rook starting on `square`, if any
    pub fn of_corner(square: Square) -> CastlingRights {
        match square {
            Square::H1 => CastlingRights::WHITE_KING_SIDE,
            Square::A1 => CastlingRights::WHITE_QUEEN_SIDE,
            Square::H8 => CastlingRights::BLACK_KING_SIDE,
            Square::A8 => CastlingRights::BLACK_QUEEN_SIDE,
            _ => CastlingRights::NONE,
        }
    }

    pub fn has(self, rights: CastlingRights) -> bool {
        self.0 & rights.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, rights: CastlingRights) {
        self.0 |= rights.0;
    }

    pub fn remove(&mut self, rights: CastlingRights) {
        self.0 &= !rights.0;
    }

    pub fn fen_char(self) -> char {
        match self {
            CastlingRights::WHITE_KING_SIDE => 'K',
            CastlingRights::WHITE_QUEEN_SIDE => 'Q',
            CastlingRights::BLACK_KING_SIDE => 'k',
            CastlingRights::BLACK_QUEEN_SIDE => 'q',
            _ => '?',
        }
    }
}
