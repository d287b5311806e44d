use crate::bitboard::{Bitboard, Direction};
use crate::types::{Role, Square};
use enum_dispatch::enum_dispatch;
use std::sync::LazyLock;

static KNIGHT_ATTACKS: LazyLock<[Bitboard; 64]> = LazyLock::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    for square in Square::all() {
        let bb = Bitboard::from_square(square);
        let n = bb.shift(Direction::North);
        let s = bb.shift(Direction::South);
        let e = bb.shift(Direction::East);
        let w = bb.shift(Direction::West);

        table[square.index()] = n.shift(Direction::NorthEast)
            | n.shift(Direction::NorthWest)
            | s.shift(Direction::SouthEast)
            | s.shift(Direction::SouthWest)
            | e.shift(Direction::NorthEast)
            | e.shift(Direction::SouthEast)
            | w.shift(Direction::NorthWest)
            | w.shift(Direction::SouthWest);
    }
    table
});

static KING_ATTACKS: LazyLock<[Bitboard; 64]> = LazyLock::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    for square in Square::all() {
        let bb = Bitboard::from_square(square);
        table[square.index()] = Direction::ALL
            .into_iter()
            .fold(Bitboard::EMPTY, |acc, d| acc | bb.shift(d));
    }
    table
});

pub fn knight_attacks(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square.index()]
}

pub fn king_attacks(square: Square) -> Bitboard {
    KING_ATTACKS[square.index()]
}

/// Squares reached from `square` walking towards `direction`, stopping at
/// (and including) the first occupied square
pub fn ray(square: Square, direction: Direction, occupied: Bitboard) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    let mut bb = Bitboard::from_square(square);

    loop {
        bb = bb.shift(direction);
        if bb.is_empty() {
            break;
        }
        attacks |= bb;
        if (bb & occupied).any() {
            break;
        }
    }

    attacks
}

fn slider_attacks(square: Square, occupied: Bitboard, directions: &[Direction]) -> Bitboard {
    directions
        .iter()
        .fold(Bitboard::EMPTY, |acc, &d| acc | ray(square, d, occupied))
}

pub fn bishop_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    slider_attacks(square, occupied, &Direction::DIAGONAL)
}

pub fn rook_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    slider_attacks(square, occupied, &Direction::ORTHOGONAL)
}

pub fn queen_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(square, occupied) | rook_attacks(square, occupied)
}

/// Direction from `a` towards `b` if they share a rank, file or diagonal
fn direction_between(a: Square, b: Square) -> Option<Direction> {
    let df = b.file() as i8 - a.file() as i8;
    let dr = b.rank() as i8 - a.rank() as i8;

    if a == b || (df != 0 && dr != 0 && df.abs() != dr.abs()) {
        return None;
    }
    Direction::from_step(df, dr)
}

/// Squares strictly between two aligned squares, empty otherwise
pub fn between(a: Square, b: Square) -> Bitboard {
    match direction_between(a, b) {
        Some(d) => ray(a, d, Bitboard::from_square(b)) - Bitboard::from_square(b),
        None => Bitboard::EMPTY,
    }
}

/// The full line (edge to edge) through two aligned squares, empty otherwise
pub fn line(a: Square, b: Square) -> Bitboard {
    match direction_between(a, b) {
        Some(d) => {
            ray(a, d, Bitboard::EMPTY)
                | ray(a, d.opposite(), Bitboard::EMPTY)
                | Bitboard::from_square(a)
        }
        None => Bitboard::EMPTY,
    }
}

/// How a non-pawn, non-king piece reaches a square. The attack set from the
/// destination, intersected with the mover's pieces, gives the candidate
/// origins of a SAN move.
#[enum_dispatch]
pub trait AttackPattern {
    fn role(&self) -> Role;

    fn attacks(&self, square: Square, occupied: Bitboard) -> Bitboard;
}

#[derive(Debug, Clone, Copy)]
pub struct KnightPattern;

#[derive(Debug, Clone, Copy)]
pub struct BishopPattern;

#[derive(Debug, Clone, Copy)]
pub struct RookPattern;

#[derive(Debug, Clone, Copy)]
pub struct QueenPattern;

impl AttackPattern for KnightPattern {
    fn role(&self) -> Role {
        Role::Knight
    }

    fn attacks(&self, square: Square, _occupied: Bitboard) -> Bitboard {
        knight_attacks(square)
    }
}

impl AttackPattern for BishopPattern {
    fn role(&self) -> Role {
        Role::Bishop
    }

    fn attacks(&self, square: Square, occupied: Bitboard) -> Bitboard {
        bishop_attacks(square, occupied)
    }
}

impl AttackPattern for RookPattern {
    fn role(&self) -> Role {
        Role::Rook
    }

    fn attacks(&self, square: Square, occupied: Bitboard) -> Bitboard {
        rook_attacks(square, occupied)
    }
}

impl AttackPattern for QueenPattern {
    fn role(&self) -> Role {
        Role::Queen
    }

    fn attacks(&self, square: Square, occupied: Bitboard) -> Bitboard {
        queen_attacks(square, occupied)
    }
}

#[enum_dispatch(AttackPattern)]
#[derive(Debug, Clone, Copy)]
pub enum PieceMover {
    KnightPattern,
    BishopPattern,
    RookPattern,
    QueenPattern,
}

impl PieceMover {
    /// Mover for a SAN piece letter (`N`, `B`, `R`, `Q`)
    pub fn from_letter(c: u8) -> Option<PieceMover> {
        Some(match c {
            b'N' => KnightPattern.into(),
            b'B' => BishopPattern.into(),
            b'R' => RookPattern.into(),
            b'Q' => QueenPattern.into(),
            _ => return None,
        })
    }
}
