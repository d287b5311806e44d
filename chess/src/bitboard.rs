use crate::types::Square;
use std::fmt;
use std::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not, Sub, SubAssign,
};

/// A set of squares packed into 64 bits
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bitboard(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub const DIAGONAL: [Direction; 4] = [
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// Signed (file, rank) step
    pub fn step(self) -> (i8, i8) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, 1),
            Direction::NorthWest => (-1, 1),
            Direction::SouthEast => (1, -1),
            Direction::SouthWest => (-1, -1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::NorthEast => Direction::SouthWest,
            Direction::NorthWest => Direction::SouthEast,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
        }
    }

    /// Direction matching the signs of a (file, rank) delta
    pub fn from_step(df: i8, dr: i8) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| d.step() == (df.signum(), dr.signum()))
    }
}

impl Bitboard {
    pub const EMPTY: Bitboard = Bitboard(0);
    pub const FULL: Bitboard = Bitboard(!0);
    pub const FILE_A: Bitboard = Bitboard(0x0101_0101_0101_0101);
    pub const FILE_H: Bitboard = Bitboard(0x8080_8080_8080_8080);
    pub const RANK_1: Bitboard = Bitboard(0xff);
    pub const RANK_8: Bitboard = Bitboard(0xff << 56);
    pub const BACK_RANKS: Bitboard = Bitboard(0xff | (0xff << 56));

    pub fn from_square(square: Square) -> Bitboard {
        Bitboard(1 << square.index())
    }

    pub fn from_file(file: u8) -> Bitboard {
        Bitboard(Bitboard::FILE_A.0 << file)
    }

    pub fn from_rank(rank: u8) -> Bitboard {
        Bitboard(Bitboard::RANK_1.0 << (8 * rank))
    }

    pub fn contains(self, square: Square) -> bool {
        self.0 & (1 << square.index()) != 0
    }

    pub fn add(&mut self, square: Square) {
        self.0 |= 1 << square.index();
    }

    pub fn discard(&mut self, square: Square) {
        self.0 &= !(1 << square.index());
    }

    pub fn toggle(&mut self, square: Square) {
        self.0 ^= 1 << square.index();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn any(self) -> bool {
        self.0 != 0
    }

    pub fn more_than_one(self) -> bool {
        self.0 & self.0.wrapping_sub(1) != 0
    }

    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Lowest set square
    pub fn first(self) -> Option<Square> {
        self.any()
            .then(|| Square::new(self.0.trailing_zeros() as u8))
    }

    /// Highest set square
    pub fn last(self) -> Option<Square> {
        self.any()
            .then(|| Square::new(63 - self.0.leading_zeros() as u8))
    }

    pub fn pop_first(&mut self) -> Option<Square> {
        let square = self.first()?;
        self.0 &= self.0 - 1;
        Some(square)
    }

    pub fn pop_last(&mut self) -> Option<Square> {
        let square = self.last()?;
        self.discard(square);
        Some(square)
    }

    /// Shifts every square one step towards `direction`.
    /// Squares that would wrap around the a/h files are dropped.
    pub fn shift(self, direction: Direction) -> Bitboard {
        let b = self.0;
        Bitboard(match direction {
            Direction::North => b << 8,
            Direction::South => b >> 8,
            Direction::East => (b << 1) & !Bitboard::FILE_A.0,
            Direction::West => (b >> 1) & !Bitboard::FILE_H.0,
            Direction::NorthEast => (b << 9) & !Bitboard::FILE_A.0,
            Direction::NorthWest => (b << 7) & !Bitboard::FILE_H.0,
            Direction::SouthEast => (b >> 7) & !Bitboard::FILE_A.0,
            Direction::SouthWest => (b >> 9) & !Bitboard::FILE_H.0,
        })
    }
}

impl From<Square> for Bitboard {
    fn from(square: Square) -> Bitboard {
        Bitboard::from_square(square)
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Bitboard {
        let mut bb = Bitboard::EMPTY;
        for square in iter {
            bb.add(square);
        }
        bb
    }
}

/// Iterates the squares of a bitboard from a1 towards h8
pub struct IntoIter(Bitboard);

impl Iterator for IntoIter {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        self.0.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.0.count();
        (len, Some(len))
    }
}

impl ExactSizeIterator for IntoIter {}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = IntoIter;

    fn into_iter(self) -> IntoIter {
        IntoIter(self)
    }
}

macro_rules! bitboard_op {
    ($trait:ident, $fn:ident, $assign_trait:ident, $assign_fn:ident, $op:tt) => {
        impl $trait for Bitboard {
            type Output = Bitboard;

            fn $fn(self, rhs: Bitboard) -> Bitboard {
                Bitboard(self.0 $op rhs.0)
            }
        }

        impl $assign_trait for Bitboard {
            fn $assign_fn(&mut self, rhs: Bitboard) {
                self.0 = self.0 $op rhs.0;
            }
        }
    };
}

bitboard_op!(BitOr, bitor, BitOrAssign, bitor_assign, |);
bitboard_op!(BitAnd, bitand, BitAndAssign, bitand_assign, &);
bitboard_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, ^);

impl Sub for Bitboard {
    type Output = Bitboard;

    fn sub(self, rhs: Bitboard) -> Bitboard {
        Bitboard(self.0 & !rhs.0)
    }
}

impl SubAssign for Bitboard {
    fn sub_assign(&mut self, rhs: Bitboard) {
        self.0 &= !rhs.0;
    }
}

impl Not for Bitboard {
    type Output = Bitboard;

    fn not(self) -> Bitboard {
        Bitboard(!self.0)
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // rank 8 on top, like a diagram
        for rank in (0..8).rev() {
            for file in 0..8 {
                let c = if self.contains(Square::from_coords(file, rank)) {
                    'x'
                } else {
                    '.'
                };
                write!(f, "{}", c)?;
            }
            if rank > 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_ascii(s.as_bytes()).unwrap()
    }

    #[test]
    fn test_membership() {
        let mut bb = Bitboard::EMPTY;
        bb.add(sq("e4"));
        bb.add(sq("h8"));
        assert!(bb.contains(sq("e4")));
        assert_eq!(bb.count(), 2);

        bb.toggle(sq("e4"));
        assert!(!bb.contains(sq("e4")));
        bb.toggle(sq("e4"));
        bb.discard(sq("h8"));
        assert_eq!(bb, Bitboard::from_square(sq("e4")));
    }

    #[test]
    fn test_set_operations() {
        let a = Bitboard::from_file(0);
        let b = Bitboard::from_rank(0);
        assert_eq!((a & b).first(), Some(Square::A1));
        assert_eq!((a | b).count(), 15);
        assert_eq!((a ^ b).count(), 14);
        assert_eq!((a - b).count(), 7);
        assert!(!(a - b).contains(Square::A1));
        assert_eq!(!Bitboard::EMPTY, Bitboard::FULL);
    }

    #[test]
    fn test_shift_does_not_wrap() {
        assert!(Bitboard::FILE_H.shift(Direction::East).is_empty());
        assert!(Bitboard::FILE_A.shift(Direction::West).is_empty());
        assert!(Bitboard::FILE_H.shift(Direction::NorthEast).is_empty());
        assert!(Bitboard::FILE_A.shift(Direction::SouthWest).is_empty());
        assert!(Bitboard::RANK_8.shift(Direction::North).is_empty());
        assert!(Bitboard::RANK_1.shift(Direction::South).is_empty());

        let e4 = Bitboard::from_square(sq("e4"));
        assert_eq!(e4.shift(Direction::NorthWest), Bitboard::from_square(sq("d5")));
        assert_eq!(e4.shift(Direction::SouthEast), Bitboard::from_square(sq("f3")));
    }

    #[test]
    fn test_scan() {
        let mut bb: Bitboard = [sq("b2"), sq("g7"), sq("d4")].into_iter().collect();
        assert_eq!(bb.first(), Some(sq("b2")));
        assert_eq!(bb.last(), Some(sq("g7")));
        assert_eq!(bb.pop_last(), Some(sq("g7")));
        assert_eq!(bb.pop_first(), Some(sq("b2")));
        assert_eq!(bb.pop_first(), Some(sq("d4")));
        assert_eq!(bb.pop_first(), None);
        assert_eq!(Bitboard::EMPTY.last(), None);
    }

    #[test]
    fn test_iteration_is_ascending() {
        let squares: Vec<Square> = Bitboard::from_rank(3).into_iter().collect();
        assert_eq!(squares.len(), 8);
        assert!(squares.windows(2).all(|w| w[0] < w[1]));
        assert!(Bitboard::from_rank(3).more_than_one());
        assert!(!Bitboard::from_square(sq("a1")).more_than_one());
    }
}
