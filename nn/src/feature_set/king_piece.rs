//! King-relative piece features.
//!
//! Every (king square, piece, piece square) combination that can occur in a
//! legal position gets a dense index. Combinations that cannot occur are
//! left out of the table: the perspective's own king (it is the key), any
//! piece on the king's square, the opposing king next to the king, and pawns
//! on the first or last rank. After the piece block come a few
//! miscellaneous slots per king square for castling rights and the en
//! passant file.

use super::{FeatureSet, MAX_ACTIVE_FEATURES};
use chess::{Bitboard, CastlingRights, Color, Piece, Position, Role, Square};
use std::sync::LazyLock;

pub const PIECE_INPUT_SIZE: usize = 41916;
pub const CASTLING_SIZE: usize = 4;
pub const EN_PASSANT_SIZE: usize = 8;
pub const MISC_SIZE: usize = CASTLING_SIZE + EN_PASSANT_SIZE;
pub const MISC_INPUT_SIZE: usize = 64 * MISC_SIZE;
pub const NUM_FEATURES: usize = PIECE_INPUT_SIZE + MISC_INPUT_SIZE;
pub const PADDED_NUM_FEATURES: usize = NUM_FEATURES.next_multiple_of(16);

/// Order of the castling slots within the misc block
const CASTLING_SLOTS: [CastlingRights; CASTLING_SIZE] = [
    CastlingRights::WHITE_QUEEN_SIDE,
    CastlingRights::WHITE_KING_SIDE,
    CastlingRights::BLACK_QUEEN_SIDE,
    CastlingRights::BLACK_KING_SIDE,
];

const UNUSED: u16 = u16::MAX;
const TABLE_LEN: usize = 2 * 64 * 12 * 64;

static PIECE_TABLE: LazyLock<Vec<u16>> = LazyLock::new(build_piece_table);

fn table_index(perspective: Color, king: Square, piece: Piece, square: Square) -> usize {
    ((perspective as usize * 64 + king.index()) * 12 + piece.index()) * 64 + square.index()
}

fn is_excluded(perspective: Color, king: Square, piece: Piece, square: Square) -> bool {
    piece == Piece::new(perspective, Role::King)
        || square == king
        || (piece == Piece::new(perspective.other(), Role::King) && square.distance(king) == 1)
        || (piece.role == Role::Pawn && Bitboard::BACK_RANKS.contains(square))
}

/// Assigns consecutive indices per perspective, walking king square, then
/// piece (white pawn to black king), then piece square
pub fn build_piece_table() -> Vec<u16> {
    let mut table = vec![UNUSED; TABLE_LEN];

    for perspective in Color::ALL {
        let mut next: u16 = 0;
        for king in Square::all() {
            for piece in (0..12).map(Piece::from_index) {
                for square in Square::all() {
                    if is_excluded(perspective, king, piece, square) {
                        continue;
                    }
                    table[table_index(perspective, king, piece, square)] = next;
                    next += 1;
                }
            }
        }
        assert_eq!(next as usize, PIECE_INPUT_SIZE);
    }

    table
}

/// Index of a piece feature, `None` for combinations left out of the table
pub fn piece_feature(perspective: Color, king: Square, piece: Piece, square: Square) -> Option<u16> {
    let index = PIECE_TABLE[table_index(perspective, king, piece, square)];
    (index != UNUSED).then_some(index)
}

/// King-relative piece features plus castling and en passant
pub struct KingPiece;

impl FeatureSet for KingPiece {
    fn name(&self) -> &'static str {
        "king-piece"
    }

    fn num_features(&self) -> usize {
        NUM_FEATURES
    }

    fn active_features(&self, position: &Position, perspective: Color, features: &mut Vec<u16>) {
        features.clear();

        let king = position.king_of(perspective);

        for square in position.occupied() - Bitboard::from_square(king) {
            let Some(piece) = position.piece_at(square) else {
                continue;
            };
            // touching kings or pawns on a back rank have no slot
            if let Some(index) = piece_feature(perspective, king, piece, square) {
                features.push(index);
            }
        }

        let misc = PIECE_INPUT_SIZE + king.index() * MISC_SIZE;
        for (slot, right) in CASTLING_SLOTS.into_iter().enumerate() {
            if position.castles().has(right) {
                features.push((misc + slot) as u16);
            }
        }
        if let Some(ep) = position.ep_square() {
            features.push((misc + CASTLING_SIZE + ep.file() as usize) as u16);
        }

        features.sort_unstable();
        assert!(
            features.len() <= MAX_ACTIVE_FEATURES,
            "{} active features in {}",
            features.len(),
            position
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_set::checks::sanity_checks;

    #[test]
    fn test_sanity_checks() {
        sanity_checks(&KingPiece);
    }

    #[test]
    fn test_sizes() {
        assert_eq!(NUM_FEATURES, 42684);
        assert_eq!(PADDED_NUM_FEATURES, 42688);
        assert_eq!(KingPiece.padded_num_features(), PADDED_NUM_FEATURES);
    }

    #[test]
    fn test_table_is_a_bijection_per_perspective() {
        let table = build_piece_table();

        for perspective in Color::ALL {
            let mut seen = vec![false; PIECE_INPUT_SIZE];
            for king in Square::all() {
                for piece in (0..12).map(Piece::from_index) {
                    for square in Square::all() {
                        let index = table[table_index(perspective, king, piece, square)];
                        if is_excluded(perspective, king, piece, square) {
                            assert_eq!(index, UNUSED);
                            continue;
                        }
                        let index = index as usize;
                        assert!(index < PIECE_INPUT_SIZE);
                        assert!(!seen[index], "duplicate index {}", index);
                        seen[index] = true;
                    }
                }
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn test_first_indices() {
        // king on a1: the first slots are white pawns on a2..h2
        let first = Square::from_ascii(b"a2").unwrap();
        let pawn = Piece::new(Color::White, Role::Pawn);
        assert_eq!(piece_feature(Color::White, Square::A1, pawn, first), Some(0));
        assert_eq!(piece_feature(Color::Black, Square::A1, pawn, first), Some(0));
        assert_eq!(piece_feature(Color::White, Square::A1, pawn, Square::A1), None);

        let black_king = Piece::new(Color::Black, Role::King);
        let b2 = Square::from_ascii(b"b2").unwrap();
        assert_eq!(piece_feature(Color::White, Square::A1, black_king, b2), None);
        assert!(piece_feature(Color::Black, Square::A1, black_king, b2).is_none());
    }

    #[test]
    fn test_startpos_features() {
        let pos = Position::startpos();
        let mut features = vec![];
        KingPiece.active_features(&pos, Color::White, &mut features);

        // 31 pieces besides the own king, 4 castling rights
        assert_eq!(features.len(), 35);
        let misc = (PIECE_INPUT_SIZE + Square::E1.index() * MISC_SIZE) as u16;
        assert_eq!(&features[31..], &[misc, misc + 1, misc + 2, misc + 3]);
    }

    #[test]
    fn test_en_passant_slot() {
        let pos = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let mut features = vec![];
        KingPiece.active_features(&pos, Color::Black, &mut features);

        let misc = PIECE_INPUT_SIZE + Square::E8.index() * MISC_SIZE;
        assert_eq!(features.len(), 4);
        assert_eq!(*features.last().unwrap() as usize, misc + CASTLING_SIZE + 3);
    }
}
