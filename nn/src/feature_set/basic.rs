use super::{FeatureSet, MAX_ACTIVE_FEATURES};
use chess::{Color, Piece, Position, Role, Square};

/// The basic feature set
/// Tuple: <piece_square, piece_role, is_ours>
///
/// Squares are flipped for the black perspective so that the perspective's
/// own pieces always start on the bottom ranks.
pub struct Basic;

impl Basic {
    fn make_index(square: Square, piece: Piece, perspective: Color) -> u16 {
        let channel = piece.role as u16 + if piece.color == perspective { 0 } else { 6 };
        channel * 64 + square.relative_to(perspective).index() as u16
    }
}

impl FeatureSet for Basic {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn num_features(&self) -> usize {
        64 * Role::ALL.len() * 2 // 768
    }

    fn active_features(&self, position: &Position, perspective: Color, features: &mut Vec<u16>) {
        features.clear();

        for square in position.occupied() {
            if let Some(piece) = position.piece_at(square) {
                features.push(Self::make_index(square, piece, perspective));
            }
        }

        features.sort_unstable();
        assert!(features.len() <= MAX_ACTIVE_FEATURES);
    }
}
