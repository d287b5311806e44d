//! Minimal chess board model: bitboards, FEN and SAN.
//!
//! Only what is needed to replay recorded games is implemented. Moves are
//! trusted to be legal, there is no move generation or check detection.

pub mod attacks;
pub mod bitboard;
pub mod fen;
pub mod position;
pub mod san;
pub mod types;

pub use bitboard::{Bitboard, Direction};
pub use fen::{FenError, STARTING_FEN};
pub use position::Position;
pub use san::SanError;
pub use types::{CastlingRights, Color, Piece, Role, Square};
