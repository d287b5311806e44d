use crate::attacks::{king_attacks, line, AttackPattern, PieceMover};
use crate::bitboard::Bitboard;
use crate::position::Position;
use crate::types::{CastlingRights, Piece, Role, Square};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanError {
    #[error("empty move")]
    Empty,
    #[error("malformed move {0:?}")]
    Syntax(String),
    #[error("unknown piece letter {0:?}")]
    UnknownPiece(char),
    #[error("invalid square in {0:?}")]
    InvalidSquare(String),
    #[error("no {role:?} can reach {to}")]
    NoCandidate { role: Role, to: Square },
    #[error("ambiguous move {0:?}")]
    Ambiguous(String),
    #[error("no piece to move on {0}")]
    MissingPiece(Square),
    #[error("nothing to capture on {0}")]
    EmptyCapture(Square),
    #[error("cannot capture own piece on {0}")]
    OwnCapture(Square),
    #[error("cannot capture the king on {0}")]
    KingCapture(Square),
    #[error("pawn push to occupied square {0}")]
    Blocked(Square),
    #[error("promotion piece missing or misplaced in {0:?}")]
    Promotion(String),
    #[error("castling without a rook on {0}")]
    NoCastlingRook(Square),
}

fn parse_square(token: &str, s: &[u8]) -> Result<Square, SanError> {
    Square::from_ascii(s).ok_or_else(|| SanError::InvalidSquare(token.to_owned()))
}

impl Position {
    /// Applies a single SAN move for the side to move.
    ///
    /// The move is trusted to be legal: only pins are considered when a
    /// piece move is ambiguous. On error the position is left untouched.
    pub fn play_san(&mut self, san: &str) -> Result<(), SanError> {
        let token = san.trim_end_matches(['+', '#', '!', '?']);

        match token.as_bytes().first() {
            None => Err(SanError::Empty),
            Some(b'O' | b'0') => self.play_castle(token),
            Some(b'a'..=b'h') => self.play_pawn(token),
            Some(b'K') => self.play_king(token),
            Some(&c) => {
                let mover = PieceMover::from_letter(c).ok_or(SanError::UnknownPiece(c as char))?;
                self.play_piece(mover, token)
            }
        }
    }

    fn play_pawn(&mut self, token: &str) -> Result<(), SanError> {
        let bytes = token.as_bytes();
        let us = self.turn;

        let (from_file, rest) = match bytes {
            [f, b'x', rest @ ..] => (Some(f - b'a'), rest),
            _ => (None, bytes),
        };
        if rest.len() < 2 {
            return Err(SanError::Syntax(token.to_owned()));
        }
        let to = parse_square(token, &rest[..2])?;

        let promotion = match &rest[2..] {
            [] => None,
            [b'=', c] | [c] => match Role::from_upper_char(*c) {
                Some(role @ (Role::Knight | Role::Bishop | Role::Rook | Role::Queen)) => Some(role),
                _ => return Err(SanError::UnknownPiece(*c as char)),
            },
            _ => return Err(SanError::Syntax(token.to_owned())),
        };
        let last_rank = Square::A8.relative_to(us).rank();
        if promotion.is_some() != (to.rank() == last_rank) {
            return Err(SanError::Promotion(token.to_owned()));
        }

        let behind = to
            .offset(-us.push())
            .ok_or_else(|| SanError::InvalidSquare(token.to_owned()))?;
        let our_pawn = Piece::new(us, Role::Pawn);

        let mut ep_target = None;
        let (from, captured) = match from_file {
            None => {
                if self.occupied().contains(to) {
                    return Err(SanError::Blocked(to));
                }
                if self.piece_at(behind) == Some(our_pawn) {
                    (behind, None)
                } else {
                    let start = behind.offset(-us.push());
                    let double_push_rank = Square::from_coords(0, 1).relative_to(us).rank();
                    match start {
                        Some(start)
                            if self.piece_at(behind).is_none()
                                && self.piece_at(start) == Some(our_pawn)
                                && start.rank() == double_push_rank =>
                        {
                            ep_target = Some(behind);
                            (start, None)
                        }
                        _ => return Err(SanError::NoCandidate { role: Role::Pawn, to }),
                    }
                }
            }
            Some(file) => {
                if (file as i8 - to.file() as i8).abs() != 1 {
                    return Err(SanError::Syntax(token.to_owned()));
                }
                let from = Square::from_coords(file, behind.rank());
                if self.piece_at(from) != Some(our_pawn) {
                    return Err(SanError::MissingPiece(from));
                }
                let captured = match self.piece_at(to) {
                    Some(piece) if piece.color == us => return Err(SanError::OwnCapture(to)),
                    Some(piece) if piece.role == Role::King => return Err(SanError::KingCapture(to)),
                    Some(_) => to,
                    // en passant: the pawn sits beside the origin, behind the target
                    None if self.ep_square == Some(to) => Square::from_coords(to.file(), from.rank()),
                    None => return Err(SanError::EmptyCapture(to)),
                };
                (from, Some(captured))
            }
        };

        if let Some(square) = captured {
            self.remove_piece(square);
            self.castles.remove(CastlingRights::of_corner(square));
        }
        self.move_piece(from, to);
        if let Some(role) = promotion {
            self.remove_piece(to);
            self.set_piece(to, Piece::new(us, role));
        }

        self.finish_move(true, ep_target);
        Ok(())
    }

    fn play_piece(&mut self, mover: PieceMover, token: &str) -> Result<(), SanError> {
        let bytes = token.as_bytes();
        if bytes.len() < 3 {
            return Err(SanError::Syntax(token.to_owned()));
        }
        let to = parse_square(token, &bytes[bytes.len() - 2..])?;

        let mut capture = false;
        let mut candidates = mover.attacks(to, self.occupied()) & self.our(mover.role());
        for &c in &bytes[1..bytes.len() - 2] {
            match c {
                b'x' => capture = true,
                b'a'..=b'h' => candidates &= Bitboard::from_file(c - b'a'),
                b'1'..=b'8' => candidates &= Bitboard::from_rank(c - b'1'),
                _ => return Err(SanError::Syntax(token.to_owned())),
            }
        }

        let from = self.disambiguate(candidates, to, mover.role(), token)?;
        self.play_regular(from, to, capture)
    }

    /// Picks the single origin among `candidates`, discarding pinned pieces
    /// that would leave the line to their king
    fn disambiguate(
        &self,
        mut candidates: Bitboard,
        to: Square,
        role: Role,
        token: &str,
    ) -> Result<Square, SanError> {
        if candidates.more_than_one() {
            let king = self.king_of(self.turn);
            let pinned = self.pinned();
            candidates = candidates
                .into_iter()
                .filter(|&from| !pinned.contains(from) || line(king, from).contains(to))
                .collect();
        }

        if candidates.more_than_one() {
            return Err(SanError::Ambiguous(token.to_owned()));
        }
        candidates.first().ok_or(SanError::NoCandidate { role, to })
    }

    fn play_king(&mut self, token: &str) -> Result<(), SanError> {
        let bytes = token.as_bytes();
        let (capture, square) = match bytes {
            [b'K', b'x', square @ ..] => (true, square),
            [b'K', square @ ..] => (false, square),
            _ => return Err(SanError::Syntax(token.to_owned())),
        };
        let to = parse_square(token, square)?;
        let from = self.king_of(self.turn);
        if !king_attacks(from).contains(to) {
            return Err(SanError::NoCandidate { role: Role::King, to });
        }
        self.play_regular(from, to, capture)
    }

    fn play_castle(&mut self, token: &str) -> Result<(), SanError> {
        let us = self.turn;
        let (king_to, rook_from, rook_to) = match token {
            "O-O" | "0-0" => (Square::G1, Square::H1, Square::F1),
            "O-O-O" | "0-0-0" => (Square::C1, Square::A1, Square::D1),
            _ => return Err(SanError::Syntax(token.to_owned())),
        };
        let king_to = king_to.relative_to(us);
        let rook_from = rook_from.relative_to(us);
        let rook_to = rook_to.relative_to(us);

        let king_from = self.king_of(us);
        if king_from != Square::E1.relative_to(us) {
            return Err(SanError::NoCandidate { role: Role::King, to: king_to });
        }
        if self.piece_at(rook_from) != Some(Piece::new(us, Role::Rook)) {
            return Err(SanError::NoCastlingRook(rook_from));
        }

        self.move_piece(king_from, king_to);
        self.move_piece(rook_from, rook_to);
        self.castles.remove(CastlingRights::of_color(us));

        self.finish_move(false, None);
        Ok(())
    }

    /// Moves a non-pawn piece, capturing whatever stands on `to`
    fn play_regular(&mut self, from: Square, to: Square, capture: bool) -> Result<(), SanError> {
        let piece = self.piece_at(from).ok_or(SanError::MissingPiece(from))?;
        let captured = match self.piece_at(to) {
            Some(target) if target.color == piece.color => return Err(SanError::OwnCapture(to)),
            Some(target) if target.role == Role::King => return Err(SanError::KingCapture(to)),
            Some(_) => true,
            None if capture => return Err(SanError::EmptyCapture(to)),
            None => false,
        };

        if captured {
            self.remove_piece(to);
        }
        self.move_piece(from, to);

        if piece.role == Role::King {
            self.castles.remove(CastlingRights::of_color(piece.color));
        }
        self.castles.remove(CastlingRights::of_corner(from));
        self.castles.remove(CastlingRights::of_corner(to));

        self.finish_move(captured, None);
        Ok(())
    }

    fn finish_move(&mut self, reset_clock: bool, ep_square: Option<Square>) {
        self.halfmoves = if reset_clock { 0 } else { self.halfmoves.saturating_add(1) };
        self.ep_square = ep_square;
        self.turn = self.turn.other();
        self.ply = self.ply.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    fn sq(s: &str) -> Square {
        Square::from_ascii(s.as_bytes()).unwrap()
    }

    fn play(fen: &str, moves: &[&str]) -> Position {
        let mut pos = Position::from_fen(fen).unwrap();
        for san in moves {
            pos.play_san(san).unwrap_or_else(|e| panic!("{}: {}", san, e));
            assert!(pos.is_consistent());
        }
        pos
    }

    #[test]
    fn test_pawn_push_and_double_push() {
        let pos = play(crate::fen::STARTING_FEN, &["e4"]);
        assert_eq!(
            pos.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );

        let pos = play(crate::fen::STARTING_FEN, &["e3", "d6"]);
        assert_eq!(pos.ep_square(), None);
        assert_eq!(pos.piece_at(sq("e3")), Some(Piece::new(Color::White, Role::Pawn)));
        assert_eq!(pos.piece_at(sq("d6")), Some(Piece::new(Color::Black, Role::Pawn)));
        assert_eq!(pos.fullmoves(), 2);
    }

    #[test]
    fn test_en_passant_capture() {
        let pos = play(crate::fen::STARTING_FEN, &["e4", "a6", "e5", "d5", "exd6"]);
        assert_eq!(pos.piece_at(sq("d6")), Some(Piece::new(Color::White, Role::Pawn)));
        assert_eq!(pos.piece_at(sq("d5")), None);
        assert_eq!(pos.piece_at(sq("e5")), None);
        assert_eq!(pos.halfmoves(), 0);
        assert_eq!(pos.ep_square(), None);
    }

    #[test]
    fn test_promotion() {
        let pos = play("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1", &["b8=Q+"]);
        assert_eq!(pos.piece_at(sq("b8")), Some(Piece::new(Color::White, Role::Queen)));

        let pos = play("r3k3/1P6/8/8/8/8/8/4K3 w q - 3 1", &["bxa8N"]);
        assert_eq!(pos.piece_at(sq("a8")), Some(Piece::new(Color::White, Role::Knight)));
        assert_eq!(pos.castles(), CastlingRights::NONE);
        assert_eq!(pos.halfmoves(), 0);

        let pos = play("4k3/8/8/8/8/8/6p1/4K3 b - - 0 1", &["g1=R"]);
        assert_eq!(pos.piece_at(sq("g1")), Some(Piece::new(Color::Black, Role::Rook)));

        let mut pos = Position::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.play_san("b8"), Err(SanError::Promotion("b8".to_owned())));
        assert_eq!(pos.play_san("b8=K"), Err(SanError::UnknownPiece('K')));
    }

    #[test]
    fn test_scholars_mate() {
        let pos = play(
            crate::fen::STARTING_FEN,
            &["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7#"],
        );
        assert_eq!(pos.piece_at(sq("f7")), Some(Piece::new(Color::White, Role::Queen)));
        assert_eq!(pos.castles(), CastlingRights::ALL);
        assert_eq!(pos.turn(), Color::Black);
        assert_eq!(pos.ply(), 7);
    }

    #[test]
    fn test_castling() {
        let pos = play("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", &["O-O"]);
        assert_eq!(pos.piece_at(Square::G1), Some(Piece::new(Color::White, Role::King)));
        assert_eq!(pos.piece_at(Square::F1), Some(Piece::new(Color::White, Role::Rook)));
        assert_eq!(pos.piece_at(Square::H1), None);
        assert_eq!(pos.castles(), CastlingRights::of_color(Color::Black));
        assert_eq!(pos.halfmoves(), 1);

        let pos = play("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1", &["0-0-0"]);
        assert_eq!(pos.piece_at(sq("c8")), Some(Piece::new(Color::Black, Role::King)));
        assert_eq!(pos.piece_at(sq("d8")), Some(Piece::new(Color::Black, Role::Rook)));
        assert_eq!(pos.castles(), CastlingRights::of_color(Color::White));

        let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.play_san("O-O"), Err(SanError::NoCastlingRook(Square::H1)));
    }

    #[test]
    fn test_rights_cleared_by_rook_and_king_moves() {
        let pos = play("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", &["Rb1", "Kf8"]);
        assert_eq!(pos.castles(), CastlingRights::WHITE_KING_SIDE);

        let pos = play("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", &["Rxh8+"]);
        let mut expected = CastlingRights::WHITE_QUEEN_SIDE;
        expected.insert(CastlingRights::BLACK_QUEEN_SIDE);
        assert_eq!(pos.castles(), expected);
    }

    #[test]
    fn test_disambiguation() {
        // both knights reach d2
        let pos = play("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1", &["Nbd2"]);
        assert_eq!(pos.piece_at(sq("d2")), Some(Piece::new(Color::White, Role::Knight)));
        assert_eq!(pos.piece_at(sq("b1")), None);
        assert_eq!(pos.piece_at(sq("f1")), Some(Piece::new(Color::White, Role::Knight)));

        // both rooks on the a-file reach a4
        let pos = play("4k3/R7/8/8/8/8/8/R3K3 w - - 0 1", &["R1a4"]);
        assert_eq!(pos.piece_at(sq("a7")), Some(Piece::new(Color::White, Role::Rook)));
        assert_eq!(pos.piece_at(Square::A1), None);

        let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1").unwrap();
        assert_eq!(pos.play_san("Nd2"), Err(SanError::Ambiguous("Nd2".to_owned())));
    }

    #[test]
    fn test_pinned_candidate_is_discarded() {
        // the e2 knight is pinned against the king by the e8 rook
        let pos = play("k3r3/8/8/8/8/8/2N1N3/4K3 w - - 0 1", &["Nd4"]);
        assert_eq!(pos.piece_at(sq("e2")), Some(Piece::new(Color::White, Role::Knight)));
        assert_eq!(pos.piece_at(sq("d4")), Some(Piece::new(Color::White, Role::Knight)));
        assert_eq!(pos.piece_at(sq("c2")), None);
    }

    #[test]
    fn test_pinned_candidate_moving_along_the_pin() {
        // the e2 rook is pinned but e4 stays on the pin line
        let mut pos = Position::from_fen("k3r3/8/8/8/7R/8/4R3/4K3 w - - 0 1").unwrap();
        assert_eq!(pos.play_san("Re4"), Err(SanError::Ambiguous("Re4".to_owned())));

        pos.play_san("Rhe4").unwrap();
        assert_eq!(pos.piece_at(sq("e2")), Some(Piece::new(Color::White, Role::Rook)));
        assert_eq!(pos.piece_at(sq("e4")), Some(Piece::new(Color::White, Role::Rook)));
    }

    #[test]
    fn test_errors_leave_position_untouched() {
        let mut pos = Position::startpos();
        let before = pos.clone();
        assert_eq!(pos.play_san(""), Err(SanError::Empty));
        assert_eq!(pos.play_san("Ze4"), Err(SanError::UnknownPiece('Z')));
        assert_eq!(pos.play_san("Nd4"), Err(SanError::NoCandidate { role: Role::Knight, to: sq("d4") }));
        assert_eq!(pos.play_san("exd3"), Err(SanError::EmptyCapture(sq("d3"))));
        assert_eq!(pos.play_san("e5"), Err(SanError::NoCandidate { role: Role::Pawn, to: sq("e5") }));
        assert_eq!(pos.play_san("Nxd2"), Err(SanError::OwnCapture(sq("d2"))));
        assert_eq!(pos.play_san("Ke2"), Err(SanError::OwnCapture(sq("e2"))));
        assert_eq!(pos.play_san("Nz3"), Err(SanError::InvalidSquare("Nz3".to_owned())));
        assert_eq!(pos, before);

        // every side keeps its king
        let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/4RK2 w - - 0 1").unwrap();
        let before = pos.clone();
        assert_eq!(pos.play_san("Rxe8"), Err(SanError::KingCapture(sq("e8"))));
        assert_eq!(pos, before);

        let mut pos = Position::from_fen("8/8/8/8/8/3k4/4P3/4K3 w - - 0 1").unwrap();
        let before = pos.clone();
        assert_eq!(pos.play_san("exd3"), Err(SanError::KingCapture(sq("d3"))));
        assert_eq!(pos, before);
        assert_eq!(pos.play_san("Kf2"), Ok(()));
    }
}
