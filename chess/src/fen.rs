use crate::position::Position;
use crate::types::{CastlingRights, Color, Piece, Role, Square};
use std::fmt::Write;
use std::sync::LazyLock;
use thiserror::Error;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("missing FEN field: {0}")]
    MissingField(&'static str),
    #[error("unexpected character {0:?} in piece placement")]
    InvalidPlacementChar(char),
    #[error("piece placement does not cover 8 ranks of 8 files")]
    InvalidBoardShape,
    #[error("invalid side to move {0:?}")]
    InvalidTurn(String),
    #[error("invalid castling field {0:?}")]
    InvalidCastling(String),
    #[error("invalid en passant square {0:?}")]
    InvalidEpSquare(String),
    #[error("invalid move counter {0:?}")]
    InvalidCounter(String),
    #[error("expected one king per side")]
    InvalidKings,
    #[error("trailing data after FEN: {0:?}")]
    TrailingData(String),
}

/// What a single placement character does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenAction {
    Place(Piece),
    Skip(u8),
    NextRank,
    Invalid,
}

static DECODE: LazyLock<[FenAction; 128]> = LazyLock::new(build_decode_table);

fn build_decode_table() -> [FenAction; 128] {
    let mut table = [FenAction::Invalid; 128];

    for role in Role::ALL {
        let upper = role.upper_char() as u8;
        table[upper as usize] = FenAction::Place(Piece::new(Color::White, role));
        table[upper.to_ascii_lowercase() as usize] = FenAction::Place(Piece::new(Color::Black, role));
    }
    for n in 1..=8u8 {
        table[(b'0' + n) as usize] = FenAction::Skip(n);
    }
    table[b'/' as usize] = FenAction::NextRank;

    table
}

fn decode(c: u8) -> FenAction {
    DECODE.get(c as usize).copied().unwrap_or(FenAction::Invalid)
}

fn parse_placement(pos: &mut Position, placement: &str) -> Result<(), FenError> {
    let mut rank: u8 = 7;
    let mut file: u8 = 0;

    for c in placement.bytes() {
        match decode(c) {
            FenAction::Place(piece) => {
                if file >= 8 {
                    return Err(FenError::InvalidBoardShape);
                }
                pos.set_piece(Square::from_coords(file, rank), piece);
                file += 1;
            }
            FenAction::Skip(n) => {
                file += n;
                if file > 8 {
                    return Err(FenError::InvalidBoardShape);
                }
            }
            FenAction::NextRank => {
                if file != 8 || rank == 0 {
                    return Err(FenError::InvalidBoardShape);
                }
                rank -= 1;
                file = 0;
            }
            FenAction::Invalid => return Err(FenError::InvalidPlacementChar(c as char)),
        }
    }

    if rank != 0 || file != 8 {
        return Err(FenError::InvalidBoardShape);
    }
    Ok(())
}

fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::NONE;
    if field == "-" {
        return Ok(rights);
    }
    for c in field.chars() {
        let right = CastlingRights::EACH
            .into_iter()
            .find(|r| r.fen_char() == c)
            .ok_or_else(|| FenError::InvalidCastling(field.to_owned()))?;
        rights.insert(right);
    }
    Ok(rights)
}

fn parse_counter(field: &str) -> Result<u32, FenError> {
    field
        .parse()
        .map_err(|_| FenError::InvalidCounter(field.to_owned()))
}

pub(crate) fn parse(fen: &str) -> Result<Position, FenError> {
    let mut fields = fen.split_ascii_whitespace();
    let mut pos = Position::empty();

    let placement = fields.next().ok_or(FenError::MissingField("placement"))?;
    parse_placement(&mut pos, placement)?;
    for color in Color::ALL {
        if pos.by_piece(Piece::new(color, Role::King)).count() != 1 {
            return Err(FenError::InvalidKings);
        }
    }

    pos.turn = match fields.next().ok_or(FenError::MissingField("side to move"))? {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenError::InvalidTurn(other.to_owned())),
    };

    pos.castles = parse_castling(fields.next().ok_or(FenError::MissingField("castling"))?)?;

    pos.ep_square = match fields.next().ok_or(FenError::MissingField("en passant"))? {
        "-" => None,
        field => Some(
            Square::from_ascii(field.as_bytes())
                .ok_or_else(|| FenError::InvalidEpSquare(field.to_owned()))?,
        ),
    };

    // the clocks are optional
    pos.halfmoves = fields.next().map(parse_counter).transpose()?.unwrap_or(0);
    let fullmoves = fields.next().map(parse_counter).transpose()?.unwrap_or(1).max(1);
    pos.ply = (fullmoves - 1)
        .checked_mul(2)
        .and_then(|ply| ply.checked_add(pos.turn as u32))
        .ok_or_else(|| FenError::InvalidCounter(fullmoves.to_string()))?;

    if let Some(extra) = fields.next() {
        return Err(FenError::TrailingData(extra.to_owned()));
    }

    Ok(pos)
}

pub(crate) fn serialize(pos: &Position) -> String {
    let mut fen = String::with_capacity(90);

    for rank in (0..8).rev() {
        let mut empty = 0;
        for file in 0..8 {
            match pos.piece_at(Square::from_coords(file, rank)) {
                Some(piece) => {
                    if empty > 0 {
                        fen.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    fen.push(piece.fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            fen.push((b'0' + empty) as char);
        }
        if rank > 0 {
            fen.push('/');
        }
    }

    fen.push(' ');
    fen.push(pos.turn().char());

    fen.push(' ');
    if pos.castles().is_empty() {
        fen.push('-');
    } else {
        for right in CastlingRights::EACH {
            if pos.castles().has(right) {
                fen.push(right.fen_char());
            }
        }
    }

    fen.push(' ');
    match pos.ep_square() {
        Some(square) => fen.push_str(&square.to_string()),
        None => fen.push('-'),
    }

    write!(fen, " {} {}", pos.halfmoves(), pos.fullmoves()).ok();
    fen
}
