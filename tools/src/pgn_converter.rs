use crate::annotation::{parse_annotation, Annotation, Evaluation};
use chess::{Color, FenError, Position, SanError};
use clap::Args;
use log::{debug, warn};
use nn::td_format::{CorpusError, RecordWriter, TrainingRecord};
use std::fmt;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Args, Debug, Clone)]
pub struct ConverterConfig {
    /// Centipawn scores above this magnitude are discarded
    #[arg(long, value_name = "cp", default_value = "30000")]
    pub max_eval_score: u16,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            max_eval_score: 30000,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("line {line}: invalid FEN tag {fen:?}: {source}")]
    Fen {
        line: usize,
        fen: String,
        #[source]
        source: FenError,
    },
    #[error("line {line}: can't play {san:?} in {fen}: {source}")]
    San {
        line: usize,
        san: String,
        fen: String,
        #[source]
        source: SanError,
    },
    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionStats {
    pub games: u64,
    pub moves: u64,
    pub records: u64,
    pub invalid_scores: u64,
    /// Annotations with no move of their own in front of them
    pub orphan_annotations: u64,
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} games, {} moves, {} records, {} invalid scores, {} orphan annotations",
            self.games, self.moves, self.records, self.invalid_scores, self.orphan_annotations
        )
    }
}

/// Position before the last move played, waiting for its evaluation
struct Snapshot {
    fen: String,
    turn: Color,
}

/// Replays PGN games line by line and writes one training record per
/// evaluated move.
pub struct Converter<W: Write> {
    config: ConverterConfig,
    writer: RecordWriter<W>,
    stats: ConversionStats,

    position: Position,
    snapshot: Option<Snapshot>,
    /// Result of the current game from white's point of view
    result: i8,

    in_header: bool,
    explicit_fen: bool,
    in_comment: bool,
    variation_depth: usize,
    line: usize,
}

impl<W: Write> Converter<W> {
    pub fn new(writer: W, config: ConverterConfig) -> Converter<W> {
        Converter {
            config,
            writer: RecordWriter::new(writer),
            stats: ConversionStats::default(),
            position: Position::startpos(),
            snapshot: None,
            result: 0,
            in_header: true,
            explicit_fen: false,
            in_comment: false,
            variation_depth: 0,
            line: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.writer.bytes_written()
    }

    /// Converts every line of `reader`. Invalid UTF-8 is replaced, it can
    /// only appear in tag values.
    pub fn convert<R: BufRead>(&mut self, mut reader: R) -> Result<(), ConvertError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);
            self.process_line(&line)?;
        }
    }

    pub fn process_line(&mut self, line: &str) -> Result<(), ConvertError> {
        self.line += 1;
        let line = line.trim();

        if line.is_empty() {
            if self.in_header {
                self.end_header();
            }
            return Ok(());
        }

        if line.starts_with('[') {
            if !self.in_header {
                self.begin_header();
            }
            return self.tag_pair(line);
        }

        if self.in_header {
            self.end_header();
        }
        for token in line.split_whitespace() {
            self.token(token)?;
        }
        Ok(())
    }

    /// Flushes the output and returns it with the final counters
    pub fn finish(mut self) -> Result<(W, ConversionStats), ConvertError> {
        self.writer.flush()?;
        Ok((self.writer.into_inner(), self.stats))
    }

    fn begin_header(&mut self) {
        self.in_header = true;
        self.explicit_fen = false;
        self.in_comment = false;
        self.variation_depth = 0;
        self.snapshot = None;
        self.result = 0;
    }

    fn end_header(&mut self) {
        if !self.explicit_fen {
            self.position = Position::startpos();
        }
        self.in_header = false;
        self.explicit_fen = false;
        self.stats.games += 1;
        debug!("Game {} starts at line {}", self.stats.games, self.line);
    }

    fn tag_pair(&mut self, line: &str) -> Result<(), ConvertError> {
        let Some((key, value)) = parse_tag(line) else {
            debug!("Ignoring malformed tag pair at line {}: {}", self.line, line);
            return Ok(());
        };

        match key {
            "Result" => {
                self.result = match value {
                    "1-0" => 1,
                    "0-1" => -1,
                    _ => 0,
                };
            }
            "FEN" => {
                self.position = Position::from_fen(value).map_err(|source| ConvertError::Fen {
                    line: self.line,
                    fen: value.to_owned(),
                    source,
                })?;
                self.explicit_fen = true;
            }
            _ => {}
        }
        Ok(())
    }

    fn token(&mut self, token: &str) -> Result<(), ConvertError> {
        if self.in_comment {
            return self.comment_token(token);
        }

        let opened = token.len() - token.trim_start_matches('(').len();
        self.variation_depth += opened;
        let token = &token[opened..];
        if let Some(rest) = token.strip_prefix('{') {
            self.in_comment = true;
            return self.comment_token(rest);
        }

        let core = token.trim_end_matches(')');
        let closed = token.len() - core.len();

        if self.variation_depth == 0 {
            if let Some(san) = move_token(core) {
                self.play(san)?;
            }
        }
        self.variation_depth = self.variation_depth.saturating_sub(closed);
        Ok(())
    }

    /// Handles a token inside a comment. Text glued after the closing brace,
    /// such as the `)` of `{+0.10/5})`, is move text again.
    fn comment_token(&mut self, token: &str) -> Result<(), ConvertError> {
        let (text, rest) = match token.find('}') {
            Some(end) => (&token[..end], Some(&token[end + 1..])),
            None => (token, None),
        };

        if self.variation_depth == 0 {
            if let Some(annotation) = parse_annotation(text) {
                self.record(annotation)?;
            }
        }

        match rest {
            Some(rest) => {
                self.in_comment = false;
                if rest.is_empty() {
                    Ok(())
                } else {
                    self.token(rest)
                }
            }
            None => Ok(()),
        }
    }

    fn play(&mut self, san: &str) -> Result<(), ConvertError> {
        let fen = self.position.to_fen();
        if let Err(source) = self.position.play_san(san) {
            return Err(ConvertError::San {
                line: self.line,
                san: san.to_owned(),
                fen,
                source,
            });
        }

        // the turn has already passed to the other side
        self.snapshot = Some(Snapshot {
            fen,
            turn: self.position.turn().other(),
        });
        self.stats.moves += 1;
        Ok(())
    }

    fn record(&mut self, annotation: Annotation) -> Result<(), ConvertError> {
        let Some(snapshot) = self.snapshot.take() else {
            self.stats.orphan_annotations += 1;
            debug!("Annotation without a move at line {}", self.line);
            return Ok(());
        };

        let score = annotation.evaluation.score();
        if let Evaluation::Centipawns(cp) = annotation.evaluation {
            if cp.unsigned_abs() > self.config.max_eval_score as u64 {
                self.stats.invalid_scores += 1;
                warn!("Discarding score {} at line {} ({})", cp, self.line, snapshot.fen);
                return Ok(());
            }
        }

        let result = match snapshot.turn {
            Color::White => self.result,
            Color::Black => -self.result,
        };
        self.writer.write_record(&TrainingRecord {
            fen: snapshot.fen,
            // --max-eval-score may be set beyond the i16 range
            score: score.clamp(i16::MIN as i64, i16::MAX as i64) as i16,
            result,
        })?;
        self.stats.records += 1;
        Ok(())
    }
}

/// Splits `[Key "Value"]` into its key and unquoted value
fn parse_tag(line: &str) -> Option<(&str, &str)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    let (key, value) = inner.split_once(char::is_whitespace)?;
    let value = value.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some((key, value))
}

/// Returns the move of a move-text token, or `None` for move numbers,
/// results and NAGs. Move numbers may be glued to the move (`12.e4`).
fn move_token(token: &str) -> Option<&str> {
    if token.is_empty() || token.starts_with('$') {
        return None;
    }
    if matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*") {
        return None;
    }

    let digits = token.len() - token.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let token = if digits > 0 && token[digits..].starts_with('.') {
        token[digits..].trim_start_matches('.')
    } else {
        token
    };
    (!token.is_empty()).then_some(token)
}
