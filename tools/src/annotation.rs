//! Engine evaluations embedded in PGN comments, such as `{+0.20/10}` or
//! `{-M3/20}`.

/// Score written for a mate in zero
pub const MATE_SCORE: i32 = 32000;

/// Largest mate distance that still scores above every centipawn value
pub const MAX_MATE_DISTANCE: i32 = 1999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Score in hundredths of a pawn
    Centipawns(i64),
    /// Signed distance to mate in moves, positive when the side to move mates
    Mate(i32),
}

impl Evaluation {
    /// Score as stored in the corpus. Mate distances saturate so that every
    /// mate outranks every centipawn score.
    pub fn score(&self) -> i64 {
        match *self {
            Evaluation::Centipawns(cp) => cp,
            Evaluation::Mate(n) => {
                let distance = n.unsigned_abs().min(MAX_MATE_DISTANCE as u32) as i32;
                let score = (MATE_SCORE - distance) as i64;
                if n < 0 {
                    -score
                } else {
                    score
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub evaluation: Evaluation,
    pub depth: u32,
}

/// Parses one comment token. Unsigned magnitudes are only accepted when they
/// are zero, anything else must carry a sign.
pub fn parse_annotation(token: &str) -> Option<Annotation> {
    let (value, depth) = token.split_once('/')?;
    if depth.is_empty() || !depth.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let depth = depth.parse().ok()?;

    let (negative, magnitude) = match value.as_bytes().first()? {
        b'+' => (false, &value[1..]),
        b'-' => (true, &value[1..]),
        _ => (false, value),
    };
    let signed = magnitude.len() != value.len();

    let evaluation = if let Some(distance) = magnitude.strip_prefix('M') {
        if !signed || distance.is_empty() || !distance.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let distance: i32 = distance.parse().ok()?;
        Evaluation::Mate(if negative { -distance } else { distance })
    } else {
        if !magnitude.bytes().any(|b| b.is_ascii_digit())
            || !magnitude.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        {
            return None;
        }
        let pawns: f64 = magnitude.parse().ok()?;
        if !signed && pawns != 0.0 {
            return None;
        }
        let cp = (pawns * 100.0).round() as i64;
        Evaluation::Centipawns(if negative { -cp } else { cp })
    };

    Some(Annotation { evaluation, depth })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(token: &str) -> Option<i64> {
        parse_annotation(token).map(|a| a.evaluation.score())
    }

    #[test]
    fn test_centipawns() {
        assert_eq!(
            parse_annotation("+0.20/10"),
            Some(Annotation {
                evaluation: Evaluation::Centipawns(20),
                depth: 10
            })
        );
        assert_eq!(score("-0.15/10"), Some(-15));
        assert_eq!(score("+1.07/18"), Some(107));
        assert_eq!(score("-12/3"), Some(-1200));
        assert_eq!(score("0.00/12"), Some(0));
        assert_eq!(score("-0.00/12"), Some(0));
    }

    #[test]
    fn test_mates() {
        assert_eq!(
            parse_annotation("-M3/20"),
            Some(Annotation {
                evaluation: Evaluation::Mate(-3),
                depth: 20
            })
        );
        assert_eq!(score("+M1/5"), Some(31999));
        assert_eq!(score("-M3/20"), Some(-31997));
        assert_eq!(score("+M0/1"), Some(32000));
        // distances saturate above the centipawn range
        assert_eq!(score("+M5000/30"), Some(30001));
        assert_eq!(score("-M99999/30"), Some(-30001));
    }

    #[test]
    fn test_not_annotations() {
        for token in [
            "", "book", "0.20", "+0.20", "+0.20/", "+0.20/x", "0.20/10", "M3/20", "+M/20",
            "+M3.5/20", "+/10", "+./10", "+1.2.3/10", "-0.5s/10", "1/2-1/2",
        ] {
            assert_eq!(parse_annotation(token), None, "{:?}", token);
        }
    }
}
