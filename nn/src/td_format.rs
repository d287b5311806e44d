//! Binary training-data format (`.td`).
//!
//! A corpus is a plain sequence of records with no header or footer:
//!
//! ```text
//! [u8 L][L bytes ASCII FEN][i16 LE score][i8 result]
//! ```
//!
//! The result is relative to the side to move of the record.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chess::FenError;
use std::io::{self, Write};
use thiserror::Error;

/// Bytes of a record that follow the FEN: score and result
const TRAILER_SIZE: usize = 3;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("FEN of {0} bytes does not fit in a record")]
    FenTooLong(usize),
    #[error("record at offset {offset} holds a non-ASCII FEN")]
    NonAsciiFen { offset: usize },
    #[error("record at offset {offset} holds an invalid FEN {fen:?}: {source}")]
    InvalidFen {
        offset: usize,
        fen: String,
        #[source]
        source: FenError,
    },
    #[error("record at offset {offset} has result {result}, expected -1, 0 or 1")]
    InvalidResult { offset: usize, result: i8 },
    #[error("skip probability {0} is not in [0, 1]")]
    InvalidSkipProbability(f64),
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
}

/// One annotated position, as stored on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingRecord {
    pub fen: String,
    /// Evaluation in centipawns (or mate score) from the side to move
    pub score: i16,
    /// Game outcome from the side to move: -1, 0 or 1
    pub result: i8,
}

impl TrainingRecord {
    pub fn encoded_size(&self) -> usize {
        1 + self.fen.len() + TRAILER_SIZE
    }
}

/// Streams records into any writer
pub struct RecordWriter<W: Write> {
    writer: W,
    records_written: u64,
    bytes_written: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> RecordWriter<W> {
        RecordWriter {
            writer,
            records_written: 0,
            bytes_written: 0,
        }
    }

    pub fn write_record(&mut self, record: &TrainingRecord) -> Result<(), CorpusError> {
        let len = u8::try_from(record.fen.len())
            .map_err(|_| CorpusError::FenTooLong(record.fen.len()))?;

        self.writer.write_u8(len)?;
        self.writer.write_all(record.fen.as_bytes())?;
        self.writer.write_i16::<LittleEndian>(record.score)?;
        self.writer.write_i8(record.result)?;

        self.records_written += 1;
        self.bytes_written += record.encoded_size() as u64;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// A record borrowed from the corpus buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    /// Offset of the length byte in the corpus
    pub offset: usize,
    pub fen: &'a [u8],
    pub score: i16,
    pub result: i8,
}

impl RawRecord<'_> {
    pub fn to_record(&self) -> Result<TrainingRecord, CorpusError> {
        if !self.fen.is_ascii() {
            return Err(CorpusError::NonAsciiFen {
                offset: self.offset,
            });
        }
        if !(-1..=1).contains(&self.result) {
            return Err(CorpusError::InvalidResult {
                offset: self.offset,
                result: self.result,
            });
        }

        Ok(TrainingRecord {
            // ASCII was checked above
            fen: String::from_utf8_lossy(self.fen).into_owned(),
            score: self.score,
            result: self.result,
        })
    }
}

/// Walks the records of an in-memory corpus.
///
/// A record that would extend past the end of the buffer ends the walk: a
/// truncated trailing record is never returned.
pub struct RecordReader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8]) -> RecordReader<'a> {
        RecordReader::at(data, 0)
    }

    /// Resumes reading at a byte offset previously returned by `position`
    pub fn at(data: &'a [u8], cursor: usize) -> RecordReader<'a> {
        RecordReader { data, cursor }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.cursor)
    }

    pub fn next_raw(&mut self) -> Option<RawRecord<'a>> {
        let offset = self.cursor;
        let mut rest = self.data.get(offset..)?;

        let len = rest.read_u8().ok()? as usize;
        if rest.len() < len + TRAILER_SIZE {
            return None;
        }
        let (fen, mut trailer) = rest.split_at(len);
        let score = trailer.read_i16::<LittleEndian>().ok()?;
        let result = trailer.read_i8().ok()?;

        self.cursor = offset + 1 + len + TRAILER_SIZE;
        Some(RawRecord {
            offset,
            fen,
            score,
            result,
        })
    }

    /// Steps over one record without decoding it. Returns `false` at the end
    /// of the corpus.
    pub fn skip_record(&mut self) -> bool {
        self.next_raw().is_some()
    }

    pub fn next_record(&mut self) -> Result<Option<TrainingRecord>, CorpusError> {
        self.next_raw().map(|raw| raw.to_record()).transpose()
    }
}

impl<'a> Iterator for RecordReader<'a> {
    type Item = RawRecord<'a>;

    fn next(&mut self) -> Option<RawRecord<'a>> {
        self.next_raw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fen: &str, score: i16, result: i8) -> TrainingRecord {
        TrainingRecord {
            fen: fen.to_owned(),
            score,
            result,
        }
    }

    #[test]
    fn test_wire_layout() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_record(&record("abc", -2, -1)).unwrap();
        assert_eq!(writer.records_written(), 1);
        assert_eq!(writer.bytes_written(), 7);
        assert_eq!(writer.into_inner(), vec![3, b'a', b'b', b'c', 0xfe, 0xff, 0xff]);
    }

    #[test]
    fn test_read_back() {
        let records = [
            record(chess::STARTING_FEN, 20, 1),
            record("4k3/8/8/8/8/8/8/4K3 b - - 0 1", -15, -1),
            record("4k3/8/8/8/8/8/8/4K3 w - - 0 1", i16::MIN, 0),
        ];

        let mut writer = RecordWriter::new(Vec::new());
        for r in &records {
            writer.write_record(r).unwrap();
        }
        let data = writer.into_inner();

        let mut reader = RecordReader::new(&data);
        for r in &records {
            assert_eq!(reader.next_record().unwrap().as_ref(), Some(r));
        }
        assert_eq!(reader.next_record().unwrap(), None);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_truncated_record_ends_the_walk() {
        let mut writer = RecordWriter::new(Vec::new());
        writer.write_record(&record("first", 1, 0)).unwrap();
        writer.write_record(&record("second", 2, 0)).unwrap();
        let data = writer.into_inner();

        // every cut inside the second record keeps only the first
        for cut in data.len() - 9..data.len() {
            let raws: Vec<_> = RecordReader::new(&data[..cut]).collect();
            assert_eq!(raws.len(), 1, "cut at {}", cut);
            assert_eq!(raws[0].fen, b"first");
        }
        assert_eq!(RecordReader::new(&data).count(), 2);
    }

    #[test]
    fn test_skip_and_resume() {
        let mut writer = RecordWriter::new(Vec::new());
        for i in 0..3 {
            writer.write_record(&record("x", i, 0)).unwrap();
        }
        let data = writer.into_inner();

        let mut reader = RecordReader::new(&data);
        assert!(reader.skip_record());
        let resumed = RecordReader::at(&data, reader.position()).next_raw().unwrap();
        assert_eq!(resumed.score, 1);
        assert_eq!(resumed.offset, 5);
    }

    #[test]
    fn test_rejects_bad_records() {
        let mut writer = RecordWriter::new(Vec::new());
        let long = "x".repeat(256);
        assert!(matches!(
            writer.write_record(&record(&long, 0, 0)),
            Err(CorpusError::FenTooLong(256))
        ));
        assert_eq!(writer.records_written(), 0);

        let data = [1, 0xC3, 0, 0, 0];
        assert!(matches!(
            RecordReader::new(&data).next_record(),
            Err(CorpusError::NonAsciiFen { offset: 0 })
        ));

        let data = [1, b'x', 0, 0, 5];
        assert!(matches!(
            RecordReader::new(&data).next_record(),
            Err(CorpusError::InvalidResult { result: 5, .. })
        ));
    }
}
