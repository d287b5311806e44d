use crate::feature_set::{FeatureSet, MAX_ACTIVE_FEATURES};
use crate::td_format::{CorpusError, RawRecord, TrainingRecord};
use chess::{Color, Position};

/// A decoded training record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingEntry {
    pub position: Position,
    pub score: i16,
    pub result: i8,
}

impl TrainingEntry {
    pub fn from_record(record: &TrainingRecord) -> Result<TrainingEntry, chess::FenError> {
        Ok(TrainingEntry {
            position: Position::from_fen(&record.fen)?,
            score: record.score,
            result: record.result,
        })
    }

    pub(crate) fn from_raw(raw: &RawRecord<'_>) -> Result<TrainingEntry, CorpusError> {
        let record = raw.to_record()?;
        TrainingEntry::from_record(&record).map_err(|source| CorpusError::InvalidFen {
            offset: raw.offset,
            fen: record.fen,
            source,
        })
    }
}

/// Active features of one perspective over a whole batch, in COO layout:
/// `indices` holds `(sample, feature)` pairs back to back and `values` one
/// weight per pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseFeatures {
    pub indices: Vec<i64>,
    pub values: Vec<f32>,
}

impl SparseFeatures {
    fn with_capacity(samples: usize) -> SparseFeatures {
        SparseFeatures {
            indices: Vec::with_capacity(samples * MAX_ACTIVE_FEATURES * 2),
            values: Vec::with_capacity(samples * MAX_ACTIVE_FEATURES),
        }
    }

    fn push_sample(&mut self, sample: usize, features: &[u16]) {
        for &feature in features {
            self.indices.push(sample as i64);
            self.indices.push(feature as i64);
            self.values.push(1.0);
        }
    }

    pub fn num_active(&self) -> usize {
        self.values.len()
    }

    /// Iterates the `(sample, feature)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.indices.chunks_exact(2).map(|p| (p[0], p[1]))
    }
}

/// A batch of samples laid out as parallel arrays for a training process.
///
/// Perspectives are relative to each sample: `stm_features` are seen from
/// the side to move, `nstm_features` from the other side.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseBatch {
    /// 0 when white is to move, 1 when black is
    pub stm: Vec<f32>,
    pub score: Vec<f32>,
    /// Game outcome mapped to [0, 1]: loss 0, draw 0.5, win 1
    pub result: Vec<f32>,
    pub stm_features: SparseFeatures,
    pub nstm_features: SparseFeatures,
}

impl SparseBatch {
    pub fn new(entries: &[TrainingEntry], feature_set: &dyn FeatureSet) -> SparseBatch {
        let size = entries.len();
        let mut batch = SparseBatch {
            stm: Vec::with_capacity(size),
            score: Vec::with_capacity(size),
            result: Vec::with_capacity(size),
            stm_features: SparseFeatures::with_capacity(size),
            nstm_features: SparseFeatures::with_capacity(size),
        };

        let mut features = Vec::with_capacity(MAX_ACTIVE_FEATURES);
        for (i, entry) in entries.iter().enumerate() {
            let turn = entry.position.turn();

            batch.stm.push(match turn {
                Color::White => 0.0,
                Color::Black => 1.0,
            });
            batch.score.push(entry.score as f32);
            batch.result.push((entry.result as f32 + 1.0) / 2.0);

            feature_set.active_features(&entry.position, turn, &mut features);
            batch.stm_features.push_sample(i, &features);

            feature_set.active_features(&entry.position, turn.other(), &mut features);
            batch.nstm_features.push_sample(i, &features);
        }

        batch
    }

    pub fn size(&self) -> usize {
        self.stm.len()
    }
}
