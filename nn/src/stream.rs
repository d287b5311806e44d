use crate::batch::{SparseBatch, TrainingEntry};
use crate::feature_set::FeatureSet;
use crate::td_format::{CorpusError, RecordReader};
use log::{debug, info};
use memmap2::{Mmap, MmapOptions};
use rand::distributions::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::ops::Deref;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Number of samples in one batch
    pub batch_size: usize,
    /// Probability of dropping each record before it is read
    pub skip_prob: f64,
    /// Seed of the skip trial
    pub seed: u64,
    /// Map the corpus instead of reading it into memory
    pub mmap: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            batch_size: 8192,
            skip_prob: 0.0,
            seed: 0,
            mmap: false,
        }
    }
}

enum Corpus {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for Corpus {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Corpus::Owned(data) => data.as_slice(),
            Corpus::Mapped(mmap) => &mmap[..],
        }
    }
}

/// Reads a `.td` corpus front to back, producing full batches of sparse
/// features.
pub struct SparseBatchStream {
    corpus: Corpus,
    cursor: usize,
    batch_size: usize,
    skip: Option<Bernoulli>,
    rng: StdRng,
    feature_set: Box<dyn FeatureSet>,
    entries: Vec<TrainingEntry>,
    finished: bool,
}

impl SparseBatchStream {
    pub fn open<P: AsRef<Path>>(
        path: P,
        feature_set: Box<dyn FeatureSet>,
        config: StreamConfig,
    ) -> Result<SparseBatchStream, CorpusError> {
        let path = path.as_ref();
        let corpus = if config.mmap {
            let file = File::open(path)?;
            if file.metadata()?.len() == 0 {
                Corpus::Owned(Vec::new())
            } else {
                // the file must not be truncated while mapped
                Corpus::Mapped(unsafe { MmapOptions::new().map(&file)? })
            }
        } else {
            Corpus::Owned(std::fs::read(path)?)
        };

        info!(
            "Opened corpus {} ({} bytes{})",
            path.display(),
            corpus.len(),
            if config.mmap { ", mapped" } else { "" }
        );
        SparseBatchStream::with_corpus(corpus, feature_set, config)
    }

    pub fn from_bytes(
        data: Vec<u8>,
        feature_set: Box<dyn FeatureSet>,
        config: StreamConfig,
    ) -> Result<SparseBatchStream, CorpusError> {
        SparseBatchStream::with_corpus(Corpus::Owned(data), feature_set, config)
    }

    fn with_corpus(
        corpus: Corpus,
        feature_set: Box<dyn FeatureSet>,
        config: StreamConfig,
    ) -> Result<SparseBatchStream, CorpusError> {
        if config.batch_size == 0 {
            return Err(CorpusError::ZeroBatchSize);
        }
        let skip = if config.skip_prob > 0.0 {
            Some(
                Bernoulli::new(config.skip_prob)
                    .map_err(|_| CorpusError::InvalidSkipProbability(config.skip_prob))?,
            )
        } else if config.skip_prob == 0.0 {
            None
        } else {
            return Err(CorpusError::InvalidSkipProbability(config.skip_prob));
        };

        Ok(SparseBatchStream {
            corpus,
            cursor: 0,
            batch_size: config.batch_size,
            skip,
            rng: StdRng::seed_from_u64(config.seed),
            feature_set,
            entries: Vec::with_capacity(config.batch_size),
            finished: false,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn feature_set(&self) -> &dyn FeatureSet {
        self.feature_set.as_ref()
    }

    /// Byte offset of the next unread record
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Returns the next full batch, or `None` once fewer than `batch_size`
    /// records remain. Records of the incomplete last batch are dropped.
    pub fn next_batch(&mut self) -> Result<Option<SparseBatch>, CorpusError> {
        if self.finished {
            return Ok(None);
        }

        self.entries.clear();
        let mut reader = RecordReader::at(&self.corpus, self.cursor);

        while self.entries.len() < self.batch_size {
            if let Some(skip) = &self.skip {
                if skip.sample(&mut self.rng) && !reader.skip_record() {
                    self.finished = true;
                    break;
                }
            }

            match reader.next_raw() {
                Some(raw) => self.entries.push(TrainingEntry::from_raw(&raw)?),
                None => {
                    self.finished = true;
                    break;
                }
            }
        }
        self.cursor = reader.position();

        if self.finished {
            debug!(
                "End of corpus at byte {}, dropped {} records of an incomplete batch ({} trailing bytes)",
                self.cursor,
                self.entries.len(),
                reader.remaining()
            );
            return Ok(None);
        }

        Ok(Some(SparseBatch::new(&self.entries, self.feature_set.as_ref())))
    }
}

impl Iterator for SparseBatchStream {
    type Item = Result<SparseBatch, CorpusError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_batch() {
            Ok(batch) => batch.map(Ok),
            Err(e) => {
                // a corrupt record is not skipped over
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
