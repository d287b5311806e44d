//! Turns `.td` training corpora into sparse feature batches.

pub mod batch;
pub mod feature_set;
pub mod ffi;
pub mod stream;
pub mod td_format;

pub use batch::{SparseBatch, SparseFeatures, TrainingEntry};
pub use stream::{SparseBatchStream, StreamConfig};
pub use td_format::{CorpusError, RecordReader, RecordWriter, TrainingRecord};
