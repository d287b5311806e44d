//! C ABI for training processes that load this crate as a shared library.
//!
//! The caller owns every pointer it receives and must hand it back to the
//! matching `destroy_*` function. A batch must be destroyed before the next
//! one is requested.

use crate::batch::SparseBatch;
use crate::feature_set::king_piece::KingPiece;
use crate::stream::{SparseBatchStream, StreamConfig};
use log::error;
use std::ffi::{c_char, CStr};
use std::ptr;

/// A batch as seen from C. The arrays stay valid until the batch is
/// destroyed. Feature indices are `(sample, feature)` pairs, so the index
/// arrays hold twice as many elements as the value arrays.
#[repr(C)]
pub struct CSparseBatch {
    pub size: i64,
    pub num_active_stm_features: i64,
    pub num_active_nstm_features: i64,
    pub stm: *const f32,
    pub score: *const f32,
    pub result: *const f32,
    pub stm_feature_indices: *const i64,
    pub nstm_feature_indices: *const i64,
    pub stm_feature_values: *const f32,
    pub nstm_feature_values: *const f32,

    // backing storage, not visible from C
    batch: SparseBatch,
}

impl From<SparseBatch> for CSparseBatch {
    fn from(batch: SparseBatch) -> CSparseBatch {
        // the vectors' heap buffers do not move with the batch
        CSparseBatch {
            size: batch.size() as i64,
            num_active_stm_features: batch.stm_features.num_active() as i64,
            num_active_nstm_features: batch.nstm_features.num_active() as i64,
            stm: batch.stm.as_ptr(),
            score: batch.score.as_ptr(),
            result: batch.result.as_ptr(),
            stm_feature_indices: batch.stm_features.indices.as_ptr(),
            nstm_feature_indices: batch.nstm_features.indices.as_ptr(),
            stm_feature_values: batch.stm_features.values.as_ptr(),
            nstm_feature_values: batch.nstm_features.values.as_ptr(),
            batch,
        }
    }
}

/// Opens a corpus with the king-piece feature set. Returns null if the file
/// cannot be read or the arguments are invalid.
///
/// # Safety
/// `path` must be a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn create_sparse_batch_stream(
    path: *const c_char,
    batch_size: usize,
    skip_prob: f32,
) -> *mut SparseBatchStream {
    if path.is_null() {
        return ptr::null_mut();
    }
    let path = match CStr::from_ptr(path).to_str() {
        Ok(path) => path,
        Err(e) => {
            error!("Corpus path is not UTF-8: {}", e);
            return ptr::null_mut();
        }
    };

    let config = StreamConfig {
        batch_size,
        skip_prob: skip_prob as f64,
        ..StreamConfig::default()
    };
    match SparseBatchStream::open(path, Box::new(KingPiece), config) {
        Ok(stream) => Box::into_raw(Box::new(stream)),
        Err(e) => {
            error!("Can't open corpus {}: {}", path, e);
            ptr::null_mut()
        }
    }
}

/// Returns the next batch, or null at the end of the corpus (or on a
/// corrupt record, which is logged).
///
/// # Safety
/// `stream` must come from `create_sparse_batch_stream` and not be destroyed.
#[no_mangle]
pub unsafe extern "C" fn next_sparse_batch(stream: *mut SparseBatchStream) -> *mut CSparseBatch {
    let Some(stream) = stream.as_mut() else {
        return ptr::null_mut();
    };

    match stream.next_batch() {
        Ok(Some(batch)) => Box::into_raw(Box::new(CSparseBatch::from(batch))),
        Ok(None) => ptr::null_mut(),
        Err(e) => {
            error!("Corrupt corpus: {}", e);
            ptr::null_mut()
        }
    }
}

/// # Safety
/// `batch` must come from `next_sparse_batch` (or be null) and not be used
/// afterwards.
#[no_mangle]
pub unsafe extern "C" fn destroy_sparse_batch(batch: *mut CSparseBatch) {
    if !batch.is_null() {
        drop(Box::from_raw(batch));
    }
}

/// # Safety
/// `stream` must come from `create_sparse_batch_stream` (or be null) and not
/// be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn destroy_sparse_batch_stream(stream: *mut SparseBatchStream) {
    if !stream.is_null() {
        drop(Box::from_raw(stream));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::td_format::{RecordWriter, TrainingRecord};
    use std::ffi::CString;
    use std::slice;

    fn write_corpus(records: &[(&str, i16, i8)]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut writer = RecordWriter::new(file.reopen().unwrap());
        for &(fen, score, result) in records {
            writer
                .write_record(&TrainingRecord {
                    fen: fen.to_owned(),
                    score,
                    result,
                })
                .unwrap();
        }
        writer.flush().unwrap();
        file
    }

    #[test]
    fn test_stream_through_c_abi() {
        let file = write_corpus(&[
            (chess::STARTING_FEN, 20, 1),
            ("4k3/8/8/8/8/8/8/4K3 b - - 0 1", -15, -1),
            ("4k3/8/8/8/8/8/8/4K3 w - - 0 1", 0, 0),
        ]);
        let path = CString::new(file.path().to_str().unwrap()).unwrap();

        unsafe {
            let stream = create_sparse_batch_stream(path.as_ptr(), 2, 0.0);
            assert!(!stream.is_null());

            let batch = next_sparse_batch(stream);
            assert!(!batch.is_null());
            let b = &*batch;
            assert_eq!(b.size, 2);
            assert_eq!(slice::from_raw_parts(b.stm, 2), &[0.0, 1.0]);
            assert_eq!(slice::from_raw_parts(b.score, 2), &[20.0, -15.0]);
            assert_eq!(slice::from_raw_parts(b.result, 2), &[1.0, 0.0]);

            assert_eq!(b.num_active_stm_features, 35 + 1);
            let n = b.num_active_stm_features as usize;
            let indices = slice::from_raw_parts(b.stm_feature_indices, 2 * n);
            assert_eq!(indices[0], 0);
            assert_eq!(indices[2 * n - 2], 1);
            let values = slice::from_raw_parts(b.stm_feature_values, n);
            assert!(values.iter().all(|&v| v == 1.0));
            destroy_sparse_batch(batch);

            // one record left, not enough for a batch
            assert!(next_sparse_batch(stream).is_null());
            destroy_sparse_batch_stream(stream);
        }
    }

    #[test]
    fn test_null_on_bad_input() {
        let missing = CString::new("/nonexistent/corpus.td").unwrap();
        unsafe {
            assert!(create_sparse_batch_stream(ptr::null(), 1, 0.0).is_null());
            assert!(create_sparse_batch_stream(missing.as_ptr(), 1, 0.0).is_null());
            assert!(next_sparse_batch(ptr::null_mut()).is_null());
            destroy_sparse_batch(ptr::null_mut());
            destroy_sparse_batch_stream(ptr::null_mut());
        }
    }
}
