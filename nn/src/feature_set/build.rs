use super::basic::Basic;
use super::king_piece::KingPiece;
use super::FeatureSet;
use thiserror::Error;

pub const FEATURE_SET_NAMES: [&str; 2] = ["king-piece", "basic"];

#[derive(Debug, Error)]
#[error("unknown feature set: {0}")]
pub struct UnknownFeatureSet(pub String);

pub fn build_feature_set(name: &str) -> Result<Box<dyn FeatureSet>, UnknownFeatureSet> {
    match name {
        "king-piece" => Ok(Box::new(KingPiece)),
        "basic" => Ok(Box::new(Basic)),
        _ => Err(UnknownFeatureSet(name.to_owned())),
    }
}
