pub mod basic;
pub mod build;
#[cfg(test)]
mod checks;
pub mod king_piece;

use chess::{Color, Position};

/// Upper bound on the active features of one perspective
pub const MAX_ACTIVE_FEATURES: usize = 37;

/// A set of sparse input features for a neural network
pub trait FeatureSet {
    /// Name used to select the set from the command line
    fn name(&self) -> &'static str;

    /// Number of features in the set
    fn num_features(&self) -> usize;

    /// Number of features rounded up to a multiple of 16, the width the
    /// network input is allocated with
    fn padded_num_features(&self) -> usize {
        self.num_features().next_multiple_of(16)
    }

    /// Replaces `features` with the active features of `position` seen by
    /// `perspective`, sorted ascending and without duplicates
    fn active_features(&self, position: &Position, perspective: Color, features: &mut Vec<u16>);
}
