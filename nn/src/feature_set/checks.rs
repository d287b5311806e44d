use super::{FeatureSet, MAX_ACTIVE_FEATURES};
use chess::{Color, Position};

const FENS: [&str; 4] = [
    chess::STARTING_FEN,
    "4nrk1/3q1pp1/2n1p1p1/8/1P2Q3/7P/PB1N1PP1/2R3K1 w - - 5 26",
    "5r2/1p2ppkp/p2p1nP1/qn6/4P3/2r2B2/1PPQ1PP1/2KR3R w - - 0 21",
    "r3k2r/pp3ppp/8/2pPp3/8/8/PP3PPP/R3K2R w KQkq c6 0 14",
];

/// Games replayed move by move to cover more positions
const GAMES: [&str; 2] = [
    "e4 c5 Nf3 d6 d4 cxd4 Nxd4 Nf6 Nc3 a6 Be3 e5 Nb3 Be6 f3 Be7 Qd2 O-O O-O-O Nbd7 g4 b5",
    "d4 d5 c4 e6 Nc3 Nf6 Bg5 Be7 e3 O-O Nf3 h6 Bh4 b6 cxd5 Nxd5 Bxe7 Qxe7 Nxd5 exd5",
];

pub(super) fn sanity_checks(feature_set: &dyn FeatureSet) {
    for fen in FENS {
        check_position(&Position::from_fen(fen).unwrap(), feature_set);
    }

    for game in GAMES {
        let mut pos = Position::startpos();
        for san in game.split_whitespace() {
            pos.play_san(san).unwrap();
            check_position(&pos, feature_set);
        }
    }
}

/// Features must be strictly ascending, in range and bounded in count
fn check_position(pos: &Position, feature_set: &dyn FeatureSet) {
    for perspective in Color::ALL {
        // stale content must be replaced, not appended to
        let mut features = vec![u16::MAX; 3];
        feature_set.active_features(pos, perspective, &mut features);

        assert!(!features.is_empty());
        assert!(features.len() <= MAX_ACTIVE_FEATURES);
        assert!(
            features.windows(2).all(|w| w[0] < w[1]),
            "not strictly ascending for {} from {:?}",
            pos,
            perspective
        );
        assert!(features
            .iter()
            .all(|&f| (f as usize) < feature_set.num_features()));
    }
}
