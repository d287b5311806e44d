use clap::Args;
use indicatif::{HumanCount, ProgressBar, ProgressStyle};
use nn::batch::SparseBatch;
use nn::feature_set::build::build_feature_set;
use nn::stream::{SparseBatchStream, StreamConfig};
use std::error::Error;
use std::fmt;

#[derive(Args)]
pub struct StatsCommand {
    /// Corpus to gather stats on
    #[arg(long, required = true)]
    input: String,

    /// The feature set
    #[arg(long, value_name = "feature-set", default_value = "king-piece")]
    feature_set: String,

    #[arg(long, default_value = "8192")]
    batch_size: usize,

    /// Probability of skipping each record
    #[arg(long, default_value = "0")]
    skip_prob: f64,

    /// Seed of the skip trial
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Map the corpus instead of reading it into memory
    #[arg(long)]
    mmap: bool,
}

#[derive(Debug, Default, PartialEq)]
struct Stats {
    batches: u64,
    samples: u64,
    black_to_move: u64,
    stm_features: u64,
    nstm_features: u64,
    /// Losses, draws and wins for the side to move
    results: [u64; 3],
    score_sum: f64,
}

impl Stats {
    fn add(&mut self, batch: &SparseBatch) {
        self.batches += 1;
        self.samples += batch.size() as u64;
        self.black_to_move += batch.stm.iter().filter(|&&stm| stm == 1.0).count() as u64;
        self.stm_features += batch.stm_features.num_active() as u64;
        self.nstm_features += batch.nstm_features.num_active() as u64;
        for &result in &batch.result {
            self.results[(result * 2.0).round() as usize] += 1;
        }
        self.score_sum += batch.score.iter().map(|&s| s as f64).sum::<f64>();
    }

    fn per_sample(&self, total: u64) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            total as f64 / self.samples as f64
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Batches: {}", HumanCount(self.batches))?;
        writeln!(f, "Samples: {}", HumanCount(self.samples))?;
        writeln!(
            f,
            "Black to move: {:.2}%",
            100.0 * self.per_sample(self.black_to_move)
        )?;
        writeln!(
            f,
            "Active features per sample: stm {:.2} nstm {:.2}",
            self.per_sample(self.stm_features),
            self.per_sample(self.nstm_features)
        )?;
        writeln!(
            f,
            "Results (side to move): loss {} draw {} win {}",
            self.results[0], self.results[1], self.results[2]
        )?;
        write!(
            f,
            "Mean score: {:.2}",
            if self.samples == 0 {
                0.0
            } else {
                self.score_sum / self.samples as f64
            }
        )
    }
}

fn gather(stream: SparseBatchStream, bar: &ProgressBar) -> Result<Stats, Box<dyn Error>> {
    let mut stats = Stats::default();

    for batch in stream {
        let batch = batch?;
        stats.add(&batch);
        bar.inc(batch.size() as u64);
    }

    Ok(stats)
}

pub fn stats(cmd: StatsCommand) -> Result<(), Box<dyn Error>> {
    println!("Gathering stats of: {}", cmd.input);

    let config = StreamConfig {
        batch_size: cmd.batch_size,
        skip_prob: cmd.skip_prob,
        seed: cmd.seed,
        mmap: cmd.mmap,
    };
    let feature_set = build_feature_set(&cmd.feature_set)?;
    let stream = SparseBatchStream::open(&cmd.input, feature_set, config)?;

    let bar = ProgressBar::new_spinner().with_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [Elapsed {elapsed_precise}] [Samples {human_pos} @ {per_sec}] {msg}")?,
    );
    let stats = gather(stream, &bar)?;
    bar.finish();

    println!("{}", stats);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nn::feature_set::king_piece::KingPiece;
    use nn::td_format::{RecordWriter, TrainingRecord};

    fn corpus() -> Vec<u8> {
        let mut writer = RecordWriter::new(Vec::new());
        let records = [
            (chess::STARTING_FEN, 20, 1),
            ("4k3/8/8/8/8/8/8/4K3 b - - 0 1", -15, -1),
            ("4k3/8/8/8/8/8/3Q4/4K3 w - - 0 1", 400, 0),
            ("4k3/8/8/8/8/8/8/4K3 w - - 0 1", 0, 0),
            ("4k3/8/8/8/8/8/8/4K3 w - - 0 1", 0, 0),
        ];
        for (fen, score, result) in records {
            writer
                .write_record(&TrainingRecord {
                    fen: fen.to_owned(),
                    score,
                    result,
                })
                .unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn test_gather() {
        let config = StreamConfig {
            batch_size: 2,
            ..StreamConfig::default()
        };
        let stream = SparseBatchStream::from_bytes(corpus(), Box::new(KingPiece), config).unwrap();
        let stats = gather(stream, &ProgressBar::hidden()).unwrap();

        // the fifth record does not fill a batch
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.samples, 4);
        assert_eq!(stats.black_to_move, 1);
        assert_eq!(stats.results, [1, 2, 1]);
        assert_eq!(stats.stm_features, 35 + 1 + 2 + 1);
        assert_eq!(stats.score_sum, 405.0);

        let text = stats.to_string();
        assert!(text.contains("loss 1 draw 2 win 1"));
        assert!(text.contains("Black to move: 25.00%"));
    }

    #[test]
    fn test_empty_corpus() {
        let stream =
            SparseBatchStream::from_bytes(Vec::new(), Box::new(KingPiece), StreamConfig::default())
                .unwrap();
        let stats = gather(stream, &ProgressBar::hidden()).unwrap();
        assert_eq!(stats, Stats::default());
        assert!(stats.to_string().contains("Mean score: 0.00"));
    }
}
