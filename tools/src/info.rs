use chess::Position;
use clap::Args;
use nn::batch::TrainingEntry;
use nn::feature_set::build::build_feature_set;
use nn::feature_set::FeatureSet;
use nn::td_format::RecordReader;
use std::error::Error;
use std::io::{self, Write};

#[derive(Args)]
pub struct InfoCommand {
    /// Feature set used to print features
    #[arg(long, value_name = "feature-set", default_value = "king-piece")]
    feature_set: String,

    /// If provided, it will print the features of the given FEN from both
    /// perspectives, side to move first
    #[arg(long, value_name = "fen")]
    fen: Option<String>,

    /// If provided, it will decode the first records of this corpus
    #[arg(long, value_name = "td")]
    input: Option<String>,

    /// Number of records to decode
    #[arg(long, default_value = "10", requires = "input")]
    count: usize,

    /// Also print the features of each decoded record
    #[arg(long, requires = "input")]
    features: bool,
}

fn write_features<W: Write>(
    out: &mut W,
    feature_set: &dyn FeatureSet,
    position: &Position,
) -> io::Result<()> {
    let mut features = Vec::new();

    for perspective in [position.turn(), position.turn().other()] {
        feature_set.active_features(position, perspective, &mut features);
        let line: Vec<String> = features.iter().map(|f| f.to_string()).collect();
        writeln!(out, "{}", line.join(" "))?;
    }

    Ok(())
}

fn write_records<W: Write>(
    out: &mut W,
    data: &[u8],
    count: usize,
    feature_set: Option<&dyn FeatureSet>,
) -> Result<(), Box<dyn Error>> {
    let mut reader = RecordReader::new(data);

    for _ in 0..count {
        let Some(record) = reader.next_record()? else {
            break;
        };
        writeln!(out, "{} | {} | {}", record.fen, record.score, record.result)?;

        if let Some(feature_set) = feature_set {
            let entry = TrainingEntry::from_record(&record)?;
            write_features(out, feature_set, &entry.position)?;
        }
    }

    Ok(())
}

pub fn info(cmd: InfoCommand) -> Result<(), Box<dyn Error>> {
    let feature_set = build_feature_set(&cmd.feature_set)?;
    let mut out = io::stdout().lock();

    if let Some(fen) = &cmd.fen {
        let position = Position::from_fen(fen)?;
        writeln!(out, "{:?}", position)?;
        write_features(&mut out, feature_set.as_ref(), &position)?;
    }

    if let Some(input) = &cmd.input {
        let data = std::fs::read(input)?;
        let feature_set = cmd.features.then_some(feature_set.as_ref());
        write_records(&mut out, &data, cmd.count, feature_set)?;
    }

    Ok(())
}
