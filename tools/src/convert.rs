use crate::pgn_converter::{ConversionStats, Converter, ConverterConfig};
use clap::Args;
use indicatif::{HumanBytes, HumanCount, ProgressBar, ProgressStyle};
use log::info;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::Path;

#[derive(Args)]
pub struct ConvertCommand {
    /// PGN file with evaluation comments, optionally zstd compressed (.zst)
    #[arg(long, required = true)]
    input: String,

    /// Where to write the training corpus
    #[arg(long, required = true)]
    output: String,

    #[command(flatten)]
    config: ConverterConfig,
}

/// Opens a PGN file, decompressing it if necessary
fn open_pgn<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let reader: Box<dyn io::Read> = if path.extension().is_some_and(|ext| ext == "zst") {
        Box::new(zstd::Decoder::new(file)?)
    } else {
        Box::new(file)
    };

    Ok(Box::new(BufReader::with_capacity(1 << 20, reader)))
}

/// Converts `input` into a corpus at `output`
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: ConverterConfig,
    bar: &ProgressBar,
) -> Result<ConversionStats, Box<dyn Error>> {
    let reader = open_pgn(input)?;
    let writer = BufWriter::new(File::create(output)?);
    let mut converter = Converter::new(writer, config);

    converter.convert(bar.wrap_read(reader))?;
    bar.set_message(format!("[Written {}]", HumanBytes(converter.bytes_written())));

    let (_, stats) = converter.finish()?;
    Ok(stats)
}

pub fn convert(cmd: ConvertCommand) -> Result<(), Box<dyn Error>> {
    println!("Input file: {}", cmd.input);
    println!("Output file: {}", cmd.output);

    let bar = ProgressBar::new_spinner().with_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [Elapsed {elapsed_precise}] [Read {bytes} @ {bytes_per_sec}] {msg}")?,
    );

    let stats = convert_file(&cmd.input, &cmd.output, cmd.config, &bar)?;
    bar.finish();

    info!("Conversion finished: {}", stats);
    println!(
        "Done. Games: {} Moves: {} Records: {} Invalid scores: {} Orphan annotations: {}",
        HumanCount(stats.games),
        HumanCount(stats.moves),
        HumanCount(stats.records),
        stats.invalid_scores,
        stats.orphan_annotations
    );

    Ok(())
}
