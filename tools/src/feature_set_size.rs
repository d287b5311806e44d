use clap::Args;
use nn::feature_set::build::build_feature_set;
use std::error::Error;

#[derive(Args)]
pub struct FeatureSetSizeCommand {
    /// The feature set
    #[arg(long, value_name = "feature-set", default_value = "king-piece")]
    feature_set: String,

    /// Print the size rounded up to the network input width
    #[arg(long)]
    padded: bool,
}

pub fn feature_set_size(cmd: FeatureSetSizeCommand) -> Result<(), Box<dyn Error>> {
    let feature_set = build_feature_set(&cmd.feature_set)?;

    if cmd.padded {
        println!("{}", feature_set.padded_num_features());
    } else {
        println!("{}", feature_set.num_features());
    }

    Ok(())
}
