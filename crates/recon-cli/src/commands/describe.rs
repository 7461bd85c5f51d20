use std::error::Error;

use clap::Args;
use recon_report::{to_canonical_json_bytes, to_yaml_string, EvaluationKind};

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Evaluation identifier (1, 2, 3, 5, 6, 7, 8, 9, 10, 11).
    pub evaluation: String,
    /// Print YAML instead of canonical JSON.
    #[arg(long)]
    pub yaml: bool,
}

pub fn run(args: &DescribeArgs) -> Result<(), Box<dyn Error>> {
    let kind: EvaluationKind = args.evaluation.parse()?;
    let descriptor = kind.descriptor();
    if args.yaml {
        print!("{}", to_yaml_string(&descriptor)?);
    } else {
        print!("{}", String::from_utf8(to_canonical_json_bytes(&descriptor)?)?);
    }
    Ok(())
}
