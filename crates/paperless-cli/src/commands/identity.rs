//! `paperless identity`: show the identity hash of a witness.

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct IdentityArgs {
    /// Witness JSON file.
    #[arg(short, long, default_value = "witness.json")]
    pub witness: PathBuf,
}

pub fn run(args: &IdentityArgs) -> anyhow::Result<()> {
    let witness = super::read_witness(&args.witness)?;
    println!("Identity hash: {}", witness.credential_id());
    println!("Eligible:      {}", witness.is_eligible());
    println!();
    println!("Use the identity hash with `paperless ban`, `unban` and `banned`.");
    Ok(())
}
