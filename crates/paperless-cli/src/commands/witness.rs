//! `paperless witness`: offline extract, verify and build a witness.

use clap::Args;
use std::path::PathBuf;

use paperless_credentials::{verify_with_store, KycBundle, WitnessBuilder};
use paperless_crypto::{TrustAnchor, TrustAnchorStore};

#[derive(Args, Debug)]
pub struct WitnessArgs {
    /// Offline KYC archive (.zip).
    #[arg(short, long)]
    pub archive: PathBuf,

    /// Archive share code.
    #[arg(short, long, env = "PAPERLESS_SHARE_CODE", hide_env_values = true)]
    pub password: String,

    /// Pinned signing certificate. Repeatable; defaults to the embedded
    /// issuing-authority certificate.
    #[arg(long = "anchor")]
    pub anchors: Vec<PathBuf>,

    /// Write the witness here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &WitnessArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.archive)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", args.archive.display(), e))?;
    let doc = KycBundle::new(bytes).extract(&args.password)?;

    let anchors = if args.anchors.is_empty() {
        TrustAnchorStore::single(TrustAnchor::issuing_authority())
    } else {
        TrustAnchorStore::load_all(args.anchors.as_slice())?
    };

    let outcome = verify_with_store(&doc, &anchors);
    eprintln!("Verification:");
    for check in outcome.checks() {
        let icon = if check.passed { "PASS" } else { "FAIL" };
        match &check.detail {
            Some(detail) => eprintln!("  [{icon}] {}: {detail}", check.name),
            None => eprintln!("  [{icon}] {}", check.name),
        }
    }
    let outcome = outcome.into_result()?;

    let witness = WitnessBuilder::offline().build(&doc, &outcome)?;
    super::write_witness(&witness, args.out.as_deref())
}
