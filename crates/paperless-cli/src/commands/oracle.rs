//! `paperless oracle`: obtain a witness from a running oracle.

use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;

use paperless_credentials::Witness;

#[derive(Args, Debug)]
pub struct OracleArgs {
    /// Offline KYC archive (.zip).
    #[arg(short, long)]
    pub archive: PathBuf,

    /// Archive share code.
    #[arg(short, long, env = "PAPERLESS_SHARE_CODE", hide_env_values = true)]
    pub password: String,

    /// Oracle base URL.
    #[arg(short, long, env = "PAPERLESS_ORACLE", default_value = "http://127.0.0.1:3000")]
    pub url: String,

    /// Write the witness here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
    kind: Option<String>,
}

pub async fn run(args: &OracleArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.archive)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", args.archive.display(), e))?;
    let file_name = args
        .archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "kyc.zip".into());

    let form = reqwest::multipart::Form::new()
        .part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(file_name),
        )
        .text("password", args.password.clone());

    let url = format!("{}/verify-aadhaar", args.url.trim_end_matches('/'));
    let resp = reqwest::Client::new()
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("could not reach oracle at {}: {}", args.url, e))?;

    let status = resp.status();
    if !status.is_success() {
        match resp.json::<ErrorResponse>().await {
            Ok(err) => anyhow::bail!(
                "oracle rejected the archive (HTTP {}, {}): {}",
                status,
                err.kind.as_deref().unwrap_or("error"),
                err.error
            ),
            Err(_) => anyhow::bail!("oracle rejected the archive (HTTP {})", status),
        }
    }

    let witness: Witness = resp.json().await?;
    super::write_witness(&witness, args.out.as_deref())
}
