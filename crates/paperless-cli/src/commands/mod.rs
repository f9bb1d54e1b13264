pub mod admin;
pub mod identity;
pub mod oracle;
pub mod query;
pub mod register;
pub mod witness;

use std::path::Path;

use paperless_credentials::Witness;
use paperless_registry::{RegistryClient, TransactionResult};

/// Read a witness JSON file as produced by `paperless witness` or the oracle.
pub fn read_witness(path: &Path) -> anyhow::Result<Witness> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read witness {}: {}", path.display(), e))?;
    Ok(Witness::from_json(&text)?)
}

/// Write witness JSON to `out`, or stdout.
pub fn write_witness(witness: &Witness, out: Option<&Path>) -> anyhow::Result<()> {
    let json = witness.to_json()?;
    match out {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Witness written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn print_transaction(result: &TransactionResult, client: &RegistryClient) {
    let stages: Vec<String> = result.stages.iter().map(|s| s.to_string()).collect();
    println!("  Circuit:     {}", result.circuit);
    println!("  Stages:      {}", stages.join(" -> "));
    if let Some(tx_hash) = &result.tx_hash {
        println!("  Transaction: {tx_hash}");
    }
    if let Some(did) = &result.issued_did {
        println!("  DID:         {did}");
        println!("  DID URI:     {}", client.did_uri(did));
    }
    if result.attempts > 1 {
        println!("  Attempts:    {}", result.attempts);
    }
}
