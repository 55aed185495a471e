use std::path::Path;

use anyhow::Context as _;
use rusty_compact_expfmt::{decode_with_options, DecodeOptions, MetadataStore};
use tracing::debug;

/// Decodes a payload stored in a file and prints the exposition text.
///
/// The file is decoded against an empty store, so it has to start with a
/// metadata block.
pub async fn run(path: &Path, options: &DecodeOptions) -> anyhow::Result<()> {
    let text = decode_file(path, options).await?;
    println!("{}", text);
    Ok(())
}

async fn decode_file(path: &Path, options: &DecodeOptions) -> anyhow::Result<String> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    debug!(path = %path.display(), bytes = data.len(), "Read payload file.");

    let store = MetadataStore::new();
    decode_with_options(&data, &store, options)
        .with_context(|| format!("failed to decode {}", path.display()))
}
