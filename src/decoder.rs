use tracing::debug;

use crate::{
    errors::CprDecodeError,
    exposition::render_value_block,
    metadata::MetadataStore,
    metadata_block::{read_metadata_block, METADATA_MAGIC},
    reader::ByteReader,
    value_block::read_value_block,
};

/// Output knobs for [`decode_with_options`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Terminate every histogram bucket line with a newline.
    ///
    /// Off by default: existing consumers of this output expect bucket lines
    /// to run together, with only `_sum` and `_count` on lines of their own.
    pub bucket_newlines: bool,
}

/// Decodes one payload into Prometheus text exposition.
///
/// Same as [`decode_with_options`] with the default options.
pub fn decode(input: &[u8], store: &MetadataStore) -> Result<String, CprDecodeError> {
    decode_with_options(input, store, &DecodeOptions::default())
}

/// Decodes one payload into Prometheus text exposition.
///
/// A payload is an optional metadata block followed by a mandatory value
/// block. When the metadata block is present it replaces the contents of
/// `store` as soon as it has been fully read, even if the value block turns
/// out to be invalid. Without it, the value block is resolved against
/// whatever `store` currently holds.
///
/// Nothing is returned on error; the first error encountered is.
pub fn decode_with_options(
    input: &[u8],
    store: &MetadataStore,
    options: &DecodeOptions,
) -> Result<String, CprDecodeError> {
    let mut reader = ByteReader::new(input);

    let metadata = if reader.starts_with(METADATA_MAGIC) {
        let metadata = read_metadata_block(&mut reader)?;
        store.replace(metadata)
    } else {
        store.snapshot()
    };

    let block = read_value_block(&mut reader, &metadata)?;
    if !reader.is_empty() {
        debug!(
            trailing_bytes = reader.remaining().len(),
            "Ignoring bytes after the value block."
        );
    }

    render_value_block(&block, &metadata, options)
}
