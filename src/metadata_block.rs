use crate::{
    errors::CprDecodeError,
    metadata::{Metadata, MetricFamilyMetadata, MetricType},
    reader::ByteReader,
};

/// Tag that opens an optional metadata block.
pub const METADATA_MAGIC: &[u8; 7] = b"cprmeta";

fn read_labels(reader: &mut ByteReader) -> Result<Vec<String>, CprDecodeError> {
    let label_count = reader.read_varint()?;
    let mut labels = Vec::with_capacity(reader.capacity_hint(label_count));
    // Label indices are positional, they are not on the wire.
    for _ in 0..label_count {
        labels.push(reader.read_string()?.to_string());
    }
    Ok(labels)
}

fn read_family(
    reader: &mut ByteReader,
    family: u64,
) -> Result<MetricFamilyMetadata, CprDecodeError> {
    let type_value = reader.read_varint()?;
    let metric_type = MetricType::try_from(type_value)
        .map_err(|_| CprDecodeError::MalformedMetadata { family, type_value })?;
    let name = reader.read_string()?;
    let help = reader.read_string()?;
    let labels = read_labels(reader)?;

    Ok(MetricFamilyMetadata::new(name, help, metric_type, labels))
}

/// Reads a metadata block, magic tag included.
///
/// The caller decides what to do with the result; nothing is cached here.
pub fn read_metadata_block(reader: &mut ByteReader) -> Result<Metadata, CprDecodeError> {
    let magic = reader.read_fixed(METADATA_MAGIC.len())?;
    if magic != METADATA_MAGIC {
        return Err(CprDecodeError::BadMagic {
            found: magic.to_vec(),
        });
    }

    let version = reader.read_varint()?;
    let family_count = reader.read_varint()?;

    let mut families = Vec::with_capacity(reader.capacity_hint(family_count));
    for family in 0..family_count {
        families.push(read_family(reader, family)?);
    }

    Ok(Metadata::new(version, families))
}
