pub mod metadata_encoder;
pub mod value_encoder;
pub mod varint_encoder;

/// Writes a varint length followed by the bytes of `value`.
fn write_string<W: std::io::Write>(value: &str, writer: &mut W) -> std::io::Result<()> {
    varint_encoder::write_varint(value.len() as u64, writer)?;
    writer.write_all(value.as_bytes())
}
