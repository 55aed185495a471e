use crate::{
    metadata::{Metadata, MetricFamilyMetadata},
    metadata_block::METADATA_MAGIC,
};

use super::{varint_encoder::write_varint, write_string};

impl MetricFamilyMetadata {
    fn write<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write_varint(self.metric_type().wire_value(), writer)?;
        write_string(self.name(), writer)?;
        write_string(self.help(), writer)?;
        write_varint(self.labels().len() as u64, writer)?;
        for label in self.labels() {
            write_string(label, writer)?;
        }
        Ok(())
    }
}

impl Metadata {
    /// Writes the metadata as a metadata block, families in index order.
    pub fn write<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let version = self.version().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "metadata without a version cannot be encoded",
            )
        })?;

        writer.write_all(METADATA_MAGIC)?;
        write_varint(version, writer)?;
        write_varint(self.families().len() as u64, writer)?;
        for family in self.families() {
            family.write(writer)?;
        }
        Ok(())
    }
}
