use crate::value_block::{Sample, SamplePayload, ValueBlock, ValueFamily, VALUE_MAGIC};

use super::{varint_encoder::write_varint, write_string};

fn write_payload<W: std::io::Write>(
    payload: &SamplePayload,
    writer: &mut W,
) -> std::io::Result<()> {
    match payload {
        SamplePayload::Scalar(value) => {
            writer.write_all(&value.to_le_bytes())?;
        }
        SamplePayload::Summary {
            quantiles,
            sum,
            count,
        } => {
            write_varint(quantiles.len() as u64, writer)?;
            for quantile in quantiles {
                writer.write_all(&quantile.quantile.to_le_bytes())?;
                writer.write_all(&quantile.value.to_le_bytes())?;
            }
            writer.write_all(&sum.to_le_bytes())?;
            write_varint(*count, writer)?;
        }
        SamplePayload::Histogram {
            buckets,
            sum,
            count,
        } => {
            write_varint(buckets.len() as u64, writer)?;
            for bucket in buckets {
                writer.write_all(&bucket.upper_bound.to_le_bytes())?;
                writer.write_all(&bucket.cumulative_count.to_le_bytes())?;
            }
            writer.write_all(&sum.to_le_bytes())?;
            write_varint(*count, writer)?;
        }
    }
    Ok(())
}

impl Sample<'_> {
    fn write<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write_varint(self.labels.len() as u64, writer)?;
        for label in &self.labels {
            write_varint(label.index, writer)?;
            write_string(label.value, writer)?;
        }
        write_payload(&self.payload, writer)
    }
}

impl ValueFamily<'_> {
    fn write<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write_varint(self.family_index, writer)?;
        write_varint(self.samples.len() as u64, writer)?;
        for sample in &self.samples {
            sample.write(writer)?;
        }
        Ok(())
    }
}

impl ValueBlock<'_> {
    /// Writes the block in wire format.
    ///
    /// Payloads are written as they are. Matching them with the metric types
    /// of the metadata the block refers to is up to the caller.
    pub fn write<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(VALUE_MAGIC)?;
        write_varint(self.version, writer)?;
        write_varint(self.families.len() as u64, writer)?;
        for family in &self.families {
            family.write(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use crate::{
        metadata::{Metadata, MetricFamilyMetadata, MetricType},
        reader::ByteReader,
        value_block::{read_value_block, Bucket, LabelValue},
    };

    use super::*;

    #[test]
    fn test_write_value_block() {
        let metadata = Metadata::new(
            9,
            vec![
                MetricFamilyMetadata::new("up", "", MetricType::Gauge, vec!["job".to_string()]),
                MetricFamilyMetadata::new("size", "", MetricType::Histogram, vec![]),
            ],
        );
        let block = ValueBlock {
            version: 9,
            families: vec![
                ValueFamily {
                    family_index: 0,
                    samples: vec![
                        Sample {
                            labels: smallvec![LabelValue {
                                index: 0,
                                value: "node"
                            }],
                            payload: SamplePayload::Scalar(1.0),
                        },
                        Sample {
                            labels: smallvec![],
                            payload: SamplePayload::Scalar(0.0),
                        },
                    ],
                },
                ValueFamily {
                    family_index: 1,
                    samples: vec![Sample {
                        labels: smallvec![],
                        payload: SamplePayload::Histogram {
                            buckets: vec![Bucket {
                                upper_bound: 10.0,
                                cumulative_count: 4.0,
                            }],
                            sum: 17.0,
                            count: 4,
                        },
                    }],
                },
            ],
        };

        let mut buffer: Vec<u8> = Vec::new();
        block.write(&mut buffer).unwrap();
        assert!(buffer.starts_with(b"cprval\x09\x02\x00\x02\x01\x00\x04node"));

        let mut reader = ByteReader::new(&buffer);
        let parsed = read_value_block(&mut reader, &metadata).unwrap();
        assert!(reader.is_empty());
        assert_eq!(parsed, block);
    }
}
