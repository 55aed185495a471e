use smallvec::SmallVec;
use tracing::trace;

use crate::{
    errors::CprDecodeError,
    metadata::{Metadata, MetricFamilyMetadata, MetricType},
    reader::ByteReader,
};

/// Tag that opens the mandatory value block.
pub const VALUE_MAGIC: &[u8; 6] = b"cprval";

/// A decoded value block. Strings borrow from the input buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueBlock<'a> {
    pub version: u64,
    pub families: Vec<ValueFamily<'a>>,
}

/// Samples of one metric family, referenced by its metadata index.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueFamily<'a> {
    pub family_index: u64,
    pub samples: Vec<Sample<'a>>,
}

/// Label values in wire order, next to the index of the label they belong to.
pub type SampleLabels<'a> = SmallVec<LabelValue<'a>, 4>;

#[derive(Debug, Clone, PartialEq)]
pub struct Sample<'a> {
    pub labels: SampleLabels<'a>,
    pub payload: SamplePayload,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelValue<'a> {
    pub index: u64,
    pub value: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantile {
    pub quantile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: f64,
}

/// The value part of a sample. Its shape follows the family's metric type.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplePayload {
    /// Counter, gauge and untyped families.
    Scalar(f64),
    Summary {
        quantiles: Vec<Quantile>,
        sum: f64,
        count: u64,
    },
    Histogram {
        buckets: Vec<Bucket>,
        sum: f64,
        count: u64,
    },
}

fn read_sample_labels<'a>(
    reader: &mut ByteReader<'a>,
    family_index: u64,
    family: &MetricFamilyMetadata,
) -> Result<SampleLabels<'a>, CprDecodeError> {
    let label_count = reader.read_varint()?;
    let mut labels = SampleLabels::with_capacity(reader.capacity_hint(label_count));
    for _ in 0..label_count {
        let index = reader.read_varint()?;
        if family.label_name(index).is_none() {
            return Err(CprDecodeError::UnknownLabel {
                family: family_index,
                label: index,
            });
        }
        let value = reader.read_string()?;
        labels.push(LabelValue { index, value });
    }
    Ok(labels)
}

fn read_quantiles(reader: &mut ByteReader) -> Result<Vec<Quantile>, CprDecodeError> {
    let count = reader.read_varint()?;
    let mut quantiles = Vec::with_capacity(reader.capacity_hint(count));
    for _ in 0..count {
        let quantile = reader.read_double()?;
        let value = reader.read_double()?;
        quantiles.push(Quantile { quantile, value });
    }
    Ok(quantiles)
}

fn read_buckets(reader: &mut ByteReader) -> Result<Vec<Bucket>, CprDecodeError> {
    let count = reader.read_varint()?;
    let mut buckets = Vec::with_capacity(reader.capacity_hint(count));
    for _ in 0..count {
        let upper_bound = reader.read_double()?;
        let cumulative_count = reader.read_double()?;
        buckets.push(Bucket {
            upper_bound,
            cumulative_count,
        });
    }
    Ok(buckets)
}

fn read_payload(
    reader: &mut ByteReader,
    metric_type: MetricType,
) -> Result<SamplePayload, CprDecodeError> {
    match metric_type {
        MetricType::Counter | MetricType::Gauge | MetricType::Untyped => {
            Ok(SamplePayload::Scalar(reader.read_double()?))
        }
        MetricType::Summary => {
            let quantiles = read_quantiles(reader)?;
            let sum = reader.read_double()?;
            let count = reader.read_varint()?;
            Ok(SamplePayload::Summary {
                quantiles,
                sum,
                count,
            })
        }
        MetricType::Histogram => {
            let buckets = read_buckets(reader)?;
            let sum = reader.read_double()?;
            let count = reader.read_varint()?;
            Ok(SamplePayload::Histogram {
                buckets,
                sum,
                count,
            })
        }
    }
}

fn read_value_family<'a>(
    reader: &mut ByteReader<'a>,
    metadata: &Metadata,
) -> Result<ValueFamily<'a>, CprDecodeError> {
    let family_index = reader.read_varint()?;
    let family = metadata.lookup(family_index)?;

    let sample_count = reader.read_varint()?;
    let mut samples = Vec::with_capacity(reader.capacity_hint(sample_count));
    for _ in 0..sample_count {
        let labels = read_sample_labels(reader, family_index, family)?;
        let payload = read_payload(reader, family.metric_type())?;
        samples.push(Sample { labels, payload });
    }

    trace!(
        family = family.name(),
        samples = samples.len(),
        "Read value family."
    );

    Ok(ValueFamily {
        family_index,
        samples,
    })
}

/// Reads a value block, magic tag included, against `metadata`.
///
/// The block's version has to be the version of `metadata`, and every family
/// and label index it references has to exist there.
pub fn read_value_block<'a>(
    reader: &mut ByteReader<'a>,
    metadata: &Metadata,
) -> Result<ValueBlock<'a>, CprDecodeError> {
    let magic = reader.read_fixed(VALUE_MAGIC.len())?;
    if magic != VALUE_MAGIC {
        return Err(CprDecodeError::BadMagic {
            found: magic.to_vec(),
        });
    }

    let version = reader.read_varint()?;
    if metadata.version() != Some(version) {
        return Err(CprDecodeError::VersionMismatch {
            expected: metadata.version(),
            found: version,
        });
    }

    let family_count = reader.read_varint()?;
    let mut families = Vec::with_capacity(reader.capacity_hint(family_count));
    for _ in 0..family_count {
        families.push(read_value_family(reader, metadata)?);
    }

    Ok(ValueBlock { version, families })
}
