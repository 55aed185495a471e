use smallvec::SmallVec;

use crate::{
    decoder::DecodeOptions,
    errors::CprDecodeError,
    float::push_float,
    metadata::{Metadata, MetricFamilyMetadata},
    value_block::{LabelValue, SamplePayload, ValueBlock, ValueFamily},
};

/// Label names resolved next to their values, in wire order.
type ResolvedLabels<'f, 'v> = SmallVec<(&'f str, &'v str), 4>;

fn resolve_labels<'f, 'v>(
    family_index: u64,
    family: &'f MetricFamilyMetadata,
    labels: &[LabelValue<'v>],
) -> Result<ResolvedLabels<'f, 'v>, CprDecodeError> {
    labels
        .iter()
        .map(|label| {
            family
                .label_name(label.index)
                .map(|name| (name, label.value))
                .ok_or(CprDecodeError::UnknownLabel {
                    family: family_index,
                    label: label.index,
                })
        })
        .collect()
}

fn push_label(output: &mut String, name: &str, value: &str) {
    output.push_str(name);
    output.push_str("=\"");
    output.push_str(value);
    output.push('"');
}

/// `{a="1",b="2"}`, or nothing at all without labels.
fn push_label_set(output: &mut String, labels: &ResolvedLabels<'_, '_>) {
    if labels.is_empty() {
        return;
    }
    output.push('{');
    for (i, (name, value)) in labels.iter().enumerate() {
        if i > 0 {
            output.push(',');
        }
        push_label(output, name, value);
    }
    output.push('}');
}

/// `{a="1",b="2",quantile="0.5"}`.
///
/// Every user label is followed by a comma, so without user labels the
/// group starts with one: `{,quantile="0.5"}`. Existing consumers of this
/// output rely on these exact bytes.
fn push_label_set_with(
    output: &mut String,
    labels: &ResolvedLabels<'_, '_>,
    name: &str,
    value: f64,
) {
    output.push('{');
    for (label_name, label_value) in labels {
        push_label(output, label_name, label_value);
        output.push(',');
    }
    output.push_str(name);
    output.push_str("=\"");
    push_float(output, value);
    output.push_str("\"}");
}

fn push_value(output: &mut String, value: f64) {
    output.push(' ');
    push_float(output, value);
}

fn push_sum_and_count(
    output: &mut String,
    name: &str,
    labels: &ResolvedLabels<'_, '_>,
    sum: f64,
    count: u64,
) {
    output.push_str(name);
    output.push_str("_sum");
    push_label_set(output, labels);
    push_value(output, sum);
    output.push('\n');

    output.push_str(name);
    output.push_str("_count");
    push_label_set(output, labels);
    // Counts are integers on the wire but are rendered like any sample value.
    push_value(output, count as f64);
    output.push('\n');
}

fn push_sample(
    output: &mut String,
    family: &MetricFamilyMetadata,
    labels: &ResolvedLabels<'_, '_>,
    payload: &SamplePayload,
    options: &DecodeOptions,
) {
    let name = family.name();
    match payload {
        SamplePayload::Scalar(value) => {
            output.push_str(name);
            push_label_set(output, labels);
            push_value(output, *value);
            output.push('\n');
        }
        SamplePayload::Summary {
            quantiles,
            sum,
            count,
        } => {
            for quantile in quantiles {
                output.push_str(name);
                push_label_set_with(output, labels, "quantile", quantile.quantile);
                push_value(output, quantile.value);
                output.push('\n');
            }
            push_sum_and_count(output, name, labels, *sum, *count);
        }
        SamplePayload::Histogram {
            buckets,
            sum,
            count,
        } => {
            for bucket in buckets {
                output.push_str(name);
                push_label_set_with(output, labels, "bucket", bucket.upper_bound);
                push_value(output, bucket.cumulative_count);
                // Bucket lines run together unless asked otherwise, see `DecodeOptions`.
                if options.bucket_newlines {
                    output.push('\n');
                }
            }
            push_sum_and_count(output, name, labels, *sum, *count);
        }
    }
}

fn push_family(
    output: &mut String,
    value_family: &ValueFamily,
    metadata: &Metadata,
    options: &DecodeOptions,
) -> Result<(), CprDecodeError> {
    let family = metadata.lookup(value_family.family_index)?;

    output.push_str("# HELP ");
    output.push_str(family.name());
    output.push(' ');
    output.push_str(family.help());
    output.push('\n');

    output.push_str("# TYPE ");
    output.push_str(family.name());
    output.push(' ');
    output.push_str(family.metric_type().as_str());
    output.push('\n');

    for sample in &value_family.samples {
        let labels = resolve_labels(value_family.family_index, family, &sample.labels)?;
        push_sample(output, family, &labels, &sample.payload, options);
    }

    Ok(())
}

/// Renders `block` as Prometheus text exposition, resolving names through
/// `metadata`. Families and samples keep their wire order.
///
/// Payloads are rendered by their own shape; the caller is expected to have
/// matched them against the family types, as [`read_value_block`] does.
///
/// [`read_value_block`]: crate::value_block::read_value_block
pub fn render_value_block(
    block: &ValueBlock,
    metadata: &Metadata,
    options: &DecodeOptions,
) -> Result<String, CprDecodeError> {
    let mut output = String::new();
    for family in &block.families {
        push_family(&mut output, family, metadata, options)?;
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;
    use crate::{
        metadata::MetricType,
        value_block::{Bucket, LabelValue, Quantile, Sample},
    };

    fn metadata() -> Metadata {
        Metadata::new(
            1,
            vec![
                MetricFamilyMetadata::new(
                    "rpc_seconds",
                    "RPC latency.",
                    MetricType::Summary,
                    vec!["service".to_string()],
                ),
                MetricFamilyMetadata::new(
                    "size_bytes",
                    "Sizes.",
                    MetricType::Histogram,
                    vec![],
                ),
            ],
        )
    }

    fn histogram_block() -> ValueBlock<'static> {
        ValueBlock {
            version: 1,
            families: vec![ValueFamily {
                family_index: 1,
                samples: vec![Sample {
                    labels: smallvec![],
                    payload: SamplePayload::Histogram {
                        buckets: vec![
                            Bucket {
                                upper_bound: 1.0,
                                cumulative_count: 2.0,
                            },
                            Bucket {
                                upper_bound: f64::INFINITY,
                                cumulative_count: 3.0,
                            },
                        ],
                        sum: 4.5,
                        count: 3,
                    },
                }],
            }],
        }
    }

    #[test]
    fn test_summary_with_labels() {
        let block = ValueBlock {
            version: 1,
            families: vec![ValueFamily {
                family_index: 0,
                samples: vec![Sample {
                    labels: smallvec![LabelValue {
                        index: 0,
                        value: "auth"
                    }],
                    payload: SamplePayload::Summary {
                        quantiles: vec![Quantile {
                            quantile: 0.9,
                            value: 0.25,
                        }],
                        sum: 12.5,
                        count: 50,
                    },
                }],
            }],
        };

        let output = render_value_block(&block, &metadata(), &DecodeOptions::default()).unwrap();
        assert_eq!(
            output,
            "# HELP rpc_seconds RPC latency.\n\
             # TYPE rpc_seconds summary\n\
             rpc_seconds{service=\"auth\",quantile=\"0.9\"} 0.25\n\
             rpc_seconds_sum{service=\"auth\"} 12.5\n\
             rpc_seconds_count{service=\"auth\"} 50\n"
        );
    }

    #[test]
    fn test_histogram_bucket_lines_run_together() {
        let output =
            render_value_block(&histogram_block(), &metadata(), &DecodeOptions::default()).unwrap();
        assert_eq!(
            output,
            "# HELP size_bytes Sizes.\n\
             # TYPE size_bytes histogram\n\
             size_bytes{,bucket=\"1\"} 2size_bytes{,bucket=\"+Inf\"} 3size_bytes_sum 4.5\n\
             size_bytes_count 3\n"
        );
    }

    #[test]
    fn test_histogram_bucket_newlines() {
        let options = DecodeOptions {
            bucket_newlines: true,
        };
        let output = render_value_block(&histogram_block(), &metadata(), &options).unwrap();
        assert_eq!(
            output,
            "# HELP size_bytes Sizes.\n\
             # TYPE size_bytes histogram\n\
             size_bytes{,bucket=\"1\"} 2\n\
             size_bytes{,bucket=\"+Inf\"} 3\n\
             size_bytes_sum 4.5\n\
             size_bytes_count 3\n"
        );
    }

    #[test]
    fn test_unknown_references() {
        let mut block = histogram_block();
        block.families[0].family_index = 9;
        assert_eq!(
            render_value_block(&block, &metadata(), &DecodeOptions::default()),
            Err(CprDecodeError::UnknownFamily(9))
        );

        let mut block = histogram_block();
        block.families[0].samples[0].labels.push(LabelValue {
            index: 0,
            value: "x",
        });
        assert_eq!(
            render_value_block(&block, &metadata(), &DecodeOptions::default()),
            Err(CprDecodeError::UnknownLabel {
                family: 1,
                label: 0
            })
        );
    }
}
