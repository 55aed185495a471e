//!
//! Decoder for a dictionary-compressed binary encoding of Prometheus exposition snapshots.
//!
//! ## Format
//!
//! Scraping a Prometheus endpoint over and over sends the same metric names, help strings,
//! types and label names every time. This encoding sends that schema once, in a *metadata block*
//! tagged with a version, and afterwards only ships *value blocks* that refer to families and
//! labels by index and declare the metadata version they were encoded against.
//!
//! ```text
//! metadata_block (optional) := "cprmeta" version:varint family_count:varint family*
//! family                    := type:varint name:string help:string label_count:varint label_name:string*
//! value_block (mandatory)   := "cprval" version:varint family_count:varint value_family*
//! value_family              := family_index:varint sample_count:varint sample*
//! sample                    := label_count:varint (label_index:varint label_value:string)* payload
//! string                    := len:varint bytes
//! ```
//!
//! Varints are unsigned LEB128, capped at 9 bytes. Doubles are 8 bytes little endian.
//!
//! The decoder keeps the last metadata block it saw in a [`MetadataStore`] and turns value
//! blocks back into the Prometheus text format.
//!
//! ## Example
//!
//! ```rust
//! use rusty_compact_expfmt::{decode, Metadata, MetadataStore, MetricFamilyMetadata, MetricType};
//! use rusty_compact_expfmt::value_block::{Sample, SamplePayload, ValueBlock, ValueFamily};
//!
//! let metadata = Metadata::new(
//!     1,
//!     vec![MetricFamilyMetadata::new("up", "", MetricType::Gauge, vec![])],
//! );
//! let values = ValueBlock {
//!     version: 1,
//!     families: vec![ValueFamily {
//!         family_index: 0,
//!         samples: vec![Sample {
//!             labels: Default::default(),
//!             payload: SamplePayload::Scalar(1.0),
//!         }],
//!     }],
//! };
//!
//! // Serialise a payload carrying both blocks
//! let mut buffer: Vec<u8> = Vec::new();
//! metadata.write(&mut buffer).unwrap();
//! values.write(&mut buffer).unwrap();
//!
//! let store = MetadataStore::new();
//! let text = decode(&buffer, &store).unwrap();
//! assert_eq!(text, "# HELP up \n# TYPE up gauge\nup 1\n");
//!
//! // The metadata is cached, later payloads can leave it out
//! let mut buffer: Vec<u8> = Vec::new();
//! values.write(&mut buffer).unwrap();
//! assert_eq!(decode(&buffer, &store).unwrap(), text);
//! ```

/// Decoding state machine.
pub mod decoder;
mod encoder;
mod errors;
/// Prometheus text exposition rendering.
pub mod exposition;
/// Prometheus' float formatting.
pub mod float;
/// Metric family schema and its cache.
pub mod metadata;
/// Metadata block parsing.
pub mod metadata_block;
/// Byte cursor used by the parsers.
pub mod reader;
/// Value block entities and parsing.
pub mod value_block;
/// LEB128 varint.
pub mod varint;

// Re-exports
pub use decoder::decode;
pub use decoder::decode_with_options;
pub use decoder::DecodeOptions;

pub use errors::CprDecodeError;

pub use metadata::Metadata;
pub use metadata::MetadataStore;
pub use metadata::MetricFamilyMetadata;
pub use metadata::MetricType;
