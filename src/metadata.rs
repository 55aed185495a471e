use std::{fmt, sync::Arc};

use arc_swap::ArcSwap;
use tracing::debug;

use crate::errors::CprDecodeError;

/// Kind of a metric family.
///
/// Wire values follow the Prometheus client model enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Counter,
    Gauge,
    Summary,
    Untyped,
    Histogram,
}

impl MetricType {
    /// Lowercase name, as written on `# TYPE` lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Summary => "summary",
            MetricType::Untyped => "untyped",
            MetricType::Histogram => "histogram",
        }
    }

    /// Value used on the wire.
    pub fn wire_value(&self) -> u64 {
        match self {
            MetricType::Counter => 0,
            MetricType::Gauge => 1,
            MetricType::Summary => 2,
            MetricType::Untyped => 3,
            MetricType::Histogram => 4,
        }
    }
}

impl TryFrom<u64> for MetricType {
    type Error = CprDecodeError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MetricType::Counter),
            1 => Ok(MetricType::Gauge),
            2 => Ok(MetricType::Summary),
            3 => Ok(MetricType::Untyped),
            4 => Ok(MetricType::Histogram),
            other => Err(CprDecodeError::UnsupportedMetricType(other)),
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of one metric family.
///
/// Label names are stored in declaration order; a label's index is its
/// position in that list.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamilyMetadata {
    name: String,
    help: String,
    metric_type: MetricType,
    labels: Vec<String>,
}

impl MetricFamilyMetadata {
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        metric_type: MetricType,
        labels: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            metric_type,
            labels,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    /// Label names, indexed by label index.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label_name(&self, index: u64) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.labels.get(index))
            .map(String::as_str)
    }
}

/// One generation of cached schema: a version tag and the families it
/// declares, indexed by their position in the metadata block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    version: Option<u64>,
    families: Vec<Arc<MetricFamilyMetadata>>,
}

impl Metadata {
    pub fn new(version: u64, families: Vec<MetricFamilyMetadata>) -> Self {
        Self {
            version: Some(version),
            families: families.into_iter().map(Arc::new).collect(),
        }
    }

    /// The producer-assigned version, or `None` for the empty metadata that a
    /// store starts with.
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn families(&self) -> &[Arc<MetricFamilyMetadata>] {
        &self.families
    }

    pub fn lookup(
        &self,
        family_index: u64,
    ) -> Result<&Arc<MetricFamilyMetadata>, CprDecodeError> {
        usize::try_from(family_index)
            .ok()
            .and_then(|index| self.families.get(index))
            .ok_or(CprDecodeError::UnknownFamily(family_index))
    }
}

/// The metadata cache shared by decode calls.
///
/// Contents are only ever replaced wholesale. Readers take an [`Arc`]
/// snapshot, so a decode call sees a single generation from start to end even
/// if another call swaps in new metadata meanwhile.
#[derive(Debug, Default)]
pub struct MetadataStore {
    current: ArcSwap<Metadata>,
}

impl MetadataStore {
    /// Creates an empty store. Its version matches no value block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically swaps in `metadata`, discarding the previous generation.
    ///
    /// Returns the snapshot that was installed.
    pub fn replace(&self, metadata: Metadata) -> Arc<Metadata> {
        let metadata = Arc::new(metadata);
        let previous = self.current.swap(Arc::clone(&metadata));
        debug!(
            previous_version = ?previous.version(),
            version = ?metadata.version(),
            families = metadata.families().len(),
            "Replaced cached metadata."
        );
        metadata
    }

    /// The current generation.
    pub fn snapshot(&self) -> Arc<Metadata> {
        self.current.load_full()
    }

    pub fn lookup(
        &self,
        family_index: u64,
    ) -> Result<Arc<MetricFamilyMetadata>, CprDecodeError> {
        self.current.load().lookup(family_index).cloned()
    }

    pub fn current_version(&self) -> Option<u64> {
        self.current.load().version()
    }
}
