//! Gateway seam for the content-delivery distribution.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionSummaryRecord {
    pub id: String,
    pub comment: String,
}

/// Full readback of one distribution. The provider configuration travels as
/// an opaque payload next to the concurrency token it was read with, so an
/// update can only ever be issued from the same read cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionReadback<C> {
    pub config: Option<C>,
    pub etag: Option<String>,
    pub has_default_cache_behavior: bool,
    pub edge_association_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistributionUpdateError {
    /// The provider rejected the concurrency token: someone else updated
    /// the distribution between our read and write.
    StaleToken(String),
    Other(String),
}

impl std::fmt::Display for DistributionUpdateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StaleToken(message) | Self::Other(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for DistributionUpdateError {}

pub trait DistributionGateway {
    type Config;

    fn list_distributions(&self) -> Result<Vec<DistributionSummaryRecord>, String>;

    fn get_distribution(&self, id: &str) -> Result<DistributionReadback<Self::Config>, String>;

    /// Writes the configuration back with an emptied edge-association list,
    /// conditioned on the supplied concurrency token.
    fn update_without_associations(
        &self,
        id: &str,
        config: Self::Config,
        if_match: &str,
    ) -> Result<(), DistributionUpdateError>;
}
