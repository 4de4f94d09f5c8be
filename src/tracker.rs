use std::sync::Arc;

use crate::analysis;
use crate::config::AppConfig;
use crate::grouping::{self, GroupingError, RuleClassifier, ShowClassifier, YearClassifier};
use crate::index::Catalog;
use crate::models::{CatalogStats, ForwardAnalysis, ReverseAnalysis, Show, ShowGroup};
use crate::search::{self, DEFAULT_SEARCH_LIMIT};
use crate::snapshot::{Loader, Result, SnapshotSource};

/// Query entry point for one browsing session.
///
/// Every query makes sure the snapshot is loaded, then runs against one
/// consistent catalog.
pub struct Tracker {
    loader: Loader,
    classifier: Box<dyn ShowClassifier>,
    search_limit: usize,
}

impl Tracker {
    /// Tracker grouping shows by year with the default search limit.
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            loader: Loader::new(source),
            classifier: Box::new(YearClassifier),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Tracker using the config's group rules and search limit.
    pub fn from_config(
        config: &AppConfig,
        source: Arc<dyn SnapshotSource>,
    ) -> std::result::Result<Self, GroupingError> {
        let tracker = Self::new(source).with_search_limit(config.search_limit);
        if config.groups.is_empty() {
            Ok(tracker)
        } else {
            Ok(tracker.with_classifier(Box::new(RuleClassifier::new(&config.groups)?)))
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn ShowClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Load the snapshot (no-op once loaded).
    pub async fn load(&self) -> Result<()> {
        self.loader.load().await.map(|_| ())
    }

    /// Replace the loaded snapshot with a fresh one; keeps the old one on failure.
    pub async fn reload(&self) -> Result<()> {
        self.loader.reload().await.map(|_| ())
    }

    /// The loaded catalog, loading it first if needed.
    pub async fn catalog(&self) -> Result<Arc<Catalog>> {
        self.loader.load().await
    }

    pub async fn search_shows(&self, query: &str) -> Result<Vec<Show>> {
        let catalog = self.catalog().await?;
        Ok(search::search_shows(&catalog.indices, query, self.search_limit))
    }

    pub async fn analyze_songs(&self, show_ids: &[i64]) -> Result<ForwardAnalysis> {
        let catalog = self.catalog().await?;
        Ok(analysis::analyze_songs(&catalog.indices, show_ids))
    }

    pub async fn analyze_reverse_songs(&self, show_ids: &[i64]) -> Result<ReverseAnalysis> {
        let catalog = self.catalog().await?;
        Ok(analysis::analyze_reverse_songs(&catalog.indices, show_ids))
    }

    pub async fn grouped_shows(&self) -> Result<Vec<ShowGroup>> {
        let catalog = self.catalog().await?;
        Ok(grouping::grouped_shows(&catalog.indices, self.classifier.as_ref()))
    }

    pub async fn get_stats(&self) -> Result<CatalogStats> {
        Ok(self.catalog().await?.stats())
    }

    pub fn source_description(&self) -> String {
        self.loader.describe()
    }
}
