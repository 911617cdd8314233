use crate::config::DashboardConfig;
use crate::error::Result;
use crate::source::SpreadsheetSource;
use crate::{DashboardProcessor, DashboardSnapshot};
use log::{info, warn};
use std::sync::Arc;

/// Holds the derived dashboard data for one session.
///
/// The report is parsed on the first [`load`](Self::load) and every later call
/// returns the same snapshot until [`invalidate`](Self::invalidate) or
/// [`reload`](Self::reload). A failed load leaves the cache empty; retrying is
/// up to the caller.
pub struct DashboardCache {
    source: SpreadsheetSource,
    config: DashboardConfig,
    snapshot: Option<Arc<DashboardSnapshot>>,
}

impl DashboardCache {
    pub fn new(source: SpreadsheetSource, config: DashboardConfig) -> Self {
        Self {
            source,
            config,
            snapshot: None,
        }
    }

    pub fn with_default_config(source: SpreadsheetSource) -> Self {
        Self::new(source, DashboardConfig::default())
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    /// The cached snapshot, without triggering a load.
    pub fn snapshot(&self) -> Option<Arc<DashboardSnapshot>> {
        self.snapshot.clone()
    }

    pub fn load(&mut self) -> Result<Arc<DashboardSnapshot>> {
        if let Some(snapshot) = &self.snapshot {
            return Ok(Arc::clone(snapshot));
        }

        let rows = self.source.read_rows().map_err(|e| {
            warn!("Failed to load balance report: {}", e);
            e
        })?;
        Ok(self.store(DashboardProcessor::process(&rows, &self.config)?))
    }

    pub fn invalidate(&mut self) {
        if self.snapshot.take().is_some() {
            info!("Dashboard cache invalidated");
        }
    }

    pub fn reload(&mut self) -> Result<Arc<DashboardSnapshot>> {
        self.invalidate();
        self.load()
    }

    #[cfg(feature = "remote")]
    pub async fn load_async(&mut self) -> Result<Arc<DashboardSnapshot>> {
        if let Some(snapshot) = &self.snapshot {
            return Ok(Arc::clone(snapshot));
        }

        let rows = self.source.read_rows_async().await.map_err(|e| {
            warn!("Failed to load balance report: {}", e);
            e
        })?;
        Ok(self.store(DashboardProcessor::process(&rows, &self.config)?))
    }

    #[cfg(feature = "remote")]
    pub async fn reload_async(&mut self) -> Result<Arc<DashboardSnapshot>> {
        self.invalidate();
        self.load_async().await
    }

    fn store(&mut self, snapshot: DashboardSnapshot) -> Arc<DashboardSnapshot> {
        let snapshot = Arc::new(snapshot);
        info!(
            "Dashboard cache loaded: {} households, {} officers",
            snapshot.households.len(),
            snapshot.officers.len()
        );
        self.snapshot = Some(Arc::clone(&snapshot));
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use std::fs;
    use std::path::PathBuf;

    const HEADER: &str = "Household ID,Household Name,Officer Code,Officer Name,Current Month-end Deposit Balance\n";

    fn temp_report(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "deposit-dynamics-{}-{}.csv",
            name,
            std::process::id()
        ));
        fs::write(&path, format!("{}{}", HEADER, body)).unwrap();
        path
    }

    #[test]
    fn test_load_is_cached_until_reload() {
        let path = temp_report("cache", "H1,Smith,100,Jane Doe,$500\n");
        let mut cache = DashboardCache::with_default_config(SpreadsheetSource::file(&path));
        assert!(!cache.is_loaded());

        let first = cache.load().unwrap();
        assert_eq!(first.households.len(), 1);

        fs::write(
            &path,
            format!("{}H1,Smith,100,Jane Doe,$500\nH2,Jones,100,Jane Doe,$700\n", HEADER),
        )
        .unwrap();

        let second = cache.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.households.len(), 1);

        let reloaded = cache.reload().unwrap();
        assert_eq!(reloaded.households.len(), 2);
        assert_eq!(reloaded.officers[0].total_balance, 1_200.0);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_failed_load_leaves_cache_empty() {
        let mut cache = DashboardCache::with_default_config(SpreadsheetSource::file(
            "/definitely/not/here/report.csv",
        ));
        assert!(matches!(cache.load(), Err(DashboardError::IoError(_))));
        assert!(!cache.is_loaded());
        assert!(cache.snapshot().is_none());
    }

    #[test]
    fn test_invalidate_drops_snapshot() {
        let mut cache = DashboardCache::with_default_config(SpreadsheetSource::bytes(
            format!("{}H1,Smith,100,Jane Doe,$500\n", HEADER).into_bytes(),
        ));
        cache.load().unwrap();
        assert!(cache.is_loaded());
        cache.invalidate();
        assert!(!cache.is_loaded());
    }

    #[cfg(feature = "remote")]
    #[tokio::test]
    async fn test_async_load_of_local_file() {
        let path = temp_report("async", "H1,Smith,100,Jane Doe,$500\n");
        let mut cache = DashboardCache::with_default_config(SpreadsheetSource::file(&path));

        let snapshot = cache.load_async().await.unwrap();
        assert_eq!(snapshot.households.len(), 1);
        assert!(Arc::ptr_eq(&snapshot, &cache.load().unwrap()));

        fs::remove_file(&path).ok();
    }
}
