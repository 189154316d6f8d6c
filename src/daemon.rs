//! The poll loop: fetch, compare, update, notify, sleep.

use crate::cache::{compare, CacheStatus, IpCache};
use crate::config::Config;
use crate::detector::IpDetector;
use crate::error::Result;
use crate::notify::{change_message, Fanout};
use crate::providers::{create_provider, DnsProvider, Record};
use crate::resolver::{resolve_records, ResolvedRecords};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The public IP could not be fetched.
    FetchFailed,
    /// The cache exists but could not be read.
    CacheUnreadable,
    /// The IP matches the cache, nothing was sent.
    Unchanged { ip: String },
    /// Updates were sent for every record.
    Applied {
        ip: String,
        /// No cached IP existed before this tick.
        bootstrap: bool,
        updated: usize,
        failed: usize,
    },
}

/// A running watcher with its records already resolved.
pub struct Daemon<'a> {
    config: &'a Config,
    detector: IpDetector,
    cache: IpCache,
    provider: Box<dyn DnsProvider>,
    fanout: Fanout,
    resolved: ResolvedRecords,
}

impl<'a> Daemon<'a> {
    /// Build the provider, channels and detector from `config`, then resolve
    /// every record. Fails on any configuration or resolution error.
    pub async fn start(config: &'a Config) -> Result<Self> {
        let provider = create_provider(config)?;
        let detector = IpDetector::new(config.ip_source.clone(), config.http_timeout())?;
        let fanout = Fanout::from_config(config)?;
        Self::with_parts(config, detector, provider, fanout).await
    }

    /// Like [`Daemon::start`] with the collaborators supplied by the caller.
    pub async fn with_parts(
        config: &'a Config,
        detector: IpDetector,
        provider: Box<dyn DnsProvider>,
        fanout: Fanout,
    ) -> Result<Self> {
        let resolved = resolve_records(provider.as_ref(), &config.record_names()).await?;
        tracing::info!(
            "Watching {} record(s) via {}",
            resolved.len(),
            provider.name()
        );

        Ok(Self {
            config,
            detector,
            cache: IpCache::new(&config.cache_file),
            provider,
            fanout,
            resolved,
        })
    }

    pub fn records(&self) -> &ResolvedRecords {
        &self.resolved
    }

    pub fn cache(&self) -> &IpCache {
        &self.cache
    }

    /// Poll forever.
    pub async fn run(&self) {
        let interval = self.config.check_interval();
        tracing::info!(
            "Starting ipwatch (interval: {}s, source: {})",
            interval.as_secs(),
            self.detector.source()
        );

        loop {
            self.tick().await;
            tokio::time::sleep(interval).await;
        }
    }

    /// Run one iteration of the loop, minus the sleep.
    pub async fn tick(&self) -> TickOutcome {
        let ip = match self.detector.fetch().await {
            Ok(ip) => ip,
            Err(e) => {
                tracing::error!("Failed to detect IP: {}", e);
                return TickOutcome::FetchFailed;
            }
        };

        let cached = match self.cache.load().await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::error!("{}", e);
                return TickOutcome::CacheUnreadable;
            }
        };

        match cached {
            None => {
                tracing::info!("No cached IP, setting to {}", ip);
                let (updated, failed) = self.apply(&ip).await;
                self.announce(&updated, &ip).await;
                self.remember(&ip).await;
                TickOutcome::Applied {
                    ip,
                    bootstrap: true,
                    updated: updated.len(),
                    failed,
                }
            }
            Some(cached) => match compare(&ip, &cached) {
                CacheStatus::Unchanged => {
                    tracing::info!("No change in IP, no action taken.");
                    TickOutcome::Unchanged { ip }
                }
                CacheStatus::Changed => {
                    tracing::info!("IP changed from {} to {}", cached, ip);
                    self.remember(&ip).await;
                    let (updated, failed) = self.apply(&ip).await;
                    self.announce(&updated, &ip).await;
                    TickOutcome::Applied {
                        ip,
                        bootstrap: false,
                        updated: updated.len(),
                        failed,
                    }
                }
            },
        }
    }

    /// Update every record in order, returning the ones that took and how many failed.
    async fn apply(&self, ip: &str) -> (Vec<&Record>, usize) {
        let mut updated = Vec::with_capacity(self.resolved.len());
        let mut failed = 0;

        for record in &self.resolved.records {
            match self.provider.apply_update(record, ip).await {
                Ok(outcome) => {
                    tracing::info!(
                        "{} ({}): updated to {} ({})",
                        outcome.provider,
                        record.qualified(self.resolved.domain.as_deref()),
                        ip,
                        outcome.detail
                    );
                    updated.push(record);
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    failed += 1;
                }
            }
        }

        (updated, failed)
    }

    async fn announce(&self, updated: &[&Record], ip: &str) {
        if self.fanout.is_empty() {
            return;
        }

        let now = chrono::Local::now();
        for record in updated {
            let name = record.qualified(self.resolved.domain.as_deref());
            let message = change_message(&self.config.site_name, &name, ip, &now);
            let report = self.fanout.dispatch(&message).await;
            if !report.failed.is_empty() {
                tracing::warn!(
                    "Change of {} not delivered via {}",
                    name,
                    report.failed.join(", ")
                );
            }
        }
    }

    async fn remember(&self, ip: &str) {
        if let Err(e) = self.cache.store(ip).await {
            tracing::error!("{}", e);
        }
    }
}
