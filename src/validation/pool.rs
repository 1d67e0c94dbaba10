use async_trait::async_trait;
use futures::{StreamExt, stream};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{Instant, timeout_at};

use crate::cache::{CacheEntry, CacheStatus, CacheStore};
use crate::config::Config;
use crate::core::constants::{defaults, details};
use crate::core::error::{LinkrotError, Result};
use crate::core::normalize::NormalizedLink;
use crate::core::types::{LinkReference, LinkStatus, ValidationOutcome};
use crate::ui::progress::ProgressReporter;
use crate::validation::exclusion::ExclusionRules;
use crate::validation::inflight::{Claim, InFlight};
use crate::validation::probe::{HttpProbe, LinkProbe};
use crate::validation::retry::{RetryPolicy, run_remote_check};

#[async_trait]
pub trait ValidateLinks {
    /// Resolve every reference to a status. The result has one outcome per
    /// input reference, in input order.
    async fn validate(
        &self,
        links: Vec<LinkReference>,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<ValidationOutcome>>;
}

/// Tunables of the validator pool.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Checks allowed to run at the same time
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// How long a fresh result stays valid in the cache
    pub cache_ttl: Duration,
    /// Deadline for the whole validation phase
    pub run_timeout: Option<Duration>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get(),
            retry: RetryPolicy::default(),
            cache_ttl: Duration::from_secs(crate::core::constants::timeouts::DEFAULT_MAX_CACHE_AGE_SECONDS),
            run_timeout: None,
        }
    }
}

impl PoolSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            concurrency: config.concurrency_limit(),
            retry: RetryPolicy {
                max_retries: u32::from(config.retry_attempts.unwrap_or(defaults::RETRY_ATTEMPTS)),
                base_delay: config.retry_delay_duration(),
                allowed_status_codes: config.allowed_status_codes.clone().unwrap_or_default(),
            },
            cache_ttl: config.max_cache_age_duration()?,
            run_timeout: config.run_timeout_duration()?,
        })
    }
}

/// Bounded pool of link checks sharing one cache and one in-flight arena.
pub struct ValidatorPool {
    probe: Arc<dyn LinkProbe>,
    cache: Arc<CacheStore>,
    exclusions: ExclusionRules,
    settings: PoolSettings,
    root: PathBuf,
    semaphore: Arc<Semaphore>,
    in_flight: InFlight,
    deadline: Option<Instant>,
}

impl ValidatorPool {
    pub fn new(
        probe: Arc<dyn LinkProbe>,
        cache: Arc<CacheStore>,
        exclusions: ExclusionRules,
        settings: PoolSettings,
        root: impl Into<PathBuf>,
    ) -> Self {
        let permits = settings.concurrency.max(1);
        Self {
            probe,
            cache,
            exclusions,
            settings,
            root: root.into(),
            semaphore: Arc::new(Semaphore::new(permits)),
            in_flight: InFlight::new(),
            deadline: None,
        }
    }

    /// Pool backed by an HTTP client built from `config`.
    pub fn from_config(config: &Config, cache: Arc<CacheStore>, root: impl Into<PathBuf>) -> Result<Self> {
        let probe = HttpProbe::from_config(config)?;
        Ok(Self::new(
            Arc::new(probe),
            cache,
            ExclusionRules::from_config(config)?,
            PoolSettings::from_config(config)?,
            root,
        ))
    }

    /// Fixed deadline for the run, overriding `run_timeout` counted from
    /// the start of `validate`.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    async fn resolve(&self, link: &LinkReference, deadline: Option<Instant>) -> Result<LinkStatus> {
        let normalized = match NormalizedLink::from_reference(link, &self.root) {
            Ok(normalized) => normalized,
            Err(malformed) => return Ok(LinkStatus::Error(malformed.to_string())),
        };

        if let Some(pattern) = self.exclusions.matching_pattern(&normalized) {
            log::debug!("{normalized} excluded by pattern '{pattern}'");
            return Ok(LinkStatus::Excluded);
        }

        if let Some(entry) = self.cache.lookup(normalized.as_str())
            && entry.status != CacheStatus::Excluded
        {
            log::debug!("{normalized} answered from cache");
            return Ok(entry.to_status());
        }

        match self.in_flight.claim(normalized.as_str()) {
            Claim::Done(status) => Ok(status),
            Claim::Waiter(waiter) => Ok(waiter.wait().await),
            Claim::Owner(token) => {
                // Dropping the token frees the key
                let Some(status) = self.check(&normalized, deadline).await? else {
                    return Ok(LinkStatus::Error(details::RUN_TIMEOUT.to_string()));
                };
                if let Some(entry) =
                    CacheEntry::from_status(normalized.as_str(), &status, self.settings.cache_ttl)
                {
                    self.cache.write(entry);
                }
                token.release(status.clone());
                Ok(status)
            }
        }
    }

    /// Check one link under a permit. `None` when the deadline passed before
    /// the check could start.
    async fn check(&self, link: &NormalizedLink, deadline: Option<Instant>) -> Result<Option<LinkStatus>> {
        if is_past(deadline) {
            return Ok(None);
        }
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| LinkrotError::WorkerPool(e.to_string()))?;
        if is_past(deadline) {
            return Ok(None);
        }

        let status = match link.as_path() {
            Some(path) => {
                if self.probe.probe_local(path).await {
                    LinkStatus::Ok
                } else {
                    LinkStatus::Broken(details::FILE_NOT_FOUND.to_string())
                }
            }
            None => run_remote_check(self.probe.as_ref(), link.as_str(), &self.settings.retry).await,
        };
        log::debug!("{link}: {status}");
        Ok(Some(status))
    }

    async fn resolve_before(&self, link: &LinkReference, deadline: Option<Instant>) -> Result<LinkStatus> {
        let Some(deadline) = deadline else {
            return self.resolve(link, None).await;
        };

        match timeout_at(deadline, self.resolve(link, Some(deadline))).await {
            Ok(Ok(LinkStatus::Error(reason)))
                if reason == details::CHECK_ABANDONED && Instant::now() >= deadline =>
            {
                Ok(LinkStatus::Error(details::RUN_TIMEOUT.to_string()))
            }
            Ok(result) => result,
            Err(_) => Ok(LinkStatus::Error(details::RUN_TIMEOUT.to_string())),
        }
    }
}

fn is_past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

#[async_trait]
impl ValidateLinks for ValidatorPool {
    async fn validate(
        &self,
        links: Vec<LinkReference>,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<ValidationOutcome>> {
        let total = links.len();
        let bar = progress.and_then(|p| p.start_validation(total));
        let deadline = self
            .deadline
            .or_else(|| self.settings.run_timeout.map(|limit| Instant::now() + limit));

        let pending: Vec<_> = links
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, link)| async move {
                let status = self.resolve_before(&link, deadline).await?;
                Ok::<_, LinkrotError>((index, status))
            })
            .collect();

        // Waiters park without a permit, so the stream may run ahead of the
        // semaphore.
        let width = self.settings.concurrency.max(1).saturating_mul(4);
        let mut resolved = stream::iter(pending).buffer_unordered(width);

        let mut statuses: Vec<Option<LinkStatus>> = vec![None; total];
        let mut failures = 0;
        while let Some(result) = resolved.next().await {
            let (index, status) = result?;
            if status.is_failure() {
                failures += 1;
            }
            statuses[index] = Some(status);
            if let Some(ref pb) = bar {
                pb.inc(1);
            }
        }
        drop(resolved);

        if let Some(reporter) = progress {
            reporter.finish_validation(bar.as_ref(), failures, total);
        }

        Ok(links
            .into_iter()
            .zip(statuses)
            .map(|(link, status)| {
                let status = status
                    .unwrap_or_else(|| LinkStatus::Error(details::RUN_TIMEOUT.to_string()));
                ValidationOutcome::new(link, status)
            })
            .collect())
    }
}
