use super::defaults::DefaultTable;
use super::error::{RateLimitError, Target};
use super::identifier::resolve_identifier;
use super::matcher::find_rate_limit;
use super::model::{RateLimit, RateLimitFields, RateLimitPage, UpdateRateLimitRequest};
use crate::config::Config;
use crate::http::{encode_path_segment, HttpTransport, Transport, TransportError};
use log::{debug, info, warn};
use reqwest::Method;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

fn collection_path(project_id: &str) -> String {
    format!(
        "/organization/projects/{}/rate_limits",
        encode_path_segment(project_id)
    )
}

fn record_path(project_id: &str, rate_limit_id: &str) -> String {
    format!(
        "{}/{}",
        collection_path(project_id),
        encode_path_segment(rate_limit_id)
    )
}

/// Get, update, reset and list project rate limits.
///
/// Nothing is cached and only the first catalog page is read. Update and reset
/// write to the resolved id without a version check.
pub struct RateLimitService<T> {
    transport: T,
    defaults: DefaultTable,
    call_timeout: Duration,
    cancel: CancellationToken,
}

impl RateLimitService<HttpTransport> {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(cfg)?;
        let defaults = match &cfg.defaults_file {
            Some(path) => DefaultTable::from_file(path)?,
            None => DefaultTable::builtin().clone(),
        };
        Ok(Self::new(transport)
            .with_defaults(defaults)
            .with_timeout(Duration::from_secs(cfg.timeout_secs)))
    }
}

impl<T: Transport> RateLimitService<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            defaults: DefaultTable::builtin().clone(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: DefaultTable) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Once `token` is cancelled, in-flight calls are abandoned and no new call is issued.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn defaults(&self) -> &DefaultTable {
        &self.defaults
    }

    pub async fn list_page(&self, project_id: &str) -> Result<RateLimitPage, RateLimitError> {
        self.fetch_catalog(&Target {
            project_id,
            identifier: "",
        })
        .await
    }

    pub async fn list(&self, project_id: &str) -> Result<Vec<RateLimit>, RateLimitError> {
        Ok(self.list_page(project_id).await?.data)
    }

    pub async fn get(&self, project_id: &str, identifier: &str) -> Result<RateLimit, RateLimitError> {
        self.resolve(&Target {
            project_id,
            identifier,
        })
        .await
    }

    /// Values the caller set win over whatever the platform echoes back.
    pub async fn update(
        &self,
        project_id: &str,
        identifier: &str,
        fields: RateLimitFields,
    ) -> Result<RateLimit, RateLimitError> {
        let target = Target {
            project_id,
            identifier,
        };
        if fields.is_empty() {
            return Err(target.validation("at least one rate limit field must be set"));
        }
        let current = self.resolve(&target).await?;
        self.write(&target, &current, fields).await
    }

    /// Overwrite the record with every value of its model's default entry.
    ///
    /// The platform has no delete for rate limits; the record keeps existing.
    /// Resetting an already-default record still performs the write.
    pub async fn reset_to_default(
        &self,
        project_id: &str,
        identifier: &str,
    ) -> Result<RateLimit, RateLimitError> {
        let target = Target {
            project_id,
            identifier,
        };
        let current = self.resolve(&target).await?;
        let defaults = self.defaults.lookup(&current.model);
        info!(
            "resetting rate limit {} ({}) in project {} to defaults",
            current.id, current.model, project_id
        );
        self.write(&target, &current, defaults).await
    }

    /// Reset-to-default under the name the provisioning framework calls on destroy.
    pub async fn delete(&self, project_id: &str, identifier: &str) -> Result<(), RateLimitError> {
        self.reset_to_default(project_id, identifier).await.map(|_| ())
    }

    pub async fn import(&self, import_id: &str) -> Result<RateLimit, RateLimitError> {
        let id = ImportId::parse(import_id)?;
        self.get(&id.project_id, &id.identifier).await
    }

    async fn resolve(&self, target: &Target<'_>) -> Result<RateLimit, RateLimitError> {
        let catalog = self.fetch_catalog(target).await?;
        let key = resolve_identifier(target.identifier);
        find_rate_limit(&catalog.data, &key)
            .map(|m| m.record.clone())
            .ok_or_else(|| target.not_found())
    }

    async fn fetch_catalog(&self, target: &Target<'_>) -> Result<RateLimitPage, RateLimitError> {
        if target.project_id.trim().is_empty() {
            return Err(target.validation("project_id must not be empty"));
        }
        let bytes = self
            .call(target, Method::GET, &collection_path(target.project_id), None)
            .await?;
        let page: RateLimitPage = serde_json::from_slice(&bytes).map_err(|e| target.decode(e))?;
        debug!(
            "project {} catalog: {} rate limits",
            target.project_id,
            page.data.len()
        );
        if page.has_more {
            warn!(
                "project {} has more rate limits than the first page; later records are not visible",
                target.project_id
            );
        }
        Ok(page)
    }

    async fn write(
        &self,
        target: &Target<'_>,
        current: &RateLimit,
        fields: RateLimitFields,
    ) -> Result<RateLimit, RateLimitError> {
        let body = UpdateRateLimitRequest {
            name: current.model.clone(),
            fields,
        }
        .to_body();
        let bytes = self
            .call(
                target,
                Method::POST,
                &record_path(target.project_id, &current.id),
                Some(body),
            )
            .await?;
        let mut updated: RateLimit =
            serde_json::from_slice(&bytes).map_err(|e| target.decode(e))?;
        if updated.id.is_empty() {
            updated.id = current.id.clone();
        }
        if updated.model.is_empty() {
            updated.model = current.model.clone();
        }
        fields.apply_to(&mut updated);
        info!(
            "updated rate limit {} in project {}",
            updated.id, target.project_id
        );
        Ok(updated)
    }

    async fn call(
        &self,
        target: &Target<'_>,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>, RateLimitError> {
        if self.cancel.is_cancelled() {
            return Err(target.remote(TransportError::Cancelled));
        }
        let request = tokio::time::timeout(
            self.call_timeout,
            self.transport.execute(method, path, body),
        );
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(target.remote(TransportError::Cancelled)),
            res = request => match res {
                Ok(inner) => inner.map_err(|e| target.remote(e)),
                Err(_) => Err(target.remote(TransportError::Timeout(self.call_timeout))),
            },
        }
    }
}

/// Composite id used to import an existing record: `<project_id>:<identifier>`.
/// A `/` separator is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportId {
    pub project_id: String,
    pub identifier: String,
}

impl ImportId {
    pub fn parse(raw: &str) -> Result<Self, RateLimitError> {
        let target = Target {
            project_id: "",
            identifier: raw,
        };
        let (project_id, identifier) = raw
            .split_once(':')
            .or_else(|| raw.split_once('/'))
            .ok_or_else(|| target.validation("import id must be <project_id>:<identifier>"))?;
        let (project_id, identifier) = (project_id.trim(), identifier.trim());
        if project_id.is_empty() || identifier.is_empty() {
            return Err(target.validation("import id must be <project_id>:<identifier>"));
        }
        Ok(Self {
            project_id: project_id.to_string(),
            identifier: identifier.to_string(),
        })
    }
}
