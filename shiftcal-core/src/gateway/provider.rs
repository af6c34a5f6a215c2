//! Provider subprocess gateway.
//!
//! A provider is an external binary named `shiftcal-provider-<name>` that
//! owns the platform calendar (device calendar, remote account, ...). Each
//! call spawns the binary, writes one JSON request line to its stdin and
//! reads one JSON response from its stdout.
//!
//! Providers manage their own credentials. The engine only forwards the
//! `[provider_config]` table from the configuration with every request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::error::{ShiftcalError, ShiftcalResult};
use crate::event::{CalendarInfo, EventDraft, EventMatch, TaggedEvent};
use crate::gateway::CalendarGateway;
use crate::gateway::protocol::{
    Command, DeleteEvent, EventExists, InsertEvent, ListCalendars, ListTagged, ProviderCommand,
    QueryByTitle, RESERVED_PARAMS, Request, Response,
};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    fn binary_path(&self) -> ShiftcalResult<std::path::PathBuf> {
        let binary_name = format!("shiftcal-provider-{}", self.0);
        which::which(&binary_name).map_err(|_| ShiftcalError::ProviderNotInstalled(binary_name))
    }

    /// Call a typed provider command and return the result.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> ShiftcalResult<C::Response> {
        timeout(PROVIDER_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| ShiftcalError::ProviderTimeout(PROVIDER_TIMEOUT.as_secs()))?
    }

    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> ShiftcalResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| ShiftcalError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| ShiftcalError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        log::debug!("Calling {} with {:?}", binary_path.display(), command);

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ShiftcalError::Gateway(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ShiftcalError::Gateway("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(ShiftcalError::Gateway(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(ShiftcalError::Gateway("Provider returned no response".into()));
        }

        let response: Response<R> = serde_json::from_str(&response_str)
            .map_err(|e| ShiftcalError::Gateway(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(ShiftcalError::Gateway(error)),
        }
    }
}

/// [`CalendarGateway`] backed by a provider binary.
#[derive(Clone, Debug)]
pub struct ProviderGateway {
    provider: Provider,
    provider_config: HashMap<String, toml::Value>,
}

impl ProviderGateway {
    pub fn new(provider: Provider, mut provider_config: HashMap<String, toml::Value>) -> Self {
        provider_config.retain(|key, _| {
            let reserved = RESERVED_PARAMS.contains(&key.as_str());
            if reserved {
                log::warn!("Ignoring provider_config.{}: the name is used by the provider protocol", key);
            }
            !reserved
        });

        ProviderGateway {
            provider,
            provider_config,
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    fn params(&self) -> serde_json::Map<String, serde_json::Value> {
        self.provider_config
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

#[async_trait]
impl CalendarGateway for ProviderGateway {
    async fn insert(&self, calendar_id: &str, draft: &EventDraft) -> ShiftcalResult<String> {
        self.provider
            .call(InsertEvent {
                provider_config: self.params(),
                calendar_id: calendar_id.to_string(),
                event: draft.clone(),
            })
            .await
    }

    async fn exists(&self, event_id: &str) -> ShiftcalResult<bool> {
        self.provider
            .call(EventExists {
                provider_config: self.params(),
                event_id: event_id.to_string(),
            })
            .await
    }

    async fn delete(&self, event_id: &str) -> ShiftcalResult<bool> {
        self.provider
            .call(DeleteEvent {
                provider_config: self.params(),
                event_id: event_id.to_string(),
            })
            .await
    }

    async fn query_by_title(
        &self,
        calendar_id: &str,
        title: &str,
    ) -> ShiftcalResult<Vec<EventMatch>> {
        self.provider
            .call(QueryByTitle {
                provider_config: self.params(),
                calendar_id: calendar_id.to_string(),
                title: title.to_string(),
            })
            .await
    }

    async fn list_tagged(
        &self,
        calendar_id: &str,
        title_prefix: &str,
    ) -> ShiftcalResult<Vec<TaggedEvent>> {
        self.provider
            .call(ListTagged {
                provider_config: self.params(),
                calendar_id: calendar_id.to_string(),
                title_prefix: title_prefix.to_string(),
            })
            .await
    }

    async fn list_calendars(&self) -> ShiftcalResult<Vec<CalendarInfo>> {
        self.provider
            .call(ListCalendars {
                provider_config: self.params(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_provider_binary() {
        let gateway = ProviderGateway::new(
            Provider::from_name("definitely-not-installed-xyz"),
            HashMap::new(),
        );

        let err = gateway.exists("ev-1").await.unwrap_err();
        assert!(matches!(
            err,
            ShiftcalError::ProviderNotInstalled(ref name)
                if name == "shiftcal-provider-definitely-not-installed-xyz"
        ));
    }

    #[test]
    fn test_provider_config_is_forwarded_as_json() {
        let mut config = HashMap::new();
        config.insert("local_dir".to_string(), toml::Value::String("/tmp/cal".into()));
        config.insert("retries".to_string(), toml::Value::Integer(2));
        let gateway = ProviderGateway::new(Provider::from_name("local"), config);

        let params = gateway.params();
        assert_eq!(params["local_dir"], "/tmp/cal");
        assert_eq!(params["retries"], 2);
    }

    #[test]
    fn test_reserved_provider_config_keys_are_dropped() {
        let mut config = HashMap::new();
        config.insert("local_dir".to_string(), toml::Value::String("/tmp/cal".into()));
        config.insert("calendar_id".to_string(), toml::Value::String("elsewhere".into()));
        let gateway = ProviderGateway::new(Provider::from_name("local"), config);

        let params = serde_json::to_value(QueryByTitle {
            provider_config: gateway.params(),
            calendar_id: "work".to_string(),
            title: "STIB 41343".to_string(),
        })
        .unwrap();

        assert_eq!(params["calendar_id"], "work");
        assert_eq!(params["local_dir"], "/tmp/cal");
        assert!(!gateway.params().contains_key("calendar_id"));
    }
}
