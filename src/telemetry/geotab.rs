// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Geotab JSON-RPC client with session caching

use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{parse_state_duration, DeviceInfo, Snapshot, SnapshotProvider, TelemetryError, UNKNOWN_VEHICLE_NAME};
use crate::config::TelemetryConfig;

/// `path` value meaning "keep using the server you authenticated against"
const SAME_SERVER: &str = "ThisServer";

/// Error name the API returns for expired or invalid sessions
const INVALID_SESSION: &str = "InvalidUserException";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Credentials {
    database: String,
    user_name: String,
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct AuthResult {
    credentials: Credentials,
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
    #[serde(default)]
    errors: Vec<RpcErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorDetail {
    name: Option<String>,
}

#[derive(Debug, Clone)]
struct Session {
    credentials: Credentials,
    server: String,
    authenticated_at: Instant,
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEntityRef {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatusInfo {
    device: Option<RawEntityRef>,
    speed: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    is_driving: Option<bool>,
    current_state_duration: Option<String>,
}

impl RawDevice {
    fn into_device(self) -> Option<DeviceInfo> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_VEHICLE_NAME.to_string());
        Some(DeviceInfo { id, name })
    }
}

impl RawStatusInfo {
    /// Validate once here so detectors get clean data
    fn into_snapshot(self) -> Option<Snapshot> {
        let vehicle_id = self.device.and_then(|d| d.id).filter(|id| !id.is_empty())?;
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite()).unwrap_or(0.0);

        let current_state_duration = match self.current_state_duration.as_deref() {
            Some(raw) => {
                let parsed = parse_state_duration(raw);
                if parsed.is_none() {
                    debug!("Unparseable state duration {:?} for {}", raw, vehicle_id);
                }
                parsed
            }
            None => None,
        };

        Some(Snapshot {
            vehicle_id,
            speed: finite(self.speed),
            is_driving: self.is_driving.unwrap_or(false),
            latitude: finite(self.latitude),
            longitude: finite(self.longitude),
            current_state_duration,
        })
    }
}

/// Live telemetry from a Geotab MyGeotab server
pub struct GeotabProvider {
    http: reqwest::Client,
    config: TelemetryConfig,
    session: Mutex<Option<Session>>,
}

impl GeotabProvider {
    pub fn new(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            config,
            session: Mutex::new(None),
        })
    }

    /// Bare hosts get `https://`; a server with its own scheme is used as-is
    fn endpoint(server: &str) -> String {
        let server = server.trim_end_matches('/');
        if server.contains("://") {
            format!("{}/apiv1", server)
        } else {
            format!("https://{}/apiv1", server)
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        server: &str,
        method: &str,
        params: Value,
    ) -> Result<T, TelemetryError> {
        let body = json!({ "method": method, "params": params });
        let response: RpcResponse = self
            .http
            .post(Self::endpoint(server))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            let invalid_session = err
                .errors
                .iter()
                .any(|e| e.name.as_deref() == Some(INVALID_SESSION));
            return Err(if invalid_session {
                TelemetryError::Auth(err.message)
            } else {
                TelemetryError::Api { message: err.message }
            });
        }

        let result = response.result.ok_or_else(|| TelemetryError::Api {
            message: format!("{} returned neither result nor error", method),
        })?;
        Ok(serde_json::from_value(result)?)
    }

    async fn authenticate(&self) -> Result<Session, TelemetryError> {
        let (username, password) = match (&self.config.username, &self.config.password) {
            (Some(u), Some(p)) => (u.clone(), p.clone()),
            _ => {
                return Err(TelemetryError::NotConfigured(
                    "username and password are required".to_string(),
                ))
            }
        };

        let params = json!({
            "database": self.config.database,
            "userName": username,
            "password": password,
        });
        let auth: AuthResult = self
            .call(&self.config.server, "Authenticate", params)
            .await
            .map_err(|e| match e {
                TelemetryError::Api { message } => TelemetryError::Auth(message),
                other => other,
            })?;

        let server = match auth.path.as_deref() {
            Some(path) if !path.is_empty() && path != SAME_SERVER => path.to_string(),
            _ => self.config.server.clone(),
        };
        info!("Authenticated with telemetry API at {}", server);

        Ok(Session {
            credentials: auth.credentials,
            server,
            authenticated_at: Instant::now(),
        })
    }

    /// Cached session, re-authenticating once it is older than the TTL
    async fn session(&self) -> Result<Session, TelemetryError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            if session.authenticated_at.elapsed() < self.config.session_ttl() {
                return Ok(session.clone());
            }
            debug!("Telemetry session expired, re-authenticating");
        }
        let session = self.authenticate().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn invalidate_session(&self) {
        *self.session.lock().await = None;
    }

    async fn get_with(&self, session: &Session, type_name: &str) -> Result<Vec<Value>, TelemetryError> {
        let params = json!({
            "typeName": type_name,
            "credentials": session.credentials,
        });
        self.call(&session.server, "Get", params).await
    }

    /// Raw records of one entity type; each is decoded separately by the caller
    async fn get(&self, type_name: &str) -> Result<Vec<Value>, TelemetryError> {
        let session = self.session().await?;
        match self.get_with(&session, type_name).await {
            Err(TelemetryError::Auth(message)) => {
                warn!("Telemetry session rejected ({}), retrying once", message);
                self.invalidate_session().await;
                let session = self.session().await?;
                self.get_with(&session, type_name).await
            }
            other => other,
        }
    }
}

/// Decode records one by one, dropping the malformed and the unusable
fn decode_records<R, T>(type_name: &str, raw: Vec<Value>, convert: impl Fn(R) -> Option<T>) -> Vec<T>
where
    R: DeserializeOwned,
{
    let total = raw.len();
    let mut malformed = 0;
    let records: Vec<T> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<R>(value) {
            Ok(record) => convert(record),
            Err(e) => {
                malformed += 1;
                debug!("Malformed {} record: {}", type_name, e);
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!(
            "Dropped {} of {} {} records ({} malformed, {} without an id)",
            total - records.len(),
            total,
            type_name,
            malformed,
            total - records.len() - malformed
        );
    }
    records
}

#[async_trait]
impl SnapshotProvider for GeotabProvider {
    fn name(&self) -> &str {
        "geotab"
    }

    async fn list_devices(&self) -> Result<Vec<DeviceInfo>, TelemetryError> {
        let raw = self.get("Device").await?;
        Ok(decode_records("Device", raw, RawDevice::into_device))
    }

    async fn live_status(&self) -> Result<Vec<Snapshot>, TelemetryError> {
        let raw = self.get("DeviceStatusInfo").await?;
        Ok(decode_records("DeviceStatusInfo", raw, RawStatusInfo::into_snapshot))
    }
}
