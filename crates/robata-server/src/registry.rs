//! Service-registry client: registration with retry and a liveness
//! heartbeat.
//!
//! Speaks the nacos HTTP open API. The client is a process-scoped component
//! with an explicit [`init`]/[`RegistryHandle::shutdown`] lifecycle; nothing
//! here is global state. After initial registration succeeds, registry
//! trouble is never fatal to the serving path: heartbeat failures are logged
//! and retried on the next tick, and re-registration attempts fall back to
//! the last-known-good registration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::RegistryConfig;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registration failed after {attempts} attempts and no cached registration exists")]
    Exhausted { attempts: u32 },
}

/// HTTP client for one registered service instance.
pub struct RegistryClient {
    http: Client,
    base: String,
    config: RegistryConfig,
    /// Set once a registration has succeeded; later registration failures
    /// degrade to a warning instead of an error while this holds.
    registered: AtomicBool,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            http: Client::new(),
            base: format!("http://{}", config.server_addr),
            config,
            registered: AtomicBool::new(false),
        }
    }

    fn auth_params(&self) -> Vec<(&'static str, String)> {
        if self.config.username.is_empty() {
            return Vec::new();
        }
        vec![
            ("username", self.config.username.clone()),
            ("password", self.config.password.clone()),
        ]
    }

    fn metadata(&self) -> serde_json::Value {
        json!({ "walletAddress": self.config.wallet_address })
    }

    /// One registration attempt.
    pub async fn register(&self) -> Result<(), RegistryError> {
        let mut params = vec![
            ("serviceName", self.config.service_name.clone()),
            ("ip", self.config.public_ip.clone()),
            ("port", self.config.port.to_string()),
            ("metadata", self.metadata().to_string()),
        ];
        params.extend(self.auth_params());

        self.http
            .post(format!("{}/nacos/v1/ns/instance", self.base))
            .query(&params)
            .send()
            .await?
            .error_for_status()?;

        self.registered.store(true, Ordering::SeqCst);
        tracing::info!(
            service = %self.config.service_name,
            ip = %self.config.public_ip,
            port = self.config.port,
            "registered with service registry"
        );
        Ok(())
    }

    /// Registration with bounded retries and a fixed backoff.
    ///
    /// When every attempt fails: succeeds anyway if a previous registration
    /// is still on record (the registry is assumed to be temporarily
    /// unreachable), errors otherwise.
    pub async fn register_with_retry(&self) -> Result<(), RegistryError> {
        let attempts = self.config.max_retries.max(1);
        for attempt in 1..=attempts {
            match self.register().await {
                Ok(()) => return Ok(()),
                Err(error) => {
                    tracing::error!(%error, attempt, "failed to register with service registry");
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_backoff).await;
                    }
                }
            }
        }

        if self.registered.load(Ordering::SeqCst) {
            tracing::warn!("registry unreachable, continuing on cached registration");
            return Ok(());
        }
        Err(RegistryError::Exhausted { attempts })
    }

    /// One liveness beat.
    pub async fn heartbeat(&self) -> Result<(), RegistryError> {
        let beat = json!({
            "ip": self.config.public_ip,
            "port": self.config.port,
            "serviceName": self.config.service_name,
            "metadata": self.metadata(),
        });
        let mut params = vec![
            ("serviceName", self.config.service_name.clone()),
            ("beat", beat.to_string()),
        ];
        params.extend(self.auth_params());

        self.http
            .put(format!("{}/nacos/v1/ns/instance/beat", self.base))
            .query(&params)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Beats forever on the configured interval. Failures are logged and do
    /// not stop the loop.
    async fn heartbeat_loop(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.heartbeat_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.heartbeat().await {
                Ok(()) => tracing::debug!("heartbeat sent"),
                Err(error) => tracing::error!(%error, "failed to send heartbeat"),
            }
        }
    }
}

/// Running registration: owns the heartbeat task.
///
/// Dropping the handle stops the heartbeat.
pub struct RegistryHandle {
    client: Arc<RegistryClient>,
    heartbeat: Option<JoinHandle<()>>,
}

impl RegistryHandle {
    pub fn client(&self) -> &RegistryClient {
        &self.client
    }

    /// Stops the heartbeat task. Also happens on drop.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.heartbeat.take() {
            task.abort();
        }
    }
}

impl Drop for RegistryHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Registers this instance and starts its heartbeat.
///
/// Fails (and should fail process startup) only when registration cannot be
/// established at all; see [`RegistryClient::register_with_retry`].
pub async fn init(config: RegistryConfig) -> Result<RegistryHandle, RegistryError> {
    let client = Arc::new(RegistryClient::new(config));
    client.register_with_retry().await?;

    let heartbeat = tokio::spawn(client.clone().heartbeat_loop());
    Ok(RegistryHandle {
        client,
        heartbeat: Some(heartbeat),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::{post, put};
    use std::net::SocketAddr;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Default)]
    struct StubLog {
        registers: AtomicUsize,
        beats: AtomicUsize,
        reject: AtomicBool,
    }

    async fn stub_registry() -> (SocketAddr, Arc<StubLog>, JoinHandle<()>) {
        let log = Arc::new(StubLog::default());

        let app = Router::new()
            .route("/nacos/v1/ns/instance", {
                let log = log.clone();
                post(move || {
                    let log = log.clone();
                    async move {
                        log.registers.fetch_add(1, Ordering::SeqCst);
                        if log.reject.load(Ordering::SeqCst) {
                            (StatusCode::INTERNAL_SERVER_ERROR, "error")
                        } else {
                            (StatusCode::OK, "ok")
                        }
                    }
                })
            })
            .route("/nacos/v1/ns/instance/beat", {
                let log = log.clone();
                put(move || {
                    let log = log.clone();
                    async move {
                        log.beats.fetch_add(1, Ordering::SeqCst);
                        (StatusCode::OK, "ok")
                    }
                })
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, log, server)
    }

    fn config(addr: SocketAddr) -> RegistryConfig {
        RegistryConfig {
            server_addr: addr.to_string(),
            username: String::new(),
            password: String::new(),
            service_name: "robata-inference".to_string(),
            public_ip: "203.0.113.7".to_string(),
            port: 5000,
            wallet_address: format!("0x{}", "a".repeat(40)),
            max_retries: 2,
            retry_backoff: Duration::from_millis(5),
            heartbeat_interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn register_and_heartbeat_reach_the_registry() {
        let (addr, log, server) = stub_registry().await;
        let client = RegistryClient::new(config(addr));

        client.register_with_retry().await.unwrap();
        client.heartbeat().await.unwrap();

        assert_eq!(log.registers.load(Ordering::SeqCst), 1);
        assert_eq!(log.beats.load(Ordering::SeqCst), 1);
        server.abort();
    }

    #[tokio::test]
    async fn retries_exhaust_without_cache() {
        // Discard port: nothing listens there.
        let mut config = config("127.0.0.1:9".parse().unwrap());
        config.max_retries = 2;
        let client = RegistryClient::new(config);

        match client.register_with_retry().await {
            Err(RegistryError::Exhausted { attempts }) => assert_eq!(attempts, 2),
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cached_registration_survives_registry_outage() {
        let (addr, log, server) = stub_registry().await;
        let client = RegistryClient::new(config(addr));

        client.register_with_retry().await.unwrap();

        // Registry starts rejecting: re-registration degrades to the cached
        // instance instead of failing.
        log.reject.store(true, Ordering::SeqCst);
        client.register_with_retry().await.unwrap();
        assert!(log.registers.load(Ordering::SeqCst) >= 3);
        server.abort();
    }

    #[tokio::test]
    async fn init_beats_until_shutdown() {
        let (addr, log, server) = stub_registry().await;

        let mut handle = init(config(addr)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let beats = log.beats.load(Ordering::SeqCst);
        assert!(beats >= 2, "expected several beats, saw {beats}");

        handle.shutdown();
        tokio::time::sleep(Duration::from_millis(40)).await;
        let after = log.beats.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(log.beats.load(Ordering::SeqCst), after);
        server.abort();
    }
}
