//! Publish the current track to an MQTT topic.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, Outgoing, QoS};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::Hook;
use crate::config::MqttConfig;
use crate::error::{Error, Result};
use crate::track::Track;

/// Request channel capacity between the client and its event loop.
/// Publishing never waits for room; a full channel fails the change.
const REQUEST_CAPACITY: usize = 10;

/// Shortest keep-alive the client library accepts
const MIN_KEEP_ALIVE_SECS: u64 = 5;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

struct Connection {
    client: AsyncClient,
    event_loop: JoinHandle<()>,
}

pub struct MqttHook {
    config: MqttConfig,
    client_id: String,
    connection: Option<Connection>,
}

impl MqttHook {
    /// # Errors
    ///
    /// Fails when no topic is configured.
    pub fn new(config: MqttConfig) -> Result<Self> {
        if config.topic.trim().is_empty() {
            return Err(Error::config("mqtt hook requires a non-empty topic"));
        }

        let client_id = config
            .client_id
            .clone()
            .unwrap_or_else(|| format!("lasthook-{}", Uuid::new_v4()));

        Ok(Self {
            config,
            client_id,
            connection: None,
        })
    }

    fn options(&self) -> MqttOptions {
        let mut options =
            MqttOptions::new(self.client_id.clone(), self.config.host.clone(), self.config.port);
        options.set_keep_alive(Duration::from_secs(
            self.config.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS),
        ));
        if let Some(username) = &self.config.username {
            options.set_credentials(
                username.clone(),
                self.config.password.clone().unwrap_or_default(),
            );
        }
        options
    }
}

async fn drive(mut event_loop: EventLoop) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Incoming::ConnAck(_))) => info!("Connected to MQTT broker"),
            Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
            Ok(event) => trace!(?event, "MQTT event"),
            Err(e) => {
                warn!(error = %e, "MQTT connection error, retrying in {}s", RECONNECT_DELAY.as_secs());
                time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
    debug!("MQTT event loop finished");
}

#[async_trait]
impl Hook for MqttHook {
    fn name(&self) -> &'static str {
        "Mqtt"
    }

    async fn setup(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let (client, event_loop) = AsyncClient::new(self.options(), REQUEST_CAPACITY);
        let event_loop = tokio::spawn(drive(event_loop));
        info!(
            host = %self.config.host,
            port = self.config.port,
            client_id = %self.client_id,
            "MQTT client started"
        );

        self.connection = Some(Connection { client, event_loop });
        Ok(())
    }

    async fn on_track_change(&mut self, track: &Track) -> Result<()> {
        let connection = self
            .connection
            .as_ref()
            .ok_or_else(|| Error::hook(self.name(), "client is not set up"))?;

        connection
            .client
            .try_publish(
                self.config.topic.as_str(),
                QoS::AtLeastOnce,
                self.config.retain,
                track.formatted(false),
            )
            .map_err(|e| Error::hook(self.name(), format!("publish failed: {e}")))?;

        debug!(topic = %self.config.topic, "Published current track");
        Ok(())
    }

    async fn teardown(&mut self) -> Result<()> {
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };

        if let Err(e) = connection.client.try_disconnect() {
            warn!(error = %e, "MQTT disconnect request failed");
        }
        if time::timeout(SHUTDOWN_GRACE, &mut connection.event_loop)
            .await
            .is_err()
        {
            debug!("MQTT event loop did not finish in time, aborting");
            connection.event_loop.abort();
        }
        Ok(())
    }
}
