//! Serve the last reported track as JSON on `GET /current`.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::Hook;
use crate::config::HttpServerConfig;
use crate::error::{Error, Result};
use crate::track::Track;

type SharedTrack = Arc<RwLock<Option<Track>>>;

struct RunningServer {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
    local_addr: SocketAddr,
}

pub struct HttpServerHook {
    config: HttpServerConfig,
    current: SharedTrack,
    server: Option<RunningServer>,
}

impl HttpServerHook {
    #[must_use]
    pub fn new(config: HttpServerConfig) -> Self {
        Self {
            config,
            current: Arc::new(RwLock::new(None)),
            server: None,
        }
    }

    /// Address the server is listening on, once set up.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(|server| server.local_addr)
    }
}

fn router(current: SharedTrack) -> Router {
    Router::new()
        .route("/current", get(current_track))
        .with_state(current)
}

async fn current_track(State(current): State<SharedTrack>) -> Json<Option<Track>> {
    Json(current.read().await.clone())
}

#[async_trait]
impl Hook for HttpServerHook {
    fn name(&self) -> &'static str {
        "HttpServer"
    }

    async fn setup(&mut self) -> Result<()> {
        if self.server.is_some() {
            return Ok(());
        }

        let listener = TcpListener::bind((self.config.bind.as_str(), self.config.port))
            .await
            .map_err(|e| {
                Error::hook(
                    self.name(),
                    format!("binding {}:{}: {e}", self.config.bind, self.config.port),
                )
            })?;
        let local_addr = listener.local_addr()?;

        let (shutdown, signal) = oneshot::channel::<()>();
        let app = router(Arc::clone(&self.current));
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await
        });

        info!(addr = %local_addr, "Serving current track on /current");
        self.server = Some(RunningServer {
            shutdown,
            task,
            local_addr,
        });
        Ok(())
    }

    async fn on_track_change(&mut self, track: &Track) -> Result<()> {
        *self.current.write().await = Some(track.clone());
        Ok(())
    }

    async fn teardown(&mut self) -> Result<()> {
        let Some(server) = self.server.take() else {
            return Ok(());
        };

        let _ = server.shutdown.send(());
        match server.task.await {
            Ok(result) => result?,
            Err(e) => return Err(Error::hook(self.name(), format!("server task failed: {e}"))),
        }
        debug!("HTTP server stopped");
        Ok(())
    }
}
