//! Protocol session manager
//!
//! This module handles:
//! - Identifying the bot with the simulator (handshake)
//! - The per-tick receive / decide / send loop
//! - Episode bookkeeping across server restarts
//!
//! One task owns the socket for the whole lifetime of the session.

use crate::config::ClientConfig;
use chrono::{DateTime, Utc};
use scrc_core::protocol::{self, ServerSignal};
use scrc_core::{ControlCommand, DrivingStrategy, GearState, SensorFrame};
use serde::Serialize;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to resolve server address {address}: {source}")]
    Resolve { address: String, source: io::Error },

    #[error("no address found for {0}")]
    NoAddress(String),

    #[error("failed to bind client socket: {0}")]
    Bind(io::Error),

    #[error("failed to send to server: {0}")]
    Send(io::Error),

    #[error("socket already closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Handshaking,
    Racing,
    EpisodeEnding,
    ShuttingDown,
}

/// How a racing phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EpisodeEnd {
    Restart,
    Shutdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeSummary {
    pub episode: u32,
    pub steps: u64,
    pub end: EpisodeEnd,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub handshake_attempts: u32,
    pub episodes: Vec<EpisodeSummary>,
}

enum Received {
    Message(String),
    Timeout,
    Failed(io::Error),
}

/// State after an episode ends
fn after_episode(completed_episodes: u32, max_episodes: u32) -> SessionState {
    if max_episodes > 0 && completed_episodes == max_episodes {
        SessionState::ShuttingDown
    } else {
        SessionState::Handshaking
    }
}

pub struct Session {
    config: ClientConfig,
    strategy: Box<dyn DrivingStrategy>,
    socket: Option<UdpSocket>,
    server: SocketAddr,
    state: SessionState,
    current_step: u64,
    current_episode: u32,
    previous: ControlCommand,
    gear: GearState,
    handshake_attempts: u32,
    episode_started: DateTime<Utc>,
    episodes: Vec<EpisodeSummary>,
}

impl Session {
    /// Resolve the server and bind a local socket
    pub async fn connect(
        config: ClientConfig,
        strategy: Box<dyn DrivingStrategy>,
    ) -> Result<Self, SessionError> {
        let address = config.server_address();
        let mut candidates = tokio::net::lookup_host(&address)
            .await
            .map_err(|source| SessionError::Resolve {
                address: address.clone(),
                source,
            })?
            .collect::<Vec<_>>();
        // The simulator listens on IPv4; prefer it when a name resolves to both
        candidates.sort_by_key(|a| !a.is_ipv4());
        let server = candidates
            .into_iter()
            .next()
            .ok_or(SessionError::NoAddress(address))?;

        let local: SocketAddr = if server.is_ipv4() {
            ([0u8; 4], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local).await.map_err(SessionError::Bind)?;

        info!(
            "Connecting to {} ({}) as {} with {} driver",
            config.server_address(),
            server,
            config.bot_id,
            strategy.name()
        );
        info!(
            "Max episodes: {} | Max steps: {} | Track: {} | Stage: {:?}",
            config.max_episodes,
            config.max_steps,
            config.track.as_deref().unwrap_or("-"),
            config.stage
        );

        Ok(Self {
            config,
            strategy,
            socket: Some(socket),
            server,
            state: SessionState::Handshaking,
            current_step: 0,
            current_episode: 0,
            previous: ControlCommand::default(),
            gear: GearState::default(),
            handshake_attempts: 0,
            episode_started: Utc::now(),
            episodes: Vec::new(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    pub fn current_episode(&self) -> u32 {
        self.current_episode
    }

    /// Command sent on the most recent tick
    pub fn last_command(&self) -> &ControlCommand {
        &self.previous
    }

    /// Drive the state machine until the session shuts down
    pub async fn run(&mut self) -> Result<SessionSummary, SessionError> {
        loop {
            match self.state {
                SessionState::Handshaking => {
                    self.handshake().await?;
                }
                SessionState::Racing => self.race().await?,
                SessionState::EpisodeEnding => self.end_episode(),
                SessionState::ShuttingDown => {
                    self.close();
                    return Ok(self.summary());
                }
            }
        }
    }

    /// Identify with the server, retrying until it answers
    ///
    /// Returns the number of init requests this handshake took.
    pub async fn handshake(&mut self) -> Result<u32, SessionError> {
        if self.socket.is_none() {
            return Err(SessionError::Closed);
        }
        let init = protocol::init_message(&self.config.bot_id);
        let mut attempts = 0;

        loop {
            attempts += 1;
            self.handshake_attempts += 1;

            if let Err(e) = self.send(&init).await {
                warn!("Failed to send init request: {}", e);
                sleep(self.config.recv_timeout()).await;
                continue;
            }

            match self.recv().await? {
                Received::Message(reply) if protocol::is_identified(&reply) => {
                    info!("Identified by server after {} attempt(s)", attempts);
                    self.state = SessionState::Racing;
                    self.current_step = 0;
                    self.episode_started = Utc::now();
                    return Ok(attempts);
                }
                Received::Message(reply) => {
                    debug!("Ignoring reply while identifying: {}", reply);
                }
                Received::Timeout => {
                    debug!("Didn't get response from server, retrying");
                }
                Received::Failed(e) => {
                    // Typically ICMP port unreachable while the server is down
                    warn!("Receive failed during handshake: {}", e);
                    sleep(self.config.recv_timeout()).await;
                }
            }
        }
    }

    /// Serve frames until the server restarts or shuts down the race
    async fn race(&mut self) -> Result<(), SessionError> {
        loop {
            let message = match self.recv().await? {
                Received::Message(message) => message,
                Received::Timeout => {
                    debug!("Didn't get response from server");
                    continue;
                }
                Received::Failed(e) => {
                    warn!("Receive failed: {}", e);
                    continue;
                }
            };

            if let Some(signal) = ServerSignal::detect(&message) {
                self.finish_race(signal);
                return Ok(());
            }

            self.current_step += 1;
            let reply = if self.config.max_steps > 0 && self.current_step == self.config.max_steps {
                info!("Step limit {} reached, ending episode", self.config.max_steps);
                protocol::META_END.to_string()
            } else {
                self.drive(&message)
            };

            if let Err(e) = self.send(&reply).await {
                error!("Failed to send data: {}", e);
                return Err(SessionError::Send(e));
            }
        }
    }

    fn drive(&mut self, message: &str) -> String {
        let frame = SensorFrame::parse(message);
        debug!("Step {}: {} sensor readings", self.current_step, frame.len());

        let cmd = self
            .strategy
            .decide(&frame, &self.previous, &mut self.gear);
        self.previous = cmd;
        cmd.encode()
    }

    fn finish_race(&mut self, signal: ServerSignal) {
        let end = match signal {
            ServerSignal::Shutdown => {
                self.strategy.on_shutdown();
                info!("Client shutdown");
                self.state = SessionState::ShuttingDown;
                EpisodeEnd::Shutdown
            }
            ServerSignal::Restart => {
                self.strategy.on_restart();
                info!("Client restart");
                self.state = SessionState::EpisodeEnding;
                EpisodeEnd::Restart
            }
        };

        self.episodes.push(EpisodeSummary {
            episode: self.current_episode,
            steps: self.current_step,
            end,
            started_at: self.episode_started,
            ended_at: Utc::now(),
        });
    }

    fn end_episode(&mut self) {
        self.current_episode += 1;
        self.state = after_episode(self.current_episode, self.config.max_episodes);
        if self.state == SessionState::Handshaking {
            self.current_step = 0;
        }
        info!(
            "Episode {} finished, next: {:?}",
            self.current_episode, self.state
        );
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            info!("Socket closed");
        }
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            handshake_attempts: self.handshake_attempts,
            episodes: self.episodes.clone(),
        }
    }

    async fn send(&self, message: &str) -> io::Result<()> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "socket closed"))?;
        debug!("Sending: {}", message);
        socket.send_to(message.as_bytes(), self.server).await?;
        Ok(())
    }

    async fn recv(&self) -> Result<Received, SessionError> {
        let socket = self.socket.as_ref().ok_or(SessionError::Closed)?;
        let mut buf = [0u8; protocol::MAX_DATAGRAM];

        Ok(
            match timeout(self.config.recv_timeout(), socket.recv_from(&mut buf)).await {
                Ok(Ok((len, _from))) => {
                    Received::Message(String::from_utf8_lossy(&buf[..len]).into_owned())
                }
                Ok(Err(e)) => Received::Failed(e),
                Err(_) => Received::Timeout,
            },
        )
    }
}
