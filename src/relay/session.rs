use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::debug;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::framing::{FramingLimits, RequestReader};
use super::policy::{CensorshipPolicy, Verdict};
use crate::error::RelayError;
use crate::logging::{ErrorLogger, LogContext, RelayMetrics};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Which half of a session finished first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToTarget,
    TargetToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToTarget => write!(f, "client->target"),
            Direction::TargetToClient => write!(f, "target->client"),
        }
    }
}

/// A client connection paired with its own connection to the target.
/// Both streams are owned here and released together when the session is run.
pub struct ConnectionSession<C, T> {
    id: u64,
    peer: String,
    client: C,
    target: T,
}

impl<C, T> ConnectionSession<C, T> {
    pub fn new(peer: impl Into<String>, client: C, target: T) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            peer: peer.into(),
            client,
            target,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl<C> ConnectionSession<C, TcpStream> {
    /// Dial the target for an accepted client. No retry on failure.
    pub async fn connect(
        client: C,
        peer: impl Into<String>,
        target_addr: &str,
    ) -> Result<Self, RelayError> {
        let target = TcpStream::connect(target_addr)
            .await
            .map_err(|source| RelayError::Connect {
                addr: target_addr.to_string(),
                source,
            })?;

        Ok(Self::new(peer, client, target))
    }
}

/// What happened during one session, logged at teardown
#[derive(Debug)]
pub struct SessionSummary {
    pub id: u64,
    pub peer: String,
    pub forwarded: u64,
    pub censored: u64,
    pub ended_by: Direction,
    /// Why the session stopped, `None` on a clean close
    pub error: Option<RelayError>,
    pub duration_ms: u64,
}

#[derive(Debug, Default)]
struct RequestStats {
    forwarded: u64,
    censored: u64,
}

/// Drives sessions: responses are copied back verbatim while every client
/// request is framed and checked against the censorship policy.
#[derive(Clone)]
pub struct RelayEngine {
    policy: CensorshipPolicy,
    limits: FramingLimits,
}

impl RelayEngine {
    pub fn new(policy: CensorshipPolicy, limits: FramingLimits) -> Self {
        Self { policy, limits }
    }

    pub fn policy(&self) -> &CensorshipPolicy {
        &self.policy
    }

    /// Relay until either direction ends, then close both connections.
    pub async fn run<C, T>(&self, session: ConnectionSession<C, T>) -> SessionSummary
    where
        C: AsyncRead + AsyncWrite + Unpin + Send,
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let ConnectionSession {
            id,
            peer,
            client,
            target,
        } = session;

        let started = Instant::now();
        RelayMetrics::log_session_opened(id, &peer);

        let (client_read, mut client_write) = tokio::io::split(client);
        let (mut target_read, mut target_write) = tokio::io::split(target);
        let mut stats = RequestStats::default();

        // The branch that loses is dropped here, which cancels it
        let (ended_by, result) = tokio::select! {
            result = self.client_to_target(id, client_read, &mut target_write, &mut stats) => {
                (Direction::ClientToTarget, result)
            }
            result = tokio::io::copy(&mut target_read, &mut client_write) => {
                (Direction::TargetToClient, result.map(|_| ()).map_err(RelayError::from))
            }
        };

        if let Err(e) = client_write.shutdown().await {
            debug!("Session {}: client shutdown failed: {}", id, e);
        }
        if let Err(e) = target_write.shutdown().await {
            debug!("Session {}: target shutdown failed: {}", id, e);
        }
        drop((client_write, target_read, target_write));

        let summary = SessionSummary {
            id,
            peer,
            forwarded: stats.forwarded,
            censored: stats.censored,
            ended_by,
            error: result.err(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        if let Some(error) = &summary.error {
            let context = LogContext::new("client", "relay")
                .with_session(summary.id)
                .with_peer(&summary.peer)
                .with_metadata("direction", serde_json::json!(summary.ended_by.to_string()));
            ErrorLogger::log_relay_error(error, Some(context));
        }
        RelayMetrics::log_session_closed(&summary);

        summary
    }

    async fn client_to_target<R, W>(
        &self,
        id: u64,
        client: R,
        target: &mut W,
        stats: &mut RequestStats,
    ) -> Result<(), RelayError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut requests = RequestReader::new(client, self.limits);

        while let Some(request) = requests.next_request().await? {
            match self.policy.evaluate(&request.body)? {
                Verdict::Forward => {
                    target.write_all(&request.raw).await?;
                    target.flush().await?;
                    stats.forwarded += 1;
                    RelayMetrics::log_request_forwarded(
                        id,
                        &request.method,
                        &request.target,
                        request.raw.len(),
                    );
                }
                Verdict::Censor {
                    sender,
                    matched,
                    hash,
                } => {
                    // Dropped without any answer to the client
                    stats.censored += 1;
                    RelayMetrics::log_request_censored(
                        id,
                        &sender.to_checksum(None),
                        &matched,
                        &hash.to_string(),
                    );
                }
            }
        }

        Ok(())
    }
}
