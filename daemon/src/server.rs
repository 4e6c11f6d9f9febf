use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use tokio::fs;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::UnixListener;
use tracing::{error, info, warn};
use typeahead_core::{CompletionSession, IdPool, SharedIndex};

use crate::config::{CompletionConfig, ServerConfig, MAX_RESULTS_CAP};
use crate::protocol::{
    DaemonRequest, DaemonResponse, ErrorCode, RequestBody, ResponseBody, StatsResponse,
};

type SessionPool = Arc<Mutex<IdPool>>;

pub struct CompletionServer {
    config: ServerConfig,
    completion: Arc<CompletionConfig>,
    index: SharedIndex,
    sessions: SessionPool,
}

impl CompletionServer {
    pub fn new(config: ServerConfig, completion: CompletionConfig, index: SharedIndex) -> Self {
        let sessions = Arc::new(Mutex::new(IdPool::new(config.max_sessions)));
        Self {
            config,
            completion: Arc::new(completion),
            index,
            sessions,
        }
    }

    pub async fn run(self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Binds the configured socket path, creating its directory and replacing
    /// whatever a previous run left there.
    async fn bind(&self) -> Result<UnixListener> {
        let socket_path = &self.config.socket_path;
        if let Some(parent) = socket_path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create socket directory {}", parent.display())
            })?;
        }
        if fs::try_exists(socket_path).await.unwrap_or(false) {
            fs::remove_file(socket_path).await.with_context(|| {
                format!("failed to remove stale socket {}", socket_path.display())
            })?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("failed to bind unix socket at {}", socket_path.display()))?;
        info!(
            socket = %socket_path.display(),
            max_sessions = self.config.max_sessions,
            "typeahead daemon listening"
        );
        Ok(listener)
    }

    async fn serve(self, listener: UnixListener) -> Result<()> {
        let max_line_bytes = self.config.max_line_bytes;
        loop {
            let (stream, _) = listener
                .accept()
                .await
                .context("failed to accept connection")?;
            let index = self.index.clone();
            let sessions = self.sessions.clone();
            let completion = self.completion.clone();
            tokio::spawn(async move {
                let result =
                    handle_connection(stream, index, sessions, &completion, max_line_bytes).await;
                if let Err(error) = result {
                    warn!("connection closed with error: {error:#}");
                }
            });
        }
    }
}

/// A checked-out session id, handed back to the pool on drop.
struct SessionLease {
    id: u32,
    pool: SessionPool,
}

impl SessionLease {
    fn acquire(pool: &SessionPool) -> Option<Self> {
        let id = pool.lock().unwrap_or_else(PoisonError::into_inner).acquire()?;
        Some(Self {
            id,
            pool: pool.clone(),
        })
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .release(self.id);
    }
}

struct Connection {
    lease: SessionLease,
    session: CompletionSession,
}

enum Frame {
    Line(String),
    TooLong,
    Eof,
}

/// Reads one newline-terminated request, buffering at most `max_bytes` of it.
async fn next_frame<R>(reader: &mut R, max_bytes: usize, buf: &mut Vec<u8>) -> Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let read = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if read == 0 {
        return Ok(Frame::Eof);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > max_bytes {
        return Ok(Frame::TooLong);
    }
    Ok(Frame::Line(String::from_utf8_lossy(buf).into_owned()))
}

async fn handle_connection<S>(
    stream: S,
    index: SharedIndex,
    sessions: SessionPool,
    completion: &CompletionConfig,
    max_line_bytes: usize,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    let (reader, mut writer) = tokio::io::split(stream);

    let Some(lease) = SessionLease::acquire(&sessions) else {
        let capacity = sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .capacity();
        warn!(capacity, "rejecting connection: session limit reached");
        let response = DaemonResponse::error(
            String::new(),
            ErrorCode::SessionLimit,
            format!("all {capacity} sessions are in use"),
        );
        write_response(&mut writer, &response).await?;
        return Ok(());
    };
    info!(session_id = lease.id, "session opened");

    let mut conn = Connection {
        lease,
        session: CompletionSession::with_options(
            index,
            completion.terminator,
            completion.max_results,
        ),
    };

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        match next_frame(&mut reader, max_line_bytes, &mut buf).await? {
            Frame::Eof => break,
            Frame::TooLong => {
                warn!(session_id = conn.lease.id, max_line_bytes, "request line too long");
                let response = DaemonResponse::error(
                    String::new(),
                    ErrorCode::InvalidRequest,
                    format!("request line exceeds {max_line_bytes} bytes"),
                );
                write_response(&mut writer, &response).await?;
                break;
            }
            Frame::Line(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let response = process_line(&line, &mut conn);
                write_response(&mut writer, &response).await?;
            }
        }
    }

    info!(session_id = conn.lease.id, "session closed");
    Ok(())
}

async fn write_response<W>(writer: &mut W, response: &DaemonResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let payload = serde_json::to_string(response)?;
    writer.write_all(payload.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

fn process_line(line: &str, conn: &mut Connection) -> DaemonResponse {
    match serde_json::from_str::<DaemonRequest>(line) {
        Ok(request) => handle_request(request, conn),
        Err(error) => {
            error!(session_id = conn.lease.id, "invalid request JSON: {error}");
            DaemonResponse::error(
                String::new(),
                ErrorCode::InvalidRequest,
                format!("invalid JSON payload: {error}"),
            )
        }
    }
}

fn handle_request(request: DaemonRequest, conn: &mut Connection) -> DaemonResponse {
    let id = request.id;
    let body = match request.body {
        RequestBody::Ping => ResponseBody::Pong,
        RequestBody::Feed { ch } => ResponseBody::Completions {
            completions: conn.session.feed(ch),
        },
        RequestBody::TypeText { text } => ResponseBody::Completions {
            completions: conn.session.feed_str(&text),
        },
        RequestBody::Suggest(suggest) => {
            let limit = suggest
                .limit
                .unwrap_or(conn.session.max_results())
                .min(MAX_RESULTS_CAP);
            ResponseBody::Matches {
                matches: conn.session.lookup(&suggest.prefix, limit),
            }
        }
        RequestBody::Reset => ResponseBody::Reset {
            discarded: conn.session.reset(),
        },
        RequestBody::Stats => {
            let stats = conn.session.index_stats();
            ResponseBody::Stats(StatsResponse {
                entries: stats.entries,
                nodes: stats.nodes,
                session_id: conn.lease.id,
                buffer: conn.session.current_prefix().to_string(),
            })
        }
    };
    DaemonResponse { id, body }
}
