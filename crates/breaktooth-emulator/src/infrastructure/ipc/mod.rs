//! IPC endpoint of the emulation service.
//!
//! A Unix domain stream socket at a well-known path. Every accepted
//! connection gets a reader task that decodes frames (see
//! [`breaktooth_core::protocol`]) and forwards each [`IpcRequest`] on one
//! shared `mpsc` channel. The receiving end belongs to the dispatch loop in
//! `main`, which applies requests to the service in arrival order.
//!
//! Requests are fire-and-forget; nothing is ever written back.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use breaktooth_core::protocol::{
    decode_frame, messages::HEADER_SIZE, payload_len, IpcRequest, ProtocolError,
};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How long one `accept` may block before the `running` flag is re-checked.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Errors raised by the IPC server.
#[derive(Debug, Error)]
pub enum IpcServerError {
    #[error("cannot bind IPC socket at {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IPC connection I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream lost frame sync; the connection is dropped.
    #[error("IPC framing error: {0}")]
    Framing(#[from] ProtocolError),
}

/// Listening endpoint. The socket file is removed when the server is dropped.
pub struct IpcServer {
    listener: UnixListener,
    path: PathBuf,
}

impl IpcServer {
    /// Binds the endpoint at `path`, creating the parent directory and
    /// replacing a stale socket file left by an earlier run.
    ///
    /// # Errors
    ///
    /// Returns [`IpcServerError::Bind`] if the socket cannot be created.
    pub fn bind(path: &Path) -> Result<Self, IpcServerError> {
        let bind_err = |source| IpcServerError::Bind {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(bind_err)?;
        }
        match std::fs::remove_file(path) {
            Ok(()) => debug!("removed stale socket {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(bind_err(e)),
        }

        let listener = UnixListener::bind(path).map_err(bind_err)?;
        info!("IPC endpoint listening on {}", path.display());
        Ok(Self {
            listener,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accepts connections until `running` is cleared or `tx` is closed.
    pub async fn run(self, tx: mpsc::Sender<IpcRequest>, running: Arc<AtomicBool>) {
        while running.load(Ordering::Relaxed) && !tx.is_closed() {
            let stream = match timeout(ACCEPT_POLL, self.listener.accept()).await {
                Ok(Ok((stream, _))) => stream,
                Ok(Err(e)) => {
                    warn!("IPC accept failed: {e}");
                    continue;
                }
                Err(_) => continue,
            };

            debug!("IPC client connected");
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut stream = stream;
                match read_requests(&mut stream, &tx).await {
                    Ok(n) => debug!(requests = n, "IPC client disconnected"),
                    Err(e) => warn!("IPC client dropped: {e}"),
                }
            });
        }
        info!("IPC endpoint stopped");
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Decodes frames from `reader` and forwards them on `tx` until EOF.
///
/// A frame whose header is valid but whose payload is malformed is skipped;
/// the stream stays in sync because the header carries the length.
///
/// Returns the number of requests forwarded.
///
/// # Errors
///
/// Returns [`IpcServerError::Framing`] for an unusable header and
/// [`IpcServerError::Io`] for read errors other than a clean EOF.
pub async fn read_requests<R>(
    reader: &mut R,
    tx: &mpsc::Sender<IpcRequest>,
) -> Result<u64, IpcServerError>
where
    R: AsyncRead + Unpin,
{
    let mut forwarded = 0u64;
    loop {
        let mut frame = vec![0u8; HEADER_SIZE];
        match reader.read_exact(&mut frame).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(forwarded),
            Err(e) => return Err(e.into()),
        }

        let len = payload_len(&frame)?;
        frame.resize(HEADER_SIZE + len, 0);
        reader.read_exact(&mut frame[HEADER_SIZE..]).await?;

        match decode_frame(&frame) {
            Ok((req, _)) => {
                if tx.send(req).await.is_err() {
                    return Ok(forwarded);
                }
                forwarded += 1;
            }
            Err(e) => warn!("skipping malformed IPC frame: {e}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
