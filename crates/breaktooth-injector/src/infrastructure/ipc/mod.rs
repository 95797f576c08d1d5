//! IPC client toward the emulator's `SendKeys` endpoint.
//!
//! Each key state is written as one framed [`IpcRequest::SendKeys`]; the
//! emulator sends nothing back.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use breaktooth_core::protocol::{encode_frame, IpcRequest, ProtocolError, SendKeysMessage};
use breaktooth_core::report::KeyState;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{info, trace};

use crate::application::capture_keys::KeySink;

#[derive(Debug, Error)]
pub enum IpcClientError {
    #[error("cannot reach emulator at {path}: {source}")]
    Connect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IPC write failed: {0}")]
    Io(#[from] io::Error),

    #[error("IPC encoding failed: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Writes framed requests to any async writer; a Unix stream in production.
pub struct IpcClient<W = UnixStream> {
    writer: W,
}

impl IpcClient<UnixStream> {
    /// Connects to the emulator's socket.
    ///
    /// # Errors
    ///
    /// Returns [`IpcClientError::Connect`] when the emulator is not listening.
    pub async fn connect(path: &Path) -> Result<Self, IpcClientError> {
        let stream = UnixStream::connect(path)
            .await
            .map_err(|source| IpcClientError::Connect {
                path: path.to_path_buf(),
                source,
            })?;
        info!("connected to emulator at {}", path.display());
        Ok(Self::from_writer(stream))
    }
}

impl<W: AsyncWrite + Unpin + Send> IpcClient<W> {
    pub fn from_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Sends one key state.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the socket write fails.
    pub async fn send_state(&mut self, state: &KeyState) -> Result<(), IpcClientError> {
        let request = IpcRequest::SendKeys(SendKeysMessage::from_state(state));
        let frame = encode_frame(&request)?;
        trace!(len = frame.len(), "writing SendKeys frame");
        self.writer.write_all(&frame).await?;
        Ok(())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> KeySink for IpcClient<W> {
    type Error = IpcClientError;

    async fn send_keys(&mut self, modifiers: u8, keys: &[u8]) -> Result<(), IpcClientError> {
        self.send_state(&KeyState::from_parts(modifiers, keys)).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use breaktooth_core::protocol::decode_frame;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_send_keys_writes_one_frame() {
        // Arrange
        let state = KeyState::from_parts(0x02, &[0x04]);
        let expected = encode_frame(&IpcRequest::SendKeys(SendKeysMessage::from_state(&state)))
            .unwrap();
        let writer = tokio_test::io::Builder::new().write(&expected).build();
        let mut client = IpcClient::from_writer(writer);

        // Act
        let result = client.send_keys(0x02, &[0x04, 0, 0, 0, 0, 0]).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_write_failure_surfaces_as_io_error() {
        let writer = tokio_test::io::Builder::new()
            .write_error(io::Error::from(io::ErrorKind::BrokenPipe))
            .build();
        let mut client = IpcClient::from_writer(writer);

        let err = client.send_keys(0, &[0; 6]).await.unwrap_err();

        assert!(matches!(err, IpcClientError::Io(_)));
    }

    #[tokio::test]
    async fn test_connect_to_missing_socket_fails() {
        let err = IpcClient::connect(Path::new("/nonexistent/breaktooth-test.sock"))
            .await
            .err()
            .unwrap();

        assert!(matches!(err, IpcClientError::Connect { .. }));
    }

    #[tokio::test]
    async fn test_frames_over_unix_stream_decode_in_order() {
        let (near, mut far) = UnixStream::pair().unwrap();
        let mut client = IpcClient::from_writer(near);

        client.send_keys(0x01, &[0x04]).await.unwrap();
        client.send_keys(0x00, &[]).await.unwrap();
        drop(client);

        let mut bytes = Vec::new();
        far.read_to_end(&mut bytes).await.unwrap();
        let (first, used) = decode_frame(&bytes).unwrap();
        let (second, _) = decode_frame(&bytes[used..]).unwrap();
        assert_eq!(
            first,
            IpcRequest::SendKeys(SendKeysMessage::from_state(&KeyState::from_parts(1, &[4])))
        );
        assert_eq!(
            second,
            IpcRequest::SendKeys(SendKeysMessage::from_state(&KeyState::new()))
        );
    }
}
