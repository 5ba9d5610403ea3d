//! Content-Length framing over a byte stream.
//!
//! Each message on the wire is a header block terminated by a blank line,
//! followed by exactly `Content-Length` bytes of UTF-8 JSON:
//!
//! ```text
//! Content-Length: 123\r\n
//! \r\n
//! {"jsonrpc":"2.0","id":1,"method":"initialize","params":{...}}
//! ```
//!
//! `Content-Length` is the only required header. Header names compare
//! case-insensitively, whitespace around the colon is tolerated, and header
//! lines that are not `Content-Length` (malformed or otherwise) are skipped.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Errors surfaced by the framing layer
#[derive(Debug, Error)]
pub enum FrameError {
    /// EOF at a message boundary. Callers treat this as a clean disconnect.
    #[error("end of stream")]
    EndOfStream,

    /// EOF in the middle of a header block or payload.
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    /// `Content-Length` missing, non-numeric, or non-positive.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// The message could not be serialized before writing.
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// An underlying I/O failure.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The connection was closed locally; no further writes are accepted.
    #[error("connection closed")]
    Closed,
}

/// Reads framed messages from the input half of a duplex stream.
///
/// There is a single read owner; the reader is not shared.
pub struct MessageReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    /// Read one complete message payload.
    ///
    /// Blocks until a full header block and payload have been consumed.
    /// Returns [`FrameError::EndOfStream`] only when EOF lands exactly on a
    /// message boundary.
    pub async fn read_message(&mut self) -> Result<Vec<u8>, FrameError> {
        let mut content_length: Option<usize> = None;
        let mut at_boundary = true;

        loop {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line).await?;
            if n == 0 {
                return Err(if at_boundary {
                    FrameError::EndOfStream
                } else {
                    FrameError::UnexpectedEndOfStream
                });
            }
            at_boundary = false;

            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                // Blank line terminates the header block.
                break;
            }

            // Header lines without a colon are skipped, not fatal.
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };

            if name.trim().eq_ignore_ascii_case("Content-Length") {
                let value = value.trim();
                let length: i64 = value.parse().map_err(|_| {
                    FrameError::MalformedHeader(format!("invalid Content-Length: {value:?}"))
                })?;
                if length <= 0 {
                    return Err(FrameError::MalformedHeader(format!(
                        "invalid Content-Length: {length}"
                    )));
                }
                content_length = Some(length as usize);
            }
            // Content-Type and unknown headers are ignored.
        }

        let Some(length) = content_length else {
            return Err(FrameError::MalformedHeader(
                "missing Content-Length header".to_string(),
            ));
        };

        let mut payload = vec![0u8; length];
        self.reader.read_exact(&mut payload).await.map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                FrameError::UnexpectedEndOfStream
            } else {
                FrameError::Transport(e)
            }
        })?;

        Ok(payload)
    }
}

/// Writes framed messages to the output half of a duplex stream.
pub struct MessageWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { writer: inner }
    }

    /// Frame and write one payload.
    ///
    /// Header and payload go out in a single buffered write so a frame is
    /// never interleaved with another writer's output.
    pub async fn write_message(&mut self, payload: &[u8]) -> Result<(), FrameError> {
        let header = format!("Content-Length: {}\r\n\r\n", payload.len());
        let mut frame = Vec::with_capacity(header.len() + payload.len());
        frame.extend_from_slice(header.as_bytes());
        frame.extend_from_slice(payload);

        self.writer.write_all(&frame).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Shut down the underlying writer.
    pub async fn shutdown(&mut self) -> Result<(), FrameError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
