//! `ChatTransport` writing a reply to a terminal.

use async_trait::async_trait;
use recollect_rs_protocol::{ChatTransport, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

/// Prints tokens as they arrive; the final message only adds a newline
/// unless nothing was streamed.
pub struct TerminalTransport<W = Stdout> {
    out: Mutex<W>,
    streamed: AtomicBool,
}

impl TerminalTransport<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> TerminalTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            streamed: AtomicBool::new(false),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write(&self, text: &str) -> Result<(), TransportError> {
        let mut out = self.out.lock().await;
        out.write_all(text.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<W> ChatTransport for TerminalTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn stream_token(&self, delta: &str) -> Result<(), TransportError> {
        self.streamed.store(true, Ordering::Relaxed);
        self.write(delta).await
    }

    async fn send_final(&self, content: &str) -> Result<(), TransportError> {
        if self.streamed.swap(false, Ordering::Relaxed) {
            self.write("\n").await
        } else {
            self.write(&format!("{content}\n")).await
        }
    }
}
