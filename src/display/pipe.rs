use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};

use crate::error::SinkError;

use super::{encode, DisplaySink};

pub struct PipeSink<W> {
    writer: Option<W>,
}

impl<W: AsyncWrite + Unpin + Send> PipeSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: Some(writer) }
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> DisplaySink for PipeSink<W> {
    async fn show(&mut self, percent: u8) -> Result<(), SinkError> {
        let writer = self.writer.as_mut().ok_or(SinkError::Closed)?;
        writer.write_all(encode(percent).as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.shutdown().await {
                tracing::debug!("Closing display pipe: {}", e);
            }
        }
    }
}

/// A `wob` child fed through its stdin.
pub struct WobProcess {
    child: Child,
    pipe: PipeSink<ChildStdin>,
}

impl WobProcess {
    pub fn spawn(command: &[String]) -> Result<Self, SinkError> {
        let (program, args) = command.split_first().ok_or(SinkError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SinkError::Launch { command: command.join(" "), source })?;
        let stdin = child.stdin.take().ok_or(SinkError::Closed)?;
        tracing::info!("Launched {} (pid {:?})", program, child.id());

        Ok(Self { child, pipe: PipeSink::new(stdin) })
    }
}

#[async_trait]
impl DisplaySink for WobProcess {
    async fn show(&mut self, percent: u8) -> Result<(), SinkError> {
        self.pipe.show(percent).await
    }

    async fn close(&mut self) {
        self.pipe.close().await;
        if let Err(e) = self.child.start_kill() {
            tracing::debug!("Display process already exited: {}", e);
        }
        match self.child.try_wait() {
            Ok(Some(status)) => tracing::debug!("Display process exited: {}", status),
            Ok(None) => tracing::debug!("Display process still running after kill"),
            Err(e) => tracing::warn!("Failed to reap display process: {}", e),
        }
    }
}
