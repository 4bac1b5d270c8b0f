use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::unix::pipe;

use crate::error::SinkError;

use super::{encode, DisplaySink};

pub const FIFO_NAME: &str = "wob.sock";

/// `$XDG_RUNTIME_DIR/wob.sock`, if the runtime directory is known.
pub fn default_fifo_path() -> Option<PathBuf> {
    let dirs = directories::BaseDirs::new()?;
    dirs.runtime_dir().map(|dir| dir.join(FIFO_NAME))
}

/// Opens a named pipe for every update and closes it again, so a wob
/// started later still picks up the next value. The open never blocks: with
/// no reader it fails and the update is dropped.
pub struct FifoSink {
    path: PathBuf,
    closed: bool,
}

impl FifoSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path, closed: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DisplaySink for FifoSink {
    async fn show(&mut self, percent: u8) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed);
        }
        let mut sender = pipe::OpenOptions::new().open_sender(&self.path)?;
        sender.write_all(encode(percent).as_bytes()).await?;
        Ok(())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}
