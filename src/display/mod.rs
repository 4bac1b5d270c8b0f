pub mod fifo;
pub mod pipe;

use async_trait::async_trait;

use crate::config::{DisplayConfig, DisplayMode};
use crate::error::SinkError;

pub use fifo::FifoSink;
pub use pipe::{PipeSink, WobProcess};

#[async_trait]
pub trait DisplaySink: Send {
    async fn show(&mut self, percent: u8) -> Result<(), SinkError>;

    /// Releases the channel. Further `show` calls fail.
    async fn close(&mut self);
}

#[async_trait]
impl DisplaySink for Box<dyn DisplaySink> {
    async fn show(&mut self, percent: u8) -> Result<(), SinkError> {
        (**self).show(percent).await
    }

    async fn close(&mut self) {
        (**self).close().await
    }
}

/// Wire format: the decimal value and a newline.
pub fn encode(percent: u8) -> String {
    format!("{}\n", percent)
}

pub fn open(config: &DisplayConfig) -> Result<Box<dyn DisplaySink>, SinkError> {
    match config.mode {
        DisplayMode::Wob => {
            let wob = WobProcess::spawn(&config.command)?;
            Ok(Box::new(wob))
        }
        DisplayMode::Fifo => {
            let path = config.fifo_path().ok_or(SinkError::NoFifoPath)?;
            tracing::info!("Writing volume updates to {}", path.display());
            Ok(Box::new(FifoSink::new(path)))
        }
    }
}
