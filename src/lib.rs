pub mod config;
pub mod curves;
pub mod display;
pub mod error;
pub mod monitor;
pub mod pipewire;
pub mod session;
pub mod volume;

pub use config::{Config, DisplayConfig, DisplayMode, MonitorConfig, SessionConfig};
pub use curves::{Curve, CurveConfig, CubicCurve, LinearCurve};
pub use display::{DisplaySink, FifoSink, PipeSink, WobProcess};
pub use error::{ConnectionError, Error, LoadError, SinkError};
pub use monitor::{State, SyncLoop};
pub use pipewire::{Connection, Graph};
pub use session::{DeviceId, Node, SessionEvent, SessionSource, Signal};
pub use volume::VolumeReading;
