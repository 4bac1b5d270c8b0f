#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Failed to spawn graph monitor {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Graph monitor command is empty")]
    EmptyCommand,
    #[error("Could not connect to PipeWire: monitor exited before the initial dump")]
    Closed,
    #[error("Failed to read graph monitor output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed graph dump: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Unknown plugin: {0}")]
    UnknownPlugin(String),
    #[error("Plugin {name} unavailable: {reason}")]
    Unavailable { name: String, reason: String },
    #[error("Session ended while plugins were loading")]
    Interrupted,
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to launch {command:?}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Display command is empty")]
    EmptyCommand,
    #[error("No FIFO path configured and XDG_RUNTIME_DIR is unset")]
    NoFifoPath,
    #[error("Display sink is closed")]
    Closed,
    #[error("Failed to write to display sink: {0}")]
    Write(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("Plugin load: {0}")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Connection(_) => 2,
            _ => 1,
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}
