use std::collections::{HashSet, VecDeque};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::process::{Child, Command};

use crate::config::SessionConfig;
use crate::error::{ConnectionError, LoadError};
use crate::session::{SessionEvent, SessionSource, Signal, DEFAULT_NODES_API, MIXER_API};

use super::dump::{parse_batch, DumpReader};
use super::graph::Graph;

pub struct Connection {
    child: Option<Child>,
    reader: DumpReader<Box<dyn AsyncBufRead + Send + Unpin>>,
    graph: Graph,
    queue: VecDeque<SessionEvent>,
    requested: Vec<String>,
    subscriptions: HashSet<Signal>,
    closed: bool,
}

impl Connection {
    /// Fails when no PipeWire daemon is reachable: `pw-dump` then exits
    /// before dumping anything.
    pub async fn connect(config: &SessionConfig) -> Result<Self, ConnectionError> {
        let (program, args) = config.command.split_first().ok_or(ConnectionError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ConnectionError::Spawn { command: config.command.join(" "), source })?;
        let stdout = child.stdout.take().ok_or(ConnectionError::Closed)?;
        tracing::debug!("Spawned {} (pid {:?})", program, child.id());

        let mut connection = Self::from_reader(BufReader::new(stdout)).await?;
        connection.child = Some(child);
        Ok(connection)
    }

    pub async fn from_reader<R>(reader: R) -> Result<Self, ConnectionError>
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        let mut reader = DumpReader::new(Box::new(reader) as Box<dyn AsyncBufRead + Send + Unpin>);
        let initial = reader.next_batch().await?.ok_or(ConnectionError::Closed)?;

        let mut graph = Graph::new();
        graph.apply(parse_batch(&initial)?);
        tracing::info!("Connected to PipeWire, {} nodes", graph.registry().count());

        Ok(Self {
            child: None,
            reader,
            graph,
            queue: VecDeque::from([SessionEvent::Installed]),
            requested: Vec::new(),
            subscriptions: HashSet::new(),
            closed: false,
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    fn resolve_plugins(&mut self) {
        for name in std::mem::take(&mut self.requested) {
            let result = match name.as_str() {
                DEFAULT_NODES_API if self.graph.has_default_metadata() => Ok(()),
                DEFAULT_NODES_API => Err(LoadError::Unavailable {
                    name: name.clone(),
                    reason: "no default metadata in the graph, is a session manager running?".to_string(),
                }),
                MIXER_API => Ok(()),
                _ => Err(LoadError::UnknownPlugin(name.clone())),
            };
            self.queue.push_back(SessionEvent::PluginLoaded { name, result });
        }
    }

    /// Reads the next batch. After the initial dump a broken stream is the
    /// same as a closed one: the session ends with `Disconnected`.
    async fn read_batch(&mut self) {
        let text = match self.reader.next_batch().await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::info!("PipeWire monitor stream closed");
                self.disconnect();
                return;
            }
            Err(e) => {
                tracing::warn!("Reading PipeWire monitor stream failed: {}", e);
                self.disconnect();
                return;
            }
        };

        match parse_batch(&text) {
            Ok(objects) => {
                for event in self.graph.apply(objects) {
                    let subscribed = event.signal().map_or(true, |s| self.subscriptions.contains(&s));
                    if subscribed {
                        self.queue.push_back(event);
                    }
                }
            }
            Err(e) => tracing::warn!("Skipping malformed dump batch: {}", e),
        }
    }

    fn disconnect(&mut self) {
        self.closed = true;
        self.queue.push_back(SessionEvent::Disconnected);
    }
}

#[async_trait]
impl SessionSource for Connection {
    type View = Graph;

    fn load_plugin(&mut self, name: &str) {
        tracing::debug!("Loading plugin {}", name);
        self.requested.push(name.to_string());
    }

    fn subscribe(&mut self, signal: Signal) {
        self.subscriptions.insert(signal);
    }

    async fn next_event(&mut self) -> Result<SessionEvent, ConnectionError> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Ok(event);
            }
            if !self.requested.is_empty() {
                self.resolve_plugins();
                continue;
            }
            if self.closed {
                return Ok(SessionEvent::Disconnected);
            }
            self.read_batch().await;
        }
    }

    fn view(&self) -> &Graph {
        &self.graph
    }

    async fn close(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                tracing::debug!("Graph monitor already gone: {}", e);
            }
        }
    }
}
