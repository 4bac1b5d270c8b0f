pub mod connection;
pub mod dump;
pub mod graph;

pub use connection::Connection;
pub use dump::{DumpObject, DumpReader};
pub use graph::Graph;
