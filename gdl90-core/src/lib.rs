//! gdl90-core: GDL-90 encoder and export cycle.
//!
//! No async and no sockets: message packing, CRC, framing, and the export
//! filter. The transport is a trait the caller implements. Used by
//! `gdl90-feeder` for UDP broadcast.

pub mod coord;
pub mod crc;
pub mod export;
pub mod framing;
pub mod geo;
pub mod message;
pub mod table;
pub mod types;

// Re-export commonly used types at crate root
pub use export::{ExportConfig, ExportReport, Exporter, Transport};
pub use framing::{assemble_frame, frame, ByteStuffer};
pub use message::{Heartbeat, TrafficReport};
pub use table::TrafficTable;
pub use types::*;
