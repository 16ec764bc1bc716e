//! calowin-io: Event input and cluster output for calowin.
//!
//! Events are read from JSON Lines or CSV files into
//! [`CellBatch`](calowin_core::CellBatch)es, clusters are written back as
//! CSV or JSON Lines, and clustering settings are stored as JSON.
//!

mod error;
mod format;
mod reader;
mod settings;
mod writer;

pub use error::{Error, Result};
pub use format::Format;
pub use reader::{read_events, Event, EventReader};
pub use settings::{load_settings, save_settings};
pub use writer::ClusterWriter;
