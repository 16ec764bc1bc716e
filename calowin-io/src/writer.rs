//! Cluster writers.

use crate::{Format, Result};
use calowin_core::Cluster;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const CSV_HEADER: &str = "event,energy,eta,phi,x,y,z,n_cells,cells";

#[derive(Serialize)]
struct EventClusters<'a> {
    event: u64,
    clusters: &'a [Cluster],
}

/// Writer for clustering output.
///
/// CSV output has one row per cluster, member cells `;`-joined. JSON Lines
/// output has one line per event, including events without clusters.
pub struct ClusterWriter<W: Write> {
    writer: W,
    format: Format,
    events: usize,
    clusters: usize,
}

impl ClusterWriter<BufWriter<File>> {
    /// Creates an output file, inferring the format from its extension.
    ///
    /// # Errors
    /// Returns an error if the extension is unknown or the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = Format::from_path(&path)?;
        Self::create_with_format(path, format)
    }

    /// Creates an output file in the given format.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create_with_format<P: AsRef<Path>>(path: P, format: Format) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file), format)
    }
}

impl<W: Write> ClusterWriter<W> {
    /// Wraps any writer; CSV output gets its header immediately.
    ///
    /// # Errors
    /// Returns an error if the header cannot be written.
    pub fn new(mut writer: W, format: Format) -> Result<Self> {
        if format == Format::Csv {
            writeln!(writer, "{CSV_HEADER}")?;
        }
        Ok(Self {
            writer,
            format,
            events: 0,
            clusters: 0,
        })
    }

    /// Writes the clusters of one event.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_event(&mut self, event: u64, clusters: &[Cluster]) -> Result<()> {
        match self.format {
            Format::Csv => {
                for c in clusters {
                    let cells: Vec<String> = c.cells.iter().map(ToString::to_string).collect();
                    writeln!(
                        self.writer,
                        "{},{},{},{},{},{},{},{},{}",
                        event,
                        c.energy,
                        c.eta,
                        c.phi,
                        c.position.x,
                        c.position.y,
                        c.position.z,
                        c.len(),
                        cells.join(";")
                    )?;
                }
            }
            Format::JsonLines => {
                serde_json::to_writer(&mut self.writer, &EventClusters { event, clusters })?;
                writeln!(self.writer)?;
            }
        }
        self.events += 1;
        self.clusters += clusters.len();
        Ok(())
    }

    /// Number of events written.
    #[must_use]
    pub fn events_written(&self) -> usize {
        self.events
    }

    /// Number of clusters written.
    #[must_use]
    pub fn clusters_written(&self) -> usize {
        self.clusters
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.writer)
    }
}
