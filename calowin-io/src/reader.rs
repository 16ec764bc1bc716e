//! Event readers.
//!
//! Events come either as JSON Lines, one event per line:
//!
//! ```text
//! {"event": 7, "cells": [{"id": 1, "eta": 0.1, "phi": -2.0, "energy": 4.5}]}
//! ```
//!
//! or as CSV with a mandatory `event,cell_id,eta,phi,energy` header and the
//! rows of each event kept together.

use crate::{Error, Format, Result};
use calowin_core::{CellBatch, CellData};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

const CSV_HEADER: [&str; 5] = ["event", "cell_id", "eta", "phi", "energy"];

/// The cells of one event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    /// Event number as found in the input.
    pub number: u64,
    /// Cells of the event, in input order.
    pub cells: CellBatch,
}

#[derive(Deserialize)]
struct EventRecord {
    event: u64,
    #[serde(default)]
    cells: Vec<CellData>,
}

/// One CSV row, fields in header order.
#[derive(Deserialize)]
struct CsvRecord {
    event: u64,
    cell_id: u64,
    eta: f64,
    phi: f64,
    energy: f64,
}

struct CsvRow {
    line: usize,
    event: u64,
    cell: CellData,
}

struct JsonLinesSource<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> JsonLinesSource<R> {
    fn next_event(&mut self) -> Result<Option<Event>> {
        for text in self.lines.by_ref() {
            let text = text?;
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }
            let record: EventRecord =
                serde_json::from_str(&text).map_err(|e| Error::parse(self.line, e.to_string()))?;
            return Ok(Some(Event {
                number: record.event,
                cells: record.cells.into_iter().collect(),
            }));
        }
        Ok(None)
    }
}

struct CsvSource<R> {
    reader: csv::Reader<R>,
    record: StringRecord,
    header_checked: bool,
    pending: Option<CsvRow>,
    seen: HashSet<u64>,
}

impl<R: std::io::Read> CsvSource<R> {
    fn new(reader: R) -> Self {
        Self {
            reader: ReaderBuilder::new()
                .has_headers(true)
                .trim(Trim::All)
                .from_reader(reader),
            record: StringRecord::new(),
            header_checked: false,
            pending: None,
            seen: HashSet::new(),
        }
    }

    /// Returns false for input without any header.
    fn check_header(&mut self) -> Result<bool> {
        self.header_checked = true;
        let header = self.reader.headers().map_err(csv_error)?;
        if header.is_empty() {
            return Ok(false);
        }
        let matches = header.len() == CSV_HEADER.len()
            && header
                .iter()
                .zip(CSV_HEADER)
                .all(|(found, expected)| found.eq_ignore_ascii_case(expected));
        if !matches {
            let line = header.position().map_or(1, |p| to_line(p.line()));
            let found: Vec<&str> = header.iter().collect();
            return Err(Error::parse(
                line,
                format!(
                    "expected header '{}', found '{}'",
                    CSV_HEADER.join(","),
                    found.join(",")
                ),
            ));
        }
        Ok(true)
    }

    fn next_row(&mut self) -> Result<Option<CsvRow>> {
        if !self.reader.read_record(&mut self.record).map_err(csv_error)? {
            return Ok(None);
        }
        let line = self.record.position().map_or(0, |p| to_line(p.line()));
        let row: CsvRecord = self.record.deserialize(None).map_err(|e| {
            let field = match e.kind() {
                csv::ErrorKind::Deserialize { err, .. } => err.field(),
                _ => None,
            };
            let named = field
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| Some((*CSV_HEADER.get(i)?, self.record.get(i)?)));
            match named {
                Some((name, value)) => Error::parse(line, format!("invalid {name} '{value}'")),
                None => Error::parse(line, e.to_string()),
            }
        })?;
        Ok(Some(CsvRow {
            line,
            event: row.event,
            cell: CellData::new(row.cell_id, row.eta, row.phi, row.energy),
        }))
    }

    fn next_event(&mut self) -> Result<Option<Event>> {
        if !self.header_checked && !self.check_header()? {
            return Ok(None);
        }
        let first = match self.pending.take() {
            Some(row) => row,
            None => match self.next_row()? {
                Some(row) => row,
                None => return Ok(None),
            },
        };
        if !self.seen.insert(first.event) {
            return Err(Error::parse(
                first.line,
                format!("rows of event {} are not contiguous", first.event),
            ));
        }

        let mut cells = CellBatch::default();
        cells.push_cell(&first.cell);
        while let Some(row) = self.next_row()? {
            if row.event != first.event {
                self.pending = Some(row);
                break;
            }
            cells.push_cell(&row.cell);
        }
        Ok(Some(Event {
            number: first.event,
            cells,
        }))
    }
}

fn to_line(line: u64) -> usize {
    usize::try_from(line).unwrap_or(usize::MAX)
}

/// Malformed input becomes a parse error on its line; anything without a
/// position (I/O) is kept as is.
fn csv_error(err: csv::Error) -> Error {
    let Some(line) = err.position().map(|p| to_line(p.line())) else {
        return Error::Csv(err);
    };
    let message = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {expected_len} fields, found {len}"),
        _ => err.to_string(),
    };
    Error::parse(line, message)
}

enum Source<R> {
    JsonLines(JsonLinesSource<R>),
    Csv(CsvSource<R>),
}

/// Streaming reader yielding one [`Event`] at a time.
///
/// Stops after the first error.
pub struct EventReader<R> {
    source: Source<R>,
    done: bool,
}

impl EventReader<BufReader<File>> {
    /// Opens an event file, inferring the format from its extension.
    ///
    /// # Errors
    /// Returns an error if the extension is unknown or the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let format = Format::from_path(&path)?;
        Self::open_with_format(path, format)
    }

    /// Opens an event file in the given format.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn open_with_format<P: AsRef<Path>>(path: P, format: Format) -> Result<Self> {
        let file = File::open(&path)?;
        log::debug!("reading {:?} events from {}", format, path.as_ref().display());
        Ok(Self::new(BufReader::new(file), format))
    }
}

impl<R: BufRead> EventReader<R> {
    /// Wraps any buffered reader.
    pub fn new(reader: R, format: Format) -> Self {
        let source = match format {
            Format::JsonLines => Source::JsonLines(JsonLinesSource {
                lines: reader.lines(),
                line: 0,
            }),
            Format::Csv => Source::Csv(CsvSource::new(reader)),
        };
        Self {
            source,
            done: false,
        }
    }

    /// Format being read.
    #[must_use]
    pub fn format(&self) -> Format {
        match self.source {
            Source::JsonLines(_) => Format::JsonLines,
            Source::Csv(_) => Format::Csv,
        }
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = match &mut self.source {
            Source::JsonLines(source) => source.next_event(),
            Source::Csv(source) => source.next_event(),
        };
        match next {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads every event of a file, inferring the format from its extension.
///
/// # Errors
/// Returns the first I/O or parse error encountered.
pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<Event>> {
    EventReader::open(path)?.collect()
}
