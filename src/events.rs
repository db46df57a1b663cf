//! State-change event log.
//!
//! One row per visible state change: simulated time, cell, and the state in
//! its `<code>` form.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::grid::CellId;
use crate::state::CellState;

pub const CSV_HEADER: &str = "time;cell;state";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub time: f64,
    pub cell: CellId,
    pub state: CellState,
}

pub trait EventSink {
    fn record(&mut self, time: f64, cell: CellId, state: &CellState) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, time: f64, cell: CellId, state: &CellState) -> io::Result<()> {
        (**self).record(time, cell, state)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// `;`-delimited log writer.
pub struct CsvLogger<W: Write> {
    out: W,
    rows: u64,
}

impl<W: Write> CsvLogger<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{CSV_HEADER}")?;
        Ok(Self { out, rows: 0 })
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl CsvLogger<BufWriter<File>> {
    /// Creates the file (and its parent directories).
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Self::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> EventSink for CsvLogger<W> {
    fn record(&mut self, time: f64, cell: CellId, state: &CellState) -> io::Result<()> {
        writeln!(self.out, "{time};{cell};{state}")?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<Event>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn at(&self, time: f64) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |event| event.time == time)
    }
}

impl EventSink for MemorySink {
    fn record(&mut self, time: f64, cell: CellId, state: &CellState) -> io::Result<()> {
        self.events.push(Event {
            time,
            cell,
            state: *state,
        });
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _time: f64, _cell: CellId, _state: &CellState) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Terrain;

    #[test]
    fn csv_rows_use_symbolic_state() {
        let mut logger = CsvLogger::new(Vec::new()).unwrap();
        logger
            .record(0.0, CellId::new(1, 2), &CellState::new(Terrain::Land))
            .unwrap();
        logger
            .record(1.5, CellId::new(0, 0), &CellState::new(Terrain::Desert))
            .unwrap();
        assert_eq!(logger.rows(), 2);
        let text = String::from_utf8(logger.into_inner()).unwrap();
        assert_eq!(text, "time;cell;state\n0;(1,2);<1>\n1.5;(0,0);<3>\n");
    }

    #[test]
    fn csv_create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("log.csv");
        let mut logger = CsvLogger::create(&path).unwrap();
        logger
            .record(2.0, CellId::new(3, 3), &CellState::new(Terrain::Forest))
            .unwrap();
        logger.flush().unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("2;(3,3);<2>\n"));
    }

    #[test]
    fn memory_sink_filters_by_time() {
        let mut sink = MemorySink::new();
        sink.record(0.0, CellId::new(0, 0), &CellState::new(Terrain::Water))
            .unwrap();
        sink.record(1.0, CellId::new(1, 0), &CellState::new(Terrain::Land))
            .unwrap();
        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.at(1.0).count(), 1);
    }
}
