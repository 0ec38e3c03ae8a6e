//! Timing hooks around operator execution.
//!
//! The network brackets every operator with [`Profiler::begin`] and
//! [`Profiler::end`] through a [`ProfileSpan`], so the pair stays balanced
//! even when the kernel fails. [`ProfileLog`] records nested entries and
//! renders them as CSV, newest first.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

pub const CSV_HEADER: &str = "layer_num,label,invocation,start_time,end_time,elapsed_time";

pub trait Profiler {
    fn begin(&self, label: &str, layer: usize);
    fn end(&self);
}

/// Discards every event.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopProfiler;

impl Profiler for NoopProfiler {
    #[inline]
    fn begin(&self, _label: &str, _layer: usize) {}
    #[inline]
    fn end(&self) {}
}

/// Calls `begin` on creation and `end` on drop.
pub struct ProfileSpan<'a> {
    profiler: &'a dyn Profiler,
}

impl<'a> ProfileSpan<'a> {
    pub fn new(profiler: &'a dyn Profiler, label: &str, layer: usize) -> Self {
        profiler.begin(label, layer);
        ProfileSpan { profiler }
    }
}

impl Drop for ProfileSpan<'_> {
    fn drop(&mut self) {
        self.profiler.end();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProfileEntry {
    pub label: String,
    pub layer: usize,
    /// Zero-based count of earlier entries with the same label and layer.
    pub invocation: usize,
    /// Offsets from the creation of the log.
    pub start: Duration,
    pub end: Option<Duration>,
}

impl ProfileEntry {
    pub fn elapsed(&self) -> Option<Duration> {
        self.end.map(|end| end.saturating_sub(self.start))
    }
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<ProfileEntry>,
    /// Indices into `entries` of the currently open entries, innermost last.
    open: Vec<usize>,
    invocations: HashMap<(String, usize), usize>,
}

/// In-memory profiling log.
///
/// Entries may nest; [`Profiler::end`] closes the most recently opened entry.
/// An `end` with no open entry is a bracketing bug and panics.
#[derive(Debug)]
pub struct ProfileLog {
    epoch: Instant,
    state: RefCell<LogState>,
}

impl ProfileLog {
    pub fn new() -> Self {
        ProfileLog {
            epoch: Instant::now(),
            state: RefCell::new(LogState::default()),
        }
    }

    /// Snapshot of all entries, newest first.
    pub fn entries(&self) -> Vec<ProfileEntry> {
        self.state.borrow().entries.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries still waiting for their `end`.
    pub fn open_entries(&self) -> usize {
        self.state.borrow().open.len()
    }

    /// Writes the log as CSV, newest entry first. Times are in microseconds.
    pub fn write_csv<W: io::Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{CSV_HEADER}")?;
        for entry in self.state.borrow().entries.iter().rev() {
            let micros = |d: Duration| d.as_micros().to_string();
            writeln!(
                out,
                "{},{},{},{},{},{}",
                entry.layer,
                entry.label,
                entry.invocation,
                micros(entry.start),
                entry.end.map(micros).unwrap_or_default(),
                entry.elapsed().map(micros).unwrap_or_default(),
            )?;
        }
        Ok(())
    }
}

impl Default for ProfileLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Profiler for ProfileLog {
    fn begin(&self, label: &str, layer: usize) {
        let start = self.epoch.elapsed();
        let mut state = self.state.borrow_mut();
        let counter = state.invocations.entry((label.to_owned(), layer)).or_insert(0);
        let invocation = *counter;
        *counter += 1;
        let index = state.entries.len();
        state.entries.push(ProfileEntry {
            label: label.to_owned(),
            layer,
            invocation,
            start,
            end: None,
        });
        state.open.push(index);
    }

    fn end(&self) {
        let end = self.epoch.elapsed();
        let mut state = self.state.borrow_mut();
        let Some(index) = state.open.pop() else {
            panic!("Profiling end() called with no open entry");
        };
        state.entries[index].end = Some(end);
    }
}
