//! Per-instruction trace-line emission
//!
//! A [`Tracer`] turns one machine step into one tab-separated line:
//!
//! ```text
//! tick \t depth \t byteOffset \t opcode \t operand \t sp [\t key=value ...]
//! ```
//!
//! The tick comes from the tracer's own atomic counter, so ticks are strictly
//! increasing and duplicate-free even when strands emit concurrently; lines
//! from different strands are disambiguated by tick alone. This field order is
//! the de-facto log protocol and must stay stable for downstream parsers.
//!
//! Output goes through an injected [`TraceSink`], so hosts (and tests) decide
//! where lines land without touching process-wide streams. A lazily built
//! process-wide tracer, configured from the `OPTRACE` environment variable,
//! backs the free [`emit`] function for hosts that want zero setup.

use crate::config::TraceConfig;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};

/// Total trace records handed to any sink (process-wide, for diagnostics)
pub static TOTAL_RECORDS: AtomicU64 = AtomicU64::new(0);

/// Total sink write failures (process-wide, for diagnostics)
pub static TOTAL_WRITE_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Anything that accepts one line of text.
///
/// Implementations append the line terminator themselves and must be safe to
/// call from multiple strands; the provided sinks serialize writes internally.
pub trait TraceSink: Send + Sync {
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// Writes lines to stdout, locking per line so concurrent emitters never
/// interleave mid-line.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl TraceSink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")
    }
}

/// Writes lines to stderr, keeping trace output out of program output.
#[derive(Debug, Default)]
pub struct StderrSink;

impl TraceSink for StderrSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = io::stderr().lock();
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")
    }
}

/// Appends lines to a file, one write per line.
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Open (or create) the file at `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl TraceSink for FileSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")
    }
}

/// Captures lines in memory. Used by tests and by embedding hosts that ship
/// trace output somewhere this crate does not know about.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every line written so far, in write order.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl TraceSink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
        Ok(())
    }
}

/// Discards every line. Ticks still advance, so a host can flip tracing on
/// and off between runs without perturbing tick arithmetic.
#[derive(Debug, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn write_line(&self, _line: &str) -> io::Result<()> {
        Ok(())
    }
}

/// The trace-line emitter: a sink plus the tick counter.
///
/// One tracer per traced engine is the normal arrangement; the counter's
/// lifetime is the tracer's, so tests get deterministic ticks by constructing
/// a fresh tracer instead of resetting hidden state.
pub struct Tracer {
    sink: Box<dyn TraceSink>,
    tick: AtomicU64,
}

impl Tracer {
    /// Build a tracer over the given sink, with the tick counter at zero.
    pub fn new(sink: impl TraceSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            tick: AtomicU64::new(0),
        }
    }

    /// Tick of the most recent record, 0 if nothing was emitted yet.
    pub fn current_tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }

    /// Emit one trace record for the instruction being executed.
    ///
    /// - `depth`: call depth of the engine at this step
    /// - `pc_pos`: program counter in doubled units (e.g. hex-digit index);
    ///   the line carries `pc_pos >> 1`, the byte offset
    /// - `opcode`: instruction mnemonic, written as given
    /// - `operand`: instruction argument; `None` renders as `-`
    /// - `sp`: value-stack depth
    /// - `hints`: pre-rendered `key=value` annotations, appended in order.
    ///   Complex hint values should go through [`crate::preview::preview`]
    ///   before being passed here; the emitter does not render values itself.
    ///
    /// The tick is consumed before the line is formatted or written, so a
    /// sink failure leaves a gap in the observed tick sequence rather than a
    /// duplicate.
    pub fn emit(
        &self,
        depth: u32,
        pc_pos: u64,
        opcode: &str,
        operand: Option<&dyn fmt::Display>,
        sp: i64,
        hints: &[(&str, &str)],
    ) -> io::Result<()> {
        let tick = self.tick.fetch_add(1, Ordering::Relaxed) + 1;
        TOTAL_RECORDS.fetch_add(1, Ordering::Relaxed);

        let byte_offset = pc_pos >> 1;

        let mut line = String::with_capacity(32 + opcode.len());
        line.push_str(&tick.to_string());
        line.push('\t');
        line.push_str(&depth.to_string());
        line.push('\t');
        line.push_str(&byte_offset.to_string());
        line.push('\t');
        line.push_str(opcode);
        line.push('\t');
        match operand {
            Some(opd) => line.push_str(&opd.to_string()),
            None => line.push('-'),
        }
        line.push('\t');
        line.push_str(&sp.to_string());

        for (key, val) in hints {
            line.push('\t');
            line.push_str(key);
            line.push('=');
            line.push_str(val);
        }

        self.sink.write_line(&line).inspect_err(|_| {
            TOTAL_WRITE_FAILURES.fetch_add(1, Ordering::Relaxed);
        })
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("tick", &self.current_tick())
            .finish()
    }
}

static GLOBAL_TRACER: LazyLock<Tracer> = LazyLock::new(|| {
    let config = TraceConfig::from_env();
    match config.sink() {
        Ok(sink) => Tracer { sink, tick: AtomicU64::new(0) },
        Err(e) => {
            eprintln!("Warning: OPTRACE sink unavailable ({e}), falling back to stdout");
            Tracer::new(StdoutSink)
        }
    }
});

/// The process-wide tracer, built on first use from the `OPTRACE` environment
/// variable (see [`crate::config::TraceConfig`]).
pub fn tracer() -> &'static Tracer {
    &GLOBAL_TRACER
}

/// Emit one record through the process-wide tracer.
///
/// Convenience for hosts that do not inject their own [`Tracer`].
pub fn emit(
    depth: u32,
    pc_pos: u64,
    opcode: &str,
    operand: Option<&dyn fmt::Display>,
    sp: i64,
    hints: &[(&str, &str)],
) -> io::Result<()> {
    tracer().emit(depth, pc_pos, opcode, operand, sp, hints)
}
