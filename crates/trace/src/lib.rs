//! optrace: step-by-step execution traces for instruction-level engines
//!
//! Key design principles:
//! - TraceValue: a closed model of whatever the traced engine manipulates
//! - preview: bounded, single-line, never-panicking value rendering
//! - Tracer: one tab-separated line per executed instruction, ticked by an
//!   atomic counter so ordering survives concurrent emitters
//!
//! A host interpreter calls [`Tracer::emit`] (or the process-wide [`emit`])
//! once per instruction, pre-rendering any complex hint values through
//! [`preview`]. The line format is a stable contract for downstream parsers:
//!
//! ```text
//! tick \t depth \t byteOffset \t opcode \t operand \t sp [\t key=value ...]
//! ```

pub mod config;
pub mod diagnostics;
pub mod emitter;
pub mod preview;
pub mod value;

// Re-export key types and functions
pub use config::{TraceConfig, TraceDestination};
pub use emitter::{
    FileSink, MemorySink, NullSink, StderrSink, StdoutSink, TraceSink, Tracer, emit, tracer,
};
pub use preview::{
    BYTE_DISPLAY_LIMIT, DEFAULT_MAX_STR, FAILURE_TOKEN, LIST_DISPLAY_LIMIT, MAP_DISPLAY_LIMIT,
    MAX_DEPTH, preview, preview_with_limit,
};
pub use value::TraceValue;
