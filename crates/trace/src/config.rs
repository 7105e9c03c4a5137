//! Trace output configuration
//!
//! Where trace lines land is controlled by the `OPTRACE` env var:
//! - Unset or `1`/`stdout` → stdout (the default)
//! - `0` → discard (ticks still advance)
//! - `stderr` → stderr
//! - `file:/path` → append to file
//!
//! Only the process-wide tracer consults this; hosts that construct their own
//! [`crate::emitter::Tracer`] pick a sink directly.

use crate::emitter::{FileSink, NullSink, StderrSink, StdoutSink, TraceSink};
use std::io;

/// Output destination for trace lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceDestination {
    Stdout,
    Stderr,
    File(String),
    Discard,
}

/// Parsed trace output configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    pub destination: TraceDestination,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            destination: TraceDestination::Stdout,
        }
    }
}

impl TraceConfig {
    /// Parse from the OPTRACE environment variable
    pub fn from_env() -> Self {
        let val = match std::env::var("OPTRACE") {
            Ok(v) => v,
            Err(_) => return Self::default(),
        };

        match val.as_str() {
            "" | "1" | "stdout" => Self::default(),
            "0" => Self {
                destination: TraceDestination::Discard,
            },
            "stderr" => Self {
                destination: TraceDestination::Stderr,
            },
            s if s.starts_with("file:") => Self {
                destination: TraceDestination::File(s[5..].to_string()),
            },
            _ => {
                eprintln!("Warning: OPTRACE='{}' not recognized, using stdout", val);
                Self::default()
            }
        }
    }

    /// Materialize the sink for this configuration
    pub fn sink(&self) -> io::Result<Box<dyn TraceSink>> {
        match &self.destination {
            TraceDestination::Stdout => Ok(Box::new(StdoutSink)),
            TraceDestination::Stderr => Ok(Box::new(StderrSink)),
            TraceDestination::File(path) => Ok(Box::new(FileSink::open(path)?)),
            TraceDestination::Discard => Ok(Box::new(NullSink)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn with_optrace(value: Option<&str>, f: impl FnOnce()) {
        // SAFETY: These tests are #[serial], so no other thread reads or
        // writes the environment concurrently.
        match value {
            Some(v) => unsafe { std::env::set_var("OPTRACE", v) },
            None => unsafe { std::env::remove_var("OPTRACE") },
        }
        f();
        unsafe { std::env::remove_var("OPTRACE") };
    }

    #[test]
    #[serial]
    fn test_unset_defaults_to_stdout() {
        with_optrace(None, || {
            assert_eq!(
                TraceConfig::from_env().destination,
                TraceDestination::Stdout
            );
        });
    }

    #[test]
    #[serial]
    fn test_zero_discards() {
        with_optrace(Some("0"), || {
            assert_eq!(
                TraceConfig::from_env().destination,
                TraceDestination::Discard
            );
        });
    }

    #[test]
    #[serial]
    fn test_stderr() {
        with_optrace(Some("stderr"), || {
            assert_eq!(
                TraceConfig::from_env().destination,
                TraceDestination::Stderr
            );
        });
    }

    #[test]
    #[serial]
    fn test_file_destination() {
        with_optrace(Some("file:/tmp/trace.log"), || {
            assert_eq!(
                TraceConfig::from_env().destination,
                TraceDestination::File("/tmp/trace.log".to_string())
            );
        });
    }

    #[test]
    #[serial]
    fn test_unrecognized_falls_back_to_stdout() {
        with_optrace(Some("banana"), || {
            assert_eq!(
                TraceConfig::from_env().destination,
                TraceDestination::Stdout
            );
        });
    }

    #[test]
    fn test_file_sink_materializes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let config = TraceConfig {
            destination: TraceDestination::File(path.to_string_lossy().into_owned()),
        };
        let sink = config.sink().unwrap();
        sink.write_line("1\t0\t0\tNOP\t-\t0").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "1\t0\t0\tNOP\t-\t0\n"
        );
    }
}
