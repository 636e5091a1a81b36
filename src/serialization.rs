//! Output of templates and match results.
//!
//! Whole values go out as one pretty JSON document. Captures can also be
//! streamed one per line, each line carrying its position in the match and
//! the field path it targets.

use crate::matcher::{Capture, MatchResult};
use serde::Serialize;
use std::io::{self, Write};

/// Failure while writing output
#[derive(Debug)]
pub enum OutputError {
    /// A value could not be encoded as JSON
    Encode(serde_json::Error),
    /// The underlying writer failed
    Write(io::Error),
}

impl From<serde_json::Error> for OutputError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            OutputError::Write(io::Error::from(err))
        } else {
            OutputError::Encode(err)
        }
    }
}

impl From<io::Error> for OutputError {
    fn from(err: io::Error) -> Self {
        OutputError::Write(err)
    }
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Encode(e) => write!(f, "Failed to encode output: {}", e),
            OutputError::Write(e) => write!(f, "Failed to write output: {}", e),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Encode(e) => Some(e),
            OutputError::Write(e) => Some(e),
        }
    }
}

/// One NDJSON line
#[derive(Serialize)]
struct CaptureLine<'a> {
    index: usize,
    path: &'a str,
    field: String,
    value: &'a str,
}

/// Streams captures as NDJSON, one capture per line.
///
/// `index` counts captures across every result written, so repeated-line
/// captures for one path keep their text order.
pub struct CaptureWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> CaptureWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn write_capture(&mut self, capture: &Capture) -> Result<(), OutputError> {
        let line = CaptureLine {
            index: self.written,
            path: &capture.path.raw,
            field: capture.path.dotted(),
            value: &capture.value,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Write every capture of a match, returning how many were written
    pub fn write_result(&mut self, result: &MatchResult) -> Result<usize, OutputError> {
        for capture in &result.captures {
            self.write_capture(capture)?;
        }
        Ok(result.len())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> Result<W, OutputError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Write a value as one pretty-printed JSON document followed by a newline
pub fn write_document<W: Write, T: Serialize>(mut writer: W, value: &T) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Matcher;
    use crate::template::{Segment, Template};

    fn captures() -> MatchResult {
        let template = Template::compile("a: #{R.A}\nb: #{R.B:ToLower()}\n").unwrap();
        Matcher::single(&template)
            .unwrap()
            .extract("a: one\nb: TWO\n")
            .unwrap()
    }

    #[test]
    fn test_capture_lines() {
        let mut writer = CaptureWriter::new(Vec::new());

        assert_eq!(writer.write_result(&captures()).unwrap(), 2);
        let output = String::from_utf8(writer.finish().unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(
            lines,
            vec![
                r#"{"index":0,"path":"R.A","field":"R.A","value":"one"}"#,
                r#"{"index":1,"path":"R.B:ToLower()","field":"R.B","value":"TWO"}"#,
            ]
        );
    }

    #[test]
    fn test_index_continues_across_results() {
        let mut writer = CaptureWriter::new(Vec::new());
        writer.write_result(&captures()).unwrap();
        writer.write_result(&captures()).unwrap();
        assert_eq!(writer.written(), 4);

        let output = String::from_utf8(writer.finish().unwrap()).unwrap();
        let last: serde_json::Value = serde_json::from_str(output.lines().last().unwrap()).unwrap();
        assert_eq!(last["index"], 3);
    }

    #[test]
    fn test_write_document() {
        let mut buf = Vec::new();
        write_document(&mut buf, &captures()).unwrap();

        let output = String::from_utf8(buf).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["captures"][0]["value"], "one");
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn test_write_failure_is_reported_as_write_error() {
        struct Broken;

        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let segments = vec![Segment::Literal("x".to_string())];
        let err = write_document(Broken, &segments).unwrap_err();
        assert!(matches!(err, OutputError::Write(_)));
        assert!(err.to_string().starts_with("Failed to write output"));
    }
}
