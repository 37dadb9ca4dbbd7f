//! Companion stdout -> `SensorReading`s.

use std::io::Read;
use std::process::ChildStdout;
use std::time::Duration;

use bsec_abi::SensorReading;
use tracing::{error, warn};

use crate::error::{BsecError, Result};
use crate::supervisor::lines::{LineReader, NextLine, WaitReadable};

/// Decode one output line. A non-zero status is an error.
pub fn decode_line(raw: &[u8]) -> Result<SensorReading> {
    let reading: SensorReading =
        serde_json::from_slice(raw).map_err(|source| BsecError::MalformedOutput {
            line: String::from_utf8_lossy(raw).into_owned(),
            source,
        })?;
    if !reading.is_success() {
        error!("BSEC-Library reported status {}.", reading.status);
        return Err(BsecError::DeviceReportedError {
            status: reading.status.0,
        });
    }
    Ok(reading)
}

/// Lazy stream of readings. Ends for good after the first error, at end of
/// stream, or straight away if the companion isn't running.
pub struct Readings<'a, R = ChildStdout> {
    lines: Option<&'a mut LineReader<R>>,
    timeout: Option<Duration>,
}

impl<'a, R: Read + WaitReadable> Readings<'a, R> {
    pub(crate) fn new(lines: &'a mut LineReader<R>, timeout: Option<Duration>) -> Self {
        Self {
            lines: Some(lines),
            timeout,
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            lines: None,
            timeout: None,
        }
    }
}

impl<R: Read + WaitReadable> Iterator for Readings<'_, R> {
    type Item = Result<SensorReading>;

    fn next(&mut self) -> Option<Self::Item> {
        let lines = self.lines.as_mut()?;
        let (item, done) = next_item(lines, self.timeout);
        if done {
            self.lines = None;
        }
        item
    }
}

fn next_item<R: Read + WaitReadable>(
    lines: &mut LineReader<R>,
    timeout: Option<Duration>,
) -> (Option<Result<SensorReading>>, bool) {
    loop {
        match lines.next_line(timeout) {
            Ok(NextLine::Line(raw)) => {
                if raw.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                return match decode_line(&raw) {
                    Ok(r) => (Some(Ok(r)), false),
                    Err(e) => (Some(Err(e)), true),
                };
            }
            Ok(NextLine::Eof) => {
                warn!("BSEC-Library output ended.");
                return (None, true);
            }
            Ok(NextLine::TimedOut) => {
                let waited = timeout.unwrap_or_default();
                warn!("No BSEC-Library output within {waited:?}.");
                return (Some(Err(BsecError::ReadTimeout(waited))), true);
            }
            Err(e) => return (Some(Err(e.into())), true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &[u8]) -> Vec<Result<SensorReading>> {
        let mut lines = LineReader::new(input);
        Readings::new(&mut lines, None).collect()
    }

    #[test]
    fn success_lines_then_eof() {
        let out = collect(
            b"{\"Status\": \"0\", \"IAQ\": 25.0}\r\n\n   \n{\"Status\": \"0\", \"IAQ\": 26.5}\n",
        );
        assert_eq!(out.len(), 2);
        let iaq: Vec<_> = out.into_iter().map(|r| r.unwrap().iaq).collect();
        assert_eq!(iaq, vec![Some(25.0), Some(26.5)]);
    }

    #[test]
    fn error_status_ends_stream() {
        let out = collect(
            b"{\"Status\": \"0\"}\n{\"Status\": \"1\"}\n{\"Status\": \"0\"}\n",
        );
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        match &out[1] {
            Err(BsecError::DeviceReportedError { status }) => assert_eq!(status, "1"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn garbage_ends_stream() {
        let out = collect(b"bsec_iot_init failed\n{\"Status\": \"0\"}\n");
        assert_eq!(out.len(), 1);
        match &out[0] {
            Err(BsecError::MalformedOutput { line, .. }) => assert_eq!(line, "bsec_iot_init failed"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn not_running_is_empty() {
        let mut r: Readings<'_, &[u8]> = Readings::empty();
        assert!(r.next().is_none());
    }

    #[test]
    fn status_only_line_is_a_reading() {
        let r = decode_line(br#"{"Status":"0"}"#).unwrap();
        assert!(r.is_success());
        assert_eq!(r.temperature, None);
    }
}
