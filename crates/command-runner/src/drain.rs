//! Draining one child stream to completion

use futures_lite::io::{AsyncBufReadExt, AsyncRead, BufReader};
use std::io;

use crate::event::{LogSource, OutputObserver};
use crate::result::StreamCapture;

/// Reads a single stream until end of file, line by line.
///
/// The drainer owns its end of the pipe. When it returns, on success or on
/// a read error, the pipe is closed, so the child can never stay blocked
/// writing to a stream nobody reads.
pub(crate) struct StreamDrainer<R> {
    reader: BufReader<R>,
    source: LogSource,
}

/// What a drainer produced
#[derive(Debug)]
pub(crate) struct Drained {
    pub(crate) capture: StreamCapture,
    pub(crate) error: Option<io::Error>,
}

impl<R: AsyncRead + Unpin> StreamDrainer<R> {
    pub(crate) fn new(stream: R, source: LogSource) -> Self {
        Self {
            reader: BufReader::new(stream),
            source,
        }
    }

    /// Run to end of stream, forwarding every line to `observer`
    pub(crate) async fn drain(mut self, observer: &dyn OutputObserver) -> Drained {
        let mut capture = StreamCapture::default();
        let mut buf = Vec::new();

        // `buf` only holds the line currently being assembled
        let error = loop {
            match self.reader.read_until(b'\n', &mut buf).await {
                Ok(0) => {
                    if !buf.is_empty() {
                        self.push(&mut capture, &buf, observer);
                    }
                    break None;
                }
                Ok(_) if buf.ends_with(b"\n") => {
                    self.push(&mut capture, &buf, observer);
                    buf.clear();
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    // Keep whatever arrived before the fault
                    if !buf.is_empty() {
                        self.push(&mut capture, &buf, observer);
                    }
                    capture.truncated = true;
                    break Some(e);
                }
            }
        };

        Drained { capture, error }
    }

    fn push(&self, capture: &mut StreamCapture, bytes: &[u8], observer: &dyn OutputObserver) {
        let line = String::from_utf8_lossy(bytes);
        observer.on_line(self.source, &line);
        capture.text.push_str(&line);
        capture.lines += 1;
    }
}

/// Yields its data once, then fails every read
#[cfg(test)]
pub(crate) struct FailingReader {
    data: Option<Vec<u8>>,
}

#[cfg(test)]
impl FailingReader {
    pub(crate) fn new(data: &[u8]) -> Self {
        Self {
            data: Some(data.to_vec()),
        }
    }
}

#[cfg(test)]
impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        buf: &mut [u8],
    ) -> std::task::Poll<io::Result<usize>> {
        use std::task::Poll;
        match self.data.take() {
            Some(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Poll::Ready(Ok(n))
            }
            None => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "pipe went away",
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NoOpObserver;
    use futures_lite::io::Cursor;
    use std::sync::Mutex;

    #[test]
    fn test_drain_keeps_terminators_and_partial_line() {
        futures::executor::block_on(async {
            let stream = Cursor::new(b"one\ntwo\nthree".to_vec());
            let drained = StreamDrainer::new(stream, LogSource::Stdout)
                .drain(&NoOpObserver)
                .await;

            assert!(drained.error.is_none());
            assert_eq!(drained.capture.text, "one\ntwo\nthree");
            assert_eq!(drained.capture.lines, 3);
            assert!(!drained.capture.truncated);
        });
    }

    #[test]
    fn test_drain_empty_stream() {
        futures::executor::block_on(async {
            let drained = StreamDrainer::new(Cursor::new(Vec::new()), LogSource::Stderr)
                .drain(&NoOpObserver)
                .await;

            assert_eq!(drained.capture, StreamCapture::default());
        });
    }

    #[test]
    fn test_drain_replaces_invalid_utf8() {
        futures::executor::block_on(async {
            let stream = Cursor::new(b"ok\n\xff\xfe\n".to_vec());
            let drained = StreamDrainer::new(stream, LogSource::Stdout)
                .drain(&NoOpObserver)
                .await;

            assert_eq!(drained.capture.lines, 2);
            assert!(drained.capture.text.starts_with("ok\n"));
            assert!(drained.capture.text.contains('\u{FFFD}'));
        });
    }

    #[test]
    fn test_drain_forwards_lines_to_observer() {
        futures::executor::block_on(async {
            let seen = Mutex::new(Vec::new());
            let observer = |source: LogSource, line: &str| {
                seen.lock().unwrap().push((source, line.to_string()));
            };

            let stream = Cursor::new(b"a\nb\n".to_vec());
            StreamDrainer::new(stream, LogSource::Stderr)
                .drain(&observer)
                .await;

            assert_eq!(
                *seen.lock().unwrap(),
                vec![
                    (LogSource::Stderr, "a\n".to_string()),
                    (LogSource::Stderr, "b\n".to_string()),
                ]
            );
        });
    }

    #[test]
    fn test_read_error_truncates_capture() {
        futures::executor::block_on(async {
            let reader = FailingReader::new(b"first\nhalf");
            let drained = StreamDrainer::new(reader, LogSource::Stderr)
                .drain(&NoOpObserver)
                .await;

            let error = drained.error.expect("read error should be reported");
            assert_eq!(error.kind(), io::ErrorKind::BrokenPipe);
            assert_eq!(drained.capture.text, "first\nhalf");
            assert!(drained.capture.truncated);
        });
    }
}
