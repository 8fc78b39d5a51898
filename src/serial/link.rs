//! Line-oriented link over a byte transport
//!
//! The device speaks newline-terminated ASCII. `LineLink` owns the backend
//! and turns its non-blocking reads into a bounded `read_line` that polls in
//! fixed sub-intervals until a full line arrives or the deadline passes.

use crate::error::DeviceError;
use log::{debug, warn};
use std::io;
use std::time::{Duration, Instant};

/// Largest line the link accumulates before discarding the buffer
pub const MAX_LINE_LEN: usize = 256;

/// Byte-level backend for the serial link
pub trait Transport {
    /// Write bytes, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read whatever is available without waiting long.
    /// Returns `Ok(0)` when nothing arrived.
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Release the underlying handle
    fn close(&mut self) {}
}

/// An open link to the companion device
pub struct LineLink<T: Transport> {
    backend: Option<T>,
    poll_interval: Duration,
}

impl<T: Transport> LineLink<T> {
    /// Wrap an already opened backend
    pub fn new(backend: T, poll_interval: Duration) -> Self {
        Self {
            backend: Some(backend),
            poll_interval,
        }
    }

    /// Borrow the backend, if the link is still open
    #[cfg(test)]
    pub fn backend(&self) -> Option<&T> {
        self.backend.as_ref()
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.backend.is_some()
    }

    /// Write raw bytes to the device
    pub fn send(&mut self, data: &[u8]) -> Result<usize, DeviceError> {
        let backend = self.backend.as_mut().ok_or_else(|| {
            DeviceError::WriteFailed(io::Error::new(
                io::ErrorKind::NotConnected,
                "link is closed",
            ))
        })?;

        let written = backend.write(data)?;
        debug!("TX {:?} ({} bytes)", String::from_utf8_lossy(data), written);
        Ok(written)
    }

    /// Wait up to `timeout` for one newline-terminated line.
    ///
    /// The buffer starts empty on every call. A partial line at the deadline
    /// counts as no data, and anything after the first newline is dropped.
    /// The returned line has its terminator stripped.
    pub fn read_line(&mut self, timeout: Duration) -> Option<String> {
        let backend = self.backend.as_mut()?;
        let deadline = Instant::now() + timeout;
        let mut buffer: Vec<u8> = Vec::with_capacity(MAX_LINE_LEN);
        let mut chunk = [0u8; MAX_LINE_LEN];

        loop {
            let room = MAX_LINE_LEN - buffer.len();
            match backend.read_available(&mut chunk[..room]) {
                Ok(0) => {}
                Ok(n) => {
                    buffer.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                        if pos + 1 < buffer.len() {
                            debug!("Dropping {} bytes after line end", buffer.len() - pos - 1);
                        }
                        buffer.truncate(pos);
                        if buffer.last() == Some(&b'\r') {
                            buffer.pop();
                        }
                        let line = String::from_utf8_lossy(&buffer).into_owned();
                        debug!("RX {:?}", line);
                        return Some(line);
                    }
                    if buffer.len() >= MAX_LINE_LEN {
                        warn!("Discarding {} bytes without a line end", buffer.len());
                        buffer.clear();
                    }
                }
                Err(e) => {
                    debug!("Read error treated as no data: {}", e);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(self.poll_interval.min(deadline - now));
        }

        if !buffer.is_empty() {
            debug!("Partial line at deadline dropped: {:?}", String::from_utf8_lossy(&buffer));
        }
        None
    }

    /// Close the link. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.close();
            debug!("Link closed");
        }
    }
}

impl<T: Transport> Drop for LineLink<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Backend that hands out pre-cut chunks, one per read
    struct Chunks {
        chunks: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
        closed: usize,
    }

    impl Chunks {
        fn new(chunks: Vec<&[u8]>) -> Self {
            Self {
                chunks: chunks.into_iter().map(|c| Ok(c.to_vec())).collect(),
                written: Vec::new(),
                closed: 0,
            }
        }
    }

    impl Transport for Chunks {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(data);
            Ok(data.len())
        }

        fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(Ok(chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    Ok(n)
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }

        fn close(&mut self) {
            self.closed += 1;
        }
    }

    fn link(chunks: Vec<&[u8]>) -> LineLink<Chunks> {
        LineLink::new(Chunks::new(chunks), Duration::from_millis(1))
    }

    #[test]
    fn test_line_split_across_reads() {
        let mut link = link(vec![b"DETEC", b"TED:", b"1\r\n"]);
        assert_eq!(link.read_line(Duration::from_millis(100)).as_deref(), Some("DETECTED:1"));
    }

    #[test]
    fn test_bytes_after_newline_are_dropped() {
        let mut link = link(vec![b"OK\nBUTTON_START\n"]);
        assert_eq!(link.read_line(Duration::from_millis(50)).as_deref(), Some("OK"));
        assert_eq!(link.read_line(Duration::from_millis(20)), None);
    }

    #[test]
    fn test_partial_line_at_deadline_is_absent() {
        let mut link = link(vec![b"BUTTON_"]);
        assert_eq!(link.read_line(Duration::from_millis(20)), None);
    }

    #[test]
    fn test_read_errors_count_as_no_data() {
        let mut backend = Chunks::new(vec![]);
        backend
            .chunks
            .push_back(Err(io::Error::new(io::ErrorKind::Other, "glitch")));
        backend.chunks.push_back(Ok(b"READY\n".to_vec()));
        let mut link = LineLink::new(backend, Duration::from_millis(1));

        assert_eq!(link.read_line(Duration::from_millis(100)).as_deref(), Some("READY"));
    }

    #[test]
    fn test_overflow_resets_buffer() {
        let long = vec![b'x'; MAX_LINE_LEN];
        let mut link = link(vec![&long, b"READY\n"]);
        assert_eq!(link.read_line(Duration::from_millis(100)).as_deref(), Some("READY"));
    }

    #[test]
    fn test_read_line_timeout_is_bounded() {
        let mut link = LineLink::new(Chunks::new(vec![]), Duration::from_millis(100));

        let start = Instant::now();
        assert_eq!(link.read_line(Duration::from_millis(500)), None);
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(500), "returned early: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(600), "overran: {:?}", elapsed);
    }

    #[test]
    fn test_send_and_close() {
        let mut link = link(vec![]);
        assert_eq!(link.send(b"CLEAR_ALL\n").unwrap(), 10);
        assert_eq!(link.backend().unwrap().written, b"CLEAR_ALL\n");

        link.close();
        link.close();
        assert!(!link.is_open());
        assert!(matches!(link.send(b"X\n"), Err(DeviceError::WriteFailed(_))));
        assert_eq!(link.read_line(Duration::from_millis(10)), None);
    }
}
