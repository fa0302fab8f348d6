use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Bounded byte buffer that keeps the most recent `cap` bytes.
///
/// Shared between the stdout and stderr pumps of one process so both streams
/// land in a single buffer in arrival order.
#[derive(Clone)]
pub struct RingBytes {
    inner: Arc<Mutex<Inner>>,
    cap: usize,
}

struct Inner {
    buf: VecDeque<u8>,
    dropped: u64,
}

impl RingBytes {
    pub fn new(cap: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Arc::new(Mutex::new(Inner {
                buf: VecDeque::with_capacity(cap.min(64 * 1024)),
                dropped: 0,
            })),
            cap,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn push(&self, data: &[u8]) {
        let mut g = self.lock();
        let skipped = data.len().saturating_sub(self.cap);
        let data = &data[skipped..];
        let overflow = g.buf.len().saturating_add(data.len()).saturating_sub(self.cap);
        if overflow > 0 {
            g.buf.drain(..overflow);
        }
        g.buf.extend(data);
        g.dropped += (skipped + overflow) as u64;
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let g = self.lock();
        let mut vec = Vec::with_capacity(g.buf.len());
        vec.extend(g.buf.iter().copied());
        vec
    }

    /// Number of leading bytes discarded to stay within the cap.
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    /// Captured text, lossily decoded, with a marker when the head was cut.
    pub fn to_text(&self) -> String {
        let dropped = self.dropped();
        let text = String::from_utf8_lossy(&self.to_bytes()).into_owned();
        if dropped > 0 {
            format!("[... {dropped} bytes truncated ...]\n{text}")
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_tail_when_over_capacity() {
        let ring = RingBytes::new(5);
        ring.push(b"abc");
        ring.push(b"defg");
        assert_eq!(ring.to_bytes(), b"cdefg");
        assert_eq!(ring.dropped(), 2);
    }

    #[test]
    fn oversized_single_push_keeps_last_bytes() {
        let ring = RingBytes::new(3);
        ring.push(b"0123456789");
        assert_eq!(ring.to_bytes(), b"789");
        assert_eq!(ring.dropped(), 7);
        assert_eq!(ring.to_text(), "[... 7 bytes truncated ...]\n789");
    }

    #[test]
    fn text_without_truncation_is_verbatim() {
        let ring = RingBytes::new(64);
        ring.push(b"line one\n");
        ring.push(b"line two\n");
        assert_eq!(ring.to_text(), "line one\nline two\n");
    }
}
