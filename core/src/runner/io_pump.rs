use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::util::RingBytes;

/// Drain `rd` into `ring` until EOF, returning the number of bytes read.
///
/// Output is captured only; nothing is forwarded to this process's own streams.
pub fn pump<R>(mut rd: R, ring: Arc<RingBytes>, label: &'static str) -> JoinHandle<Result<u64, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;

        loop {
            let n = rd.read(&mut buf).await.map_err(|e| RunnerError::StreamIo {
                stream: label,
                source: e,
            })?;
            if n == 0 {
                break;
            }
            ring.push(&buf[..n]);
            total += n as u64;
        }

        Ok(total)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn captures_until_eof() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let ring = RingBytes::new(1024);

        let task = pump(rd, ring.clone(), "stdout");

        wr.write_all(b"hello\n").await.unwrap();
        wr.write_all(b"world").await.unwrap();
        drop(wr);

        assert_eq!(task.await.unwrap().unwrap(), 11);
        assert_eq!(ring.to_text(), "hello\nworld");
    }

    #[tokio::test]
    async fn two_streams_share_one_buffer() {
        let (mut out_wr, out_rd) = tokio::io::duplex(64);
        let (mut err_wr, err_rd) = tokio::io::duplex(64);
        let ring = RingBytes::new(1024);

        let out = pump(out_rd, ring.clone(), "stdout");
        let err = pump(err_rd, ring.clone(), "stderr");

        out_wr.write_all(b"a").await.unwrap();
        drop(out_wr);
        out.await.unwrap().unwrap();
        err_wr.write_all(b"b").await.unwrap();
        drop(err_wr);
        err.await.unwrap().unwrap();

        assert_eq!(ring.to_text(), "ab");
    }
}
