//! Length-prefixed framing over an async byte stream.
//!
//! Every frame is a 4-byte big-endian length followed by exactly that many
//! bytes. Message boundaries come from the prefix alone, so a payload that
//! happens to be empty or "falsy" is still a complete message.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame body accepted in either direction (16 MiB).
///
/// Full state snapshots are the largest messages; this leaves generous
/// headroom while still refusing absurd length prefixes before allocating.
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Writes one frame: length prefix, then body. Flushes before returning.
pub async fn write_frame<W>(writer: &mut W, body: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = body.len();
    if len > MAX_FRAME_SIZE as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame too large: {len} bytes (max {MAX_FRAME_SIZE})"),
        ));
    }
    let len_bytes = (len as u32).to_be_bytes();
    writer.write_all(&len_bytes).await?;
    writer.write_all(body).await?;
    writer.flush().await
}

/// Reads one frame.
///
/// Returns `Ok(None)` when the peer closed the stream cleanly between
/// frames. EOF in the middle of a prefix or body is `UnexpectedEof`, and a
/// prefix above [`MAX_FRAME_SIZE`] is `InvalidData`.
pub async fn read_frame<R>(reader: &mut R) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    let mut filled = 0;
    while filled < len_buf.len() {
        let n = reader.read(&mut len_buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream closed inside a length prefix",
            ));
        }
        filled += n;
    }

    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} bytes (max {MAX_FRAME_SIZE})"),
        ));
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_read_back_in_order() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"get").await.unwrap();
        write_frame(&mut buf, b"").await.unwrap();
        write_frame(&mut buf, b"turn").await.unwrap();

        let mut reader = buf.as_slice();
        assert_eq!(read_frame(&mut reader).await.unwrap(), Some(b"get".to_vec()));
        // An empty body is still a frame, not end-of-stream.
        assert_eq!(read_frame(&mut reader).await.unwrap(), Some(Vec::new()));
        assert_eq!(read_frame(&mut reader).await.unwrap(), Some(b"turn".to_vec()));
        assert_eq!(read_frame(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_large_body_is_not_truncated() {
        // The old fixed-size reads broke on anything over 2 KiB.
        let body = vec![7u8; 64 * 1024];
        let mut buf = Vec::new();
        write_frame(&mut buf, &body).await.unwrap();

        let mut reader = buf.as_slice();
        assert_eq!(read_frame(&mut reader).await.unwrap().unwrap(), body);
    }

    #[tokio::test]
    async fn test_oversized_prefix_is_rejected() {
        let prefix = (MAX_FRAME_SIZE + 1).to_be_bytes();
        let mut reader = &prefix[..];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_oversized_write_is_rejected() {
        let body = vec![0u8; MAX_FRAME_SIZE as usize + 1];
        let mut buf = Vec::new();
        let err = write_frame(&mut buf, &body).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_eof_inside_prefix_is_an_error() {
        let mut reader = &[0u8, 0][..];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_eof_inside_body_is_an_error() {
        let mut buf = 10u32.to_be_bytes().to_vec();
        buf.extend_from_slice(b"abc");
        let mut reader = buf.as_slice();
        let err = read_frame(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
