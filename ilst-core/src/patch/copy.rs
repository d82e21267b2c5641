use std::io::{self, Read, Seek, SeekFrom, Write};

/// Copy exactly `len` bytes; a short source is an error.
pub fn copy_exact<R: Read, W: Write>(
    src: &mut R,
    dst: &mut W,
    len: u64,
    buf: &mut [u8],
) -> io::Result<()> {
    let mut left = len;
    while left > 0 {
        let n = buf.len().min(left as usize);
        let k = match src.read(&mut buf[..n]) {
            Ok(k) => k,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if k == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("source ended {left} bytes early"),
            ));
        }
        dst.write_all(&buf[..k])?;
        left -= k as u64;
    }
    Ok(())
}

/// Copy everything left in `src`, chunk by chunk.
pub fn copy_to_end<R: Read, W: Write>(src: &mut R, dst: &mut W, buf: &mut [u8]) -> io::Result<u64> {
    let mut total = 0u64;
    loop {
        let n = match src.read(buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        dst.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

pub fn write_zeros<W: Write>(dst: &mut W, mut n: u64) -> io::Result<()> {
    let zeros = [0u8; 4096];
    while n > 0 {
        let k = zeros.len().min(n as usize);
        dst.write_all(&zeros[..k])?;
        n -= k as u64;
    }
    Ok(())
}

pub fn skip<R: Seek>(src: &mut R, n: u64) -> io::Result<()> {
    src.seek(SeekFrom::Current(n as i64))?;
    Ok(())
}

/// Overwrite a big-endian u32 at `offset`, then return to the append position.
pub fn patch_u32<W: Write + Seek>(dst: &mut W, offset: u64, value: u32) -> io::Result<()> {
    let resume = dst.stream_position()?;
    dst.seek(SeekFrom::Start(offset))?;
    dst.write_all(&value.to_be_bytes())?;
    dst.seek(SeekFrom::Start(resume))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn copy_exact_fails_on_short_source() {
        let mut src = Cursor::new(vec![1u8; 10]);
        let mut dst = Vec::new();
        let mut buf = [0u8; 4];
        copy_exact(&mut src, &mut dst, 6, &mut buf).unwrap();
        assert_eq!(dst, vec![1u8; 6]);
        let err = copy_exact(&mut src, &mut dst, 6, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    /// Yields `Interrupted` before every successful read.
    struct Flaky<R> {
        inner: R,
        interrupt: bool,
    }

    impl<R: Read> Read for Flaky<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let data: Vec<u8> = (0..50u8).collect();
        let mut buf = [0u8; 8];

        let mut src = Flaky { inner: Cursor::new(data.clone()), interrupt: false };
        let mut dst = Vec::new();
        copy_exact(&mut src, &mut dst, 20, &mut buf).unwrap();
        assert_eq!(dst, data[..20]);

        let n = copy_to_end(&mut src, &mut dst, &mut buf).unwrap();
        assert_eq!(n, 30);
        assert_eq!(dst, data);
    }

    #[test]
    fn patch_u32_returns_to_append_position() {
        let mut dst = Cursor::new(vec![0u8; 12]);
        dst.seek(SeekFrom::End(0)).unwrap();
        patch_u32(&mut dst, 4, 0xDEAD_BEEF).unwrap();
        assert_eq!(dst.position(), 12);
        assert_eq!(&dst.get_ref()[4..8], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn copy_to_end_streams_in_chunks() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut src = Cursor::new(data.clone());
        let mut dst = Vec::new();
        let n = copy_to_end(&mut src, &mut dst, &mut [0u8; 7]).unwrap();
        assert_eq!(n, 100);
        assert_eq!(dst, data);
    }
}
