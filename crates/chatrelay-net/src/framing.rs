//! Whole-frame I/O over any byte stream.
//!
//! These two functions are the only place partial reads/writes are handled;
//! every other layer sees whole frames. They retry across `WouldBlock`
//! (non-blocking sockets) the same way a blocking socket would retry across
//! a short read/write, so they work equally well against `mio::net::TcpStream`
//! (the server) and `std::net::TcpStream` (tests, and the client's blocking
//! socket).

use std::io::{self, Read, Write};

use chatrelay_wire::{HEADER_LEN, NAME_SIZE_LIMIT, TEXT_SIZE_LIMIT};

use crate::error::NetError;

/// Largest frame the wire format can legally produce: a `CHAT` message with
/// both name and text at their caps. Guards `recv_frame`'s allocation
/// against a bogus or hostile declared length.
pub const MAX_FRAME_LEN: usize = HEADER_LEN + 1 + 4 + 1 + NAME_SIZE_LIMIT + 2 + TEXT_SIZE_LIMIT;

/// Writes exactly `bytes.len()` bytes, retrying on short writes and on
/// `WouldBlock`. Never returns having written only part of `bytes`.
pub fn send_all<W: Write>(w: &mut W, bytes: &[u8]) -> Result<(), NetError> {
    let mut sent = 0;
    while sent < bytes.len() {
        match w.write(&bytes[sent..]) {
            Ok(0) => return Err(NetError::Closed),
            Ok(n) => sent += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::thread::yield_now(),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(NetError::Io(e)),
        }
    }
    Ok(())
}

/// Reads one complete frame: the 4-byte `total_len` header followed by
/// exactly `total_len - 4` payload bytes.
///
/// Returns [`NetError::Closed`] on a clean close or reset at any point,
/// including mid-frame.
pub fn recv_frame<R: Read>(r: &mut R) -> Result<Vec<u8>, NetError> {
    let mut header = [0u8; HEADER_LEN];
    read_exact_retry(r, &mut header)?;

    let declared = u32::from_be_bytes(header) as usize;
    if declared < 5 {
        return Err(NetError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame declares total_len {declared}, below the 5 byte minimum"),
        )));
    }
    if declared > MAX_FRAME_LEN {
        return Err(NetError::Oversized { declared, max: MAX_FRAME_LEN });
    }

    let mut frame = vec![0u8; declared];
    frame[..HEADER_LEN].copy_from_slice(&header);
    read_exact_retry(r, &mut frame[HEADER_LEN..])?;
    Ok(frame)
}

fn read_exact_retry<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), NetError> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => return Err(NetError::Closed),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => std::thread::yield_now(),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => return Err(NetError::Closed),
            Err(e) => return Err(NetError::Io(e)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        net::{TcpListener, TcpStream},
        thread,
        time::Duration,
    };

    use super::*;

    #[test]
    fn recv_frame_reassembles_arbitrary_chunking() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let payload = b"hello chat relay";
        let total_len = (HEADER_LEN + payload.len()) as u32;
        let mut frame = Vec::new();
        frame.extend_from_slice(&total_len.to_be_bytes());
        frame.extend_from_slice(payload);
        let expected = frame.clone();

        let writer = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            for chunk in frame.chunks(3) {
                stream.write_all(chunk).unwrap();
                thread::sleep(Duration::from_millis(2));
            }
        });

        let (mut server_side, _) = listener.accept().unwrap();
        let got = recv_frame(&mut server_side).unwrap();
        assert_eq!(got, expected);

        writer.join().unwrap();
    }

    #[test]
    fn recv_frame_reports_closed_on_clean_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let writer = thread::spawn(move || {
            let stream = TcpStream::connect(addr).unwrap();
            drop(stream);
        });

        let (mut server_side, _) = listener.accept().unwrap();
        let err = recv_frame(&mut server_side).unwrap_err();
        assert!(matches!(err, NetError::Closed));

        writer.join().unwrap();
    }

    #[test]
    fn recv_frame_reports_closed_mid_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let writer = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            // Declare a 20-byte frame but only send the header and nothing else.
            stream.write_all(&20u32.to_be_bytes()).unwrap();
            drop(stream);
        });

        let (mut server_side, _) = listener.accept().unwrap();
        let err = recv_frame(&mut server_side).unwrap_err();
        assert!(matches!(err, NetError::Closed));

        writer.join().unwrap();
    }

    #[test]
    fn recv_frame_rejects_oversized_declared_length() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let writer = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(&u32::MAX.to_be_bytes()).unwrap();
            thread::sleep(Duration::from_millis(50));
        });

        let (mut server_side, _) = listener.accept().unwrap();
        let err = recv_frame(&mut server_side).unwrap_err();
        assert!(matches!(err, NetError::Oversized { .. }));

        writer.join().unwrap();
    }

    #[test]
    fn send_all_writes_everything() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let payload = vec![7u8; 64 * 1024];
        let expected_len = payload.len();

        let reader = thread::spawn(move || {
            let (mut server_side, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            server_side.read_to_end(&mut received).unwrap();
            received
        });

        let mut client = TcpStream::connect(addr).unwrap();
        send_all(&mut client, &payload).unwrap();
        drop(client);

        let received = reader.join().unwrap();
        assert_eq!(received.len(), expected_len);
    }
}
