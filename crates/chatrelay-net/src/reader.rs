//! Incremental frame reassembly for non-blocking, edge-triggered sockets.
//!
//! `mio`'s epoll backend is edge-triggered: a single readable notification
//! may carry only part of a frame, or several frames back to back. Each
//! connection therefore keeps its own [`FrameReader`], fed from the
//! dispatcher's readable handler in a loop until it reports [`RxOutcome::Pending`]
//! (socket genuinely has no more buffered bytes right now).
//!
//! This mirrors the teacher's `RxState`/`read_frame` shape in
//! `flux-network::tcp::stream`, generalised to this protocol's plain
//! 4-byte length prefix (no timestamp header).

use std::io::{self, Read};

use chatrelay_wire::HEADER_LEN;

use crate::{error::NetError, framing::MAX_FRAME_LEN};

enum RxState {
    Header { buf: [u8; HEADER_LEN], have: usize },
    Payload { frame: Vec<u8>, have: usize },
}

impl Default for RxState {
    fn default() -> Self {
        RxState::Header { buf: [0; HEADER_LEN], have: 0 }
    }
}

/// Result of one [`FrameReader::poll`] call.
pub enum RxOutcome {
    /// A complete frame was assembled.
    Frame(Vec<u8>),
    /// The socket has no more data buffered right now; wait for the next
    /// readable notification.
    Pending,
}

/// Per-connection incremental frame reassembly state.
pub struct FrameReader {
    state: RxState,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self { state: RxState::default() }
    }
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads as much as is available without blocking, returning as soon as
    /// one frame completes or the socket would block.
    pub fn poll<R: Read>(&mut self, r: &mut R) -> Result<RxOutcome, NetError> {
        loop {
            match &mut self.state {
                RxState::Header { buf, have } => {
                    while *have < HEADER_LEN {
                        match r.read(&mut buf[*have..]) {
                            Ok(0) => return Err(NetError::Closed),
                            Ok(n) => *have += n,
                            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                                return Ok(RxOutcome::Pending);
                            }
                            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                                return Err(NetError::Closed);
                            }
                            Err(e) => return Err(NetError::Io(e)),
                        }
                    }

                    let declared = u32::from_be_bytes(*buf) as usize;
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
                    frame[..HEADER_LEN].copy_from_slice(buf);
                    self.state = RxState::Payload { frame, have: HEADER_LEN };
                }

                RxState::Payload { frame, have } => {
                    while *have < frame.len() {
                        match r.read(&mut frame[*have..]) {
                            Ok(0) => return Err(NetError::Closed),
                            Ok(n) => *have += n,
                            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                                return Ok(RxOutcome::Pending);
                            }
                            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => {
                                return Err(NetError::Closed);
                            }
                            Err(e) => return Err(NetError::Io(e)),
                        }
                    }

                    let RxState::Payload { frame, .. } =
                        std::mem::replace(&mut self.state, RxState::default())
                    else {
                        unreachable!()
                    };
                    return Ok(RxOutcome::Frame(frame));
                }
            }
        }
    }
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
    fn reassembles_two_frames_sent_back_to_back() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut one = (HEADER_LEN as u32 + 3).to_be_bytes().to_vec();
        one.extend_from_slice(b"abc");
        let mut two = (HEADER_LEN as u32 + 2).to_be_bytes().to_vec();
        two.extend_from_slice(b"xy");

        let expect_one = one.clone();
        let expect_two = two.clone();

        let writer = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            use std::io::Write;
            stream.write_all(&one).unwrap();
            stream.write_all(&two).unwrap();
        });

        let (mut server_side, _) = listener.accept().unwrap();
        server_side.set_nonblocking(true).unwrap();

        let mut reader = FrameReader::new();
        let mut frames = Vec::new();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while frames.len() < 2 && std::time::Instant::now() < deadline {
            match reader.poll(&mut server_side) {
                Ok(RxOutcome::Frame(f)) => frames.push(f),
                Ok(RxOutcome::Pending) => thread::sleep(Duration::from_millis(1)),
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(frames[0], expect_one);
        assert_eq!(frames[1], expect_two);
        writer.join().unwrap();
    }
}
