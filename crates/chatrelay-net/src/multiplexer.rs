//! Readiness multiplexer (C3): a dynamic, indexable set of connections
//! watched for readability/hangup via `mio`.
//!
//! The connection set is a `Vec<(Token, Handle)>`, deleted from by
//! swap-remove — the same shape as the teacher's `ConnectionManager::conns`.
//! Callers that iterate a `wait_ready` snapshot and apply deletions
//! afterwards (as `chatrelay-core`'s dispatcher does) never have to worry
//! about the swap-with-last-rewrites-the-current-index pitfall described in
//! the source design notes.

use std::{io, net::SocketAddr, time::Duration};

use mio::{Events, Interest, Poll, Token, net::TcpListener, net::TcpStream};
use tracing::{debug, warn};

/// One registered connection: either a listener awaiting `accept()` or an
/// established stream.
pub enum Handle {
    Listener(TcpListener),
    Stream(TcpStream),
}

/// Readiness reported for one entry by [`Multiplexer::wait_ready`].
///
/// `hangup` must be checked before `readable` by the caller — termination
/// pre-empts any pending readable dispatch (spec invariant).
#[derive(Debug, Clone, Copy)]
pub struct Ready {
    pub token: Token,
    pub readable: bool,
    pub hangup: bool,
}

/// Dynamic set of connections multiplexed with a single `mio::Poll`.
pub struct Multiplexer {
    poll: Poll,
    events: Events,
    entries: Vec<(Token, Handle)>,
    next_token: usize,
}

impl Multiplexer {
    const INITIAL_CAPACITY: usize = 5;

    pub fn new() -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(128),
            entries: Vec::with_capacity(Self::INITIAL_CAPACITY),
            next_token: 0,
        })
    }

    fn alloc_token(&mut self) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        token
    }

    /// Binds and registers a listening socket for `READABLE` events.
    pub fn listen(&mut self, addr: SocketAddr) -> io::Result<Token> {
        let mut listener = TcpListener::bind(addr)?;
        let token = self.alloc_token();
        self.poll.registry().register(&mut listener, token, Interest::READABLE)?;
        self.entries.push((token, Handle::Listener(listener)));
        debug!(%addr, ?token, "listening");
        Ok(token)
    }

    /// Registers an already-connected stream for `READABLE` events.
    pub fn append_stream(&mut self, mut stream: TcpStream) -> io::Result<Token> {
        let token = self.alloc_token();
        self.poll.registry().register(&mut stream, token, Interest::READABLE)?;
        self.entries.push((token, Handle::Stream(stream)));
        Ok(token)
    }

    /// Accepts one pending connection on the listener at `listener_token`
    /// and registers it. Returns `Ok(None)` if nothing was pending.
    pub fn accept(&mut self, listener_token: Token) -> io::Result<Option<(Token, SocketAddr)>> {
        let idx = self
            .entries
            .iter()
            .position(|(t, _)| *t == listener_token)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "unknown listener token"))?;

        let Handle::Listener(listener) = &mut self.entries[idx].1 else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "token is not a listener"));
        };

        match listener.accept() {
            Ok((stream, addr)) => {
                stream.set_nodelay(true)?;
                let token = self.append_stream(stream)?;
                Ok(Some((token, addr)))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Removes and deregisters the entry for `token`, if present.
    pub fn delete(&mut self, token: Token) -> Option<Handle> {
        let idx = self.entries.iter().position(|(t, _)| *t == token)?;
        let (_, mut handle) = self.entries.swap_remove(idx);
        let result = match &mut handle {
            Handle::Listener(l) => self.poll.registry().deregister(l),
            Handle::Stream(s) => self.poll.registry().deregister(s),
        };
        if let Err(err) = result {
            warn!(?token, ?err, "deregister failed (socket likely already closed)");
        }
        Some(handle)
    }

    pub fn stream_mut(&mut self, token: Token) -> Option<&mut TcpStream> {
        self.entries.iter_mut().find(|(t, _)| *t == token).and_then(|(_, h)| match h {
            Handle::Stream(s) => Some(s),
            Handle::Listener(_) => None,
        })
    }

    pub fn contains(&self, token: Token) -> bool {
        self.entries.iter().any(|(t, _)| *t == token)
    }

    /// Local address of the listener or stream registered at `token`. Chiefly
    /// useful for recovering the OS-assigned port after binding to port 0.
    pub fn local_addr(&self, token: Token) -> io::Result<SocketAddr> {
        let (_, handle) = self
            .entries
            .iter()
            .find(|(t, _)| *t == token)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "unknown token"))?;
        match handle {
            Handle::Listener(l) => l.local_addr(),
            Handle::Stream(s) => s.local_addr(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Blocks until at least one entry is readable or has hung up, then
    /// returns a snapshot of readiness per entry. `timeout: None` blocks
    /// indefinitely.
    pub fn wait_ready(&mut self, timeout: Option<Duration>) -> io::Result<Vec<Ready>> {
        self.poll.poll(&mut self.events, timeout)?;
        Ok(self
            .events
            .iter()
            .map(|e| Ready {
                token: e.token(),
                readable: e.is_readable(),
                hangup: e.is_read_closed() || e.is_write_closed() || e.is_error(),
            })
            .collect())
    }
}
