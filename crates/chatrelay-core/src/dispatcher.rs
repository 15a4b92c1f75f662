//! The server dispatcher (C6): the single logical executor that owns the
//! connection set, the room registry and the user registry, and applies
//! every state transition described by an incoming frame or a hang-up.
//!
//! Modeled on the accept/read/dispatch shape of `flux-network`'s
//! `ConnectionManager::poll_with` (ready events collected, then handled by
//! token rather than by index — this is what keeps the swap-with-last
//! deletion in `Multiplexer`/`RoomRegistry` safe to use while iterating).

use std::{
    collections::HashMap,
    io,
    net::SocketAddr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use chatrelay_net::{FrameReader, Multiplexer, NetError, RxOutcome, framing};
use chatrelay_utils::safe_panic;
use chatrelay_wire::Message;
use mio::Token;
use tracing::{info, warn};

use crate::{
    room::{RoomError, RoomRegistry},
    types::{INVALID_ROOM, RoomId, UserId},
    user::UserRegistry,
};

pub struct Dispatcher {
    mux: Multiplexer,
    rooms: RoomRegistry,
    users: UserRegistry,
    readers: HashMap<UserId, FrameReader>,
    listener_token: Token,
}

impl Dispatcher {
    /// Binds the listener and provisions `NUM_ROOMS` rooms at the default
    /// capacity. Bind/listen failure is fatal to the process (the caller
    /// should propagate it).
    pub fn bind(addr: SocketAddr) -> io::Result<Self> {
        Self::bind_with(addr, crate::types::NUM_ROOMS, crate::types::MAX_USERS_PER_ROOM)
    }

    /// Like [`Dispatcher::bind`] but with an overridden room count and
    /// per-room capacity, for the server binary's `--rooms`/`--room-capacity`
    /// flags.
    pub fn bind_with(addr: SocketAddr, num_rooms: u8, room_capacity: usize) -> io::Result<Self> {
        let mut mux = Multiplexer::new()?;
        let listener_token = mux.listen(addr)?;
        Ok(Self {
            mux,
            rooms: RoomRegistry::with_capacity(num_rooms, room_capacity),
            users: UserRegistry::new(),
            readers: HashMap::new(),
            listener_token,
        })
    }

    /// Runs the event loop forever. Only returns on a fatal error (a closed
    /// or errored listener) — per-client errors are handled inline and never
    /// propagate here.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.step(None)?;
        }
    }

    /// Blocks for one `wait_ready`, then dispatches every ready event.
    /// Exposed separately from [`Dispatcher::run`] so tests (and an embedder
    /// that wants its own loop) can drive one iteration at a time.
    pub fn step(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let ready = self.mux.wait_ready(timeout)?;
        for ev in ready {
            if ev.token == self.listener_token {
                if ev.hangup {
                    return Err(io::Error::other("listener socket hung up"));
                }
                if ev.readable {
                    self.accept_new_connections();
                }
                continue;
            }

            // Hang-up pre-empts any pending readable dispatch for this entry.
            if ev.hangup {
                self.terminate_connection(ev.token);
                continue;
            }
            if ev.readable {
                self.drain_readable(ev.token);
            }
        }
        Ok(())
    }

    fn accept_new_connections(&mut self) {
        loop {
            match self.mux.accept(self.listener_token) {
                Ok(Some((token, addr))) => {
                    if self.users.add(token).is_err() {
                        safe_panic!("mio handed out a duplicate token {token:?}");
                        self.mux.delete(token);
                        continue;
                    }
                    self.readers.insert(token, FrameReader::new());
                    info!(?token, %addr, "accepted connection");
                }
                Ok(None) => return,
                Err(err) => {
                    warn!(%err, "accept failed");
                    return;
                }
            }
        }
    }

    /// Drains every frame currently buffered for `token`. `mio`'s epoll
    /// backend is edge-triggered, so a single readable notification can
    /// carry more than one frame; looping until `Pending` is required, not
    /// an optimization.
    fn drain_readable(&mut self, token: Token) {
        loop {
            let outcome = {
                let Some(reader) = self.readers.get_mut(&token) else { return };
                let Some(stream) = self.mux.stream_mut(token) else { return };
                reader.poll(stream)
            };
            match outcome {
                Ok(RxOutcome::Frame(frame)) => self.handle_frame(token, &frame),
                Ok(RxOutcome::Pending) => return,
                Err(NetError::Closed) => {
                    self.terminate_connection(token);
                    return;
                }
                Err(err) => {
                    warn!(?token, %err, "io error reading frame, terminating connection");
                    self.terminate_connection(token);
                    return;
                }
            }
        }
    }

    fn handle_frame(&mut self, uid: UserId, frame: &[u8]) {
        match Message::decode(frame) {
            Ok(Message::Chat { text, .. }) => self.handle_chat(uid, text),
            Ok(Message::Name { name }) => self.handle_name(uid, name),
            Ok(Message::Join { room_id }) => self.handle_join(uid, room_id),
            Ok(Message::Reply { .. }) => {
                warn!(?uid, "client sent a server-only REPLY frame, terminating");
                self.terminate_connection(uid);
            }
            Err(err) => {
                warn!(?uid, %err, "malformed frame, terminating connection");
                self.terminate_connection(uid);
            }
        }
    }

    /// `CHAT` client→server: the client's `timestamp`/`name` fields are
    /// discarded and replaced with the server's clock and the user's
    /// current registered name before rebroadcast.
    fn handle_chat(&mut self, uid: UserId, text: String) {
        let Ok(user) = self.users.find(uid) else { return };
        if user.room == INVALID_ROOM {
            self.send_reply(
                uid,
                "you are not in a chat room: type '/join [room number]' to join a room",
            );
            return;
        }

        let room_id = user.room;
        let name = user.name.clone();
        let timestamp = now_unix_seconds();
        let frame = Message::Chat { timestamp, name, text }.encode();
        self.broadcast(room_id, &frame);
    }

    fn handle_name(&mut self, uid: UserId, name: String) {
        let Ok(user) = self.users.find_mut(uid) else { return };
        user.name = name.clone();
        self.send_reply(uid, &format!("set name to {name}"));
    }

    fn handle_join(&mut self, uid: UserId, room_id: RoomId) {
        if self.rooms.get(room_id).is_err() {
            self.send_reply(uid, &format!("room {room_id} does not exist"));
            return;
        }

        let Ok(current_user) = self.users.find(uid) else { return };
        let current_room = current_user.room;

        if current_room == room_id {
            self.send_reply(uid, &format!("you are already in room {room_id}"));
            return;
        }

        if current_room != INVALID_ROOM {
            let _ = self.rooms.remove_user(current_room, uid);
            if let Ok(user) = self.users.find_mut(uid) {
                user.room = INVALID_ROOM;
            }
        }

        match self.rooms.add_user(room_id, uid) {
            Ok(()) => {
                if let Ok(user) = self.users.find_mut(uid) {
                    user.room = room_id;
                }
                self.send_reply(uid, &format!("you have joined room {room_id}"));
            }
            Err(RoomError::Full(_)) => {
                self.send_reply(uid, &format!("room {room_id} is full"));
            }
            Err(_) => {}
        }
    }

    /// Encodes once and sends to every current member of `room_id`. On a
    /// send failure to any recipient, that recipient's connection is
    /// terminated and the remaining recipients are skipped for this
    /// message — recipients already served keep their delivery; there is no
    /// rollback.
    fn broadcast(&mut self, room_id: RoomId, frame: &[u8]) {
        let Ok(room) = self.rooms.get(room_id) else { return };
        let members = room.members().to_vec();
        for uid in members {
            let Some(stream) = self.mux.stream_mut(uid) else { continue };
            if let Err(err) = framing::send_all(stream, frame) {
                warn!(?uid, %err, "send failed mid-broadcast, aborting remaining recipients");
                self.terminate_connection(uid);
                return;
            }
        }
    }

    fn send_reply(&mut self, uid: UserId, text: &str) {
        let frame = Message::Reply { text: text.to_string() }.encode();
        let Some(stream) = self.mux.stream_mut(uid) else { return };
        if let Err(err) = framing::send_all(stream, &frame) {
            warn!(?uid, %err, "reply send failed");
            self.terminate_connection(uid);
        }
    }

    /// `C3.delete` + `C4.remove_user` (if in a room) + `C5.delete`, in that
    /// order, matching the termination handler in §4.6.
    fn terminate_connection(&mut self, uid: UserId) {
        self.readers.remove(&uid);
        if let Ok(user) = self.users.find(uid)
            && user.room != INVALID_ROOM
        {
            let _ = self.rooms.remove_user(user.room, uid);
        }
        let _ = self.users.delete(uid);
        self.mux.delete(uid);
        info!(?uid, "connection terminated");
    }

    pub fn room_members(&self, room_id: RoomId) -> Vec<UserId> {
        self.rooms.get(room_id).map(|r| r.members().to_vec()).unwrap_or_default()
    }

    pub fn user_room(&self, uid: UserId) -> Option<RoomId> {
        self.users.find(uid).ok().map(|u| u.room)
    }

    pub fn user_name(&self, uid: UserId) -> Option<String> {
        self.users.find(uid).ok().map(|u| u.name.clone())
    }

    pub fn contains_connection(&self, uid: UserId) -> bool {
        self.mux.contains(uid)
    }

    pub fn listener_addr(&self) -> io::Result<SocketAddr> {
        self.mux.local_addr(self.listener_token)
    }
}

fn now_unix_seconds() -> u32 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as u32).unwrap_or(0)
}
