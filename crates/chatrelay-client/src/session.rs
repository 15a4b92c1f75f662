//! Client session (C7): owns one TCP connection and stdin.
//!
//! `mio` does not portably multiplex standard input alongside a socket, so
//! the "readiness set of exactly two entries" the session needs is modeled
//! with two OS threads sharing one `TcpStream` (split via `try_clone`)
//! instead of a single-threaded `select`/`poll` loop: one thread blocks on
//! `recv_frame` and prints whatever arrives as soon as it decodes, the other
//! blocks on stdin. Neither thread waits on the other, so a CHAT from
//! another user is printed the moment it decodes rather than sitting until
//! the local user next presses Enter.

use std::{
    io::{BufRead, Write, stdin, stdout},
    net::TcpStream,
    thread,
};

use chatrelay_net::{NetError, framing};
use chatrelay_wire::Message;
use crossterm::{ExecutableCommand, cursor, terminal};
use thiserror::Error;
use tracing::debug;

use crate::{
    commands::{self, Input},
    render,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connection error: {0}")]
    Net(#[from] NetError),
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the session to completion. Returns `Ok(())` on `/exit` or stdin EOF.
///
/// The background thread spawned here (see [`receive_loop`]) terminates the
/// whole process directly on a server hang-up or protocol error, per
/// spec.md §4.7 ("`HANGUP` on the server socket terminates the client") —
/// the foreground thread is blocked on stdin and cannot otherwise be woken
/// to notice.
pub fn run(stream: TcpStream) -> Result<(), SessionError> {
    let reader_stream = stream.try_clone()?;
    let mut writer_stream = stream;

    thread::spawn(move || receive_loop(reader_stream));

    let mut out = stdout();
    let mut lines = stdin().lock().lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            break; // stdin closed (EOF): treat like /exit.
        };
        let line = line?;

        clear_prompt_line(&mut out)?;

        match commands::parse(&line) {
            Ok(Input::Exit) => break,
            Ok(Input::Chat(text)) => {
                send(&mut writer_stream, Message::Chat { timestamp: 0, name: String::new(), text })?;
            }
            Ok(Input::SetName(name)) => {
                send(&mut writer_stream, Message::Name { name })?;
            }
            Ok(Input::Join(room_id)) => {
                send(&mut writer_stream, Message::Join { room_id })?;
            }
            Err(err) => println!("{}", render::reply_line(&err.to_string())),
        }
    }

    let _ = writer_stream.shutdown(std::net::Shutdown::Both);
    Ok(())
}

fn send(stream: &mut TcpStream, msg: Message) -> Result<(), SessionError> {
    framing::send_all(stream, &msg.encode()).map_err(SessionError::from)
}

fn clear_prompt_line(out: &mut impl Write) -> std::io::Result<()> {
    out.execute(cursor::MoveUp(1))?;
    out.execute(terminal::Clear(terminal::ClearType::CurrentLine))?;
    Ok(())
}

/// Reads and renders frames as they arrive, printing each straight to
/// stdout rather than queueing it for the foreground thread to flush later.
/// `println!`/`eprintln!` each take the process-wide stdout/stderr lock for
/// the duration of one call, so interleaving with the foreground thread's
/// prompt writes never tears a line.
fn receive_loop(mut stream: TcpStream) {
    loop {
        let frame = match framing::recv_frame(&mut stream) {
            Ok(frame) => frame,
            Err(NetError::Closed) => {
                println!("{}", render::reply_line("disconnected from server"));
                std::process::exit(0);
            }
            Err(err) => {
                eprintln!("connection error: {err}");
                std::process::exit(1);
            }
        };

        match Message::decode(&frame) {
            Ok(Message::Chat { timestamp, name, text }) => {
                println!("{}", render::chat_line(timestamp, &name, &text));
            }
            Ok(Message::Reply { text }) => {
                println!("{}", render::reply_line(&text));
            }
            Ok(other @ (Message::Join { .. } | Message::Name { .. })) => {
                debug!(?other, "server sent a client-only frame type, treating as a protocol error");
                eprintln!("protocol error: server sent a client-only frame type");
                std::process::exit(1);
            }
            Err(err) => {
                eprintln!("protocol error: {err}");
                std::process::exit(1);
            }
        }
    }
}
