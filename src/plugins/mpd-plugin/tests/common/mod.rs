//! Scripted stand-in for an MPD server.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

pub const GREETING: &str = "OK MPD 0.21.0\n";

/// The server side of one accepted connection.
pub struct Peer<S: std::io::Read + Write> {
    reader: BufReader<S>,
    writer: S,
}

impl<S: std::io::Read + Write> Peer<S> {
    /// Assert the next client line equals `line` (newline included).
    pub fn expect(&mut self, line: &str) {
        let mut got = String::new();
        self.reader.read_line(&mut got).unwrap();
        assert_eq!(got, line, "unexpected client command");
    }

    pub fn send(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).unwrap();
        self.writer.flush().unwrap();
    }

    /// Answer `currentsong` and `status` with the given bodies.
    pub fn serve_poll(&mut self, song: &str, status: &str) {
        self.expect("currentsong\n");
        self.send(song);
        self.send("OK\n");
        self.expect("status\n");
        self.send(status);
        self.send("OK\n");
    }
}

pub struct MockUnix {
    pub dir: tempfile::TempDir,
    pub path: PathBuf,
    pub handle: JoinHandle<()>,
}

/// Accept one Unix-domain connection and run `script` against it.
pub fn spawn_unix<F>(script: F) -> MockUnix
where
    F: FnOnce(&mut Peer<UnixStream>) + Send + 'static,
{
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mpd.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut peer = Peer {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        };
        script(&mut peer);
    });
    MockUnix { dir, path, handle }
}

/// Accept one TCP connection on loopback; returns the port.
pub fn spawn_tcp<F>(script: F) -> (u16, JoinHandle<()>)
where
    F: FnOnce(&mut Peer<std::net::TcpStream>) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut peer = Peer {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        };
        script(&mut peer);
    });
    (port, handle)
}
