//! Opening the byte stream to the daemon.

use crate::error::MpdError;
use std::fmt;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

/// Host used when no host name is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Where the daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A Unix-domain socket path; the port is not used.
    Unix(PathBuf),
    /// A host name (or address literal) and TCP port.
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    /// Interpret a configured host: anything starting with `/` is a socket path.
    pub fn new(hostname_or_path: Option<&str>, port: u16) -> Self {
        match hostname_or_path {
            Some(path) if path.starts_with('/') => Endpoint::Unix(PathBuf::from(path)),
            Some(host) if !host.is_empty() => Endpoint::Tcp {
                host: host.to_string(),
                port,
            },
            _ => Endpoint::Tcp {
                host: DEFAULT_HOST.to_string(),
                port,
            },
        }
    }

    /// Open a stream. No retries happen here.
    pub fn open(&self) -> Result<Transport, MpdError> {
        match self {
            Endpoint::Unix(path) => open_unix(path),
            Endpoint::Tcp { host, port } => open_tcp(host, *port),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
            Endpoint::Tcp { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

// Length of `sockaddr_un::sun_path`, terminating NUL included.
fn max_socket_path_len() -> usize {
    // SAFETY: sockaddr_un is plain old data; all-zero is a valid value.
    let addr: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    addr.sun_path.len()
}

fn open_unix(path: &Path) -> Result<Transport, MpdError> {
    if path.as_os_str().len() + 1 > max_socket_path_len() {
        return Err(MpdError::AddressTooLong {
            path: path.to_path_buf(),
        });
    }
    // std creates the socket with SOCK_CLOEXEC.
    let stream = UnixStream::connect(path).map_err(|source| MpdError::Connect {
        target: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "connected to unix socket");
    Ok(Transport::Unix(stream))
}

fn open_tcp(host: &str, port: u16) -> Result<Transport, MpdError> {
    let candidates = (host, port)
        .to_socket_addrs()
        .map_err(|source| MpdError::Resolution {
            host: host.to_string(),
            port,
            source,
        })?;
    connect_candidates(format!("{host}:{port}"), candidates)
}

/// Try each address in order; the first that accepts wins.
fn connect_candidates(
    target: String,
    addrs: impl IntoIterator<Item = SocketAddr>,
) -> Result<Transport, MpdError> {
    let mut last_error = None;
    for addr in addrs {
        // std creates the socket with SOCK_CLOEXEC.
        match TcpStream::connect(addr) {
            Ok(stream) => {
                tracing::debug!(%addr, "connected to tcp endpoint");
                return Ok(Transport::Tcp(stream));
            }
            Err(err) => {
                tracing::warn!(%addr, error = %err, "(candidate) connect failed");
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(source) => Err(MpdError::Connect { target, source }),
        None => Err(MpdError::NoCandidates { target }),
    }
}

/// An open, bidirectional stream to the daemon.
#[derive(Debug)]
pub enum Transport {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transport::Unix(s) => s.read(buf),
            Transport::Tcp(s) => s.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Transport::Unix(s) => s.write(buf),
            Transport::Tcp(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Transport::Unix(s) => s.flush(),
            Transport::Tcp(s) => s.flush(),
        }
    }
}

impl AsRawFd for Transport {
    fn as_raw_fd(&self) -> RawFd {
        match self {
            Transport::Unix(s) => s.as_raw_fd(),
            Transport::Tcp(s) => s.as_raw_fd(),
        }
    }
}
