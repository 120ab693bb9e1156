use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

const RECV_CHUNK_SIZE: usize = 256;
const ACCEPT_POLL_SLICE: Duration = Duration::from_millis(25);

/// Unix domain socket transport.
///
/// The local development and test harness: stands in for the BLE shell so
/// the controller and the emulator can run against each other on one
/// machine.
pub struct SocketTransport {
    stream: UnixStream,
}

impl SocketTransport {
    /// Connect to a listening socket (blocking).
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, "connected to unix domain socket");
        Ok(Self { stream })
    }

    fn from_stream(stream: UnixStream) -> Self {
        Self { stream }
    }
}

impl Transport for SocketTransport {
    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.stream.write_all(frame)?;
        self.stream.flush()?;
        Ok(())
    }

    fn recv(&mut self, window: Duration) -> Result<Option<Vec<u8>>> {
        // A zero timeout means "no timeout" to the socket layer; clamp up.
        let window = window.max(Duration::from_millis(1));
        self.stream.set_read_timeout(Some(window))?;

        let mut chunk = [0u8; RECV_CHUNK_SIZE];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => return Ok(Some(chunk[..n].to_vec())),
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock
                        || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(None);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl std::fmt::Debug for SocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketTransport")
            .field("type", &"unix")
            .finish()
    }
}

/// Listening side of the socket harness, used by the emulator serving loop.
pub struct SocketListener {
    listener: UnixListener,
    path: PathBuf,
}

impl SocketListener {
    /// Bind and listen on a filesystem-path Unix domain socket.
    ///
    /// If the path already exists and is a socket, it is removed first
    /// (stale socket cleanup). A non-socket file at the path is never
    /// removed.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(|e| TransportError::Bind {
                path: path.clone(),
                source: e,
            })?;
            if metadata.file_type().is_socket() {
                debug!(?path, "removing stale socket");
                std::fs::remove_file(&path).map_err(|e| TransportError::Bind {
                    path: path.clone(),
                    source: e,
                })?;
            } else {
                return Err(TransportError::Bind {
                    path: path.clone(),
                    source: std::io::Error::new(
                        ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                });
            }
        }

        let listener = UnixListener::bind(&path).map_err(|e| TransportError::Bind {
            path: path.clone(),
            source: e,
        })?;

        info!(?path, "listening on unix domain socket");
        Ok(Self { listener, path })
    }

    /// Accept one incoming connection (blocking).
    pub fn accept(&self) -> Result<SocketTransport> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!("accepted connection");
        Ok(SocketTransport::from_stream(stream))
    }

    /// Wait up to `window` for an incoming connection.
    ///
    /// Returns `Ok(None)` when the window elapses with no connection,
    /// letting a serving loop interleave accept waits with shutdown
    /// checks instead of blocking indefinitely.
    pub fn accept_within(&self, window: Duration) -> Result<Option<SocketTransport>> {
        self.listener
            .set_nonblocking(true)
            .map_err(TransportError::Accept)?;
        let deadline = Instant::now() + window;
        loop {
            match self.listener.accept() {
                Ok((stream, _addr)) => {
                    self.listener
                        .set_nonblocking(false)
                        .map_err(TransportError::Accept)?;
                    stream
                        .set_nonblocking(false)
                        .map_err(TransportError::Accept)?;
                    debug!("accepted connection");
                    return Ok(Some(SocketTransport::from_stream(stream)));
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    std::thread::sleep(ACCEPT_POLL_SLICE.min(deadline - now));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Accept(err)),
            }
        }
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SocketListener {
    fn drop(&mut self) {
        if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
            if metadata.file_type().is_socket() {
                debug!(path = ?self.path, "cleaning up socket file");
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }
}
