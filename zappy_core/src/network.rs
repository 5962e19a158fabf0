//! Line-oriented TCP transport to the Zappy server.
//!
//! Knows about the greeting exchange and newline framing, nothing else.
//! Once the peer goes away the socket is dropped and every later call
//! reports "not connected" through its return value.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use zappy_proto::{GRAPHIC_HANDSHAKE, GREETING};

const READ_CHUNK: usize = 4096;
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest partial line held while waiting for its newline. Anything longer
/// is dropped through its terminator.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("no address found for {host}:{port}")]
    NoAddress { host: String, port: u16 },
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("expected greeting 'WELCOME', got '{0}'")]
    UnexpectedGreeting(String),
    #[error("server closed the connection during handshake")]
    ClosedDuringHandshake,
    #[error("timed out waiting for the server greeting")]
    HandshakeTimeout,
    #[error("failed to send graphic handshake: {0}")]
    HandshakeSend(#[source] io::Error),
    #[error("failed to spawn ingestion thread: {source}")]
    Spawn {
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// `localhost` is pinned to the IPv4 loopback; other hosts pass through.
pub fn resolve_host_alias(host: &str) -> &str {
    if host == "localhost" {
        "127.0.0.1"
    } else {
        host
    }
}

#[derive(Debug)]
pub struct Connection {
    stream: Option<TcpStream>,
    buffer: Vec<u8>,
    // Bytes of `buffer` already known to hold no newline.
    scanned: usize,
    discarding: bool,
    non_blocking: bool,
    peer: Option<SocketAddr>,
}

impl Connection {
    pub fn connect(host: &str, port: u16) -> Result<Self, ConnectionError> {
        Self::connect_with_timeout(host, port, DEFAULT_HANDSHAKE_TIMEOUT)
    }

    /// Connect, wait at most `handshake_timeout` for the greeting and
    /// announce ourselves as a graphic client.
    pub fn connect_with_timeout(
        host: &str,
        port: u16,
        handshake_timeout: Duration,
    ) -> Result<Self, ConnectionError> {
        let host = resolve_host_alias(host);
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|source| ConnectionError::Resolve {
                host: host.to_string(),
                port,
                source,
            })?
            .collect();
        if addrs.is_empty() {
            return Err(ConnectionError::NoAddress {
                host: host.to_string(),
                port,
            });
        }

        let mut last_error = None;
        let mut stream = None;
        for addr in &addrs {
            match TcpStream::connect(addr) {
                Ok(connected) => {
                    stream = Some(connected);
                    break;
                }
                Err(err) => {
                    debug!(target: "zappy::network", addr = %addr, error = %err, "connect.attempt_failed");
                    last_error = Some(err);
                }
            }
        }
        let stream = match (stream, last_error) {
            (Some(stream), _) => stream,
            (None, source) => {
                return Err(ConnectionError::Connect {
                    addr: format!("{}:{}", host, port),
                    source: source.unwrap_or_else(|| io::ErrorKind::NotConnected.into()),
                })
            }
        };

        let mut connection = Self::from_stream(stream);
        connection.handshake(handshake_timeout)?;
        info!(
            target: "zappy::network",
            peer = ?connection.peer,
            "connection.established"
        );
        Ok(connection)
    }

    /// Wrap an already connected stream without performing the handshake.
    pub fn from_stream(stream: TcpStream) -> Self {
        if let Err(err) = stream.set_nodelay(true) {
            warn!(target: "zappy::network", error = %err, "connection.nodelay_failed");
        }
        if let Err(err) = stream.set_write_timeout(Some(DEFAULT_WRITE_TIMEOUT)) {
            warn!(target: "zappy::network", error = %err, "connection.write_timeout_failed");
        }
        let peer = stream.peer_addr().ok();
        Self {
            stream: Some(stream),
            buffer: Vec::new(),
            scanned: 0,
            discarding: false,
            non_blocking: false,
            peer,
        }
    }

    /// Bound on how long a single `send` may block on a peer that stopped
    /// reading. A send that runs out of time closes the connection.
    pub fn set_write_timeout(&mut self, timeout: Duration) -> Result<(), ConnectionError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(())
    }

    pub fn handshake(&mut self, timeout: Duration) -> Result<(), ConnectionError> {
        let result = self.exchange_greeting(timeout);
        if result.is_err() {
            self.close();
        }
        result
    }

    fn exchange_greeting(&mut self, timeout: Duration) -> Result<(), ConnectionError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        stream.set_read_timeout(Some(timeout))?;

        let greeting = loop {
            if let Some(line) = self.take_line() {
                break line;
            }
            match self.fill(false) {
                Ok(0) => return Err(ConnectionError::ClosedDuringHandshake),
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(ConnectionError::HandshakeTimeout)
                }
                Err(err) if is_disconnect(&err) => {
                    return Err(ConnectionError::ClosedDuringHandshake)
                }
                Err(err) => return Err(err.into()),
            }
        };
        if greeting != GREETING {
            return Err(ConnectionError::UnexpectedGreeting(greeting));
        }

        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        stream
            .write_all(GRAPHIC_HANDSHAKE.as_bytes())
            .map_err(ConnectionError::HandshakeSend)?;
        stream.set_read_timeout(None)?;
        Ok(())
    }

    /// Next complete line without its terminator, or an empty string when
    /// nothing is ready (non-blocking) or the peer is gone.
    pub fn recv_line(&mut self, non_blocking: bool) -> String {
        loop {
            if let Some(line) = self.take_line() {
                return line;
            }
            match self.fill(non_blocking) {
                Ok(0) => {
                    self.lost("peer closed");
                    return String::new();
                }
                Ok(_) => {}
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return String::new(),
                Err(err) => {
                    self.on_read_error(&err);
                    return String::new();
                }
            }
        }
    }

    /// Up to `max` raw bytes, buffered ones first.
    pub fn recv_raw(&mut self, max: usize, non_blocking: bool) -> String {
        if self.buffer.is_empty() {
            match self.fill(non_blocking) {
                Ok(0) => {
                    self.lost("peer closed");
                    return String::new();
                }
                Ok(_) => {}
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) =>
                {
                    return String::new()
                }
                Err(err) => {
                    self.on_read_error(&err);
                    return String::new();
                }
            }
        }
        let take = max.min(self.buffer.len());
        let bytes: Vec<u8> = self.buffer.drain(..take).collect();
        self.scanned = self.scanned.saturating_sub(take);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Write the whole line. Returns the byte count, `-1` on failure.
    pub fn send(&mut self, line: &str) -> isize {
        let Some(stream) = self.stream.as_mut() else {
            return -1;
        };
        if self.non_blocking {
            if let Err(err) = stream.set_nonblocking(false) {
                warn!(target: "zappy::network", error = %err, "send.mode_switch_failed");
                return -1;
            }
            self.non_blocking = false;
        }
        match stream.write_all(line.as_bytes()).and_then(|_| stream.flush()) {
            Ok(()) => line.len() as isize,
            Err(err) => {
                if is_disconnect(&err) {
                    self.lost("write failed");
                } else if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) {
                    // A partial write leaves the stream mid-line.
                    warn!(target: "zappy::network", peer = ?self.peer, "send.timed_out");
                    self.close();
                } else {
                    warn!(target: "zappy::network", error = %err, "send.failed");
                }
                -1
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.buffer.clear();
        self.scanned = 0;
        self.discarding = false;
    }

    fn take_line(&mut self) -> Option<String> {
        loop {
            let Some(offset) = self.buffer[self.scanned..]
                .iter()
                .position(|byte| *byte == b'\n')
            else {
                self.hold_partial_line();
                return None;
            };
            let end = self.scanned + offset;
            let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
            self.scanned = 0;
            if self.discarding {
                self.discarding = false;
                continue;
            }
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            return Some(String::from_utf8_lossy(&line).into_owned());
        }
    }

    fn hold_partial_line(&mut self) {
        if self.discarding {
            self.buffer.clear();
        } else if self.buffer.len() > MAX_LINE_BYTES {
            warn!(
                target: "zappy::network",
                dropped = self.buffer.len(),
                "recv.line_too_long"
            );
            self.buffer.clear();
            self.discarding = true;
        }
        self.scanned = self.buffer.len();
    }

    fn fill(&mut self, non_blocking: bool) -> io::Result<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))?;
        if self.non_blocking != non_blocking {
            stream.set_nonblocking(non_blocking)?;
            self.non_blocking = non_blocking;
        }
        let mut chunk = [0u8; READ_CHUNK];
        let read = stream.read(&mut chunk)?;
        self.buffer.extend_from_slice(&chunk[..read]);
        Ok(read)
    }

    fn on_read_error(&mut self, err: &io::Error) {
        if is_disconnect(err) {
            self.lost("reset");
        } else if self.stream.is_some() {
            warn!(target: "zappy::network", error = %err, "recv.failed");
            self.close();
        }
    }

    fn lost(&mut self, reason: &'static str) {
        if self.stream.is_some() {
            info!(target: "zappy::network", peer = ?self.peer, reason, "connection.lost");
        }
        self.close();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread;

    fn serve<F>(handler: F) -> (u16, thread::JoinHandle<()>)
    where
        F: FnOnce(TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handler(stream);
        });
        (port, handle)
    }

    fn read_request(stream: &TcpStream) -> String {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        line
    }

    fn detached() -> Connection {
        Connection {
            stream: None,
            buffer: Vec::new(),
            scanned: 0,
            discarding: false,
            non_blocking: false,
            peer: None,
        }
    }

    #[test]
    fn localhost_is_pinned_to_loopback() {
        assert_eq!(resolve_host_alias("localhost"), "127.0.0.1");
        assert_eq!(resolve_host_alias("10.0.0.2"), "10.0.0.2");
    }

    #[test]
    fn handshake_sends_graphic_after_welcome() {
        let (port, server) = serve(|mut stream| {
            stream.write_all(b"WELCOME\n").unwrap();
            assert_eq!(read_request(&stream), "GRAPHIC\n");
        });
        let connection = Connection::connect("localhost", port).unwrap();
        assert!(connection.is_connected());
        server.join().unwrap();
    }

    #[test]
    fn wrong_greeting_is_refused() {
        let (port, server) = serve(|mut stream| {
            stream.write_all(b"HELLO\n").unwrap();
        });
        let err = Connection::connect("127.0.0.1", port).unwrap_err();
        assert!(matches!(err, ConnectionError::UnexpectedGreeting(text) if text == "HELLO"));
        server.join().unwrap();
    }

    #[test]
    fn silent_server_times_out() {
        let (port, server) = serve(|stream| {
            thread::sleep(Duration::from_millis(300));
            drop(stream);
        });
        let err = Connection::connect_with_timeout("127.0.0.1", port, Duration::from_millis(50))
            .unwrap_err();
        assert!(matches!(err, ConnectionError::HandshakeTimeout));
        server.join().unwrap();
    }

    #[test]
    fn lines_are_split_and_partial_lines_wait() {
        let (port, server) = serve(|mut stream| {
            stream.write_all(b"WELCOME\n").unwrap();
            read_request(&stream);
            stream.write_all(b"msz 3 3\r\nsgt 100\nbct 0").unwrap();
            thread::sleep(Duration::from_millis(100));
            stream.write_all(b" 0 1 2 3 4 5 6 7\n").unwrap();
        });
        let mut connection = Connection::connect("127.0.0.1", port).unwrap();
        assert_eq!(connection.recv_line(false), "msz 3 3");
        assert_eq!(connection.recv_line(false), "sgt 100");
        assert_eq!(connection.recv_line(false), "bct 0 0 1 2 3 4 5 6 7");
        server.join().unwrap();
    }

    #[test]
    fn peer_close_disconnects_and_later_calls_fail_softly() {
        let (port, server) = serve(|mut stream| {
            stream.write_all(b"WELCOME\n").unwrap();
            read_request(&stream);
        });
        let mut connection = Connection::connect("127.0.0.1", port).unwrap();
        server.join().unwrap();

        assert_eq!(connection.recv_line(false), "");
        assert!(!connection.is_connected());
        assert_eq!(connection.recv_line(true), "");
        assert_eq!(connection.recv_raw(16, true), "");
        assert_eq!(connection.send("msz\n"), -1);
    }

    #[test]
    fn raw_reads_drain_buffer_first() {
        let (port, server) = serve(|mut stream| {
            stream.write_all(b"WELCOME\n").unwrap();
            read_request(&stream);
            stream.write_all(b"abcdef").unwrap();
            thread::sleep(Duration::from_millis(100));
        });
        let mut connection = Connection::connect("127.0.0.1", port).unwrap();
        assert_eq!(connection.recv_raw(4, false), "abcd");
        assert_eq!(connection.recv_raw(4, false), "ef");
        server.join().unwrap();
    }

    #[test]
    fn send_reports_byte_count() {
        let (port, server) = serve(|mut stream| {
            stream.write_all(b"WELCOME\n").unwrap();
            read_request(&stream);
            assert_eq!(read_request(&stream), "sst 40\n");
        });
        let mut connection = Connection::connect("127.0.0.1", port).unwrap();
        assert_eq!(connection.recv_line(true), "");
        assert_eq!(connection.send("sst 40\n"), 7);
        server.join().unwrap();
    }

    #[test]
    fn partial_lines_are_scanned_once() {
        let mut connection = detached();
        connection.buffer.extend_from_slice(b"msz 3");
        assert_eq!(connection.take_line(), None);
        assert_eq!(connection.scanned, 5);
        connection.buffer.extend_from_slice(b" 3\nsgt");
        assert_eq!(connection.take_line().as_deref(), Some("msz 3 3"));
        assert_eq!(connection.take_line(), None);
        assert_eq!(connection.scanned, 3);
        connection.buffer.extend_from_slice(b" 9\n");
        assert_eq!(connection.take_line().as_deref(), Some("sgt 9"));
        assert_eq!(connection.scanned, 0);
    }

    #[test]
    fn overlong_line_is_dropped_through_its_newline() {
        let mut connection = detached();
        connection.buffer.resize(MAX_LINE_BYTES + 1, b'x');
        assert_eq!(connection.take_line(), None);
        assert!(connection.buffer.is_empty());

        connection.buffer.extend_from_slice(b"xxxx");
        assert_eq!(connection.take_line(), None);
        assert!(connection.buffer.is_empty());

        connection.buffer.extend_from_slice(b"xx\nsgt 7\n");
        assert_eq!(connection.take_line().as_deref(), Some("sgt 7"));
        assert_eq!(connection.take_line(), None);
    }

    #[test]
    fn unterminated_flood_keeps_buffer_bounded() {
        let (port, server) = serve(|mut stream| {
            stream.write_all(b"WELCOME\n").unwrap();
            read_request(&stream);
            let flood = vec![b'x'; 4 * 1024 * 1024];
            stream.write_all(&flood).unwrap();
            stream.write_all(b"\nsgt 7\n").unwrap();
        });
        let mut connection = Connection::connect("127.0.0.1", port).unwrap();
        assert_eq!(connection.recv_line(false), "sgt 7");
        assert!(connection.buffer.len() <= MAX_LINE_BYTES + READ_CHUNK);
        server.join().unwrap();
    }

    #[test]
    fn stalled_reader_times_out_send_and_disconnects() {
        let (release, held) = std::sync::mpsc::channel::<()>();
        let (port, server) = serve(move |mut stream| {
            stream.write_all(b"WELCOME\n").unwrap();
            read_request(&stream);
            let _ = held.recv();
        });
        let mut connection = Connection::connect("127.0.0.1", port).unwrap();
        connection
            .set_write_timeout(Duration::from_millis(50))
            .unwrap();

        let chunk = "x".repeat(1024 * 1024);
        let mut result = 0;
        for _ in 0..256 {
            result = connection.send(&chunk);
            if result < 0 {
                break;
            }
        }
        assert_eq!(result, -1);
        assert!(!connection.is_connected());
        release.send(()).unwrap();
        server.join().unwrap();
    }
}
