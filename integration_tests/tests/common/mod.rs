#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::Once;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use zappy_core::{load_spectator_config_from_env, SpectatorConfig};

static INIT: Once = Once::new();

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("test_spectator_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test spectator config at {}",
            config_path.display()
        );

        std::env::set_var("ZAPPY_SPECTATOR_CONFIG_PATH", &config_path);
    });
}

pub fn test_config() -> SpectatorConfig {
    ensure_test_config();
    let (config, path) = load_spectator_config_from_env();
    debug_assert!(path.is_some(), "test config was not picked up");
    config
}

/// In-process stand-in for a Zappy server accepting one spectator.
pub struct FakeServer {
    listener: TcpListener,
    port: u16,
}

impl FakeServer {
    pub fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").context("bind fake server")?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Accept on a background thread, greet with `greeting` and, when the
    /// greeting is the real one, expect the graphic handshake back.
    pub fn accept_with_greeting(self, greeting: &'static str) -> JoinHandle<Result<Peer>> {
        thread::spawn(move || {
            let (stream, _) = self.listener.accept().context("accept spectator")?;
            let mut peer = Peer::new(stream)?;
            peer.send_line(greeting)?;
            if greeting == "WELCOME" {
                let handshake = peer.read_line()?;
                ensure!(handshake == "GRAPHIC", "unexpected handshake {handshake:?}");
            }
            Ok(peer)
        })
    }

    pub fn accept_spectator(self) -> JoinHandle<Result<Peer>> {
        self.accept_with_greeting("WELCOME")
    }
}

pub struct Peer {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl Peer {
    fn new(stream: TcpStream) -> Result<Self> {
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self { stream, reader })
    }

    pub fn send_line(&mut self, line: &str) -> Result<()> {
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\n")?;
        Ok(())
    }

    pub fn send_lines(&mut self, lines: &[&str]) -> Result<()> {
        let mut payload = lines.join("\n");
        payload.push('\n');
        self.stream.write_all(payload.as_bytes())?;
        Ok(())
    }

    pub fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        self.reader.read_line(&mut line).context("read from spectator")?;
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
    }
}

pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}
