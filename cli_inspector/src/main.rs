use std::sync::mpsc::{self, Sender};

use clap::{ArgAction, Parser};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::info;
use zappy_core::{load_spectator_config_from_env, Session};

mod app;
mod ui;

use app::InspectorApp;

#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Terminal spectator for a Zappy server",
    long_about = None,
    disable_help_flag = true
)]
struct Cli {
    /// Port of the Zappy server.
    #[arg(short = 'p', long)]
    port: u16,
    /// Host name or address of the Zappy server.
    #[arg(short = 'h', long, default_value = "localhost")]
    host: String,
    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let (log_tx, log_rx) = mpsc::channel::<String>();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_writer(move || ChannelWriter {
            sender: log_tx.clone(),
        })
        .init();

    let cli = Cli::parse();
    let (config, _) = load_spectator_config_from_env();
    info!(host = %cli.host, port = cli.port, "inspector.connecting");

    let session = Session::connect(&cli.host, cli.port, &config)
        .wrap_err_with(|| format!("could not reach {}:{}", cli.host, cli.port))?;

    let peer = format!("{}:{}", cli.host, cli.port);
    let app = InspectorApp::new(session, peer, log_rx)?;
    app.run()
}
