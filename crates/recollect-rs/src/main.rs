use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use recollect_rs::core::{ChatService, Credentials};
use recollect_rs::server::{AppState, serve};
use recollect_rs::{TerminalTransport, config_options, init_logging, load_config};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "recollect", version, about = "Memory-augmented chat")]
struct Cli {
    /// Config file applied over the user and working-directory layers.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web chat UI.
    Serve {
        /// Listen address, overriding `server.bind`.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Chat in the terminal.
    Chat {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = match cli.command {
        Command::Serve { .. } => "info",
        Command::Chat { .. } => "warn",
    };
    init_logging(default_filter);

    let cwd = std::env::current_dir().context("failed to read working directory")?;
    let config = load_config(config_options(&cwd, cli.config)).context("failed to load config")?;
    let service = Arc::new(ChatService::from_config(&config)?);

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let addr: SocketAddr = bind
                .parse()
                .with_context(|| format!("invalid bind address: {bind}"))?;
            serve(Arc::new(AppState::new(service)), addr).await?;
        }
        Command::Chat { username, password } => {
            let credentials = match (username, password) {
                (Some(username), Some(password)) => Some(Credentials::new(username, password)),
                (None, None) => None,
                _ => bail!("--username and --password must be given together"),
            };
            chat(service, credentials).await?;
        }
    }
    Ok(())
}

async fn chat(service: Arc<ChatService>, credentials: Option<Credentials>) -> Result<()> {
    let session = service
        .open_session(credentials)
        .await
        .context("failed to open session")?;
    info!(
        "terminal session opened (session_id={}, namespace={})",
        session.id(),
        session.namespace()
    );
    println!("Connected as {}. Type /quit to exit.", session.namespace());

    let transport = TerminalTransport::stdout();
    let mut pending = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }
        let outcome = service.send_message(session.id(), line, &transport).await?;
        pending.extend(outcome.memory_write);
        pending.retain(|handle| !handle.is_finished());
    }
    for handle in pending {
        let _ = handle.await;
    }
    service.close_session(session.id());
    Ok(())
}
