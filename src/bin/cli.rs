//! Chainmesh CLI application

use anyhow::{Context, Result};
use chainmesh::{
    crypto::PrivateKey, query_top_nodes, DiscoveryConfig, KeyPair, KeyType, Message,
    MessageType, Node, NodeConfig, SignedSubmission, Tracker,
};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpStream;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "chainmesh-cli")]
#[command(about = "A peer-to-peer proof-of-work ledger with tracker-based discovery")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tracker
    Tracker {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: SocketAddr,
    },
    /// Run a node
    Node {
        /// Peer-to-peer listen address (port 0 picks a free port)
        #[arg(long, default_value = "0.0.0.0:9000")]
        p2p_addr: SocketAddr,

        /// Application listen address
        #[arg(long, default_value = "127.0.0.1:5000")]
        app_addr: SocketAddr,

        /// Tracker to register with
        #[arg(long, default_value = "127.0.0.1:8000")]
        tracker_addr: SocketAddr,

        /// Chain length reporting interval
        #[arg(long, default_value_t = 1000)]
        heartbeat_interval_ms: u64,

        /// Leading zero hex digits required of block hashes
        #[arg(long, default_value_t = 4)]
        difficulty: usize,

        /// Name used in logs
        #[arg(long, default_value = "node")]
        name: String,

        /// Relay blocks without mining
        #[arg(long)]
        no_mining: bool,

        /// JSON discovery configuration; replaces the address and heartbeat flags
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Ask a tracker for the nodes with the longest chains
    Top {
        #[arg(long, default_value = "127.0.0.1:8000")]
        tracker_addr: SocketAddr,

        /// Number of nodes; all when omitted
        #[arg(short)]
        k: Option<u32>,
    },
    /// Generate a new keypair
    Keygen {
        #[arg(long, default_value = "ed25519")]
        key_type: KeyType,
    },
    /// Sign data and submit it to a node's application listener
    Submit {
        #[arg(long, default_value = "127.0.0.1:5000")]
        app_addr: SocketAddr,

        /// Hex private key; a throwaway key is generated when omitted
        #[arg(long)]
        key: Option<String>,

        #[arg(long, default_value = "ed25519")]
        key_type: KeyType,

        /// Payload to sign
        data: String,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Tracker { addr } => {
            let mut tracker = Tracker::bind(addr).await?;
            info!("Tracker listening on {}", tracker.local_addr());
            wait_for_ctrl_c().await?;
            tracker.stop().await;
        },
        Commands::Node {
            p2p_addr,
            app_addr,
            tracker_addr,
            heartbeat_interval_ms,
            difficulty,
            name,
            no_mining,
            config,
        } => {
            let discovery = match config {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("reading {}", path.display()))?;
                    serde_json::from_str::<DiscoveryConfig>(&raw)
                        .with_context(|| format!("parsing {}", path.display()))?
                },
                None => DiscoveryConfig {
                    listen_addr: p2p_addr,
                    tracker_addr,
                    heartbeat_interval_ms,
                    ..DiscoveryConfig::default()
                },
            };

            let mut node = Node::builder()
                .with_config(NodeConfig {
                    name,
                    difficulty,
                    mining_enabled: !no_mining,
                    app_addr: Some(app_addr),
                })
                .discovery(discovery)
                .build()?;
            node.start().await?;
            info!(
                "Node {} started: app {:?}, p2p {:?}",
                node.name(),
                node.app_addr(),
                node.p2p_addr()
            );

            wait_for_ctrl_c().await?;
            info!("Shutting down node...");
            node.stop().await?;
        },
        Commands::Top { tracker_addr, k } => {
            for addr in query_top_nodes(tracker_addr, k).await? {
                println!("{addr}");
            }
        },
        Commands::Keygen { key_type } => {
            let pair = KeyPair::generate(key_type);
            println!("Generated new keypair:");
            println!("Private key: {}", pair.private_key().to_hex());
            println!("Public key: {}", pair.public_key().to_hex());
        },
        Commands::Submit {
            app_addr,
            key,
            key_type,
            data,
        } => {
            let pair = match key {
                Some(hex) => KeyPair::from_private_key(PrivateKey::from_hex(&hex, key_type)?),
                None => KeyPair::generate(key_type),
            };
            let submission = SignedSubmission::sign(&pair, data.into_bytes())?;
            let mut stream = TcpStream::connect(app_addr)
                .await
                .with_context(|| format!("connecting to {app_addr}"))?;
            submission.to_app_message().write_to(&mut stream).await?;

            Message::new(MessageType::PullRequest, Vec::new())
                .write_to(&mut stream)
                .await?;
            let reply = Message::read_from(&mut stream).await?;
            if reply.kind() != Some(MessageType::Chain) {
                anyhow::bail!("unexpected reply tag {:?}", reply.tag() as char);
            }
            let chain = chainmesh::Blockchain::decode(reply.payload(), 0)
                .with_context(|| format!("decoding chain from {app_addr}"))?;
            println!("Submitted; node chain length is {}", chain.len());
        },
        Commands::Version => {
            println!("Chainmesh v{}", chainmesh::VERSION);
        },
    }

    Ok(())
}

async fn wait_for_ctrl_c() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")
}
