//! MUD 終端客戶端
//!
//! ```text
//! mudterm                         連線到設定檔中的主機
//! mudterm <host> <port>           覆寫主機與連接埠
//! mudterm --config <path>         使用指定的設定檔
//! mudterm --gen-config            印出目前設定並結束
//! ```

mod config;
mod console;

use std::path::PathBuf;

use clap::Parser;
use mudstream::{ClientCommand, DisconnectReason, Engine, MessageType, TelnetClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::TermConfig;
use console::ConsoleSink;

#[derive(Parser, Debug)]
#[command(name = "mudterm", about = "Terminal MUD client")]
struct Cli {
    /// 主機名稱或 IP
    host: Option<String>,

    /// 連接埠
    port: Option<u16>,

    /// 設定檔路徑
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 印出目前設定（JSON）並結束
    #[arg(long)]
    gen_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日誌；標準輸出留給遊戲文字
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let path = cli.config.unwrap_or_else(TermConfig::default_path);
    let mut config = TermConfig::load(&path)?;

    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    if cli.gen_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut engine = Engine::new(config.engine.clone());
    let mut sink = ConsoleSink::new();

    engine.system_message(
        &format!("正在連線到 {}:{}", config.host, config.port),
        MessageType::System,
        &mut sink,
    );
    let mut client = match TelnetClient::connect(&config.host, config.port, config.telnet_config()).await {
        Ok(client) => client,
        Err(e) => {
            engine.system_message(&format!("連線失敗: {}", e), MessageType::Error, &mut sink);
            return Err(e.into());
        }
    };
    engine.system_message("已連線", MessageType::System, &mut sink);

    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(read_stdin(tx));

    match client.run(&mut engine, &mut sink, &mut rx).await {
        Ok(reason) => {
            let text = match reason {
                DisconnectReason::ClosedByServer => "伺服器已關閉連線",
                DisconnectReason::ClosedByUser | DisconnectReason::CommandChannelClosed => "已斷開連線",
            };
            engine.system_message(text, MessageType::System, &mut sink);
        }
        Err(e) => {
            engine.system_message(&format!("連線中斷: {}", e), MessageType::Error, &mut sink);
        }
    }
    Ok(())
}

/// 標準輸入的每一行都是一個命令；EOF 時要求斷線
async fn read_stdin(tx: mpsc::Sender<ClientCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(ClientCommand::Send(line)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                info!("標準輸入結束");
                let _ = tx.send(ClientCommand::Disconnect).await;
                break;
            }
            Err(e) => {
                warn!("讀取標準輸入失敗: {}", e);
                let _ = tx.send(ClientCommand::Disconnect).await;
                break;
            }
        }
    }
}
