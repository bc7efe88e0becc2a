use anyhow::Context;
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing::info;

use user_manager::{
    infrastructure::{database::DatabaseManager, logger::Logger},
    Config, Server,
};

/// 用户管理 REST 服务
#[derive(Parser, Debug)]
#[command(name = "user-manager", version)]
struct Cli {
    /// Address to listen
    #[arg(short = 'a', long = "addr")]
    addr: Option<String>,

    /// Port to listen
    #[arg(short, long)]
    port: Option<u16>,

    /// 配置文件路径（默认查找 config.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 正式日志依赖配置，加载期间的日志先写到标准错误
    let mut config = Logger::bootstrap(|| Config::load(cli.config.as_deref()))?;
    if let Some(addr) = cli.addr {
        config.http.bind_address = addr;
    }
    if let Some(port) = cli.port {
        config.http.port = port;
    }
    config.validate()?;

    // 保持 guard 存活到进程退出
    let _log_guard = Logger::init(&config.logging)?;
    Logger::install_panic_hook();

    info!("启动用户管理服务...");

    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    let store = Arc::new(database.user_store());

    Server::new(config, store).run().await
}
