// RDB - Remote Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! RDB - console client for the remote debugger
//!
//! Connects to a debugger agent over JSON-RPC and drives a session from stdin.

use clap::Parser;
use eyre::Result;
use rdb_client::{Config, ConsoleConfig};
use rdb_common::logging;
use std::{path::PathBuf, time::Duration};

/// RDB remote debugger console
#[derive(Debug, Parser)]
#[command(name = "rdb")]
#[command(about = "Console client for the RDB remote debugger", version)]
struct Args {
    /// RPC server URL
    #[arg(long, default_value = "http://localhost:3030")]
    url: String,

    /// Attach to this debuggee on startup
    #[arg(long)]
    pid: Option<u32>,

    /// Config file path (uses ~/.rdb.toml if not specified)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Session event polling interval in milliseconds
    #[arg(long, default_value = "100")]
    poll_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to a file, the terminal belongs to the console
    let log_file_path = logging::init_file_only_logging("rdb")?;
    eprintln!("RDB logs: {}", log_file_path.display());

    let settings = if let Some(config_path) = args.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    let console_config = ConsoleConfig {
        rpc_url: args.url.clone(),
        pid: args.pid,
        poll_interval: Duration::from_millis(args.poll_interval),
        settings,
    };

    tracing::info!("Starting RDB console");
    tracing::info!("Connecting to RPC server at: {}", args.url);

    match rdb_client::start_console(console_config).await {
        Ok(()) => {
            tracing::info!("Console exited normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Console error: {e}");
            Err(e)
        }
    }
}
