// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::error::Error;
use std::sync::Arc;

use axum::Router;
use livecanvas::config::{default_base_url, ChunkLimits, HubConfig, DEFAULT_HTTP_PORT};
use livecanvas::hub::LiveViewHub;
use livecanvas::mcp::LiveCanvasMcp;
use livecanvas::store::{CanvasFolder, WriteDurability};
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "livecanvas=info";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<store-dir>] [--durable-writes] [--http-port <port>] [--base-url <url>] [--max-chunk-bytes <n>] [--max-chunk-elements <n>]\n  {program} [--store <dir>] [--durable-writes] [--http-port <port>] --mcp\n\nBy default, serves renderer routes under `/views/<id>/...` and MCP over streamable HTTP at `http://127.0.0.1:<port>/mcp`.\n--mcp serves MCP over stdio instead; renderer routes stay on the HTTP port.\n--http-port selects the port (0 = ephemeral; default {DEFAULT_HTTP_PORT}).\n--base-url overrides the prefix of view URLs handed to renderers.\n\nWithout a store directory, checkpoints live in memory and views end with the process.\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported).\n\nLogs go to stderr; set RUST_LOG to adjust (default `{DEFAULT_LOG_FILTER}`)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    store_dir: Option<String>,
    http_port: Option<u16>,
    base_url: Option<String>,
    durable_writes: bool,
    max_chunk_bytes: Option<u64>,
    max_chunk_elements: Option<usize>,
}

impl CliOptions {
    fn chunk_limits(&self) -> ChunkLimits {
        let defaults = ChunkLimits::default();
        ChunkLimits {
            max_bytes: self.max_chunk_bytes.unwrap_or(defaults.max_bytes),
            max_elements: self.max_chunk_elements.unwrap_or(defaults.max_elements),
        }
    }
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => {
                if options.mcp {
                    return Err(());
                }
                options.mcp = true;
            }
            "--store" => {
                if options.store_dir.is_some() {
                    return Err(());
                }
                options.store_dir = Some(args.next().ok_or(())?);
            }
            "--http-port" => {
                if options.http_port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                options.http_port = Some(raw.parse().map_err(|_| ())?);
            }
            "--base-url" => {
                if options.base_url.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                if !(raw.starts_with("http://") || raw.starts_with("https://")) {
                    return Err(());
                }
                options.base_url = Some(raw);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            "--max-chunk-bytes" => {
                if options.max_chunk_bytes.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let value: u64 = raw.parse().map_err(|_| ())?;
                if value == 0 {
                    return Err(());
                }
                options.max_chunk_bytes = Some(value);
            }
            "--max-chunk-elements" => {
                if options.max_chunk_elements.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let value: usize = raw.parse().map_err(|_| ())?;
                if value == 0 {
                    return Err(());
                }
                options.max_chunk_elements = Some(value);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.store_dir.is_some() {
                    return Err(());
                }
                options.store_dir = Some(arg);
            }
        }
    }

    if options.durable_writes && options.store_dir.is_none() {
        return Err(());
    }

    Ok(options)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn open_hub(options: &CliOptions, config: HubConfig) -> Result<LiveViewHub, Box<dyn Error>> {
    let Some(dir) = options.store_dir.as_deref() else {
        return Ok(LiveViewHub::in_memory(config));
    };
    let folder = if options.durable_writes {
        CanvasFolder::new(dir).with_durability(WriteDurability::Durable)
    } else {
        CanvasFolder::new(dir)
    };
    Ok(LiveViewHub::open(config, folder)?)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "livecanvas".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_tracing();

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;

        runtime.block_on(async move {
            let http_port = options.http_port.unwrap_or(DEFAULT_HTTP_PORT);
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", http_port)).await?;
            let bound_port = listener.local_addr()?.port();

            let base_url =
                options.base_url.clone().unwrap_or_else(|| default_base_url(bound_port));
            let config = HubConfig::default()
                .with_base_url(base_url.clone())
                .with_chunk_limits(options.chunk_limits());
            let hub = Arc::new(open_hub(&options, config)?);
            let mcp = LiveCanvasMcp::new(Arc::clone(&hub));

            let renderer_routes = livecanvas::http::router(Arc::clone(&hub));

            if options.mcp {
                tracing::info!(base_url = %base_url, "serving MCP over stdio; renderer routes on HTTP");
                let server_handle = tokio::spawn(async move {
                    if let Err(err) = axum::serve(listener, renderer_routes).await {
                        tracing::error!(error = %err, "renderer HTTP server error");
                    }
                });
                let served = mcp.serve_stdio().await;
                server_handle.abort();
                served?;
                return Ok::<(), Box<dyn Error>>(());
            }

            let config =
                StreamableHttpServerConfig { stateful_mode: true, ..StreamableHttpServerConfig::default() };
            let session_manager = Arc::new(LocalSessionManager::default());
            let mcp_service =
                StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config);

            let router: Router = renderer_routes.nest_service("/mcp", mcp_service);
            tracing::info!(base_url = %base_url, "serving renderer routes and MCP at {base_url}/mcp");
            axum::serve(listener, router).await?;
            Ok(())
        })?;

        Ok(())
    })();

    if let Err(err) = result {
        eprintln!("livecanvas: {err}");
        std::process::exit(1);
    }
}
