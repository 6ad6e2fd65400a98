//! cache-replay: headless driver for the lender cache.
//!
//! Usage:
//!   cache-replay --messages session.json --lender-id jdb
//!   cache-replay --lender-id jdb --ipc-mode < commands.jsonl
//!
//! `--messages` takes a JSON array of inbound messages
//! (`[{ "tuples": [{ "key": 30, "value": "jdb" }] }]`).

use anyhow::{Context, Result};
use lendercache_core::{
    collaborator::{DataView, Transport},
    message::{InboundMessage, OutboundMessage},
    CacheConfig, CacheError, CacheResult, EntityStore, ProtocolAdapter,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Message { tuples: Vec<lendercache_core::message::Tuple> },
    RequestLenderInfo,
    RequestPreferredLoans,
    Quit,
}

/// Writes outbound requests to stdout, one JSON object per line.
struct StdoutTransport;

impl Transport for StdoutTransport {
    fn send(&mut self, msg: &OutboundMessage) -> CacheResult<()> {
        let line = serde_json::to_string(msg).map_err(|e| CacheError::Transport(e.to_string()))?;
        println!("outbound: {line}");
        Ok(())
    }
}

/// Prints whatever changed since the previous refresh.
#[derive(Default)]
struct SummaryView {
    refreshes: u64,
}

impl DataView for SummaryView {
    fn data_updated(&mut self, store: &EntityStore) {
        self.refreshes += 1;
        let mods = store.modified();
        if !mods.any() {
            log::debug!("refresh #{}: nothing changed", self.refreshes);
            return;
        }
        println!("--- refresh #{} ---", self.refreshes);
        println!(
            "  lender:           {} ({})",
            store.lender_id(),
            store.lender_name().unwrap_or("-")
        );
        if mods.lender_loan_qty {
            println!("  loans:            {}", store.lender_loan_qty());
        }
        if mods.kiva_country_qty {
            println!("  kiva countries:   {}", store.kiva_country_qty());
        }
        if mods.lender_country_qty {
            println!("  lender countries: {}", store.lender_country_qty());
        }
        if mods.preferred_loan_qty {
            println!("  preferred loans:  {}", store.preferred_loan_qty());
            for view in store.preferred_loans() {
                println!(
                    "    #{} {} [{}] {}/{}",
                    view.idx, view.data.name, view.data.country_code, view.data.funded_amt, view.data.loan_amt
                );
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let lender_id = string_arg(&args, "--lender-id").unwrap_or("");
    let messages = string_arg(&args, "--messages");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");

    let config = match CacheConfig::load(data_dir) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Using default config: {e:#}");
            CacheConfig::default()
        }
    };

    let mut adapter = ProtocolAdapter::open(lender_id, &config, StdoutTransport, SummaryView::default())
        .context("Failed to create entity store")?;

    if ipc_mode {
        run_ipc_loop(&mut adapter)?;
    } else {
        let path = messages.context("--messages <file> is required outside --ipc-mode")?;
        replay_file(&mut adapter, path)?;
        print_summary(&adapter)?;
    }
    Ok(())
}

fn replay_file(adapter: &mut ProtocolAdapter<StdoutTransport, SummaryView>, path: &str) -> Result<()> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
    let messages: Vec<InboundMessage> =
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {path}"))?;
    log::info!("Replaying {} message(s) from {path}", messages.len());

    for (i, msg) in messages.iter().enumerate() {
        let report = adapter.handle_message(msg);
        if report.failed > 0 {
            log::warn!("message {i}: {} tuple(s) failed", report.failed);
        }
    }
    Ok(())
}

fn run_ipc_loop(adapter: &mut ProtocolAdapter<StdoutTransport, SummaryView>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => {
                writeln!(stdout, "{}", serde_json::to_string(&adapter.store().snapshot())?)?;
            }
            IpcCommand::Message { tuples } => {
                let report = adapter.handle_message(&InboundMessage::new(tuples));
                writeln!(stdout, "{}", serde_json::to_string(&report)?)?;
            }
            IpcCommand::RequestLenderInfo => {
                if let Err(e) = adapter.request_lender_info() {
                    writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                }
            }
            IpcCommand::RequestPreferredLoans => match adapter.request_preferred_loans() {
                Ok(queued) => writeln!(stdout, "{}", serde_json::json!({ "queued": queued }))?,
                Err(e) => writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?,
            },
        }
        stdout.flush()?;
    }
    Ok(())
}

fn print_summary(adapter: &ProtocolAdapter<StdoutTransport, SummaryView>) -> Result<()> {
    let store = adapter.store();
    println!();
    println!("=== CACHE SUMMARY ===");
    println!("  refreshes:        {}", adapter.view().refreshes);
    println!("  companion ready:  {}", adapter.is_ready());
    println!("  pending requests: {}", adapter.pending_outbound());
    println!(
        "  supported codes:  {}",
        store.lender_country_codes(true)?.unwrap_or_else(|| "(none)".into())
    );
    println!();
    println!("{}", store.snapshot().to_json()?);
    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
