//! Operator console
//!
//! Reads line commands from stdin and drives the registry:
//! `q`, `stats`, `disconnect`, `broadcast`, `help`.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::registry::{ClientRegistry, RegistryStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Quit,
    Stats,
    DisconnectAll,
    Broadcast,
    Help,
    Unknown(String),
}

impl ConsoleCommand {
    /// Parse one input line. Empty lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let cmd = line.trim();
        if cmd.is_empty() {
            return None;
        }

        Some(match cmd.to_ascii_lowercase().as_str() {
            "q" | "quit" => ConsoleCommand::Quit,
            "stats" => ConsoleCommand::Stats,
            "disconnect" => ConsoleCommand::DisconnectAll,
            "broadcast" => ConsoleCommand::Broadcast,
            "help" | "?" => ConsoleCommand::Help,
            _ => ConsoleCommand::Unknown(cmd.to_string()),
        })
    }
}

/// Why the console stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// Operator typed `q`; every client has been disconnected
    Quit,
    /// Input reached end of file
    InputClosed,
}

/// Run the console over `input` until `q` or end of input.
pub async fn run<I>(input: I, registry: Arc<ClientRegistry>) -> anyhow::Result<ConsoleExit>
where
    I: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    print_help();

    while let Some(line) = lines.next_line().await? {
        let Some(command) = ConsoleCommand::parse(&line) else {
            continue;
        };

        match command {
            ConsoleCommand::Quit => {
                let count = registry.disconnect_all().await;
                println!("Disconnected {} clients, shutting down", count);
                return Ok(ConsoleExit::Quit);
            }
            ConsoleCommand::Stats => {
                println!("{}", format_stats(&registry.stats().await));
            }
            ConsoleCommand::DisconnectAll => {
                let count = registry.disconnect_all().await;
                println!("Disconnected {} clients", count);
            }
            ConsoleCommand::Broadcast => {
                println!("Message to broadcast:");
                let Some(message) = lines.next_line().await? else {
                    break;
                };
                let sent = registry.broadcast(message.trim()).await;
                println!("Broadcast sent to {} clients", sent);
            }
            ConsoleCommand::Help => print_help(),
            ConsoleCommand::Unknown(other) => {
                println!("Unknown command '{}', type 'help'", other);
            }
        }
    }

    tracing::info!("Console input closed");
    Ok(ConsoleExit::InputClosed)
}

fn print_help() {
    println!("Commands: q (quit), stats, disconnect (all clients), broadcast, help");
}

/// Human-readable registry snapshot.
pub fn format_stats(stats: &RegistryStats) -> String {
    let rule = "=".repeat(60);
    let mut out = format!(
        "{rule}\nCLIENT STATISTICS\n{rule}\n\
         Total clients: {}\nConnected: {}\nDisconnected: {}\nTotal requests: {}\n",
        stats.total_clients,
        stats.connected_clients,
        stats.disconnected_clients,
        stats.total_requests,
    );

    for client in &stats.clients_info {
        let status = if client.connected { "CONNECTED" } else { "DISCONNECTED" };
        out.push_str(&format!(
            "  {} ({}) - {}, requests: {}\n",
            client.name, client.address, status, client.request_count
        ));
    }

    out.push_str(&rule);
    out
}
