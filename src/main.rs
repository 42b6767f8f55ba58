use std::sync::Arc;

use filehost::config::Config;
use filehost::files::DirectoryStore;
use filehost::http::connection::ConnectionSettings;
use filehost::registry::ClientRegistry;
use filehost::router::Router;
use filehost::server::console::{self, ConsoleExit};
use filehost::server::listener;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let registry = Arc::new(ClientRegistry::with_write_timeout(cfg.server.write_timeout()));
    let store = Arc::new(DirectoryStore::new(&cfg.static_files.root));
    let router = Arc::new(Router::new(Arc::clone(&registry), store, &cfg.static_files));
    let settings = ConnectionSettings::from(&cfg.server);

    tracing::info!(root = %cfg.static_files.root, "Serving files");

    // Without a console (or once stdin closes) only Ctrl-C stops the server.
    let console_task = async {
        if cfg.console.enabled {
            let exit = console::run(BufReader::new(tokio::io::stdin()), Arc::clone(&registry)).await?;
            if exit == ConsoleExit::Quit {
                return anyhow::Ok(());
            }
        }
        std::future::pending().await
    };

    tokio::select! {
        res = listener::run(&cfg.server.listen_addr, router, settings) => {
            res?;
        }

        res = console_task => {
            res?;
            tracing::info!("Console requested shutdown");
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    registry.disconnect_all().await;
    Ok(())
}
