// CLI entry point for the Skirmish match server.
//
// Usage:
//   skirmish-server <HOST> <PORT> [OPTIONS]
//     --key <HEX>               32-byte cipher key, hex (or SKIRMISH_KEY)
//     --idle-timeout <SECS>     Disconnect silent players (default: 300, 0 = never)
//     --keep-running            Keep accepting after a match is decided

use std::time::Duration;

use skirmish::{SkirmishServer, cipher_from_hex};
use tracing_subscriber::EnvFilter;

struct Args {
    host: String,
    port: u16,
    key: Option<String>,
    idle_timeout: Option<Duration>,
    keep_running: bool,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args();
    let addr = format!("{}:{}", args.host, args.port);

    let mut builder = SkirmishServer::builder()
        .bind(&addr)
        .idle_timeout(args.idle_timeout)
        .exit_after_match(!args.keep_running);

    match args.key.or_else(|| std::env::var("SKIRMISH_KEY").ok()) {
        Some(key) => match cipher_from_hex(&key) {
            Ok(cipher) => builder = builder.cipher(cipher),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        None => {
            tracing::warn!("no cipher key given, frames are sent in the clear");
        }
    }

    let server = match builder.build().await {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Binding to {addr} failed: {e}");
            std::process::exit(1);
        }
    };

    match server.local_addr() {
        Ok(local) => tracing::info!(addr = %local, "server listening"),
        Err(e) => tracing::debug!(error = %e, "local address unavailable"),
    }

    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
    tracing::info!("server closing");
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut positionals = Vec::new();
    let mut key = None;
    let mut idle_timeout = Some(Duration::from_secs(300));
    let mut keep_running = false;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--key" => {
                i += 1;
                key = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--key requires a value");
                    std::process::exit(1);
                }));
            }
            "--idle-timeout" => {
                i += 1;
                let secs: u64 =
                    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--idle-timeout requires a number of seconds");
                        std::process::exit(1);
                    });
                idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            "--keep-running" => keep_running = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
            positional => positionals.push(positional.to_string()),
        }
        i += 1;
    }

    let [host, port] = positionals.as_slice() else {
        print_usage();
        std::process::exit(1);
    };
    let port = port.parse().unwrap_or_else(|_| {
        eprintln!("invalid port: {port}");
        std::process::exit(1);
    });

    Args {
        host: host.clone(),
        port,
        key,
        idle_timeout,
        keep_running,
    }
}

fn print_usage() {
    println!("Usage: skirmish-server <HOST> <PORT> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --key <HEX>             32-byte cipher key, hex encoded (or SKIRMISH_KEY)");
    println!("  --idle-timeout <SECS>   Disconnect silent players (default: 300, 0 = never)");
    println!("  --keep-running          Keep accepting after a match is decided");
    println!("  --help, -h              Show this help");
}
