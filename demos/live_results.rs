//! Live results board in the terminal
//!
//! Connects to a result server, follows its full result sets and deltas, and
//! prints every published snapshot.
//!
//! ```bash
//! cargo run --example live_results -- ws://127.0.0.1:8080/ws
//! ```
//!
//! Stop and restart the server to watch the client reconnect; the status line
//! stays "connecting" for the first half second before reporting an outage.

use liveo::client::ConnectionStatus;
use liveo::core::{ObservabilityConfig, ResultSnapshot};
use liveo::{ClientBuilder, ResultsFeed, StatusIndicator};

fn print_board(snapshot: &ResultSnapshot) {
    println!("\n=== {} (hash {}) ===", snapshot.title, snapshot.hash);
    for course in &snapshot.courses {
        if course.info.is_empty() {
            println!("\n{}", course.title);
        } else {
            println!("\n{} ({})", course.title, course.info);
        }
        for (place, competitor) in course.competitors.iter().enumerate() {
            println!("  {:>3}. {:<30} {:>8}", place + 1, competitor.name, competitor.display_time());
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8080/ws".to_string());

    let client = ClientBuilder::new(url.as_str())
        .with_observability(ObservabilityConfig::logs_only("liveo-board"))
        .build()?;
    let feed = ResultsFeed::attach(&client);
    let mut status = StatusIndicator::new(&client);

    println!("Following {}", url);
    client.connect();

    let mut updates = feed.subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                match snapshot {
                    Some(snapshot) => print_board(&snapshot),
                    None => print_board(&feed.current_or_placeholder()),
                }
            }
            Some(now) = status.changed() => {
                match now {
                    ConnectionStatus::Connected => println!("[status] connected"),
                    ConnectionStatus::Pending => println!("[status] connecting..."),
                    ConnectionStatus::Disconnected => println!("[status] disconnected, retrying"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down");
                break;
            }
        }
    }

    client.shutdown();
    liveo::core::shutdown_observability();
    Ok(())
}
