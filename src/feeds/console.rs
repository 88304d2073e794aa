use std::io::{self, BufRead};
use std::thread;

use tokio::sync::mpsc;

use crate::events::{Command, Event};

/// Spawns a thread that reads commands from stdin and sends them as events.
/// End of input becomes `Shutdown`.
pub fn spawn(tx: mpsc::Sender<Event>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Some(cmd) => {
                    if tx.blocking_send(Event::Command(cmd)).is_err() {
                        return;
                    }
                }
                None => println!("unknown command: {} (try `help`)", line.trim()),
            }
        }
        let _ = tx.blocking_send(Event::Shutdown);
    });
}
