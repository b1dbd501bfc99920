use std::io::BufRead;
use tokio::sync::mpsc;
use tracing;

/// Reads stdin line by line on a dedicated OS thread and forwards each line
/// to the returned receiver. The receiver yields `None` at end of input.
///
/// The thread is detached and never joined. A read blocked on an idle pipe
/// therefore cannot hold the runtime open once the daemon decides to stop.
pub fn spawn_stdin_reader(buffer: usize) -> std::io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    std::thread::Builder::new()
        .name("reacter-stdin".to_string())
        .spawn(move || forward_lines(std::io::stdin().lock(), &tx))?;
    Ok(rx)
}

/// Sends every line of `reader` until end of input, a read error, or the
/// receiver going away. Must not be called from an async context.
pub fn forward_lines<R: BufRead>(reader: R, tx: &mpsc::Sender<String>) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if tx.blocking_send(line).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read input");
                return;
            }
        }
    }
}
