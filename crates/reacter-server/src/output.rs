use anyhow::Result;
use reacter_common::types::OutboundMessage;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Writes every outbound message as one JSON line until all senders are
/// dropped. Returns the number of lines written.
pub async fn run_writer<W>(mut rx: mpsc::Receiver<OutboundMessage>, mut writer: W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        written += 1;
    }
    Ok(written)
}
