use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::download::broadcaster::Broadcaster;
use crate::download::progress::classify;

/// Longest line kept in memory; longer output is classified in pieces of this size.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Drains one output pipe of a transfer until end of stream.
///
/// Lines end at `\n` or `\r` (yt-dlp redraws progress with carriage
/// returns) and are classified as soon as their terminator arrives. Each
/// line is decoded lossily; resulting events are published. Read errors end
/// the loop quietly.
///
/// Returns the number of events published.
pub async fn pump<R>(reader: R, label: &str, broadcaster: &Broadcaster) -> usize
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut published = 0;

    loop {
        let (consumed, terminated) = match reader.fill_buf().await {
            Ok([]) => break,
            Ok(available) => match available.iter().position(|b| matches!(b, b'\n' | b'\r')) {
                Some(end) => {
                    line.extend_from_slice(&available[..end]);
                    (end + 1, true)
                }
                None => {
                    let take = available.len().min(MAX_LINE_BYTES.saturating_sub(line.len()).max(1));
                    line.extend_from_slice(&available[..take]);
                    (take, false)
                }
            },
            Err(e) => {
                log::debug!("yt-dlp {} read error: {}", label, e);
                break;
            }
        };
        reader.consume(consumed);

        if terminated || line.len() >= MAX_LINE_BYTES {
            published += emit(&line, label, broadcaster);
            line.clear();
        }
    }

    published + emit(&line, label, broadcaster)
}

fn emit(line: &[u8], label: &str, broadcaster: &Broadcaster) -> usize {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }
    log::debug!("yt-dlp {}: {}", label, text);
    match classify(text) {
        Some(event) => {
            broadcaster.publish(&event);
            1
        }
        None => 0,
    }
}
