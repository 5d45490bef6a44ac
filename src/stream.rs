//! Inbound sample stream.
//!
//! The backend pushes `new_data` batches over a persistent HTTP response as
//! newline-delimited JSON. The reader runs on its own thread, parses each
//! frame into a [`SampleBatch`], and forwards it over a crossbeam channel to
//! the run loop, which is the sole consumer. Transport errors and malformed
//! frames are logged and skipped; the connection is retried with a fixed
//! backoff until the session stops.

use crate::backend::BackendConfig;
use crate::core::SampleBatch;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Delay between reconnect attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Split buffered stream bytes into complete frames.
///
/// Returns the complete lines and leaves any trailing partial line in
/// `buffer` for the next chunk. Blank lines are dropped.
pub fn split_frames(buffer: &mut String) -> Vec<String> {
    let mut frames = Vec::new();
    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..=pos).collect();
        let line = line.trim();
        if !line.is_empty() {
            frames.push(line.to_string());
        }
    }
    frames
}

/// Parse one frame into a batch. Malformed frames yield `None` and are the
/// caller's to log.
pub fn parse_frame(frame: &str) -> Option<SampleBatch> {
    serde_json::from_str(frame).ok()
}

/// Spawn the stream reader thread.
///
/// The thread connects to the backend's stream endpoint and forwards parsed
/// batches into `sender` until `running` goes false or the receiving side
/// hangs up.
pub fn spawn_reader(
    config: BackendConfig,
    sender: Sender<SampleBatch>,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("stream-reader".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to create stream runtime: {e}");
                    return;
                }
            };

            runtime.block_on(read_loop(config, sender, running));
        })
        .expect("Failed to spawn stream reader thread")
}

async fn read_loop(config: BackendConfig, sender: Sender<SampleBatch>, running: Arc<AtomicBool>) {
    let client = match reqwest::Client::builder().build() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to create stream HTTP client: {e}");
            return;
        }
    };

    let url = config.stream_url();

    while running.load(Ordering::SeqCst) {
        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Connected to sample stream at {url}");
                if !pump(response, &sender, &running).await {
                    // Receiver is gone; the session is shutting down.
                    return;
                }
                tracing::warn!("Sample stream ended, reconnecting");
            }
            Ok(response) => {
                tracing::warn!(
                    "Sample stream returned status {}, retrying",
                    response.status()
                );
            }
            Err(e) => {
                tracing::warn!("Could not connect to sample stream: {e}");
            }
        }

        if running.load(Ordering::SeqCst) {
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }
}

/// Drain one response body. Returns false once the channel is closed.
async fn pump(
    mut response: reqwest::Response,
    sender: &Sender<SampleBatch>,
    running: &Arc<AtomicBool>,
) -> bool {
    let mut buffer = String::new();

    loop {
        if !running.load(Ordering::SeqCst) {
            return true;
        }

        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => return true,
            Err(e) => {
                tracing::warn!("Sample stream read error: {e}");
                return true;
            }
        };

        buffer.push_str(&String::from_utf8_lossy(&chunk));

        for frame in split_frames(&mut buffer) {
            match parse_frame(&frame) {
                Some(batch) => {
                    if sender.send(batch).is_err() {
                        return false;
                    }
                }
                None => {
                    tracing::warn!("Dropping malformed stream frame: {frame}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_frames_carries_partial_line() {
        let mut buffer = String::from("{\"a\":1}\n{\"b\":2}\n{\"c\":");
        let frames = split_frames(&mut buffer);
        assert_eq!(frames, vec!["{\"a\":1}", "{\"b\":2}"]);
        assert_eq!(buffer, "{\"c\":");

        buffer.push_str("3}\n");
        let frames = split_frames(&mut buffer);
        assert_eq!(frames, vec!["{\"c\":3}"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_split_frames_skips_blank_lines() {
        let mut buffer = String::from("\n\n{\"a\":1}\n\r\n");
        let frames = split_frames(&mut buffer);
        assert_eq!(frames, vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_parse_frame() {
        let batch = parse_frame(r#"{"raw": [1.0], "filtered": [0.5]}"#).unwrap();
        assert_eq!(batch.raw, vec![1.0]);
        assert_eq!(batch.filtered, vec![0.5]);

        assert!(parse_frame("not json").is_none());
        assert!(parse_frame(r#"{"raw": "oops"}"#).is_none());
    }
}
