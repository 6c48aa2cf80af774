//! Line-wise multiplexing of child output streams.
//!
//! One reader task per stream feeds a channel drained by the consumer, so
//! data is delivered as it arrives and no producer ever blocks on a full
//! kernel pipe buffer. Within a stream, lines arrive in write order; across
//! streams only arrival order applies.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

/// Which child stream a forwarded line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    /// The child's standard output
    Stdout,
    /// The child's standard error
    Stderr,
}

impl StreamSource {
    /// Lowercase stream name ("stdout" or "stderr")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Forward lines from up to two streams to `deliver` until both reach
/// end-of-stream.
///
/// Completes only once every provided stream has been fully drained. Read
/// errors end the affected stream like end-of-stream does.
pub async fn forward_lines<O, E, F>(stdout: Option<O>, stderr: Option<E>, mut deliver: F)
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
    F: FnMut(StreamSource, String),
{
    let (tx, mut rx) = mpsc::channel::<(StreamSource, String)>(64);

    if let Some(stream) = stdout {
        spawn_reader(stream, StreamSource::Stdout, tx.clone());
    }
    if let Some(stream) = stderr {
        spawn_reader(stream, StreamSource::Stderr, tx.clone());
    }

    // The readers hold the remaining senders; the loop ends when both hit
    // end-of-stream.
    drop(tx);

    while let Some((source, line)) = rx.recv().await {
        deliver(source, line);
    }
}

fn spawn_reader<R>(stream: R, source: StreamSource, tx: mpsc::Sender<(StreamSource, String)>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send((source, line)).await.is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_all_lines_from_both_streams() {
        let stdout: &[u8] = b"out 1\nout 2\n";
        let stderr: &[u8] = b"err 1\n";

        let mut collected = Vec::new();
        forward_lines(Some(stdout), Some(stderr), |source, line| {
            collected.push((source, line));
        })
        .await;

        let stdout_lines: Vec<_> = collected
            .iter()
            .filter(|(source, _)| *source == StreamSource::Stdout)
            .map(|(_, line)| line.as_str())
            .collect();
        let stderr_lines: Vec<_> = collected
            .iter()
            .filter(|(source, _)| *source == StreamSource::Stderr)
            .map(|(_, line)| line.as_str())
            .collect();

        assert_eq!(stdout_lines, ["out 1", "out 2"]);
        assert_eq!(stderr_lines, ["err 1"]);
    }

    #[tokio::test]
    async fn per_stream_order_is_preserved() {
        let stdout: &[u8] = b"1\n2\n3\n4\n5\n";

        let mut lines = Vec::new();
        forward_lines(Some(stdout), None::<&[u8]>, |_, line| lines.push(line)).await;

        assert_eq!(lines, ["1", "2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn completes_with_no_streams() {
        forward_lines(None::<&[u8]>, None::<&[u8]>, |_, _| {
            panic!("nothing to deliver");
        })
        .await;
    }
}
