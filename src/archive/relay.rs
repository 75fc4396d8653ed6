use std::{io, time::Duration};

use axum::body::Bytes;
use futures::{Stream, StreamExt};
use tokio::{process::ChildStdout, sync::mpsc, time::timeout};
use tokio_util::io::ReaderStream;

use crate::archive::ArchiveProcess;

pub const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Copy, Clone, Debug, Default)]
pub struct Pacing {
    /// Pause after every chunk handed to the client.
    pub delay: Duration,
    /// Longest wait for the next chunk before giving up on the archiver.
    pub stall_timeout: Option<Duration>,
}

enum StreamEnd {
    Completed,
    Interrupted,
    Failed(io::Error),
}

type Chunk = io::Result<Bytes>;

/// Relay the archiver's output as a response body.
///
/// The process is moved to a pump task which terminates and reaps it once the
/// output is exhausted, reading fails or the body is dropped.
pub fn relay(process: ArchiveProcess, pacing: Pacing) -> impl Stream<Item = Chunk> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(pump(process, pacing, tx));
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    })
}

async fn pump(mut process: ArchiveProcess, pacing: Pacing, tx: mpsc::Sender<Chunk>) {
    let end = match process.take_output() {
        Some(output) => forward(output, &pacing, &tx).await,
        None => StreamEnd::Failed(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "archiver output is not captured",
        )),
    };

    match process.reap().await {
        Ok(_) => (),
        Err(err) => log::error!("Cannot reap archiver: {}", err),
    }

    match end {
        StreamEnd::Completed => log::debug!("Archive fully sent"),
        StreamEnd::Interrupted => log::debug!("Download was interrupted"),
        StreamEnd::Failed(err) => {
            log::error!("Archive streaming failed: {}", err);
            // Headers are already sent: abort the body so the client sees a truncated transfer.
            let _ = tx.send(Err(err)).await;
        }
    }
}

async fn forward(output: ChildStdout, pacing: &Pacing, tx: &mpsc::Sender<Chunk>) -> StreamEnd {
    let mut chunks = ReaderStream::with_capacity(output, CHUNK_SIZE);
    loop {
        let next = tokio::select! {
            next = next_chunk(&mut chunks, pacing.stall_timeout) => next,
            _ = tx.closed() => return StreamEnd::Interrupted,
        };
        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(err)) => return StreamEnd::Failed(err),
            None => return StreamEnd::Completed,
        };

        log::debug!("Sending archive chunk of {} bytes", chunk.len());
        if tx.send(Ok(chunk)).await.is_err() {
            return StreamEnd::Interrupted;
        }

        if !pacing.delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(pacing.delay) => (),
                _ = tx.closed() => return StreamEnd::Interrupted,
            }
        }
    }
}

async fn next_chunk(
    chunks: &mut ReaderStream<ChildStdout>,
    stall_timeout: Option<Duration>,
) -> Option<Chunk> {
    match stall_timeout {
        Some(limit) => match timeout(limit, chunks.next()).await {
            Ok(next) => next,
            Err(_) => Some(Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("archiver stalled for {}", humantime::format_duration(limit)),
            ))),
        },
        None => chunks.next().await,
    }
}
