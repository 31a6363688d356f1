pub mod decoder;

use futures::{ future, Stream, StreamExt };
use log::{ debug, error, warn };
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::task::{ Context, Poll };
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use self::decoder::{ events_from_lines, LineDecoder };
use crate::models::stream::StreamEvent;

const EVENT_BUFFER: usize = 32;

/// Callback side of stream ingestion. At most one of `on_complete` / `on_error`
/// fires, and nothing fires after it.
pub trait StreamHandler {
    fn on_chunk(&mut self, text: &str);
    fn on_complete(&mut self);
    fn on_error(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Longest wait for the next read before the stream is failed. `None` waits forever.
    pub idle_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// A `done` record arrived.
    Completed,
    /// The body ended without a terminal record.
    ImplicitlyCompleted,
    Failed,
    /// The consumer went away mid-stream.
    Abandoned,
}

/// Reads `body` to its terminal event, handing each event to `emit`.
/// `emit` returns `false` when nobody is listening any more.
async fn drive<S, B, E, F, Fut>(body: S, options: IngestOptions, mut emit: F) -> StreamEnd
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
        F: FnMut(StreamEvent) -> Fut,
        Fut: Future<Output = bool>
{
    tokio::pin!(body);
    let mut decoder = LineDecoder::new();

    loop {
        let next = match options.idle_timeout {
            Some(limit) =>
                match tokio::time::timeout(limit, body.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!("No stream data for {:?}, giving up", limit);
                        emit(StreamEvent::Error(format!("Stream timed out after {:?} without data", limit))).await;
                        return StreamEnd::Failed;
                    }
                }
            None => body.next().await,
        };

        let lines = match next {
            Some(Ok(bytes)) => decoder.push(bytes.as_ref()),
            Some(Err(e)) => {
                error!("Stream read failed: {}", e);
                emit(StreamEvent::Error(format!("Stream read failed: {}", e))).await;
                return StreamEnd::Failed;
            }
            None => {
                if let Some(end) = dispatch(decoder.finish().into_iter().collect(), &mut emit).await {
                    return end;
                }
                warn!("Stream ended without a done record, treating it as complete");
                if !emit(StreamEvent::Done).await {
                    return StreamEnd::Abandoned;
                }
                return StreamEnd::ImplicitlyCompleted;
            }
        };

        if let Some(end) = dispatch(lines, &mut emit).await {
            return end;
        }
    }
}

async fn dispatch<F, Fut>(lines: Vec<String>, emit: &mut F) -> Option<StreamEnd>
    where F: FnMut(StreamEvent) -> Fut, Fut: Future<Output = bool>
{
    for event in events_from_lines(lines) {
        let end = match &event {
            StreamEvent::Content(_) => None,
            StreamEvent::Done => Some(StreamEnd::Completed),
            StreamEvent::Error(_) => Some(StreamEnd::Failed),
        };
        if !emit(event).await {
            return Some(StreamEnd::Abandoned);
        }
        if end.is_some() {
            return end;
        }
    }
    None
}

/// Callback-style ingestion. Dropping the returned future stops reading; events
/// already delivered stay delivered.
pub async fn ingest<S, B, E, H>(body: S, handler: &mut H, options: IngestOptions) -> StreamEnd
    where S: Stream<Item = Result<B, E>>, B: AsRef<[u8]>, E: Display, H: StreamHandler
{
    drive(body, options, |event| {
        match &event {
            StreamEvent::Content(text) => handler.on_chunk(text),
            StreamEvent::Done => handler.on_complete(),
            StreamEvent::Error(message) => handler.on_error(message),
        }
        future::ready(true)
    }).await
}

/// A streamed reply as a lazy sequence of events, read by a background task.
///
/// The sequence ends after its first terminal event. `cancel` (or dropping the
/// stream) stops the reader and discards anything still buffered.
pub struct ChatStream {
    events: ReceiverStream<StreamEvent>,
    reader: Option<JoinHandle<()>>,
    cancelled: bool,
}

impl ChatStream {
    pub fn spawn<S, B, E>(body: S, options: IngestOptions) -> Self
        where
            S: Stream<Item = Result<B, E>> + Send + 'static,
            B: AsRef<[u8]> + Send,
            E: Display + Send
    {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let reader = tokio::spawn(async move {
            let end = drive(body, options, |event| {
                let tx = tx.clone();
                async move { tx.send(event).await.is_ok() }
            }).await;
            debug!("Stream reader finished: {:?}", end);
        });
        Self {
            events: ReceiverStream::new(rx),
            reader: Some(reader),
            cancelled: false,
        }
    }

    /// A stream that fails immediately, used for transport errors raised before
    /// any body exists.
    pub fn failed(message: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.try_send(StreamEvent::Error(message.into()));
        Self {
            events: ReceiverStream::new(rx),
            reader: None,
            cancelled: false,
        }
    }

    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        debug!("Cancelling chat stream");
        self.cancelled = true;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.events.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Stream for ChatStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancelled {
            return Poll::Ready(None);
        }
        Pin::new(&mut self.events).poll_next(cx)
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}
