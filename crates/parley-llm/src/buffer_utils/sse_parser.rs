use futures::StreamExt;
use reqwest::Response;

use super::buffering::CircularLineBuffer;
use crate::error::{ProviderError, Result};
use crate::streaming::{EventStream, StreamEvent};

/// Strategy for turning SSE `data:` payloads into stream events
pub trait SseLineParser: Send {
    /// Parse a data payload into stream events
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>>;

    /// Check if this payload signals end of stream
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

/// Generic SSE stream parser using the circular line buffer
///
/// The stream ends after the first `Done` event. A body that ends without
/// an explicit terminator still yields a final `Done`.
pub fn parse_sse_stream<P: SseLineParser + 'static>(
    response: Response,
    parser: P,
) -> EventStream {
    let stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = CircularLineBuffer::with_capacity(4096);

        while let Some(chunk_result) = byte_chunks.next().await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(ProviderError::Stream(e.to_string()));
                    return;
                }
            };
            buffer.extend(&bytes);

            while let Some(line_result) = buffer.next_line() {
                let line = match line_result {
                    Ok(line) => line,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                for event in process_line(&parser, &line) {
                    let done = matches!(event, Ok(StreamEvent::Done { .. }) | Err(_));
                    yield event;
                    if done {
                        return;
                    }
                }
            }
        }

        if let Some(line) = buffer.take_remainder() {
            for event in process_line(&parser, &line) {
                let done = matches!(event, Ok(StreamEvent::Done { .. }) | Err(_));
                yield event;
                if done {
                    return;
                }
            }
        }

        yield Ok(StreamEvent::done());
    })
}

fn process_line<P: SseLineParser>(parser: &P, line: &str) -> Vec<Result<StreamEvent>> {
    if line.is_empty() || line.starts_with(':') {
        return Vec::new();
    }

    let Some(data) = line.strip_prefix("data:").map(str::trim_start) else {
        return Vec::new();
    };

    if parser.is_done_marker(data) {
        return vec![Ok(StreamEvent::done())];
    }

    match parser.parse_data_line(data) {
        Ok(events) => events.into_iter().map(Ok).collect(),
        Err(e) => vec![Err(e)],
    }
}
