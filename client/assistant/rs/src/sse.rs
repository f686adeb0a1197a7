use std::{
  collections::VecDeque,
  pin::Pin,
  task::{Context, Poll},
};

use bytes::Bytes;
use codeopen_client::entities::assistant::AssistantEvent;
use futures::Stream;
use tracing::warn;

use crate::AssistantError;

/// Incremental server-sent-events decoder. Chunks may split
/// events anywhere, including inside a utf-8 code point, so
/// bytes are buffered until a full `\n\n` delimited event is
/// available.
#[derive(Default)]
pub struct SseDecoder {
  buffer: Vec<u8>,
}

impl SseDecoder {
  /// Feed a chunk, get every event completed by it.
  /// Events whose data is not valid json are dropped with a
  /// warning rather than poisoning the stream.
  pub fn push(&mut self, chunk: &[u8]) -> Vec<AssistantEvent> {
    self.buffer.extend_from_slice(chunk);
    let mut events = Vec::new();
    while let Some(boundary) = find_boundary(&self.buffer) {
      let raw =
        self.buffer.drain(..boundary.end).collect::<Vec<u8>>();
      let Ok(block) =
        std::str::from_utf8(&raw[..boundary.start])
      else {
        warn!("dropping non utf-8 sse block");
        continue;
      };
      if let Some(event) = parse_block(block) {
        events.push(event);
      }
    }
    events
  }
}

struct Boundary {
  /// Length of the event block, excluding the delimiter.
  start: usize,
  /// Length including the delimiter.
  end: usize,
}

fn find_boundary(buffer: &[u8]) -> Option<Boundary> {
  // Events are delimited by a blank line: `\n\n` or `\r\n\r\n`.
  for i in 0..buffer.len().saturating_sub(1) {
    if buffer[i] == b'\n' && buffer[i + 1] == b'\n' {
      return Some(Boundary { start: i, end: i + 2 });
    }
    if i + 3 < buffer.len()
      && &buffer[i..i + 4] == b"\r\n\r\n"
    {
      return Some(Boundary { start: i, end: i + 4 });
    }
  }
  None
}

fn parse_block(block: &str) -> Option<AssistantEvent> {
  let mut data = String::new();
  for line in block.lines() {
    // Comment lines start with ':'
    if line.starts_with(':') {
      continue;
    }
    if let Some(rest) = line.strip_prefix("data:") {
      if !data.is_empty() {
        data.push('\n');
      }
      data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
    }
    // `event:` / `id:` / `retry:` fields are not used by the
    // assistant, ignore them.
  }
  if data.is_empty() {
    return None;
  }
  match serde_json::from_str::<AssistantEvent>(&data) {
    Ok(event) => Some(event),
    Err(e) => {
      warn!("dropping unparseable sse event | {e} | data: {data}");
      None
    }
  }
}

/// Adapts a raw response byte stream into a stream of
/// [AssistantEvent]. Ends when the downstream closes the
/// connection, errors once (then ends) on transport failure.
pub struct EventStream<S> {
  inner: S,
  decoder: SseDecoder,
  pending: VecDeque<AssistantEvent>,
  done: bool,
}

pub fn event_stream<S>(inner: S) -> EventStream<S>
where
  S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
  EventStream {
    inner,
    decoder: SseDecoder::default(),
    pending: VecDeque::new(),
    done: false,
  }
}

impl<S> Stream for EventStream<S>
where
  S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
  type Item = Result<AssistantEvent, AssistantError>;

  fn poll_next(
    self: Pin<&mut Self>,
    cx: &mut Context<'_>,
  ) -> Poll<Option<Self::Item>> {
    let this = self.get_mut();
    loop {
      if let Some(event) = this.pending.pop_front() {
        return Poll::Ready(Some(Ok(event)));
      }
      if this.done {
        return Poll::Ready(None);
      }
      match Pin::new(&mut this.inner).poll_next(cx) {
        Poll::Ready(Some(Ok(chunk))) => {
          this.pending.extend(this.decoder.push(&chunk));
        }
        Poll::Ready(Some(Err(e))) => {
          this.done = true;
          return Poll::Ready(Some(Err(
            AssistantError::Transport {
              message: format!("event stream failed | {e}"),
            },
          )));
        }
        Poll::Ready(None) => {
          this.done = true;
          return Poll::Ready(None);
        }
        Poll::Pending => return Poll::Pending,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn whole_event_in_one_chunk() {
    let mut decoder = SseDecoder::default();
    let events = decoder.push(
      b"data: {\"type\":\"session.updated\",\"properties\":{}}\n\n",
    );
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "session.updated");
  }

  #[test]
  fn event_split_across_chunks() {
    let mut decoder = SseDecoder::default();
    assert!(
      decoder.push(b"data: {\"type\":\"message.par").is_empty()
    );
    let events =
      decoder.push(b"t.updated\",\"properties\":{\"n\":1}}\n\n");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "message.part.updated");
    assert_eq!(events[0].properties["n"], 1);
  }

  #[test]
  fn multiple_events_in_one_chunk() {
    let mut decoder = SseDecoder::default();
    let events = decoder.push(
      b"data: {\"type\":\"a\",\"properties\":{}}\n\ndata: {\"type\":\"b\",\"properties\":{}}\n\n",
    );
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind, "a");
    assert_eq!(events[1].kind, "b");
  }

  #[test]
  fn comments_and_unparseable_data_are_dropped() {
    let mut decoder = SseDecoder::default();
    let events = decoder.push(
      b": keepalive\n\ndata: not json\n\ndata: {\"type\":\"ok\",\"properties\":{}}\n\n",
    );
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "ok");
  }

  #[test]
  fn crlf_delimiters_are_accepted() {
    let mut decoder = SseDecoder::default();
    let events = decoder.push(
      b"data: {\"type\":\"ok\",\"properties\":{}}\r\n\r\n",
    );
    assert_eq!(events.len(), 1);
  }
}
