//! Line-oriented ingestion of observations into a [`TelemetrySink`].

use chrono::Utc;
use harvest_core::{event::parse_observation, sink::TelemetrySink};
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _};
use tracing::{debug, warn};

/// Tally of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
  /// Non-blank lines read.
  pub lines:      usize,
  /// Lines whose event was written in full.
  pub written:    usize,
  /// Batches where some rows were written and some were not.
  pub incomplete: usize,
  /// Lines that could not be parsed.
  pub rejected:   usize,
  /// Events the sink failed to write at all.
  pub failed:     usize,
}

/// Feed every line of `reader` through `sink`.
///
/// A bad line or a failed write is logged and skipped. Only I/O errors on
/// the reader stop the run.
pub async fn ingest<S, R>(sink: &S, reader: R) -> std::io::Result<IngestSummary>
where
  S: TelemetrySink,
  S::Error: std::fmt::Display,
  R: AsyncBufRead + Unpin,
{
  let mut summary = IngestSummary::default();
  let mut lines = reader.lines();
  let mut line_no = 0usize;

  while let Some(line) = lines.next_line().await? {
    line_no += 1;
    if line.trim().is_empty() {
      continue;
    }
    summary.lines += 1;

    let observation = match parse_observation(&line) {
      Ok(o) => o,
      Err(e) => {
        warn!(line = line_no, error = %e, "skipping observation");
        summary.rejected += 1;
        continue;
      }
    };

    let kind = observation.event.kind();
    let at = observation.observed_at(Utc::now());
    match sink.record(observation.event, at).await {
      Ok(recorded) if recorded.succeeded() => {
        debug!(line = line_no, %kind, ?recorded, "recorded");
        summary.written += 1;
      }
      Ok(recorded) => {
        warn!(line = line_no, %kind, ?recorded, "event partially recorded");
        summary.incomplete += 1;
      }
      Err(e) => {
        warn!(line = line_no, %kind, error = %e, "failed to record event");
        summary.failed += 1;
      }
    }
  }

  Ok(summary)
}
