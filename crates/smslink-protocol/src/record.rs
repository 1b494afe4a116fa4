//! Parser for unsolicited incoming text message records.
//!
//! In text mode the modem pushes each received message as a header line
//! followed by the message body:
//!
//! ```text
//! +CMT: "<sender>",<alpha>,"<timestamp>"\r\n
//! <payload, possibly spanning lines>\r\n
//! ```
//!
//! A drained chunk can hold any number of records back to back. Each record
//! extends up to the next `+CMT: "` marker or the end of the chunk.
//!
//! # Malformed Records
//!
//! A record is skipped when:
//! - the sender field is not closed by `"`
//! - the sender field is empty
//! - the header line has no line terminator
//!
//! Skipping never aborts the scan: a batch of mixed records still yields
//! every valid one.
//!
//! # Example
//!
//! ```
//! use smslink_protocol::{RecordParser, StagingBuffer};
//!
//! let mut staging = StagingBuffer::<128>::new();
//! staging
//!     .extend_from_slice(b"+CMT: \"+33612345671\",,\"24/05/10,12:46:06+08\"\r\nhello\r\n")
//!     .unwrap();
//!
//! let mut received = Vec::new();
//! let summary = RecordParser::parse(&staging, staging.view(), |sender, payload| {
//!     received.push((sender.to_vec(), payload.to_vec()));
//! });
//!
//! assert_eq!(summary.delivered, 1);
//! assert_eq!(received[0].0, b"+33612345671");
//! assert_eq!(received[0].1, b"hello");
//! ```

use smslink_core::constants::{FIELD_QUOTE, LF, PUSH_MARKER};
use smslink_core::{Error, Result};
use tracing::debug;

use crate::staging::{StagingBuffer, View};

/// Counts of records seen in one parse pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseSummary {
    /// Valid records handed to the callback.
    pub delivered: usize,

    /// Records skipped as malformed.
    pub malformed: usize,
}

/// Extracts push records from staged bytes.
pub struct RecordParser;

impl RecordParser {
    /// Scan `chunk` and invoke `on_record(sender, payload)` once per valid
    /// record, in stream order.
    ///
    /// The slices passed to the callback borrow the staging buffer and are
    /// only valid for the duration of the call. Bytes before the first
    /// marker are ignored.
    pub fn parse<const N: usize, F>(
        staging: &StagingBuffer<N>,
        chunk: View,
        mut on_record: F,
    ) -> ParseSummary
    where
        F: FnMut(&[u8], &[u8]),
    {
        let mut summary = ParseSummary::default();
        let mut rest = chunk;

        while staging.extract_upto_literal(&mut rest, PUSH_MARKER).is_ok() {
            match Self::next_record(staging, &mut rest) {
                Ok((sender, payload)) => {
                    on_record(staging.bytes(sender), staging.bytes(payload));
                    summary.delivered += 1;
                }
                Err(err) => {
                    debug!("Skipping push record: {}", err);
                    summary.malformed += 1;
                }
            }
        }

        summary
    }

    /// Split one record off the front of `rest`, which starts right after a
    /// marker. `rest` is always advanced to the next marker (or the end),
    /// even when the record turns out to be malformed.
    fn next_record<const N: usize>(
        staging: &StagingBuffer<N>,
        rest: &mut View,
    ) -> Result<(View, View)> {
        let body_len = staging
            .extract_upto_literal_peek(rest, PUSH_MARKER)
            .map_or(rest.len(), |body| body.len());
        let mut body = View::new(rest.offset(), body_len);
        rest.advance(body_len);

        let sender = staging
            .extract_upto_literal(&mut body, FIELD_QUOTE)
            .map_err(|_| Error::MalformedRecord("unterminated sender field".to_string()))?;
        if sender.is_empty() {
            return Err(Error::MalformedRecord("empty sender field".to_string()));
        }

        staging
            .extract_upto_literal(&mut body, &[LF])
            .map_err(|_| Error::MalformedRecord("unterminated header line".to_string()))?;

        Ok((sender, staging.strip_line_terminator(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &[u8]) -> (Vec<(String, String)>, ParseSummary) {
        let mut staging = StagingBuffer::<512>::new();
        staging.extend_from_slice(input).unwrap();

        let mut records = Vec::new();
        let summary = RecordParser::parse(&staging, staging.view(), |sender, payload| {
            records.push((
                String::from_utf8_lossy(sender).into_owned(),
                String::from_utf8_lossy(payload).into_owned(),
            ));
        });
        (records, summary)
    }

    #[test]
    fn test_single_record() {
        let (records, summary) =
            parse_all(b"+CMT: \"+33612345678\",,\"24/05/10,12:46:06+08\"\r\nhi\r\n");

        assert_eq!(summary, ParseSummary { delivered: 1, malformed: 0 });
        assert_eq!(records, vec![("+33612345678".into(), "hi".into())]);
    }

    #[test]
    fn test_two_back_to_back_records() {
        let record = b"+CMT: \"+33612345671\",,\"24/05/10,12:46:06+08\"\nmessage 2\nfd\n";
        let mut input = record.to_vec();
        input.extend_from_slice(record);

        let (records, summary) = parse_all(&input);

        assert_eq!(summary.delivered, 2);
        for (sender, payload) in &records {
            assert_eq!(sender, "+33612345671");
            assert_eq!(payload, "message 2\nfd");
        }
    }

    #[test]
    fn test_empty_sender_skipped_next_record_kept() {
        let input = b"+CMT: \"\",,\"24/05/10\"\r\nlost\r\n+CMT: \"+3361\",,\"24/05/10\"\r\nkept\r\n";
        let (records, summary) = parse_all(input);

        assert_eq!(summary, ParseSummary { delivered: 1, malformed: 1 });
        assert_eq!(records, vec![("+3361".into(), "kept".into())]);
    }

    #[test]
    fn test_unterminated_sender_does_not_swallow_next_record() {
        let input = b"+CMT: \"+336\r\n+CMT: \"+3362\",,\"x\"\r\nok\r\n";
        let (records, summary) = parse_all(input);

        assert_eq!(summary.malformed, 1);
        assert_eq!(records, vec![("+3362".into(), "ok".into())]);
    }

    #[test]
    fn test_header_without_terminator_is_malformed() {
        let (records, summary) = parse_all(b"+CMT: \"+3361\",,\"24/05/10\"");
        assert!(records.is_empty());
        assert_eq!(summary.malformed, 1);
    }

    #[test]
    fn test_leading_noise_ignored() {
        let (records, _) = parse_all(b"OK\r\nRING\r\n+CMT: \"+3361\",,\"d\"\r\nbody\r\n");
        assert_eq!(records, vec![("+3361".into(), "body".into())]);
    }

    #[test]
    fn test_empty_payload_delivered() {
        let (records, summary) = parse_all(b"+CMT: \"+3361\",,\"d\"\r\n");
        assert_eq!(summary.delivered, 1);
        assert_eq!(records[0].1, "");
    }

    #[test]
    fn test_no_marker_yields_nothing() {
        let (records, summary) = parse_all(b"+CMGS: 12\r\nOK\r\n");
        assert!(records.is_empty());
        assert_eq!(summary, ParseSummary::default());
    }

    #[test]
    fn test_only_one_trailing_terminator_stripped() {
        let (records, _) = parse_all(b"+CMT: \"+3361\",,\"d\"\nbody\n\n");
        assert_eq!(records[0].1, "body\n");
    }
}
