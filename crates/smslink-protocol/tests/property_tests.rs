//! Property-based tests for the receive ring and staging extraction.
//!
//! These tests use proptest to generate arbitrary byte streams and verify
//! that buffer invariants hold for every input.

use proptest::prelude::*;
use smslink_core::Error;
use smslink_protocol::{ByteRing, Comparison, RecordParser, StagingBuffer};

const RING: usize = 32;

/// Strategy for generating a valid push record from `+336...` numbers.
fn push_record() -> impl Strategy<Value = Vec<u8>> {
    (
        prop::string::string_regex("\\+336[0-9]{8}").expect("Failed to create sender regex"),
        prop::string::string_regex("[a-z0-9 ]{0,20}(\n[a-z0-9 ]{1,10})?")
            .expect("Failed to create payload regex"),
    )
        .prop_map(|(sender, payload)| {
            format!("+CMT: \"{sender}\",,\"24/05/10,12:46:06+08\"\r\n{payload}\r\n").into_bytes()
        })
}

fn collect_records(staging: &StagingBuffer<1024>) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut records = Vec::new();
    RecordParser::parse(staging, staging.view(), |sender, payload| {
        records.push((sender.to_vec(), payload.to_vec()));
    });
    records
}

proptest! {
    /// Property: the ring never holds more than its capacity, and a push into
    /// a full ring always leaves it empty.
    #[test]
    fn prop_ring_length_bounded(bytes in prop::collection::vec(any::<u8>(), 0..200)) {
        let mut ring = ByteRing::<RING>::new();

        for byte in bytes {
            let was_full = ring.len() == RING;
            match ring.push(byte) {
                Ok(()) => prop_assert!(!was_full),
                Err(Error::RingOverflow { capacity }) => {
                    prop_assert!(was_full);
                    prop_assert_eq!(capacity, RING);
                    prop_assert!(ring.is_empty());
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
            prop_assert!(ring.len() <= RING);
        }
    }

    /// Property: the ring behaves as a FIFO, whatever the interleaving of
    /// pushes and skips.
    #[test]
    fn prop_ring_fifo_order(
        chunks in prop::collection::vec((prop::collection::vec(any::<u8>(), 0..8), 0usize..8), 0..20)
    ) {
        let mut ring = ByteRing::<RING>::new();
        let mut model = std::collections::VecDeque::new();

        for (bytes, skip) in chunks {
            for byte in bytes {
                if ring.push(byte).is_err() {
                    model.clear();
                } else {
                    model.push_back(byte);
                }
            }
            let skip = skip.min(model.len());
            ring.skip(skip).unwrap();
            model.drain(..skip);

            prop_assert!(ring.iter().eq(model.iter().copied()));
            let front: Vec<u8> = model.iter().copied().take(3).collect();
            prop_assert_eq!(ring.compare_front(&front), Comparison::Equal);
        }
    }

    /// Property: extraction of an absent literal never alters the view.
    #[test]
    fn prop_extract_absent_literal_no_mutation(content in "[a-z ]{0,64}") {
        let mut staging = StagingBuffer::<64>::new();
        staging.extend_from_slice(content.as_bytes()).unwrap();

        let mut view = staging.view();
        let before = view;
        prop_assert!(matches!(
            staging.extract_upto_literal(&mut view, b"+CMT"),
            Err(Error::NotFound)
        ));
        prop_assert_eq!(view, before);
    }

    /// Property: splitting the stream at any point across two ring refills
    /// yields the same records as a single refill.
    #[test]
    fn prop_split_refill_invariance(
        records in prop::collection::vec(push_record(), 1..4),
        split in any::<prop::sample::Index>(),
    ) {
        let stream: Vec<u8> = records.concat();
        let at = split.index(stream.len() + 1);

        let mut whole = StagingBuffer::<1024>::new();
        whole.extend_from_slice(&stream).unwrap();

        let mut ring = ByteRing::<256>::new();
        let mut split_staging = StagingBuffer::<1024>::new();
        for part in [&stream[..at], &stream[at..]] {
            for chunk in part.chunks(128) {
                for &byte in chunk {
                    ring.push(byte).unwrap();
                }
                split_staging.refill_from(&mut ring).unwrap();
            }
        }

        let expected = collect_records(&whole);
        prop_assert_eq!(expected.len(), records.len());
        prop_assert_eq!(collect_records(&split_staging), expected);
    }
}
