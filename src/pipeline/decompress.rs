//! Server-side decompression: zlib stream → original PDF bytes.
//!
//! Built on the low-level [`flate2::Decompress`] state machine rather than a
//! `Read` adapter so that truncated input is detected reliably: the stream is
//! accepted only once the codec reports `StreamEnd`. Output growth is capped
//! at `max_output` bytes.

use crate::error::QaError;
use flate2::{Decompress, FlushDecompress, Status};
use tracing::debug;

const CHUNK: usize = 64 * 1024;

/// Inflate `compressed` back into the original document bytes.
///
/// # Errors
/// * [`QaError::CorruptInput`]: not a zlib stream, bad checksum, or truncated
/// * [`QaError::DocumentTooLarge`]: the output would exceed `max_output`
pub fn decompress(compressed: &[u8], max_output: usize) -> Result<Vec<u8>, QaError> {
    if compressed.is_empty() {
        return Err(QaError::CorruptInput {
            detail: "empty input".into(),
        });
    }

    let mut inflater = Decompress::new(true);
    // One spare byte past the cap tells "exactly at the limit" from "over it".
    let ceiling = max_output.saturating_add(1);
    let initial = compressed.len().saturating_mul(4).max(CHUNK).min(ceiling);
    let mut out: Vec<u8> = Vec::with_capacity(initial);

    loop {
        if out.len() == out.capacity() {
            let grow = out.capacity().max(CHUNK).min(ceiling - out.len());
            out.reserve_exact(grow);
        }

        let consumed = inflater.total_in() as usize;
        let before_in = inflater.total_in();
        let before_out = inflater.total_out();

        let status = inflater
            .decompress_vec(&compressed[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| QaError::CorruptInput {
                detail: e.to_string(),
            })?;

        if out.len() > max_output {
            return Err(QaError::DocumentTooLarge { limit: max_output });
        }
        if status == Status::StreamEnd {
            break;
        }

        let made_progress =
            inflater.total_in() != before_in || inflater.total_out() != before_out;
        let input_exhausted = inflater.total_in() as usize >= compressed.len();
        if input_exhausted && out.len() < out.capacity() {
            return Err(QaError::CorruptInput {
                detail: "truncated stream".into(),
            });
        }
        if !made_progress && out.len() < out.capacity() {
            return Err(QaError::CorruptInput {
                detail: "decoder stalled".into(),
            });
        }
    }

    let trailing = compressed.len() - inflater.total_in() as usize;
    if trailing > 0 {
        debug!("Ignoring {} trailing bytes after deflate stream", trailing);
    }
    debug!("Inflated {} bytes → {} bytes", compressed.len(), out.len());

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::compress::compress;

    const LIMIT: usize = 16 * 1024 * 1024;

    #[test]
    fn round_trip_preserves_bytes() {
        let samples: Vec<Vec<u8>> = vec![
            Vec::new(),
            b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec(),
            (0..=255u8).cycle().take(300_000).collect(),
            vec![0u8; 1_000_000],
        ];
        for sample in samples {
            let packed = compress(&sample).unwrap();
            let unpacked = decompress(packed.as_bytes(), LIMIT).unwrap();
            assert_eq!(unpacked, sample);
        }
    }

    #[test]
    fn garbage_is_corrupt_input() {
        let err = decompress(b"definitely not a zlib stream", LIMIT).unwrap_err();
        assert!(matches!(err, QaError::CorruptInput { .. }), "got {err:?}");
    }

    #[test]
    fn empty_is_corrupt_input() {
        let err = decompress(&[], LIMIT).unwrap_err();
        assert!(matches!(err, QaError::CorruptInput { .. }));
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let data: Vec<u8> = (0..50_000u32).flat_map(|i| i.to_le_bytes()).collect();
        let packed = compress(&data).unwrap().into_bytes();
        let cut = &packed[..packed.len() / 2];
        let err = decompress(cut, LIMIT).unwrap_err();
        assert!(matches!(err, QaError::CorruptInput { .. }), "got {err:?}");
    }

    #[test]
    fn output_cap_is_enforced() {
        let packed = compress(&vec![b'x'; 200_000]).unwrap();
        let err = decompress(packed.as_bytes(), 10_000).unwrap_err();
        assert!(matches!(err, QaError::DocumentTooLarge { limit: 10_000 }));
    }

    #[test]
    fn output_exactly_at_cap_is_accepted() {
        let data = vec![b'y'; 10_000];
        let packed = compress(&data).unwrap();
        assert_eq!(decompress(packed.as_bytes(), 10_000).unwrap(), data);
    }
}
