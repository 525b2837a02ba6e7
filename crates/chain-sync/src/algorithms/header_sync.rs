//! Batch-internal header continuity checking: the cheap check run on a
//! freshly downloaded header batch before any of it touches storage or
//! the per-batch [`chain_consensus::ValidationContext`].

use chain_types::{BlockHeader, ValidationError};

/// Checks that `headers` forms one contiguous, strictly-increasing-height,
/// strictly-increasing-timestamp chain by `previous_hash` linkage. Does
/// not check anything against storage or the PoW target — that's
/// `BlockValidator`'s job once this cheap pass clears.
pub fn validate_header_batch(headers: &[BlockHeader]) -> Result<(), ValidationError> {
    for window in headers.windows(2) {
        let prev = &window[0];
        let curr = &window[1];

        if curr.previous_hash != prev.hash() {
            return Err(ValidationError::InvalidLinkage);
        }

        if curr.height != prev.height + 1 {
            return Err(ValidationError::InvalidHeader(format!(
                "height gap at {}: expected {}, got {}",
                curr.height,
                prev.height + 1,
                curr.height
            )));
        }

        if curr.timestamp <= prev.timestamp {
            return Err(ValidationError::InvalidHeader(format!(
                "timestamp does not increase at height {}",
                curr.height
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_types::Difficulty;

    fn header(height: u64, previous_hash: chain_types::Hash, timestamp: u64) -> BlockHeader {
        BlockHeader::new(
            1,
            height,
            previous_hash,
            [0u8; 32],
            [0u8; 32],
            timestamp,
            Difficulty::from(1u64),
            [0u8; 20],
            height,
            None,
        )
    }

    fn chain(count: u64) -> Vec<BlockHeader> {
        let mut headers = vec![header(0, [0u8; 32], 1000)];
        for h in 1..count {
            let prev_hash = headers[(h - 1) as usize].hash();
            headers.push(header(h, prev_hash, 1000 + h * 600));
        }
        headers
    }

    #[test]
    fn empty_and_singleton_batches_pass() {
        assert!(validate_header_batch(&[]).is_ok());
        assert!(validate_header_batch(&chain(1)).is_ok());
    }

    #[test]
    fn contiguous_batch_passes() {
        assert!(validate_header_batch(&chain(5)).is_ok());
    }

    #[test]
    fn broken_linkage_is_rejected() {
        let mut headers = chain(3);
        headers[2].previous_hash = [0xffu8; 32];
        assert!(validate_header_batch(&headers).is_err());
    }

    #[test]
    fn height_gap_is_rejected() {
        let mut headers = chain(3);
        headers[2].height = 10;
        assert!(validate_header_batch(&headers).is_err());
    }

    #[test]
    fn non_increasing_timestamp_is_rejected() {
        let mut headers = chain(3);
        headers[2].timestamp = headers[1].timestamp;
        assert!(validate_header_batch(&headers).is_err());
    }
}
