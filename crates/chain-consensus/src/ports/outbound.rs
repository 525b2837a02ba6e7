//! Outbound ports: collaborators `BlockValidator` needs that live outside
//! this crate's scope (the actual PoW digest, wall-clock time).

use chain_types::BlockHeader;

/// The RandomX-style PoW digest itself is out of scope; this port is
/// what `BlockValidator` calls to learn whether a header's digest
/// satisfies the target implied by `header.difficulty`.
pub trait PowVerifier: Send + Sync {
    fn satisfies_target(&self, header: &BlockHeader) -> bool;
}

/// Wall-clock time, abstracted so tests can supply a fixed instant
/// instead of racing the real clock on the timestamp-monotonicity check.
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> u64;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Deterministic stand-in for the real PoW digest: treats the header's
/// own (memoized) SHA-256 hash as the digest and compares it against
/// `U256::MAX / difficulty`, the standard target-from-difficulty
/// formula. Good enough to exercise `BlockValidator`'s branching in
/// tests without depending on the real RandomX-style hash function.
pub struct StubPowVerifier;

impl PowVerifier for StubPowVerifier {
    fn satisfies_target(&self, header: &BlockHeader) -> bool {
        let digest = primitive_types::U256::from_big_endian(&header.hash());
        let difficulty = header.difficulty.max(primitive_types::U256::from(1u64));
        let target = primitive_types::U256::MAX / difficulty;
        digest <= target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_time_source_is_nonzero() {
        let source = SystemTimeSource;
        assert!(source.now_ms() > 0);
    }
}
