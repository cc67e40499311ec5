//! Seeded PRNG for dice draws. SplitMix64 for throughput and good statistical
//! quality; deterministic per seed, not cryptographically secure.
//!
//! The round state machine only consumes die faces through [DieSource], so
//! tests can swap in a scripted source and check exact transitions.

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

/// Faces on a battle die.
pub const DIE_FACES: u64 = 3;

/// Anything that can hand out battle die faces.
pub trait DieSource {
    /// Next die face, uniform in `[1, 3]`.
    fn die(&mut self) -> u32;
}

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the operating system's entropy source.
    pub fn from_entropy() -> Self {
        let mut buf = [0u8; 8];
        getrandom::getrandom(&mut buf).expect("OS entropy source");
        Self::new(u64::from_le_bytes(buf))
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }

    /// Uniform draw in `[0, bound)`. `bound` must be nonzero.
    pub(crate) fn next_below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }
}

impl DieSource for Rng {
    fn die(&mut self) -> u32 {
        1 + (self.next_u64() % DIE_FACES) as u32
    }
}
