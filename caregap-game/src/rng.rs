//! Deterministic random streams.
//!
//! Every draw in a run comes from a [`RandomSource`]: a ChaCha stream seeded
//! from the user-visible seed through a domain-separated HMAC, plus a draw
//! counter. The pair `(stream seed, draws)` fully describes the stream, which
//! is what snapshots persist; restoring seeks the stream to the counted draw.
use hmac::{Hmac, Mac};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::constants::{STREAM_DICE, STREAM_EVENTS, STREAM_REWARDS};
use crate::numbers::{floor_f64_to_usize, usize_to_f64};

const WORDS_PER_DRAW: u128 = 2;

/// Serializable position of a random stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCursor {
    pub stream_seed: u64,
    pub draws: u64,
}

/// Seeded `[0, 1)` generator with draw accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StreamCursor", into = "StreamCursor")]
pub struct RandomSource {
    stream_seed: u64,
    draws: u64,
    rng: ChaCha8Rng,
}

impl RandomSource {
    /// Build a stream directly from an already-derived stream seed.
    #[must_use]
    pub fn from_seed(stream_seed: u64) -> Self {
        Self {
            stream_seed,
            draws: 0,
            rng: ChaCha8Rng::seed_from_u64(stream_seed),
        }
    }

    /// Build the stream for `domain` of a user-visible run seed.
    #[must_use]
    pub fn for_domain(user_seed: u64, domain: &[u8]) -> Self {
        Self::from_seed(derive_stream_seed(user_seed, domain))
    }

    /// Rebuild a stream positioned after `draws` draws.
    ///
    /// Each `f64` draw consumes one `u64`, two 32-bit words of ChaCha output.
    #[must_use]
    pub fn resume(stream_seed: u64, draws: u64) -> Self {
        let mut source = Self::from_seed(stream_seed);
        source.rng.set_word_pos(u128::from(draws) * WORDS_PER_DRAW);
        source.draws = draws;
        source
    }

    /// Next uniform draw in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.r#gen::<f64>()
    }

    /// Uniform index in `0..len`; `len == 0` still consumes a draw and yields 0.
    pub fn pick_index(&mut self, len: usize) -> usize {
        let draw = self.next_f64();
        if len == 0 {
            return 0;
        }
        floor_f64_to_usize(draw * usize_to_f64(len)).min(len - 1)
    }

    /// Number of draws performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    #[must_use]
    pub const fn cursor(&self) -> StreamCursor {
        StreamCursor {
            stream_seed: self.stream_seed,
            draws: self.draws,
        }
    }
}

impl PartialEq for RandomSource {
    fn eq(&self, other: &Self) -> bool {
        self.cursor() == other.cursor()
    }
}

impl From<StreamCursor> for RandomSource {
    fn from(cursor: StreamCursor) -> Self {
        Self::resume(cursor.stream_seed, cursor.draws)
    }
}

impl From<RandomSource> for StreamCursor {
    fn from(source: RandomSource) -> Self {
        source.cursor()
    }
}

/// Independent streams used by a run, so a draw in one concern never
/// shifts the sequence seen by another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RngBundle {
    pub events: RandomSource,
    pub rewards: RandomSource,
    pub dice: RandomSource,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            events: RandomSource::for_domain(seed, STREAM_EVENTS),
            rewards: RandomSource::for_domain(seed, STREAM_REWARDS),
            dice: RandomSource::for_domain(seed, STREAM_DICE),
        }
    }

    /// Total draws across all streams.
    #[must_use]
    pub const fn total_draws(&self) -> u64 {
        self.events
            .draws()
            .saturating_add(self.rewards.draws())
            .saturating_add(self.dice.draws())
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
