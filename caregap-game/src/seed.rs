//! Share identifiers: `?seed=N` query parameters and friendly share codes.
//! Code format: <VARIANT>-<WORD><NN>, e.g., TP-CLINIC42, BD-RIDE07

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which simulation a seed or snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimVariant {
    Journey,
    Board,
    Dash,
}

impl SimVariant {
    pub const ALL: [Self; 3] = [Self::Journey, Self::Board, Self::Dash];

    /// Two-letter share-code prefix.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Journey => "TP",
            Self::Board => "BD",
            Self::Dash => "CD",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Journey => "Two Patients, One Diagnosis",
            Self::Board => "Care Gap Board Race",
            Self::Dash => "Chemo Dash",
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Journey => "journey",
            Self::Board => "board",
            Self::Dash => "dash",
        }
    }

    const fn domain_byte(self) -> u8 {
        match self {
            Self::Journey => b'T',
            Self::Board => b'B',
            Self::Dash => b'D',
        }
    }
}

impl fmt::Display for SimVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SimVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "journey" | "tp" | "two-patients" => Ok(Self::Journey),
            "board" | "bd" => Ok(Self::Board),
            "dash" | "cd" | "chemo-dash" => Ok(Self::Dash),
            other => Err(format!("unknown variant: {other}")),
        }
    }
}

/// Query string that replays `seed`.
#[must_use]
pub fn share_query(seed: u64) -> String {
    format!("?seed={seed}")
}

/// Extract a digits-only `seed` parameter from a query string or URL.
#[must_use]
pub fn parse_seed_param(query: &str) -> Option<u64> {
    let query = query.split_once('?').map_or(query, |(_, q)| q);
    let query = query.split_once('#').map_or(query, |(q, _)| q);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "seed")
        .and_then(|(_, value)| {
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            value.parse().ok()
        })
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// Word list for share codes
pub const WORD_LIST: [&str; 64] = [
    "CLINIC", "NURSE", "RIDE", "BUS", "TRANSIT", "LEAVE", "SHIFT", "FORMS", "FAX", "REFERAL",
    "SCAN", "BIOPSY", "LAB", "PLAN", "AUTH", "APPEAL", "CLAIM", "CODE", "COPAY", "DEDUCT",
    "NAVIGTR", "VOUCHER", "FUND", "SUPPORT", "CHILD", "SITTER", "FAMILY", "FRIEND", "NEIGHBR",
    "MAP", "ROUTE", "STOP", "TICKET", "HOURS", "WEEKEND", "EVENING", "CALL", "PORTAL", "INBOX",
    "CHART", "DOCTOR", "ONCOLGY", "INFUSN", "CHEMO", "DOSE", "VISIT", "WAIT", "QUEUE", "SLOT",
    "CALENDR", "MORNING", "BRIDGE", "HARBOR", "GARDEN", "LANTERN", "COMPASS", "ANCHOR", "SHIELD",
    "HELPER", "HOPE", "STEADY", "KINDLY", "ACCESS", "EQUITY",
];

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    word_index & 0x01FF | ((u16::from(nn) & 0x7F) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    let nn = u8::try_from((packed >> 9) & 0x7F).unwrap_or(0);
    (packed & 0x01FF, nn)
}

fn compose_seed(variant: SimVariant, word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let [lo, hi] = packed.to_le_bytes();
    // Domain-separated FNV input
    let mut buf = [0u8; 10];
    buf[..6].copy_from_slice(b"CAREG-");
    buf[6] = variant.domain_byte();
    buf[7] = lo;
    buf[8] = hi;
    buf[9] = 0xA5;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Friendly code for `seed`. Only the low 16 bits survive, so decoding yields
/// a seed that encodes back to the same code rather than `seed` itself.
#[must_use]
pub fn encode_friendly(variant: SimVariant, seed: u64) -> String {
    let packed = u16::try_from(seed & 0xFFFF).unwrap_or(0);
    let (wi, nn) = unpack(packed);
    let word = WORD_LIST[usize::from(wi) % WORD_LIST.len()];
    let nn = nn % 100;
    format!("{}-{word}{nn:02}", variant.code())
}

#[must_use]
pub fn decode_to_seed(code: &str) -> Option<(SimVariant, u64)> {
    let s = code.trim();
    let (prefix, rest) = s.split_once('-')?;
    let variant = SimVariant::ALL
        .into_iter()
        .find(|variant| variant.code().eq_ignore_ascii_case(prefix))?;
    if rest.len() < 3 || !rest.is_ascii() {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some((variant, compose_seed(variant, wi, nn)))
}

#[must_use]
pub fn generate_code_from_entropy(variant: SimVariant, entropy: u64) -> String {
    let wi = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    let seed = compose_seed(variant, wi, nn);
    encode_friendly(variant, seed)
}
