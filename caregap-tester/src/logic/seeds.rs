use anyhow::{Context, Result, bail};
use caregap_game::seed::WORD_LIST;
use caregap_game::{SimVariant, decode_to_seed, encode_friendly, parse_seed_param};
use std::collections::HashMap;

/// Detailed seed metadata used for scenario runs and reports.
#[derive(Debug, Clone)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    pub source_variant: Option<SimVariant>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            source_variant: None,
        }
    }

    #[must_use]
    pub const fn from_share_code(seed: u64, variant: SimVariant, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            source_variant: Some(variant),
        }
    }

    #[must_use]
    pub fn matches_variant(&self, variant: SimVariant) -> bool {
        self.source_variant.is_none_or(|source| source == variant)
    }

    #[must_use]
    pub fn share_code_for(&self, variant: SimVariant) -> String {
        if let (Some(code), Some(source)) = (&self.code, self.source_variant)
            && source == variant
        {
            return code.clone();
        }
        encode_friendly(variant, self.seed)
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Supports literal integers, share codes, `?seed=N` links, and the special
/// keywords `all` / `available` which expand to every share-code seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("all") || token.eq_ignore_ascii_case("available") {
            request_all = true;
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some(seed) = parse_seed_param(token) {
            pending.push(SeedInfo::from_numeric(seed));
            continue;
        }

        if let Some((variant, seed)) = decode_to_seed(token) {
            pending.push(SeedInfo::from_share_code(
                seed,
                variant,
                token.trim().to_uppercase(),
            ));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if request_all {
        pending.extend(generate_all_share_code_seeds()?);
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<(u64, Option<SimVariant>), usize> = HashMap::new();

    for info in pending {
        let key = (info.seed, info.source_variant);
        if let Some(&existing) = index.get(&key) {
            if let Some(entry) = deduped.get_mut(existing)
                && entry.code.is_none()
                && info.code.is_some()
            {
                *entry = info;
            }
        } else {
            index.insert(key, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(42));
    }

    Ok(deduped)
}

fn generate_all_share_code_seeds() -> Result<Vec<SeedInfo>> {
    let mut seeds = Vec::with_capacity(WORD_LIST.len() * 100 * SimVariant::ALL.len());

    for variant in SimVariant::ALL {
        for word in WORD_LIST {
            for suffix in 0..100 {
                let code = format!("{}-{word}{suffix:02}", variant.code());
                let (decoded, seed) = decode_to_seed(&code)
                    .with_context(|| format!("failed to parse share code: {code}"))?;
                seeds.push(SeedInfo::from_share_code(seed, decoded, code));
            }
        }
    }

    Ok(seeds)
}
