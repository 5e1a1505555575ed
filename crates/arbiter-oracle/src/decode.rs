use arbiter_core::constants::MAX_PRICE_PAYLOAD_BYTES;
use arbiter_core::error::ArbiterError;
use arbiter_core::request::{RequestKind, TxVerdict};
use arbiter_core::types::Balance;
use serde::{Deserialize, Serialize};

// ── Domain values ────────────────────────────────────────────────────────────

/// A decoded oracle result. Decoding fails closed: malformed or absent data
/// is an error, never a default value.
#[derive(Clone, Debug, PartialEq)]
pub enum DomainValue {
    /// Fixed-point price scaled by 1e6. Zero is a *valid decode*; treating
    /// it as "no usable price" is the caller's application gate.
    Price(Balance),
    Prompt(String),
    TxOutcome(TxOutcome),
}

/// Structured fields of a verified transaction, as reported by the network.
/// All fields optional — the network omits what it could not observe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxDetails {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// 1 = succeeded, 0 = reverted.
    #[serde(default)]
    pub status: Option<u8>,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    /// Set when the network failed to verify at all.
    #[serde(default)]
    pub error: Option<String>,
}

/// Outcome of a TxVerification decode. `details` is present only on the
/// structured path; `raw` always keeps the original text for display.
#[derive(Clone, Debug, PartialEq)]
pub struct TxOutcome {
    pub verdict: TxVerdict,
    pub details: Option<TxDetails>,
    pub raw: String,
}

// ── Decoder ──────────────────────────────────────────────────────────────────

/// Type-tagged decoding of raw oracle bytes into a domain value.
pub fn decode(kind: RequestKind, bytes: &[u8]) -> Result<DomainValue, ArbiterError> {
    match kind {
        RequestKind::PriceUpdate => decode_price(bytes).map(DomainValue::Price),
        RequestKind::PromptGeneration => decode_prompt(bytes).map(DomainValue::Prompt),
        RequestKind::TxVerification => decode_tx(bytes).map(DomainValue::TxOutcome),
    }
}

/// Big-endian unsigned integer, widths up to a zero-padded 32-byte word.
/// More than 16 significant bytes cannot fit the fixed-point range.
fn decode_price(bytes: &[u8]) -> Result<Balance, ArbiterError> {
    if bytes.is_empty() {
        return Err(ArbiterError::MalformedPrice("empty payload".into()));
    }
    let significant = match bytes.iter().position(|&b| b != 0) {
        Some(pos) => &bytes[pos..],
        None => return Ok(0),
    };
    if significant.len() > MAX_PRICE_PAYLOAD_BYTES {
        return Err(ArbiterError::MalformedPrice(format!(
            "{} significant bytes exceed u128 range",
            significant.len()
        )));
    }
    let mut value: Balance = 0;
    for &b in significant {
        value = (value << 8) | b as Balance;
    }
    Ok(value)
}

fn decode_prompt(bytes: &[u8]) -> Result<String, ArbiterError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ArbiterError::InvalidUtf8)?;
    if text.is_empty() {
        return Err(ArbiterError::NoPromptAvailable);
    }
    Ok(text.to_string())
}

/// Structured JSON payload preferred; the substring heuristic below is a
/// deprecated fallback kept only for legacy string results.
fn decode_tx(bytes: &[u8]) -> Result<TxOutcome, ArbiterError> {
    let raw = std::str::from_utf8(bytes)
        .map_err(|_| ArbiterError::MalformedTxPayload("not valid UTF-8".into()))?
        .to_string();
    if raw.is_empty() {
        return Err(ArbiterError::MalformedTxPayload("empty payload".into()));
    }

    if let Ok(details) = serde_json::from_str::<TxDetails>(&raw) {
        let verdict = if details.error.is_some() {
            TxVerdict::Failed
        } else {
            match details.status {
                Some(1) => TxVerdict::Successful,
                Some(_) => TxVerdict::Failed,
                None => TxVerdict::Unknown,
            }
        };
        return Ok(TxOutcome { verdict, details: Some(details), raw });
    }

    // Deprecated heuristic path: classify an opaque string by substring.
    let lower = raw.to_lowercase();
    let verdict = if lower.contains("successful") {
        TxVerdict::Successful
    } else if lower.contains("failed") || lower.contains("error") {
        TxVerdict::Failed
    } else {
        TxVerdict::Unknown
    };
    Ok(TxOutcome { verdict, details: None, raw })
}

// ── Tests ────────────────────────────────────────────────────────────────────
