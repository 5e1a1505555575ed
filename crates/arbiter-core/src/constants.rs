/// ─── Arbiter Protocol Constants ─────────────────────────────────────────────
///
/// Fixed-point conventions and default timing for the oracle consumer
/// contracts. All prices and token amounts use the same 6-decimal scale so
/// that 1_000_000 units == 1.00.

// ── Fixed-point scale ────────────────────────────────────────────────────────

/// Prices are fixed-point integers scaled by 1e6 (e.g. 2_431_170_000 = $2431.17).
pub const PRICE_SCALE: u128 = 1_000_000;

/// The stable token uses 6 decimals, USDC-style.
pub const STABLE_TOKEN_DECIMALS: u32 = 6;

/// 1 whole stable token expressed in base units.
pub const UNITS_PER_TOKEN: u128 = 1_000_000;

/// 1 whole native coin expressed in base units.
pub const UNITS_PER_NATIVE: u128 = 1_000_000;

// ── Marketplace ──────────────────────────────────────────────────────────────

/// Fee and royalty percentages are expressed in basis points.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Royalties are capped at 20%.
pub const MAX_ROYALTY_BPS: u16 = 2_000;

/// Default flat fee for creating a marketplace token, in native base units.
pub const DEFAULT_CREATION_FEE: u128 = 100;

/// Default platform cut of each mint, in basis points (2.5%).
pub const DEFAULT_PLATFORM_FEE_BPS: u16 = 250;

// ── Automation ───────────────────────────────────────────────────────────────

/// Default minimum elapsed time between automated price requests (seconds).
pub const DEFAULT_AUTOMATION_INTERVAL_SECS: i64 = 3600;

// ── Oracle results ───────────────────────────────────────────────────────────

/// Maximum number of significant bytes in a big-endian price payload.
/// Anything wider does not fit a u128 and fails decoding.
pub const MAX_PRICE_PAYLOAD_BYTES: usize = 16;
