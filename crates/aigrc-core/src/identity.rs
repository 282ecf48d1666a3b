//! Deterministic event identity derivation for the two producer classes.
//!
//! The hash-input string grammar here — field order, the literal `:`
//! separator, decimal encoding of the floored millisecond integer — is
//! external contract (see §6 Event-ID contract): any producer or verifier in
//! any language must reproduce the same bytes.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

pub const ID_PREFIX: &str = "evt_";

/// `floor10ms(t) = ⌊t_ms / 10⌋ · 10`
pub fn floor_10ms(t: DateTime<Utc>) -> i64 {
    (t.timestamp_millis() / 10) * 10
}

/// `floor1ms(t) = ⌊t_ms⌋` (timestamps are already millisecond-resolution on the wire)
pub fn floor_1ms(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

fn first_32_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(digest)[..32].to_string()
}

/// Source profile for a **standard** (interactive/CI) producer.
#[derive(Debug, Clone)]
pub struct StandardSource<'a> {
    pub org_id: &'a str,
    pub tool: &'a str,
    pub event_type: &'a str,
    pub asset_id: &'a str,
    pub produced_at: DateTime<Utc>,
}

impl StandardSource<'_> {
    /// `id = "evt_" + first32hex(SHA256(orgId ":" tool ":" type ":" assetId ":" floor10ms(producedAt)))`
    pub fn derive_id(&self) -> String {
        let floored = floor_10ms(self.produced_at);
        let input = format!(
            "{}:{}:{}:{}:{}",
            self.org_id, self.tool, self.event_type, self.asset_id, floored
        );
        format!("{ID_PREFIX}{}", first_32_hex(&input))
    }
}

/// Source profile for a **high-frequency** (runtime/firewall) producer.
#[derive(Debug, Clone)]
pub struct HighFrequencySource<'a> {
    pub instance_id: &'a str,
    pub event_type: &'a str,
    pub asset_id: &'a str,
    pub produced_at: DateTime<Utc>,
    pub local_seq: u64,
}

impl HighFrequencySource<'_> {
    /// `id = "evt_" + first32hex(SHA256(instanceId ":" type ":" assetId ":" floor1ms(producedAt) ":" localSeq))`
    pub fn derive_id(&self) -> String {
        let floored = floor_1ms(self.produced_at);
        let input = format!(
            "{}:{}:{}:{}:{}",
            self.instance_id, self.event_type, self.asset_id, floored, self.local_seq
        );
        format!("{ID_PREFIX}{}", first_32_hex(&input))
    }
}

/// The producer's source profile, used to derive a deterministic event id.
#[derive(Debug, Clone)]
pub enum SourceProfile<'a> {
    Standard(StandardSource<'a>),
    HighFrequency(HighFrequencySource<'a>),
}

impl SourceProfile<'_> {
    pub fn derive_id(&self) -> String {
        match self {
            Self::Standard(s) => s.derive_id(),
            Self::HighFrequency(s) => s.derive_id(),
        }
    }
}

/// Monotonic per-instance sequence generator for high-frequency producers,
/// disambiguating events that land in the same 1 ms flooring window.
#[derive(Debug, Default)]
pub struct LocalSequence(std::sync::atomic::AtomicU64);

impl LocalSequence {
    pub fn new() -> Self {
        Self(std::sync::atomic::AtomicU64::new(0))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn standard_id_is_deterministic() {
        let src = StandardSource {
            org_id: "org-pangolabs",
            tool: "scanner",
            event_type: "asset.discovered",
            asset_id: "asset-1",
            produced_at: ts(1_700_000_000_123),
        };
        assert_eq!(src.derive_id(), src.derive_id());
        assert!(src.derive_id().starts_with(ID_PREFIX));
        assert_eq!(src.derive_id().len(), ID_PREFIX.len() + 32);
    }

    #[test]
    fn standard_id_collides_within_10ms_window() {
        let base = StandardSource {
            org_id: "org-a",
            tool: "t",
            event_type: "ty",
            asset_id: "a",
            produced_at: ts(1_700_000_000_120),
        };
        let shifted = StandardSource {
            produced_at: ts(1_700_000_000_129),
            ..base.clone()
        };
        assert_eq!(base.derive_id(), shifted.derive_id());
    }

    #[test]
    fn standard_id_differs_across_10ms_windows() {
        let base = StandardSource {
            org_id: "org-a",
            tool: "t",
            event_type: "ty",
            asset_id: "a",
            produced_at: ts(1_700_000_000_120),
        };
        let shifted = StandardSource {
            produced_at: ts(1_700_000_000_131),
            ..base.clone()
        };
        assert_ne!(base.derive_id(), shifted.derive_id());
    }

    #[test]
    fn high_frequency_id_uses_local_seq_to_disambiguate() {
        let base = HighFrequencySource {
            instance_id: "inst-1",
            event_type: "ty",
            asset_id: "a",
            produced_at: ts(1_700_000_000_120),
            local_seq: 0,
        };
        let next = HighFrequencySource {
            local_seq: 1,
            ..base.clone()
        };
        assert_ne!(base.derive_id(), next.derive_id());
    }

    #[test]
    fn local_sequence_is_monotonic() {
        let seq = LocalSequence::new();
        let a = seq.next();
        let b = seq.next();
        assert!(b > a);
    }

    #[test]
    fn floor_10ms_rounds_down_to_multiple_of_ten() {
        assert_eq!(floor_10ms(ts(1_000)), 1_000);
        assert_eq!(floor_10ms(ts(1_009)), 1_000);
        assert_eq!(floor_10ms(ts(1_010)), 1_010);
    }
}
