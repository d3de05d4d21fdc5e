//! Sensor frame wire parser
//!
//! The simulator sends one frame per tick as a run of parenthesized groups:
//!
//! ```text
//! (angle 0.0031)(rpm 4172.5)(gear 2)(track 7.33 7.61 8.12 ...)
//! ```
//!
//! Each group is a key followed by one or more whitespace separated tokens.
//! Values are kept as their raw text and only interpreted on access, so
//! range-finder arrays and scalar readings share one representation.
//!
//! Whitespace between groups is tolerated, so an encoded control command
//! reads back through the same parser.

use std::convert::Infallible;
use std::str::FromStr;

/// One tick's decoded telemetry snapshot
///
/// Keys are unique and keep the order in which they first appeared on the
/// wire. Parsing never fails; a key that is missing or garbled simply reads
/// as `None` (or zero through [`SensorFrame::scalar_or_zero`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorFrame {
    entries: Vec<(String, String)>,
}

impl SensorFrame {
    /// Decode a raw datagram into a frame
    pub fn parse(raw: &str) -> Self {
        let body = raw
            .trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .trim_matches(|c: char| c == '(' || c == ')');

        let mut frame = Self::default();
        for chunk in body.split(')') {
            let chunk = chunk.trim_start().trim_start_matches('(');
            let mut tokens = chunk.split_whitespace();
            let Some(key) = tokens.next() else {
                continue;
            };
            let value = tokens.collect::<Vec<_>>().join(" ");
            if value.is_empty() {
                continue;
            }
            frame.insert(key, value);
        }
        frame
    }

    fn insert(&mut self, key: &str, value: String) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Raw value text for a key (tokens joined by single spaces)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Every token of a key that parses as a number, in wire order
    pub fn values(&self, key: &str) -> Vec<f64> {
        self.get(key)
            .map(|v| {
                v.split_whitespace()
                    .filter_map(|t| t.parse::<f64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Value of a single-token key
    ///
    /// Returns `None` when the key is absent, carries more than one token,
    /// or does not parse as a number.
    pub fn scalar(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.trim().parse::<f64>().ok())
    }

    pub fn scalar_or_zero(&self, key: &str) -> f64 {
        self.scalar(key).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, raw value)` pairs in wire order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for SensorFrame {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "(angle 0.00313)(curLapTime -0.982)(damage 0)\
        (distFromStart 2061.15)(distRaced 0)(fuel 94)(gear 0)(lastLapTime 0)\
        (opponents 200 200 200)(racePos 1)(rpm 942.478)(speedX -0.0127)\
        (speedY 0.0084)(speedZ -0.0003)(track 7.33 7.61 8.12 9.03 10.65)\
        (trackPos -0.333)(wheelSpinVel 0 0 0 0)(z 0.345)(focus -1 -1 -1 -1 -1)";

    #[test]
    fn test_parse_sample_frame() {
        let frame = SensorFrame::parse(SAMPLE);
        assert_eq!(frame.len(), 19);
        assert_eq!(frame.get("angle"), Some("0.00313"));
        assert_eq!(frame.get("track"), Some("7.33 7.61 8.12 9.03 10.65"));
        assert_eq!(frame.scalar("rpm"), Some(942.478));
        assert_eq!(frame.scalar("gear"), Some(0.0));
    }

    #[test]
    fn test_parse_keeps_wire_order() {
        let frame = SensorFrame::parse("(b 1)(a 2)(c 3)");
        let keys: Vec<&str> = frame.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_parse_repeated_key_takes_last_value() {
        let frame = SensorFrame::parse("(rpm 1000)(gear 2)(rpm 2000)");
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.scalar("rpm"), Some(2000.0));
    }

    #[test]
    fn test_parse_drops_key_without_value() {
        let frame = SensorFrame::parse("(rpm)(gear 3)()");
        assert!(!frame.contains("rpm"));
        assert_eq!(frame.scalar("gear"), Some(3.0));
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_parse_collapses_inner_whitespace() {
        let frame = SensorFrame::parse("(track  1.0\t2.0   3.0 )");
        assert_eq!(frame.get("track"), Some("1.0 2.0 3.0"));
        assert_eq!(frame.values("track"), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parse_trims_padding_and_nul() {
        let frame = SensorFrame::parse("  (speedX 12.5)(rpm 3000)\0\0");
        assert_eq!(frame.scalar("speedX"), Some(12.5));
        assert_eq!(frame.scalar("rpm"), Some(3000.0));
    }

    #[test]
    fn test_parse_tolerates_space_between_groups() {
        let frame = SensorFrame::parse("(accel 1) (brake 0)  (gear 2)");
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.scalar("brake"), Some(0.0));
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(SensorFrame::parse("").is_empty());
        assert!(SensorFrame::parse("   ").is_empty());
        assert!(SensorFrame::parse("()").is_empty());
    }

    #[test]
    fn test_parse_garbage_defaults_to_zero() {
        let frame = SensorFrame::parse("garbage no parens");
        assert!(frame.len() <= 1);
        for key in ["speedX", "rpm", "gear", "trackPos", "angle"] {
            assert_eq!(frame.scalar_or_zero(key), 0.0);
        }
    }

    #[test]
    fn test_scalar_rejects_multi_token_values() {
        let frame = SensorFrame::parse("(track 1 2 3)(name abc)");
        assert_eq!(frame.scalar("track"), None);
        assert_eq!(frame.scalar("name"), None);
        assert_eq!(frame.scalar_or_zero("name"), 0.0);
        assert!(frame.values("name").is_empty());
    }

    #[test]
    fn test_from_str() {
        let frame: SensorFrame = "(rpm 5000)".parse().unwrap();
        assert_eq!(frame.scalar("rpm"), Some(5000.0));
    }
}
