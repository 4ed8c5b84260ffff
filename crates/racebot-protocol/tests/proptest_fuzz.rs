//! Property-based fuzz tests for frame decoding.
//!
//! Ensures the decoder never panics on arbitrary input.

use proptest::prelude::*;
use racebot_protocol::{Command, decode_line, encode_line};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Arbitrary text must never cause a panic.
    #[test]
    fn prop_random_text_no_panic(line in ".{0,256}") {
        let _ = decode_line(&line);
    }

    /// A well-formed frame with a random payload must not panic for any known type.
    #[test]
    fn prop_known_type_random_payload_no_panic(
        msg_type in prop::sample::select(vec![
            "join", "yourCar", "gameInit", "gameStart", "carPositions", "crash",
            "spawn", "gameEnd", "error", "lapFinished", "turboAvailable",
        ]),
        payload in prop_oneof![
            Just("null".to_string()),
            any::<i64>().prop_map(|n| n.to_string()),
            "[a-z]{0,12}".prop_map(|s| format!("\"{s}\"")),
            Just("{}".to_string()),
            Just("[]".to_string()),
        ],
    ) {
        let line = format!(r#"{{"msgType":"{msg_type}","data":{payload}}}"#);
        let _ = decode_line(&line);
    }

    /// Throttle commands always encode to a single line with a level in range.
    #[test]
    fn prop_throttle_encodes_in_range(level in any::<f64>()) {
        let line = encode_line(&Command::throttle(level)).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(line.ends_with('\n'));
        prop_assert_eq!(line.matches('\n').count(), 1);
        let value: serde_json::Value = serde_json::from_str(&line)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let data = value["data"].as_f64().unwrap_or(-1.0);
        prop_assert!((0.0..=1.0).contains(&data));
    }
}
