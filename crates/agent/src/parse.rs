//! Permissive parsers for the fixed-field replies requested by `prompts`.
//!
//! Generative output is never trusted to be well formed: missing fields
//! fall back to documented defaults and unusable replies are discarded
//! wholesale rather than half-applied.

use std::collections::BTreeMap;

use safiri_core::{FlowKind, Intent};

/// Confidence assumed when a verification reply has no parseable
/// `CONFIDENCE:` field.
pub const DEFAULT_VERIFIED_CONFIDENCE: f64 = 0.7;

/// Parses a verification reply into `(intent, confidence)`.
///
/// Returns `None` when no `INTENT:` field is present or its label is
/// outside the known set; the caller then keeps the original classifier
/// result untouched.
pub fn parse_verification(reply: &str) -> Option<(Intent, f64)> {
    let mut label: Option<String> = None;
    let mut confidence = DEFAULT_VERIFIED_CONFIDENCE;

    for line in reply.lines() {
        if let Some(value) = field_value(line, "INTENT") {
            label = Some(value.to_owned());
        } else if let Some(value) = field_value(line, "CONFIDENCE") {
            confidence = value.parse().unwrap_or(DEFAULT_VERIFIED_CONFIDENCE);
        }
    }

    let intent = Intent::parse_known(&label?).ok()?;
    Some((intent, confidence))
}

/// Parses a bulk-extraction reply into slot key → value for `kind`.
///
/// Lines are matched against the schema's extraction fields
/// case-insensitively; fields answered `unknown` (any casing) and fields
/// outside the schema are dropped.
pub fn parse_extraction(kind: FlowKind, reply: &str) -> BTreeMap<String, String> {
    let schema = kind.schema();
    let mut extracted = BTreeMap::new();

    for line in reply.lines() {
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let field = field.trim();
        let value = value.trim().trim_matches('"').trim();
        if value.is_empty() || value.eq_ignore_ascii_case("unknown") {
            continue;
        }
        let matched =
            schema.slots.iter().find(|slot| slot.extraction_field.eq_ignore_ascii_case(field));
        if let Some(slot) = matched {
            extracted.insert(slot.key.to_owned(), value.to_owned());
        }
    }

    extracted
}

fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let (head, tail) = line.split_once(':')?;
    head.trim().eq_ignore_ascii_case(field).then(|| tail.trim())
}

#[cfg(test)]
mod tests {
    use safiri_core::{FlowKind, Intent};

    use super::{parse_extraction, parse_verification};

    #[test]
    fn well_formed_verification_parses() {
        let reply = "INTENT: booking\nCONFIDENCE: 0.8\nREASONING: mentions a car";
        assert_eq!(parse_verification(reply), Some((Intent::Booking, 0.8)));
    }

    #[test]
    fn garbled_confidence_defaults() {
        let reply = "INTENT: weather\nCONFIDENCE: very sure\nREASONING: n/a";
        assert_eq!(parse_verification(reply), Some((Intent::Weather, 0.7)));
    }

    #[test]
    fn missing_confidence_defaults() {
        let reply = "INTENT: faq";
        assert_eq!(parse_verification(reply), Some((Intent::Faq, 0.7)));
    }

    #[test]
    fn missing_intent_discards_the_reply() {
        assert_eq!(parse_verification("I think the user wants to book a car."), None);
        assert_eq!(parse_verification("CONFIDENCE: 0.9"), None);
    }

    #[test]
    fn unknown_label_discards_the_reply() {
        let reply = "INTENT: smalltalk\nCONFIDENCE: 0.95";
        assert_eq!(parse_verification(reply), None);
    }

    #[test]
    fn extraction_keeps_only_known_non_unknown_fields() {
        let reply = "VEHICLE_TYPE: sedan\n\
                     PICKUP: Nairobi\n\
                     DROPOFF: unknown\n\
                     DATE: Unknown\n\
                     TIME: 9am\n\
                     COLOR: red";
        let extracted = parse_extraction(FlowKind::Booking, reply);

        assert_eq!(extracted.get("vehicle_type").map(String::as_str), Some("sedan"));
        assert_eq!(extracted.get("pickup_location").map(String::as_str), Some("Nairobi"));
        assert_eq!(extracted.get("time").map(String::as_str), Some("9am"));
        assert!(!extracted.contains_key("dropoff_location"));
        assert!(!extracted.contains_key("date"));
        assert_eq!(extracted.len(), 3);
    }

    #[test]
    fn extraction_tolerates_casing_and_quotes() {
        let reply = "vehicle_type: \"van\"\nPickup: Westlands";
        let extracted = parse_extraction(FlowKind::Booking, reply);
        assert_eq!(extracted.get("vehicle_type").map(String::as_str), Some("van"));
        assert_eq!(extracted.get("pickup_location").map(String::as_str), Some("Westlands"));
    }

    #[test]
    fn extraction_of_freeform_prose_yields_nothing() {
        let extracted = parse_extraction(FlowKind::Payment, "Sure, happy to help with that!");
        assert!(extracted.is_empty());
    }
}
