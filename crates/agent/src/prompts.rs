//! Fixed-form prompt builders for the generative capability.
//!
//! Every prompt that expects structured output names its answer fields
//! explicitly; the counterpart parsers live in `parse`.

use safiri_core::{Classification, FlowKind};

/// Prompt asking the generative capability to confirm or override a
/// low-confidence classification. Answer format is the fixed three-field
/// form parsed by `parse::parse_verification`.
pub fn verification_prompt(text: &str, classification: &Classification) -> String {
    let mut entries: Vec<(&str, f64)> =
        classification.distribution.iter().map(|(label, p)| (label.as_str(), *p)).collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let distribution = entries
        .iter()
        .map(|(label, p)| format!("{label}: {p:.2}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Analyze the user's message and determine their intent.\n\
         \n\
         User message: \"{text}\"\n\
         \n\
         The classifier suggests: {label} (confidence: {confidence:.2})\n\
         All probabilities: {distribution}\n\
         \n\
         Based on this message, what is the user's primary intent? Choose from:\n\
         - faq: Questions about services, pricing, policies\n\
         - booking: Vehicle booking or reservation requests\n\
         - payment: Payment inquiries or money transfers\n\
         - weather: Weather-related questions\n\
         - general: General conversation, greetings, chitchat\n\
         \n\
         Respond with ONLY the intent label and a confidence score (0-1), formatted as:\n\
         INTENT: <label>\n\
         CONFIDENCE: <score>\n\
         REASONING: <brief explanation>",
        label = classification.label,
        confidence = classification.confidence,
    )
}

/// Prompt extracting every slot of `kind` from the flow-opening message in
/// one call. Fields the message does not mention must answer `unknown`.
pub fn extraction_prompt(kind: FlowKind, message: &str) -> String {
    let fields = kind
        .schema()
        .slots
        .iter()
        .map(|slot| format!("{}: <value or \"unknown\">", slot.extraction_field))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Extract {flow} details from this message: \"{message}\"\n\
         \n\
         Return in this exact format:\n\
         {fields}\n\
         \n\
         Only extract information that is explicitly mentioned.",
        flow = kind.name(),
    )
}

pub fn city_prompt(message: &str) -> String {
    format!(
        "Extract the city name from this message: '{message}'. \
         Reply with ONLY the city name, nothing else."
    )
}

pub fn faq_fallback_prompt(message: &str) -> String {
    format!("Answer this FAQ question professionally: {message}")
}

#[cfg(test)]
mod tests {
    use safiri_core::{Classification, FlowKind};

    use super::{extraction_prompt, verification_prompt};

    #[test]
    fn verification_prompt_carries_text_and_distribution() {
        let mut classification = Classification::new("faq", 0.4);
        classification.distribution.insert("booking".to_owned(), 0.35);

        let prompt = verification_prompt("need a ride", &classification);
        assert!(prompt.contains("need a ride"));
        assert!(prompt.contains("faq (confidence: 0.40)"));
        assert!(prompt.contains("booking: 0.35"));
        assert!(prompt.contains("INTENT: <label>"));
    }

    #[test]
    fn verification_prompt_distribution_order_is_deterministic() {
        let mut classification = Classification::new("weather", 0.3);
        classification.distribution.insert("booking".to_owned(), 0.2);
        classification.distribution.insert("faq".to_owned(), 0.25);

        let first = verification_prompt("hm", &classification);
        let second = verification_prompt("hm", &classification);
        assert_eq!(first, second);
        let booking_at = first.find("booking:").expect("booking entry");
        let weather_at = first.find("weather:").expect("weather entry");
        assert!(booking_at < weather_at);
    }

    #[test]
    fn extraction_prompt_lists_every_schema_field() {
        let prompt = extraction_prompt(FlowKind::Booking, "a sedan tomorrow");
        for field in ["VEHICLE_TYPE:", "PICKUP:", "DROPOFF:", "DATE:", "TIME:"] {
            assert!(prompt.contains(field), "missing {field}");
        }
        assert!(prompt.contains("a sedan tomorrow"));
    }
}
