use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::flows::schema::{FlowKind, SlotSpec};
use crate::session::ConversationState;

pub const STEP_INITIATED: &str = "initiated";
pub const STEP_AWAITING_CONFIRMATION: &str = "awaiting_confirmation";

/// Replies accepted as confirmation. Anything else declines; there is no
/// retry on ambiguous replies.
pub const AFFIRMATIVE_TOKENS: &[&str] = &["yes", "y", "confirm", "ok", "sure"];

/// Outcome of advancing a flow by one user reply.
#[derive(Clone, Debug, PartialEq)]
pub enum FlowTurn {
    /// A slot is still missing; ask for it.
    AskNext { kind: FlowKind, question: String },
    /// All slots filled; the summary was emitted and the flow now waits for
    /// a yes/no.
    AwaitConfirmation { kind: FlowKind, summary: String },
    /// User confirmed; invoke `tool` with `args` and the flow is cleared.
    Confirmed { kind: FlowKind, tool: &'static str, args: Value },
    /// User declined; the flow is cleared.
    Cancelled { kind: FlowKind },
    /// `current_flow` held a name no schema recognizes. The flow fields are
    /// cleared; the caller should re-route the message as if idle.
    UnknownFlow { name: String },
}

/// What the flow needs from the user next.
#[derive(Clone, Debug, PartialEq)]
pub enum FlowPrompt {
    Ask { question: String },
    Confirm { summary: String },
}

/// Enters `kind`, replacing any prior flow state. Every schema slot is
/// seeded unfilled, then `initial_slots` entries matching the schema are
/// overlaid; keys outside the schema are ignored.
pub fn start_flow(
    state: &mut ConversationState,
    kind: FlowKind,
    initial_slots: BTreeMap<String, String>,
) {
    let schema = kind.schema();
    let mut flow_data: BTreeMap<String, Option<String>> =
        schema.slots.iter().map(|slot| (slot.key.to_owned(), None)).collect();
    for (key, value) in initial_slots {
        if schema.slot(&key).is_some() {
            flow_data.insert(key, Some(value));
        }
    }
    state.begin_flow(kind.name(), STEP_INITIATED, flow_data);
}

/// Writes `value` into a schema slot; non-schema keys are rejected.
pub fn fill_slot(state: &mut ConversationState, kind: FlowKind, key: &str, value: String) -> bool {
    if kind.schema().slot(key).is_none() {
        return false;
    }
    state.flow_data.insert(key.to_owned(), Some(value));
    state.touch();
    true
}

/// Question for the first unfilled slot in schema order, or `None` once all
/// slots are filled. Strict ordered scan; slots are never skipped.
pub fn next_question(kind: FlowKind, flow_data: &BTreeMap<String, Option<String>>) -> Option<&'static str> {
    first_unfilled(kind, flow_data).map(|slot| slot.question)
}

/// Recomputes what to ask next, moving the flow to the confirmation step
/// when nothing is missing.
pub fn next_prompt(state: &mut ConversationState, kind: FlowKind) -> FlowPrompt {
    match next_question(kind, &state.flow_data) {
        Some(question) => FlowPrompt::Ask { question: question.to_owned() },
        None => {
            state.flow_step = Some(STEP_AWAITING_CONFIRMATION.to_owned());
            state.touch();
            FlowPrompt::Confirm { summary: summary(kind, &state.flow_data) }
        }
    }
}

/// Advances the active flow by one user reply.
///
/// Outside the confirmation step, the raw reply is written verbatim into
/// the next unfilled slot; no validation or re-extraction happens here.
pub fn advance(state: &mut ConversationState, reply: &str) -> FlowTurn {
    let name = state.current_flow.clone().unwrap_or_default();
    let Some(kind) = FlowKind::from_name(&name) else {
        state.end_flow();
        return FlowTurn::UnknownFlow { name };
    };

    if state.flow_step.as_deref() == Some(STEP_AWAITING_CONFIRMATION) {
        let args = slot_args(&state.flow_data);
        state.end_flow();
        if is_affirmative(reply) {
            return FlowTurn::Confirmed { kind, tool: kind.schema().completion_tool, args };
        }
        return FlowTurn::Cancelled { kind };
    }

    if let Some(slot) = first_unfilled(kind, &state.flow_data) {
        state.flow_data.insert(slot.key.to_owned(), Some(reply.to_owned()));
        state.touch();
    }

    match next_prompt(state, kind) {
        FlowPrompt::Ask { question } => FlowTurn::AskNext { kind, question },
        FlowPrompt::Confirm { summary } => FlowTurn::AwaitConfirmation { kind, summary },
    }
}

pub fn is_affirmative(reply: &str) -> bool {
    let normalized = reply.trim().to_ascii_lowercase();
    AFFIRMATIVE_TOKENS.contains(&normalized.as_str())
}

/// Human-readable recap of the collected slots plus the yes/no question.
pub fn summary(kind: FlowKind, flow_data: &BTreeMap<String, Option<String>>) -> String {
    let schema = kind.schema();
    let mut lines = vec![format!("{} summary:", capitalize(kind.name()))];
    for slot in schema.slots {
        let value = flow_data.get(slot.key).and_then(|v| v.as_deref()).unwrap_or("-");
        lines.push(format!("  {}: {}", slot.label, value));
    }
    lines.push(format!("Would you like to confirm this {}? (yes/no)", kind.name()));
    lines.join("\n")
}

fn first_unfilled(
    kind: FlowKind,
    flow_data: &BTreeMap<String, Option<String>>,
) -> Option<&'static SlotSpec> {
    kind.schema().slots.iter().find(|slot| {
        flow_data.get(slot.key).and_then(|v| v.as_deref()).map(str::trim).unwrap_or("").is_empty()
    })
}

fn slot_args(flow_data: &BTreeMap<String, Option<String>>) -> Value {
    let mut args = Map::new();
    for (key, value) in flow_data {
        let entry = value.as_ref().map(|v| Value::String(v.clone())).unwrap_or(Value::Null);
        args.insert(key.clone(), entry);
    }
    Value::Object(args)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        advance, fill_slot, is_affirmative, next_question, start_flow, FlowTurn,
        STEP_AWAITING_CONFIRMATION, STEP_INITIATED,
    };
    use crate::flows::FlowKind;
    use crate::session::ConversationState;

    fn booking_state(initial: &[(&str, &str)]) -> ConversationState {
        let mut state = ConversationState::new("u1", "s1");
        let slots = initial
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect::<BTreeMap<_, _>>();
        start_flow(&mut state, FlowKind::Booking, slots);
        state
    }

    #[test]
    fn start_flow_seeds_every_slot_and_marks_initiated() {
        let state = booking_state(&[]);
        assert_eq!(state.current_flow.as_deref(), Some("booking"));
        assert_eq!(state.flow_step.as_deref(), Some(STEP_INITIATED));
        assert_eq!(state.flow_data.len(), 5);
        assert!(state.flow_data.values().all(Option::is_none));
    }

    #[test]
    fn start_flow_ignores_keys_outside_the_schema() {
        let state = booking_state(&[("seat_heaters", "on"), ("pickup_location", "Nairobi")]);
        assert!(!state.flow_data.contains_key("seat_heaters"));
        assert_eq!(
            state.flow_data.get("pickup_location"),
            Some(&Some("Nairobi".to_owned()))
        );
    }

    #[test]
    fn prefilled_pickup_still_asks_vehicle_type_first() {
        let state = booking_state(&[("pickup_location", "Nairobi CBD")]);
        let question = next_question(FlowKind::Booking, &state.flow_data).expect("question");
        assert!(question.contains("vehicle"));
        assert!(!question.contains("go"));
    }

    #[test]
    fn replies_fill_slots_in_strict_order() {
        let mut state = booking_state(&[]);
        let turn = advance(&mut state, "sedan");
        assert!(matches!(turn, FlowTurn::AskNext { question, .. } if question.contains("pick you up")));
        assert_eq!(state.flow_data.get("vehicle_type"), Some(&Some("sedan".to_owned())));

        let turn = advance(&mut state, "Nairobi");
        assert!(matches!(turn, FlowTurn::AskNext { question, .. } if question.contains("go")));
    }

    #[test]
    fn filling_the_last_slot_moves_to_confirmation() {
        let mut state = booking_state(&[
            ("vehicle_type", "sedan"),
            ("pickup_location", "Nairobi"),
            ("dropoff_location", "Kisumu"),
            ("date", "tomorrow"),
        ]);

        let turn = advance(&mut state, "9am");
        match turn {
            FlowTurn::AwaitConfirmation { summary, .. } => {
                assert!(summary.contains("Vehicle: sedan"));
                assert!(summary.contains("Time: 9am"));
                assert!(summary.contains("(yes/no)"));
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
        assert_eq!(state.flow_step.as_deref(), Some(STEP_AWAITING_CONFIRMATION));
    }

    #[test]
    fn affirmative_reply_completes_and_clears_the_flow() {
        let mut state = booking_state(&[
            ("vehicle_type", "sedan"),
            ("pickup_location", "Nairobi"),
            ("dropoff_location", "Kisumu"),
            ("date", "tomorrow"),
            ("time", "9am"),
        ]);
        state.flow_step = Some(STEP_AWAITING_CONFIRMATION.to_owned());

        let turn = advance(&mut state, "YES");
        match turn {
            FlowTurn::Confirmed { tool, args, .. } => {
                assert_eq!(tool, "book_vehicle");
                assert_eq!(args["pickup_location"], "Nairobi");
                assert_eq!(args["time"], "9am");
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
        assert!(!state.is_in_flow());
        assert!(state.flow_data.is_empty());
    }

    #[test]
    fn any_non_affirmative_token_declines() {
        for reply in ["no", "maybe", "cancel", "yess", "si"] {
            let mut state = booking_state(&[
                ("vehicle_type", "sedan"),
                ("pickup_location", "Nairobi"),
                ("dropoff_location", "Kisumu"),
                ("date", "tomorrow"),
                ("time", "9am"),
            ]);
            state.flow_step = Some(STEP_AWAITING_CONFIRMATION.to_owned());

            let turn = advance(&mut state, reply);
            assert!(matches!(turn, FlowTurn::Cancelled { .. }), "reply {reply:?} should decline");
            assert!(!state.is_in_flow());
        }
    }

    #[test]
    fn affirmative_tokens_match_case_insensitively() {
        for reply in ["yes", " Y ", "CONFIRM", "ok", "Sure"] {
            assert!(is_affirmative(reply), "{reply:?} should confirm");
        }
        assert!(!is_affirmative("maybe"));
    }

    #[test]
    fn unknown_flow_clears_state_for_rerouting() {
        let mut state = ConversationState::new("u1", "s1");
        state.current_flow = Some("delivery".to_owned());
        state.flow_step = Some("initiated".to_owned());
        state.flow_data.insert("parcel".to_owned(), None);

        let turn = advance(&mut state, "hello");
        assert_eq!(turn, FlowTurn::UnknownFlow { name: "delivery".to_owned() });
        assert!(!state.is_in_flow());
        assert!(state.flow_step.is_none());
        assert!(state.flow_data.is_empty());
    }

    #[test]
    fn fill_slot_rejects_foreign_keys() {
        let mut state = booking_state(&[]);
        assert!(fill_slot(&mut state, FlowKind::Booking, "date", "friday".to_owned()));
        assert!(!fill_slot(&mut state, FlowKind::Booking, "amount", "500".to_owned()));
        assert!(!state.flow_data.contains_key("amount"));
    }

    #[test]
    fn payment_flow_collects_amount_first() {
        let mut state = ConversationState::new("u1", "s1");
        start_flow(&mut state, FlowKind::Payment, BTreeMap::new());

        let turn = advance(&mut state, "1500");
        assert!(matches!(turn, FlowTurn::AskNext { question, .. } if question.contains("send the money")));

        let turn = advance(&mut state, "Alice");
        assert!(matches!(turn, FlowTurn::AskNext { question, .. } if question.contains("payment method")));

        let turn = advance(&mut state, "M-Pesa");
        assert!(matches!(turn, FlowTurn::AwaitConfirmation { .. }));
    }
}
