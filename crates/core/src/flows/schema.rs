use serde::{Deserialize, Serialize};

/// The multi-turn flows the assistant can run. Each carries a fixed,
/// strictly ordered slot schema; there is no dynamic slot graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Booking,
    Payment,
}

/// One named piece of structured data a flow must collect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotSpec {
    /// Key used in `flow_data` and in the completion tool's arguments.
    pub key: &'static str,
    /// Label shown in the confirmation summary.
    pub label: &'static str,
    /// Question asked when this is the first unfilled slot.
    pub question: &'static str,
    /// Fixed field name the bulk-extraction prompt answers under.
    pub extraction_field: &'static str,
}

/// Static definition of a flow: ordered slots plus the completion action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowSchema {
    pub kind: FlowKind,
    pub slots: &'static [SlotSpec],
    /// Tool invoked with the filled slots once the user confirms.
    pub completion_tool: &'static str,
}

const BOOKING_SLOTS: &[SlotSpec] = &[
    SlotSpec {
        key: "vehicle_type",
        label: "Vehicle",
        question: "What type of vehicle would you like to book? (sedan, SUV, van, etc.)",
        extraction_field: "VEHICLE_TYPE",
    },
    SlotSpec {
        key: "pickup_location",
        label: "Pickup",
        question: "Where should we pick you up?",
        extraction_field: "PICKUP",
    },
    SlotSpec {
        key: "dropoff_location",
        label: "Dropoff",
        question: "Where would you like to go?",
        extraction_field: "DROPOFF",
    },
    SlotSpec {
        key: "date",
        label: "Date",
        question: "What date do you need the vehicle? (e.g., tomorrow, Dec 25)",
        extraction_field: "DATE",
    },
    SlotSpec {
        key: "time",
        label: "Time",
        question: "What time should we pick you up?",
        extraction_field: "TIME",
    },
];

const PAYMENT_SLOTS: &[SlotSpec] = &[
    SlotSpec {
        key: "amount",
        label: "Amount",
        question: "How much would you like to send?",
        extraction_field: "AMOUNT",
    },
    SlotSpec {
        key: "recipient",
        label: "Recipient",
        question: "Who would you like to send the money to?",
        extraction_field: "RECIPIENT",
    },
    SlotSpec {
        key: "method",
        label: "Method",
        question: "Which payment method should we use? (M-Pesa, credit card, bank transfer)",
        extraction_field: "METHOD",
    },
];

const BOOKING_SCHEMA: FlowSchema =
    FlowSchema { kind: FlowKind::Booking, slots: BOOKING_SLOTS, completion_tool: "book_vehicle" };

const PAYMENT_SCHEMA: FlowSchema =
    FlowSchema { kind: FlowKind::Payment, slots: PAYMENT_SLOTS, completion_tool: "send_payment" };

impl FlowKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Payment => "payment",
        }
    }

    /// Serialized flow names come back from storage as free-form strings;
    /// anything this does not recognize is treated as corrupted state.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "booking" => Some(Self::Booking),
            "payment" => Some(Self::Payment),
            _ => None,
        }
    }

    pub fn schema(&self) -> &'static FlowSchema {
        match self {
            Self::Booking => &BOOKING_SCHEMA,
            Self::Payment => &PAYMENT_SCHEMA,
        }
    }

    /// The intent that opens this flow.
    pub fn intent(&self) -> crate::intent::Intent {
        match self {
            Self::Booking => crate::intent::Intent::Booking,
            Self::Payment => crate::intent::Intent::Payment,
        }
    }
}

impl FlowSchema {
    pub fn slot(&self, key: &str) -> Option<&'static SlotSpec> {
        self.slots.iter().find(|slot| slot.key == key)
    }
}
