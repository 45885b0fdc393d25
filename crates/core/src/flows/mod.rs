pub mod engine;
pub mod schema;

pub use engine::{
    advance, fill_slot, is_affirmative, next_prompt, next_question, start_flow, summary,
    FlowPrompt, FlowTurn, AFFIRMATIVE_TOKENS, STEP_AWAITING_CONFIRMATION, STEP_INITIATED,
};
pub use schema::{FlowKind, FlowSchema, SlotSpec};
