use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use safiri_core::flows::{self, FlowPrompt, FlowTurn};
use safiri_core::{
    AppConfig, ConversationState, FlowKind, Intent, OrchestratorResponse, ResponseKind, Role,
    SessionStore,
};

use crate::classify::IntentClassifier;
use crate::error::CapabilityError;
use crate::llm::LlmClient;
use crate::prompts;
use crate::retrieval::{is_unanswered, Retriever};
use crate::router::{IntentRouter, ResolvedIntent};
use crate::tools::ToolRegistry;
use crate::parse;

const WEATHER_TOOL: &str = "get_weather";

#[derive(Clone, Copy, Debug)]
pub struct OrchestratorConfig {
    pub confidence_threshold: f64,
    /// Upper bound on every single capability call (classifier, LLM,
    /// retriever, tool). A timeout is an ordinary capability failure.
    pub capability_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { confidence_threshold: 0.65, capability_timeout: Duration::from_secs(30) }
    }
}

impl From<&AppConfig> for OrchestratorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            confidence_threshold: config.routing.confidence_threshold,
            capability_timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }
}

/// Top-level entry point: loads session state, routes one user message to
/// a handling strategy, and persists the updated state.
///
/// All capabilities arrive through the constructor, so tests run against
/// scripted doubles. No handler outcome is fatal; the worst case for a
/// turn is the standardized apology response.
pub struct Orchestrator {
    store: SessionStore,
    classifier: Arc<dyn IntentClassifier>,
    llm: Arc<dyn LlmClient>,
    retriever: Arc<dyn Retriever>,
    tools: ToolRegistry,
    router: IntentRouter,
    timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        store: SessionStore,
        classifier: Arc<dyn IntentClassifier>,
        llm: Arc<dyn LlmClient>,
        retriever: Arc<dyn Retriever>,
        tools: ToolRegistry,
        config: OrchestratorConfig,
    ) -> Self {
        let router = IntentRouter::new(
            Arc::clone(&llm),
            config.confidence_threshold,
            config.capability_timeout,
        );
        Self {
            store,
            classifier,
            llm,
            retriever,
            tools,
            router,
            timeout: config.capability_timeout,
        }
    }

    /// Session persistence, exposed for the transport layer's session
    /// inspection and deletion endpoints.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Processes one user message and returns the response together with
    /// the resolved session id (freshly generated when none was supplied).
    pub async fn process(
        &self,
        user_id: &str,
        message: &str,
        session_id: Option<&str>,
    ) -> (OrchestratorResponse, String) {
        let mut state = self.store.get_or_create(user_id, session_id).await;
        let session_id = state.session_id.clone();
        state.add_message(Role::User, message);

        let response = if state.is_in_flow() {
            debug!(user_id, session_id = %session_id, flow = ?state.current_flow, "continuing active flow");
            self.continue_flow(&mut state, message).await
        } else {
            self.route_and_dispatch(&mut state, message).await
        };

        info!(
            user_id,
            session_id = %session_id,
            intent = %response.intent,
            response_type = ?response.response_type,
            requires_followup = response.requires_followup,
            "turn completed"
        );

        // Failures above were already converted to responses; whatever state
        // mutations happened this turn are persisted, not rolled back.
        state.add_message(Role::Assistant, response.message.clone());
        self.store.save(&state).await;

        (response, session_id)
    }

    async fn continue_flow(
        &self,
        state: &mut ConversationState,
        message: &str,
    ) -> OrchestratorResponse {
        match flows::advance(state, message) {
            FlowTurn::UnknownFlow { name } => {
                warn!(flow = %name, "unrecognized flow in session state, re-routing message");
                self.route_and_dispatch(state, message).await
            }
            FlowTurn::AskNext { kind, question } => {
                multi_turn_response(kind, question, 1.0, collect_step(kind), state)
            }
            FlowTurn::AwaitConfirmation { kind, summary } => {
                multi_turn_response(kind, summary, 1.0, confirm_step(kind), state)
            }
            FlowTurn::Confirmed { kind, tool, args } => self.complete_flow(kind, tool, args).await,
            FlowTurn::Cancelled { kind } => OrchestratorResponse::new(
                format!(
                    "{} cancelled. Let me know if you would like to start over.",
                    kind_label(kind)
                ),
                ResponseKind::Direct,
                kind.intent(),
                1.0,
            )
            .with_metadata("flow", kind.name())
            .with_metadata("cancelled", true),
        }
    }

    async fn complete_flow(
        &self,
        kind: FlowKind,
        tool: &'static str,
        args: Value,
    ) -> OrchestratorResponse {
        match self.execute_tool(tool, args).await {
            Ok(result) => OrchestratorResponse::new(result, ResponseKind::Tool, kind.intent(), 1.0)
                .with_metadata("flow", kind.name())
                .with_metadata("tool", tool)
                .with_metadata("flow_completed", true),
            Err(error) => {
                warn!(%error, tool, flow = kind.name(), "flow completion tool failed");
                OrchestratorResponse::apology(kind.intent(), 1.0)
            }
        }
    }

    async fn route_and_dispatch(
        &self,
        state: &mut ConversationState,
        message: &str,
    ) -> OrchestratorResponse {
        let classification = match self.with_timeout(self.classifier.classify(message)).await {
            Ok(classification) => classification,
            Err(error) => {
                warn!(%error, "intent classification failed");
                return OrchestratorResponse::apology(Intent::General, 0.0);
            }
        };

        let resolved = self.router.resolve(message, &classification).await;
        debug!(
            intent = %resolved.intent,
            confidence = resolved.confidence,
            escalated = resolved.escalated,
            "intent resolved"
        );

        match resolved.intent {
            Intent::Faq => self.handle_faq(message, resolved).await,
            Intent::Booking => self.open_flow(state, message, FlowKind::Booking, resolved).await,
            Intent::Payment => self.open_flow(state, message, FlowKind::Payment, resolved).await,
            Intent::Weather => self.handle_weather(message, resolved).await,
            Intent::General => self.handle_general(message, resolved).await,
        }
    }

    async fn handle_faq(&self, message: &str, resolved: ResolvedIntent) -> OrchestratorResponse {
        let answer = match self.with_timeout(self.retriever.answer(message)).await {
            Ok(answer) => answer,
            Err(error) => {
                warn!(%error, "retrieval failed");
                return OrchestratorResponse::apology(resolved.intent, resolved.confidence);
            }
        };

        if !is_unanswered(&answer) {
            return OrchestratorResponse::new(
                answer,
                ResponseKind::Retrieval,
                resolved.intent,
                resolved.confidence,
            )
            .with_metadata("source", "retrieval");
        }

        debug!("retrieved answer insufficient, falling back to the generative capability");
        match self.with_timeout(self.llm.complete(&prompts::faq_fallback_prompt(message))).await {
            Ok(completion) => OrchestratorResponse::new(
                completion,
                ResponseKind::Generative,
                resolved.intent,
                resolved.confidence,
            )
            .with_metadata("source", "agent_fallback"),
            Err(error) => {
                warn!(%error, "generative FAQ fallback failed");
                OrchestratorResponse::apology(resolved.intent, resolved.confidence)
            }
        }
    }

    /// Starts a slot-collection flow, bulk-extracting whatever the opening
    /// message already provides.
    async fn open_flow(
        &self,
        state: &mut ConversationState,
        message: &str,
        kind: FlowKind,
        resolved: ResolvedIntent,
    ) -> OrchestratorResponse {
        flows::start_flow(state, kind, BTreeMap::new());

        match self.with_timeout(self.llm.complete(&prompts::extraction_prompt(kind, message))).await
        {
            Ok(reply) => {
                let extracted = parse::parse_extraction(kind, &reply);
                debug!(flow = kind.name(), slots = extracted.len(), "bulk slot extraction done");
                for (key, value) in extracted {
                    flows::fill_slot(state, kind, &key, value);
                }
            }
            // Non-fatal: the flow simply asks for every slot in turn.
            Err(error) => {
                warn!(%error, flow = kind.name(), "bulk slot extraction failed");
            }
        }

        match flows::next_prompt(state, kind) {
            FlowPrompt::Ask { question } => {
                multi_turn_response(kind, question, resolved.confidence, collect_step(kind), state)
            }
            FlowPrompt::Confirm { summary } => {
                multi_turn_response(kind, summary, resolved.confidence, confirm_step(kind), state)
            }
        }
    }

    async fn handle_weather(
        &self,
        message: &str,
        resolved: ResolvedIntent,
    ) -> OrchestratorResponse {
        let city = match self.with_timeout(self.llm.complete(&prompts::city_prompt(message))).await
        {
            Ok(city) if !city.trim().is_empty() => city.trim().to_owned(),
            Ok(_) => message.to_owned(),
            Err(error) => {
                warn!(%error, "city extraction failed, passing the raw message to the tool");
                message.to_owned()
            }
        };

        match self.execute_tool(WEATHER_TOOL, json!({ "city": city })).await {
            Ok(result) => OrchestratorResponse::new(
                result,
                ResponseKind::Tool,
                resolved.intent,
                resolved.confidence,
            )
            .with_metadata("tool", WEATHER_TOOL)
            .with_metadata("city", city),
            Err(error) => {
                warn!(%error, "weather tool failed");
                OrchestratorResponse::apology(resolved.intent, resolved.confidence)
            }
        }
    }

    async fn handle_general(
        &self,
        message: &str,
        resolved: ResolvedIntent,
    ) -> OrchestratorResponse {
        match self.with_timeout(self.llm.complete(message)).await {
            Ok(completion) => OrchestratorResponse::new(
                completion,
                ResponseKind::Generative,
                resolved.intent,
                resolved.confidence,
            )
            .with_metadata("source", "generative"),
            Err(error) => {
                warn!(%error, "general completion failed");
                OrchestratorResponse::apology(resolved.intent, resolved.confidence)
            }
        }
    }

    async fn execute_tool(&self, name: &str, args: Value) -> Result<String, CapabilityError> {
        let Some(tool) = self.tools.get(name) else {
            return Err(CapabilityError::UnknownTool(name.to_owned()));
        };
        self.with_timeout(tool.execute(args)).await
    }

    async fn with_timeout<T, F>(&self, call: F) -> Result<T, CapabilityError>
    where
        F: Future<Output = Result<T, CapabilityError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CapabilityError::Timeout(self.timeout)),
        }
    }
}

fn multi_turn_response(
    kind: FlowKind,
    message: String,
    confidence: f64,
    next_step: String,
    state: &ConversationState,
) -> OrchestratorResponse {
    let collected = serde_json::to_value(&state.flow_data).unwrap_or(Value::Null);
    OrchestratorResponse::new(message, ResponseKind::MultiTurn, kind.intent(), confidence)
        .with_followup(next_step)
        .with_metadata("flow", kind.name())
        .with_metadata("collected", collected)
}

fn collect_step(kind: FlowKind) -> String {
    format!("collect_{}_details", kind.name())
}

fn confirm_step(kind: FlowKind) -> String {
    format!("confirm_{}", kind.name())
}

fn kind_label(kind: FlowKind) -> &'static str {
    match kind {
        FlowKind::Booking => "Booking",
        FlowKind::Payment => "Payment",
    }
}
