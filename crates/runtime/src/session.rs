//! Interactive sessions with conversation history.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::{NO_ANSWER, describe_tools};
use crate::model::{Backend, Message, ModelError, ModelRequest, Part, Role, ToolCall, ToolSpec};
use crate::tools::{ToolArgs, ToolManager};

/// Placeholder shown for turns that carry no text.
pub const NO_TEXT: &str = "[No text content]";

/// A chat session. Each question sees every earlier turn.
pub struct Session<B> {
    backend: Arc<B>,
    tools: ToolManager,
    specs: Vec<ToolSpec>,
    history: Vec<Message>,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: Arc<B>, tools: ToolManager) -> Self {
        let specs = tools.specs();
        Self {
            backend,
            tools,
            specs,
            history: Vec::new(),
        }
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn list_available_tools(&self) -> String {
        describe_tools(&self.tools)
    }

    /// Ask a question in the context of the conversation so far.
    ///
    /// A failed turn leaves the history as it was and comes back as
    /// `Error: <message>`.
    pub async fn ask(&mut self, question: &str) -> String {
        let len_before = self.history.len();
        match self.turn(question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "turn failed, discarding it");
                self.history.truncate(len_before);
                format!("Error: {e}")
            }
        }
    }

    async fn turn(&mut self, question: &str) -> Result<String, ModelError> {
        self.history.push(Message::user(question));
        let reply = self.send().await?;

        let Some(call) = reply.first_tool_call().cloned() else {
            let text = reply.text();
            self.history.push(reply);
            return Ok(if text.trim().is_empty() {
                NO_ANSWER.to_string()
            } else {
                text
            });
        };

        debug!(tool = %call.name, args = %call.args, "model requested tool");
        self.history.push(single_call(reply, &call));

        let result = self
            .tools
            .execute(&call.name, ToolArgs::from(call.args.clone()), question)
            .await;
        self.history
            .push(Message::tool_response(&call.name, result.to_response()));

        let follow_up = self.send().await?.text();
        let answer = if follow_up.trim().is_empty() {
            result.to_text()
        } else {
            follow_up
        };
        self.history.push(Message::model(answer.clone()));
        Ok(answer)
    }

    async fn send(&self) -> Result<Message, ModelError> {
        let response = self
            .backend
            .call(ModelRequest {
                messages: &self.history,
                tools: &self.specs,
            })
            .await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model replied"
        );
        Ok(response.message)
    }

    /// Printable transcript with `You`/`Assistant` labels.
    pub fn transcript(&self) -> String {
        self.history
            .iter()
            .map(|message| {
                let label = match message.role {
                    Role::User => "You",
                    Role::Model => "Assistant",
                };
                let text = message.text();
                if text.is_empty() {
                    format!("{label}: {NO_TEXT}")
                } else {
                    format!("{label}: {text}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Keep the text parts and only the call that is going to be answered.
fn single_call(reply: Message, call: &ToolCall) -> Message {
    let mut parts: Vec<Part> = reply
        .parts
        .into_iter()
        .filter(|part| matches!(part, Part::Text(_)))
        .collect();
    parts.push(Part::ToolCall(call.clone()));
    Message {
        role: reply.role,
        parts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolResponse;
    use crate::testing::ScriptedBackend;
    use crate::tools::builtin::{Calculator, UnitConverter};
    use serde_json::json;

    fn scripted_session(backend: ScriptedBackend) -> (Session<ScriptedBackend>, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let mut tools = ToolManager::new();
        tools.register(Box::new(Calculator));
        tools.register(Box::new(UnitConverter));
        (Session::new(backend.clone(), tools), backend)
    }

    #[tokio::test]
    async fn plain_turns_accumulate_history() {
        let (mut session, backend) = scripted_session(
            ScriptedBackend::new()
                .reply_text("Hi Sam.")
                .reply_text("Your name is Sam."),
        );
        assert_eq!(session.ask("I'm Sam.").await, "Hi Sam.");
        assert_eq!(session.ask("What's my name?").await, "Your name is Sam.");

        assert_eq!(
            session.history(),
            &[
                Message::user("I'm Sam."),
                Message::model("Hi Sam."),
                Message::user("What's my name?"),
                Message::model("Your name is Sam."),
            ]
        );
        let requests = backend.requests();
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].tools.len(), 2);
    }

    #[tokio::test]
    async fn tool_result_is_resubmitted() {
        let (mut session, backend) = scripted_session(
            ScriptedBackend::new()
                .reply_call("unit_converter", json!({"celsius": 100}))
                .reply_text("100°C is 212°F."),
        );
        assert_eq!(session.ask("100 C in F?").await, "100°C is 212°F.");

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(
            last.parts,
            vec![Part::ToolResponse(ToolResponse {
                name: "unit_converter".into(),
                response: json!({"result": "100.0°C = 212.0°F"}),
            })]
        );
        assert_eq!(session.history().len(), 4);
    }

    #[tokio::test]
    async fn tool_error_is_resubmitted_as_error() {
        let (mut session, backend) = scripted_session(
            ScriptedBackend::new()
                .reply_call("calc", json!({"expr": "1/0"}))
                .reply_text("That can't be computed."),
        );
        assert_eq!(session.ask("1/0?").await, "That can't be computed.");
        let requests = backend.requests();
        let Part::ToolResponse(response) = &requests[1].messages[2].parts[0] else {
            panic!("expected tool response");
        };
        assert!(response.response.get("error").is_some());
    }

    #[tokio::test]
    async fn silent_follow_up_uses_tool_text() {
        let (mut session, _) = scripted_session(
            ScriptedBackend::new()
                .reply_call("calc", json!({"expr": "6 * 7"}))
                .reply_text(""),
        );
        assert_eq!(session.ask("6 times 7").await, "42");
        assert_eq!(session.history().last(), Some(&Message::model("42")));
    }

    #[tokio::test]
    async fn only_the_first_call_is_recorded() {
        let reply = Message {
            role: Role::Model,
            parts: vec![
                Part::Text("Checking.".into()),
                Part::ToolCall(ToolCall::new("calc", json!({"expr": "2+2"}))),
                Part::ToolCall(ToolCall::new("calc", json!({"expr": "3+3"}))),
            ],
        };
        let (mut session, _) = scripted_session(ScriptedBackend::new().reply(reply).reply_text("4."));
        session.ask("2+2 and 3+3").await;

        let recorded = &session.history()[1];
        assert_eq!(recorded.parts.len(), 2);
        assert_eq!(recorded.first_tool_call().unwrap().args, json!({"expr": "2+2"}));
    }

    #[tokio::test]
    async fn failed_turn_is_rolled_back() {
        let (mut session, _) = scripted_session(
            ScriptedBackend::new()
                .reply_text("Hello.")
                .reply_call("calc", json!({"expr": "1+1"}))
                .reply_error(ModelError::Network("reset".into())),
        );
        session.ask("hi").await;
        assert_eq!(session.ask("1+1?").await, "Error: network: reset");
        assert_eq!(
            session.history(),
            &[Message::user("hi"), Message::model("Hello.")]
        );

        assert_eq!(session.ask("again").await, "Error: provider api: no scripted reply left");
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn transcript_labels_turns() {
        let (mut session, _) = scripted_session(
            ScriptedBackend::new()
                .reply_call("calc", json!({"expr": "2*3"}))
                .reply_text("Six."),
        );
        session.ask("2*3?").await;
        assert_eq!(
            session.transcript(),
            "You: 2*3?\n\
             Assistant: [No text content]\n\
             You: [No text content]\n\
             Assistant: Six."
        );
    }

    #[tokio::test]
    async fn empty_reply_gets_apology() {
        let (mut session, _) = scripted_session(ScriptedBackend::new().reply_text(""));
        assert_eq!(session.ask("?").await, NO_ANSWER);
        assert_eq!(session.history().len(), 2);
    }
}
