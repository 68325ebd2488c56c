//! Test doubles for the realtime provider and template fixtures.
//!
//! Compiled for this crate's tests and, through the `test-util` feature, for
//! downstream crates' tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use caseprep_interview::domain::template::{LeadType, QuestionSpec, Template};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::domain::session::{ClientSecret, ProviderSession, SessionRequest};
use crate::provider::{ProviderError, RealtimeSessionProvider};

/// A provider that replays a script of outcomes, then succeeds.
///
/// Every call is recorded with the key it was made with.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Option<ProviderError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

/// One call observed by [`ScriptedProvider`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The key the call authenticated with.
    pub api_key: String,
    /// The request body.
    pub request: SessionRequest,
}

impl ScriptedProvider {
    /// A provider that always succeeds.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// A provider whose first calls fail with `failures`, in order.
    #[must_use]
    pub fn failing_with(failures: Vec<ProviderError>) -> Self {
        Self {
            script: Mutex::new(failures.into_iter().map(Some).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls made so far.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }
}

#[async_trait]
impl RealtimeSessionProvider for ScriptedProvider {
    async fn create_session(
        &self,
        api_key: &SecretString,
        request: &SessionRequest,
    ) -> Result<ProviderSession, ProviderError> {
        let call_number = {
            let mut calls = self.calls.lock().expect("call log poisoned");
            calls.push(RecordedCall {
                api_key: api_key.expose_secret().to_owned(),
                request: request.clone(),
            });
            calls.len()
        };
        let scripted = self
            .script
            .lock()
            .expect("script poisoned")
            .pop_front()
            .flatten();
        match scripted {
            Some(error) => Err(error),
            None => Ok(session_for(request, call_number)),
        }
    }
}

/// The session a well-behaved provider would return for `request`.
#[must_use]
pub fn session_for(request: &SessionRequest, call_number: usize) -> ProviderSession {
    ProviderSession {
        id: format!("sess_test_{call_number}"),
        object: "realtime.session".to_owned(),
        model: request.model.clone(),
        modalities: request.modalities.clone(),
        instructions: request.instructions.clone(),
        voice: request.voice.clone(),
        input_audio_format: request.input_audio_format.clone(),
        output_audio_format: request.output_audio_format.clone(),
        input_audio_transcription: request.input_audio_transcription.clone(),
        turn_detection: Some(request.turn_detection.clone()),
        tools: request.tools.clone(),
        tool_choice: request.tool_choice.clone(),
        temperature: Some(request.temperature),
        max_response_output_tokens: request.max_response_output_tokens.clone(),
        client_secret: ClientSecret {
            value: format!("ek_test_{call_number}"),
            expires_at: 1_768_471_260,
        },
    }
}

/// An interviewer-led template with `questions` numbered questions.
#[must_use]
pub fn template_with_questions(questions: u32) -> Template {
    Template {
        id: Uuid::new_v4(),
        case_type: "Market Entry".to_owned(),
        lead_type: LeadType::InterviewerLed,
        difficulty: "Medium".to_owned(),
        company: Some("Acme".to_owned()),
        industry: Some("Beverages".to_owned()),
        title: Some("Acme in Brazil".to_owned()),
        prompt: "Should Acme enter the Brazilian market?".to_owned(),
        questions: (1..=questions)
            .map(|n| QuestionSpec {
                title: Some(format!("Part {n}")),
                prompt: format!("Question {n} prompt"),
                evaluator_context: format!("Question {n} facts"),
            })
            .collect(),
    }
}
