use futures::StreamExt;
use log::{ debug, error, info };
use std::sync::{ Arc, Mutex, MutexGuard };

use crate::config::prompt::{ build_opening_message, build_system_instruction };
use crate::llm::chat::{ ChatBackend, FragmentStream };
use crate::llm::SamplingConfig;
use crate::models::audit::WebsiteContext;
use crate::models::chat::ChatMessage;

/// Substituted for the in-progress model turn when the backend stream fails.
pub const APOLOGY_MESSAGE: &str =
    "I encountered a minor interruption while processing your growth data.";

struct TurnState {
    transcript: Vec<ChatMessage>,
    in_flight: bool,
}

/// One grounded, stateful exchange tied to a single audit snapshot. The
/// transcript is append-only except for the trailing model turn, which grows
/// in place while a response streams.
pub struct ChatSession {
    context: WebsiteContext,
    system_instruction: String,
    sampling: SamplingConfig,
    backend: Arc<dyn ChatBackend>,
    state: Arc<Mutex<TurnState>>,
}

fn lock_state(state: &Arc<Mutex<TurnState>>) -> MutexGuard<'_, TurnState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes the forbidden emphasis characters from a fragment.
fn scrub_fragment(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '#' | '*'))
        .collect()
}

impl ChatSession {
    /// Opens a session against one Context Model. The opening audit summary
    /// is synthesized locally and becomes the first transcript entry; no
    /// backend round-trip happens here.
    pub fn open(
        context: WebsiteContext,
        backend: Arc<dyn ChatBackend>,
        sampling: SamplingConfig
    ) -> Self {
        let system_instruction = build_system_instruction(&context);
        let opening = build_opening_message(&context);
        info!("Opened session for {} ({} platform)", context.url, context.platform);

        Self {
            context,
            system_instruction,
            sampling,
            backend,
            state: Arc::new(
                Mutex::new(TurnState {
                    transcript: vec![ChatMessage::model(opening)],
                    in_flight: false,
                })
            ),
        }
    }

    pub fn context(&self) -> &WebsiteContext {
        &self.context
    }

    /// The locally synthesized first transcript entry.
    pub fn opening_message(&self) -> String {
        lock_state(&self.state).transcript[0].text.clone()
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        lock_state(&self.state).transcript.clone()
    }

    pub fn transcript_len(&self) -> usize {
        lock_state(&self.state).transcript.len()
    }

    pub fn is_in_flight(&self) -> bool {
        lock_state(&self.state).in_flight
    }

    /// Appends a user turn and requests a streamed backend response seeded
    /// with the full prior exchange (minus the locally generated opening,
    /// which the backend never sees). Returns `None` without touching the
    /// transcript for blank input or while another send is outstanding.
    ///
    /// Backend setup failure is swallowed here: the turn resolves to the
    /// fixed apology message and the returned handle yields no fragments.
    pub async fn send(&self, text: &str) -> Option<ResponseTurn> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!("send rejected: blank input");
            return None;
        }

        let history: Vec<ChatMessage> = {
            let mut state = lock_state(&self.state);
            if state.in_flight {
                debug!("send rejected: a response is already in flight");
                return None;
            }
            state.in_flight = true;
            state.transcript.push(ChatMessage::user(trimmed));
            let history = state.transcript[1..].to_vec();
            state.transcript.push(ChatMessage::model(""));
            history
        };

        match self.backend.send_stream(&self.system_instruction, &history, &self.sampling).await {
            Ok(stream) =>
                Some(ResponseTurn {
                    state: Arc::clone(&self.state),
                    stream: Some(stream),
                    buffer: String::new(),
                    failed: false,
                }),
            Err(e) => {
                error!("Failed to establish response stream: {}", e);
                let mut state = lock_state(&self.state);
                if let Some(last) = state.transcript.last_mut() {
                    last.text = APOLOGY_MESSAGE.to_string();
                }
                state.in_flight = false;
                Some(ResponseTurn {
                    state: Arc::clone(&self.state),
                    stream: None,
                    buffer: String::new(),
                    failed: true,
                })
            }
        }
    }
}

/// Lazy, single-pass, cancelable sequence of scrubbed response fragments.
/// Each fragment is appended to the trailing model turn as it is pulled.
/// Dropping the turn mid-stream leaves the transcript consistent: the turn
/// simply stops growing and the session accepts new sends again.
pub struct ResponseTurn {
    state: Arc<Mutex<TurnState>>,
    stream: Option<FragmentStream>,
    buffer: String,
    failed: bool,
}

impl ResponseTurn {
    /// Pulls the next scrubbed fragment, or `None` once the stream is
    /// exhausted or has failed. A mid-stream transport error replaces the
    /// partial turn with the fixed apology message and ends the sequence.
    pub async fn next_fragment(&mut self) -> Option<String> {
        let stream = self.stream.as_mut()?;
        match stream.next().await {
            Some(Ok(raw)) => {
                let cleaned = scrub_fragment(&raw);
                self.buffer.push_str(&cleaned);
                let mut state = lock_state(&self.state);
                if let Some(last) = state.transcript.last_mut() {
                    last.text = self.buffer.clone();
                }
                Some(cleaned)
            }
            Some(Err(e)) => {
                error!("Response stream failed mid-flight: {}", e);
                self.stream = None;
                self.failed = true;
                let mut state = lock_state(&self.state);
                if let Some(last) = state.transcript.last_mut() {
                    last.text = APOLOGY_MESSAGE.to_string();
                }
                state.in_flight = false;
                None
            }
            None => {
                self.stream = None;
                lock_state(&self.state).in_flight = false;
                None
            }
        }
    }

    /// Everything accumulated so far, already scrubbed.
    pub fn final_text(&self) -> &str {
        &self.buffer
    }

    /// Whether this turn resolved to the apology message instead of a
    /// complete response.
    pub fn failed(&self) -> bool {
        self.failed
    }
}

impl Drop for ResponseTurn {
    fn drop(&mut self) {
        // Abandonment releases the session for the next send.
        if self.stream.take().is_some() {
            lock_state(&self.state).in_flight = false;
        }
    }
}
