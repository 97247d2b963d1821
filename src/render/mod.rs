use log::debug;
use std::sync::{ Arc, Mutex };
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::models::chat::SuggestionSet;

/// Captions rotated while a response is pending and no fragment has arrived.
pub const PROCESS_STAGES: [&str; 4] = [
    "Correlating data with revenue leaks...",
    "Scanning competitive benchmarks...",
    "Identifying P0 conversion blockers...",
    "Drafting expert fix roadmap...",
];

/// Caption shown on the nth status tick (zero-based), wrapping modulo the
/// stage list.
pub fn stage_caption(tick: usize) -> &'static str {
    PROCESS_STAGES[tick % PROCESS_STAGES.len()]
}

/// Suggestion pair installed once the opening reveal completes.
pub fn opening_suggestions() -> SuggestionSet {
    SuggestionSet {
        specific: vec![
            "🚀 How do I increase my revenue?".to_string(),
            "Analyze my Meta traffic quality".to_string(),
            "Fix my LCP speed issue".to_string()
        ],
        general: vec![
            "What is my biggest growth leak?".to_string(),
            "Do I need an expert developer?".to_string(),
            "Compare me to industry leaders".to_string()
        ],
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RevealConfig {
    pub chars_per_tick: usize,
    pub interval: Duration,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            chars_per_tick: 10,
            interval: Duration::from_millis(1),
        }
    }
}

/// Cancelable lazy sequence of text deltas revealing the opening message a
/// few characters at a time. Dropping the handle aborts the ticker task, so
/// a replaced session never leaves an orphaned timer behind.
pub struct OpeningReveal {
    chunks: ReceiverStream<String>,
    ticker: JoinHandle<()>,
}

impl OpeningReveal {
    pub fn start(text: &str, config: RevealConfig) -> Self {
        let step = config.chars_per_tick.max(1);
        let chunks: Vec<String> = text
            .chars()
            .collect::<Vec<_>>()
            .chunks(step)
            .map(|window| window.iter().collect())
            .collect();

        let (tx, rx) = mpsc::channel(32);
        let interval = config.interval;
        let ticker = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            for chunk in chunks {
                timer.tick().await;
                if tx.send(chunk).await.is_err() {
                    return;
                }
            }
        });

        Self {
            chunks: ReceiverStream::new(rx),
            ticker,
        }
    }

    /// The next few characters of the opening, or `None` once exhausted.
    pub async fn next_chunk(&mut self) -> Option<String> {
        self.chunks.next().await
    }
}

impl Drop for OpeningReveal {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

/// Rotates the fixed progress captions at a fixed period, restarting at
/// index zero. Cleared the instant the first response fragment arrives.
pub struct StatusTicker {
    caption: Arc<Mutex<Option<&'static str>>>,
    ticker: JoinHandle<()>,
}

impl StatusTicker {
    pub fn start(period: Duration) -> Self {
        let caption = Arc::new(Mutex::new(None));
        let caption_task = Arc::clone(&caption);
        let ticker = tokio::spawn(async move {
            let mut tick: usize = 0;
            loop {
                tokio::time::sleep(period).await;
                if let Ok(mut current) = caption_task.lock() {
                    *current = Some(stage_caption(tick));
                }
                tick += 1;
            }
        });

        Self { caption, ticker }
    }

    pub fn current(&self) -> Option<&'static str> {
        self.caption.lock().ok().and_then(|c| *c)
    }

    fn stop(&self) {
        self.ticker.abort();
        if let Ok(mut current) = self.caption.lock() {
            *current = None;
        }
    }
}

impl Drop for StatusTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Decouples "when text becomes available" from "when text becomes visible".
/// Two independent flags form the input gate: the opening reveal and a live
/// stream each block further sends while active. At most one ticker runs at
/// a time because a send is itself blocked while either flag is set.
pub struct ChatRenderer {
    typing_opening: bool,
    awaiting_response: bool,
    suggestions: SuggestionSet,
    status: Option<StatusTicker>,
    reveal_config: RevealConfig,
    status_period: Duration,
}

impl ChatRenderer {
    pub fn new(reveal_config: RevealConfig, status_period: Duration) -> Self {
        Self {
            typing_opening: false,
            awaiting_response: false,
            suggestions: SuggestionSet::default(),
            status: None,
            reveal_config,
            status_period,
        }
    }

    /// Input is rejected while either flag is set.
    pub fn is_busy(&self) -> bool {
        self.typing_opening || self.awaiting_response
    }

    pub fn suggestions(&self) -> &SuggestionSet {
        &self.suggestions
    }

    pub fn status_caption(&self) -> Option<&'static str> {
        self.status.as_ref().and_then(|ticker| ticker.current())
    }

    /// Enters the typing-opening state and hands back the reveal sequence.
    /// Replacing the session drops the sequence, which tears the ticker down.
    pub fn begin_opening(&mut self, opening_text: &str) -> OpeningReveal {
        debug!("Revealing opening message ({} chars)", opening_text.chars().count());
        self.typing_opening = true;
        self.awaiting_response = false;
        self.status = None;
        self.suggestions.clear();
        OpeningReveal::start(opening_text, self.reveal_config)
    }

    /// Clears the typing flag and installs the fixed default suggestion pair.
    pub fn finish_opening(&mut self) {
        self.typing_opening = false;
        self.suggestions = opening_suggestions();
    }

    /// Enters the awaiting-response state: suggestions are cleared for the
    /// duration of the turn and the caption rotation starts from index zero.
    pub fn begin_response(&mut self) {
        self.awaiting_response = true;
        self.suggestions.clear();
        self.status = Some(StatusTicker::start(self.status_period));
    }

    /// First fragment arrived: the caption disappears immediately.
    pub fn note_first_fragment(&mut self) {
        self.status = None;
    }

    /// Stream ended or failed: the turn is over and the freshly extracted
    /// suggestion set replaces the old one wholesale.
    pub fn finish_response(&mut self, suggestions: SuggestionSet) {
        self.awaiting_response = false;
        self.status = None;
        self.suggestions = suggestions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> ChatRenderer {
        ChatRenderer::new(
            RevealConfig { chars_per_tick: 3, interval: Duration::from_millis(1) },
            Duration::from_millis(5)
        )
    }

    #[tokio::test]
    async fn reveal_reassembles_the_exact_text_in_order() {
        let text = "AUDIT COMPLETE: déjà-vu site";
        let mut reveal = OpeningReveal::start(text, RevealConfig {
            chars_per_tick: 3,
            interval: Duration::from_millis(1),
        });

        let mut rebuilt = String::new();
        while let Some(chunk) = reveal.next_chunk().await {
            assert!(chunk.chars().count() <= 3);
            rebuilt.push_str(&chunk);
        }
        assert_eq!(rebuilt, text);
    }

    #[tokio::test]
    async fn reveal_is_cancelable_mid_way() {
        let mut reveal = OpeningReveal::start("a long opening message", RevealConfig {
            chars_per_tick: 2,
            interval: Duration::from_millis(1),
        });
        assert!(reveal.next_chunk().await.is_some());
        drop(reveal);
        // Dropping aborts the ticker; nothing to observe beyond not hanging.
    }

    #[test]
    fn captions_rotate_and_wrap_modulo_stage_count() {
        assert_eq!(stage_caption(0), PROCESS_STAGES[0]);
        assert_eq!(stage_caption(3), PROCESS_STAGES[3]);
        assert_eq!(stage_caption(4), PROCESS_STAGES[0]);
        assert_eq!(stage_caption(9), PROCESS_STAGES[1]);
    }

    #[tokio::test]
    async fn status_ticker_sets_then_clears_caption() {
        let ticker = StatusTicker::start(Duration::from_millis(5));
        assert_eq!(ticker.current(), None);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(ticker.current().is_some());

        ticker.stop();
        assert_eq!(ticker.current(), None);
    }

    #[tokio::test]
    async fn opening_flow_gates_input_then_installs_defaults() {
        let mut view = renderer();
        assert!(!view.is_busy());

        let reveal = view.begin_opening("short opening");
        assert!(view.is_busy());
        drop(reveal);

        view.finish_opening();
        assert!(!view.is_busy());
        assert_eq!(view.suggestions(), &opening_suggestions());
    }

    #[tokio::test]
    async fn response_flow_clears_suggestions_and_caption() {
        let mut view = renderer();
        view.finish_opening();
        assert!(!view.suggestions().is_empty());

        view.begin_response();
        assert!(view.is_busy());
        assert!(view.suggestions().is_empty());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(view.status_caption().is_some());

        view.note_first_fragment();
        assert_eq!(view.status_caption(), None);

        let set = SuggestionSet {
            specific: vec!["Is it fast enough now?".to_string()],
            general: vec![],
        };
        view.finish_response(set.clone());
        assert!(!view.is_busy());
        assert_eq!(view.suggestions(), &set);
    }
}
