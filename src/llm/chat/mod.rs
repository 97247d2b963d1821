pub mod gemini;

use async_trait::async_trait;
use futures::{ Stream, StreamExt, Future };
use std::error::Error as StdError;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use self::gemini::GeminiBackend;
use super::SamplingConfig;
use crate::cli::Args;
use crate::models::chat::ChatMessage;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// One increment of streamed response text.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, BoxError>> + Send>>;

/// Opaque text-generation capability. The core makes no assumption about
/// fragment size or pacing; the stream terminates at end-of-stream or yields
/// an error item on transport failure.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_stream(
        &self,
        system_instruction: &str,
        history: &[ChatMessage],
        sampling: &SamplingConfig
    ) -> Result<FragmentStream, BoxError>;
}

pub fn new_backend(args: &Args) -> Result<Arc<dyn ChatBackend>, BoxError> {
    let backend = GeminiBackend::from_args(args)?;
    Ok(Arc::new(backend))
}

pub fn create_streaming_response<F, Fut>(response_fn: F) -> FragmentStream
    where
        F: FnOnce(mpsc::Sender<Result<String, BoxError>>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static
{
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        response_fn(tx).await;
    });

    Box::pin(ReceiverStream::new(rx))
}

/// POSTs a JSON payload and forwards every line the parser recognizes as a
/// text fragment. The spawned task exits as soon as the consumer is dropped.
pub async fn http_stream_generate(
    base_url: String,
    route: &str,
    payload: impl serde::Serialize + Send + 'static,
    line_parser: fn(&str) -> Option<String>,
    headers: Option<Vec<(String, String)>>
) -> Result<FragmentStream, BoxError> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), route);
    let (tx, rx) = mpsc::channel(32);
    let client = reqwest::Client::new();

    tokio::spawn(async move {
        let mut req = client.post(&url).json(&payload);

        if let Some(header_list) = headers {
            for (name, value) in header_list {
                req = req.header(name, value);
            }
        }

        match req.send().await {
            Ok(resp) => {
                if let Err(e) = resp.error_for_status_ref() {
                    let _ = tx.send(Err(Box::new(e) as _)).await;
                    return;
                }
                let mut bytes = resp.bytes_stream();
                while let Some(chunk) = bytes.next().await {
                    match chunk {
                        Ok(buf) => {
                            if let Ok(text) = String::from_utf8(buf.to_vec()) {
                                for line in text.lines() {
                                    if let Some(tok) = line_parser(line) {
                                        if tx.send(Ok(tok)).await.is_err() {
                                            return;
                                        }
                                    }
                                }
                            }
                        }
                        Err(e) => {
                            let _ = tx.send(Err(Box::new(e) as _)).await;
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(Err(Box::new(e) as _)).await;
            }
        }
    });

    Ok(Box::pin(ReceiverStream::new(rx)))
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Deterministic backend double: replays a scripted fragment sequence,
    /// or fails at stream establishment.
    pub struct ScriptedBackend {
        script: Vec<Result<String, String>>,
        fail_setup: bool,
    }

    impl ScriptedBackend {
        pub fn with_fragments(fragments: &[&str]) -> Self {
            Self {
                script: fragments
                    .iter()
                    .map(|f| Ok(f.to_string()))
                    .collect(),
                fail_setup: false,
            }
        }

        pub fn with_script(script: Vec<Result<String, String>>) -> Self {
            Self { script, fail_setup: false }
        }

        pub fn failing_setup() -> Self {
            Self { script: Vec::new(), fail_setup: true }
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send_stream(
            &self,
            _system_instruction: &str,
            _history: &[ChatMessage],
            _sampling: &SamplingConfig
        ) -> Result<FragmentStream, BoxError> {
            if self.fail_setup {
                return Err("scripted setup failure".into());
            }
            let script = self.script.clone();
            Ok(
                create_streaming_response(move |tx| async move {
                    for item in script {
                        let mapped = item.map_err(BoxError::from);
                        let failed = mapped.is_err();
                        if tx.send(mapped).await.is_err() {
                            return;
                        }
                        if failed {
                            return;
                        }
                    }
                })
            )
        }
    }
}
