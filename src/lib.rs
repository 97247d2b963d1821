pub mod audit;
pub mod cli;
pub mod config;
pub mod history;
pub mod llm;
pub mod models;
pub mod render;
pub mod session;
pub mod suggest;

use cli::Args;
use llm::SamplingConfig;
use log::info;
use render::{ ChatRenderer, RevealConfig };
use session::{ ChatSession, ResponseTurn };
use std::error::Error;
use std::io::Write;
use std::time::Duration;
use tokio::io::{ AsyncBufReadExt, BufReader };

/// Gated entry point for a user query: input is rejected outright while the
/// opening is still revealing or a response is outstanding, leaving the
/// transcript untouched.
pub async fn submit(
    session: &ChatSession,
    view: &mut ChatRenderer,
    text: &str
) -> Option<ResponseTurn> {
    if view.is_busy() {
        return None;
    }
    let turn = session.send(text).await?;
    view.begin_response();
    Some(turn)
}

fn sampling_from_args(args: &Args) -> SamplingConfig {
    SamplingConfig {
        temperature: args.temperature,
        top_p: args.top_p,
        top_k: args.top_k,
    }
}

fn reveal_config_from_args(args: &Args) -> RevealConfig {
    RevealConfig {
        chars_per_tick: args.reveal_chars,
        interval: Duration::from_millis(args.reveal_interval_ms),
    }
}

fn print_suggestions(view: &ChatRenderer) {
    let suggestions = view.suggestions();
    if suggestions.is_empty() {
        return;
    }
    if !suggestions.specific.is_empty() {
        println!("\nPRIORITY ACTIONS:");
        for question in &suggestions.specific {
            println!("  {}", question);
        }
    }
    if !suggestions.general.is_empty() {
        println!("\nDEEP ANALYSIS:");
        for question in &suggestions.general {
            println!("  {}", question);
        }
    }
}

async fn reveal_opening(session: &ChatSession, view: &mut ChatRenderer) {
    let mut reveal = view.begin_opening(&session.opening_message());
    while let Some(chunk) = reveal.next_chunk().await {
        print!("{}", chunk);
        let _ = std::io::stdout().flush();
    }
    drop(reveal);
    view.finish_opening();
    println!();
}

async fn stream_response(view: &mut ChatRenderer, mut turn: ResponseTurn, status_period: Duration) {
    let mut shown_caption: Option<&'static str> = None;
    let mut first_fragment = true;

    loop {
        if first_fragment {
            // Poll the rotating caption until the first fragment lands.
            tokio::select! {
                fragment = turn.next_fragment() => {
                    match fragment {
                        Some(text) => {
                            view.note_first_fragment();
                            first_fragment = false;
                            println!();
                            print!("{}", text);
                            let _ = std::io::stdout().flush();
                        }
                        None => break,
                    }
                }
                _ = tokio::time::sleep(status_period / 2) => {
                    let caption = view.status_caption();
                    if caption != shown_caption {
                        if let Some(text) = caption {
                            println!("  [{}]", text);
                        }
                        shown_caption = caption;
                    }
                }
            }
        } else {
            match turn.next_fragment().await {
                Some(text) => {
                    print!("{}", text);
                    let _ = std::io::stdout().flush();
                }
                None => break,
            }
        }
    }
    println!();

    // An apologized turn carries no real response text, so the chips stay
    // empty rather than falling back to the defaults.
    let suggestions = if turn.failed() {
        models::chat::SuggestionSet::default()
    } else {
        suggest::extract_suggestions(turn.final_text())
    };
    view.finish_response(suggestions);
}

/// Interactive audit shell: one URL per audit, one session per audit,
/// replaced wholesale whenever a new URL is scanned.
pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Chat Model: {:?}", args.chat_model.as_deref().unwrap_or("adapter default"));
    info!("Chat Base URL: {:?}", args.chat_base_url.as_deref().unwrap_or("adapter default"));
    info!("Temperature: {}", args.temperature);
    info!("History Path: {}", args.history_path);
    info!("Reveal: {} chars every {}ms", args.reveal_chars, args.reveal_interval_ms);
    info!("Status Rotation: {}ms", args.status_interval_ms);
    info!("-------------------------");

    let backend = llm::chat::new_backend(&args)?;
    let history = history::create_history_store(&args)?;
    let sampling = sampling_from_args(&args);
    let status_period = Duration::from_millis(args.status_interval_ms);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("TrafficTailor | Professional Website Growth AI");
    loop {
        println!("\nEnter Website URL (e.g. apple.com), or 'quit':");
        let url_input = match lines.next_line().await? {
            Some(line) => line.trim().to_string(),
            None => break,
        };
        if url_input.is_empty() {
            continue;
        }
        if url_input.eq_ignore_ascii_case("quit") {
            break;
        }

        if let Err(e) = audit::validate_url(&url_input) {
            println!("{}", e);
            continue;
        }
        let normalized = match audit::normalize_url(&url_input) {
            Ok(url) => url,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        let context = audit::generate_mock_audit(&normalized);
        if let Err(e) = history.record(&context).await {
            log::warn!("Failed to record audit history: {}", e);
        }

        // A new Context Model replaces the active session and view entirely.
        let session = ChatSession::open(context, backend.clone(), sampling);
        let mut view = ChatRenderer::new(reveal_config_from_args(&args), status_period);

        reveal_opening(&session, &mut view).await;
        print_suggestions(&view);

        loop {
            println!("\nAsk about revenue strategy or technical performance ('new' for another audit, 'quit' to exit):");
            let input = match lines.next_line().await? {
                Some(line) => line,
                None => return Ok(()),
            };
            let trimmed = input.trim();
            if trimmed.eq_ignore_ascii_case("quit") {
                return Ok(());
            }
            if trimmed.eq_ignore_ascii_case("new") {
                break;
            }

            if let Some(turn) = submit(&session, &mut view, trimmed).await {
                stream_response(&mut view, turn, status_period).await;
                print_suggestions(&view);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::testing::ScriptedBackend;
    use crate::models::audit::*;
    use std::sync::Arc;

    fn sample_context() -> WebsiteContext {
        WebsiteContext {
            url: "https://example.com".to_string(),
            timestamp: 1_700_000_000,
            platform: Platform::Wix,
            metrics: CoreMetrics { lcp_ms: 3900.0, cls: 0.21, inp_ms: 300.0, speed_score: 50 },
            seo: SeoFindings {
                meta_tags: "Missing Open Graph tags".to_string(),
                headings: vec![],
                indexability: Indexability::Indexed,
            },
            usability: UsabilityFindings { mobile_friendly: true, touch_targets: String::new() },
            traffic: TrafficProfile {
                sources: TrafficSources { organic: 40, social: 30, direct: 15, paid: 15 },
                social_breakdown: SocialBreakdown { meta: 50, google: 18, linkedin: 12, tiktok: 21, other: 5 },
                social_quality: SocialQuality {
                    bounce_rate: 80.0,
                    time_on_site: "0m 42s".to_string(),
                    conversions: 2,
                },
            },
            detected_issues: vec![],
        }
    }

    fn view() -> ChatRenderer {
        ChatRenderer::new(
            RevealConfig { chars_per_tick: 5, interval: Duration::from_millis(1) },
            Duration::from_millis(50)
        )
    }

    #[tokio::test]
    async fn submit_is_a_noop_while_the_opening_is_revealing() {
        let session = ChatSession::open(
            sample_context(),
            Arc::new(ScriptedBackend::with_fragments(&["never requested"])),
            SamplingConfig::default()
        );
        let mut view = view();
        let _reveal = view.begin_opening(&session.opening_message());

        let len_before = session.transcript_len();
        assert!(submit(&session, &mut view, "blocked question").await.is_none());
        assert_eq!(session.transcript_len(), len_before);
    }

    #[tokio::test]
    async fn submit_streams_then_replaces_suggestions() {
        let session = ChatSession::open(
            sample_context(),
            Arc::new(
                ScriptedBackend::with_fragments(
                    &["Answer.\nUSEFUL THINGS YOU CAN ASK NEXT:\nIs speed the issue?\n"]
                )
            ),
            SamplingConfig::default()
        );
        let mut view = view();
        view.finish_opening();

        let mut turn = submit(&session, &mut view, "question").await.expect("turn");
        assert!(view.is_busy());
        assert!(view.suggestions().is_empty());

        while turn.next_fragment().await.is_some() {}
        let suggestions = suggest::extract_suggestions(turn.final_text());
        view.finish_response(suggestions);
        drop(turn);

        assert!(!view.is_busy());
        assert_eq!(view.suggestions().specific, vec!["Is speed the issue?"]);
    }

    #[tokio::test]
    async fn a_failed_turn_leaves_the_suggestion_chips_empty() {
        let session = ChatSession::open(
            sample_context(),
            Arc::new(
                ScriptedBackend::with_script(
                    vec![Ok("partial ".to_string()), Err("connection reset".to_string())]
                )
            ),
            SamplingConfig::default()
        );
        let mut view = view();
        view.finish_opening();

        let turn = submit(&session, &mut view, "question").await.expect("turn");
        stream_response(&mut view, turn, Duration::from_millis(50)).await;

        // No defaults after an apology, unlike an answer with no markers.
        assert!(!view.is_busy());
        assert!(view.suggestions().is_empty());
    }
}
