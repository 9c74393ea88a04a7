//! Cached provider behavior.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{RecordingRenderer, ScriptedProvider};
use parley::cache::{CachePolicy, CachedProvider};
use parley::controller::TurnController;
use parley::provider::{Completion, ModelProvider};
use parley::session::SessionStore;

fn cached(
    provider: ScriptedProvider,
    ttl: Duration,
    capacity: usize,
) -> CachedProvider<ScriptedProvider> {
    CachedProvider::new(Box::new(provider), CachePolicy { ttl, capacity })
}

async fn text_of(provider: &dyn ModelProvider, prompt: &str) -> String {
    match provider.complete(prompt, false).await.unwrap() {
        Completion::Text(text) => text,
        other => panic!("expected text, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_prompt_is_served_from_cache() {
    let inner = ScriptedProvider::new("m");
    inner.queue_text("4").queue_text("stale?");
    let provider = cached(inner, Duration::from_secs(60), 8);

    assert_eq!(text_of(&provider, "2+2?").await, "4");
    assert_eq!(text_of(&provider, "2+2?").await, "4");
    assert_eq!(provider.cache().len(), 1);
}

#[tokio::test]
async fn different_prompts_miss() {
    let inner = ScriptedProvider::new("m");
    inner.queue_text("4").queue_text("5");
    let provider = cached(inner, Duration::from_secs(60), 8);

    assert_eq!(text_of(&provider, "2+2?").await, "4");
    assert_eq!(text_of(&provider, "2+3?").await, "5");
}

#[tokio::test]
async fn expired_entries_are_refetched() {
    let inner = ScriptedProvider::new("m");
    inner.queue_text("old").queue_text("new");
    let provider = cached(inner, Duration::from_millis(5), 8);

    assert_eq!(text_of(&provider, "q").await, "old");
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(text_of(&provider, "q").await, "new");
}

#[tokio::test]
async fn failures_and_streams_are_not_cached() {
    let inner = ScriptedProvider::new("m");
    inner.queue_fault("down").queue_text("up");
    inner.queue_fragments(&["s1"]).queue_fragments(&["s2"]);
    let provider = cached(inner, Duration::from_secs(60), 8);

    assert!(provider.complete("q", false).await.is_err());
    assert_eq!(text_of(&provider, "q").await, "up");

    for _ in 0..2 {
        assert!(matches!(
            provider.complete("q", true).await.unwrap(),
            Completion::Stream(_)
        ));
    }
    assert_eq!(provider.cache().len(), 1);
}

#[tokio::test]
async fn controller_stores_cached_answers_like_fresh_ones() {
    let inner = ScriptedProvider::new("m");
    inner.queue_text("4");
    let provider = Arc::new(cached(inner, Duration::from_secs(60), 8));
    let controller = TurnController::new(provider.clone()).with_streaming(false);
    let mut session = SessionStore::new();
    let mut renderer = RecordingRenderer::new();

    controller.submit(&mut session, "2+2?", &mut renderer).await.unwrap();
    controller.submit(&mut session, "2+2?", &mut renderer).await.unwrap();

    let texts: Vec<_> = session.all().iter().map(|t| t.text().to_string()).collect();
    assert_eq!(texts, vec!["4", "4"]);
}
