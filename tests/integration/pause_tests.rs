use crate::support::{fixture_site, test_config};
use scrapeman::config::Config;
use scrapeman::plugins;
use scrapeman::{Crawler, EngineState, EventKind, FinalPayload, Outcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn crawler(config: Config) -> Crawler {
    let mut crawler = Crawler::new(config).unwrap();
    crawler.plugins(plugins::core());
    crawler
}

async fn run_to_end(crawler: &mut Crawler) -> FinalPayload {
    match crawler.run().await.unwrap() {
        Outcome::Finished(payload) => payload,
        Outcome::Paused(_) => panic!("crawl was not expected to pause"),
    }
}

/// Runs until `after` has elapsed, then pauses
async fn run_then_pause(crawler: &mut Crawler, after: Duration) -> EngineState {
    let handle = crawler.pause_handle();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        handle.pause();
    });

    match crawler.run().await.unwrap() {
        Outcome::Paused(state) => state,
        Outcome::Finished(_) => panic!("crawl finished before the pause"),
    }
}

fn status_codes(payload: &FinalPayload) -> Vec<(String, Option<u16>)> {
    payload
        .resources
        .iter()
        .map(|(url, resource)| (url.to_string(), resource.status_code))
        .collect()
}

#[tokio::test]
async fn test_pause_and_resume_on_fresh_engine() {
    let site = fixture_site(Duration::from_millis(100)).await;
    let config = test_config(&site.base());

    let mut reference = crawler(config.clone());
    reference.start(None).unwrap();
    let expected = run_to_end(&mut reference).await;

    let mut first = crawler(config.clone());
    first.start(None).unwrap();
    let state = run_then_pause(&mut first, Duration::from_millis(150)).await;

    assert!(!first.is_started());
    assert_eq!(first.pending(), 0);
    assert!(state.resources.iter().all(|(_, resource)| !resource.pending));
    assert!(!state.queue.is_empty());

    let dir = tempdir().unwrap();
    let path = dir.path().join("pause.json");
    state.save(&path).unwrap();

    let mut second = crawler(config);
    second.start(Some(EngineState::load(&path).unwrap())).unwrap();
    let resumed = run_to_end(&mut second).await;

    assert_eq!(status_codes(&resumed), status_codes(&expected));
    for (url, resource) in resumed.resources.iter() {
        let before = expected.resources.get(url).unwrap();
        let mut from = resource.from.clone();
        let mut expected_from = before.from.clone();
        from.sort();
        expected_from.sort();
        assert_eq!(from, expected_from, "referrers of {}", url);
    }
}

#[tokio::test]
async fn test_resume_same_engine_after_pause() {
    let site = fixture_site(Duration::from_millis(100)).await;
    let paused = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&paused);

    let mut crawler = crawler(test_config(&site.base()));
    crawler.on(EventKind::Paused, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    crawler.start(None).unwrap();
    run_then_pause(&mut crawler, Duration::from_millis(150)).await;
    assert_eq!(paused.load(Ordering::SeqCst), 1);

    // Results of fetches abandoned by the pause arrive in the meantime
    tokio::time::sleep(Duration::from_millis(200)).await;

    crawler.start(None).unwrap();
    let payload = run_to_end(&mut crawler).await;

    let urls: Vec<String> = payload.resources.urls().map(str::to_string).collect();
    assert_eq!(urls, site.expected_urls());
    assert!(payload.resources.iter().all(|(_, resource)| !resource.pending));
}

#[tokio::test]
async fn test_pause_before_any_fetch_keeps_seed() {
    let site = fixture_site(Duration::ZERO).await;

    let mut crawler = crawler(test_config(&site.base()));
    let state = crawler.pause();

    assert!(state.resources.is_empty());
    assert_eq!(state.queue.len(), 1);
    assert_eq!(state.queue[0].to, site.url("/"));
    assert_eq!(state.queue[0].from, None);
}
