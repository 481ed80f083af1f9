use crate::support::{fixture_site, test_config};
use scrapeman::plugins::{self, from_fn};
use scrapeman::{crawl, Crawler, Event, EventKind, Outcome, PluginError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn test_full_crawl_single_site() {
    let site = fixture_site(Duration::ZERO).await;

    let outcome = crawl(test_config(&site.base())).await.unwrap();
    let Outcome::Finished(payload) = outcome else {
        panic!("crawl should finish on its own");
    };

    let urls: Vec<String> = payload.resources.urls().map(str::to_string).collect();
    assert_eq!(urls, site.expected_urls());

    let home = payload.resources.get(&site.url("/")).unwrap();
    assert_eq!(home.status_code, Some(200));
    assert_eq!(home.from[0], None);

    let nested = payload
        .resources
        .get(&site.url("/relative-test/should-not-be-root.html"))
        .unwrap();
    assert_eq!(nested.from, vec![Some(site.url("/relative-test/"))]);

    let blog = payload.resources.get(&site.url("/blog.html")).unwrap();
    assert!(blog.from.contains(&Some(site.url("/"))));
    assert!(blog.from.contains(&Some(site.url("/relative-test/"))));

    let missing = payload.resources.get(&site.url("/missing.html")).unwrap();
    assert_eq!(missing.status_code, Some(404));

    let external = payload
        .resources
        .get(&format!("{}/", site.external.uri()))
        .unwrap();
    assert_eq!(external.status_code, Some(200));

    for (url, resource) in payload.resources.iter() {
        assert!(!resource.pending, "{} left pending", url);
        assert!(resource.get("_successful").is_none());
    }
}

#[tokio::test]
async fn test_every_url_is_fetched_once() {
    let site = fixture_site(Duration::from_millis(20)).await;

    let outcome = crawl(test_config(&site.base())).await.unwrap();
    assert!(matches!(outcome, Outcome::Finished(_)));

    let requests = site.server.received_requests().await.unwrap();
    let mut hits: HashMap<String, usize> = HashMap::new();
    for request in &requests {
        *hits.entry(request.url.path().to_string()).or_insert(0) += 1;
    }

    assert_eq!(hits.len(), 6);
    for (path, count) in &hits {
        assert_eq!(*count, 1, "{} fetched {} times", path, count);
    }
    assert!(!hits.contains_key("/never.html"));

    let external = site.external.received_requests().await.unwrap();
    assert_eq!(external.len(), 1);
}

#[tokio::test]
async fn test_failing_plugin_is_reported_per_resource() {
    let site = fixture_site(Duration::ZERO).await;
    let failures = Arc::new(Mutex::new(Vec::new()));
    let processed = Arc::new(AtomicUsize::new(0));

    let mut crawler = Crawler::new(test_config(&site.base())).unwrap();
    crawler
        .plugins(plugins::core())
        .plugin(from_fn("broken", |_| {
            Err(PluginError::failed("broken", "this plugin threw an error"))
        }));

    let seen = Arc::clone(&failures);
    crawler.on(EventKind::PluginError, move |event| {
        if let Event::PluginError { error, resource, .. } = event {
            seen.lock()
                .unwrap()
                .push((resource.url.clone(), error.to_string()));
        }
    });
    let counter = Arc::clone(&processed);
    crawler.on(EventKind::ResourceProcessed, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    crawler.start(None).unwrap();
    let Outcome::Finished(payload) = crawler.run().await.unwrap() else {
        panic!("crawl should finish despite the failing plugin");
    };

    let urls: Vec<String> = payload.resources.urls().map(str::to_string).collect();
    assert_eq!(urls, site.expected_urls());

    let failures = failures.lock().unwrap();
    assert_eq!(failures.len(), processed.load(Ordering::SeqCst));
    assert_eq!(failures.len(), payload.resources.len());
    for (_, message) in failures.iter() {
        assert_eq!(message, "Plugin 'broken' failed: this plugin threw an error");
    }
}

#[tokio::test]
async fn test_ceiling_of_one_never_overlaps() {
    let site = fixture_site(Duration::from_millis(30)).await;
    let mut config = test_config(&site.base());
    config.crawler.max_pending = 1;

    let max_seen = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&max_seen);

    let mut crawler = Crawler::new(config).unwrap();
    crawler.plugins(plugins::core());
    crawler.on(EventKind::Interval, move |event| {
        if let Event::Interval { pending, .. } = event {
            observed.fetch_max(*pending, Ordering::SeqCst);
        }
    });

    crawler.start(None).unwrap();
    let outcome = crawler.run().await.unwrap();

    assert!(matches!(outcome, Outcome::Finished(_)));
    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert_eq!(crawler.pending(), 0);
}

#[tokio::test]
async fn test_unreachable_base_records_error() {
    let errors = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&errors);

    let mut crawler = Crawler::new(test_config("http://127.0.0.1:1")).unwrap();
    crawler.plugins(plugins::core());
    crawler.on(EventKind::ResourceError, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    crawler.start(None).unwrap();
    let Outcome::Finished(payload) = crawler.run().await.unwrap() else {
        panic!("crawl should finish");
    };

    assert_eq!(payload.resources.len(), 1);
    let seed = payload.resources.get("http://127.0.0.1:1/").unwrap();
    assert!(seed.error.is_some());
    assert_eq!(seed.status_code, None);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_plugins_share_data_store() {
    let site = fixture_site(Duration::ZERO).await;

    let mut crawler = Crawler::new(test_config(&site.base())).unwrap();
    crawler
        .plugins(plugins::core())
        .plugin(from_fn("count", |ctx| {
            let seen = ctx.data().get("count").and_then(|v| v.as_u64()).unwrap_or(0);
            ctx.data_mut().insert("count".to_string(), (seen + 1).into());
            Ok(())
        }));

    crawler.start(None).unwrap();
    let Outcome::Finished(payload) = crawler.run().await.unwrap() else {
        panic!("crawl should finish");
    };

    assert_eq!(
        payload.data.get("count").and_then(|v| v.as_u64()),
        Some(site.expected_urls().len() as u64)
    );
}
