mod common;

use anyhow::Result;
use mockito::{Matcher, Server};
use serde_json::json;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use common::{config_for, error_body, lighthouse_body, API_PATH};
use site_audit::audit::{AuditClient, AuditError, Category, FetchFailure, ResultCache, Strategy};

#[tokio::test]
async fn test_request_carries_parameters_and_user_agent() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", API_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("url".into(), "https://example.com".into()),
            Matcher::UrlEncoded("strategy".into(), "mobile".into()),
            // repeated keys: UrlEncoded only sees the last value
            Matcher::Regex(
                "category=performance&category=accessibility&category=best-practices&category=seo"
                    .into(),
            ),
            Matcher::UrlEncoded("key".into(), "test-key".into()),
        ]))
        .match_header("user-agent", Matcher::Regex("Chrome/".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(lighthouse_body(0.87))
        .create_async()
        .await;

    let client = AuditClient::new(Some("test-key"), &config_for(&server.url()))?;
    let result = client.get_metrics("https://example.com", Strategy::Mobile).await?;

    mock.assert_async().await;
    assert_eq!(result.category_score(Category::Performance), 0.87);
    assert_eq!(result.category_score(Category::BestPractices), 1.0);
    assert_eq!(result.audits.first_contentful_paint.display_value, "0.9 s");
    assert_eq!(result.audits.interactive.display_value, "N/A");
    assert_eq!(result.audits.interactive.score, 0.0);

    Ok(())
}

#[tokio::test]
async fn test_camel_case_categories_are_normalized() -> Result<()> {
    let mut server = Server::new_async().await;
    let body = json!({
        "lighthouseResult": {
            "categories": {
                "performance": { "score": 0.5 },
                "accessibility": { "score": null },
                "bestPractices": { "score": 0.83 },
                "seo": { "score": 0.7 }
            }
        }
    });
    let _mock = server
        .mock("GET", API_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = AuditClient::new(Some("key"), &config_for(&server.url()))?;
    let result = client.get_metrics("https://example.com", Strategy::Desktop).await?;

    assert_eq!(result.category_score(Category::BestPractices), 0.83);
    assert_eq!(result.category_score(Category::Accessibility), 0.0);
    assert_eq!(result.audits, Default::default());

    Ok(())
}

#[tokio::test]
async fn test_forbidden_is_a_permission_error() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", API_PATH)
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(error_body(403, "The caller does not have permission"))
        .create_async()
        .await;

    let client = AuditClient::new(Some("key"), &config_for(&server.url()))?;
    let err = client
        .get_metrics("https://example.com", Strategy::Desktop)
        .await
        .unwrap_err();

    assert!(matches!(err, AuditError::Permission), "got {:?}", err);
    assert!(err.is_fatal_for_batch());

    Ok(())
}

#[tokio::test]
async fn test_rejected_key_is_an_invalid_credential_error() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", API_PATH)
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(error_body(
            400,
            "API key not valid. Please pass a valid API key.",
        ))
        .create_async()
        .await;

    let client = AuditClient::new(Some("wrong"), &config_for(&server.url()))?;
    let err = client
        .get_metrics("https://example.com", Strategy::Desktop)
        .await
        .unwrap_err();

    assert!(matches!(err, AuditError::InvalidCredential(_)), "got {:?}", err);

    Ok(())
}

#[tokio::test]
async fn test_server_error_is_a_fetch_error() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", API_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(error_body(500, "Lighthouse returned error: FAILED_DOCUMENT_REQUEST"))
        .create_async()
        .await;

    let client = AuditClient::new(Some("key"), &config_for(&server.url()))?;
    let err = client
        .get_metrics("https://example.com", Strategy::Desktop)
        .await
        .unwrap_err();

    match err {
        AuditError::Fetch(FetchFailure::Status { status, detail }) => {
            assert_eq!(status, 500);
            assert!(detail.contains("FAILED_DOCUMENT_REQUEST"));
        }
        other => panic!("expected fetch error, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_unreadable_error_body_falls_back_to_status_reason() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", API_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_chunked_body(|w| {
            w.write_all(br#"{"error":{"#)?;
            std::thread::sleep(Duration::from_millis(100));
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "upstream hung up"))
        })
        .create_async()
        .await;

    let client = AuditClient::new(Some("key"), &config_for(&server.url()))?;
    let err = client
        .get_metrics("https://example.com", Strategy::Desktop)
        .await
        .unwrap_err();

    match err {
        AuditError::Fetch(FetchFailure::Status { status, detail }) => {
            assert_eq!(status, 500);
            assert_eq!(detail, "Internal Server Error");
        }
        other => panic!("expected fetch error, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_unreachable_upstream_is_a_fetch_error() -> Result<()> {
    let config = config_for("http://127.0.0.1:9");
    let client = AuditClient::new(Some("key"), &config)?;
    let err = client
        .get_metrics("https://example.com", Strategy::Desktop)
        .await
        .unwrap_err();

    assert!(matches!(err, AuditError::Fetch(FetchFailure::Transport(_))), "got {:?}", err);

    Ok(())
}

#[tokio::test]
async fn test_missing_lighthouse_result_is_an_invalid_response() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", API_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "kind": "pagespeedonline#result" }).to_string())
        .create_async()
        .await;

    let client = AuditClient::new(Some("key"), &config_for(&server.url()))?;
    let err = client
        .get_metrics("https://example.com", Strategy::Desktop)
        .await
        .unwrap_err();

    assert!(matches!(err, AuditError::InvalidResponse(_)), "got {:?}", err);

    Ok(())
}

#[tokio::test]
async fn test_identical_requests_hit_upstream_once() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", API_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(lighthouse_body(0.6))
        .expect(1)
        .create_async()
        .await;

    let client = AuditClient::new(Some("key"), &config_for(&server.url()))?;
    let first = client.get_metrics("https://example.com", Strategy::Desktop).await?;
    let second = client.get_metrics("https://example.com", Strategy::Desktop).await?;

    mock.assert_async().await;
    assert_eq!(first, second);
    assert_eq!(client.cache().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_cache_is_keyed_by_strategy_and_shared_between_clients() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", API_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(lighthouse_body(0.6))
        .expect(2)
        .create_async()
        .await;

    let config = config_for(&server.url());
    let cache = Arc::new(ResultCache::new(Duration::from_secs(3600)));
    let first = AuditClient::with_cache(Some("key"), &config, cache.clone())?;
    let second = AuditClient::with_cache(Some("key"), &config, cache.clone())?;

    first.get_metrics("https://example.com", Strategy::Desktop).await?;
    second.get_metrics("https://example.com", Strategy::Desktop).await?;
    second.get_metrics("https://example.com", Strategy::Mobile).await?;

    mock.assert_async().await;
    assert_eq!(cache.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_failures_are_not_cached() -> Result<()> {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", API_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let client = AuditClient::new(Some("key"), &config_for(&server.url()))?;
    assert!(client.get_metrics("https://example.com", Strategy::Desktop).await.is_err());
    assert!(client.get_metrics("https://example.com", Strategy::Desktop).await.is_err());

    mock.assert_async().await;
    assert!(client.cache().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_expired_entries_are_swept_on_insert() -> Result<()> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", API_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(lighthouse_body(0.6))
        .expect(2)
        .create_async()
        .await;

    // zero window: every stored result is already stale on the next insert
    let cache = Arc::new(ResultCache::new(Duration::ZERO));
    let client = AuditClient::with_cache(Some("key"), &config_for(&server.url()), cache.clone())?;

    client.get_metrics("https://a.com", Strategy::Desktop).await?;
    client.get_metrics("https://b.com", Strategy::Desktop).await?;

    assert_eq!(cache.len(), 1);

    Ok(())
}
