//! Single-session walks: fresh starts, chain end, and failure kinds

use crate::common::*;
use chainwalk::crawler::{run_chain, Termination};
use chainwalk::source::{NextPage, PageResult, ParseError, SelectorSource};
use chainwalk::state::{load_checkpoint, Checkpoint, CHECKPOINT_FILENAME};
use chainwalk::ChainError;
use tempfile::TempDir;
use url::Url;
use wiremock::MockServer;

#[tokio::test]
async fn test_full_walk_from_scratch() {
    let server = MockServer::start().await;
    mount_comic(&server, 3).await;
    let dir = TempDir::new().unwrap();

    let summary = coordinator(&server, dir.path()).run().await.expect("walk succeeds");

    assert_eq!(summary.termination, Termination::EndOfChain);
    assert_eq!(summary.pages_processed, 3);
    assert_eq!(
        summary.checkpoint,
        Checkpoint {
            last_page_index: 3,
            last_page_url: Some(page_url(&server, 3)),
        }
    );
    assert_eq!(load_checkpoint(dir.path()).unwrap(), Some(summary.checkpoint));

    for n in 1..=3 {
        let asset = asset_path(&server, dir.path(), n);
        assert_eq!(std::fs::read(&asset).unwrap(), image_body(n));
        assert_eq!(hits(&server, &format!("/page{}", n)).await, 1);
    }

    let names = listing(dir.path());
    assert_eq!(names.len(), 4);
    assert!(names[0].starts_with("00001-") && names[0].ends_with(".png"));
    assert!(names[1].starts_with("00002-"));
    assert!(names[2].starts_with("00003-"));
    assert_eq!(names[3], CHECKPOINT_FILENAME);
}

#[tokio::test]
async fn test_single_page_chain_ends_on_self_link() {
    let server = MockServer::start().await;
    mount_comic(&server, 1).await;
    let dir = TempDir::new().unwrap();

    let summary = coordinator(&server, dir.path()).run().await.unwrap();

    assert_eq!(summary.termination, Termination::EndOfChain);
    assert_eq!(summary.pages_processed, 1);
    assert_eq!(summary.checkpoint.last_page_index, 1);
    assert_eq!(
        summary.checkpoint.last_page_url,
        Some(page_url(&server, 1))
    );
    assert_eq!(hits(&server, "/page1").await, 1);
}

#[tokio::test]
async fn test_page_transport_failure_keeps_previous_checkpoint() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 3).await;
    mount_image(&server, 1).await;
    mount_status(&server, "/page2", 500).await;
    let dir = TempDir::new().unwrap();

    let err = coordinator(&server, dir.path()).run().await.unwrap_err();

    assert!(matches!(err, ChainError::Transport(_)), "got {err:?}");
    assert!(err.is_resumable());
    assert!(err.to_string().contains("/page2"));
    assert_eq!(
        load_checkpoint(dir.path()).unwrap(),
        Some(Checkpoint {
            last_page_index: 1,
            last_page_url: Some(page_url(&server, 1)),
        })
    );
    assert!(asset_path(&server, dir.path(), 1).exists());
}

#[tokio::test]
async fn test_image_transport_failure_does_not_advance() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 3).await;
    mount_image(&server, 1).await;
    mount_page(&server, 2, 3).await;
    mount_status(&server, "/images/strip2.png", 404).await;
    let dir = TempDir::new().unwrap();

    let err = coordinator(&server, dir.path()).run().await.unwrap_err();

    assert!(matches!(err, ChainError::Transport(_)));
    assert!(err.to_string().contains("/images/strip2.png"));
    assert_eq!(load_checkpoint(dir.path()).unwrap().unwrap().last_page_index, 1);
    assert!(!asset_path(&server, dir.path(), 2).exists());
}

#[tokio::test]
async fn test_layout_mismatch_is_parse_failure() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 3).await;
    mount_image(&server, 1).await;
    wiremock::Mock::given(wiremock::matchers::path("/page2"))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_string("<html><body><p>Site redesign!</p></body></html>"),
        )
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let err = coordinator(&server, dir.path()).run().await.unwrap_err();

    match &err {
        ChainError::Parse { url, source } => {
            assert_eq!(url, page_url(&server, 2).as_str());
            assert!(matches!(
                source,
                ParseError::MatchCount {
                    expected: 1,
                    actual: 0,
                    ..
                }
            ));
        }
        other => panic!("expected parse failure, got {other:?}"),
    }
    assert!(!err.is_resumable());
    assert_eq!(load_checkpoint(dir.path()).unwrap().unwrap().last_page_index, 1);
}

#[tokio::test]
async fn test_run_chain_with_closure_source() {
    let server = MockServer::start().await;
    mount_comic(&server, 2).await;
    let dir = TempDir::new().unwrap();
    let last = page_url(&server, 2);

    // Explicit tagged result instead of a self-link convention
    let source = move |page: &Url, _content: &[u8]| -> Result<PageResult, ParseError> {
        let n: u32 = page.path().trim_start_matches("/page").parse().unwrap();
        Ok(PageResult {
            image_url: page.join(&format!("/images/strip{}.png", n)).unwrap(),
            next: if *page == last {
                NextPage::End
            } else {
                NextPage::Continue(page.join(&format!("/page{}", n + 1)).unwrap())
            },
        })
    };

    let summary = run_chain(page_url(&server, 1), source, dir.path(), fetcher())
        .await
        .unwrap();

    assert_eq!(summary.pages_processed, 2);
    assert_eq!(std::fs::read(asset_path(&server, dir.path(), 2)).unwrap(), image_body(2));
}

#[tokio::test]
async fn test_source_pointing_next_at_current_page_ends_walk() {
    let server = MockServer::start().await;
    mount_comic(&server, 3).await;
    let dir = TempDir::new().unwrap();

    // Page 2 claims to continue at itself, once plainly and once with a fragment
    let source = |page: &Url, _content: &[u8]| -> Result<PageResult, ParseError> {
        let n: u32 = page.path().trim_start_matches("/page").parse().unwrap();
        let next = match n {
            1 => page.join("/page2").unwrap(),
            _ => page.join("#").unwrap(),
        };
        Ok(PageResult {
            image_url: page.join(&format!("/images/strip{}.png", n)).unwrap(),
            next: NextPage::Continue(next),
        })
    };

    let summary = run_chain(page_url(&server, 1), source, dir.path(), fetcher())
        .await
        .unwrap();

    assert_eq!(summary.termination, Termination::EndOfChain);
    assert_eq!(summary.pages_processed, 2);
    assert_eq!(
        summary.checkpoint,
        Checkpoint {
            last_page_index: 2,
            last_page_url: Some(page_url(&server, 2)),
        }
    );
    assert_eq!(hits(&server, "/page2").await, 1);
    assert_eq!(hits(&server, "/images/strip2.png").await, 1);
    assert!(!dir
        .path()
        .join(chainwalk::crawler::asset_filename(3, &image_url(&server, 2)))
        .exists());
}

#[tokio::test]
async fn test_fragment_next_link_on_last_page_ends_walk() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 2).await;
    mount_image(&server, 1).await;
    wiremock::Mock::given(wiremock::matchers::path("/page2"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
            r##"<html><body>
            <div id="comic"><img src="/images/strip2.png"></div>
            <a class="next" href="#">Next</a>
            </body></html>"##,
        ))
        .mount(&server)
        .await;
    mount_image(&server, 2).await;
    let dir = TempDir::new().unwrap();

    let summary = coordinator(&server, dir.path()).run().await.unwrap();

    assert_eq!(summary.termination, Termination::EndOfChain);
    assert_eq!(summary.checkpoint.last_page_index, 2);
    assert_eq!(hits(&server, "/page2").await, 1);
    assert_eq!(listing(dir.path()).len(), 3);

    // Resuming the finished walk re-reads page 2 and stops there
    let summary = coordinator(&server, dir.path()).run().await.unwrap();
    assert_eq!(summary.pages_processed, 0);
    assert_eq!(hits(&server, "/images/strip2.png").await, 1);
}

#[tokio::test]
async fn test_selector_source_through_run_chain() {
    let server = MockServer::start().await;
    mount_comic(&server, 2).await;
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("downloads").join("mock");

    let source = SelectorSource::new("a.next", "#comic img").unwrap();
    let summary = run_chain(page_url(&server, 1), source, &output, fetcher())
        .await
        .unwrap();

    assert_eq!(summary.termination, Termination::EndOfChain);
    assert!(output.join(CHECKPOINT_FILENAME).exists());
}

#[tokio::test]
async fn test_page_limit_stops_cleanly() {
    let server = MockServer::start().await;
    mount_comic(&server, 4).await;
    let dir = TempDir::new().unwrap();

    let summary = coordinator(&server, dir.path())
        .with_max_pages(Some(2))
        .run()
        .await
        .unwrap();

    assert_eq!(summary.termination, Termination::PageLimit);
    assert_eq!(summary.pages_processed, 2);
    assert_eq!(summary.checkpoint.last_page_index, 2);
    assert_eq!(hits(&server, "/page3").await, 0);
}
