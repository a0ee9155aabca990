use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashboard::debounce::Debouncer;
use dashboard::explorer::{self, ExplorerConfig, ExplorerEvent, ExplorerView};
use dashboard::fetch::{FetchError, SanctionsBackend};
use dashboard::query::{QueryState, ResultPage};
use tokio::sync::{mpsc, watch};
use tokio::time::{advance, sleep, Duration};

/// Records every page request it sees and answers with an empty page.
struct RecordingBackend {
    queries: Arc<Mutex<Vec<QueryState>>>,
}

#[async_trait]
impl SanctionsBackend for RecordingBackend {
    async fn sanctions_page(&self, query: &QueryState) -> Result<ResultPage, FetchError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(ResultPage::default())
    }

    async fn authorities(&self) -> Result<Vec<String>, FetchError> {
        Ok(Vec::new())
    }
}

fn session(
    queries: Arc<Mutex<Vec<QueryState>>>,
) -> (
    mpsc::Sender<ExplorerEvent>,
    watch::Receiver<ExplorerView>,
) {
    let backend = Arc::new(RecordingBackend { queries });
    let (event_tx, event_rx) = mpsc::channel(16);
    let (view_tx, view_rx) = watch::channel(ExplorerView::default());
    tokio::spawn(explorer::run(
        backend,
        ExplorerConfig::default(),
        event_rx,
        view_tx,
    ));
    (event_tx, view_rx)
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_commit_exactly_once() {
    let queries = Arc::new(Mutex::new(Vec::new()));
    let (event_tx, _view_rx) = session(queries.clone());

    // Let the session-open fetch settle.
    sleep(Duration::from_millis(10)).await;

    for text in ["a", "ab", "abc"] {
        event_tx
            .send(ExplorerEvent::SearchInput(text.into()))
            .await
            .unwrap();
        sleep(Duration::from_millis(100)).await;
    }
    // Quiet period (500 ms) elapses only after the final edit.
    sleep(Duration::from_millis(600)).await;

    let seen = queries.lock().unwrap().clone();
    assert_eq!(seen.len(), 2, "one mount fetch plus one committed search");
    assert_eq!(seen[0].committed_search, "");
    assert_eq!(seen[1].committed_search, "abc");
    assert_eq!(seen[1].page_index, 0);
}

#[tokio::test(start_paused = true)]
async fn raw_edits_never_fetch_before_the_quiet_period() {
    let queries = Arc::new(Mutex::new(Vec::new()));
    let (event_tx, view_rx) = session(queries.clone());

    sleep(Duration::from_millis(10)).await;
    event_tx
        .send(ExplorerEvent::SearchInput("lazarus".into()))
        .await
        .unwrap();
    // Inside the quiet period: the echo is live but nothing was committed
    // and no request has gone out beyond the mount fetch.
    sleep(Duration::from_millis(200)).await;

    let view = view_rx.borrow().clone();
    assert_eq!(view.raw_search, "lazarus");
    assert_eq!(view.committed_search, "");
    assert_eq!(queries.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn clearing_the_input_commits_an_empty_search() {
    let queries = Arc::new(Mutex::new(Vec::new()));
    let (event_tx, _view_rx) = session(queries.clone());

    sleep(Duration::from_millis(10)).await;
    event_tx
        .send(ExplorerEvent::SearchInput("abc".into()))
        .await
        .unwrap();
    sleep(Duration::from_millis(600)).await;
    event_tx
        .send(ExplorerEvent::SearchInput(String::new()))
        .await
        .unwrap();
    sleep(Duration::from_millis(600)).await;

    let seen = queries.lock().unwrap().clone();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[2].committed_search, "");
    // The empty filter disappears from the request entirely.
    assert!(seen[2].request_params().iter().all(|(k, _)| *k != "search"));
}

#[tokio::test(start_paused = true)]
async fn newest_edit_supersedes_the_pending_deadline() {
    let mut debouncer = Debouncer::new(Duration::from_millis(500));
    assert!(debouncer.deadline().is_none());

    debouncer.touch();
    let first = debouncer.deadline().expect("armed");
    advance(Duration::from_millis(100)).await;
    debouncer.touch();
    assert!(debouncer.deadline().expect("re-armed") > first);

    assert!(debouncer.take());
    assert!(!debouncer.take(), "deadline is one-shot");
}
