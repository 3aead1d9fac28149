use crate::pagination::{FetchError, PageCursor, RetryCounter, RetryPolicy};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Why a stream stopped requesting pages
///
/// None of these is an error for the caller: every variant means "use the
/// records collected so far".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// The API reported no further page
    Exhausted,

    /// The caller-supplied record target was reached
    TargetReached,

    /// `max_retry` consecutive fetches failed; partial results are kept
    RetryBudgetExceeded,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Exhausted => "exhausted",
            Self::TargetReached => "target reached",
            Self::RetryBudgetExceeded => "retry budget exceeded",
        };
        f.write_str(label)
    }
}

/// Stepwise pagination state machine for one stream
///
/// The caller asks for the cursor to request, performs the fetch, and reports
/// the outcome back. A failure keeps the cursor where it was so the same
/// position is retried; a success resets the retry counter and advances.
#[derive(Debug, Clone)]
pub struct PageStream {
    name: String,
    cursor: PageCursor,
    retry: RetryCounter,
    target: usize,
    collected: usize,
    fetches: usize,
    last_failed: bool,
    termination: Option<Termination>,
}

impl PageStream {
    /// Creates a stream in its initial state
    ///
    /// A target of zero terminates the stream before any fetch.
    pub fn new(name: impl Into<String>, target: usize, max_retry: u32) -> Self {
        Self {
            name: name.into(),
            cursor: PageCursor::initial(),
            retry: RetryCounter::new(max_retry),
            target,
            collected: 0,
            fetches: 0,
            last_failed: false,
            termination: (target == 0).then_some(Termination::TargetReached),
        }
    }

    /// Returns the cursor to request next, or `None` once terminated
    pub fn next_cursor(&self) -> Option<&PageCursor> {
        match self.termination {
            Some(_) => None,
            None => Some(&self.cursor),
        }
    }

    /// Returns true when the API handed back the cursor that was just requested
    /// while still announcing another page
    pub fn is_stalled(&self, next: &PageCursor) -> bool {
        next.has_next && !self.cursor.cursor.is_empty() && next.cursor == self.cursor.cursor
    }

    /// Records a successful page carrying `added` records
    pub fn record_page(&mut self, next: PageCursor, added: usize) {
        self.fetches += 1;
        self.last_failed = false;
        self.retry.reset();
        self.collected += added;
        self.cursor = next;

        if !self.cursor.has_next {
            self.termination = Some(Termination::Exhausted);
        } else if self.collected >= self.target {
            self.termination = Some(Termination::TargetReached);
        }
    }

    /// Records a page whose records were kept but whose cursor could not be
    /// read
    ///
    /// The records count toward the target. The fetch still counts as a
    /// failure, so the same cursor is retried. Returns true when the stream
    /// stopped, either on the target or on the retry budget.
    pub fn record_partial_page(&mut self, added: usize, error: &FetchError) -> bool {
        self.collected += added;
        if self.collected >= self.target {
            self.fetches += 1;
            self.last_failed = false;
            self.termination = Some(Termination::TargetReached);
            return true;
        }
        self.record_failure(error)
    }

    /// Records a failed fetch; returns true when the stream was abandoned
    pub fn record_failure(&mut self, error: &FetchError) -> bool {
        self.fetches += 1;
        self.last_failed = true;
        let exhausted = self.retry.record_failure();

        tracing::debug!(
            stream = %self.name,
            cursor = %self.cursor.cursor,
            attempt = self.retry.count(),
            "Page fetch failed: {}",
            error
        );

        if exhausted {
            tracing::warn!(
                stream = %self.name,
                "Abandoning stream after {} consecutive failures, keeping {} records",
                self.retry.count(),
                self.collected
            );
            self.termination = Some(Termination::RetryBudgetExceeded);
        }
        exhausted
    }

    /// Delay to observe before the next request, zero once terminated
    pub fn pending_delay(&self, policy: &RetryPolicy) -> Duration {
        match (self.termination, self.last_failed) {
            (Some(_), _) => Duration::ZERO,
            (None, true) => policy.retry_delay,
            (None, false) => policy.request_delay,
        }
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn fetches(&self) -> usize {
        self.fetches
    }

    pub fn collected(&self) -> usize {
        self.collected
    }

    pub fn remaining(&self) -> usize {
        self.target.saturating_sub(self.collected)
    }

    pub fn retry_count(&self) -> u32 {
        self.retry.count()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One decoded page of a stream
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: PageCursor,
}

/// Result of running a stream to completion
#[derive(Debug, Clone)]
pub struct StreamOutcome<T> {
    pub items: Vec<T>,
    pub fetches: usize,
    pub termination: Termination,
}

impl<T> StreamOutcome<T> {
    pub fn abandoned(&self) -> bool {
        self.termination == Termination::RetryBudgetExceeded
    }
}

/// Produces the pages of one stream
#[async_trait]
pub trait PageSource: Send {
    type Item: Send;

    async fn fetch_page(&mut self, cursor: &PageCursor) -> Result<Page<Self::Item>, FetchError>;
}

/// Runs a stream until it terminates and returns everything it collected
///
/// Records beyond `target` are dropped.
pub async fn collect_stream<S: PageSource>(
    name: &str,
    source: &mut S,
    policy: &RetryPolicy,
    target: usize,
) -> StreamOutcome<S::Item> {
    let mut stream = PageStream::new(name, target, policy.max_retry);
    let mut items = Vec::new();

    while let Some(cursor) = stream.next_cursor().cloned() {
        match source.fetch_page(&cursor).await {
            Ok(page) if stream.is_stalled(&page.next) => {
                stream.record_failure(&FetchError::StalledCursor(cursor.cursor));
            }
            Ok(page) => {
                let added = page.items.len();
                items.extend(page.items);
                stream.record_page(page.next, added);
            }
            Err(e) => {
                stream.record_failure(&e);
            }
        }

        let delay = stream.pending_delay(policy);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    items.truncate(target);
    StreamOutcome {
        items,
        fetches: stream.fetches(),
        termination: stream.termination().unwrap_or(Termination::Exhausted),
    }
}
