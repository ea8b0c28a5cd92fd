//! Event-driven reporter
//!
//! Routes runner events: assertions go to the [`ResultCollector`], the
//! completion event drains it into the [`RunSynchronizer`].

use tokio::sync::mpsc;

use crate::api::TestRailApi;
use crate::config::ReporterConfig;
use crate::error::Result;
use crate::events::{AssertionEvent, RunnerEvent};
use crate::results::{CaseMatcher, ResultCollector};
use crate::sync::{RunSynchronizer, SyncReport};

/// Reporter bound to one TestRail backend
pub struct Reporter<A> {
    collector: ResultCollector,
    synchronizer: RunSynchronizer<A>,
}

impl<A: TestRailApi> Reporter<A> {
    /// Create a reporter. Fails if the configured case prefix is invalid.
    pub fn new(api: A, config: ReporterConfig) -> Result<Self> {
        let matcher = CaseMatcher::new(&config.case_prefix)?;
        Ok(Self {
            collector: ResultCollector::new(matcher),
            synchronizer: RunSynchronizer::new(api, config),
        })
    }

    /// Results collected so far
    pub fn collector(&self) -> &ResultCollector {
        &self.collector
    }

    /// The synchronizer used on completion
    pub fn synchronizer(&self) -> &RunSynchronizer<A> {
        &self.synchronizer
    }

    /// Record an assertion
    pub fn on_assertion(&mut self, event: &AssertionEvent) {
        let error = event.error.as_ref().map(|e| e.message.as_str());
        let hits = self
            .collector
            .record_assertion(&event.assertion, &event.item, error);
        if hits > 0 {
            tracing::debug!("'{}' referenced {} case(s)", event.assertion, hits);
        }
    }

    /// Synchronize everything collected so far and reset the collection
    pub async fn on_done(&mut self) -> Result<Option<SyncReport>> {
        let results = self.collector.take();
        self.synchronizer.synchronize(results).await
    }

    /// Handle one event. Only [`RunnerEvent::Done`] yields a report.
    pub async fn handle(&mut self, event: RunnerEvent) -> Result<Option<SyncReport>> {
        match event {
            RunnerEvent::Assertion(assertion) => {
                self.on_assertion(&assertion);
                Ok(None)
            }
            RunnerEvent::Done => self.on_done().await,
        }
    }

    /// Feed a finished sequence of events.
    ///
    /// Stops at the first [`RunnerEvent::Done`]; events after it are ignored.
    /// A sequence without one is completed as if it ended with it.
    pub async fn replay<I>(&mut self, events: I) -> Result<Option<SyncReport>>
    where
        I: IntoIterator<Item = RunnerEvent>,
    {
        for event in events {
            if event == RunnerEvent::Done {
                return self.on_done().await;
            }
            self.handle(event).await?;
        }
        self.on_done().await
    }

    /// Consume events from a channel until the run is done or every sender
    /// is dropped
    pub async fn listen(
        mut self,
        mut receiver: mpsc::Receiver<RunnerEvent>,
    ) -> Result<Option<SyncReport>> {
        while let Some(event) = receiver.recv().await {
            if event == RunnerEvent::Done {
                return self.on_done().await;
            }
            self.handle(event).await?;
        }
        tracing::debug!("Event channel closed without a done event");
        self.on_done().await
    }
}
