//! Test doubles shared by the buffer and session tests.

use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::geo::{Plot, PlotDraft};
use crate::registry::{PlotRegistry, RegistryError};

/// In-memory registry. Records drafts, can hold a request on a gate, and can
/// be told to fail the next call.
#[derive(Default)]
pub(crate) struct FakeRegistry {
    pub(crate) drafts: Mutex<Vec<PlotDraft>>,
    pub(crate) stored: Mutex<Vec<Plot>>,
    fail_next: Mutex<Option<(u16, String)>>,
    gate: Option<Arc<Notify>>,
}

impl FakeRegistry {
    pub(crate) fn gated(gate: Arc<Notify>) -> Self {
        Self { gate: Some(gate), ..Self::default() }
    }

    pub(crate) fn with_plots(plots: Vec<Plot>) -> Self {
        Self { stored: Mutex::new(plots), ..Self::default() }
    }

    pub(crate) fn fail_next(&self, status: u16, message: &str) {
        *self.fail_next.lock().unwrap() = Some((status, message.to_owned()));
    }

    pub(crate) fn draft_count(&self) -> usize {
        self.drafts.lock().unwrap().len()
    }

    fn take_failure(&self) -> Option<RegistryError> {
        self.fail_next
            .lock()
            .unwrap()
            .take()
            .map(|(status, message)| RegistryError::Rejected { status, message })
    }
}

#[async_trait::async_trait]
impl PlotRegistry for FakeRegistry {
    async fn fetch_all(&self) -> Result<Vec<Plot>, RegistryError> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn register(&self, draft: &PlotDraft) -> Result<Plot, RegistryError> {
        self.drafts.lock().unwrap().push(draft.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        let mut stored = self.stored.lock().unwrap();
        let plot = Plot {
            id: format!("PL{:04}", stored.len() + 1),
            name: draft.name.clone(),
            points: draft.points.clone(),
            owner_ref: None,
            attributes: draft.metadata.clone(),
        };
        stored.push(plot.clone());
        Ok(plot)
    }
}
