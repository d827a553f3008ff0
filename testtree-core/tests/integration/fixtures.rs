// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::{Arc, Mutex};
use testtree_core::events::{TreeEvent, TreeEventKind};
use testtree_metadata::{ResultRecord, ResultStatus};

pub(crate) fn record(series: &str, display_name: &str, status: ResultStatus) -> ResultRecord {
    ResultRecord::new(series, display_name, status)
}

/// Collects every event passed to the callback it hands out.
#[derive(Clone, Debug, Default)]
pub(crate) struct EventLog {
    events: Arc<Mutex<Vec<TreeEvent>>>,
}

impl EventLog {
    pub(crate) fn callback(&self) -> impl FnMut(TreeEvent) + Send + use<> {
        let events = self.events.clone();
        move |event| events.lock().expect("lock is not poisoned").push(event)
    }

    pub(crate) fn events(&self) -> Vec<TreeEvent> {
        self.events.lock().expect("lock is not poisoned").clone()
    }

    pub(crate) fn reveal_count(&self, series: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| {
                matches!(&event.kind, TreeEventKind::Reveal { path } if path.series_name() == series)
            })
            .count()
    }
}
