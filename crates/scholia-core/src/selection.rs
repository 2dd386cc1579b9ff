//! Tracks the reader's current text selection.
//!
//! The watcher reads the embedded chapter first and only falls back to the
//! host surface when nothing is selected there. It is driven from outside:
//! the shell forwards pointer releases, selection-change notifications and a
//! periodic re-discovery tick. Everything here runs on the UI thread.

use crate::surface::{DocumentSurface, SurfaceId, SurfaceProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, trace};

const DEFAULT_SOURCE_TITLE: &str = "Current Chapter";

/// A non-empty highlighted passage and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    text: String,
    source_locator: String,
    source_title: String,
}

impl Selection {
    /// Returns `None` for empty or whitespace-only text.
    pub fn new(
        text: &str,
        source_locator: impl Into<String>,
        source_title: impl Into<String>,
    ) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            source_locator: source_locator.into(),
            source_title: source_title.into(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source_locator(&self) -> &str {
        &self.source_locator
    }

    pub fn source_title(&self) -> &str {
        &self.source_title
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatcherConfig {
    pub enabled: bool,
    /// Wait after a pointer release before reading the selection.
    pub settle_delay_ms: u64,
    /// Period of the embedded-surface re-discovery tick.
    pub rediscover_interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            settle_delay_ms: 150,
            rediscover_interval_ms: 2000,
        }
    }
}

impl WatcherConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn rediscover_interval(&self) -> Duration {
        Duration::from_millis(self.rediscover_interval_ms.max(1))
    }
}

pub struct SelectionWatcher {
    enabled: bool,
    settle_delay: Duration,
    current: watch::Sender<Option<Selection>>,
    attached: HashSet<SurfaceId>,
    settle_deadline: Option<Instant>,
}

impl SelectionWatcher {
    pub fn new(config: WatcherConfig) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            enabled: config.enabled,
            settle_delay: config.settle_delay(),
            current,
            attached: HashSet::new(),
            settle_deadline: None,
        }
    }

    /// A watcher that never observes anything and always reports no selection.
    pub fn disabled() -> Self {
        Self::new(WatcherConfig {
            enabled: false,
            ..WatcherConfig::default()
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn current_selection(&self) -> Option<Selection> {
        self.current.borrow().clone()
    }

    /// Receiver that is marked changed whenever the selection is replaced or cleared.
    pub fn subscribe(&self) -> watch::Receiver<Option<Selection>> {
        self.current.subscribe()
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    pub fn is_attached(&self, surface: SurfaceId) -> bool {
        self.attached.contains(&surface)
    }

    /// Record a pointer release. Returns how long the caller should wait
    /// before calling [`SelectionWatcher::settle`]; repeated releases push the
    /// deadline out so a burst of clicks settles once.
    pub fn on_pointer_release(&mut self, now: Instant) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        self.settle_deadline = Some(now + self.settle_delay);
        Some(self.settle_delay)
    }

    /// Refresh if a pointer release has settled. Returns whether a refresh ran.
    pub fn settle(&mut self, now: Instant, page: &impl SurfaceProvider) -> bool {
        match self.settle_deadline {
            Some(deadline) if now >= deadline => {
                self.settle_deadline = None;
                self.refresh(page);
                true
            }
            _ => false,
        }
    }

    /// Native selection-change notification from `surface`. Ignored unless the
    /// watcher attached to that surface.
    pub fn on_selection_change(&mut self, surface: SurfaceId, page: &impl SurfaceProvider) {
        if !self.enabled {
            return;
        }
        if !self.attached.contains(&surface) {
            trace!(%surface, "Ignoring selection change from unattached surface");
            return;
        }
        self.refresh(page);
    }

    /// Attach to the current embedded surface if it is new, and forget
    /// surfaces that are no longer embedded. Returns whether a surface was
    /// newly attached.
    pub fn rediscover(&mut self, page: &impl SurfaceProvider) -> bool {
        if !self.enabled {
            return false;
        }
        let embedded = match page.embedded() {
            Ok(embedded) => embedded,
            Err(err) => {
                debug!("Embedded surface not reachable during rediscovery: {err}");
                return false;
            }
        };

        let live = embedded.as_ref().map(|surface| surface.id());
        let before = self.attached.len();
        self.attached.retain(|id| Some(*id) == live);
        if self.attached.len() != before {
            debug!(
                released = before - self.attached.len(),
                "Released listeners of replaced surfaces"
            );
        }

        match live {
            Some(id) if self.attached.insert(id) => {
                info!(surface = %id, "Attached selection listeners to embedded surface");
                true
            }
            _ => false,
        }
    }

    /// Re-read the selection from the page and publish it.
    pub fn refresh(&mut self, page: &impl SurfaceProvider) {
        if !self.enabled {
            return;
        }
        let next = read_selection(page);
        self.publish(next);
    }

    /// Drop the stored selection and clear native selection ranges where possible.
    pub fn clear(&mut self, page: &impl SurfaceProvider) {
        self.settle_deadline = None;
        if let Some(host) = page.host() {
            if let Err(err) = host.clear_selection() {
                debug!("Could not clear host selection: {err}");
            }
        }
        if let Ok(Some(embedded)) = page.embedded() {
            if let Err(err) = embedded.clear_selection() {
                debug!("Could not clear embedded selection: {err}");
            }
        }
        self.publish(None);
    }

    /// Detach from every surface.
    pub fn teardown(&mut self) {
        if !self.attached.is_empty() {
            debug!(count = self.attached.len(), "Detaching selection listeners");
        }
        self.attached.clear();
        self.settle_deadline = None;
    }

    fn publish(&self, next: Option<Selection>) {
        self.current.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            match &next {
                Some(selection) => debug!(
                    chars = selection.text().chars().count(),
                    locator = selection.source_locator(),
                    "Selection updated"
                ),
                None => debug!("Selection cleared"),
            }
            *current = next;
            true
        });
    }
}

impl Drop for SelectionWatcher {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn read_selection(page: &impl SurfaceProvider) -> Option<Selection> {
    let mut text = String::new();
    let mut locator = String::new();
    let mut title = DEFAULT_SOURCE_TITLE.to_string();

    match page.embedded() {
        Ok(Some(embedded)) => match embedded.selection() {
            Ok(selected) => {
                text = selected.unwrap_or_default().trim().to_string();
                locator = embedded.locator();
                title = embedded
                    .title()
                    .unwrap_or_else(|| DEFAULT_SOURCE_TITLE.to_string());
            }
            Err(err) => debug!("Could not read embedded selection: {err}"),
        },
        Ok(None) => {}
        Err(err) => debug!("Could not reach embedded surface: {err}"),
    }

    if text.is_empty() {
        text = page
            .host()
            .and_then(|host| read_host(host.as_ref()))
            .unwrap_or_default();
    }

    Selection::new(&text, locator, title)
}

fn read_host(host: &dyn DocumentSurface) -> Option<String> {
    match host.selection() {
        Ok(selected) => selected,
        Err(err) => {
            debug!("Could not read host selection: {err}");
            None
        }
    }
}
