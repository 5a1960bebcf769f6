// SPDX-License-Identifier: GPL-3.0-only

//! Route stack and navigation rules
//!
//! The stack always has `Home` at the bottom and never holds more than one
//! `Result` entry. Reaching a result prunes the scanner out of history, so
//! back navigation from a result can never land on a consumed scanner.

use crate::app::frame_processor::DecodedValue;
use crate::errors::ScanError;
use serde::Serialize;
use tracing::{debug, info};

/// Navigable screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", content = "value", rename_all = "snake_case")]
pub enum Route {
    Home,
    Scanner,
    Result(DecodedValue),
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Scanner => "scanner",
            Route::Result(_) => "result",
        }
    }

    pub fn is_result(&self) -> bool {
        matches!(self, Route::Result(_))
    }
}

/// Ordered navigation history, bottom first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStack {
    entries: Vec<Route>,
}

impl Default for RouteStack {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteStack {
    /// Stack holding only `Home`
    pub fn new() -> Self {
        Self {
            entries: vec![Route::Home],
        }
    }

    pub fn top(&self) -> &Route {
        static ROOT: Route = Route::Home;
        // Never empty: pop keeps the root entry
        self.entries.last().unwrap_or(&ROOT)
    }

    pub fn entries(&self) -> &[Route] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push `route` on top
    ///
    /// A `Result` entry replaces any existing one so the stack never holds
    /// two results.
    pub fn push(&mut self, route: Route) {
        if route.is_result() {
            self.entries.retain(|entry| !entry.is_result());
        }
        self.entries.push(route);
    }

    /// Remove the top entry. The root entry is never popped.
    pub fn pop(&mut self) -> Option<Route> {
        if self.entries.len() > 1 {
            self.entries.pop()
        } else {
            None
        }
    }

    /// Pop entries above the topmost entry matching `target`
    ///
    /// With `inclusive`, the matching entry is removed too (except the
    /// root). Does nothing if no entry matches.
    pub fn pop_up_to(&mut self, target: &Route, inclusive: bool) {
        let Some(index) = self.entries.iter().rposition(|entry| entry == target) else {
            return;
        };
        let keep = if inclusive { index.max(1) } else { index + 1 };
        self.entries.truncate(keep);
    }

    /// Collapse the stack to the single entry `route`
    pub fn replace_all(&mut self, route: Route) {
        self.entries.clear();
        self.entries.push(route);
    }
}

/// A completed navigation step, used to run route-entry side effects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationChange {
    pub from: Route,
    pub to: Route,
}

/// Applies the navigation rules to a [`RouteStack`]
#[derive(Debug, Default)]
pub struct NavigationController {
    stack: RouteStack,
}

impl NavigationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Route {
        self.stack.top()
    }

    pub fn stack(&self) -> &RouteStack {
        &self.stack
    }

    /// Home -> Scanner, once the camera capability is decided
    pub fn open_scanner(&mut self, granted: bool) -> Result<NavigationChange, ScanError> {
        self.expect_top(Route::Home.name(), "open the scanner")?;
        if !granted {
            info!("Scanner blocked, camera permission denied");
            return Err(ScanError::PermissionDenied);
        }
        self.stack.push(Route::Scanner);
        Ok(self.changed(Route::Home))
    }

    /// Scanner -> Result(value), pruning back to Home first
    pub fn show_result(&mut self, value: DecodedValue) -> Result<NavigationChange, ScanError> {
        self.expect_top(Route::Scanner.name(), "show a result")?;
        self.stack.pop_up_to(&Route::Home, false);
        self.stack.push(Route::Result(value));
        Ok(self.changed(Route::Scanner))
    }

    /// Scanner -> Home without a detection
    pub fn dismiss_scanner(&mut self) -> Result<NavigationChange, ScanError> {
        self.expect_top(Route::Scanner.name(), "dismiss the scanner")?;
        self.stack.pop();
        Ok(self.changed(Route::Scanner))
    }

    /// Result -> Home ("scan again"), collapsing history to `[Home]`
    pub fn scan_again(&mut self) -> Result<NavigationChange, ScanError> {
        self.expect_top("result", "scan again")?;
        let from = self.stack.top().clone();
        self.stack.replace_all(Route::Home);
        Ok(self.changed(from))
    }

    fn expect_top(&self, expected: &'static str, action: &'static str) -> Result<(), ScanError> {
        let top = self.stack.top().name();
        if top == expected {
            Ok(())
        } else {
            debug!(top, action, "Navigation action rejected");
            Err(ScanError::InvalidTransition { from: top, action })
        }
    }

    fn changed(&self, from: Route) -> NavigationChange {
        let to = self.stack.top().clone();
        info!(
            from = from.name(),
            to = to.name(),
            depth = self.stack.len(),
            "Navigated"
        );
        NavigationChange { from, to }
    }
}
