//! Drop-into-editor controller registry.
//!
//! Controllers register once and are then offered every drop that carries at
//! least one string payload, one after another in registration order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::BoxError;
use crate::event::{Disposable, Registry};

/// Cursor position of a drop (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number.
    pub line: u32,
    /// Column.
    pub column: u32,
}

impl Position {
    /// Create a position.
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Payload of a dragged item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    /// Text payload.
    String(String),
    /// File payload; never forwarded to controllers.
    File,
}

/// One item of a drag operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragItem {
    /// MIME type, e.g. `text/plain`.
    pub mime: String,
    /// Item payload.
    pub payload: DragPayload,
}

impl DragItem {
    /// A text item.
    pub fn text(mime: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            payload: DragPayload::String(value.into()),
        }
    }

    /// A file item.
    pub fn file(mime: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            payload: DragPayload::File,
        }
    }
}

/// String payloads of a drop keyed by MIME type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTransfer {
    items: FxHashMap<String, String>,
}

impl DataTransfer {
    /// Keep the string items; a later item with the same MIME type wins.
    pub fn from_items(items: impl IntoIterator<Item = DragItem>) -> Self {
        let items = items
            .into_iter()
            .filter_map(|item| match item.payload {
                DragPayload::String(value) => Some((item.mime, value)),
                DragPayload::File => None,
            })
            .collect();
        Self { items }
    }

    /// Payload for a MIME type.
    pub fn get(&self, mime: &str) -> Option<&str> {
        self.items.get(mime).map(String::as_str)
    }

    /// Number of payloads.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are no payloads.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cooperative cancellation flag shared between a dispatcher and controllers.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that is never cancelled unless [`cancel`](Self::cancel) is called.
    pub fn none() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Handles drops into an editor of type `C`.
pub trait DropController<C>: Send + Sync {
    /// Handle a drop at `position`.
    fn handle_drop(
        &self,
        editor: &C,
        position: Position,
        data: &DataTransfer,
        token: &CancellationToken,
    ) -> Result<(), BoxError>;
}

/// Registry of drop controllers.
pub struct DropControllerRegistry<C> {
    controllers: Registry<Arc<dyn DropController<C>>>,
}

impl<C: 'static> Default for DropControllerRegistry<C> {
    fn default() -> Self {
        Self {
            controllers: Registry::new(),
        }
    }
}

impl<C: 'static> DropControllerRegistry<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller until the handle is disposed.
    pub fn register_controller(&self, controller: Arc<dyn DropController<C>>) -> Disposable {
        self.controllers.register(controller)
    }

    /// Controllers for an editor, in registration order.
    pub fn get_controllers(&self, _editor: &C) -> Vec<Arc<dyn DropController<C>>> {
        self.controllers.snapshot()
    }

    /// Offer a drop to every controller in turn.
    ///
    /// Returns `Ok(false)` without calling anything when no item carries a
    /// string payload. Stops at the first controller error.
    pub fn dispatch_drop(
        &self,
        editor: &C,
        position: Position,
        items: impl IntoIterator<Item = DragItem>,
        token: &CancellationToken,
    ) -> Result<bool, BoxError> {
        let data = DataTransfer::from_items(items);
        if data.is_empty() {
            return Ok(false);
        }
        for controller in self.get_controllers(editor) {
            controller.handle_drop(editor, position, &data, token)?;
        }
        Ok(true)
    }
}
