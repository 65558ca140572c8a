#![forbid(unsafe_code)]

//! The terminal widget as seen from the coordination layer.

use std::cell::RefCell;
use std::rc::Rc;

/// Output side of one pane's terminal widget.
///
/// The pane holds its state borrowed while calling these methods. An event
/// emitted on the shared channel from inside them still reaches sibling
/// panes, but this pane drops it; queue such work to have it applied.
pub trait TerminalSurface {
    /// Write backend output (escape sequences included) to the terminal.
    fn write(&mut self, data: &str);

    /// Deliver pasted text to the hosted process.
    fn paste(&mut self, text: &str);

    /// Scroll the viewport by whole lines; positive is toward newer output.
    fn scroll_lines(&mut self, lines: i32);
}

/// One call made on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    Write(String),
    Paste(String),
    Scroll(i32),
}

/// Headless surface that records every call. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    ops: Rc<RefCell<Vec<SurfaceOp>>>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.ops.borrow().clone()
    }

    #[must_use]
    pub fn pastes(&self) -> Vec<String> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Paste(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn scrolled_lines(&self) -> i32 {
        self.ops
            .borrow()
            .iter()
            .map(|op| match op {
                SurfaceOp::Scroll(n) => *n,
                _ => 0,
            })
            .sum()
    }

    pub fn clear(&self) {
        self.ops.borrow_mut().clear();
    }
}

impl TerminalSurface for RecordingSurface {
    fn write(&mut self, data: &str) {
        self.ops.borrow_mut().push(SurfaceOp::Write(data.to_owned()));
    }

    fn paste(&mut self, text: &str) {
        self.ops.borrow_mut().push(SurfaceOp::Paste(text.to_owned()));
    }

    fn scroll_lines(&mut self, lines: i32) {
        self.ops.borrow_mut().push(SurfaceOp::Scroll(lines));
    }
}
