//! Two-class FIFO of pending steps, drained one host command per tick.
//!
//! Urgent steps (strikes and evasion) always leave before ordinary ones.
//! Each step may name the selection it needs; when the host's current
//! selection differs, draining yields the selection command first and keeps
//! the step at the head.

use std::collections::VecDeque;

use crate::command::{PendingCommand, Selection};
use crate::units::GroupTag;

/// Queue class of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Strikes and evasion.
    Urgent,
    /// Formation, production and maneuver.
    Ordinary,
}

/// A step waiting in the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedCommand {
    /// Selection required before the command runs.
    pub selection: Option<Selection>,
    /// The step itself.
    pub command: PendingCommand,
}

impl QueuedCommand {
    /// Whether this step selects or acts on `tag`.
    #[must_use]
    pub fn references(&self, tag: GroupTag) -> bool {
        self.selection == Some(Selection::Group(tag)) || self.command.group() == Some(tag)
    }
}

/// What the queue hands out on one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Establish a selection; the pending step stays queued.
    Select(Selection),
    /// Run a step.
    Command(PendingCommand),
}

/// The controller's pending work.
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    urgent: VecDeque<QueuedCommand>,
    ordinary: VecDeque<QueuedCommand>,
    selection: Option<Selection>,
}

impl ActionQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step to a class.
    pub fn push(&mut self, priority: Priority, selection: Option<Selection>, command: PendingCommand) {
        let entry = QueuedCommand { selection, command };
        match priority {
            Priority::Urgent => self.urgent.push_back(entry),
            Priority::Ordinary => self.ordinary.push_back(entry),
        }
    }

    /// Append a step that runs with `tag` selected.
    pub fn push_for_group(&mut self, priority: Priority, tag: GroupTag, command: PendingCommand) {
        self.push(priority, Some(Selection::Group(tag)), command);
    }

    /// Whether a class holds no steps.
    #[must_use]
    pub fn is_idle(&self, priority: Priority) -> bool {
        match priority {
            Priority::Urgent => self.urgent.is_empty(),
            Priority::Ordinary => self.ordinary.is_empty(),
        }
    }

    /// Whether both classes are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urgent.is_empty() && self.ordinary.is_empty()
    }

    /// Total number of queued steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urgent.len() + self.ordinary.len()
    }

    /// Whether any queued step refers to `tag`.
    #[must_use]
    pub fn references(&self, tag: GroupTag) -> bool {
        self.urgent
            .iter()
            .chain(self.ordinary.iter())
            .any(|q| q.references(tag))
    }

    /// Drop every ordinary step that refers to `tag`. Returns how many went.
    pub fn cancel_ordinary_for(&mut self, tag: GroupTag) -> usize {
        let before = self.ordinary.len();
        self.ordinary.retain(|q| !q.references(tag));
        before - self.ordinary.len()
    }

    /// The step that would run next.
    #[must_use]
    pub fn peek(&self) -> Option<&QueuedCommand> {
        self.urgent.front().or_else(|| self.ordinary.front())
    }

    /// Steps of one class in queue order.
    pub fn iter(&self, priority: Priority) -> impl Iterator<Item = &QueuedCommand> {
        match priority {
            Priority::Urgent => self.urgent.iter(),
            Priority::Ordinary => self.ordinary.iter(),
        }
    }

    /// Selection the host holds, as far as the queue has emitted it.
    #[must_use]
    pub fn current_selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Forget the host selection; the next step re-selects.
    pub fn reset_selection(&mut self) {
        self.selection = None;
    }

    /// Take the next host-level step.
    pub fn next_step(&mut self) -> Option<Step> {
        let queue = if self.urgent.is_empty() {
            &mut self.ordinary
        } else {
            &mut self.urgent
        };
        let head = queue.front()?;
        if let Some(needed) = head.selection {
            if self.selection != Some(needed) {
                self.selection = Some(needed);
                return Some(Step::Select(needed));
            }
        }
        let entry = queue.pop_front()?;
        if let PendingCommand::Deselect { .. } = entry.command {
            self.selection = None;
        }
        Some(Step::Command(entry.command))
    }
}
