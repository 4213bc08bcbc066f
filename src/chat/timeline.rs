//! The in-memory conversation timeline.
//!
//! Messages are grouped as they are appended: a message joins the last group when it
//! has the same role and arrives within the grouping window of that group's last
//! message, and starts a new group otherwise.  Group membership is fixed at append
//! time.  Replacing a message later (a placeholder turning into the final answer)
//! rewrites it in place and never moves it.

use time::{Duration, OffsetDateTime};

use crate::types::Role;

/// Maximum gap between consecutive same-role messages that render as one group.
pub const GROUPING_WINDOW: Duration = Duration::minutes(5);

/// Text of the provisional bot message shown while a request is outstanding.
pub const PLACEHOLDER_TEXT: &str = "Thinking...";

/// A single chat bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: u64,
    role: Role,
    text: String,
    timestamp: OffsetDateTime,
    placeholder: bool,
}

impl Message {
    /// Who the message is from.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The message text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the message was appended, or last replaced.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// True while this is a provisional message awaiting replacement.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

/// Consecutive same-role messages rendered together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageGroup {
    role: Role,
    messages: Vec<Message>,
}

impl MessageGroup {
    /// The role every message had when it joined this group.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Messages in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// Handle to an appended message, usable for a later [`TimelineStore::replace`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    group: usize,
    index: usize,
    id: u64,
}

impl MessageRef {
    /// Index of the group holding the message.
    pub fn group(&self) -> usize {
        self.group
    }

    /// Position of the message within its group.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Options for [`TimelineStore::append`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendOptions {
    /// Timestamp to record instead of the current time.
    pub time: Option<OffsetDateTime>,

    /// Mark the message as a placeholder.
    pub placeholder: bool,
}

impl AppendOptions {
    /// Options recording an explicit timestamp.
    pub fn at(time: OffsetDateTime) -> Self {
        Self {
            time: Some(time),
            placeholder: false,
        }
    }

    /// Options for a placeholder message stamped now.
    pub fn placeholder() -> Self {
        Self {
            time: None,
            placeholder: true,
        }
    }
}

/// Ordered, grouped view of the conversation, owned by one chat session.
#[derive(Debug, Clone)]
pub struct TimelineStore {
    groups: Vec<MessageGroup>,
    window: Duration,
    next_id: u64,
    dirty: bool,
}

impl TimelineStore {
    /// Creates an empty timeline with the default grouping window.
    pub fn new() -> Self {
        Self::with_window(GROUPING_WINDOW)
    }

    /// Creates an empty timeline with a custom grouping window.
    pub fn with_window(window: Duration) -> Self {
        Self {
            groups: Vec::new(),
            window,
            next_id: 0,
            dirty: false,
        }
    }

    /// Appends a message, extending the last group or starting a new one.
    pub fn append(&mut self, role: Role, text: impl Into<String>, options: AppendOptions) -> MessageRef {
        let timestamp = options.time.unwrap_or_else(OffsetDateTime::now_utc);
        let id = self.next_id;
        self.next_id += 1;
        self.dirty = true;

        let extends_last = self.groups.last().is_some_and(|group| {
            group.role == role
                && group
                    .messages
                    .last()
                    .is_some_and(|last| timestamp - last.timestamp <= self.window)
        });
        if !extends_last {
            self.groups.push(MessageGroup {
                role,
                messages: Vec::new(),
            });
        }

        let group = self.groups.len() - 1;
        let messages = &mut self.groups[group].messages;
        messages.push(Message {
            id,
            role,
            text: text.into(),
            timestamp,
            placeholder: options.placeholder,
        });
        MessageRef {
            group,
            index: messages.len() - 1,
            id,
        }
    }

    /// Rewrites the referenced message with `role` and `text`, stamped now.
    ///
    /// Returns false, changing nothing, if the message no longer exists.
    pub fn replace(&mut self, message: MessageRef, role: Role, text: impl Into<String>) -> bool {
        self.replace_at(message, role, text, OffsetDateTime::now_utc())
    }

    /// Like [`TimelineStore::replace`] with an explicit timestamp.
    pub fn replace_at(
        &mut self,
        message: MessageRef,
        role: Role,
        text: impl Into<String>,
        time: OffsetDateTime,
    ) -> bool {
        let Some(target) = self.lookup_mut(message) else {
            return false;
        };
        target.role = role;
        target.text = text.into();
        target.timestamp = time;
        target.placeholder = false;
        self.dirty = true;
        true
    }

    /// The referenced message, if it still exists.
    pub fn get(&self, message: MessageRef) -> Option<&Message> {
        self.groups
            .get(message.group)
            .and_then(|group| group.messages.get(message.index))
            .filter(|found| found.id == message.id)
    }

    fn lookup_mut(&mut self, message: MessageRef) -> Option<&mut Message> {
        self.groups
            .get_mut(message.group)
            .and_then(|group| group.messages.get_mut(message.index))
            .filter(|found| found.id == message.id)
    }

    /// Groups in chronological order.
    pub fn groups(&self) -> &[MessageGroup] {
        &self.groups
    }

    /// All messages in chronological order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.groups.iter().flat_map(|group| group.messages.iter())
    }

    /// Total number of messages.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.messages.len()).sum()
    }

    /// True when no messages have been appended since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Removes every message.  Outstanding references become stale.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.dirty = true;
    }

    /// Reports whether the timeline changed since the last call, and resets the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl Default for TimelineStore {
    fn default() -> Self {
        Self::new()
    }
}
