use std::collections::VecDeque;

use revlog_domain::{ClassKey, HostKey};

/// A unit of dispatchable work, tagged explicitly instead of sniffed from a
/// string's shape (§9 "String-keyed polymorphism" design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkItem {
    Host(HostKey),
    Class(ClassKey),
}

/// The dispatcher's work queue. Hosts are appended; classes are prepended
/// so they preempt already-queued hosts (§4.2 `addClass`, §9 "Recursion
/// preemption").
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<WorkItem>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_host(&mut self, host: HostKey) {
        self.items.push_back(WorkItem::Host(host));
    }

    /// Prepends a single class, ahead of everything already queued.
    pub fn push_class_front(&mut self, class: ClassKey) {
        self.items.push_front(WorkItem::Class(class));
    }

    pub fn pop(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    /// Puts an item back at the head of the queue (§4.3 "the key remains
    /// at the head of the queue" on transport exhaustion).
    pub fn push_front_item(&mut self, item: WorkItem) {
        self.items.push_front(item);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn classes_preempt_hosts_and_keep_most_specific_first() {
        use revlog_domain::ClassWidth;

        let mut q = WorkQueue::new();
        let h1 = HostKey(Ipv4Addr::new(1, 1, 1, 1));
        let h2 = HostKey(Ipv4Addr::new(2, 2, 2, 2));
        q.push_host(h1);
        // Mimics ResolverCore::add_class_group pushing in reverse so /24 ends up frontmost.
        q.push_class_front(ClassKey::new(h2, ClassWidth::Slash8));
        q.push_class_front(ClassKey::new(h2, ClassWidth::Slash16));
        q.push_class_front(ClassKey::new(h2, ClassWidth::Slash24));
        assert_eq!(
            q.pop(),
            Some(WorkItem::Class(ClassKey::new(h2, ClassWidth::Slash24)))
        );
        assert_eq!(
            q.pop(),
            Some(WorkItem::Class(ClassKey::new(h2, ClassWidth::Slash16)))
        );
        assert_eq!(
            q.pop(),
            Some(WorkItem::Class(ClassKey::new(h2, ClassWidth::Slash8)))
        );
        assert_eq!(q.pop(), Some(WorkItem::Host(h1)));
        assert_eq!(q.pop(), None);
    }
}
