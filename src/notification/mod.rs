mod email;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub use email::{Delivery, EmailSubscriber, Outbox};

pub trait Subscriber {
    fn receive(&self, message: &str);
}

/// Broadcasts messages to subscribers in the order they subscribed.
///
/// The hub only holds weak handles; subscribers stay owned by the caller.
/// Identity is the `Rc` allocation, so two subscribers with equal contents
/// are still distinct.
#[derive(Default)]
pub struct NotificationHub {
    subscribers: RefCell<Vec<Weak<dyn Subscriber>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `subscriber`. Subscribing twice means two deliveries per notify.
    pub fn subscribe<S: Subscriber + 'static>(&self, subscriber: &Rc<S>) {
        let handle = Rc::downgrade(subscriber) as Weak<dyn Subscriber>;
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.push(handle);
        tracing::debug!(count = subscribers.len(), "subscribed");
    }

    /// Remove the first registration of `subscriber`, if any.
    pub fn unsubscribe<S: Subscriber + 'static>(&self, subscriber: &Rc<S>) {
        let target = Rc::as_ptr(subscriber);
        let mut subscribers = self.subscribers.borrow_mut();
        match subscribers
            .iter()
            .position(|s| std::ptr::addr_eq(s.as_ptr(), target))
        {
            Some(index) => {
                subscribers.remove(index);
                tracing::debug!(count = subscribers.len(), "unsubscribed");
            }
            None => tracing::debug!("unsubscribe of unknown subscriber ignored"),
        }
    }

    /// Deliver `message` to every current subscriber.
    ///
    /// Dispatch runs over a snapshot taken before the first delivery, so a
    /// subscriber may subscribe or unsubscribe from inside `receive` without
    /// affecting the in-flight broadcast.
    pub fn notify(&self, message: &str) {
        let snapshot = self.snapshot();
        tracing::debug!(body = message, recipients = snapshot.len(), "notifying");
        for subscriber in snapshot {
            subscriber.receive(message);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|s| s.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Rc<dyn Subscriber>> {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|s| s.strong_count() > 0);
        subscribers.iter().filter_map(Weak::upgrade).collect()
    }
}
