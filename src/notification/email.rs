use std::cell::RefCell;
use std::rc::Rc;

use super::Subscriber;

#[derive(Clone, Debug, serde::Serialize)]
pub struct Delivery {
    pub to: String,
    pub message: String,
    pub sent_at: chrono::DateTime<chrono::Utc>,
}

/// Shared, ordered record of everything sent by the subscribers writing to it.
#[derive(Clone, Default)]
pub struct Outbox {
    deliveries: Rc<RefCell<Vec<Delivery>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, delivery: Delivery) {
        self.deliveries.borrow_mut().push(delivery);
    }

    /// Take everything recorded since the last drain.
    pub fn drain(&self) -> Vec<Delivery> {
        std::mem::take(&mut *self.deliveries.borrow_mut())
    }
}

pub struct EmailSubscriber {
    email: String,
    outbox: Outbox,
}

impl EmailSubscriber {
    pub fn new(email: impl Into<String>, outbox: Outbox) -> Self {
        Self {
            email: email.into(),
            outbox,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl Subscriber for EmailSubscriber {
    fn receive(&self, message: &str) {
        tracing::debug!(to = %self.email, body = message, "email sent");
        self.outbox.push(Delivery {
            to: self.email.clone(),
            message: message.to_owned(),
            sent_at: chrono::Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationHub;

    #[test]
    fn test_receive_records_address_and_message() {
        let outbox = Outbox::new();
        let sub = EmailSubscriber::new("nirojshah@gmail.com", outbox.clone());

        sub.receive("new product came");

        let sent = outbox.drain();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "nirojshah@gmail.com");
        assert_eq!(sent[0].message, "new product came");
        assert!(outbox.drain().is_empty());
    }

    #[test]
    fn test_same_address_is_a_distinct_subscriber() {
        let outbox = Outbox::new();
        let hub = NotificationHub::new();
        let first = Rc::new(EmailSubscriber::new("suraj@gmail.com", outbox.clone()));
        let second = Rc::new(EmailSubscriber::new("suraj@gmail.com", outbox.clone()));

        hub.subscribe(&first);
        hub.subscribe(&second);
        hub.unsubscribe(&second);
        hub.notify("hello");

        assert_eq!(outbox.drain().len(), 1);
        assert_eq!(first.email(), second.email());
    }

    #[test]
    fn test_shared_outbox_keeps_delivery_order() {
        let outbox = Outbox::new();
        let hub = NotificationHub::new();
        let a = Rc::new(EmailSubscriber::new("a@example.com", outbox.clone()));
        let b = Rc::new(EmailSubscriber::new("b@example.com", outbox.clone()));

        hub.subscribe(&a);
        hub.subscribe(&b);
        hub.notify("one");
        hub.notify("two");

        let sent: Vec<_> = outbox
            .drain()
            .into_iter()
            .map(|d| format!("{}:{}", d.to, d.message))
            .collect();
        assert_eq!(
            sent,
            vec![
                "a@example.com:one",
                "b@example.com:one",
                "a@example.com:two",
                "b@example.com:two",
            ]
        );
    }
}
