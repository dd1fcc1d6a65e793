//! Inquiry list: the visitor's cart-like product selection.
//!
//! Modeled as a small observable store: a single owner holds the list,
//! mutations go through defined operations, and subscribers are notified
//! synchronously after each mutation. Consistency is last-write-wins within
//! one store instance; there is no cross-instance synchronization.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One selected product in the inquiry list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryItem {
    pub id: String,
    pub name: String,
}

/// Parse the `inquiry` query parameter: a URL-decoded JSON array of
/// `{id, name}` objects.
///
/// Malformed input degrades silently to an empty list rather than surfacing
/// an error to the visitor.
pub fn parse_inquiry_param(raw: Option<&str>) -> Vec<InquiryItem> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<InquiryItem>>(raw) {
        Ok(items) => items,
        Err(e) => {
            debug!("Ignoring malformed inquiry parameter: {}", e);
            Vec::new()
        }
    }
}

/// Serialize items back into the `inquiry` query parameter value.
pub fn to_inquiry_param(items: &[InquiryItem]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

type Subscriber = Box<dyn FnMut(&[InquiryItem]) + Send>;

/// Observable owner of the inquiry list.
pub struct InquiryList {
    items: Vec<InquiryItem>,
    subscribers: Vec<(usize, Subscriber)>,
    next_subscriber_id: usize,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

impl InquiryList {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            subscribers: Vec::new(),
            next_subscriber_id: 0,
        }
    }

    /// Seed a store from previously persisted items.
    pub fn from_items(items: Vec<InquiryItem>) -> Self {
        Self {
            items,
            subscribers: Vec::new(),
            next_subscriber_id: 0,
        }
    }

    /// Current selection, in insertion order.
    pub fn items(&self) -> &[InquiryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Add an item; duplicate ids are ignored (no notification fires).
    pub fn add(&mut self, item: InquiryItem) {
        if self.contains(&item.id) {
            return;
        }
        self.items.push(item);
        self.notify();
    }

    /// Remove an item by id; removing an absent id is a no-op.
    pub fn remove(&mut self, id: &str) {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() != before {
            self.notify();
        }
    }

    /// Clear the whole selection.
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.items.clear();
        self.notify();
    }

    /// Register a callback invoked synchronously after each mutation.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&[InquiryItem]) + Send + 'static,
    {
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.subscribers.retain(|(id, _)| *id != subscription.0);
    }

    fn notify(&mut self) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&self.items);
        }
    }
}

impl Default for InquiryList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn item(id: &str, name: &str) -> InquiryItem {
        InquiryItem {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    // ==================== Parameter Parsing Tests ====================

    #[test]
    fn test_parse_inquiry_param_valid() {
        let raw = r#"[{"id":"p1","name":"Soybeans"},{"id":"p2","name":"Wheat"}]"#;
        let items = parse_inquiry_param(Some(raw));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], item("p1", "Soybeans"));
    }

    #[test]
    fn test_parse_inquiry_param_malformed_degrades_to_empty() {
        assert!(parse_inquiry_param(Some("not json")).is_empty());
        assert!(parse_inquiry_param(Some(r#"{"id":"p1"}"#)).is_empty());
        assert!(parse_inquiry_param(Some("")).is_empty());
        assert!(parse_inquiry_param(None).is_empty());
    }

    #[test]
    fn test_inquiry_param_round_trip() {
        let items = vec![item("p1", "Soybeans")];
        let raw = to_inquiry_param(&items);
        assert_eq!(parse_inquiry_param(Some(&raw)), items);
    }

    // ==================== Store Mutation Tests ====================

    #[test]
    fn test_add_remove_clear() {
        let mut list = InquiryList::new();
        list.add(item("p1", "Soybeans"));
        list.add(item("p2", "Wheat"));
        assert_eq!(list.len(), 2);
        assert!(list.contains("p1"));

        list.remove("p1");
        assert_eq!(list.len(), 1);
        assert!(!list.contains("p1"));

        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_duplicate_add_ignored() {
        let mut list = InquiryList::new();
        list.add(item("p1", "Soybeans"));
        list.add(item("p1", "Soybeans again"));
        assert_eq!(list.len(), 1);
        assert_eq!(list.items()[0].name, "Soybeans");
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut list = InquiryList::from_items(vec![item("p1", "Soybeans")]);
        list.remove("p9");
        assert_eq!(list.len(), 1);
    }

    // ==================== Subscriber Tests ====================

    #[test]
    fn test_subscribers_notified_synchronously() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let mut list = InquiryList::new();
        list.subscribe(move |items| {
            seen_clone.lock().unwrap().push(items.len());
        });

        list.add(item("p1", "Soybeans"));
        list.add(item("p2", "Wheat"));
        list.remove("p1");
        list.clear();

        // One notification per effective mutation, observed in order
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1, 0]);
    }

    #[test]
    fn test_noop_mutations_do_not_notify() {
        let count = Arc::new(Mutex::new(0));
        let count_clone = Arc::clone(&count);

        let mut list = InquiryList::new();
        list.subscribe(move |_| {
            *count_clone.lock().unwrap() += 1;
        });

        list.remove("absent");
        list.clear();
        list.add(item("p1", "Soybeans"));
        list.add(item("p1", "Duplicate"));

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let count = Arc::new(Mutex::new(0));
        let count_clone = Arc::clone(&count);

        let mut list = InquiryList::new();
        let subscription = list.subscribe(move |_| {
            *count_clone.lock().unwrap() += 1;
        });

        list.add(item("p1", "Soybeans"));
        list.unsubscribe(subscription);
        list.add(item("p2", "Wheat"));

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_multiple_subscribers_all_notified() {
        let a = Arc::new(Mutex::new(0));
        let b = Arc::new(Mutex::new(0));
        let (a_clone, b_clone) = (Arc::clone(&a), Arc::clone(&b));

        let mut list = InquiryList::new();
        list.subscribe(move |_| *a_clone.lock().unwrap() += 1);
        list.subscribe(move |_| *b_clone.lock().unwrap() += 1);

        list.add(item("p1", "Soybeans"));

        assert_eq!(*a.lock().unwrap(), 1);
        assert_eq!(*b.lock().unwrap(), 1);
    }
}
