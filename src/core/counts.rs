use crate::models::{CategoryCounts, Event};

/// Number of events in each category
pub fn count_by_category(events: &[Event]) -> CategoryCounts {
    let mut counts = CategoryCounts::new();
    for event in events {
        *counts.entry(event.category.clone()).or_insert(0) += 1;
    }
    counts
}
