use crate::models::Event;

/// Sort by registration count, most registrations first
///
/// The sort is stable, so events with equal counts keep their incoming order.
#[inline]
pub fn sort_by_popularity(events: &mut [Event]) {
    events.sort_by(|a, b| b.registration_count.cmp(&a.registration_count));
}

/// Reorder events by the caller's interest list
///
/// Events whose category appears in `interests` move ahead of the rest,
/// ordered by that category's position in the list. Everything else keeps
/// its relative order. An empty interest list leaves `events` untouched.
pub fn personalize(events: &mut [Event], interests: &[String]) {
    if interests.is_empty() {
        return;
    }

    events.sort_by_cached_key(|event| interest_rank(&event.category, interests));
}

/// Position of `category` in `interests`, or `usize::MAX` when absent
#[inline]
pub fn interest_rank(category: &str, interests: &[String]) -> usize {
    interests
        .iter()
        .position(|interest| interest == category)
        .unwrap_or(usize::MAX)
}

/// Keep at most `limit` events
#[inline]
pub fn apply_limit(events: &mut Vec<Event>, limit: usize) {
    events.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn create_test_event(id: &str, category: &str, registrations: u32) -> Event {
        let start = Utc::now() + Duration::days(1);
        Event {
            id: id.to_string(),
            title: format!("Event {}", id),
            description: None,
            category: category.to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            start_date: start,
            end_date: start + Duration::hours(2),
            registration_count: registrations,
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    fn interests(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_popularity_sort_is_stable() {
        let mut events = vec![
            create_test_event("a", "music", 5),
            create_test_event("b", "tech", 10),
            create_test_event("c", "art", 5),
            create_test_event("d", "food", 10),
        ];

        sort_by_popularity(&mut events);

        assert_eq!(ids(&events), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_personalize_promotes_interests_in_rank_order() {
        let mut events = vec![
            create_test_event("1", "sports", 0),
            create_test_event("2", "tech", 0),
            create_test_event("3", "music", 0),
            create_test_event("4", "tech", 0),
            create_test_event("5", "art", 0),
        ];

        personalize(&mut events, &interests(&["music", "tech"]));

        assert_eq!(ids(&events), vec!["3", "2", "4", "1", "5"]);
    }

    #[test]
    fn test_personalize_without_interests_is_noop() {
        let mut events = vec![
            create_test_event("1", "sports", 0),
            create_test_event("2", "music", 0),
        ];

        personalize(&mut events, &[]);

        assert_eq!(ids(&events), vec!["1", "2"]);
    }

    #[test]
    fn test_personalize_is_idempotent() {
        let mut events = vec![
            create_test_event("1", "art", 3),
            create_test_event("2", "music", 2),
            create_test_event("3", "tech", 1),
            create_test_event("4", "music", 0),
        ];
        let prefs = interests(&["tech", "music"]);

        personalize(&mut events, &prefs);
        let once = events.clone();
        personalize(&mut events, &prefs);

        assert_eq!(events, once);
        assert_eq!(ids(&events), vec!["3", "2", "4", "1"]);
    }

    #[test]
    fn test_interest_rank() {
        let prefs = interests(&["music", "tech"]);
        assert_eq!(interest_rank("music", &prefs), 0);
        assert_eq!(interest_rank("tech", &prefs), 1);
        assert_eq!(interest_rank("Music", &prefs), usize::MAX);
    }

    #[test]
    fn test_apply_limit() {
        let mut events = vec![
            create_test_event("1", "art", 0),
            create_test_event("2", "art", 0),
        ];

        apply_limit(&mut events, 5);
        assert_eq!(events.len(), 2);

        apply_limit(&mut events, 0);
        assert!(events.is_empty());
    }
}
