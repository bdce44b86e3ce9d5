use chrono::{DateTime, Utc};
use crate::models::Event;

/// Drop every event that starts before `now`
#[inline]
pub fn retain_upcoming(events: &mut Vec<Event>, now: DateTime<Utc>) {
    events.retain(|e| e.is_upcoming(now));
}

/// Location constraint for the nearby listing
///
/// A non-empty city wins over the state; empty strings count as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationFilter {
    City(String),
    State(String),
    Anywhere,
}

impl LocationFilter {
    pub fn new(city: Option<&str>, state: Option<&str>) -> Self {
        let non_empty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_lowercase);

        if let Some(city) = non_empty(city) {
            LocationFilter::City(city)
        } else if let Some(state) = non_empty(state) {
            LocationFilter::State(state)
        } else {
            LocationFilter::Anywhere
        }
    }

    /// Case-insensitive match against the event's city or state
    #[inline]
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            LocationFilter::City(city) => event.city.to_lowercase() == *city,
            LocationFilter::State(state) => event.state.to_lowercase() == *state,
            LocationFilter::Anywhere => true,
        }
    }

    pub fn apply(&self, events: &mut Vec<Event>) {
        if *self != LocationFilter::Anywhere {
            events.retain(|e| self.matches(e));
        }
    }
}
