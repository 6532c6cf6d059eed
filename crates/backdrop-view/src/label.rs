use std::sync::Arc;

use backdrop_geo::PlaceName;

use crate::surface::TextSurface;

pub const DEFAULT_GREETING: &str = "Namaste!";

/// First character uppercased, the rest lowercased. Empty stays empty.
pub fn to_title_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

/// Greeting, or the city (and optionally state) once known
pub struct LocationLabel {
    target: Arc<dyn TextSurface>,
    city: String,
    state: String,
    greeting: String,
    show_state: bool,
}

impl LocationLabel {
    pub fn new(target: Arc<dyn TextSurface>) -> Self {
        Self {
            target,
            city: String::new(),
            state: String::new(),
            greeting: DEFAULT_GREETING.to_string(),
            show_state: false,
        }
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn with_state(mut self, show_state: bool) -> Self {
        self.show_state = show_state;
        self
    }

    pub fn set_city(&mut self, city: impl Into<String>) {
        self.city = city.into();
    }

    pub fn set_state(&mut self, state: impl Into<String>) {
        self.state = state.into();
    }

    pub fn set_place(&mut self, place: &PlaceName) {
        self.set_city(place.city());
        self.set_state(place.state().unwrap_or_default());
    }

    pub fn text(&self) -> String {
        if self.city.is_empty() {
            return self.greeting.clone();
        }

        let mut text = self
            .city
            .split(' ')
            .map(to_title_case)
            .collect::<Vec<_>>()
            .join(" ");

        if self.show_state && !self.state.is_empty() {
            text.push_str(", ");
            text.push_str(&self.state);
        }
        text
    }

    pub fn render(&self) -> String {
        let text = self.text();
        self.target.set_text(&text);
        text
    }
}
