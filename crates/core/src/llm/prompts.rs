//! Default prompt templates bundled at compile time.

/// Itinerary request. Placeholders: `{destination}`, `{budget}`, `{interests}`,
/// `{weather_description}`, `{temperature}`, `{attractions}`, `{days}`.
pub const ITINERARY: &str = include_str!("defaults/itinerary.md");

/// System instructions for providers that require one (radkit path)
pub const TRAVEL_ASSISTANT: &str = include_str!("defaults/travel_assistant.md");

/// Fill `{name}` placeholders in a template
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let out = render("Go to {city} for {days} days", &[("city", "Oslo"), ("days", "3")]);
        assert_eq!(out, "Go to Oslo for 3 days");
    }

    #[test]
    fn test_itinerary_placeholders_present() {
        for name in [
            "destination",
            "budget",
            "interests",
            "weather_description",
            "temperature",
            "attractions",
            "days",
        ] {
            assert!(ITINERARY.contains(&format!("{{{}}}", name)), "missing {}", name);
        }
    }
}
