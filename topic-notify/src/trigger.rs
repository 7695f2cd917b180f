//! Trigger phrase matching.

use conf::Conf;

/// What to look for in the channel topic.
#[derive(Clone, Conf, Debug, PartialEq, Eq)]
#[conf(serde)]
pub struct TriggerConfig {
    /// Phrase to watch for in the topic, e.g. "ONLINE".
    #[conf(long, env)]
    pub phrase: String,
    /// Match the phrase regardless of case. Matching is case-sensitive by default.
    #[conf(long, env)]
    pub case_insensitive: bool,
}

impl TriggerConfig {
    /// A trigger on `phrase`.
    pub fn new(phrase: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            phrase: phrase.into(),
            case_insensitive: !case_sensitive,
        }
    }

    /// Whether the phrase must match case exactly.
    pub fn is_case_sensitive(&self) -> bool {
        !self.case_insensitive
    }

    /// Shorthand for [`matches`].
    pub fn matches(&self, topic: &str) -> bool {
        matches(topic, self)
    }
}

/// True if `topic` contains the trigger phrase as a substring.
///
/// Case-insensitive matching compares the Unicode lowercase forms of both strings.
/// An empty phrase is contained in every topic.
pub fn matches(topic: &str, config: &TriggerConfig) -> bool {
    if config.is_case_sensitive() {
        topic.contains(config.phrase.as_str())
    } else {
        topic
            .to_lowercase()
            .contains(config.phrase.to_lowercase().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensitive() -> TriggerConfig {
        TriggerConfig::new("ONLINE", true)
    }

    fn insensitive() -> TriggerConfig {
        TriggerConfig::new("ONLINE", false)
    }

    #[test]
    fn test_case_sensitive_positions() {
        let trigger = sensitive();
        assert!(trigger.matches("Server: ONLINE"));
        assert!(trigger.matches("ONLINE - all systems go"));
        assert!(trigger.matches("Server is now ONLINE"));
        assert!(trigger.matches("ONLINE"));
        assert!(!trigger.matches("Server: OFFLINE"));
    }

    #[test]
    fn test_case_sensitive_rejects_other_case() {
        let trigger = sensitive();
        assert!(!trigger.matches("Server: online"));
        assert!(!trigger.matches("Server: Online"));
    }

    #[test]
    fn test_case_insensitive() {
        let trigger = insensitive();
        assert!(trigger.matches("Server: online"));
        assert!(trigger.matches("Server: Online Now"));
        assert!(trigger.matches("Server: ONLINE"));
        assert!(!trigger.matches("Server: OFFLINE"));

        let trigger = TriggerConfig::new("live now", false);
        assert!(trigger.matches("Stream is LIVE NOW!"));
    }

    #[test]
    fn test_case_insensitive_is_lowercase_containment() {
        let trigger = insensitive();
        for topic in ["Server: oNlInE", "x", "", "ÖNLINE", "online\tmode"] {
            let lowered = TriggerConfig::new(trigger.phrase.to_lowercase(), true);
            assert_eq!(trigger.matches(topic), lowered.matches(&topic.to_lowercase()));
        }
    }

    #[test]
    fn test_empty_and_whitespace_topics() {
        assert!(!sensitive().matches(""));
        assert!(!sensitive().matches("   \t\n  "));
        assert!(!insensitive().matches(""));
    }

    #[test]
    fn test_empty_phrase_matches_everything() {
        let trigger = TriggerConfig::new("", true);
        assert!(trigger.matches(""));
        assert!(trigger.matches("anything"));
    }

    #[test]
    fn test_edge_cases() {
        let trigger = sensitive();
        assert!(trigger.matches("🟢 ONLINE 🟢"));
        assert!(trigger.matches("[STATUS] ONLINE!!!"));
        assert!(trigger.matches("ONLINEMODE enabled"));
        let long_topic = format!("{} ONLINE {}", "x".repeat(1000), "y".repeat(1000));
        assert!(trigger.matches(&long_topic));

        let emoji = TriggerConfig::new("🟢", true);
        assert!(emoji.matches("status 🟢"));
        assert!(!emoji.matches("status 🔴"));
    }

    #[test]
    fn test_free_function_agrees() {
        let trigger = sensitive();
        assert_eq!(matches("Status: ONLINE", &trigger), trigger.matches("Status: ONLINE"));
    }
}
