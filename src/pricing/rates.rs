use serde::Deserialize;
use std::collections::BTreeMap;

/// Per-invocation cost rates, loaded from the `[pricing]` config table
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RateCard {
    #[serde(default)]
    pub(crate) default_per_call: f64,
    #[serde(default)]
    pub(crate) apps: BTreeMap<String, f64>,
}

impl RateCard {
    /// Exact name first, then a case-insensitive match, then the default.
    ///
    /// Keys that differ only in case resolve to the first in sorted order.
    pub(crate) fn rate_for(&self, app_name: &str) -> f64 {
        if let Some(rate) = self.apps.get(app_name) {
            return *rate;
        }
        self.apps
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(app_name))
            .map_or(self.default_per_call, |(_, rate)| *rate)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.default_per_call == 0.0 && self.apps.values().all(|r| *r == 0.0)
    }
}

pub(crate) fn calculate_cost(count: u64, app_name: &str, rates: &RateCard) -> f64 {
    count as f64 * rates.rate_for(app_name)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn card() -> RateCard {
        let mut apps = BTreeMap::new();
        apps.insert("report-gen".to_string(), 0.5);
        apps.insert("Chatbot".to_string(), 0.02);
        RateCard {
            default_per_call: 0.1,
            apps,
        }
    }

    #[test]
    fn exact_match_wins() {
        assert_eq!(card().rate_for("report-gen"), 0.5);
    }

    #[test]
    fn case_insensitive_fallback() {
        assert_eq!(card().rate_for("chatbot"), 0.02);
    }

    #[test]
    fn case_collisions_resolve_in_key_order() {
        let rates: RateCard = toml::from_str(
            r#"
            [apps]
            chat = 0.3
            Chat = 0.2
            CHAT = 0.1
            "#,
        )
        .unwrap();
        assert_eq!(rates.rate_for("chat"), 0.3);
        assert_eq!(rates.rate_for("cHaT"), 0.1);
    }

    #[test]
    fn unknown_app_uses_default() {
        assert_eq!(card().rate_for("video-upload"), 0.1);
    }

    #[test]
    fn cost_scales_with_count() {
        let cost = calculate_cost(12, "report-gen", &card());
        assert!((cost - 6.0).abs() < 1e-9);
        assert_eq!(calculate_cost(0, "report-gen", &card()), 0.0);
    }

    #[test]
    fn default_card_is_free() {
        let rates = RateCard::default();
        assert!(rates.is_empty());
        assert_eq!(calculate_cost(100, "anything", &rates), 0.0);
        assert!(!card().is_empty());
    }

    #[test]
    fn deserializes_from_toml() {
        let rates: RateCard = toml::from_str(
            r#"
            default_per_call = 0.05
            [apps]
            "pdf-report" = 1.25
            "#,
        )
        .unwrap();
        assert_eq!(rates.rate_for("pdf-report"), 1.25);
        assert_eq!(rates.rate_for("other"), 0.05);
    }
}
