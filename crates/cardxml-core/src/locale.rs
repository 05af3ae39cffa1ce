//! Locale ordering and per-locale string bags

use serde::{Deserialize, Serialize};

/// Locale every bag is keyed on first
pub const PRIMARY_LOCALE: &str = "enUS";

/// Locales in the order documents are merged and bags are sorted
pub const LOCALE_ORDER: &[&str] = &[
    "enUS", "deDE", "esES", "esMX", "frFR", "itIT", "jaJP", "koKR", "plPL", "ptBR", "ruRU",
    "thTH", "zhCN", "zhTW",
];

/// Deprecated or duplicate locales, dropped from every bag
pub const DISABLED_LOCALES: &[&str] = &["enGB", "ptPT"];

/// Locale handling for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Baseline locale
    pub primary: String,
    /// Fixed merge order; unlisted locales sort after these by code
    pub order: Vec<String>,
    /// Locales never written to a bag
    pub disabled: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            primary: PRIMARY_LOCALE.to_string(),
            order: LOCALE_ORDER.iter().map(|s| s.to_string()).collect(),
            disabled: DISABLED_LOCALES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LocaleConfig {
    pub fn is_primary(&self, locale: &str) -> bool {
        self.primary == locale
    }

    pub fn is_disabled(&self, locale: &str) -> bool {
        self.disabled.iter().any(|d| d == locale)
    }

    /// Whether a document name looks like one of our locale codes
    pub fn is_known(&self, locale: &str) -> bool {
        self.is_primary(locale)
            || self.is_disabled(locale)
            || self.order.iter().any(|l| l == locale)
    }

    /// Sort key: primary first, then the fixed order, then everything else by code
    pub fn sort_key<'a>(&self, locale: &'a str) -> (usize, &'a str) {
        if self.is_primary(locale) {
            return (0, "");
        }
        match self.order.iter().position(|l| l == locale) {
            Some(index) => (index + 1, ""),
            None => (self.order.len() + 1, locale),
        }
    }
}

/// Unescape literal `\n` sequences and trim
pub fn clean_text(text: &str) -> String {
    text.replace("\\n", "\n").trim().to_string()
}

/// Locale code to text for one localizable tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleBag {
    entries: Vec<(String, String)>,
}

impl LocaleBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bag holding one entry
    pub fn single(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            entries: vec![(locale.into(), text.into())],
        }
    }

    /// Set the text for `locale`, replacing any previous entry
    pub fn insert(&mut self, locale: impl Into<String>, text: impl Into<String>) {
        let locale = locale.into();
        let text = text.into();
        match self.entries.iter_mut().find(|(l, _)| *l == locale) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((locale, text)),
        }
    }

    pub fn get(&self, locale: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == locale)
            .map(|(_, t)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, t)| (l.as_str(), t.as_str()))
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    /// Drop disabled locales and sort primary-first
    pub fn normalize(&mut self, config: &LocaleConfig) {
        self.entries.retain(|(l, _)| !config.is_disabled(l));
        self.entries.sort_by(|a, b| config.sort_key(&a.0).cmp(&config.sort_key(&b.0)));
    }

    /// Keep only the primary locale entry
    pub fn collapse_to_primary(&mut self, config: &LocaleConfig) {
        self.entries.retain(|(l, _)| config.is_primary(l));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_existing_locale() {
        let mut bag = LocaleBag::new();
        bag.insert("enUS", "Fireball");
        bag.insert("enUS", "Frostbolt");
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("enUS"), Some("Frostbolt"));
    }

    #[test]
    fn test_normalize_sorts_primary_first_and_drops_disabled() {
        let config = LocaleConfig::default();
        let mut bag = LocaleBag::new();
        bag.insert("zzXX", "?");
        bag.insert("frFR", "Boule de feu");
        bag.insert("enGB", "Fireball");
        bag.insert("enUS", "Fireball");
        bag.insert("deDE", "Feuerball");
        bag.normalize(&config);

        let locales: Vec<&str> = bag.locales().collect();
        assert_eq!(locales, vec!["enUS", "deDE", "frFR", "zzXX"]);
    }

    #[test]
    fn test_collapse_to_primary() {
        let config = LocaleConfig::default();
        let mut bag = LocaleBag::new();
        bag.insert("enUS", "Fireball");
        bag.insert("deDE", "Feuerball");
        bag.collapse_to_primary(&config);
        assert_eq!(bag, LocaleBag::single("enUS", "Fireball"));
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Deal 6 damage.\\nDraw a card. "), "Deal 6 damage.\nDraw a card.");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn test_sort_key_orders_unknown_after_known() {
        let config = LocaleConfig::default();
        assert!(config.sort_key("enUS") < config.sort_key("deDE"));
        assert!(config.sort_key("zhTW") < config.sort_key("aaAA"));
        assert!(config.sort_key("aaAA") < config.sort_key("bbBB"));
    }
}
