//! Build-dependent rule variants
//!
//! Each historical rule change is a row of `(first build, variant)`. A run
//! resolves every table once into a [`BuildRules`].

/// How much locale structure a build has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleMode {
    /// Nothing was localized yet; only primary text is kept
    PrimaryOnly,
    Localized,
}

/// First localized build
pub const LOCALIZATION_BUILD: u32 = 3604;

/// First build with the lowercase "spells" phrasing
pub const UNTARGETABLE_PHRASE_BUILD: u32 = 6024;

const LOCALE_MODES: &[(u32, LocaleMode)] = &[
    (0, LocaleMode::PrimaryOnly),
    (LOCALIZATION_BUILD, LocaleMode::Localized),
];

const UNTARGETABLE_PHRASES: &[(u32, &str)] = &[
    (0, "Can't be targeted by Spells or Hero Powers."),
    (UNTARGETABLE_PHRASE_BUILD, "Can't be targeted by spells or Hero Powers."),
];

/// Pick the variant of the last row whose threshold is at or below `build`
fn resolve<T: Copy>(table: &[(u32, T)], build: u32) -> T {
    table
        .iter()
        .rev()
        .find(|(threshold, _)| *threshold <= build)
        .map(|(_, variant)| *variant)
        .unwrap_or(table[0].1)
}

/// Rules in effect for one build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildRules {
    pub build: u32,
    pub locale_mode: LocaleMode,
    pub untargetable_phrase: &'static str,
}

impl BuildRules {
    pub fn for_build(build: u32) -> Self {
        Self {
            build,
            locale_mode: resolve(LOCALE_MODES, build),
            untargetable_phrase: resolve(UNTARGETABLE_PHRASES, build),
        }
    }

    pub fn is_localized(&self) -> bool {
        self.locale_mode == LocaleMode::Localized
    }
}
