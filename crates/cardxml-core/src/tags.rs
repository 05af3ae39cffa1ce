//! Static game tag table and tag values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a known tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagType {
    Bool,
    Int,
    Enum,
    /// Plain text that is never localized
    String,
    /// Text carried per locale
    LocString,
}

impl TagType {
    /// Name written in the `type` attribute
    pub fn as_str(self) -> &'static str {
        match self {
            TagType::Bool => "Bool",
            TagType::Int => "Int",
            TagType::Enum => "Enum",
            TagType::String => "String",
            TagType::LocString => "LocString",
        }
    }

    /// Whether values of this type are text rather than numbers
    pub fn is_text(self) -> bool {
        matches!(self, TagType::String | TagType::LocString)
    }

    /// Whether a raw `type` attribute denotes a text tag
    pub fn is_text_attr(attr: &str) -> bool {
        matches!(attr, "String" | "LocString")
    }
}

macro_rules! game_tags {
    ($($variant:ident = $code:literal => $ty:ident,)*) => {
        /// Tags with a known name and declared type
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[allow(non_camel_case_types)]
        pub enum GameTag {
            $($variant,)*
        }

        impl GameTag {
            /// Every known tag, in code order
            pub const ALL: &'static [GameTag] = &[$(GameTag::$variant,)*];

            /// Numeric code
            pub const fn code(self) -> u32 {
                match self {
                    $(GameTag::$variant => $code,)*
                }
            }

            /// Canonical name
            pub const fn name(self) -> &'static str {
                match self {
                    $(GameTag::$variant => stringify!($variant),)*
                }
            }

            /// Declared type
            pub const fn tag_type(self) -> TagType {
                match self {
                    $(GameTag::$variant => TagType::$ty,)*
                }
            }

            /// Look up a known tag by code
            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(GameTag::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

game_tags! {
    TRIGGER_VISUAL = 32 => Bool,
    HEALTH = 45 => Int,
    ATK = 47 => Int,
    COST = 48 => Int,
    ELITE = 114 => Bool,
    CARD_SET = 183 => Enum,
    CARDTEXT_INHAND = 184 => LocString,
    CARDNAME = 185 => LocString,
    DURABILITY = 187 => Int,
    WINDFURY = 189 => Bool,
    TAUNT = 190 => Bool,
    STEALTH = 191 => Bool,
    SPELLPOWER = 192 => Int,
    DIVINE_SHIELD = 194 => Bool,
    CHARGE = 197 => Bool,
    CLASS = 199 => Enum,
    CARDRACE = 200 => Enum,
    FACTION = 201 => Enum,
    CARDTYPE = 202 => Enum,
    RARITY = 203 => Enum,
    FREEZE = 208 => Bool,
    ENRAGED = 212 => Bool,
    OVERLOAD = 215 => Int,
    DEATHRATTLE = 217 => Bool,
    BATTLECRY = 218 => Bool,
    SECRET = 219 => Bool,
    COMBO = 220 => Bool,
    CANT_ATTACK = 227 => Bool,
    IMMUNE = 240 => Bool,
    CARDTEXT_INPLAY = 252 => LocString,
    CANT_BE_TARGETED_BY_SPELLS = 311 => Bool,
    COLLECTIBLE = 321 => Bool,
    TARGETING_ARROW_TEXT = 325 => LocString,
    ENCHANTMENT_BIRTH_VISUAL = 330 => Enum,
    ENCHANTMENT_IDLE_VISUAL = 331 => Enum,
    CANT_BE_TARGETED_BY_HERO_POWERS = 332 => Bool,
    SILENCE = 339 => Bool,
    ARTISTNAME = 342 => String,
    FLAVORTEXT = 351 => LocString,
    AURA = 362 => Bool,
    POISONOUS = 363 => Bool,
    HOW_TO_EARN = 364 => LocString,
    HOW_TO_EARN_GOLDEN = 365 => LocString,
    AFFECTED_BY_SPELL_POWER = 370 => Bool,
    TOPDECK = 377 => Bool,
    HERO_POWER = 380 => Int,
    DISCOVER = 415 => Bool,
    CHOOSE_ONE = 443 => Bool,
    SPARE_PART = 1035 => Bool,
}

/// A numeric tag code, known or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagCode(pub u32);

impl TagCode {
    /// The known tag for this code, if any
    pub fn known(self) -> Option<GameTag> {
        GameTag::from_code(self.0)
    }

    /// Canonical name when known
    pub fn name(self) -> Option<&'static str> {
        self.known().map(GameTag::name)
    }

    /// Declared type when known
    pub fn tag_type(self) -> Option<TagType> {
        self.known().map(GameTag::tag_type)
    }
}

impl From<GameTag> for TagCode {
    fn from(tag: GameTag) -> Self {
        TagCode(tag.code())
    }
}

impl PartialEq<GameTag> for TagCode {
    fn eq(&self, other: &GameTag) -> bool {
        self.0 == other.code()
    }
}

impl fmt::Display for TagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// A scalar tag value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    /// Plain text, used for the artist attribution
    Str(String),
}

impl TagValue {
    /// Interpret a raw integer according to the declared type of `code`
    pub fn from_raw(code: TagCode, raw: i64) -> Self {
        match code.tag_type() {
            Some(TagType::Bool) => TagValue::Bool(raw != 0),
            _ => TagValue::Int(raw),
        }
    }

    /// Numeric view; text reads as zero
    pub fn as_int(&self) -> i64 {
        match self {
            TagValue::Bool(b) => i64::from(*b),
            TagValue::Int(i) => *i,
            TagValue::Str(_) => 0,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, TagValue::Str(_))
    }

    /// Text written in a `value` attribute
    pub fn to_attr(&self) -> String {
        match self {
            TagValue::Bool(b) => i64::from(*b).to_string(),
            TagValue::Int(i) => i.to_string(),
            TagValue::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(b) => write!(f, "{}", b),
            TagValue::Int(i) => write!(f, "{}", i),
            TagValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_table() {
        for tag in GameTag::ALL {
            assert_eq!(GameTag::from_code(tag.code()), Some(*tag));
        }
    }

    #[test]
    fn test_unknown_code_is_untyped() {
        let code = TagCode(99999);
        assert_eq!(code.known(), None);
        assert_eq!(code.tag_type(), None);
        assert_eq!(code.to_string(), "99999");
    }

    #[test]
    fn test_from_raw_uses_declared_type() {
        assert_eq!(
            TagValue::from_raw(GameTag::TAUNT.into(), 1),
            TagValue::Bool(true)
        );
        assert_eq!(TagValue::from_raw(GameTag::COST.into(), 3), TagValue::Int(3));
        assert_eq!(TagValue::from_raw(TagCode(4242), 1), TagValue::Int(1));
    }

    #[test]
    fn test_text_types() {
        assert!(GameTag::CARDNAME.tag_type().is_text());
        assert!(GameTag::ARTISTNAME.tag_type().is_text());
        assert!(!GameTag::HERO_POWER.tag_type().is_text());
        assert!(TagType::is_text_attr("String"));
        assert!(!TagType::is_text_attr("Int"));
    }
}
