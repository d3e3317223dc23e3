//! Icebreaker card and required-mention vocabulary

use serde::{Deserialize, Serialize};

/// Three conversational prompts shown together
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct IcebreakerCard {
    pub say: String,
    pub ask: String,
    pub twist: String,
}

impl IcebreakerCard {
    pub fn new<S: Into<String>>(say: S, ask: S, twist: S) -> Self {
        Self {
            say: say.into(),
            ask: ask.into(),
            twist: twist.into(),
        }
    }
}

/// A talking point that must show up in some card's `say` text
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequiredMention {
    WarmerThanYesterday,
    ColderThanYesterday,
    HairTax,
    BikeRegret,
    UmbrellaAnxiety,
    SuspiciouslyNice,
}

impl RequiredMention {
    /// Wind-discomfort tags, one of which is picked when it is windy
    pub const WIND: [RequiredMention; 2] = [Self::HairTax, Self::BikeRegret];

    /// Literal text that is searched for in the cards
    #[must_use]
    pub fn text(&self) -> &'static str {
        match self {
            Self::WarmerThanYesterday => "warmer than yesterday",
            Self::ColderThanYesterday => "colder than yesterday",
            Self::HairTax => "hair tax",
            Self::BikeRegret => "bike regret",
            Self::UmbrellaAnxiety => "umbrella anxiety",
            Self::SuspiciouslyNice => "suspiciously nice",
        }
    }

    #[must_use]
    pub fn is_temperature(&self) -> bool {
        matches!(self, Self::WarmerThanYesterday | Self::ColderThanYesterday)
    }

    #[must_use]
    pub fn is_wind(&self) -> bool {
        matches!(self, Self::HairTax | Self::BikeRegret)
    }

    #[must_use]
    pub fn is_rain(&self) -> bool {
        matches!(self, Self::UmbrellaAnxiety | Self::SuspiciouslyNice)
    }
}
