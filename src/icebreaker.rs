//! Icebreaker card generator
//!
//! Cards are composed from three shuffled phrase pools (say, ask, twist),
//! each phrase wrapped in a random opener and closer. Weather-driven
//! talking points are woven into the pools, and a final check makes sure
//! every active [`RequiredMention`] appears in some card's `say` text.
//!
//! The generator is pure: all randomness comes from the `rng` argument,
//! so tests run it against a seeded `StdRng`.

use rand::seq::SliceRandom;
use rand::{Rng, RngExt};

use crate::models::{IcebreakerCard, RequiredMention, WeatherReading};

/// Number of cards shown at once
pub const CARD_COUNT: usize = 3;

const TREND_FILLERS: [&str; 3] = [
    "nästan samma som igår",
    "väldigt svenskt mellanläge",
    "inte dramatiskt men ändå snackvänligt",
];
const WIND_FILLERS: [&str; 3] = [
    "vinden är förvånansvärt snäll",
    "ingen större blåstpanik",
    "lagom vind, lagom ambition",
];
const RAIN_FILLERS: [&str; 3] = [
    "klassisk svensk mellanrisk",
    "lite osäkert men inte katastrof",
    "regnradarn får jobba övertid",
];

const SAY_OPENERS: [&str; 4] = ["Jaha,", "Perfekt då,", "Så klart,", "Kul för oss,"];
const SAY_CLOSERS: [&str; 4] = [
    "som vanligt.",
    "ingen blev förvånad.",
    "det var väl oundvikligt.",
    "tack för inget.",
];
const ASK_OPENERS: [&str; 4] = [
    "Säg mig,",
    "Ärligt talat,",
    "Snabb reality-check,",
    "Hur tänkte vädret här,",
];
const ASK_CLOSERS: [&str; 4] = [
    "eller är vi bara uppgivna nu",
    "är det här rimligt på riktigt",
    "ska man skratta eller ge upp",
    "hur orkar folk med det här",
];
const TWIST_OPENERS: [&str; 4] = ["Twist:", "Sidonot:", "Bonusmisär:", "Plot twist:"];
const TWIST_CLOSERS: [&str; 4] = [
    "som om dagen behövde mer motstånd.",
    "helt i onödan.",
    "innan man ens hunnit vakna.",
    "med maximal friktion.",
];

/// Cards shown before the first reading and after any failure
#[must_use]
pub fn default_cards() -> [IcebreakerCard; CARD_COUNT] {
    [
        IcebreakerCard::new(
            "Vädret laddar fortfarande, precis som allt annat här.",
            "Hur mycket mer väder ska man behöva stå ut med idag?",
            "Tålamodsskatt",
        ),
        IcebreakerCard::new(
            "Kaffe funkar i alla temperaturer, till skillnad från kollektivtrafiken.",
            "Termos för överlevnad eller islatte för förnekelse?",
            "Koffeinplikt",
        ),
        IcebreakerCard::new(
            "Stockholm levererar väderöverraskningar som ingen bett om.",
            "Jacka-plan A eller frysa-i-tystnad-plan B?",
            "Vardagsstraff",
        ),
    ]
}

/// Generate a fresh set of cards, or the static defaults when there is no reading
pub fn generate<R: Rng + ?Sized>(
    reading: Option<&WeatherReading>,
    rng: &mut R,
) -> [IcebreakerCard; CARD_COUNT] {
    match reading {
        Some(reading) => build_cards(reading, rng),
        None => default_cards(),
    }
}

/// Talking points triggered by the reading, in a stable order
pub fn required_mentions<R: Rng + ?Sized>(
    reading: &WeatherReading,
    rng: &mut R,
) -> Vec<RequiredMention> {
    let mut mentions = Vec::new();
    if reading.temp_delta >= 2.0 {
        mentions.push(RequiredMention::WarmerThanYesterday);
    }
    if reading.temp_delta <= -2.0 {
        mentions.push(RequiredMention::ColderThanYesterday);
    }
    if reading.wind_now >= 8.0 {
        let wind = RequiredMention::WIND;
        mentions.push(wind[rng.random_range(0..wind.len())]);
    }
    if reading.rain_prob_now >= 50.0 {
        mentions.push(RequiredMention::UmbrellaAnxiety);
    }
    if reading.rain_prob_now < 20.0 && reading.wind_now < 5.0 {
        mentions.push(RequiredMention::SuspiciouslyNice);
    }
    mentions
}

/// Compose cards for a reading
pub fn build_cards<R: Rng + ?Sized>(
    reading: &WeatherReading,
    rng: &mut R,
) -> [IcebreakerCard; CARD_COUNT] {
    let mentions = required_mentions(reading, rng);

    let temperature_part = talking_point(&mentions, RequiredMention::is_temperature, &TREND_FILLERS, rng);
    let wind_part = talking_point(&mentions, RequiredMention::is_wind, &WIND_FILLERS, rng);
    let rain_part = talking_point(&mentions, RequiredMention::is_rain, &RAIN_FILLERS, rng);

    let mut say_pool = vec![
        format!("{:.1} degC nu och {temperature_part}", reading.temp_now),
        format!("{}% regnrisk med {rain_part}", reading.rain_prob_now.round()),
        format!(
            "igår {:.1} degC, nu {:.1} och {wind_part}",
            reading.temp_yesterday, reading.temp_now
        ),
        format!("{:.1} m/s ute och ändå {temperature_part}", reading.wind_now),
        format!("{rain_part} plus {wind_part}, det är dagens läge"),
    ];
    let mut ask_pool = vec![
        "kör du jacka efter prognos eller ren självbevarelsedrift".to_string(),
        "tar du paraply eller låter du vädret vinna igen".to_string(),
        "är det cykelväder eller bike-break av självrespekt".to_string(),
        "blir det promenad ändå eller kapitulation med kaffe".to_string(),
        format!("kallar vi {temperature_part} för lagom"),
    ];
    let mut twist_pool = vec![
        "frisyr mot fysik".to_string(),
        "paraply mot värdighet".to_string(),
        "vindkvitto utan retur".to_string(),
        format!("{rain_part} i tre akter"),
        "kaffe mot undergång".to_string(),
    ];

    say_pool.shuffle(rng);
    ask_pool.shuffle(rng);
    twist_pool.shuffle(rng);

    let mut cards: [IcebreakerCard; CARD_COUNT] = std::array::from_fn(|index| IcebreakerCard {
        say: wrap(rng, &SAY_OPENERS, &say_pool[index], &SAY_CLOSERS),
        ask: format!("{}?", wrap(rng, &ASK_OPENERS, &ask_pool[index], &ASK_CLOSERS)),
        twist: wrap(rng, &TWIST_OPENERS, &twist_pool[index], &TWIST_CLOSERS),
    });

    let missing: Vec<&str> = mentions
        .iter()
        .map(RequiredMention::text)
        .filter(|text| !cards.iter().any(|card| card.say.contains(text)))
        .collect();
    if !missing.is_empty() {
        cards[0].say = format!("{} {}.", cards[0].say, missing.join(", "));
    }

    cards
}

/// The active mention for one topic, or a random neutral filler
fn talking_point<R: Rng + ?Sized>(
    mentions: &[RequiredMention],
    is_topic: fn(&RequiredMention) -> bool,
    fillers: &[&'static str],
    rng: &mut R,
) -> &'static str {
    let filler = pick(rng, fillers);
    mentions
        .iter()
        .find(|m| is_topic(m))
        .map_or(filler, RequiredMention::text)
}

fn wrap<R: Rng + ?Sized>(rng: &mut R, openers: &[&str], core: &str, closers: &[&str]) -> String {
    let opener = pick(rng, openers);
    let closer = pick(rng, closers);
    format!("{opener} {core} {closer}")
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}
