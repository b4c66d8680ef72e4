//! Maps free-text user input to canonical currency and country codes.
//!
//! Input arrives in mixed Latin/Cyrillic script: a currency name
//! ("доллар"), a symbol ("$"), an ISO code ("usd"), or a country name
//! ("Казахстан"). Alias tables are built once from the embedded JSON and
//! are immutable afterwards; both table keys and lookups pass through the
//! same normalizer.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

const CURRENCY_DATA: &str = include_str!("data/currencies.json");
const COUNTRY_DATA: &str = include_str!("data/countries.json");

/// Shown on the interactive prompt; the resolver accepts far more.
pub const POPULAR_CURRENCIES: [&str; 7] = ["USD", "BYN", "UAH", "RUB", "KGS", "UZS", "CNY"];

const CANCEL_WORDS: [&str; 4] = ["exit", "выход", "отмена", "cancel"];

const CURRENCY_SYMBOLS: [char; 7] = ['$', '₽', '¥', '₼', '€', '£', '₸'];

/// Uppercases, folds `Ё` to `Е` and strips everything except letters,
/// digits and the known currency symbols.
pub fn normalize_currency(text: &str) -> String {
    text.trim()
        .chars()
        .flat_map(char::to_uppercase)
        .map(|c| if c == 'Ё' { 'Е' } else { c })
        .filter(|c| {
            c.is_ascii_uppercase()
                || c.is_ascii_digit()
                || ('А'..='Я').contains(c)
                || CURRENCY_SYMBOLS.contains(c)
        })
        .collect()
}

/// Same casing and letter fold as [`normalize_currency`], but country
/// names keep their inner punctuation; only whitespace runs collapse.
pub fn normalize_country(text: &str) -> String {
    let folded: String = text
        .trim()
        .chars()
        .flat_map(char::to_uppercase)
        .map(|c| if c == 'Ё' { 'Е' } else { c })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Deserialize)]
struct CurrencyEntry {
    home: Option<String>,
    aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    currency: String,
    names: Vec<String>,
}

/// Outcome of [`AliasResolver::resolve`]. Both fields `None` means the
/// input was not recognized and the caller should re-prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub currency: Option<String>,
    pub country: Option<String>,
}

impl Resolution {
    pub fn is_unrecognized(&self) -> bool {
        self.currency.is_none() && self.country.is_none()
    }
}

pub struct AliasResolver {
    currency_aliases: HashMap<String, String>,
    home_country: HashMap<String, String>,
    country_names: HashMap<String, String>,
    default_currency: HashMap<String, String>,
    cancel_aliases: HashSet<String>,
}

impl AliasResolver {
    pub fn from_embedded() -> Result<Self> {
        let currencies: HashMap<String, CurrencyEntry> =
            serde_json::from_str(CURRENCY_DATA).context("Failed to parse currency alias data")?;
        let countries: HashMap<String, CountryEntry> =
            serde_json::from_str(COUNTRY_DATA).context("Failed to parse country alias data")?;

        let mut currency_aliases = HashMap::new();
        let mut home_country = HashMap::new();
        for (code, entry) in &currencies {
            for alias in &entry.aliases {
                currency_aliases.insert(normalize_currency(alias), code.clone());
            }
            // Every code is an alias for itself.
            currency_aliases.insert(normalize_currency(code), code.clone());
            if let Some(home) = &entry.home {
                home_country.insert(code.clone(), home.clone());
            }
        }

        let mut country_names = HashMap::new();
        let mut default_currency = HashMap::new();
        for (iso3, entry) in &countries {
            for name in &entry.names {
                country_names.insert(normalize_country(name), iso3.clone());
            }
            default_currency.insert(iso3.clone(), entry.currency.clone());
        }

        let cancel_aliases = CANCEL_WORDS.iter().map(|w| normalize_currency(w)).collect();

        Ok(Self {
            currency_aliases,
            home_country,
            country_names,
            default_currency,
            cancel_aliases,
        })
    }

    /// Exact alias lookup; any three Latin letters pass through as a
    /// literal ISO 4217 code.
    pub fn resolve_currency(&self, key: &str) -> Option<String> {
        if let Some(code) = self.currency_aliases.get(key) {
            return Some(code.clone());
        }
        if key.len() == 3 && key.bytes().all(|b| b.is_ascii_uppercase()) {
            return Some(key.to_string());
        }
        None
    }

    /// Exact lookup in the country-name table. No fuzzy matching.
    pub fn resolve_country(&self, key: &str) -> Option<String> {
        self.country_names.get(key).cloned()
    }

    /// Resolves raw input to `(currency, country)`. Currency resolution
    /// wins when a token would match both tables. A currency hit carries
    /// its home country; a country hit carries its default currency.
    pub fn resolve(&self, raw: &str) -> Resolution {
        let key = normalize_currency(raw);
        if let Some(code) = self.resolve_currency(&key) {
            let country = self.home_country.get(&code).cloned();
            return Resolution {
                currency: Some(code),
                country,
            };
        }

        let key = normalize_country(raw);
        if let Some(iso3) = self.resolve_country(&key) {
            let currency = self.default_currency.get(&iso3).cloned();
            return Resolution {
                currency,
                country: Some(iso3),
            };
        }

        Resolution {
            currency: None,
            country: None,
        }
    }

    pub fn is_cancel(&self, raw: &str) -> bool {
        self.cancel_aliases.contains(&normalize_currency(raw))
    }
}
