//! Language Registry
//!
//! Static display and locale information for the twelve supported languages:
//! the eleven spoken official languages of South Africa plus South African
//! Sign Language. Lookups accept a registry key (`zulu`), a display name
//! (`Zulu`) or a locale code (`zu-ZA`) depending on the function.

use serde::Serialize;

/// Locale used when a language has no speech locale of its own.
pub const DEFAULT_SPEECH_LOCALE: &str = "en-ZA";

/// Display and locale information for one supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageProfile {
    pub key: &'static str,
    pub name: &'static str,
    pub code: &'static str,
    pub native_name: &'static str,
    pub hello: &'static str,
    pub thank_you: &'static str,
    pub how_are_you: &'static str,
}

const LANGUAGES: &[LanguageProfile] = &[
    LanguageProfile {
        key: "afrikaans",
        name: "Afrikaans",
        code: "af-ZA",
        native_name: "Afrikaans",
        hello: "Hallo",
        thank_you: "Dankie",
        how_are_you: "Hoe gaan dit?",
    },
    LanguageProfile {
        key: "english",
        name: "English",
        code: "en-ZA",
        native_name: "English",
        hello: "Hello",
        thank_you: "Thank you",
        how_are_you: "How are you?",
    },
    LanguageProfile {
        key: "ndebele",
        name: "Ndebele",
        code: "nr-ZA",
        native_name: "isiNdebele",
        hello: "Lotjhani",
        thank_you: "Ngiyathokoza",
        how_are_you: "Unjani?",
    },
    LanguageProfile {
        key: "pedi",
        name: "Northern Sotho (Pedi)",
        code: "nso-ZA",
        native_name: "Sepedi",
        hello: "Dumela",
        thank_you: "Ke a leboga",
        how_are_you: "O kae?",
    },
    LanguageProfile {
        key: "sotho",
        name: "Southern Sotho",
        code: "st-ZA",
        native_name: "Sesotho",
        hello: "Dumela",
        thank_you: "Ke a leboha",
        how_are_you: "O phela joang?",
    },
    LanguageProfile {
        key: "swati",
        name: "Swati",
        code: "ss-ZA",
        native_name: "SiSwati",
        hello: "Sawubona",
        thank_you: "Ngiyabonga",
        how_are_you: "Unjani?",
    },
    LanguageProfile {
        key: "tsonga",
        name: "Tsonga",
        code: "ts-ZA",
        native_name: "Xitsonga",
        hello: "Avuxeni",
        thank_you: "Ndza khensa",
        how_are_you: "U njhani?",
    },
    LanguageProfile {
        key: "tswana",
        name: "Tswana",
        code: "tn-ZA",
        native_name: "Setswana",
        hello: "Dumela",
        thank_you: "Ke a leboga",
        how_are_you: "O kae?",
    },
    LanguageProfile {
        key: "venda",
        name: "Venda",
        code: "ve-ZA",
        native_name: "Tshivenḓa",
        hello: "Ndaa",
        thank_you: "Ndi a livhuwa",
        how_are_you: "Ni khou ita zwone?",
    },
    LanguageProfile {
        key: "xhosa",
        name: "Xhosa",
        code: "xh-ZA",
        native_name: "isiXhosa",
        hello: "Molo",
        thank_you: "Enkosi",
        how_are_you: "Unjani?",
    },
    LanguageProfile {
        key: "zulu",
        name: "Zulu",
        code: "zu-ZA",
        native_name: "isiZulu",
        hello: "Sawubona",
        thank_you: "Ngiyabonga",
        how_are_you: "Unjani?",
    },
    LanguageProfile {
        key: "sasl",
        name: "South African Sign Language",
        code: "sasl",
        native_name: "SASL",
        hello: "👋",
        thank_you: "🙏",
        how_are_you: "👉❓",
    },
];

/// All supported languages, in alphabetical key order with sign language last.
pub fn all() -> &'static [LanguageProfile] {
    LANGUAGES
}

pub fn profile(key: &str) -> Option<&'static LanguageProfile> {
    LANGUAGES.iter().find(|lang| lang.key == key)
}

/// Looks up a locale code by display name, ignoring case.
///
/// # Arguments
///
/// * `name` - A display name such as "Zulu" or "Northern Sotho (Pedi)".
///
/// # Returns
///
/// The locale code (`zu-ZA`), or `None` for names not in the registry.
pub fn code_for_name(name: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|lang| lang.name.eq_ignore_ascii_case(name))
        .map(|lang| lang.code)
}

/// English display name of a locale code, e.g. `xh-ZA` → "Xhosa".
pub fn name_for_code(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|lang| lang.code == code)
        .map(|lang| lang.name)
}

/// The language's own name for itself, e.g. `tn-ZA` → "Setswana".
pub fn native_name_for_code(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|lang| lang.code == code)
        .map(|lang| lang.native_name)
}

pub fn is_sign_language(key: &str) -> bool {
    key == "sasl"
}

/// The locale to hand to a speech synthesizer for a language key.
///
/// Accepts either a registry key (`zulu`) or a locale code (`zu-ZA`).
pub fn speech_locale(language: &str) -> &'static str {
    profile(language)
        .or_else(|| LANGUAGES.iter().find(|lang| lang.code == language))
        .filter(|lang| !is_sign_language(lang.key))
        .map(|lang| lang.code)
        .unwrap_or(DEFAULT_SPEECH_LOCALE)
}
