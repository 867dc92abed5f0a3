/// Maps an ISO 639-3 language code, as found in the `language` metadata
/// entry, to its two-letter ISO 639-1 equivalent.
///
/// Only the languages commonly seen in published archives are covered;
/// anything else returns `None` and the caller picks its own fallback.
pub fn iso639_3_to_1(code: &str) -> Option<&'static str> {
    match code {
        "ara" => Some("ar"),
        "dan" => Some("da"),
        "nld" => Some("nl"),
        "eng" => Some("en"),
        "fin" => Some("fi"),
        "fra" => Some("fr"),
        "deu" => Some("de"),
        "hun" => Some("hu"),
        "ita" => Some("it"),
        "nor" => Some("no"),
        "por" => Some("pt"),
        "ron" => Some("ro"),
        "rus" => Some("ru"),
        "spa" => Some("es"),
        "swe" => Some("sv"),
        "tur" => Some("tr"),
        _ => None,
    }
}
