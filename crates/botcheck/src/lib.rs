//! User-agent screening for the request gate.
//!
//! A deliberately small classifier: a crawler allow-list that always wins,
//! two headless-browser signatures, and a whole-word bot/crawler/spider
//! token check. Everything else is treated as a regular client.

/// Classification result for a User-Agent string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UaClass {
    /// Known good crawler (search engines, link previews, monitors) — always allowed.
    AllowedCrawler,
    /// Headless browser automation signature.
    HeadlessAutomation,
    /// Carries a standalone bot/crawler/spider token.
    BotToken,
    /// No automation signal; treated as a regular client.
    Unclassified,
}

impl UaClass {
    /// Whether this class passes the heuristic screen.
    pub fn is_allowed(self) -> bool {
        matches!(self, UaClass::AllowedCrawler | UaClass::Unclassified)
    }
}

/// Known good crawler User-Agent substrings.
///
/// Covers search engines, social link-preview fetchers, AI/LLM crawlers,
/// SEO tools, and uptime monitors. Matched case-insensitively.
const ALLOWED_CRAWLERS: &[&str] = &[
    // Google crawler family
    "googlebot",
    "googleother",
    "google-extended",
    "googlefavicon",
    "googlestorebot",
    "googleapi",
    "adsbot-google",
    "mediapartners-google",
    // Other search engines
    "bingbot",
    "duckduckbot",
    "baiduspider",
    "sogouspider",
    "yandex",
    "slurp", // Yahoo
    "exabot",
    "qwantify",
    "seznambot",
    "petalbot",
    // Social previews & messengers
    "facebot",
    "facebookexternalhit",
    "twitterbot",
    "pinterest",
    "linkedin",
    "telegrambot",
    "slackbot",
    "discordbot",
    "whatsapp",
    "skypeuripreview",
    "embedly",
    // AI / LLM crawlers
    "gptbot",
    "bytespider",
    "perplexitybot",
    "anthropic-ai",
    "claudebot",
    "applebot",
    "amazonbot",
    // Archival & SEO
    "ia_archiver",
    "ahrefsbot",
    "semrushbot",
    "mj12bot",
    "dotbot",
    "blexbot",
    // Uptime monitors
    "pingdom",
    "uptimerobot",
    "statuscake",
    "site24x7",
    "newrelicpinger",
];

/// Headless-browser automation signatures.
const HEADLESS_SIGNATURES: &[&str] = &["headlesschrome", "headlessfirefox"];

/// Tokens that mark generic automation when they appear as whole words.
const BOT_TOKENS: &[&str] = &["bot", "crawler", "spider"];

/// Classify a User-Agent string.
///
/// The allow-list is checked first and overrides every other signal, so
/// "Googlebot" is an [`UaClass::AllowedCrawler`] even though it also ends in
/// a bot token. `extra_allowlist` extends the built-in crawler set with
/// deployment-specific entries (lowercase substrings).
pub fn classify_user_agent(ua: &str, extra_allowlist: &[String]) -> UaClass {
    let ua_lower = ua.to_lowercase();

    for pattern in ALLOWED_CRAWLERS {
        if ua_lower.contains(pattern) {
            return UaClass::AllowedCrawler;
        }
    }
    for allowed in extra_allowlist {
        if ua_lower.contains(&allowed.to_lowercase()) {
            return UaClass::AllowedCrawler;
        }
    }

    for pattern in HEADLESS_SIGNATURES {
        if ua_lower.contains(pattern) {
            return UaClass::HeadlessAutomation;
        }
    }

    for token in BOT_TOKENS {
        if contains_word(&ua_lower, token) {
            return UaClass::BotToken;
        }
    }

    UaClass::Unclassified
}

/// Whether `haystack` contains `word` with word boundaries on both sides.
///
/// A boundary is anything outside `[a-z0-9_]`, mirroring `\b` semantics, so
/// "my bot" matches "bot" but "Googlebot" does not. `haystack` must already
/// be lowercased.
fn contains_word(haystack: &str, word: &str) -> bool {
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(word) {
        let at = start + pos;
        let end = at + word.len();
        let left_ok = at == 0 || !is_word_byte(bytes[at - 1]);
        let right_ok = end == bytes.len() || !is_word_byte(bytes[end]);
        if left_ok && right_ok {
            return true;
        }
        start = at + 1;
    }
    false
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
