//! Traffic channel classification
//!
//! Raw sources (`utm_source` values, `ref:{domain}`, `direct`) are mapped to
//! coarse channels by case-insensitive substring match. Channels are tried
//! in declaration order and the first match wins.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    AsRefStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Social,
    Search,
    Direct,
    Email,
    Referral,
    Paid,
    Other,
}

const SOCIAL_KEYWORDS: &[&str] = &[
    "facebook",
    "fb.",
    "twitter",
    "instagram",
    "linkedin",
    "lnkd.in",
    "tiktok",
    "pinterest",
    "reddit",
    "youtube",
    "snapchat",
    "whatsapp",
    "telegram",
    "discord",
    "mastodon",
    "threads",
];

const SEARCH_KEYWORDS: &[&str] = &[
    "google", "bing", "yahoo", "duckduckgo", "baidu", "yandex", "ecosia", "search",
];

const DIRECT_KEYWORDS: &[&str] = &["direct", "(none)", "typed", "bookmark"];

const EMAIL_KEYWORDS: &[&str] = &[
    "email",
    "e-mail",
    "mail",
    "newsletter",
    "mailchimp",
    "sendgrid",
    "outlook",
];

const REFERRAL_KEYWORDS: &[&str] = &["ref:", "referral", "partner", "affiliate", "blog"];

const PAID_KEYWORDS: &[&str] = &[
    "cpc", "ppc", "paid", "ads", "adwords", "sponsored", "campaign", "promo",
];

impl Channel {
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Channel::Social => SOCIAL_KEYWORDS,
            Channel::Search => SEARCH_KEYWORDS,
            Channel::Direct => DIRECT_KEYWORDS,
            Channel::Email => EMAIL_KEYWORDS,
            Channel::Referral => REFERRAL_KEYWORDS,
            Channel::Paid => PAID_KEYWORDS,
            Channel::Other => &[],
        }
    }

    /// 将原始来源归类到渠道
    pub fn classify(source: &str) -> Channel {
        let normalized = source.trim().to_lowercase();
        if normalized.is_empty() {
            return Channel::Direct;
        }
        Channel::iter()
            .find(|channel| {
                channel
                    .keywords()
                    .iter()
                    .any(|keyword| normalized.contains(keyword))
            })
            .unwrap_or(Channel::Other)
    }
}
