// Reward modal content: a static headline plus a pre-filled messaging deep link.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::EngineError;
use crate::types::RewardConfig;

const MESSAGING_BASE: &str = "https://wa.me/";

/// Characters `encodeURIComponent` leaves alone; spaces become `%20`, never `+`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// What the terminal modal shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardLink {
    pub headline: String,
    pub label: String,
    /// `https://wa.me/<recipient>?text=<encoded text>`
    pub href: String,
}

impl RewardLink {
    pub fn build(config: &RewardConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let href = format!(
            "{}{}?text={}",
            MESSAGING_BASE,
            config.recipient,
            utf8_percent_encode(&config.text, URI_COMPONENT)
        );
        // Checked only; re-serializing would escape `'` in the query.
        Url::parse(&href).map_err(|e| EngineError::InvalidConfig(format!("reward link: {}", e)))?;

        Ok(RewardLink {
            headline: config.headline.clone(),
            label: config.label.clone(),
            href,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_link_round_trips_text() {
        let config = RewardConfig::default();
        let link = RewardLink::build(&config).unwrap();

        let url = Url::parse(&link.href).unwrap();
        assert_eq!(url.host_str(), Some("wa.me"));
        assert_eq!(url.path(), "/5549999524735");
        let text = url
            .query_pairs()
            .find(|(k, _)| k == "text")
            .map(|(_, v)| v.into_owned());
        assert_eq!(text.as_deref(), Some(config.text.as_str()));
    }

    #[test]
    fn text_is_encoded() {
        let config = RewardConfig {
            text: "a&b=c d".to_string(),
            ..RewardConfig::default()
        };
        let link = RewardLink::build(&config).unwrap();
        assert!(!link.href.contains("a&b"));
        assert!(!link.href.contains(' '));
    }

    #[test]
    fn spaces_encode_as_percent_twenty() {
        let link = RewardLink::build(&RewardConfig::default()).unwrap();
        assert!(link
            .href
            .starts_with("https://wa.me/5549999524735?text=Oi%20amor%20adorei%20o%20presente"));
        assert!(!link.href.contains('+'));
        assert!(link.href.ends_with("%F0%9F%92%96%F0%9F%8F%95%EF%B8%8F"));
    }

    #[test]
    fn unreserved_marks_stay_literal() {
        let config = RewardConfig {
            text: "a+b (ok)! x*y~z'".to_string(),
            ..RewardConfig::default()
        };
        let link = RewardLink::build(&config).unwrap();
        assert!(link.href.ends_with("?text=a%2Bb%20(ok)!%20x*y~z'"));
    }

    #[test]
    fn rejects_bad_recipient() {
        let config = RewardConfig {
            recipient: "../evil".to_string(),
            ..RewardConfig::default()
        };
        assert!(matches!(
            RewardLink::build(&config),
            Err(EngineError::InvalidConfig(_))
        ));
    }
}
