//! User-facing strings and the account-name rules that use them.

use serde::Deserialize;

use crate::error::ConfigError;

/// Messages shown to readers, supplied by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalizationOptions {
    /// Title of the `phishy` warning box that replaces disguised links.
    pub phishing_warning: String,
    pub external_link: String,
    /// Placeholder text used instead of images when images are hidden.
    pub no_image: String,
    pub account_name_wrong_length: String,
    pub account_name_bad_actor: String,
    pub account_name_wrong_segment: String,
}

impl Default for LocalizationOptions {
    fn default() -> Self {
        Self {
            phishing_warning: "Link expanded to plain text; beware of a potential phishing attempt"
                .to_owned(),
            external_link: "This link will take you away from the site".to_owned(),
            no_image: "Images are not allowed here".to_owned(),
            account_name_wrong_length:
                "Account name should be between 3 and 16 characters long".to_owned(),
            account_name_bad_actor: "This account is on a bad actor list".to_owned(),
            account_name_wrong_segment: "This account name contains a bad segment".to_owned(),
        }
    }
}

impl LocalizationOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("localization.phishing_warning", &self.phishing_warning),
            ("localization.external_link", &self.external_link),
            ("localization.no_image", &self.no_image),
            (
                "localization.account_name_wrong_length",
                &self.account_name_wrong_length,
            ),
            (
                "localization.account_name_bad_actor",
                &self.account_name_bad_actor,
            ),
            (
                "localization.account_name_wrong_segment",
                &self.account_name_wrong_segment,
            ),
        ];

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(field, "message must not be empty"));
            }
        }
        Ok(())
    }
}

/// Accounts impersonating exchanges and well-known services.
const BAD_ACTORS: &[&str] = &[
    "binance-hot",
    "bittrex-deposit",
    "blocktrade",
    "coinbase-wallet",
    "deepcrypto8",
    "hive-wallet",
    "huobi-withdrawal",
    "poloniex-wallet",
    "upbit-exchange",
];

/// Checks a Hive account name, returning the localized reason it is invalid.
///
/// Names are 3 to 16 characters; every dot-separated segment is at least
/// three characters, starts with a letter, ends with a letter or digit and
/// contains only lowercase letters, digits and single dashes.
pub fn validate_account_name(name: &str, messages: &LocalizationOptions) -> Option<String> {
    if !(3..=16).contains(&name.len()) {
        return Some(messages.account_name_wrong_length.clone());
    }

    if BAD_ACTORS.contains(&name) {
        return Some(messages.account_name_bad_actor.clone());
    }

    if name.split('.').all(is_valid_segment) {
        None
    } else {
        Some(messages.account_name_wrong_segment.clone())
    }
}

fn is_valid_segment(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    bytes.len() >= 3
        && first.is_ascii_lowercase()
        && (last.is_ascii_lowercase() || last.is_ascii_digit())
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && !segment.contains("--")
}
