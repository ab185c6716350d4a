//! Deep links into messaging apps.

use std::{fmt, str::FromStr};

use bridge_protocol::BridgeError;
use device_ops::{Action, Intent};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

/// URI-component escaping: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Where `sendMessage` delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePlatform {
    /// WhatsApp click-to-chat link.
    WhatsApp,
    /// Telegram share link; the recipient is picked in the app.
    Telegram,
    /// Signal share link; the recipient is picked in the app.
    Signal,
    /// Native SMS composer.
    Sms,
}

impl MessagePlatform {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhatsApp => "whatsapp",
            Self::Telegram => "telegram",
            Self::Signal => "signal",
            Self::Sms => "sms",
        }
    }

    /// Intent that opens a compose surface for `message` to `number`.
    pub fn intent(&self, number: &str, message: &str) -> Result<Intent, BridgeError> {
        let text = utf8_percent_encode(message, COMPONENT);
        let link = |base: &str, query: String| {
            let mut url = Url::parse(base)
                .map_err(|e| BridgeError::internal(format!("bad {} link: {e}", self.as_str())))?;
            url.set_query(Some(&query));
            Ok(Intent::with_uri(Action::View, url.as_str()))
        };
        match self {
            // The number goes in as given; WhatsApp expects the bare digits.
            Self::WhatsApp => link(
                "https://api.whatsapp.com/send",
                format!("phone={number}&text={text}"),
            ),
            Self::Telegram => link("tg://msg", format!("text={text}")),
            Self::Signal => link("sgnl://send", format!("text={text}")),
            Self::Sms => Ok(
                Intent::with_uri(Action::SendTo, format!("smsto:{number}"))
                    .extra("sms_body", message),
            ),
        }
    }
}

impl fmt::Display for MessagePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessagePlatform {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "whatsapp" => Ok(Self::WhatsApp),
            "telegram" => Ok(Self::Telegram),
            "signal" => Ok(Self::Signal),
            "sms" => Ok(Self::Sms),
            other => Err(BridgeError::invalid_argument(format!(
                "unknown platform '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whatsapp_link_encodes_message() {
        let i = MessagePlatform::WhatsApp
            .intent("+15551234", "hi & bye")
            .unwrap();
        assert_eq!(i.action, Action::View);
        assert_eq!(
            i.uri.as_deref(),
            Some("https://api.whatsapp.com/send?phone=+15551234&text=hi%20%26%20bye")
        );
    }

    #[test]
    fn share_links_use_component_escaping() {
        let i = MessagePlatform::Telegram
            .intent("555", "hi there (ok)? 50%+")
            .unwrap();
        assert_eq!(
            i.uri.as_deref(),
            Some("tg://msg?text=hi%20there%20(ok)%3F%2050%25%2B")
        );
        let i = MessagePlatform::Signal.intent("555", "grüß").unwrap();
        assert_eq!(i.uri.as_deref(), Some("sgnl://send?text=gr%C3%BC%C3%9F"));
    }

    #[test]
    fn share_links_skip_number() {
        let i = MessagePlatform::Telegram.intent("555", "yo").unwrap();
        assert_eq!(i.uri.as_deref(), Some("tg://msg?text=yo"));
        let i = MessagePlatform::Signal.intent("555", "yo").unwrap();
        assert_eq!(i.uri.as_deref(), Some("sgnl://send?text=yo"));
    }

    #[test]
    fn sms_uses_sendto_with_body_extra() {
        let i = MessagePlatform::Sms.intent("555", "hello there").unwrap();
        assert_eq!(i.action, Action::SendTo);
        assert_eq!(i.uri.as_deref(), Some("smsto:555"));
        assert_eq!(i.extras.get("sms_body").map(String::as_str), Some("hello there"));
    }

    #[test]
    fn parse_platform() {
        assert_eq!("SMS".parse::<MessagePlatform>().unwrap(), MessagePlatform::Sms);
        assert!("pigeon".parse::<MessagePlatform>().is_err());
        for name in config::MESSAGE_PLATFORMS {
            assert_eq!(name.parse::<MessagePlatform>().unwrap().as_str(), *name);
        }
    }
}
