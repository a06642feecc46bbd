//! Client context classification from a user-agent string.
//!
//! Each dimension is an ordered rule table evaluated top to bottom; the
//! first matching rule wins and an exhausted table falls back to
//! `Desktop` / `Other`. Precedence between overlapping tokens lives in the
//! table order:
//!
//! - Edge user agents also carry `Chrome`, so the Chrome rule excludes `Edg`.
//! - Chrome user agents also carry `Safari`, so the Safari rule excludes `Chrome`.
//! - Android user agents carry `Linux` and iOS user agents carry `Mac OS`,
//!   so the mobile operating systems are tested before the desktop ones.
//!
//! Classification is total: every string, including the empty one, maps
//! to a [`ClientContext`].

use footprint_types::{Browser, ClientContext, DeviceType, Os};

/// A containment predicate over a user-agent string.
#[derive(Debug, Clone, Copy)]
struct Rule {
    /// At least one of these tokens must be present.
    any_of: &'static [&'static str],
    /// If non-empty, at least one of these must also be present.
    and_any_of: &'static [&'static str],
    /// None of these may be present.
    none_of: &'static [&'static str],
}

impl Rule {
    const fn any(any_of: &'static [&'static str]) -> Self {
        Self {
            any_of,
            and_any_of: &[],
            none_of: &[],
        }
    }

    const fn unless(self, none_of: &'static [&'static str]) -> Self {
        Self { none_of, ..self }
    }

    const fn and_any(self, and_any_of: &'static [&'static str]) -> Self {
        Self { and_any_of, ..self }
    }

    fn matches(&self, ua: &str) -> bool {
        let has = |tokens: &[&str]| tokens.iter().any(|t| ua.contains(t));
        has(self.any_of)
            && (self.and_any_of.is_empty() || has(self.and_any_of))
            && !has(self.none_of)
    }
}

/// Tokens shared by phones and tablets (lowercase).
const MOBILE_OR_TABLET: &[&str] = &[
    "mobile", "android", "iphone", "ipod", "ipad", "tablet", "kindle", "silk", "playbook",
    "blackberry", "opera mini", "iemobile",
];

/// Tokens that only tablets carry (lowercase).
const TABLET_ONLY: &[&str] = &["ipad", "tablet", "kindle", "silk", "playbook"];

/// Tokens that mark a phone or phone operating system (lowercase).
const PHONE: &[&str] = &[
    "mobile", "iphone", "ipod", "android", "blackberry", "opera mini", "iemobile",
    "windows phone",
];

/// Device rules, matched against the lowercased user agent.
const DEVICE_RULES: &[(Rule, DeviceType)] = &[
    (Rule::any(MOBILE_OR_TABLET).and_any(TABLET_ONLY), DeviceType::Tablet),
    (Rule::any(PHONE), DeviceType::Mobile),
];

/// Browser rules, matched case-sensitively.
const BROWSER_RULES: &[(Rule, Browser)] = &[
    (Rule::any(&["Chrome"]).unless(&["Edg"]), Browser::Chrome),
    (Rule::any(&["Safari"]).unless(&["Chrome"]), Browser::Safari),
    (Rule::any(&["Firefox"]), Browser::Firefox),
    (Rule::any(&["Edg"]), Browser::Edge),
    (Rule::any(&["Opera", "OPR"]), Browser::Opera),
];

/// Operating system rules, matched case-sensitively.
const OS_RULES: &[(Rule, Os)] = &[
    (Rule::any(&["Windows"]), Os::Windows),
    (Rule::any(&["iPhone", "iPad", "iPod", "iOS"]), Os::Ios),
    (Rule::any(&["Android"]), Os::Android),
    (Rule::any(&["Mac OS"]), Os::MacOs),
    (Rule::any(&["Linux"]), Os::Linux),
];

fn first_match<T: Copy>(rules: &[(Rule, T)], ua: &str) -> Option<T> {
    rules
        .iter()
        .find(|(rule, _)| rule.matches(ua))
        .map(|&(_, value)| value)
}

/// Device class of `user_agent`.
pub fn device_type(user_agent: &str) -> DeviceType {
    first_match(DEVICE_RULES, &user_agent.to_ascii_lowercase()).unwrap_or(DeviceType::Desktop)
}

/// Browser family of `user_agent`.
pub fn browser(user_agent: &str) -> Browser {
    first_match(BROWSER_RULES, user_agent).unwrap_or(Browser::Other)
}

/// Operating system of `user_agent`.
pub fn os(user_agent: &str) -> Os {
    first_match(OS_RULES, user_agent).unwrap_or(Os::Other)
}

/// Classify `user_agent` into device, browser, and operating system.
pub fn classify(user_agent: &str) -> ClientContext {
    ClientContext {
        device_type: device_type(user_agent),
        browser: browser(user_agent),
        os: os(user_agent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36";
    const EDGE_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.51";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
    const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";
    const OPERA_PRESTO: &str = "Opera/9.80 (Windows NT 6.1; U; en) Presto/2.10.289 Version/12.02";

    #[test]
    fn chrome_on_android_phone() {
        assert_eq!(
            classify(CHROME_ANDROID),
            ClientContext {
                device_type: DeviceType::Mobile,
                browser: Browser::Chrome,
                os: Os::Android,
            }
        );
    }

    #[test]
    fn edge_takes_precedence_over_chrome() {
        let ctx = classify(EDGE_WINDOWS);
        assert_eq!(ctx.browser, Browser::Edge);
        assert_eq!(ctx.os, Os::Windows);
        assert_eq!(ctx.device_type, DeviceType::Desktop);
    }

    #[test]
    fn chrome_takes_precedence_over_safari() {
        assert_eq!(browser("Chrome/1 Safari/2"), Browser::Chrome);
        assert_eq!(browser("Version/17 Safari/2"), Browser::Safari);
    }

    #[test]
    fn iphone_is_mobile_safari_on_ios() {
        let ctx = classify(SAFARI_IPHONE);
        assert_eq!(ctx.device_type, DeviceType::Mobile);
        assert_eq!(ctx.browser, Browser::Safari);
        assert_eq!(ctx.os, Os::Ios);
    }

    #[test]
    fn ipad_is_a_tablet() {
        let ctx = classify(SAFARI_IPAD);
        assert_eq!(ctx.device_type, DeviceType::Tablet);
        assert_eq!(ctx.os, Os::Ios);
    }

    #[test]
    fn desktop_platforms() {
        assert_eq!(classify(SAFARI_MAC).os, Os::MacOs);
        assert_eq!(classify(SAFARI_MAC).device_type, DeviceType::Desktop);
        let ctx = classify(FIREFOX_LINUX);
        assert_eq!(ctx.browser, Browser::Firefox);
        assert_eq!(ctx.os, Os::Linux);
    }

    #[test]
    fn opera_tokens() {
        assert_eq!(browser(OPERA_PRESTO), Browser::Opera);
        assert_eq!(browser("Mozilla/5.0 OPR/109.0"), Browser::Opera);
    }

    #[test]
    fn device_tokens_ignore_case() {
        assert_eq!(device_type("SomeBrowser (TABLET)"), DeviceType::Tablet);
        assert_eq!(device_type("somebrowser mobile"), DeviceType::Mobile);
    }

    #[test]
    fn unrecognized_input_uses_fallbacks() {
        for ua in ["", "curl/8.4.0", "\u{1f600} not a browser"] {
            assert_eq!(
                classify(ua),
                ClientContext {
                    device_type: DeviceType::Desktop,
                    browser: Browser::Other,
                    os: Os::Other,
                }
            );
        }
    }
}
