//! Image URL downscaling for constrained connections.

use url::Url;

use super::ConnectionTier;

/// Rewrite an image URL's width query parameter for the current tier:
/// slow-2g gets a tiny placeholder (<=20px), 2g <=200px, 3g <=400px, and
/// fast/unknown tiers keep the requested width. Unparseable URLs are
/// returned untouched.
pub fn optimize_image_url(original: &str, tier: ConnectionTier, width: Option<u32>) -> String {
    if original.is_empty() {
        return String::new();
    }
    let Ok(mut url) = Url::parse(original) else {
        return original.to_string();
    };

    let capped = |cap: u32| width.map(|w| w.min(cap)).unwrap_or(cap);
    let effective = match tier {
        ConnectionTier::Slow2g => Some(capped(20)),
        ConnectionTier::TwoG => Some(capped(200)),
        ConnectionTier::ThreeG => Some(capped(400)),
        _ => width,
    };

    if let Some(w) = effective {
        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "w")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair("w", &w.to_string());
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn width_param(url: &str) -> Option<u32> {
        Url::parse(url)
            .ok()?
            .query_pairs()
            .find(|(key, _)| key == "w")
            .and_then(|(_, value)| value.parse().ok())
    }

    #[test]
    fn slow_2g_clamps_to_placeholder_width() {
        let out = optimize_image_url("https://x/img.jpg", ConnectionTier::Slow2g, Some(200));
        assert!(width_param(&out).unwrap() <= 20);
    }

    #[test]
    fn slow_2g_defaults_to_placeholder_without_requested_width() {
        let out = optimize_image_url("https://x/img.jpg", ConnectionTier::Slow2g, None);
        assert_eq!(width_param(&out), Some(20));
    }

    #[test]
    fn mid_tiers_cap_but_respect_smaller_requests() {
        let out = optimize_image_url("https://x/img.jpg", ConnectionTier::TwoG, Some(120));
        assert_eq!(width_param(&out), Some(120));
        let out = optimize_image_url("https://x/img.jpg", ConnectionTier::ThreeG, Some(900));
        assert_eq!(width_param(&out), Some(400));
    }

    #[test]
    fn fast_tier_keeps_requested_width() {
        let out = optimize_image_url("https://x/img.jpg", ConnectionTier::FourG, Some(900));
        assert_eq!(width_param(&out), Some(900));
        let out = optimize_image_url("https://x/img.jpg", ConnectionTier::FourG, None);
        assert_eq!(width_param(&out), None);
    }

    #[test]
    fn existing_width_param_is_replaced_not_duplicated() {
        let out = optimize_image_url(
            "https://x/img.jpg?w=800&q=70",
            ConnectionTier::Slow2g,
            Some(800),
        );
        assert_eq!(width_param(&out), Some(20));
        assert_eq!(out.matches("w=").count(), 1);
        assert!(out.contains("q=70"));
    }

    #[test]
    fn empty_and_invalid_urls_pass_through() {
        assert_eq!(optimize_image_url("", ConnectionTier::Slow2g, None), "");
        assert_eq!(
            optimize_image_url("not a url", ConnectionTier::Slow2g, Some(10)),
            "not a url"
        );
    }
}
