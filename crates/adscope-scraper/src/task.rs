//! Ad Library URL and the natural-language task handed to the browser agent.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

const AD_LIBRARY_URL: &str = "https://www.facebook.com/ads/library/";

/// Builds the Meta Ad Library search URL for `brand` in `region`.
#[must_use]
pub fn ad_library_url(brand: &str, region: &str) -> String {
    let country = utf8_percent_encode(region, NON_ALPHANUMERIC);
    let query = utf8_percent_encode(brand, NON_ALPHANUMERIC);
    format!("{AD_LIBRARY_URL}?active_status=active&ad_type=all&country={country}&q={query}")
}

/// Renders the extraction instructions for one agent run.
#[must_use]
pub fn extraction_task(brand: &str, region: &str, max_items: usize) -> String {
    let url = ad_library_url(brand, region);
    format!(
        r#"Go to {url}

If a cookie popup appears, click "Decline optional cookies".

Wait 3 seconds for ads to load.

Scroll down slowly 5 times, waiting 2 seconds between scrolls, to load more ads.

Extract ALL ads visible (up to {max_items}) that contain "{brand}" in the advertiser name.

For EACH ad, extract these details:
- library_id: the Ad Library ID number
- advertiser: exact advertiser name shown
- primary_text: the main ad copy text
- headline: the bold headline/title
- cta: call-to-action button text (Shop Now, Learn More, Book Now, Get Directions, etc.)
- format: Video, Static Image, or Carousel
- first_seen: the start date shown (format: YYYY-MM-DD)
- platforms: list of platform icons visible (facebook, instagram, messenger, audience_network)

Return ONLY this JSON:
{{"brand": "{brand}", "market": "{region}", "platform": "Meta", "total_ads": X, "ads": [{{"library_id": "...", "advertiser": "...", "primary_text": "...", "headline": "...", "cta": "...", "format": "...", "first_seen": "YYYY-MM-DD", "platforms": ["facebook", "instagram"]}}]}}"#
    )
}
