use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Selector};
use std::str::FromStr;
use tracing::debug;

use crate::inference::page::{element_text, snippet, ParsedPage};
use crate::inference::verdict::{Detector, Inference, Verdict};

/// Regions sites conventionally tag as stock-status indicators.
const STATUS_REGIONS: &str = ".stock-status, .pdp-stock, [data-testid=\"stock-status\"]";

/// Candidate purchase controls, the union of the tagging conventions seen in
/// the wild (role, class and data-attribute variants).
const PURCHASE_CONTROLS: &str = "button[data-testid=\"add-to-cart\"], .pdp-action, \
     .add-to-cart, .buy-button, button.addToCart, [data-testid=\"addToCartButton\"]";

const PRICE_REGIONS: &str = ".price, .pdp-price, [data-testid=\"price\"]";

const DELIVERY_REGIONS: &str = ".delivery-details, .delivery-info, [data-testid=\"delivery\"]";

/// Currency symbol followed by digits with optional thousands separators.
const PRICE_PATTERN: &str = r"[\$£€¥₹]\s*(\d+(?:,\d{3})*(?:\.\d+)?)";

const IN_STOCK_PHRASE: &str = "in stock";

const OUT_OF_STOCK_PHRASES: [&str; 3] = ["out of stock", "sold out", "currently unavailable"];

/// Whole-page negative scan adds "coming soon" on top of the status phrases.
const NEGATIVE_PHRASES: [&str; 4] = [
    "out of stock",
    "sold out",
    "currently unavailable",
    "coming soon",
];

const PURCHASE_PHRASES: [&str; 2] = ["add to cart", "buy now"];

const DELIVERY_NEGATIVE_PHRASES: [&str; 2] = ["unavailable", "not available"];

struct Signal {
    verdict: Verdict,
    detail: String,
}

/// Layered stock-status inference over a rendered product page.
///
/// Runs a fixed, ordered chain of detectors; the first definitive signal
/// wins and the chain stops. Selectors and the price pattern are compiled
/// once at construction.
pub struct StockInferenceEngine {
    status_regions: Selector,
    purchase_controls: Selector,
    price_regions: Selector,
    delivery_regions: Selector,
    price_pattern: Regex,
}

impl StockInferenceEngine {
    pub fn new() -> Self {
        // All patterns are static and known-valid.
        Self {
            status_regions: Selector::parse(STATUS_REGIONS).unwrap(),
            purchase_controls: Selector::parse(PURCHASE_CONTROLS).unwrap(),
            price_regions: Selector::parse(PRICE_REGIONS).unwrap(),
            delivery_regions: Selector::parse(DELIVERY_REGIONS).unwrap(),
            price_pattern: Regex::new(PRICE_PATTERN).unwrap(),
        }
    }

    /// Infers availability from the page markup. `product_name` feeds the
    /// log lines only; the verdict depends on the markup alone.
    pub fn infer(&self, markup: &str, product_name: &str) -> Inference {
        let page = ParsedPage::parse(markup);
        let mut saw_disabled_control = false;

        for detector in Detector::CHAIN {
            let signal = match detector {
                Detector::ExplicitStatus => self.explicit_status(&page),
                Detector::PurchaseControl => {
                    let (signal, saw_disabled) = self.purchase_control(&page);
                    saw_disabled_control = saw_disabled;
                    signal
                }
                Detector::NegativeKeyword => self.negative_keyword(&page),
                Detector::PricePresence => self.price_presence(&page),
                Detector::DeliveryPresence => self.delivery_presence(&page),
                Detector::WeakFallback => self.weak_fallback(&page, saw_disabled_control),
            };

            if let Some(signal) = signal {
                debug!(
                    product = product_name,
                    detector = %detector,
                    verdict = %signal.verdict,
                    detail = %signal.detail,
                    "detector produced a verdict"
                );
                return Inference::new(signal.verdict, detector, signal.detail);
            }
        }

        debug!(
            product = product_name,
            "could not determine stock status, treating as not purchasable"
        );
        Inference::inconclusive()
    }

    /// Detector 1: explicitly tagged stock-status regions. A region whose
    /// text matches neither direction is not a signal by itself.
    fn explicit_status(&self, page: &ParsedPage) -> Option<Signal> {
        for region in page.dom().select(&self.status_regions) {
            let text = element_text(&region).to_lowercase();
            if text.is_empty() {
                continue;
            }
            if text.contains(IN_STOCK_PHRASE) {
                return Some(Signal {
                    verdict: Verdict::InStock,
                    detail: format!("status region says \"{}\"", snippet(&text)),
                });
            }
            if let Some(phrase) = OUT_OF_STOCK_PHRASES.iter().find(|p| text.contains(*p)) {
                return Some(Signal {
                    verdict: Verdict::OutOfStock,
                    detail: format!("status region says \"{}\"", phrase),
                });
            }
        }
        None
    }

    /// Detector 2: an enabled purchase control with purchase-intent text
    /// confirms stock. Disabled or absent controls assert nothing, but a
    /// disabled control is remembered so the weak fallback cannot
    /// contradict it later.
    fn purchase_control(&self, page: &ParsedPage) -> (Option<Signal>, bool) {
        let mut saw_disabled = false;
        for control in page.dom().select(&self.purchase_controls) {
            let text = element_text(&control).to_lowercase();
            if is_disabled(&control) {
                debug!(control = %snippet(&text), "purchase control present but disabled");
                saw_disabled = true;
                continue;
            }
            if PURCHASE_PHRASES.iter().any(|p| text.contains(p)) {
                return (
                    Some(Signal {
                        verdict: Verdict::InStock,
                        detail: format!("enabled purchase control \"{}\"", snippet(&text)),
                    }),
                    saw_disabled,
                );
            }
        }
        (None, saw_disabled)
    }

    /// Detector 3: whole-page scan for out-of-stock phrases.
    fn negative_keyword(&self, page: &ParsedPage) -> Option<Signal> {
        NEGATIVE_PHRASES
            .iter()
            .find(|p| page.contains(p))
            .map(|phrase| Signal {
                verdict: Verdict::OutOfStock,
                detail: format!("page contains \"{}\"", phrase),
            })
    }

    /// Detector 4: a currency-formatted amount in a price region. Stores
    /// typically suppress the price display for unavailable items.
    fn price_presence(&self, page: &ParsedPage) -> Option<Signal> {
        for region in page.dom().select(&self.price_regions) {
            let text = element_text(&region);
            if let Some(captures) = self.price_pattern.captures(&text) {
                let matched = captures.get(0).map(|m| m.as_str().trim()).unwrap_or("");
                let digits = captures
                    .get(1)
                    .map(|m| m.as_str().replace(',', ""))
                    .unwrap_or_default();
                if let Ok(amount) = Decimal::from_str(&digits) {
                    return Some(Signal {
                        verdict: Verdict::InStock,
                        detail: format!("price display \"{}\" (amount {})", matched, amount),
                    });
                }
            }
        }
        None
    }

    /// Detector 5: delivery information without negative-availability
    /// wording.
    fn delivery_presence(&self, page: &ParsedPage) -> Option<Signal> {
        for region in page.dom().select(&self.delivery_regions) {
            let text = element_text(&region).to_lowercase();
            if text.contains("delivery")
                && !DELIVERY_NEGATIVE_PHRASES.iter().any(|p| text.contains(p))
            {
                return Some(Signal {
                    verdict: Verdict::InStock,
                    detail: format!("delivery info \"{}\"", snippet(&text)),
                });
            }
        }
        None
    }

    /// Detector 6: purchase-intent wording anywhere on the page with no
    /// out-of-stock phrases. Suppressed when detector 2 saw a disabled
    /// purchase control, since that control is the likelier source of the
    /// wording.
    fn weak_fallback(&self, page: &ParsedPage, saw_disabled_control: bool) -> Option<Signal> {
        if saw_disabled_control {
            return None;
        }
        if !page.contains("add to cart") {
            return None;
        }
        if NEGATIVE_PHRASES.iter().any(|p| page.contains(p)) {
            return None;
        }
        Some(Signal {
            verdict: Verdict::InStock,
            detail: "\"add to cart\" present with no out-of-stock phrases".to_string(),
        })
    }
}

impl Default for StockInferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Conservative disabled check: explicit attribute, explicit ARIA state, or
/// a class name containing "disabled". The conventions disagree between
/// storefronts, so any of them counts.
fn is_disabled(element: &ElementRef) -> bool {
    let value = element.value();
    if value.attr("disabled").is_some() {
        return true;
    }
    if value
        .attr("aria-disabled")
        .map(|state| state.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
    {
        return true;
    }
    value
        .classes()
        .any(|class| class.to_ascii_lowercase().contains("disabled"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn engine() -> StockInferenceEngine {
        StockInferenceEngine::new()
    }

    fn page(body: &str) -> String {
        format!("<html><head><title>Product</title></head><body>{}</body></html>", body)
    }

    #[test]
    fn test_explicit_status_in_stock_short_circuits() {
        // Weaker signals lower in the chain must not override detector 1,
        // even a whole-page "sold out".
        let html = page(
            r#"<div class="stock-status">In Stock</div>
               <p>Accessories currently sold out</p>"#,
        );
        let inference = engine().infer(&html, "Pixel 8");
        assert_eq!(inference.verdict, Verdict::InStock);
        assert_eq!(inference.evidence.detector, Some(Detector::ExplicitStatus));
    }

    #[rstest]
    #[case("Out of Stock")]
    #[case("SOLD OUT")]
    #[case("Currently Unavailable")]
    fn test_explicit_status_negative_phrases(#[case] status: &str) {
        let html = page(&format!(r#"<span class="pdp-stock">{}</span>"#, status));
        let inference = engine().infer(&html, "Pixel 8");
        assert_eq!(inference.verdict, Verdict::OutOfStock);
        assert_eq!(inference.evidence.detector, Some(Detector::ExplicitStatus));
    }

    #[test]
    fn test_status_region_with_neutral_text_is_no_signal() {
        // Presence of the region alone is not a signal; the chain continues
        // and, with nothing else on the page, ends inconclusive.
        let html = page(r#"<div class="stock-status">Check availability</div>"#);
        let inference = engine().infer(&html, "Pixel 8");
        assert_eq!(inference.verdict, Verdict::Indeterminate);
        assert!(inference.evidence.detector.is_none());
    }

    #[rstest]
    #[case(r#"<button class="add-to-cart">Add to Cart</button>"#)]
    #[case(r#"<button data-testid="add-to-cart">ADD TO CART</button>"#)]
    #[case(r#"<button class="buy-button">Buy Now</button>"#)]
    #[case(r#"<a class="pdp-action">Add to Cart</a>"#)]
    fn test_enabled_purchase_control_confirms_stock(#[case] control: &str) {
        let html = page(control);
        let inference = engine().infer(&html, "Pixel 8");
        assert_eq!(inference.verdict, Verdict::InStock);
        assert_eq!(inference.evidence.detector, Some(Detector::PurchaseControl));
    }

    #[rstest]
    #[case(r#"<button class="add-to-cart" disabled>Add to Cart</button>"#)]
    #[case(r#"<button class="add-to-cart" aria-disabled="true">Add to Cart</button>"#)]
    #[case(r#"<button class="add-to-cart btn-disabled">Add to Cart</button>"#)]
    fn test_disabled_purchase_control_never_confirms_stock(#[case] control: &str) {
        // A disabled control fails to confirm stock and the weak fallback
        // must not resurrect it from the page text.
        let html = page(control);
        let inference = engine().infer(&html, "Pixel 8");
        assert_ne!(inference.verdict, Verdict::InStock);
    }

    #[test]
    fn test_purchase_control_with_wrong_text_is_no_signal() {
        let html = page(r#"<button class="add-to-cart">Notify Me</button>"#);
        let inference = engine().infer(&html, "Pixel 8");
        assert_ne!(inference.verdict, Verdict::InStock);
    }

    #[test]
    fn test_negative_keyword_scan() {
        // No status region, no enabled control: the whole-page scan decides.
        let html = page("<p>This item is currently Out of Stock.</p>");
        let inference = engine().infer(&html, "Pixel 8");
        assert_eq!(inference.verdict, Verdict::OutOfStock);
        assert_eq!(inference.evidence.detector, Some(Detector::NegativeKeyword));
        assert!(inference.evidence.detail.contains("out of stock"));
    }

    #[test]
    fn test_negative_keyword_matches_attributes() {
        let html = page(r#"<div data-availability="sold out"></div>"#);
        let inference = engine().infer(&html, "Pixel 8");
        assert_eq!(inference.verdict, Verdict::OutOfStock);
        assert_eq!(inference.evidence.detector, Some(Detector::NegativeKeyword));
    }

    #[test]
    fn test_price_presence_confirms_stock() {
        let html = page(r#"<span class="price">₹45,990</span>"#);
        let inference = engine().infer(&html, "Vivo X200");
        assert_eq!(inference.verdict, Verdict::InStock);
        assert_eq!(inference.evidence.detector, Some(Detector::PricePresence));
        assert!(inference.evidence.detail.contains("45990"));
    }

    #[rstest]
    #[case(r#"<div class="pdp-price">$1,299.99</div>"#, "1299.99")]
    #[case(r#"<div data-testid="price">€ 849</div>"#, "849")]
    fn test_price_pattern_variants(#[case] markup: &str, #[case] amount: &str) {
        let inference = engine().infer(&page(markup), "Laptop");
        assert_eq!(inference.verdict, Verdict::InStock);
        assert!(inference.evidence.detail.contains(amount));
    }

    #[test]
    fn test_price_region_without_amount_is_no_signal() {
        let html = page(r#"<span class="price">Price unavailable</span>"#);
        let inference = engine().infer(&html, "Pixel 8");
        assert_ne!(inference.verdict, Verdict::InStock);
    }

    #[test]
    fn test_delivery_presence_confirms_stock() {
        let html = page(r#"<div class="delivery-info">Free delivery by Tuesday</div>"#);
        let inference = engine().infer(&html, "Pixel 8");
        assert_eq!(inference.verdict, Verdict::InStock);
        assert_eq!(inference.evidence.detector, Some(Detector::DeliveryPresence));
    }

    #[test]
    fn test_delivery_not_available_is_no_signal() {
        let html = page(r#"<div class="delivery-info">Delivery not available at your pincode</div>"#);
        let inference = engine().infer(&html, "Pixel 8");
        assert_ne!(inference.verdict, Verdict::InStock);
    }

    #[test]
    fn test_weak_fallback_fires_without_negatives() {
        // Purchase wording outside any tagged control still counts when the
        // page carries no out-of-stock phrases.
        let html = page("<p>Hurry! Add to cart before the sale ends.</p>");
        let inference = engine().infer(&html, "Pixel 8");
        assert_eq!(inference.verdict, Verdict::InStock);
        assert_eq!(inference.evidence.detector, Some(Detector::WeakFallback));
    }

    #[test]
    fn test_weak_fallback_blocked_by_negative_phrase() {
        let html = page("<p>Add to cart</p><p>Coming soon</p>");
        let inference = engine().infer(&html, "Pixel 8");
        // "coming soon" is a negative phrase for the whole-page scan.
        assert_eq!(inference.verdict, Verdict::OutOfStock);
        assert_eq!(inference.evidence.detector, Some(Detector::NegativeKeyword));
    }

    #[test]
    fn test_empty_page_is_inconclusive() {
        let inference = engine().infer(&page(""), "Pixel 8");
        assert_eq!(inference.verdict, Verdict::Indeterminate);
        assert!(!inference.verdict.is_purchasable());
    }

    #[test]
    fn test_product_name_does_not_affect_verdict() {
        let html = page(r#"<div class="stock-status">In Stock</div>"#);
        let a = engine().infer(&html, "Widget");
        let b = engine().infer(&html, "sold out special");
        assert_eq!(a.verdict, b.verdict);
        assert_eq!(a.verdict, Verdict::InStock);
    }

    #[test]
    fn test_detector_order_control_beats_keyword_scan() {
        // An enabled purchase control is a stronger signal than stray
        // negative wording further down the page.
        let html = page(
            r#"<button class="add-to-cart">Add to Cart</button>
               <p>Matching cover sold out</p>"#,
        );
        let inference = engine().infer(&html, "Pixel 8");
        assert_eq!(inference.verdict, Verdict::InStock);
        assert_eq!(inference.evidence.detector, Some(Detector::PurchaseControl));
    }
}
