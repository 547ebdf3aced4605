use serde::Serialize;
use time::Date;
use tracing::debug;
use uuid::Uuid;

use super::product::ProductView;
use super::urgency::{days_remaining, UrgencyTier};

/// Products this close to expiry feed the focus suggestion.
pub const FOCUS_WINDOW_DAYS: i64 = 3;

pub const DEFAULT_API_PREFIX: &str = "/api/v1";
pub const DEFAULT_RECIPE_SEARCH_URL: &str = "https://www.google.com/search?q=recipes+with+";

/// Urgency shown on a recommendation. `Urgent` is reserved for the focus suggestion.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Urgent,
    Danger,
    Warning,
    Info,
}

/// HTTP verb a client should use when following an action link.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionMethod {
    Get,
    Post,
    Delete,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Recommendation {
    /// `None` for the focus suggestion.
    pub product_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    pub icon: &'static str,
    pub action_label: &'static str,
    pub action_method: ActionMethod,
    pub action_link: String,
    pub days_remaining: i64,
    pub urgency: Urgency,
}

/// Where action links point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLinks {
    pub api_prefix: String,
    pub recipe_search_url: String,
}

impl Default for ActionLinks {
    fn default() -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.into(),
            recipe_search_url: DEFAULT_RECIPE_SEARCH_URL.into(),
        }
    }
}

impl ActionLinks {
    pub fn delete_product(&self, id: Uuid) -> String {
        format!("{}/products/{}", self.api_prefix, id)
    }

    pub fn mark_used(&self, id: Uuid) -> String {
        format!("{}/products/{}/mark_used", self.api_prefix, id)
    }

    pub fn recipes_for(&self, product_name: &str) -> String {
        format!("{}{}", self.recipe_search_url, encode_query(product_name))
    }

    pub fn products_in_category(&self, category: &str) -> String {
        format!(
            "{}/products?status=active&category={}",
            self.api_prefix,
            encode_query(category)
        )
    }
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn plural_days(n: i64) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{} days", n)
    }
}

/// Builds the recommendation for a single product. Returns `None` for safe products.
pub fn synthesize(product: &ProductView, days: i64, links: &ActionLinks) -> Option<Recommendation> {
    let rec = match UrgencyTier::from_days(days) {
        UrgencyTier::Danger => Recommendation {
            product_id: Some(product.id),
            title: "Product expired".into(),
            body: format!(
                "{} expired {} ago. Remove it from your inventory.",
                product.name,
                plural_days(-days)
            ),
            icon: "fa-exclamation-triangle",
            action_label: "Remove product",
            action_method: ActionMethod::Delete,
            action_link: links.delete_product(product.id),
            days_remaining: days,
            urgency: Urgency::Danger,
        },
        UrgencyTier::Warning => {
            let when = if days == 0 {
                "today".to_string()
            } else {
                format!("in {}", plural_days(days))
            };
            Recommendation {
                product_id: Some(product.id),
                title: "Use urgently".into(),
                body: format!("{} expires {}. Use it as soon as possible.", product.name, when),
                icon: "fa-clock",
                action_label: "Mark as used",
                action_method: ActionMethod::Post,
                action_link: links.mark_used(product.id),
                days_remaining: days,
                urgency: Urgency::Warning,
            }
        }
        UrgencyTier::Info => Recommendation {
            product_id: Some(product.id),
            title: "Plan usage".into(),
            body: format!(
                "{} expires in {}. Plan a meal around it.",
                product.name,
                plural_days(days)
            ),
            icon: "fa-lightbulb",
            action_label: "View recipes",
            action_method: ActionMethod::Get,
            action_link: links.recipes_for(&product.name),
            days_remaining: days,
            urgency: Urgency::Info,
        },
        UrgencyTier::Safe => return None,
    };
    Some(rec)
}

/// Most frequent category among active products expiring within the focus window.
/// Ties go to the category seen first.
fn focus_category<'a>(
    products: &'a [ProductView],
    reference: Date,
) -> Option<(&'a str, usize, i64)> {
    // (category, count, soonest days_remaining) in first-seen order
    let mut counts: Vec<(&str, usize, i64)> = Vec::new();
    for p in products.iter().filter(|p| p.is_active()) {
        let days = days_remaining(p.expiration_date, reference);
        if days > FOCUS_WINDOW_DAYS {
            continue;
        }
        let name = p.category_name();
        match counts.iter_mut().find(|(c, _, _)| *c == name) {
            Some(entry) => {
                entry.1 += 1;
                entry.2 = entry.2.min(days);
            }
            None => counts.push((name, 1, days)),
        }
    }

    let mut best: Option<(&str, usize, i64)> = None;
    for entry in counts {
        if best.map_or(true, |b| entry.1 > b.1) {
            best = Some(entry);
        }
    }
    best
}

fn focus_suggestion(category: &str, count: usize, soonest: i64, links: &ActionLinks) -> Recommendation {
    let items = if count == 1 { "item" } else { "items" };
    Recommendation {
        product_id: None,
        title: format!("Focus on {}", category),
        body: format!(
            "{} {} in {} expire within {} days. Use them first.",
            count, items, category, FOCUS_WINDOW_DAYS
        ),
        icon: "fa-bullseye",
        action_label: "Show products",
        action_method: ActionMethod::Get,
        action_link: links.products_in_category(category),
        days_remaining: soonest,
        urgency: Urgency::Urgent,
    }
}

/// Recommendations for every non-safe active product, most urgent first, with the
/// focus suggestion (if any) at index 0. Non-active products are ignored.
pub fn build_recommendations(
    products: &[ProductView],
    reference: Date,
    links: &ActionLinks,
) -> Vec<Recommendation> {
    let mut recs: Vec<Recommendation> = products
        .iter()
        .filter(|p| p.is_active())
        .filter_map(|p| synthesize(p, days_remaining(p.expiration_date, reference), links))
        .collect();

    // stable: equal days keep input order
    recs.sort_by_key(|r| r.days_remaining);

    if let Some((category, count, soonest)) = focus_category(products, reference) {
        recs.insert(0, focus_suggestion(category, count, soonest, links));
    }

    debug!(
        products = products.len(),
        recommendations = recs.len(),
        %reference,
        "recommendations built"
    );
    recs
}
