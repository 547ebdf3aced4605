//! Expiration urgency and recommendation engine.
//!
//! Everything here is pure: callers pass the products and the reference date,
//! nothing reads the clock or the database.

mod dashboard;
mod product;
mod recommendation;
mod urgency;

pub use dashboard::{dashboard_summary, expiration_timeline, DashboardSummary, DayCount};
pub use product::{Priority, ProductStatus, ProductView, UNCATEGORIZED};
pub use recommendation::{
    build_recommendations, ActionLinks, Recommendation, DEFAULT_RECIPE_SEARCH_URL,
};
pub use urgency::{days_remaining, UrgencyTier};
