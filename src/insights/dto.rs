use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::engine::{DashboardSummary, DayCount, ProductView, Recommendation, UrgencyTier};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
    pub on: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub reference_date: Date,
    pub recommendations: Vec<Recommendation>,
}

/// A product expiring soon, as listed on the dashboard.
#[derive(Debug, Serialize, PartialEq)]
pub struct UpcomingProduct {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub expiration_date: Date,
    pub days_remaining: i64,
    pub urgency: UrgencyTier,
}

impl UpcomingProduct {
    pub fn new(p: &ProductView, reference: Date) -> Self {
        let (days_remaining, urgency) = UrgencyTier::classify(p.expiration_date, reference);
        Self {
            id: p.id,
            name: p.name.clone(),
            category: p.category_name().to_string(),
            expiration_date: p.expiration_date,
            days_remaining,
            urgency,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub reference_date: Date,
    #[serde(flatten)]
    pub summary: DashboardSummary,
    pub top_recommendations: Vec<Recommendation>,
    pub upcoming: Vec<UpcomingProduct>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Bucket {
    pub label: String,
    pub count: i64,
}

impl From<(String, i64)> for Bucket {
    fn from((label, count): (String, i64)) -> Self {
        Self { label, count }
    }
}

/// Numeric series for an external chart renderer.
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub reference_date: Date,
    pub by_status: Vec<Bucket>,
    pub by_category: Vec<Bucket>,
    pub by_storage: Vec<Bucket>,
    pub expiring_next_days: Vec<DayCount>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ActionLinks, Priority, ProductStatus};
    use time::macros::date;

    #[test]
    fn dashboard_flattens_summary() {
        let reference = date!(2024 - 06 - 15);
        let milk = ProductView {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Milk".into(),
            category: Some("Dairy".into()),
            expiration_date: date!(2024 - 06 - 16),
            status: ProductStatus::Active,
            priority: Priority::High,
            quantity: 1.0,
        };
        let products = vec![milk.clone()];
        let resp = DashboardResponse {
            reference_date: reference,
            summary: crate::engine::dashboard_summary(&products, reference, 5),
            top_recommendations: crate::engine::build_recommendations(
                &products,
                reference,
                &ActionLinks::default(),
            ),
            upcoming: vec![UpcomingProduct::new(&milk, reference)],
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["expiring_soon"], 1);
        assert_eq!(json["category_histogram"][0]["category"], "Dairy");
        assert_eq!(json["top_recommendations"][0]["urgency"], "urgent");
        assert_eq!(json["upcoming"][0]["days_remaining"], 1);
        assert_eq!(json["reference_date"], "2024-06-15");
    }

    #[test]
    fn bucket_from_pair() {
        let b = Bucket::from(("fridge".to_string(), 4));
        assert_eq!(b, Bucket { label: "fridge".into(), count: 4 });
    }
}
