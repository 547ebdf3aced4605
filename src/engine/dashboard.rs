use serde::Serialize;
use time::{Date, Duration};

use super::product::ProductView;
use super::urgency::{days_remaining, UrgencyTier};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Counters over a user's active products.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct DashboardSummary {
    pub total: usize,
    /// 0..=2 days left.
    pub expiring_soon: usize,
    pub expired: usize,
    pub category_histogram: Vec<CategoryCount>,
}

/// Groups by category name, counting in first-seen order, then orders by count
/// descending. Equal counts keep first-seen order.
fn category_histogram<'a, I>(categories: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hist: Vec<CategoryCount> = Vec::new();
    for name in categories {
        match hist.iter_mut().find(|c| c.category == name) {
            Some(c) => c.count += 1,
            None => hist.push(CategoryCount {
                category: name.to_string(),
                count: 1,
            }),
        }
    }
    hist.sort_by(|a, b| b.count.cmp(&a.count));
    hist
}

pub fn dashboard_summary(products: &[ProductView], reference: Date, top_n: usize) -> DashboardSummary {
    let mut summary = DashboardSummary::default();
    let active: Vec<&ProductView> = products.iter().filter(|p| p.is_active()).collect();

    for p in &active {
        summary.total += 1;
        match UrgencyTier::from_days(days_remaining(p.expiration_date, reference)) {
            UrgencyTier::Danger => summary.expired += 1,
            UrgencyTier::Warning => summary.expiring_soon += 1,
            UrgencyTier::Info | UrgencyTier::Safe => {}
        }
    }

    let mut hist = category_histogram(active.iter().map(|p| p.category_name()));
    hist.truncate(top_n);
    summary.category_histogram = hist;
    summary
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DayCount {
    pub date: Date,
    pub count: usize,
}

/// Active products expiring on each of the `days` days starting at `reference`.
pub fn expiration_timeline(products: &[ProductView], reference: Date, days: i64) -> Vec<DayCount> {
    let mut timeline: Vec<DayCount> = (0..days.max(0))
        .map(|offset| DayCount {
            date: reference + Duration::days(offset),
            count: 0,
        })
        .collect();
    for p in products.iter().filter(|p| p.is_active()) {
        let offset = days_remaining(p.expiration_date, reference);
        if let Some(slot) = usize::try_from(offset).ok().and_then(|i| timeline.get_mut(i)) {
            slot.count += 1;
        }
    }
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::product::{Priority, ProductStatus};
    use time::macros::date;
    use uuid::Uuid;

    const TODAY: Date = date!(2024 - 01 - 10);

    fn product(days: i64, category: Option<&str>, status: ProductStatus) -> ProductView {
        ProductView {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: "item".into(),
            category: category.map(str::to_string),
            expiration_date: TODAY + Duration::days(days),
            status,
            priority: Priority::Low,
            quantity: 2.5,
        }
    }

    #[test]
    fn empty_inventory_is_all_zero() {
        let summary = dashboard_summary(&[], TODAY, 5);
        assert_eq!(summary, DashboardSummary::default());
        assert_eq!(summary.total, 0);
        assert!(summary.category_histogram.is_empty());
    }

    #[test]
    fn counts_only_active_products() {
        let products = vec![
            product(-1, Some("Dairy"), ProductStatus::Active),
            product(0, Some("Dairy"), ProductStatus::Active),
            product(2, Some("Meat"), ProductStatus::Active),
            product(3, None, ProductStatus::Active),
            product(-5, Some("Meat"), ProductStatus::Used),
            product(1, Some("Fish"), ProductStatus::Thrown),
        ];
        let summary = dashboard_summary(&products, TODAY, 5);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.expiring_soon, 2);
        assert_eq!(
            summary.category_histogram,
            vec![
                CategoryCount { category: "Dairy".into(), count: 2 },
                CategoryCount { category: "Meat".into(), count: 1 },
                CategoryCount { category: "Uncategorized".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn histogram_is_truncated_to_top_n() {
        let products = vec![
            product(10, Some("Veg"), ProductStatus::Active),
            product(10, Some("Fruit"), ProductStatus::Active),
            product(10, Some("Fruit"), ProductStatus::Active),
            product(10, Some("Grains"), ProductStatus::Active),
        ];
        let summary = dashboard_summary(&products, TODAY, 2);
        let names: Vec<_> = summary
            .category_histogram
            .iter()
            .map(|c| c.category.as_str())
            .collect();
        assert_eq!(names, ["Fruit", "Veg"]);
        assert_eq!(summary.total, 4);
    }

    #[test]
    fn timeline_covers_each_day() {
        let products = vec![
            product(-1, None, ProductStatus::Active),
            product(0, None, ProductStatus::Active),
            product(0, None, ProductStatus::Active),
            product(3, None, ProductStatus::Active),
            product(3, None, ProductStatus::Used),
            product(7, None, ProductStatus::Active),
        ];
        let timeline = expiration_timeline(&products, TODAY, 7);
        assert_eq!(timeline.len(), 7);
        assert_eq!(timeline[0], DayCount { date: TODAY, count: 2 });
        assert_eq!(timeline[3].count, 1);
        assert_eq!(timeline[6].date, date!(2024 - 01 - 16));
        assert_eq!(timeline.iter().map(|d| d.count).sum::<usize>(), 3);
        assert!(expiration_timeline(&products, TODAY, 0).is_empty());
    }
}
