//! Order search and status filtering

use ddrp_core::{Order, OrderStatus};
use std::fmt;
use std::str::FromStr;

/// Status tab of the order list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("All"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<OrderStatus>().map(StatusFilter::Only)
    }
}

/// Orders whose product, customer name or id match `search`, within `filter`
///
/// Product and customer name match case-insensitively; the id matches as a
/// plain substring. An empty search matches everything.
pub fn filter_orders<'a>(orders: &'a [Order], search: &str, filter: StatusFilter) -> Vec<&'a Order> {
    let needle = search.to_lowercase();

    orders
        .iter()
        .filter(|order| {
            let matches_search = order.product.to_lowercase().contains(&needle)
                || order
                    .user_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
                || order.id.contains(search);
            matches_search && filter.matches(order.status)
        })
        .collect()
}
