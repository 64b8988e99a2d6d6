//! Narrowing of grouped portfolio views.
//!
//! Filtering never mutates its input: it produces a fresh mapping with the
//! four totals recomputed over exactly the retained items. Groups left with
//! no orders or no items disappear from the output; absence means "no
//! match", never an error.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use utoipa::ToSchema;

use super::grouping::{ClientOrderGroup, GroupTotals, ItemRow, OrderSummary};

/// Canonical order statuses as stored upstream. Legacy exports encode the
/// same statuses as single digits; `parse` accepts both spellings so every
/// caller works from one normalized value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    Blocked,
    Open,
    Partial,
    Total,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Blocked => "Bloqueado",
            OrderStatus::Open => "Aberto",
            OrderStatus::Partial => "Parcial",
            OrderStatus::Total => "Total",
            OrderStatus::Cancelled => "Cancelado",
        }
    }

    /// Accepts a canonical name (case-insensitive) or a legacy digit code.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0" => Some(OrderStatus::Blocked),
            "1" => Some(OrderStatus::Open),
            "2" => Some(OrderStatus::Partial),
            "3" => Some(OrderStatus::Total),
            "4" => Some(OrderStatus::Cancelled),
            name => [
                OrderStatus::Blocked,
                OrderStatus::Open,
                OrderStatus::Partial,
                OrderStatus::Total,
                OrderStatus::Cancelled,
            ]
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(name)),
        }
    }
}

/// What the free-text search is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Client,
    Order,
    Item,
}

#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    pub search: Option<String>,
    pub search_mode: SearchMode,
    pub status: Option<OrderStatus>,
    pub representative: Option<String>,
}

impl GroupFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.status.is_none()
            && self.representative.is_none()
    }
}

fn order_matches(order: &OrderSummary, filter: &GroupFilter, needle: Option<&str>) -> bool {
    if let Some(status) = filter.status {
        if OrderStatus::parse(&order.status) != Some(status) {
            return false;
        }
    }

    if let Some(rep) = filter.representative.as_deref() {
        if order.representative_code.as_deref().map(str::trim) != Some(rep.trim()) {
            return false;
        }
    }

    if filter.search_mode == SearchMode::Order {
        if let Some(needle) = needle {
            if !order.order_number.to_lowercase().contains(needle) {
                return false;
            }
        }
    }

    true
}

fn item_matches(item: &ItemRow, filter: &GroupFilter, needle: Option<&str>) -> bool {
    if filter.search_mode != SearchMode::Item {
        return true;
    }
    let Some(needle) = needle else { return true };
    item.item_code.to_lowercase().contains(needle)
        || item.description.to_lowercase().contains(needle)
}

/// Returns a new mapping narrowed by `filter`. Applying the same filter to
/// its own output yields the same result.
pub fn filter_groups(
    groups: &BTreeMap<String, ClientOrderGroup>,
    filter: &GroupFilter,
) -> BTreeMap<String, ClientOrderGroup> {
    let needle = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let needle = needle.as_deref();

    let mut out = BTreeMap::new();

    for (key, group) in groups {
        if filter.search_mode == SearchMode::Client {
            if let Some(needle) = needle {
                if !key.to_lowercase().contains(needle) {
                    continue;
                }
            }
        }

        let orders: Vec<OrderSummary> = group
            .orders
            .iter()
            .filter(|order| order_matches(order, filter, needle))
            .cloned()
            .collect();

        let retained_numbers: HashSet<&str> =
            orders.iter().map(|o| o.order_number.as_str()).collect();

        let items: Vec<ItemRow> = group
            .items
            .iter()
            .filter(|item| {
                retained_numbers.contains(item.order_number.as_str())
                    && item_matches(item, filter, needle)
            })
            .cloned()
            .collect();

        let numbers_with_items: HashSet<&str> =
            items.iter().map(|i| i.order_number.as_str()).collect();

        let orders: Vec<OrderSummary> = orders
            .into_iter()
            .filter(|o| numbers_with_items.contains(o.order_number.as_str()))
            .collect();

        if orders.is_empty() || items.is_empty() {
            continue;
        }

        let totals = GroupTotals::from_items(&items, group.view);
        out.insert(
            key.clone(),
            ClientOrderGroup {
                key: key.clone(),
                view: group.view,
                client_code: group.client_code.clone(),
                orders,
                items,
                totals,
            },
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::grouping::tests::{item, order};
    use crate::services::grouping::{group_by_client, GroupView};
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case("0", OrderStatus::Blocked)]
    #[test_case("1", OrderStatus::Open)]
    #[test_case("2", OrderStatus::Partial)]
    #[test_case("3", OrderStatus::Total)]
    #[test_case("4", OrderStatus::Cancelled)]
    #[test_case("Aberto", OrderStatus::Open; "aberto mixed case")]
    #[test_case("aberto", OrderStatus::Open; "aberto lower case")]
    #[test_case(" Cancelado ", OrderStatus::Cancelled)]
    fn parse_accepts_both_encodings(raw: &str, expected: OrderStatus) {
        assert_eq!(OrderStatus::parse(raw), Some(expected));
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert_eq!(OrderStatus::parse("5"), None);
        assert_eq!(OrderStatus::parse("Faturado"), None);
        assert_eq!(OrderStatus::parse(""), None);
    }

    fn sample_groups() -> BTreeMap<String, ClientOrderGroup> {
        let orders = vec![
            (
                order("P100", Some("C1"), Some("Acme"), Some("R1"), "Aberto"),
                vec![
                    item("P100", "BOLT-10", dec!(10), dec!(5), dec!(0)),
                    item("P100", "NUT-20", dec!(4), dec!(2), dec!(10)),
                ],
            ),
            (
                order("P200", Some("C1"), Some("Acme"), Some("R2"), "Parcial"),
                vec![item("P200", "SCREW-30", dec!(6), dec!(3), dec!(2))],
            ),
            (
                order("P300", Some("C2"), Some("Bravo"), Some("R1"), "1"),
                vec![item("P300", "BOLT-10", dec!(2), dec!(7), dec!(0))],
            ),
        ];
        group_by_client(&orders).groups
    }

    #[test]
    fn legacy_code_and_name_filters_are_identical() {
        let groups = sample_groups();

        let by_name = filter_groups(
            &groups,
            &GroupFilter {
                status: OrderStatus::parse("Aberto"),
                ..Default::default()
            },
        );
        let by_code = filter_groups(
            &groups,
            &GroupFilter {
                status: OrderStatus::parse("1"),
                ..Default::default()
            },
        );

        assert_eq!(by_name, by_code);
        // P300 is stored with the legacy digit and still matches
        assert!(by_name.contains_key("Bravo"));
        assert!(by_name.contains_key("Acme"));
        assert_eq!(by_name["Acme"].orders.len(), 1);
    }

    #[test]
    fn filtering_is_idempotent() {
        let groups = sample_groups();
        let filter = GroupFilter {
            search: Some("bolt".to_string()),
            search_mode: SearchMode::Item,
            ..Default::default()
        };

        let once = filter_groups(&groups, &filter);
        let twice = filter_groups(&once, &filter);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_groups_are_omitted_and_totals_recomputed() {
        let groups = sample_groups();
        let filtered = filter_groups(
            &groups,
            &GroupFilter {
                search: Some("SCREW".to_string()),
                search_mode: SearchMode::Item,
                ..Default::default()
            },
        );

        assert_eq!(filtered.len(), 1);
        let acme = &filtered["Acme"];
        assert_eq!(acme.items.len(), 1);
        assert_eq!(acme.orders.len(), 1);
        assert_eq!(acme.totals.valor_saldo, dec!(18));
        // saldo 6 capped at stock 2, price 3
        assert_eq!(acme.totals.valor_faturar_com_estoque, dec!(6));
        assert_eq!(acme.view, GroupView::Client);
    }

    #[test]
    fn order_search_drops_sibling_orders() {
        let groups = sample_groups();
        let filtered = filter_groups(
            &groups,
            &GroupFilter {
                search: Some("P200".to_string()),
                search_mode: SearchMode::Order,
                ..Default::default()
            },
        );

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered["Acme"].orders.len(), 1);
        assert_eq!(filtered["Acme"].orders[0].order_number, "P200");
        assert_eq!(filtered["Acme"].items.len(), 1);
    }

    #[test]
    fn representative_filter_matches_order_rows() {
        let groups = sample_groups();
        let filtered = filter_groups(
            &groups,
            &GroupFilter {
                representative: Some("R1".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered["Acme"].orders.len(), 1);
        assert_eq!(filtered["Acme"].orders[0].order_number, "P100");
        assert_eq!(filtered["Bravo"].orders.len(), 1);
    }

    #[test]
    fn input_is_never_mutated() {
        let groups = sample_groups();
        let before = groups.clone();
        let _ = filter_groups(
            &groups,
            &GroupFilter {
                status: Some(OrderStatus::Cancelled),
                ..Default::default()
            },
        );
        assert_eq!(groups, before);
    }
}
