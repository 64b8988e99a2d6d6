//! Client-order portfolio grouping.
//!
//! Turns flat order snapshots (each with its items) into per-client or
//! per-representative groups carrying flattened item rows and running value
//! totals. Pure functions over already-fetched data; no I/O happens here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use utoipa::ToSchema;

use crate::entities::{client_order, order_item};

/// Which key a grouping was produced under. Kept on the group so that a
/// later filter pass recomputes totals with the same stock rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GroupView {
    Client,
    Representative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub order_number: String,
    pub client_code: Option<String>,
    pub client_name: Option<String>,
    pub representative_code: Option<String>,
    pub status: String,
    pub order_date: DateTime<Utc>,
}

impl From<&client_order::Model> for OrderSummary {
    fn from(model: &client_order::Model) -> Self {
        Self {
            order_number: model.order_number.clone(),
            client_code: model.client_code.clone(),
            client_name: model.client_name.clone(),
            representative_code: model.representative_code.clone(),
            status: model.status.clone(),
            order_date: model.order_date,
        }
    }
}

/// Item row flattened into a group, tagged with its parent order number and
/// client identity so selections can be traced back to their card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemRow {
    pub order_number: String,
    pub client_code: Option<String>,
    pub client_name: Option<String>,
    pub item_code: String,
    pub description: String,
    pub quantity_ordered: Decimal,
    pub quantity_delivered: Decimal,
    pub quantity_saldo: Decimal,
    pub unit_price: Decimal,
    pub physical_stock: Decimal,
}

impl ItemRow {
    fn new(order: &client_order::Model, item: &order_item::Model) -> Self {
        Self {
            order_number: order.order_number.clone(),
            client_code: order.client_code.clone(),
            client_name: order.client_name.clone(),
            item_code: item.item_code.clone(),
            description: item.description.clone(),
            quantity_ordered: item.quantity_ordered,
            quantity_delivered: item.quantity_delivered,
            quantity_saldo: item.quantity_saldo,
            unit_price: item.unit_price,
            physical_stock: item.physical_stock,
        }
    }

    pub fn saldo_value(&self) -> Decimal {
        self.quantity_saldo * self.unit_price
    }
}

/// Four running sums carried by every group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GroupTotals {
    /// Σ quantity_saldo × unit_price
    pub valor_saldo: Decimal,
    /// Σ quantity_ordered × unit_price
    pub valor_pedido: Decimal,
    /// Σ quantity_delivered × unit_price
    pub valor_faturado: Decimal,
    /// Value billable against stock on hand. Only items with positive stock
    /// contribute; the client view caps each contribution at
    /// min(saldo, stock), the representative view uses the raw saldo.
    pub valor_faturar_com_estoque: Decimal,
}

impl GroupTotals {
    pub fn accumulate(&mut self, item: &ItemRow, view: GroupView) {
        self.valor_saldo += item.quantity_saldo * item.unit_price;
        self.valor_pedido += item.quantity_ordered * item.unit_price;
        self.valor_faturado += item.quantity_delivered * item.unit_price;

        if item.physical_stock > Decimal::ZERO {
            let billable_qty = match view {
                GroupView::Client => item.quantity_saldo.min(item.physical_stock),
                GroupView::Representative => item.quantity_saldo,
            };
            self.valor_faturar_com_estoque += billable_qty * item.unit_price;
        }
    }

    pub fn from_items(items: &[ItemRow], view: GroupView) -> Self {
        let mut totals = Self::default();
        for item in items {
            totals.accumulate(item, view);
        }
        totals
    }

    pub fn merge(&mut self, other: &GroupTotals) {
        self.valor_saldo += other.valor_saldo;
        self.valor_pedido += other.valor_pedido;
        self.valor_faturado += other.valor_faturado;
        self.valor_faturar_com_estoque += other.valor_faturar_com_estoque;
    }
}

/// One card in the grouped portfolio view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClientOrderGroup {
    /// Card name: client name in the client view, representative name in the
    /// representative view.
    pub key: String,
    pub view: GroupView,
    pub client_code: Option<String>,
    pub orders: Vec<OrderSummary>,
    pub items: Vec<ItemRow>,
    pub totals: GroupTotals,
}

impl ClientOrderGroup {
    fn new(key: String, view: GroupView, client_code: Option<String>) -> Self {
        Self {
            key,
            view,
            client_code,
            orders: Vec::new(),
            items: Vec::new(),
            totals: GroupTotals::default(),
        }
    }

    fn push(&mut self, order: &client_order::Model, items: &[order_item::Model]) {
        if self.client_code.is_none() {
            self.client_code = order.client_code.clone();
        }
        self.orders.push(OrderSummary::from(order));
        for item in items {
            let row = ItemRow::new(order, item);
            self.totals.accumulate(&row, self.view);
            self.items.push(row);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    MissingClientName,
    MissingRepresentativeCode,
}

/// Order that could not be placed under any card. Not an error: the grouped
/// view simply does not include it, but callers can inspect why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UnassignedOrder {
    pub order_number: String,
    pub reason: UnassignedReason,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupingOutcome {
    pub groups: BTreeMap<String, ClientOrderGroup>,
    pub unassigned: Vec<UnassignedOrder>,
}

impl GroupingOutcome {
    pub fn grand_totals(&self) -> GroupTotals {
        let mut totals = GroupTotals::default();
        for group in self.groups.values() {
            totals.merge(&group.totals);
        }
        totals
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Groups orders by client card name. Each item contributes to exactly one
/// group; orders without a client name are reported as unassigned.
pub fn group_by_client(
    orders: &[(client_order::Model, Vec<order_item::Model>)],
) -> GroupingOutcome {
    let mut groups: BTreeMap<String, ClientOrderGroup> = BTreeMap::new();
    let mut unassigned = Vec::new();

    for (order, items) in orders {
        let Some(client_name) = non_blank(&order.client_name) else {
            debug!(order_number = %order.order_number, "order without client name left out of grouping");
            unassigned.push(UnassignedOrder {
                order_number: order.order_number.clone(),
                reason: UnassignedReason::MissingClientName,
            });
            continue;
        };

        let group = groups.entry(client_name.to_string()).or_insert_with(|| {
            ClientOrderGroup::new(
                client_name.to_string(),
                GroupView::Client,
                order.client_code.clone(),
            )
        });
        group.push(order, items);
    }

    GroupingOutcome { groups, unassigned }
}

/// Groups orders by representative. `rep_names` is fetched once per batch;
/// codes without a display name fall back to the raw code so their orders
/// still land in a group.
pub fn group_by_representative(
    orders: &[(client_order::Model, Vec<order_item::Model>)],
    rep_names: &HashMap<String, String>,
) -> GroupingOutcome {
    let mut groups: BTreeMap<String, ClientOrderGroup> = BTreeMap::new();
    let mut unassigned = Vec::new();

    for (order, items) in orders {
        let Some(rep_code) = non_blank(&order.representative_code) else {
            debug!(order_number = %order.order_number, "order without representative code left out of grouping");
            unassigned.push(UnassignedOrder {
                order_number: order.order_number.clone(),
                reason: UnassignedReason::MissingRepresentativeCode,
            });
            continue;
        };

        let key = rep_names
            .get(rep_code)
            .cloned()
            .unwrap_or_else(|| rep_code.to_string());

        let group = groups
            .entry(key.clone())
            .or_insert_with(|| ClientOrderGroup::new(key, GroupView::Representative, None));
        group.push(order, items);
    }

    GroupingOutcome { groups, unassigned }
}
