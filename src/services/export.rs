//! CSV renditions of in-memory record sets for download.

use csv::WriterBuilder;
use std::collections::BTreeMap;

use crate::errors::ServiceError;
use crate::services::grouping::ClientOrderGroup;
use crate::services::separations::SeparationDetailResponse;

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ServiceError> {
    writer
        .into_inner()
        .map_err(|e| ServiceError::SerializationError(e.to_string()))
}

/// Flat export of every item row in the (already filtered) grouped view.
pub fn grouped_items_csv(
    groups: &BTreeMap<String, ClientOrderGroup>,
) -> Result<Vec<u8>, ServiceError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    writer
        .write_record([
            "cliente",
            "codigo_cliente",
            "pedido",
            "codigo_item",
            "descricao",
            "qtde_pedida",
            "qtde_entregue",
            "qtde_saldo",
            "preco_unitario",
            "estoque_fisico",
            "valor_saldo",
        ])
        .map_err(|e| ServiceError::SerializationError(e.to_string()))?;

    for group in groups.values() {
        for item in &group.items {
            writer
                .write_record([
                    group.key.as_str(),
                    group.client_code.as_deref().unwrap_or(""),
                    item.order_number.as_str(),
                    item.item_code.as_str(),
                    item.description.as_str(),
                    &item.quantity_ordered.to_string(),
                    &item.quantity_delivered.to_string(),
                    &item.quantity_saldo.to_string(),
                    &item.unit_price.to_string(),
                    &item.physical_stock.to_string(),
                    &item.saldo_value().to_string(),
                ])
                .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
        }
    }

    finish(writer)
}

/// Separation export: a header section and the line-item section in one
/// file, separated by a blank row.
pub fn separation_csv(detail: &SeparationDetailResponse) -> Result<Vec<u8>, ServiceError> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    let sep = &detail.separation;

    writer
        .write_record([
            "separacao",
            "cliente",
            "codigo_cliente",
            "status",
            "itens",
            "valor_total",
            "criada_em",
        ])
        .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
    writer
        .write_record([
            sep.id.to_string().as_str(),
            sep.client_name.as_str(),
            sep.client_code.as_str(),
            sep.status.as_str(),
            &sep.item_count.to_string(),
            &sep.total_value.to_string(),
            &sep.created_at.to_rfc3339(),
        ])
        .map_err(|e| ServiceError::SerializationError(e.to_string()))?;

    writer
        .write_record([""])
        .map_err(|e| ServiceError::SerializationError(e.to_string()))?;

    writer
        .write_record([
            "pedido",
            "codigo_item",
            "descricao",
            "quantidade",
            "preco_unitario",
            "valor_total",
        ])
        .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
    for item in &detail.items {
        writer
            .write_record([
                item.order_number.as_str(),
                item.item_code.as_str(),
                item.description.as_str(),
                &item.quantity.to_string(),
                &item.unit_price.to_string(),
                &item.total_price.to_string(),
            ])
            .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
    }

    finish(writer)
}
