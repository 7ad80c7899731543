//! Demo data seeding
//!
//! Three suppliers, one delivery from each, and an initial stats row.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use crate::db::MemoryStore;
use crate::models::{
    DeliverySource, DeliveryStatus, ExtractedData, NewDelivery, NewSupplier,
    ProcessingStatsPatch, ProcessingStatus,
};
use crate::repositories::{DeliveryRepository, StatsRepository, SupplierRepository};

/// Seeds the store with demo data
///
/// Skipped when suppliers already exist, so calling it twice is harmless.
pub async fn seed_demo_data(store: &MemoryStore) -> Result<()> {
    let suppliers = SupplierRepository::new(store);
    if !suppliers.list_suppliers().await.is_empty() {
        log::info!("Store already contains suppliers, skipping demo seed");
        return Ok(());
    }

    let mut supplier_ids = Vec::new();
    for seed in supplier_seeds() {
        let name = seed.name.clone();
        let supplier = suppliers.create_supplier(seed).await.map_err(|e| {
            log::error!("Failed to seed supplier '{}': {}", name, e);
            e
        })?;
        supplier_ids.push((supplier.id, supplier.name));
    }

    let deliveries = DeliveryRepository::new(store);
    for seed in delivery_seeds(&supplier_ids) {
        deliveries.create_delivery(seed).await?;
    }

    StatsRepository::new(store)
        .update_stats(ProcessingStatsPatch {
            messages_processed: Some(Some(1247)),
            documents_processed: Some(Some(342)),
            on_time_delivery_rate: Some(Some(Decimal::new(8730, 2))),
            active_suppliers: Some(Some(34)),
            time_saved_hours: Some(Some(Decimal::new(350, 2))),
        })
        .await?;

    log::info!(
        "Demo seeding completed: {} suppliers, {} deliveries",
        supplier_ids.len(),
        deliveries.list_deliveries().await.len()
    );
    Ok(())
}

struct SupplierSeed {
    name: &'static str,
    contact_person: &'static str,
    email: &'static str,
    phone: &'static str,
    address: &'static str,
    /// rating, on-time rate, communication, accuracy, cost, all with two decimals
    scores: [i64; 5],
}

fn supplier_seeds() -> Vec<NewSupplier> {
    let seeds = [
        SupplierSeed {
            name: "ABC Trading Co.",
            contact_person: "John Smith",
            email: "john@abctrading.com",
            phone: "+91-9876543210",
            address: "123 Industrial Area, Mumbai",
            scores: [450, 8730, 8500, 9500, 8000],
        },
        SupplierSeed {
            name: "XYZ Suppliers",
            contact_person: "Sarah Johnson",
            email: "sarah@xyzsuppliers.com",
            phone: "+91-9876543211",
            address: "456 Business Park, Delhi",
            scores: [420, 8210, 8800, 9200, 8500],
        },
        SupplierSeed {
            name: "PQR Industries",
            contact_person: "Mike Wilson",
            email: "mike@pqrindustries.com",
            phone: "+91-9876543212",
            address: "789 Manufacturing Hub, Chennai",
            scores: [480, 9450, 9000, 9800, 7800],
        },
    ];

    seeds
        .into_iter()
        .map(|seed| {
            let [rating, on_time, communication, accuracy, cost] =
                seed.scores.map(|score| Decimal::new(score, 2));
            NewSupplier {
                name: seed.name.to_string(),
                contact_person: Some(seed.contact_person.to_string()),
                email: Some(seed.email.to_string()),
                phone: Some(seed.phone.to_string()),
                address: Some(seed.address.to_string()),
                rating: Some(rating),
                on_time_delivery_rate: Some(on_time),
                communication_quality: Some(communication),
                document_accuracy: Some(accuracy),
                cost_competitiveness: Some(cost),
                is_active: Some(true),
            }
        })
        .collect()
}

fn delivery_seeds(suppliers: &[(i32, String)]) -> Vec<NewDelivery> {
    let supplier = |index: usize| {
        suppliers
            .get(index)
            .map(|(id, name)| (Some(*id), name.clone()))
            .unwrap_or_default()
    };

    let (abc_id, abc_name) = supplier(0);
    let (xyz_id, xyz_name) = supplier(1);
    let (pqr_id, pqr_name) = supplier(2);

    vec![
        NewDelivery {
            supplier_id: abc_id,
            supplier_name: abc_name,
            material_type: "Raw Steel".to_string(),
            quantity: "500".to_string(),
            unit: "tons".to_string(),
            expected_date: day(2024, 12, 15),
            actual_date: day(2024, 12, 15),
            status: Some(DeliveryStatus::Delivered),
            invoice_amount: Some(Decimal::new(250_000_000, 2)),
            currency: Some("INR".to_string()),
            delivery_location: Some("Mumbai Factory".to_string()),
            notes: Some("Delivered on time, quality good".to_string()),
            source: Some(DeliverySource::Whatsapp),
            processing_status: Some(ProcessingStatus::Completed),
            extracted_data: Some(object(json!({
                "confidence": 0.95,
                "originalMessage": "Delivered 500 tons of raw steel to Mumbai factory today at 3pm"
            }))),
        },
        NewDelivery {
            supplier_id: xyz_id,
            supplier_name: xyz_name,
            material_type: "Electronics".to_string(),
            quantity: "200".to_string(),
            unit: "units".to_string(),
            expected_date: day(2024, 12, 16),
            actual_date: day(2024, 12, 17),
            status: Some(DeliveryStatus::Delayed),
            invoice_amount: Some(Decimal::new(75_000_000, 2)),
            currency: Some("INR".to_string()),
            delivery_location: Some("Delhi Warehouse".to_string()),
            notes: Some("Delayed due to traffic, quality acceptable".to_string()),
            source: Some(DeliverySource::Whatsapp),
            processing_status: Some(ProcessingStatus::Review),
            extracted_data: Some(object(json!({
                "confidence": 0.88,
                "originalMessage": "Shipment delayed due to traffic. Will reach by 5pm"
            }))),
        },
        NewDelivery {
            supplier_id: pqr_id,
            supplier_name: pqr_name,
            material_type: "Textiles".to_string(),
            quantity: "1000".to_string(),
            unit: "yards".to_string(),
            expected_date: day(2024, 12, 18),
            actual_date: None,
            status: Some(DeliveryStatus::InTransit),
            invoice_amount: Some(Decimal::new(50_000_000, 2)),
            currency: Some("INR".to_string()),
            delivery_location: Some("Chennai Plant".to_string()),
            notes: Some("In transit, expected on time".to_string()),
            source: Some(DeliverySource::Email),
            processing_status: Some(ProcessingStatus::Completed),
            extracted_data: Some(object(json!({
                "confidence": 0.92,
                "originalMessage": "Invoice for 1000 yards of textiles"
            }))),
        },
    ]
}

fn day(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()
}

fn object(value: Value) -> ExtractedData {
    match value {
        Value::Object(map) => map,
        _ => ExtractedData::new(),
    }
}
