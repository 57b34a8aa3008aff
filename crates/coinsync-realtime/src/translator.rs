//! Snapshot translation: raw live-query snapshots into package records.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use coinsync_core::error::AppError;
use coinsync_core::result::AppResult;
use coinsync_core::subscription::Subscription;
use coinsync_core::traits::SnapshotEvent;
use coinsync_core::types::package::sort_canonical;
use coinsync_core::types::timestamp::{self, Normalized};
use coinsync_core::types::{
    PackageId, PackageQuery, PackageRecord, PackageStatus, RawDocument, RawSnapshot,
};

use crate::context::SyncContext;

const STATUS: &str = "status";
const PRICE: &str = "price";
const USERNAME: &str = "username";
const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

/// Result of translating one snapshot.
///
/// Supersedes the previous translation entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    /// Active records in canonical order.
    pub records: Vec<PackageRecord>,
    /// Records that needed a substituted value.
    pub malformed: usize,
    /// Documents dropped because they were not active.
    pub dropped: usize,
}

impl Translation {
    /// Whether no active record was observed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Subscribes to the package query and normalizes its snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotTranslator {
    query: PackageQuery,
}

impl SnapshotTranslator {
    /// Create a translator for the configured package collection.
    pub fn new(ctx: &SyncContext) -> Self {
        Self {
            query: PackageQuery::active_packages(
                ctx.config.packages_collection.clone(),
                ctx.config.order_field.clone(),
            ),
        }
    }

    /// Open the live query.
    ///
    /// Callers must only do this after identity bootstrap has settled.
    pub async fn subscribe(&self, ctx: &SyncContext) -> AppResult<Subscription<SnapshotEvent>> {
        debug!(collection = %self.query.collection, "Subscribing to live package query");
        ctx.live_query
            .subscribe(&self.query)
            .await
            .map_err(|e| AppError::stream(format!("live query subscription failed: {}", e.message)))
    }

    /// Normalize a raw snapshot.
    ///
    /// Re-sorts into canonical order regardless of the order the store
    /// delivered, and never fails on a single bad record.
    pub fn translate(&self, snapshot: &RawSnapshot) -> Translation {
        let mut records = Vec::with_capacity(snapshot.len());
        let mut malformed = 0;
        let mut dropped = 0;

        for doc in &snapshot.documents {
            match translate_document(doc) {
                Some((record, recovered)) => {
                    if recovered {
                        malformed += 1;
                    }
                    records.push(record);
                }
                None => dropped += 1,
            }
        }

        sort_canonical(&mut records);

        Translation {
            records,
            malformed,
            dropped,
        }
    }
}

/// Translate one document. `None` when it is not an active package;
/// the flag reports whether any field had to be substituted.
fn translate_document(doc: &RawDocument) -> Option<(PackageRecord, bool)> {
    let fields = &doc.fields;

    let status = fields
        .get(STATUS)
        .and_then(Value::as_str)
        .map_or(PackageStatus::Other(String::new()), PackageStatus::from);
    if !status.is_active() {
        debug!(package_id = %doc.id, status = %status, "Dropping inactive package");
        return None;
    }

    let mut recovered = false;

    let price = match normalize_price(fields.get(PRICE)) {
        Ok(price) => price,
        Err(e) => {
            warn!(package_id = %doc.id, error = %e, "Price treated as 0");
            recovered = true;
            0
        }
    };

    let created_at = normalize_time(doc, CREATED_AT, &mut recovered);
    let updated_at = normalize_time(doc, UPDATED_AT, &mut recovered);

    let username = fields
        .get(USERNAME)
        .and_then(Value::as_str)
        .map(str::to_string);

    let extra: Map<String, Value> = fields
        .iter()
        .filter(|(k, _)| ![STATUS, PRICE, USERNAME, CREATED_AT, UPDATED_AT].contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let record = PackageRecord {
        id: PackageId::new(doc.id.clone()),
        status,
        price,
        username,
        created_at,
        updated_at,
        extra,
    };
    Some((record, recovered))
}

fn normalize_time(
    doc: &RawDocument,
    field: &str,
    recovered: &mut bool,
) -> chrono::DateTime<chrono::Utc> {
    let normalized = timestamp::normalize(doc.fields.get(field));
    if normalized == Normalized::Malformed {
        let e = AppError::malformed_record(format!("unparsable {field}"));
        warn!(package_id = %doc.id, error = %e, "Timestamp replaced with epoch");
        *recovered = true;
    }
    normalized.or_epoch()
}

/// Coin amount of a price field. Missing means 0.
///
/// Numbers and numeric strings follow the same rule: whole values pass
/// through, non-negative finite fractions are truncated.
fn normalize_price(value: Option<&Value>) -> AppResult<u64> {
    let malformed = |v: &Value| AppError::malformed_record(format!("unusable price {v}"));
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(v @ Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(whole_coins))
            .ok_or_else(|| malformed(v)),
        Some(v @ Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_coins))
                .ok_or_else(|| malformed(v))
        }
        Some(other) => Err(malformed(other)),
    }
}

fn whole_coins(amount: f64) -> Option<u64> {
    (amount.is_finite() && amount >= 0.0).then(|| amount.trunc() as u64)
}
