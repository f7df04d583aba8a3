use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Object types accepted for a batch.
pub const OBJECT_TYPES: &[&str] = &["HGD", "DTTS", "NLN"];

/// One declaration batch row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DeclarationBatch {
    pub id: i64,
    pub object_type: String,
    pub service_type: String,
    pub month: i32,
    pub year: i32,
    pub batch_number: i32,
    pub department_code: String,
    pub name: String,
    pub notes: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub total_declarations: i32,
    pub total_amount: i64,
    pub bill_image: Option<String>,
    pub approval_notes: Option<String>,
    pub rejection_notes: Option<String>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub approved_by: Option<i64>,
    pub rejected_by: Option<i64>,
    pub payment_confirmed_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub payment_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<i64>,
}

/// The uniqueness key among non-deleted batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchKey {
    pub month: i32,
    pub year: i32,
    pub batch_number: i32,
    pub department_code: String,
    pub object_type: String,
    pub service_type: String,
}

impl DeclarationBatch {
    pub fn key(&self) -> BatchKey {
        BatchKey {
            month: self.month,
            year: self.year,
            batch_number: self.batch_number,
            department_code: self.department_code.clone(),
            object_type: self.object_type.clone(),
            service_type: self.service_type.clone(),
        }
    }
}

/// Payload for batch creation.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchInput {
    pub object_type: String,
    pub service_type: String,
    pub month: i32,
    pub year: i32,
    pub batch_number: i32,
    pub name: String,
    pub notes: Option<String>,
}

/// Payload for metadata update while the batch is still pending. Absent
/// fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchUpdateInput {
    pub object_type: Option<String>,
    pub service_type: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub name: Option<String>,
    pub notes: Option<String>,
}

/// List filters, all optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchListQuery {
    pub status: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub department_code: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl BatchListQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(20).clamp(1, 100)
    }
}
