use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One participant declaration row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Declaration {
    pub id: i64,
    pub batch_id: i64,
    pub object_type: String,
    pub bhxh_code: String,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub cccd: String,
    pub phone_number: String,
    pub receipt_date: Option<NaiveDate>,
    pub receipt_number: Option<String>,
    pub old_card_expiry_date: Option<NaiveDate>,
    pub new_card_effective_date: Option<NaiveDate>,
    pub months: i32,
    pub plan: Option<String>,
    pub commune: Option<String>,
    pub hamlet: Option<String>,
    pub participant_number: i32,
    pub hospital_code: Option<String>,
    pub actual_amount: i64,
    pub status: String,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Full field set for the create/edit upsert. `is_edit` plus
/// `original_bhxh_code` drive the identity-change decision table.
#[derive(Debug, Clone, Deserialize)]
pub struct DeclarationInput {
    pub object_type: String,
    pub bhxh_code: String,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub cccd: String,
    pub phone_number: String,
    pub receipt_date: Option<NaiveDate>,
    pub receipt_number: Option<String>,
    pub old_card_expiry_date: Option<NaiveDate>,
    pub new_card_effective_date: Option<NaiveDate>,
    pub months: i32,
    pub plan: Option<String>,
    pub commune: Option<String>,
    pub hamlet: Option<String>,
    pub participant_number: i32,
    pub hospital_code: Option<String>,
    #[serde(default)]
    pub is_edit: bool,
    pub original_bhxh_code: Option<String>,
}

/// Identifying detail of an existing record that blocks a duplicate
/// submission; feeds the error message.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingDuplicate {
    pub full_name: String,
    pub batch_name: String,
    pub month: i32,
    pub year: i32,
}

/// A declaration joined with its batch context, for the history lookup.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DeclarationHistory {
    pub id: i64,
    pub bhxh_code: String,
    pub full_name: String,
    pub cccd: String,
    pub months: i32,
    pub participant_number: i32,
    pub actual_amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub batch_id: i64,
    pub batch_name: String,
    pub month: i32,
    pub year: i32,
    pub batch_number: i32,
    pub batch_status: String,
}
