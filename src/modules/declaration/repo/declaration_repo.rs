//! SQL for `declarations`.

use crate::modules::declaration::models::declaration::{
    Declaration, DeclarationHistory, DeclarationInput, PendingDuplicate,
};
use crate::modules::declaration::models::status::{BatchStatus, DeclarationStatus};
use crate::modules::declaration::repo::filter::{bind_filter_values, Combinator, FilterBuilder};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};

const DECLARATION_COLUMNS: &str = "id, batch_id, object_type, bhxh_code, full_name, birth_date, \
     gender, cccd, phone_number, receipt_date, receipt_number, old_card_expiry_date, \
     new_card_effective_date, months, plan, commune, hamlet, participant_number, hospital_code, \
     actual_amount, status, created_by, created_at, updated_at, deleted_at";

/// Transaction-scoped advisory lock keyed by the BHXH code. Serializes
/// concurrent submissions of the same code across the whole system so the
/// read-then-write duplicate check cannot race.
pub async fn advisory_lock_code(
    conn: &mut PgConnection,
    bhxh_code: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(bhxh_code)
        .execute(conn)
        .await?;
    Ok(())
}

/// Global pending-scope duplicate: the code already sits in a live
/// declaration of a live, still-pending batch anywhere in the system.
pub async fn find_pending_duplicate_global(
    conn: &mut PgConnection,
    bhxh_code: &str,
) -> Result<Option<PendingDuplicate>, sqlx::Error> {
    sqlx::query_as::<_, PendingDuplicate>(
        "SELECT d.full_name, b.name AS batch_name, b.month, b.year \
         FROM declarations d \
         JOIN declaration_batch b ON b.id = d.batch_id \
         WHERE d.bhxh_code = $1 AND d.deleted_at IS NULL \
           AND b.deleted_at IS NULL AND b.status = $2 \
         LIMIT 1",
    )
    .bind(bhxh_code)
    .bind(BatchStatus::Pending.as_str())
    .fetch_optional(conn)
    .await
}

/// Batch-scoped variant used when an edit changes the code.
pub async fn find_duplicate_in_batch(
    conn: &mut PgConnection,
    batch_id: i64,
    bhxh_code: &str,
) -> Result<Option<PendingDuplicate>, sqlx::Error> {
    sqlx::query_as::<_, PendingDuplicate>(
        "SELECT d.full_name, b.name AS batch_name, b.month, b.year \
         FROM declarations d \
         JOIN declaration_batch b ON b.id = d.batch_id \
         WHERE d.batch_id = $1 AND d.bhxh_code = $2 AND d.deleted_at IS NULL \
         LIMIT 1",
    )
    .bind(batch_id)
    .bind(bhxh_code)
    .fetch_optional(conn)
    .await
}

/// Name of the participant already using this CCCD under a different BHXH
/// code inside the batch, if any.
pub async fn find_cccd_conflict(
    conn: &mut PgConnection,
    batch_id: i64,
    cccd: &str,
    bhxh_code: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT full_name FROM declarations \
         WHERE batch_id = $1 AND cccd = $2 AND bhxh_code <> $3 AND deleted_at IS NULL \
         LIMIT 1",
    )
    .bind(batch_id)
    .bind(cccd)
    .bind(bhxh_code)
    .fetch_optional(conn)
    .await
}

pub async fn insert(
    conn: &mut PgConnection,
    batch_id: i64,
    input: &DeclarationInput,
    actual_amount: i64,
    user_id: i64,
) -> Result<Declaration, sqlx::Error> {
    let sql = format!(
        "INSERT INTO declarations \
         (batch_id, object_type, bhxh_code, full_name, birth_date, gender, cccd, phone_number, \
          receipt_date, receipt_number, old_card_expiry_date, new_card_effective_date, months, \
          plan, commune, hamlet, participant_number, hospital_code, actual_amount, status, \
          created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
                 $18, $19, $20, $21) \
         RETURNING {DECLARATION_COLUMNS}"
    );
    sqlx::query_as::<_, Declaration>(&sql)
        .bind(batch_id)
        .bind(&input.object_type)
        .bind(&input.bhxh_code)
        .bind(&input.full_name)
        .bind(input.birth_date)
        .bind(&input.gender)
        .bind(&input.cccd)
        .bind(&input.phone_number)
        .bind(input.receipt_date)
        .bind(&input.receipt_number)
        .bind(input.old_card_expiry_date)
        .bind(input.new_card_effective_date)
        .bind(input.months)
        .bind(&input.plan)
        .bind(&input.commune)
        .bind(&input.hamlet)
        .bind(input.participant_number)
        .bind(&input.hospital_code)
        .bind(actual_amount)
        .bind(DeclarationStatus::Pending.as_str())
        .bind(user_id)
        .fetch_one(conn)
        .await
}

/// In-place update on the edit path when the BHXH code is unchanged, keyed
/// by `(bhxh_code, batch_id)`.
pub async fn update_by_code(
    conn: &mut PgConnection,
    batch_id: i64,
    bhxh_code: &str,
    input: &DeclarationInput,
    actual_amount: i64,
) -> Result<Option<Declaration>, sqlx::Error> {
    let sql = format!(
        "UPDATE declarations SET object_type = $3, full_name = $4, birth_date = $5, \
         gender = $6, cccd = $7, phone_number = $8, receipt_date = $9, receipt_number = $10, \
         old_card_expiry_date = $11, new_card_effective_date = $12, months = $13, plan = $14, \
         commune = $15, hamlet = $16, participant_number = $17, hospital_code = $18, \
         actual_amount = $19, updated_at = now() \
         WHERE batch_id = $1 AND bhxh_code = $2 AND deleted_at IS NULL \
         RETURNING {DECLARATION_COLUMNS}"
    );
    sqlx::query_as::<_, Declaration>(&sql)
        .bind(batch_id)
        .bind(bhxh_code)
        .bind(&input.object_type)
        .bind(&input.full_name)
        .bind(input.birth_date)
        .bind(&input.gender)
        .bind(&input.cccd)
        .bind(&input.phone_number)
        .bind(input.receipt_date)
        .bind(&input.receipt_number)
        .bind(input.old_card_expiry_date)
        .bind(input.new_card_effective_date)
        .bind(input.months)
        .bind(&input.plan)
        .bind(&input.commune)
        .bind(&input.hamlet)
        .bind(input.participant_number)
        .bind(&input.hospital_code)
        .bind(actual_amount)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_id(
    conn: &mut PgConnection,
    id: i64,
) -> Result<Option<Declaration>, sqlx::Error> {
    let sql = format!(
        "SELECT {DECLARATION_COLUMNS} FROM declarations WHERE id = $1 AND deleted_at IS NULL"
    );
    sqlx::query_as::<_, Declaration>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn soft_delete(conn: &mut PgConnection, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE declarations SET deleted_at = now() WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Retire the live record holding `bhxh_code` in the batch. Used when an
/// edit changes the code: the replacement is inserted afterwards, keeping
/// exactly one live row per code. Returns the number of rows retired.
pub async fn soft_delete_by_code(
    conn: &mut PgConnection,
    batch_id: i64,
    bhxh_code: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE declarations SET deleted_at = now() \
         WHERE batch_id = $1 AND bhxh_code = $2 AND deleted_at IS NULL",
    )
    .bind(batch_id)
    .bind(bhxh_code)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_by_batch(
    pool: &PgPool,
    batch_id: i64,
) -> Result<Vec<Declaration>, sqlx::Error> {
    let sql = format!(
        "SELECT {DECLARATION_COLUMNS} FROM declarations \
         WHERE batch_id = $1 AND deleted_at IS NULL ORDER BY id"
    );
    sqlx::query_as::<_, Declaration>(&sql)
        .bind(batch_id)
        .fetch_all(pool)
        .await
}

/// Multi-field search filters; at least one must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilter {
    pub bhxh_code: Option<String>,
    pub full_name: Option<String>,
    pub cccd: Option<String>,
    pub phone_number: Option<String>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.bhxh_code.is_none()
            && self.full_name.is_none()
            && self.cccd.is_none()
            && self.phone_number.is_none()
    }
}

/// Last-known-good lookup: among all records matching any of the filters —
/// soft-deleted history included — keep only the most recent row per
/// distinct BHXH code.
pub async fn search(
    pool: &PgPool,
    filter: &SearchFilter,
) -> Result<Vec<Declaration>, sqlx::Error> {
    let mut builder = FilterBuilder::new(Combinator::Or);
    if let Some(code) = &filter.bhxh_code {
        builder.eq_text("bhxh_code", code);
    }
    if let Some(name) = &filter.full_name {
        builder.contains("full_name", name);
    }
    if let Some(cccd) = &filter.cccd {
        builder.eq_text("cccd", cccd);
    }
    if let Some(phone) = &filter.phone_number {
        builder.eq_text("phone_number", phone);
    }

    let sql = format!(
        "SELECT {DECLARATION_COLUMNS} FROM ( \
             SELECT *, ROW_NUMBER() OVER (PARTITION BY bhxh_code ORDER BY created_at DESC, id DESC) AS rn \
             FROM declarations WHERE {predicate} \
         ) ranked WHERE rn = 1 ORDER BY created_at DESC",
        predicate = builder.predicate(),
    );
    bind_filter_values!(sqlx::query_as::<_, Declaration>(&sql), builder)
        .fetch_all(pool)
        .await
}

/// Every live declaration for a code with its live batch context, most
/// recent batch first.
pub async fn history(
    pool: &PgPool,
    bhxh_code: &str,
) -> Result<Vec<DeclarationHistory>, sqlx::Error> {
    sqlx::query_as::<_, DeclarationHistory>(
        "SELECT d.id, d.bhxh_code, d.full_name, d.cccd, d.months, d.participant_number, \
                d.actual_amount, d.status, d.created_at, \
                b.id AS batch_id, b.name AS batch_name, b.month, b.year, b.batch_number, \
                b.status AS batch_status \
         FROM declarations d \
         JOIN declaration_batch b ON b.id = d.batch_id \
         WHERE d.bhxh_code = $1 AND d.deleted_at IS NULL AND b.deleted_at IS NULL \
         ORDER BY b.year DESC, b.month DESC, b.batch_number DESC",
    )
    .bind(bhxh_code)
    .fetch_all(pool)
    .await
}
