//! SQL for `declaration_batch`.
//!
//! Mutating functions take a `&mut PgConnection` borrowed from the caller's
//! transaction; the caller owns commit/rollback.

use crate::modules::declaration::models::batch::{
    BatchInput, BatchKey, BatchListQuery, DeclarationBatch,
};
use crate::modules::declaration::models::status::{BatchStatus, DeclarationStatus, PaymentStatus};
use crate::modules::declaration::repo::filter::{bind_filter_values, Combinator, FilterBuilder};
use sqlx::{PgConnection, PgPool};

const BATCH_COLUMNS: &str = "id, object_type, service_type, month, year, batch_number, \
     department_code, name, notes, status, payment_status, total_declarations, total_amount, \
     bill_image, approval_notes, rejection_notes, created_by, updated_by, approved_by, \
     rejected_by, payment_confirmed_by, approved_at, rejected_at, payment_confirmed_at, \
     created_at, updated_at, deleted_at, deleted_by";

pub async fn insert(
    conn: &mut PgConnection,
    input: &BatchInput,
    department_code: &str,
    user_id: i64,
) -> Result<DeclarationBatch, sqlx::Error> {
    let sql = format!(
        "INSERT INTO declaration_batch \
         (object_type, service_type, month, year, batch_number, department_code, name, notes, \
          status, payment_status, created_by) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING {BATCH_COLUMNS}"
    );
    sqlx::query_as::<_, DeclarationBatch>(&sql)
        .bind(&input.object_type)
        .bind(&input.service_type)
        .bind(input.month)
        .bind(input.year)
        .bind(input.batch_number)
        .bind(department_code)
        .bind(&input.name)
        .bind(&input.notes)
        .bind(BatchStatus::Pending.as_str())
        .bind(PaymentStatus::Unpaid.as_str())
        .bind(user_id)
        .fetch_one(conn)
        .await
}

/// Id of a live batch occupying the uniqueness key, if any.
pub async fn find_key_collision(
    conn: &mut PgConnection,
    key: &BatchKey,
    exclude_id: Option<i64>,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT id FROM declaration_batch \
         WHERE month = $1 AND year = $2 AND batch_number = $3 AND department_code = $4 \
           AND object_type = $5 AND service_type = $6 AND deleted_at IS NULL \
           AND ($7::BIGINT IS NULL OR id <> $7) \
         LIMIT 1",
    )
    .bind(key.month)
    .bind(key.year)
    .bind(key.batch_number)
    .bind(&key.department_code)
    .bind(&key.object_type)
    .bind(&key.service_type)
    .bind(exclude_id)
    .fetch_optional(conn)
    .await
}

/// Lock the batch row for the rest of the transaction. Serializes
/// concurrent submit/approve/payment/process attempts on the same batch.
pub async fn lock(
    conn: &mut PgConnection,
    id: i64,
) -> Result<Option<DeclarationBatch>, sqlx::Error> {
    let sql = format!(
        "SELECT {BATCH_COLUMNS} FROM declaration_batch \
         WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
    );
    sqlx::query_as::<_, DeclarationBatch>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: i64,
) -> Result<Option<DeclarationBatch>, sqlx::Error> {
    let sql = format!(
        "SELECT {BATCH_COLUMNS} FROM declaration_batch WHERE id = $1 AND deleted_at IS NULL"
    );
    sqlx::query_as::<_, DeclarationBatch>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Highest batch_number among live batches in the key scope (0 when none).
pub async fn max_batch_number(
    conn: &mut PgConnection,
    key: &BatchKey,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT COALESCE(MAX(batch_number), 0) FROM declaration_batch \
         WHERE month = $1 AND year = $2 AND department_code = $3 \
           AND object_type = $4 AND service_type = $5 AND deleted_at IS NULL",
    )
    .bind(key.month)
    .bind(key.year)
    .bind(&key.department_code)
    .bind(&key.object_type)
    .bind(&key.service_type)
    .fetch_one(conn)
    .await
}

pub async fn update_metadata(
    conn: &mut PgConnection,
    batch: &DeclarationBatch,
    user_id: i64,
) -> Result<DeclarationBatch, sqlx::Error> {
    let sql = format!(
        "UPDATE declaration_batch SET object_type = $2, service_type = $3, month = $4, \
         year = $5, batch_number = $6, name = $7, notes = $8, updated_by = $9, \
         updated_at = now() \
         WHERE id = $1 RETURNING {BATCH_COLUMNS}"
    );
    sqlx::query_as::<_, DeclarationBatch>(&sql)
        .bind(batch.id)
        .bind(&batch.object_type)
        .bind(&batch.service_type)
        .bind(batch.month)
        .bind(batch.year)
        .bind(batch.batch_number)
        .bind(&batch.name)
        .bind(&batch.notes)
        .bind(user_id)
        .fetch_one(conn)
        .await
}

pub async fn set_status(
    conn: &mut PgConnection,
    id: i64,
    status: BatchStatus,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE declaration_batch SET status = $2, updated_by = $3, updated_at = now() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn record_approval(
    conn: &mut PgConnection,
    id: i64,
    user_id: i64,
    notes: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE declaration_batch SET status = $2, approved_by = $3, approved_at = now(), \
         approval_notes = $4, updated_by = $3, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(BatchStatus::Approved.as_str())
    .bind(user_id)
    .bind(notes)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn record_rejection(
    conn: &mut PgConnection,
    id: i64,
    user_id: i64,
    note: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE declaration_batch SET status = $2, rejected_by = $3, rejected_at = now(), \
         rejection_notes = $4, updated_by = $3, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(BatchStatus::Rejected.as_str())
    .bind(user_id)
    .bind(note)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn record_payment(
    conn: &mut PgConnection,
    id: i64,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE declaration_batch SET payment_status = $2, payment_confirmed_by = $3, \
         payment_confirmed_at = now(), updated_by = $3, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(PaymentStatus::Paid.as_str())
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Fan a batch transition out to its live declarations, within the same
/// transaction as the batch update.
pub async fn cascade_declaration_status(
    conn: &mut PgConnection,
    batch_id: i64,
    from: DeclarationStatus,
    to: DeclarationStatus,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE declarations SET status = $3, updated_at = now() \
         WHERE batch_id = $1 AND status = $2 AND deleted_at IS NULL",
    )
    .bind(batch_id)
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Recompute `total_amount` from the live declarations of the batch and
/// write it back. Idempotent.
pub async fn recompute_total(
    conn: &mut PgConnection,
    batch_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "UPDATE declaration_batch SET total_amount = COALESCE( \
             (SELECT SUM(actual_amount) FROM declarations \
              WHERE batch_id = $1 AND deleted_at IS NULL), 0), \
             updated_at = now() \
         WHERE id = $1 RETURNING total_amount",
    )
    .bind(batch_id)
    .fetch_one(conn)
    .await
}

pub async fn adjust_declaration_count(
    conn: &mut PgConnection,
    batch_id: i64,
    delta: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE declaration_batch \
         SET total_declarations = GREATEST(total_declarations + $2, 0), updated_at = now() \
         WHERE id = $1",
    )
    .bind(batch_id)
    .bind(delta)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn count_active_declarations(
    conn: &mut PgConnection,
    batch_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM declarations WHERE batch_id = $1 AND deleted_at IS NULL",
    )
    .bind(batch_id)
    .fetch_one(conn)
    .await
}

pub async fn soft_delete(
    conn: &mut PgConnection,
    id: i64,
    user_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE declaration_batch SET deleted_at = now(), deleted_by = $2 WHERE id = $1",
    )
    .bind(id)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Ids of all live batches, for bulk total reconciliation.
pub async fn all_live_ids(pool: &PgPool) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT id FROM declaration_batch WHERE deleted_at IS NULL ORDER BY id",
    )
    .fetch_all(pool)
    .await
}

/// Paginated list of live batches, newest scope first.
pub async fn list(
    pool: &PgPool,
    query: &BatchListQuery,
) -> Result<(Vec<DeclarationBatch>, i64), sqlx::Error> {
    let mut builder = FilterBuilder::new(Combinator::And);
    if let Some(status) = &query.status {
        builder.eq_text("status", status);
    }
    if let Some(month) = query.month {
        builder.eq_int("month", month as i64);
    }
    if let Some(year) = query.year {
        builder.eq_int("year", year as i64);
    }
    if let Some(department_code) = &query.department_code {
        builder.eq_text("department_code", department_code);
    }
    let predicate = builder.predicate();

    let count_sql = format!(
        "SELECT COUNT(*) FROM declaration_batch WHERE deleted_at IS NULL AND {predicate}"
    );
    let total = bind_filter_values!(sqlx::query_scalar::<_, i64>(&count_sql), builder)
        .fetch_one(pool)
        .await?;

    let limit = query.page_size() as i64;
    let offset = (query.page() as i64 - 1) * limit;
    let list_sql = format!(
        "SELECT {BATCH_COLUMNS} FROM declaration_batch \
         WHERE deleted_at IS NULL AND {predicate} \
         ORDER BY year DESC, month DESC, batch_number DESC, id DESC \
         LIMIT ${} OFFSET ${}",
        builder.len() + 1,
        builder.len() + 2,
    );
    let rows = bind_filter_values!(sqlx::query_as::<_, DeclarationBatch>(&list_sql), builder)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}
