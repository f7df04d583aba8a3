//! Batch lifecycle manager.
//!
//! Every transition runs in one transaction: lock the batch row, check the
//! precondition, mutate, cascade, re-aggregate, commit. A dropped
//! transaction rolls back, so any error path leaves the batch untouched.

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::modules::declaration::models::batch::{
    BatchInput, BatchKey, BatchListQuery, BatchUpdateInput, DeclarationBatch,
};
use crate::modules::declaration::models::declaration::Declaration;
use crate::modules::declaration::models::status::{BatchStatus, DeclarationStatus, PaymentStatus};
use crate::modules::declaration::repo::{batch_repo, declaration_repo};
use crate::modules::declaration::validate::validate_batch_input;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Serialize)]
pub struct BatchDetail {
    #[serde(flatten)]
    pub batch: DeclarationBatch,
    pub declarations: Vec<Declaration>,
}

fn batch_status(batch: &DeclarationBatch) -> AppResult<BatchStatus> {
    BatchStatus::parse(&batch.status).ok_or_else(|| {
        AppError::database(format!(
            "Trạng thái đợt kê khai không hợp lệ: {}",
            batch.status
        ))
    })
}

fn payment_status(batch: &DeclarationBatch) -> AppResult<PaymentStatus> {
    PaymentStatus::parse(&batch.payment_status).ok_or_else(|| {
        AppError::database(format!(
            "Trạng thái thanh toán không hợp lệ: {}",
            batch.payment_status
        ))
    })
}

fn department_code(user: &AuthUser) -> AppResult<&str> {
    user.department_code
        .as_deref()
        .ok_or_else(|| AppError::validation("department_code", "Thiếu mã đơn vị của người dùng"))
}

/// Substitute the old batch number for the new one when the name contains
/// it as a standalone number; otherwise the name is returned unchanged.
/// Matches on digit boundaries so renumbering 1 leaves "11" alone.
pub fn substitute_batch_number(name: &str, old_number: i32, new_number: i32) -> String {
    let old = old_number.to_string();
    let bytes = name.as_bytes();
    let mut start = 0;

    while let Some(pos) = name[start..].find(&old) {
        let begin = start + pos;
        let end = begin + old.len();
        let standalone = (begin == 0 || !bytes[begin - 1].is_ascii_digit())
            && (end == bytes.len() || !bytes[end].is_ascii_digit());
        if standalone {
            let mut renamed = String::with_capacity(name.len());
            renamed.push_str(&name[..begin]);
            renamed.push_str(&new_number.to_string());
            renamed.push_str(&name[end..]);
            return renamed;
        }
        start = end;
    }

    name.to_string()
}

/// Merge a partial update onto the batch and re-validate the result, so an
/// edit cannot move a batch into an invalid month or object type.
fn apply_batch_update(batch: &mut DeclarationBatch, input: BatchUpdateInput) -> AppResult<()> {
    if let Some(object_type) = input.object_type {
        batch.object_type = object_type;
    }
    if let Some(service_type) = input.service_type {
        batch.service_type = service_type;
    }
    if let Some(month) = input.month {
        batch.month = month;
    }
    if let Some(year) = input.year {
        batch.year = year;
    }
    if let Some(name) = input.name {
        batch.name = name;
    }
    if let Some(notes) = input.notes {
        batch.notes = Some(notes);
    }

    validate_batch_input(&BatchInput {
        object_type: batch.object_type.clone(),
        service_type: batch.service_type.clone(),
        month: batch.month,
        year: batch.year,
        batch_number: batch.batch_number,
        name: batch.name.clone(),
        notes: batch.notes.clone(),
    })
}

pub async fn create_batch(
    pool: &PgPool,
    user: &AuthUser,
    input: BatchInput,
) -> AppResult<DeclarationBatch> {
    validate_batch_input(&input)?;
    let department = department_code(user)?.to_string();

    let mut tx = pool.begin().await?;

    let key = BatchKey {
        month: input.month,
        year: input.year,
        batch_number: input.batch_number,
        department_code: department.clone(),
        object_type: input.object_type.clone(),
        service_type: input.service_type.clone(),
    };
    if batch_repo::find_key_collision(&mut tx, &key, None)
        .await?
        .is_some()
    {
        return Err(AppError::duplicate(format!(
            "Đợt kê khai số {} (tháng {}/{}) đã tồn tại cho đơn vị {}",
            input.batch_number, input.month, input.year, department
        )));
    }

    let batch = batch_repo::insert(&mut tx, &input, &department, user.id).await?;
    tx.commit().await?;

    info!(batch_id = batch.id, "Đã tạo đợt kê khai");
    Ok(batch)
}

/// Metadata update, allowed only while pending. A key collision caused by
/// the edit renumbers the batch instead of failing.
pub async fn update_batch(
    pool: &PgPool,
    user: &AuthUser,
    batch_id: i64,
    input: BatchUpdateInput,
) -> AppResult<DeclarationBatch> {
    let mut tx = pool.begin().await?;

    let mut batch = batch_repo::lock(&mut tx, batch_id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy đợt kê khai"))?;
    if batch_status(&batch)? != BatchStatus::Pending {
        return Err(AppError::state(
            "Đợt kê khai đã đóng, không thể chỉnh sửa",
        ));
    }

    apply_batch_update(&mut batch, input)?;

    let key = batch.key();
    if batch_repo::find_key_collision(&mut tx, &key, Some(batch.id))
        .await?
        .is_some()
    {
        let old_number = batch.batch_number;
        let new_number = batch_repo::max_batch_number(&mut tx, &key).await? + 1;
        batch.batch_number = new_number;
        batch.name = substitute_batch_number(&batch.name, old_number, new_number);
        info!(
            batch_id = batch.id,
            old_number, new_number, "Đánh lại số đợt do trùng khóa"
        );
    }

    let updated = batch_repo::update_metadata(&mut tx, &batch, user.id).await?;
    tx.commit().await?;
    Ok(updated)
}

/// pending → submitted. Requires at least one live declaration; cascades
/// the transition onto them and re-aggregates the total as the final step.
pub async fn submit_batch(pool: &PgPool, user: &AuthUser, batch_id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let batch = batch_repo::lock(&mut tx, batch_id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy đợt kê khai"))?;
    if !batch_status(&batch)?.can_transition_to(BatchStatus::Submitted) {
        return Err(AppError::state(
            "Chỉ có thể nộp đợt kê khai đang chờ xử lý",
        ));
    }
    if batch_repo::count_active_declarations(&mut tx, batch_id).await? == 0 {
        return Err(AppError::state(
            "Đợt kê khai chưa có hồ sơ nào, không thể nộp",
        ));
    }

    batch_repo::set_status(&mut tx, batch_id, BatchStatus::Submitted, user.id).await?;
    batch_repo::cascade_declaration_status(
        &mut tx,
        batch_id,
        DeclarationStatus::Pending,
        DeclarationStatus::Submitted,
    )
    .await?;
    batch_repo::recompute_total(&mut tx, batch_id).await?;
    tx.commit().await?;

    info!(batch_id, "Đã nộp đợt kê khai");
    Ok(())
}

/// submitted → approved.
pub async fn approve_batch(
    pool: &PgPool,
    user: &AuthUser,
    batch_id: i64,
    notes: Option<String>,
) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let batch = batch_repo::lock(&mut tx, batch_id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy đợt kê khai"))?;
    if !batch_status(&batch)?.can_transition_to(BatchStatus::Approved) {
        return Err(AppError::state("Chỉ có thể duyệt đợt kê khai đã nộp"));
    }

    batch_repo::record_approval(&mut tx, batch_id, user.id, notes.as_deref()).await?;
    batch_repo::cascade_declaration_status(
        &mut tx,
        batch_id,
        DeclarationStatus::Submitted,
        DeclarationStatus::Approved,
    )
    .await?;
    tx.commit().await?;

    info!(batch_id, approver = user.id, "Đã duyệt đợt kê khai");
    Ok(())
}

/// submitted → rejected; the note is mandatory.
pub async fn reject_batch(
    pool: &PgPool,
    user: &AuthUser,
    batch_id: i64,
    note: Option<String>,
) -> AppResult<()> {
    let note = note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::state("Vui lòng nhập lý do từ chối"))?;

    let mut tx = pool.begin().await?;

    let batch = batch_repo::lock(&mut tx, batch_id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy đợt kê khai"))?;
    if !batch_status(&batch)?.can_transition_to(BatchStatus::Rejected) {
        return Err(AppError::state("Chỉ có thể từ chối đợt kê khai đã nộp"));
    }

    batch_repo::record_rejection(&mut tx, batch_id, user.id, &note).await?;
    batch_repo::cascade_declaration_status(
        &mut tx,
        batch_id,
        DeclarationStatus::Submitted,
        DeclarationStatus::Rejected,
    )
    .await?;
    tx.commit().await?;

    info!(batch_id, rejecter = user.id, "Đã từ chối đợt kê khai");
    Ok(())
}

/// unpaid → paid, independent of the lifecycle status.
pub async fn confirm_payment(pool: &PgPool, user: &AuthUser, batch_id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let batch = batch_repo::lock(&mut tx, batch_id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy đợt kê khai"))?;
    if payment_status(&batch)? == PaymentStatus::Paid {
        return Err(AppError::state(
            "Đợt kê khai đã được xác nhận thanh toán trước đó",
        ));
    }

    batch_repo::record_payment(&mut tx, batch_id, user.id).await?;
    tx.commit().await?;

    info!(batch_id, payer = user.id, "Đã xác nhận thanh toán");
    Ok(())
}

/// approved AND paid → processing, with distinct messages for the two
/// failed guards.
pub async fn process_batch(pool: &PgPool, user: &AuthUser, batch_id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let batch = batch_repo::lock(&mut tx, batch_id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy đợt kê khai"))?;
    if batch_status(&batch)? != BatchStatus::Approved {
        return Err(AppError::state(
            "Đợt kê khai chưa được duyệt, không thể chuyển xử lý",
        ));
    }
    if payment_status(&batch)? != PaymentStatus::Paid {
        return Err(AppError::state(
            "Đợt kê khai chưa được thanh toán, không thể chuyển xử lý",
        ));
    }

    batch_repo::set_status(&mut tx, batch_id, BatchStatus::Processing, user.id).await?;
    tx.commit().await?;
    Ok(())
}

/// processing → completed.
pub async fn complete_batch(pool: &PgPool, user: &AuthUser, batch_id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let batch = batch_repo::lock(&mut tx, batch_id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy đợt kê khai"))?;
    if !batch_status(&batch)?.can_transition_to(BatchStatus::Completed) {
        return Err(AppError::state(
            "Chỉ có thể hoàn thành đợt kê khai đang xử lý",
        ));
    }

    batch_repo::set_status(&mut tx, batch_id, BatchStatus::Completed, user.id).await?;
    tx.commit().await?;
    Ok(())
}

/// Soft delete. Does not cascade to the batch's declarations.
pub async fn delete_batch(pool: &PgPool, user: &AuthUser, batch_id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    batch_repo::lock(&mut tx, batch_id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy đợt kê khai"))?;
    batch_repo::soft_delete(&mut tx, batch_id, user.id).await?;
    tx.commit().await?;

    info!(batch_id, "Đã xóa đợt kê khai");
    Ok(())
}

pub async fn list_batches(
    pool: &PgPool,
    query: BatchListQuery,
) -> AppResult<Page<DeclarationBatch>> {
    let page = query.page();
    let page_size = query.page_size();
    let (items, total) = batch_repo::list(pool, &query).await?;
    Ok(Page {
        items,
        total,
        page,
        page_size,
    })
}

pub async fn get_batch(pool: &PgPool, batch_id: i64) -> AppResult<BatchDetail> {
    let batch = batch_repo::find_by_id(pool, batch_id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy đợt kê khai"))?;
    let declarations = declaration_repo::list_by_batch(pool, batch_id).await?;
    Ok(BatchDetail {
        batch,
        declarations,
    })
}

/// Bulk reconciliation: recompute every live batch's total from its live
/// declarations. Safe to run repeatedly.
pub async fn reconcile_totals(pool: &PgPool) -> AppResult<usize> {
    let ids = batch_repo::all_live_ids(pool).await?;
    let mut tx = pool.begin().await?;
    for id in &ids {
        batch_repo::recompute_total(&mut tx, *id).await?;
    }
    tx.commit().await?;

    info!(batches = ids.len(), "Đã đối soát tổng tiền các đợt kê khai");
    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_substitute_batch_number_in_name() {
        assert_eq!(
            substitute_batch_number("Đợt 1 - BHYT HGD tháng 1/2024", 1, 3),
            "Đợt 3 - BHYT HGD tháng 1/2024"
        );
        // first occurrence only
        assert_eq!(substitute_batch_number("Đợt 2 lần 2", 2, 5), "Đợt 5 lần 2");
        // untouched when the number does not appear
        assert_eq!(
            substitute_batch_number("Đợt bổ sung", 4, 7),
            "Đợt bổ sung"
        );
    }

    #[test]
    fn test_substitute_skips_longer_numbers() {
        // "11" contains "1" but is not batch number 1
        assert_eq!(
            substitute_batch_number("Đợt 1 tháng 11/2024", 1, 3),
            "Đợt 3 tháng 11/2024"
        );
        assert_eq!(
            substitute_batch_number("Đợt 11 - lần 1", 1, 3),
            "Đợt 11 - lần 3"
        );
        assert_eq!(substitute_batch_number("Đợt 11", 1, 3), "Đợt 11");
    }

    fn pending_batch() -> DeclarationBatch {
        let now = Utc::now();
        DeclarationBatch {
            id: 1,
            object_type: "HGD".to_string(),
            service_type: "BHYT".to_string(),
            month: 1,
            year: 2024,
            batch_number: 1,
            department_code: "D1".to_string(),
            name: "Đợt 1 - BHYT HGD".to_string(),
            notes: None,
            status: BatchStatus::Pending.as_str().to_string(),
            payment_status: PaymentStatus::Unpaid.as_str().to_string(),
            total_declarations: 0,
            total_amount: 0,
            bill_image: None,
            approval_notes: None,
            rejection_notes: None,
            created_by: Some(1),
            updated_by: None,
            approved_by: None,
            rejected_by: None,
            payment_confirmed_by: None,
            approved_at: None,
            rejected_at: None,
            payment_confirmed_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn test_batch_update_merges_and_keeps_rest() {
        let mut batch = pending_batch();
        let update = BatchUpdateInput {
            month: Some(2),
            name: Some("Đợt 1 - BHYT HGD tháng 2".to_string()),
            ..Default::default()
        };
        apply_batch_update(&mut batch, update).unwrap();
        assert_eq!(batch.month, 2);
        assert_eq!(batch.year, 2024);
        assert_eq!(batch.object_type, "HGD");
    }

    #[test]
    fn test_batch_update_rejects_invalid_month() {
        let mut batch = pending_batch();
        let update = BatchUpdateInput {
            month: Some(13),
            ..Default::default()
        };
        let err = apply_batch_update(&mut batch, update).unwrap_err();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "month"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_batch_update_rejects_unknown_object_type() {
        let mut batch = pending_batch();
        let update = BatchUpdateInput {
            object_type: Some("XYZ".to_string()),
            ..Default::default()
        };
        assert!(apply_batch_update(&mut batch, update).is_err());
    }
}
