//! Declaration lifecycle manager.
//!
//! The upsert takes an advisory lock on the BHXH code and a `FOR UPDATE`
//! lock on the parent batch before any read-then-write duplicate check, so
//! concurrent submissions of the same code serialize instead of racing.

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::modules::declaration::amount::calculate_actual_amount;
use crate::modules::declaration::models::declaration::{
    Declaration, DeclarationHistory, DeclarationInput, PendingDuplicate,
};
use crate::modules::declaration::models::status::BatchStatus;
use crate::modules::declaration::repo::declaration_repo::SearchFilter;
use crate::modules::declaration::repo::{batch_repo, declaration_repo};
use crate::modules::declaration::validate::{
    bhxh_code_changed, validate_bhxh_code, validate_declaration_input,
};
use sqlx::PgPool;
use tracing::info;

/// How an upsert mutates the batch's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    /// New record: counted as a new participant.
    Insert,
    /// Edit that changed the BHXH code: the old record is retired and a
    /// replacement inserted, so exactly one row per code stays live. The
    /// participant count is unchanged.
    SupersedeAndInsert,
    /// Edit keeping the code: the existing record is updated in place.
    UpdateInPlace,
}

/// Classify the request: an edit replaces its record exactly when the BHXH
/// code differs from the original.
pub fn upsert_action(
    is_edit: bool,
    original_bhxh_code: Option<&str>,
    bhxh_code: &str,
) -> UpsertAction {
    if !is_edit {
        UpsertAction::Insert
    } else if bhxh_code_changed(original_bhxh_code, bhxh_code) {
        UpsertAction::SupersedeAndInsert
    } else {
        UpsertAction::UpdateInPlace
    }
}

fn duplicate_error(code: &str, dup: &PendingDuplicate) -> AppError {
    AppError::duplicate(format!(
        "Mã số BHXH {} đã được kê khai cho {} trong đợt '{}' (tháng {}/{})",
        code, dup.full_name, dup.batch_name, dup.month, dup.year
    ))
}

/// Create or edit one declaration inside its batch.
pub async fn upsert_declaration(
    pool: &PgPool,
    user: &AuthUser,
    batch_id: i64,
    input: DeclarationInput,
) -> AppResult<Declaration> {
    validate_declaration_input(&input)?;

    let mut tx = pool.begin().await?;

    declaration_repo::advisory_lock_code(&mut tx, &input.bhxh_code).await?;

    let batch = batch_repo::lock(&mut tx, batch_id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy đợt kê khai"))?;
    if batch.status != BatchStatus::Pending.as_str() {
        return Err(AppError::state(
            "Đợt kê khai đã đóng, không thể thêm hoặc chỉnh sửa hồ sơ",
        ));
    }

    let action = upsert_action(
        input.is_edit,
        input.original_bhxh_code.as_deref(),
        &input.bhxh_code,
    );

    match action {
        UpsertAction::Insert => {
            // Create path: the code must not be pending anywhere in the
            // system.
            if let Some(dup) =
                declaration_repo::find_pending_duplicate_global(&mut tx, &input.bhxh_code).await?
            {
                return Err(duplicate_error(&input.bhxh_code, &dup));
            }
        }
        UpsertAction::SupersedeAndInsert => {
            // Edit with a new identity: the new code must be free within
            // the batch.
            if let Some(dup) =
                declaration_repo::find_duplicate_in_batch(&mut tx, batch_id, &input.bhxh_code)
                    .await?
            {
                return Err(duplicate_error(&input.bhxh_code, &dup));
            }
            // Retire the old record before the CCCD check: the same person
            // keeps their CCCD across the correction, so their own retired
            // row must not count as a conflict for the replacement.
            let original = input.original_bhxh_code.as_deref().ok_or_else(|| {
                AppError::validation("original_bhxh_code", "Thiếu mã số BHXH gốc khi chỉnh sửa")
            })?;
            if declaration_repo::soft_delete_by_code(&mut tx, batch_id, original).await? == 0 {
                return Err(AppError::not_found(
                    "Không tìm thấy hồ sơ cần chỉnh sửa trong đợt kê khai",
                ));
            }
        }
        UpsertAction::UpdateInPlace => {}
    }

    if let Some(existing_name) =
        declaration_repo::find_cccd_conflict(&mut tx, batch_id, &input.cccd, &input.bhxh_code)
            .await?
    {
        return Err(AppError::duplicate(format!(
            "Số CCCD {} đã được sử dụng cho người tham gia {} với mã số BHXH khác trong đợt này",
            input.cccd, existing_name
        )));
    }

    let amount = calculate_actual_amount(&input.object_type, input.participant_number, input.months);

    let declaration = match action {
        UpsertAction::Insert => {
            let declaration =
                declaration_repo::insert(&mut tx, batch_id, &input, amount, user.id).await?;
            batch_repo::adjust_declaration_count(&mut tx, batch_id, 1).await?;
            declaration
        }
        // One row retired, one inserted: the count stays put.
        UpsertAction::SupersedeAndInsert => {
            declaration_repo::insert(&mut tx, batch_id, &input, amount, user.id).await?
        }
        UpsertAction::UpdateInPlace => {
            declaration_repo::update_by_code(&mut tx, batch_id, &input.bhxh_code, &input, amount)
                .await?
                .ok_or_else(|| {
                    AppError::not_found("Không tìm thấy hồ sơ cần chỉnh sửa trong đợt kê khai")
                })?
        }
    };

    batch_repo::recompute_total(&mut tx, batch_id).await?;
    tx.commit().await?;

    info!(
        declaration_id = declaration.id,
        batch_id, "Đã lưu hồ sơ kê khai"
    );
    Ok(declaration)
}

/// Mark a declaration deleted and restore the batch bookkeeping.
pub async fn delete_declaration(pool: &PgPool, _user: &AuthUser, id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let declaration = declaration_repo::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy hồ sơ kê khai"))?;

    // Lock the parent before mutating; a soft-deleted parent no longer
    // needs its bookkeeping maintained.
    let batch = batch_repo::lock(&mut tx, declaration.batch_id).await?;
    declaration_repo::soft_delete(&mut tx, id).await?;
    if batch.is_some() {
        batch_repo::adjust_declaration_count(&mut tx, declaration.batch_id, -1).await?;
        batch_repo::recompute_total(&mut tx, declaration.batch_id).await?;
    }
    tx.commit().await?;

    info!(declaration_id = id, "Đã xóa hồ sơ kê khai");
    Ok(())
}

/// Owner-gated variant: only the creator may delete, and only while the
/// parent batch is still pending.
pub async fn delete_own_declaration(pool: &PgPool, user: &AuthUser, id: i64) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let declaration = declaration_repo::find_by_id(&mut tx, id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy hồ sơ kê khai"))?;
    if declaration.created_by != Some(user.id) {
        return Err(AppError::permission("Bạn không có quyền xóa hồ sơ này"));
    }

    let batch = batch_repo::lock(&mut tx, declaration.batch_id)
        .await?
        .ok_or_else(|| AppError::not_found("Không tìm thấy đợt kê khai"))?;
    if batch.status != BatchStatus::Pending.as_str() {
        return Err(AppError::state(
            "Chỉ có thể xóa hồ sơ khi đợt kê khai đang chờ xử lý",
        ));
    }

    declaration_repo::soft_delete(&mut tx, id).await?;
    batch_repo::adjust_declaration_count(&mut tx, declaration.batch_id, -1).await?;
    batch_repo::recompute_total(&mut tx, declaration.batch_id).await?;
    tx.commit().await?;

    Ok(())
}

/// Multi-field lookup returning the last-known record per BHXH code.
pub async fn search_declarations(
    pool: &PgPool,
    filter: SearchFilter,
) -> AppResult<Vec<Declaration>> {
    if filter.is_empty() {
        return Err(AppError::validation(
            "filter",
            "Cần ít nhất một tiêu chí tìm kiếm (mã số BHXH, họ tên, CCCD hoặc số điện thoại)",
        ));
    }
    Ok(declaration_repo::search(pool, &filter).await?)
}

/// Enrollment history of one BHXH code across batches.
pub async fn declaration_history(
    pool: &PgPool,
    bhxh_code: &str,
) -> AppResult<Vec<DeclarationHistory>> {
    validate_bhxh_code(bhxh_code)?;
    Ok(declaration_repo::history(pool, bhxh_code).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_is_classified_as_insert() {
        assert_eq!(upsert_action(false, None, "1234567890"), UpsertAction::Insert);
        // original code is ignored outside the edit path
        assert_eq!(
            upsert_action(false, Some("0987654321"), "1234567890"),
            UpsertAction::Insert
        );
    }

    #[test]
    fn test_edit_with_changed_code_supersedes_old_record() {
        assert_eq!(
            upsert_action(true, Some("1234567890"), "0987654321"),
            UpsertAction::SupersedeAndInsert
        );
    }

    #[test]
    fn test_edit_keeping_code_updates_in_place() {
        assert_eq!(
            upsert_action(true, Some("1234567890"), "1234567890"),
            UpsertAction::UpdateInPlace
        );
        // no original code means no identity change
        assert_eq!(
            upsert_action(true, None, "1234567890"),
            UpsertAction::UpdateInPlace
        );
    }
}
