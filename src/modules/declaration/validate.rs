//! Field validation for declaration input.
//!
//! Failures name the offending field so the client can highlight it.

use crate::error::{AppError, AppResult};
use crate::modules::declaration::models::batch::OBJECT_TYPES;
use crate::modules::declaration::models::{BatchInput, DeclarationInput};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BHXH_CODE_RE: Regex = Regex::new(r"^\d{10}$").unwrap();
    static ref CCCD_RE: Regex = Regex::new(r"^\d{12}$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\d{10}$").unwrap();
}

/// Allowed enrollment durations (months).
pub const ALLOWED_MONTHS: &[i32] = &[3, 6, 12];

fn require(field: &str, value: &str, label: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(
            field,
            format!("Thiếu thông tin bắt buộc: {}", label),
        ));
    }
    Ok(())
}

/// Standalone BHXH-code check, also used by lookups that take the code as
/// a path parameter.
pub fn validate_bhxh_code(bhxh_code: &str) -> AppResult<()> {
    if !BHXH_CODE_RE.is_match(bhxh_code) {
        return Err(AppError::validation(
            "bhxh_code",
            "Mã số BHXH phải gồm đúng 10 chữ số",
        ));
    }
    Ok(())
}

pub fn validate_declaration_input(input: &DeclarationInput) -> AppResult<()> {
    require("full_name", &input.full_name, "họ và tên")?;
    require("gender", &input.gender, "giới tính")?;
    require("object_type", &input.object_type, "đối tượng tham gia")?;

    validate_bhxh_code(&input.bhxh_code)?;
    if !CCCD_RE.is_match(&input.cccd) {
        return Err(AppError::validation(
            "cccd",
            "Số CCCD phải gồm đúng 12 chữ số",
        ));
    }
    if !PHONE_RE.is_match(&input.phone_number) {
        return Err(AppError::validation(
            "phone_number",
            "Số điện thoại phải gồm đúng 10 chữ số",
        ));
    }
    if !ALLOWED_MONTHS.contains(&input.months) {
        return Err(AppError::validation(
            "months",
            "Số tháng đóng phải là 3, 6 hoặc 12",
        ));
    }
    if input.participant_number < 1 {
        return Err(AppError::validation(
            "participant_number",
            "Số thứ tự người tham gia phải lớn hơn 0",
        ));
    }
    if input.is_edit && input.original_bhxh_code.is_none() {
        return Err(AppError::validation(
            "original_bhxh_code",
            "Thiếu mã số BHXH gốc khi chỉnh sửa",
        ));
    }

    Ok(())
}

pub fn validate_batch_input(input: &BatchInput) -> AppResult<()> {
    require("name", &input.name, "tên đợt kê khai")?;
    require("service_type", &input.service_type, "loại dịch vụ")?;

    if !OBJECT_TYPES.contains(&input.object_type.as_str()) {
        return Err(AppError::validation(
            "object_type",
            "Đối tượng tham gia không hợp lệ (HGD, DTTS, NLN)",
        ));
    }
    if !(1..=12).contains(&input.month) {
        return Err(AppError::validation("month", "Tháng phải từ 1 đến 12"));
    }
    if input.year < 2000 {
        return Err(AppError::validation("year", "Năm không hợp lệ"));
    }
    if input.batch_number < 1 {
        return Err(AppError::validation(
            "batch_number",
            "Số đợt phải lớn hơn 0",
        ));
    }

    Ok(())
}

/// Identity-change detection for the upsert decision table: the edit path
/// inserts a new record exactly when the BHXH code differs from the
/// original.
pub fn bhxh_code_changed(original: Option<&str>, new_code: &str) -> bool {
    match original {
        Some(original) => original != new_code,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn valid_input() -> DeclarationInput {
        DeclarationInput {
            object_type: "HGD".to_string(),
            bhxh_code: "1234567890".to_string(),
            full_name: "Nguyễn Văn A".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
            gender: "nam".to_string(),
            cccd: "123456789012".to_string(),
            phone_number: "0912345678".to_string(),
            receipt_date: None,
            receipt_number: None,
            old_card_expiry_date: None,
            new_card_effective_date: None,
            months: 12,
            plan: None,
            commune: None,
            hamlet: None,
            participant_number: 1,
            hospital_code: None,
            is_edit: false,
            original_bhxh_code: None,
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(validate_declaration_input(&valid_input()).is_ok());
    }

    #[test]
    fn test_malformed_bhxh_code_names_field() {
        let mut input = valid_input();
        input.bhxh_code = "12345".to_string();
        let err = validate_declaration_input(&input).unwrap_err();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "bhxh_code"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_cccd_and_phone() {
        let mut input = valid_input();
        input.cccd = "abc".to_string();
        assert!(validate_declaration_input(&input).is_err());

        let mut input = valid_input();
        input.phone_number = "09123456789".to_string(); // 11 digits
        assert!(validate_declaration_input(&input).is_err());
    }

    #[test]
    fn test_months_must_be_enumerated() {
        let mut input = valid_input();
        input.months = 9;
        let err = validate_declaration_input(&input).unwrap_err();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "months"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_field() {
        let mut input = valid_input();
        input.full_name = "  ".to_string();
        let err = validate_declaration_input(&input).unwrap_err();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "full_name"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_edit_requires_original_code() {
        let mut input = valid_input();
        input.is_edit = true;
        assert!(validate_declaration_input(&input).is_err());
        input.original_bhxh_code = Some("1234567890".to_string());
        assert!(validate_declaration_input(&input).is_ok());
    }

    #[test]
    fn test_identity_change_detection() {
        assert!(bhxh_code_changed(Some("1234567890"), "0987654321"));
        assert!(!bhxh_code_changed(Some("1234567890"), "1234567890"));
        assert!(!bhxh_code_changed(None, "1234567890"));
    }

    #[test]
    fn test_batch_input_rules() {
        let input = BatchInput {
            object_type: "HGD".to_string(),
            service_type: "BHYT".to_string(),
            month: 1,
            year: 2024,
            batch_number: 1,
            name: "Đợt 1 - BHYT HGD".to_string(),
            notes: None,
        };
        assert!(validate_batch_input(&input).is_ok());

        let mut bad = input.clone();
        bad.month = 13;
        assert!(validate_batch_input(&bad).is_err());

        let mut bad = input.clone();
        bad.object_type = "OTHER".to_string();
        assert!(validate_batch_input(&bad).is_err());

        let mut bad = input;
        bad.batch_number = 0;
        assert!(validate_batch_input(&bad).is_err());
    }
}
