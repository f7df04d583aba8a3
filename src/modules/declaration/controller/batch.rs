//! HTTP handlers for the batch lifecycle.
//!
//! Handlers stay thin: extract identity, hand off to the service, wrap the
//! result in the response envelope. Review operations (approve, reject,
//! process, complete) are reserved for administrators.

use crate::auth::AuthUser;
use crate::db;
use crate::error::AppResult;
use crate::modules::declaration::models::batch::{
    BatchInput, BatchListQuery, BatchUpdateInput, DeclarationBatch,
};
use crate::modules::declaration::service::batch_service::{self, BatchDetail, Page};
use crate::response::ApiResponse;
use actix_web::web;
use serde::Deserialize;

/// Optional reviewer note carried by approve/reject bodies.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewBody {
    pub notes: Option<String>,
}

#[actix_web::post("/api/declaration/batches")]
pub async fn create_batch(
    user: AuthUser,
    body: web::Json<BatchInput>,
) -> AppResult<web::Json<ApiResponse<DeclarationBatch>>> {
    let pool = db::get_pool()?;
    let batch = batch_service::create_batch(pool, &user, body.into_inner()).await?;
    Ok(ApiResponse::ok("Tạo đợt kê khai thành công", batch))
}

#[actix_web::get("/api/declaration/batches")]
pub async fn list_batches(
    _user: AuthUser,
    query: web::Query<BatchListQuery>,
) -> AppResult<web::Json<ApiResponse<Page<DeclarationBatch>>>> {
    let pool = db::get_pool()?;
    let page = batch_service::list_batches(pool, query.into_inner()).await?;
    Ok(ApiResponse::ok("Lấy danh sách đợt kê khai thành công", page))
}

#[actix_web::get("/api/declaration/batches/{id}")]
pub async fn get_batch(
    _user: AuthUser,
    path: web::Path<i64>,
) -> AppResult<web::Json<ApiResponse<BatchDetail>>> {
    let pool = db::get_pool()?;
    let detail = batch_service::get_batch(pool, path.into_inner()).await?;
    Ok(ApiResponse::ok("Lấy chi tiết đợt kê khai thành công", detail))
}

#[actix_web::put("/api/declaration/batches/{id}")]
pub async fn update_batch(
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<BatchUpdateInput>,
) -> AppResult<web::Json<ApiResponse<DeclarationBatch>>> {
    let pool = db::get_pool()?;
    let batch =
        batch_service::update_batch(pool, &user, path.into_inner(), body.into_inner()).await?;
    Ok(ApiResponse::ok("Cập nhật đợt kê khai thành công", batch))
}

#[actix_web::delete("/api/declaration/batches/{id}")]
pub async fn delete_batch(
    user: AuthUser,
    path: web::Path<i64>,
) -> AppResult<web::Json<ApiResponse<()>>> {
    let pool = db::get_pool()?;
    batch_service::delete_batch(pool, &user, path.into_inner()).await?;
    Ok(ApiResponse::ok_message("Xóa đợt kê khai thành công"))
}

#[actix_web::post("/api/declaration/batches/{id}/submit")]
pub async fn submit_batch(
    user: AuthUser,
    path: web::Path<i64>,
) -> AppResult<web::Json<ApiResponse<()>>> {
    let pool = db::get_pool()?;
    batch_service::submit_batch(pool, &user, path.into_inner()).await?;
    Ok(ApiResponse::ok_message("Nộp đợt kê khai thành công"))
}

#[actix_web::post("/api/declaration/batches/{id}/approve")]
pub async fn approve_batch(
    user: AuthUser,
    path: web::Path<i64>,
    body: Option<web::Json<ReviewBody>>,
) -> AppResult<web::Json<ApiResponse<()>>> {
    user.require_admin()?;
    let pool = db::get_pool()?;
    let notes = body.map(web::Json::into_inner).and_then(|b| b.notes);
    batch_service::approve_batch(pool, &user, path.into_inner(), notes).await?;
    Ok(ApiResponse::ok_message("Duyệt đợt kê khai thành công"))
}

#[actix_web::post("/api/declaration/batches/{id}/reject")]
pub async fn reject_batch(
    user: AuthUser,
    path: web::Path<i64>,
    body: Option<web::Json<ReviewBody>>,
) -> AppResult<web::Json<ApiResponse<()>>> {
    user.require_admin()?;
    let pool = db::get_pool()?;
    let notes = body.map(web::Json::into_inner).and_then(|b| b.notes);
    batch_service::reject_batch(pool, &user, path.into_inner(), notes).await?;
    Ok(ApiResponse::ok_message("Từ chối đợt kê khai thành công"))
}

#[actix_web::post("/api/declaration/batches/{id}/payment")]
pub async fn confirm_payment(
    user: AuthUser,
    path: web::Path<i64>,
) -> AppResult<web::Json<ApiResponse<()>>> {
    user.require_admin()?;
    let pool = db::get_pool()?;
    batch_service::confirm_payment(pool, &user, path.into_inner()).await?;
    Ok(ApiResponse::ok_message("Xác nhận thanh toán thành công"))
}

#[actix_web::post("/api/declaration/batches/{id}/process")]
pub async fn process_batch(
    user: AuthUser,
    path: web::Path<i64>,
) -> AppResult<web::Json<ApiResponse<()>>> {
    user.require_admin()?;
    let pool = db::get_pool()?;
    batch_service::process_batch(pool, &user, path.into_inner()).await?;
    Ok(ApiResponse::ok_message("Chuyển đợt kê khai sang xử lý"))
}

#[actix_web::post("/api/declaration/batches/{id}/complete")]
pub async fn complete_batch(
    user: AuthUser,
    path: web::Path<i64>,
) -> AppResult<web::Json<ApiResponse<()>>> {
    user.require_admin()?;
    let pool = db::get_pool()?;
    batch_service::complete_batch(pool, &user, path.into_inner()).await?;
    Ok(ApiResponse::ok_message("Hoàn thành đợt kê khai"))
}
