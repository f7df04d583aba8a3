//! HTTP handlers for individual declaration records.

use crate::auth::AuthUser;
use crate::db;
use crate::error::AppResult;
use crate::modules::declaration::models::declaration::{
    Declaration, DeclarationHistory, DeclarationInput,
};
use crate::modules::declaration::repo::declaration_repo::SearchFilter;
use crate::modules::declaration::service::declaration_service;
use crate::response::ApiResponse;
use actix_web::web;

#[actix_web::post("/api/declaration/batches/{batch_id}/declarations")]
pub async fn upsert_declaration(
    user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<DeclarationInput>,
) -> AppResult<web::Json<ApiResponse<Declaration>>> {
    let pool = db::get_pool()?;
    let declaration =
        declaration_service::upsert_declaration(pool, &user, path.into_inner(), body.into_inner())
            .await?;
    Ok(ApiResponse::ok("Lưu hồ sơ kê khai thành công", declaration))
}

#[actix_web::delete("/api/declaration/declarations/{id}")]
pub async fn delete_declaration(
    user: AuthUser,
    path: web::Path<i64>,
) -> AppResult<web::Json<ApiResponse<()>>> {
    user.require_admin()?;
    let pool = db::get_pool()?;
    declaration_service::delete_declaration(pool, &user, path.into_inner()).await?;
    Ok(ApiResponse::ok_message("Xóa hồ sơ kê khai thành công"))
}

#[actix_web::delete("/api/declaration/declarations/{id}/own")]
pub async fn delete_own_declaration(
    user: AuthUser,
    path: web::Path<i64>,
) -> AppResult<web::Json<ApiResponse<()>>> {
    let pool = db::get_pool()?;
    declaration_service::delete_own_declaration(pool, &user, path.into_inner()).await?;
    Ok(ApiResponse::ok_message("Xóa hồ sơ kê khai thành công"))
}

#[actix_web::get("/api/declaration/declarations/search")]
pub async fn search_declarations(
    _user: AuthUser,
    query: web::Query<SearchFilter>,
) -> AppResult<web::Json<ApiResponse<Vec<Declaration>>>> {
    let pool = db::get_pool()?;
    let results = declaration_service::search_declarations(pool, query.into_inner()).await?;
    Ok(ApiResponse::ok("Tìm kiếm hồ sơ thành công", results))
}

#[actix_web::get("/api/declaration/declarations/history/{bhxh_code}")]
pub async fn declaration_history(
    _user: AuthUser,
    path: web::Path<String>,
) -> AppResult<web::Json<ApiResponse<Vec<DeclarationHistory>>>> {
    let pool = db::get_pool()?;
    let history = declaration_service::declaration_history(pool, &path.into_inner()).await?;
    Ok(ApiResponse::ok("Lấy lịch sử kê khai thành công", history))
}
