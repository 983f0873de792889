use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::company::{Company, CompanyUpdate, NewCompany};
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterCompanyRequest {
    pub company_name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCompanyRequest {
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
}

#[derive(Serialize)]
pub struct CompanyCheckResponse {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

fn company_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("company_name is required".into()));
    }
    Ok(name.to_string())
}

/// Blank optional strings are stored as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /api/company/register
pub async fn handle_register(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RegisterCompanyRequest>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    auth.require(Role::Recruiter)?;
    let name = company_name(&req.company_name)?;

    if state.repo.find_company_by_owner(auth.id).await?.is_some() {
        return Err(AppError::Conflict(
            "You have already registered a company".into(),
        ));
    }

    let company = state
        .repo
        .insert_company(NewCompany {
            owner_id: auth.id,
            name,
            logo: non_blank(req.logo),
            description: non_blank(req.description),
            website: non_blank(req.website),
        })
        .await?;

    info!(company_id = %company.id, owner_id = %auth.id, "Company registered");
    Ok((StatusCode::CREATED, Json(company)))
}

/// GET /api/company/check
pub async fn handle_check(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<CompanyCheckResponse>, AppError> {
    auth.require(Role::Recruiter)?;
    let company = state.repo.find_company_by_owner(auth.id).await?;
    Ok(Json(CompanyCheckResponse {
        exists: company.is_some(),
        company,
    }))
}

/// GET /api/company
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<Company>>, AppError> {
    Ok(Json(state.repo.list_companies().await?))
}

/// GET /api/company/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, AppError> {
    let company = state
        .repo
        .find_company(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))?;
    Ok(Json(company))
}

/// PUT /api/company/:id
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCompanyRequest>,
) -> Result<Json<Company>, AppError> {
    auth.require(Role::Recruiter)?;
    let company = state
        .repo
        .find_company(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))?;
    if company.owner_id != auth.id {
        return Err(AppError::Forbidden(
            "You can only update your own company".into(),
        ));
    }

    let update = CompanyUpdate {
        name: req.company_name.as_deref().map(company_name).transpose()?,
        logo: non_blank(req.logo),
        description: non_blank(req.description),
        website: non_blank(req.website),
    };
    let updated = state.repo.update_company(id, update).await?;

    info!(company_id = %id, "Company updated");
    Ok(Json(updated))
}
