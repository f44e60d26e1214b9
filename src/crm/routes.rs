use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::crm::error::CrmError;
use crate::crm::models::{
    Company, CompanyActivity, CompanyChanges, CompanyContact, CompanyCreated, CompanyDetail,
    CompanyNote, CompanyStatus, CompanyWithContacts, ContactChanges, DashboardStats, NewCompany,
    NewContact,
};
use crate::shared::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub company: NewCompany,
    pub contact: NewContact,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub company_status: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub note_text: String,
    pub created_by_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub activity_type: String,
    pub activity_notes: String,
    pub created_by_name: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

fn reject(err: CrmError) -> (StatusCode, String) {
    err.into()
}

pub async fn create_company(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<CompanyCreated>), (StatusCode, String)> {
    let (company, contact) = state
        .store
        .create_company(req.company, req.contact)
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(CompanyCreated { company, contact })))
}

/// Lists companies either by exact status or by a name/industry search term.
pub async fn list_companies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<CompanyWithContacts>>, (StatusCode, String)> {
    if let Some(term) = query.search {
        return state.store.search_companies(&term).map(Json).map_err(reject);
    }
    let status = query.status.ok_or_else(|| {
        reject(CrmError::validation(
            "Either status or search query parameter is required",
        ))
    })?;
    let status = CompanyStatus::from_str(&status).map_err(reject)?;
    state.store.companies_by_status(status).map(Json).map_err(reject)
}

pub async fn get_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyDetail>, (StatusCode, String)> {
    state.store.company_by_id(id).map(Json).map_err(reject)
}

pub async fn update_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(changes): Json<CompanyChanges>,
) -> Result<Json<Company>, (StatusCode, String)> {
    state.store.update_company(id, changes).map(Json).map_err(reject)
}

pub async fn change_company_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<Company>, (StatusCode, String)> {
    let status = CompanyStatus::from_str(&req.company_status).map_err(reject)?;
    state
        .store
        .update_company_status(id, status)
        .map(Json)
        .map_err(reject)
}

pub async fn delete_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, (StatusCode, String)> {
    state.store.delete_company(id).map(Json).map_err(reject)
}

pub async fn get_dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, (StatusCode, String)> {
    state.store.dashboard_stats().map(Json).map_err(reject)
}

pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    Json(contact): Json<NewContact>,
) -> Result<(StatusCode, Json<CompanyContact>), (StatusCode, String)> {
    let contact = state.store.add_contact(contact).map_err(reject)?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(changes): Json<ContactChanges>,
) -> Result<Json<CompanyContact>, (StatusCode, String)> {
    state.store.update_contact(id, changes).map(Json).map_err(reject)
}

pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CompanyNote>>, (StatusCode, String)> {
    state.store.notes(id).map(Json).map_err(reject)
}

pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<CompanyNote>), (StatusCode, String)> {
    let note = state
        .store
        .add_note(id, req.note_text, req.created_by_name)
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CompanyActivity>>, (StatusCode, String)> {
    state.store.activities(id).map(Json).map_err(reject)
}

pub async fn create_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<CompanyActivity>), (StatusCode, String)> {
    let activity = state
        .store
        .add_activity(
            id,
            req.activity_type,
            req.activity_notes,
            req.created_by_name,
            req.follow_up_date,
        )
        .map_err(reject)?;
    Ok((StatusCode::CREATED, Json(activity)))
}

pub fn configure_crm_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/crm/companies", get(list_companies).post(create_company))
        .route(
            "/api/crm/companies/:id",
            get(get_company).put(update_company).delete(delete_company),
        )
        .route("/api/crm/companies/:id/status", post(change_company_status))
        .route(
            "/api/crm/companies/:id/notes",
            get(list_notes).post(create_note),
        )
        .route(
            "/api/crm/companies/:id/activities",
            get(list_activities).post(create_activity),
        )
        .route("/api/crm/contacts", post(create_contact))
        .route("/api/crm/contacts/:id", put(update_contact))
        .route("/api/crm/stats", get(get_dashboard_stats))
}
