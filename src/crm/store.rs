use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use log::error;
use std::collections::HashMap;
use uuid::Uuid;

use crate::crm::error::CrmError;
use crate::crm::models::{
    Company, CompanyActivity, CompanyChanges, CompanyContact, CompanyDetail, CompanyNote,
    CompanyStatus, CompanyWithContacts, ContactChanges, DashboardStats, NewCompany, NewContact,
};
use crate::shared::schema::{companies, company_activities, company_contacts, company_notes};
use crate::shared::utils::DbPool;

const DEFAULT_AUTHOR: &str = "User";

type PooledPgConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Repository for the company aggregate and its related records. Owns no
/// global state; the pool is injected at construction.
#[derive(Clone)]
pub struct CompanyStore {
    conn: DbPool,
}

impl CompanyStore {
    pub fn new(conn: DbPool) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> Result<PooledPgConnection, CrmError> {
        self.conn.get().map_err(|e| {
            error!("Failed to check out database connection: {e}");
            CrmError::Pool(e)
        })
    }

    fn require_company(conn: &mut PgConnection, id: Uuid) -> Result<(), CrmError> {
        let found: Option<Uuid> = companies::table
            .filter(companies::company_id.eq(id))
            .select(companies::company_id)
            .first(conn)
            .optional()?;
        match found {
            Some(_) => Ok(()),
            None => Err(CrmError::NotFound("company", id)),
        }
    }

    /// Creates a company together with its primary contact in one transaction.
    /// The contact is always stored with `is_primary_contact = true`.
    pub fn create_company(
        &self,
        company: NewCompany,
        contact: NewContact,
    ) -> Result<(Company, CompanyContact), CrmError> {
        company.validate()?;
        contact.validate()?;

        let mut conn = self.get_conn()?;
        let now = Utc::now();
        let status = company
            .company_status
            .unwrap_or_else(|| CompanyStatus::Lead.as_str().to_string());

        let company_row = Company {
            company_id: Uuid::new_v4(),
            company_name: company.company_name,
            industry: company.industry,
            company_size: company.company_size,
            annual_revenue: company.annual_revenue,
            company_website: company.company_website,
            street_number: company.street_number,
            street_name: company.street_name,
            apt_suite: company.apt_suite,
            city: company.city,
            state: company.state,
            zip_code: company.zip_code,
            company_status: status,
            lead_source: company.lead_source,
            lead_score: company.lead_score,
            expected_close_date: company.expected_close_date,
            staffing_needs_overview: company.staffing_needs_overview,
            immediate_positions: company.immediate_positions,
            annual_positions: company.annual_positions,
            opportunity_value: company.opportunity_value,
            position_names: company.position_names,
            position_type: company.position_type,
            additional_staffing_details: company.additional_staffing_details,
            created_date: now,
            updated_date: now,
        };

        let contact_row = CompanyContact {
            contact_id: Uuid::new_v4(),
            company_id: company_row.company_id,
            contact_first_name: contact.contact_first_name,
            contact_last_name: contact.contact_last_name,
            contact_job_title: contact.contact_job_title,
            contact_email: contact.contact_email,
            contact_phone: contact.contact_phone,
            contact_mobile: contact.contact_mobile,
            preferred_contact_method: contact.preferred_contact_method,
            is_primary_contact: true,
            is_decision_maker: contact.is_decision_maker.unwrap_or(false),
            is_active_contact: contact.is_active_contact.unwrap_or(true),
            created_date: now,
            updated_date: now,
        };

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::insert_into(companies::table)
                .values(&company_row)
                .execute(conn)?;
            diesel::insert_into(company_contacts::table)
                .values(&contact_row)
                .execute(conn)?;
            Ok(())
        })
        .map_err(|e| {
            error!("Failed to create company: {e}");
            CrmError::Persistence(e)
        })?;

        Ok((company_row, contact_row))
    }

    /// Companies with the given status, newest first, each with its contacts.
    pub fn companies_by_status(
        &self,
        status: CompanyStatus,
    ) -> Result<Vec<CompanyWithContacts>, CrmError> {
        let mut conn = self.get_conn()?;
        let rows: Vec<Company> = companies::table
            .filter(companies::company_status.eq(status.as_str()))
            .order(companies::created_date.desc())
            .load(&mut conn)?;
        Self::attach_contacts(&mut conn, rows)
    }

    /// Case-insensitive substring search over company name and industry.
    pub fn search_companies(&self, term: &str) -> Result<Vec<CompanyWithContacts>, CrmError> {
        let mut conn = self.get_conn()?;
        let pattern = format!("%{term}%");
        let rows: Vec<Company> = companies::table
            .filter(
                companies::company_name
                    .ilike(pattern.clone())
                    .or(companies::industry.ilike(pattern)),
            )
            .order(companies::created_date.desc())
            .load(&mut conn)?;
        Self::attach_contacts(&mut conn, rows)
    }

    fn attach_contacts(
        conn: &mut PgConnection,
        rows: Vec<Company>,
    ) -> Result<Vec<CompanyWithContacts>, CrmError> {
        let ids: Vec<Uuid> = rows.iter().map(|c| c.company_id).collect();
        let contacts: Vec<CompanyContact> = company_contacts::table
            .filter(company_contacts::company_id.eq_any(&ids))
            .load(conn)?;

        let mut by_company: HashMap<Uuid, Vec<CompanyContact>> = HashMap::new();
        for contact in contacts {
            by_company.entry(contact.company_id).or_default().push(contact);
        }

        Ok(rows
            .into_iter()
            .map(|company| {
                let contacts = by_company.remove(&company.company_id).unwrap_or_default();
                CompanyWithContacts { company, contacts }
            })
            .collect())
    }

    /// Full aggregate for one company: contacts, notes, and activities, the
    /// latter two newest first.
    pub fn company_by_id(&self, id: Uuid) -> Result<CompanyDetail, CrmError> {
        let mut conn = self.get_conn()?;
        let company: Company = companies::table
            .filter(companies::company_id.eq(id))
            .first(&mut conn)
            .optional()?
            .ok_or(CrmError::NotFound("company", id))?;

        let contacts: Vec<CompanyContact> = company_contacts::table
            .filter(company_contacts::company_id.eq(id))
            .load(&mut conn)?;
        let notes: Vec<CompanyNote> = company_notes::table
            .filter(company_notes::company_id.eq(id))
            .order(company_notes::created_date.desc())
            .load(&mut conn)?;
        let activities: Vec<CompanyActivity> = company_activities::table
            .filter(company_activities::company_id.eq(id))
            .order(company_activities::created_date.desc())
            .load(&mut conn)?;

        Ok(CompanyDetail {
            company,
            contacts,
            notes,
            activities,
        })
    }

    /// Sets a new status. Any status may follow any other; there is no
    /// transition graph.
    pub fn update_company_status(
        &self,
        id: Uuid,
        status: CompanyStatus,
    ) -> Result<Company, CrmError> {
        let mut conn = self.get_conn()?;
        diesel::update(companies::table.filter(companies::company_id.eq(id)))
            .set((
                companies::company_status.eq(status.as_str()),
                companies::updated_date.eq(Utc::now()),
            ))
            .get_result(&mut conn)
            .optional()?
            .ok_or(CrmError::NotFound("company", id))
    }

    /// Merges the provided fields into the company row and bumps
    /// `updated_date`. Fields left `None` are untouched.
    pub fn update_company(&self, id: Uuid, changes: CompanyChanges) -> Result<Company, CrmError> {
        changes.validate()?;
        let mut conn = self.get_conn()?;
        diesel::update(companies::table.filter(companies::company_id.eq(id)))
            .set((&changes, companies::updated_date.eq(Utc::now())))
            .get_result(&mut conn)
            .optional()?
            .ok_or(CrmError::NotFound("company", id))
    }

    /// Deletes a company and everything attached to it, children before
    /// parent, in one transaction. Returns the deleted company row.
    pub fn delete_company(&self, id: Uuid) -> Result<Company, CrmError> {
        let mut conn = self.get_conn()?;
        conn.transaction::<Company, CrmError, _>(|conn| {
            Self::require_company(conn, id)?;
            diesel::delete(
                company_activities::table.filter(company_activities::company_id.eq(id)),
            )
            .execute(conn)?;
            diesel::delete(company_notes::table.filter(company_notes::company_id.eq(id)))
                .execute(conn)?;
            diesel::delete(company_contacts::table.filter(company_contacts::company_id.eq(id)))
                .execute(conn)?;
            let company = diesel::delete(companies::table.filter(companies::company_id.eq(id)))
                .get_result(conn)?;
            Ok(company)
        })
    }

    /// Pipeline counts and total opportunity value. Companies without an
    /// `opportunity_value` contribute nothing to the total.
    pub fn dashboard_stats(&self) -> Result<DashboardStats, CrmError> {
        let mut conn = self.get_conn()?;
        let rows: Vec<(String, Option<f64>)> = companies::table
            .select((companies::company_status, companies::opportunity_value))
            .load(&mut conn)?;

        let mut stats = DashboardStats {
            lead_count: 0,
            prospect_count: 0,
            client_count: 0,
            total_pipeline_value: 0.0,
        };
        for (status, value) in rows {
            match status.as_str() {
                "lead" => stats.lead_count += 1,
                "prospect" => stats.prospect_count += 1,
                "client" => stats.client_count += 1,
                _ => {}
            }
            if let Some(v) = value {
                stats.total_pipeline_value += v;
            }
        }
        Ok(stats)
    }

    /// Adds a contact to an existing company. At most one contact per company
    /// may be the primary contact.
    pub fn add_contact(&self, contact: NewContact) -> Result<CompanyContact, CrmError> {
        contact.validate()?;
        let company_id = contact
            .company_id
            .ok_or_else(|| CrmError::validation("company_id is required"))?;

        let mut conn = self.get_conn()?;
        let wants_primary = contact.is_primary_contact.unwrap_or(false);

        let now = Utc::now();
        let row = CompanyContact {
            contact_id: Uuid::new_v4(),
            company_id,
            contact_first_name: contact.contact_first_name,
            contact_last_name: contact.contact_last_name,
            contact_job_title: contact.contact_job_title,
            contact_email: contact.contact_email,
            contact_phone: contact.contact_phone,
            contact_mobile: contact.contact_mobile,
            preferred_contact_method: contact.preferred_contact_method,
            is_primary_contact: wants_primary,
            is_decision_maker: contact.is_decision_maker.unwrap_or(false),
            is_active_contact: contact.is_active_contact.unwrap_or(true),
            created_date: now,
            updated_date: now,
        };

        // The duplicate-primary check and the insert must see the same rows.
        conn.transaction::<_, CrmError, _>(|conn| {
            Self::require_company(conn, company_id)?;
            if wants_primary {
                let primaries: i64 = company_contacts::table
                    .filter(company_contacts::company_id.eq(company_id))
                    .filter(company_contacts::is_primary_contact.eq(true))
                    .count()
                    .get_result(conn)?;
                if primaries > 0 {
                    return Err(CrmError::validation(
                        "Company already has a primary contact",
                    ));
                }
            }
            diesel::insert_into(company_contacts::table)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })?;
        Ok(row)
    }

    pub fn update_contact(
        &self,
        id: Uuid,
        changes: ContactChanges,
    ) -> Result<CompanyContact, CrmError> {
        changes.validate()?;
        let mut conn = self.get_conn()?;
        diesel::update(company_contacts::table.filter(company_contacts::contact_id.eq(id)))
            .set((&changes, company_contacts::updated_date.eq(Utc::now())))
            .get_result(&mut conn)
            .optional()?
            .ok_or(CrmError::NotFound("contact", id))
    }

    pub fn add_note(
        &self,
        company_id: Uuid,
        note_text: String,
        created_by_name: Option<String>,
    ) -> Result<CompanyNote, CrmError> {
        if note_text.trim().is_empty() {
            return Err(CrmError::validation("note_text is required"));
        }
        let mut conn = self.get_conn()?;
        Self::require_company(&mut conn, company_id)?;

        let row = CompanyNote {
            note_id: Uuid::new_v4(),
            company_id,
            note_text,
            created_by_name: created_by_name.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            created_date: Utc::now(),
        };
        diesel::insert_into(company_notes::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(row)
    }

    pub fn notes(&self, company_id: Uuid) -> Result<Vec<CompanyNote>, CrmError> {
        let mut conn = self.get_conn()?;
        Self::require_company(&mut conn, company_id)?;
        let notes = company_notes::table
            .filter(company_notes::company_id.eq(company_id))
            .order(company_notes::created_date.desc())
            .load(&mut conn)?;
        Ok(notes)
    }

    pub fn add_activity(
        &self,
        company_id: Uuid,
        activity_type: String,
        activity_notes: String,
        created_by_name: Option<String>,
        follow_up_date: Option<chrono::NaiveDate>,
    ) -> Result<CompanyActivity, CrmError> {
        if activity_type.trim().is_empty() {
            return Err(CrmError::validation("activity_type is required"));
        }
        if activity_notes.trim().is_empty() {
            return Err(CrmError::validation("activity_notes is required"));
        }
        let mut conn = self.get_conn()?;
        Self::require_company(&mut conn, company_id)?;

        let row = CompanyActivity {
            activity_id: Uuid::new_v4(),
            company_id,
            activity_type,
            activity_notes,
            follow_up_date,
            created_by_name: created_by_name.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            created_date: Utc::now(),
        };
        diesel::insert_into(company_activities::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(row)
    }

    pub fn activities(&self, company_id: Uuid) -> Result<Vec<CompanyActivity>, CrmError> {
        let mut conn = self.get_conn()?;
        Self::require_company(&mut conn, company_id)?;
        let activities = company_activities::table
            .filter(company_activities::company_id.eq(company_id))
            .order(company_activities::created_date.desc())
            .load(&mut conn)?;
        Ok(activities)
    }
}
