use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::crm::error::CrmError;
use crate::shared::schema::{companies, company_activities, company_contacts, company_notes};

static ZIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}(-\d{4})?$").unwrap());

/// Pipeline stage of a company. Transitions are unrestricted: any status may be
/// set to any other status at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Lead,
    Prospect,
    Client,
    Inactive,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Lead => "lead",
            CompanyStatus::Prospect => "prospect",
            CompanyStatus::Client => "client",
            CompanyStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for CompanyStatus {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead" => Ok(CompanyStatus::Lead),
            "prospect" => Ok(CompanyStatus::Prospect),
            "client" => Ok(CompanyStatus::Client),
            "inactive" => Ok(CompanyStatus::Inactive),
            other => Err(CrmError::validation(format!(
                "Unknown company status: {other}"
            ))),
        }
    }
}

impl fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadScore {
    Hot,
    Warm,
    Cold,
}

impl LeadScore {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadScore::Hot => "hot",
            LeadScore::Warm => "warm",
            LeadScore::Cold => "cold",
        }
    }
}

impl FromStr for LeadScore {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hot" => Ok(LeadScore::Hot),
            "warm" => Ok(LeadScore::Warm),
            "cold" => Ok(LeadScore::Cold),
            other => Err(CrmError::validation(format!("Unknown lead score: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    Email,
    Phone,
    Mobile,
}

impl ContactMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactMethod::Email => "email",
            ContactMethod::Phone => "phone",
            ContactMethod::Mobile => "mobile",
        }
    }
}

impl FromStr for ContactMethod {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(ContactMethod::Email),
            "phone" => Ok(ContactMethod::Phone),
            "mobile" => Ok(ContactMethod::Mobile),
            other => Err(CrmError::validation(format!(
                "Unknown contact method: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = companies)]
pub struct Company {
    pub company_id: Uuid,
    pub company_name: String,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub annual_revenue: Option<String>,
    pub company_website: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub apt_suite: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub company_status: String,
    pub lead_source: Option<String>,
    pub lead_score: Option<String>,
    pub expected_close_date: Option<NaiveDate>,
    pub staffing_needs_overview: Option<String>,
    pub immediate_positions: Option<i32>,
    pub annual_positions: Option<i32>,
    pub opportunity_value: Option<f64>,
    pub position_names: Option<String>,
    pub position_type: Option<String>,
    pub additional_staffing_details: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = company_contacts)]
pub struct CompanyContact {
    pub contact_id: Uuid,
    pub company_id: Uuid,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_job_title: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub contact_mobile: Option<String>,
    pub preferred_contact_method: String,
    pub is_primary_contact: bool,
    pub is_decision_maker: bool,
    pub is_active_contact: bool,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = company_notes)]
pub struct CompanyNote {
    pub note_id: Uuid,
    pub company_id: Uuid,
    pub note_text: String,
    pub created_by_name: String,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = company_activities)]
pub struct CompanyActivity {
    pub activity_id: Uuid,
    pub company_id: Uuid,
    pub activity_type: String,
    pub activity_notes: String,
    pub follow_up_date: Option<NaiveDate>,
    pub created_by_name: String,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCompany {
    pub company_name: String,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub annual_revenue: Option<String>,
    pub company_website: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub apt_suite: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub company_status: Option<String>,
    pub lead_source: Option<String>,
    pub lead_score: Option<String>,
    pub expected_close_date: Option<NaiveDate>,
    pub staffing_needs_overview: Option<String>,
    pub immediate_positions: Option<i32>,
    pub annual_positions: Option<i32>,
    pub opportunity_value: Option<f64>,
    pub position_names: Option<String>,
    pub position_type: Option<String>,
    pub additional_staffing_details: Option<String>,
}

impl NewCompany {
    pub fn validate(&self) -> Result<(), CrmError> {
        if self.company_name.trim().is_empty() {
            return Err(CrmError::validation("company_name is required"));
        }
        if let Some(status) = self.company_status.as_deref() {
            CompanyStatus::from_str(status)?;
        }
        if let Some(score) = self.lead_score.as_deref() {
            LeadScore::from_str(score)?;
        }
        if let Some(zip) = self.zip_code.as_deref() {
            if !zip.is_empty() {
                validate_zip(zip)?;
            }
        }
        validate_staffing_numbers(
            self.immediate_positions,
            self.annual_positions,
            self.opportunity_value,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    /// Required when adding a contact to an existing company; ignored by the
    /// create-company flow, which supplies the freshly generated id.
    pub company_id: Option<Uuid>,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_job_title: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub contact_mobile: Option<String>,
    pub preferred_contact_method: String,
    pub is_primary_contact: Option<bool>,
    pub is_decision_maker: Option<bool>,
    pub is_active_contact: Option<bool>,
}

impl NewContact {
    pub fn validate(&self) -> Result<(), CrmError> {
        if self.contact_first_name.trim().is_empty() {
            return Err(CrmError::validation("contact_first_name is required"));
        }
        if self.contact_last_name.trim().is_empty() {
            return Err(CrmError::validation("contact_last_name is required"));
        }
        if self.contact_email.trim().is_empty() {
            return Err(CrmError::validation("contact_email is required"));
        }
        ContactMethod::from_str(&self.preferred_contact_method)?;
        Ok(())
    }
}

/// Partial company update. `None` fields are left untouched; `updated_date` is
/// bumped by the store on every successful update.
#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = companies)]
pub struct CompanyChanges {
    pub company_name: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub annual_revenue: Option<String>,
    pub company_website: Option<String>,
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub apt_suite: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub company_status: Option<String>,
    pub lead_source: Option<String>,
    pub lead_score: Option<String>,
    pub expected_close_date: Option<NaiveDate>,
    pub staffing_needs_overview: Option<String>,
    pub immediate_positions: Option<i32>,
    pub annual_positions: Option<i32>,
    pub opportunity_value: Option<f64>,
    pub position_names: Option<String>,
    pub position_type: Option<String>,
    pub additional_staffing_details: Option<String>,
}

impl CompanyChanges {
    pub fn validate(&self) -> Result<(), CrmError> {
        if let Some(name) = self.company_name.as_deref() {
            if name.trim().is_empty() {
                return Err(CrmError::validation("company_name cannot be empty"));
            }
        }
        if let Some(status) = self.company_status.as_deref() {
            CompanyStatus::from_str(status)?;
        }
        if let Some(score) = self.lead_score.as_deref() {
            LeadScore::from_str(score)?;
        }
        if let Some(zip) = self.zip_code.as_deref() {
            if !zip.is_empty() {
                validate_zip(zip)?;
            }
        }
        validate_staffing_numbers(
            self.immediate_positions,
            self.annual_positions,
            self.opportunity_value,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = company_contacts)]
pub struct ContactChanges {
    pub contact_first_name: Option<String>,
    pub contact_last_name: Option<String>,
    pub contact_job_title: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_mobile: Option<String>,
    pub preferred_contact_method: Option<String>,
    pub is_primary_contact: Option<bool>,
    pub is_decision_maker: Option<bool>,
    pub is_active_contact: Option<bool>,
}

impl ContactChanges {
    pub fn validate(&self) -> Result<(), CrmError> {
        if let Some(first) = self.contact_first_name.as_deref() {
            if first.trim().is_empty() {
                return Err(CrmError::validation("contact_first_name cannot be empty"));
            }
        }
        if let Some(last) = self.contact_last_name.as_deref() {
            if last.trim().is_empty() {
                return Err(CrmError::validation("contact_last_name cannot be empty"));
            }
        }
        if let Some(email) = self.contact_email.as_deref() {
            if email.trim().is_empty() {
                return Err(CrmError::validation("contact_email cannot be empty"));
            }
        }
        if let Some(method) = self.preferred_contact_method.as_deref() {
            ContactMethod::from_str(method)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CompanyWithContacts {
    #[serde(flatten)]
    pub company: Company,
    pub contacts: Vec<CompanyContact>,
}

/// Typed aggregate returned by the detail fetch: the company plus all of its
/// related records, each list newest-first.
#[derive(Debug, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub contacts: Vec<CompanyContact>,
    pub notes: Vec<CompanyNote>,
    pub activities: Vec<CompanyActivity>,
}

#[derive(Debug, Serialize)]
pub struct CompanyCreated {
    pub company: Company,
    pub contact: CompanyContact,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub lead_count: i64,
    pub prospect_count: i64,
    pub client_count: i64,
    pub total_pipeline_value: f64,
}

pub fn validate_zip(zip: &str) -> Result<(), CrmError> {
    if ZIP_RE.is_match(zip) {
        Ok(())
    } else {
        Err(CrmError::validation(format!(
            "Invalid ZIP code: {zip} (expected NNNNN or NNNNN-NNNN)"
        )))
    }
}

fn validate_staffing_numbers(
    immediate: Option<i32>,
    annual: Option<i32>,
    value: Option<f64>,
) -> Result<(), CrmError> {
    if immediate.is_some_and(|n| n < 0) {
        return Err(CrmError::validation("immediate_positions cannot be negative"));
    }
    if annual.is_some_and(|n| n < 0) {
        return Err(CrmError::validation("annual_positions cannot be negative"));
    }
    if value.is_some_and(|v| v < 0.0) {
        return Err(CrmError::validation("opportunity_value cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_company() -> NewCompany {
        NewCompany {
            company_name: "Acme Health".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn zip_shapes() {
        assert!(validate_zip("12345").is_ok());
        assert!(validate_zip("12345-6789").is_ok());
        assert!(validate_zip("1234").is_err());
        assert!(validate_zip("ABCDE").is_err());
        assert!(validate_zip("12345-678").is_err());
        assert!(validate_zip(" 12345").is_err());
    }

    #[test]
    fn company_requires_name() {
        let mut company = valid_company();
        assert!(company.validate().is_ok());
        company.company_name = "   ".to_string();
        assert!(matches!(
            company.validate(),
            Err(CrmError::Validation(_))
        ));
    }

    #[test]
    fn company_rejects_bad_zip() {
        let mut company = valid_company();
        company.zip_code = Some("1234".to_string());
        assert!(company.validate().is_err());
        company.zip_code = Some("12345-6789".to_string());
        assert!(company.validate().is_ok());
        // Empty string is treated as absent, matching form submissions.
        company.zip_code = Some(String::new());
        assert!(company.validate().is_ok());
    }

    #[test]
    fn company_rejects_negative_staffing_numbers() {
        let mut company = valid_company();
        company.immediate_positions = Some(-1);
        assert!(company.validate().is_err());
        company.immediate_positions = Some(0);
        company.opportunity_value = Some(-0.5);
        assert!(company.validate().is_err());
        company.opportunity_value = Some(5000.0);
        assert!(company.validate().is_ok());
    }

    fn valid_contact() -> NewContact {
        NewContact {
            company_id: None,
            contact_first_name: "Jo".to_string(),
            contact_last_name: "Lee".to_string(),
            contact_job_title: None,
            contact_email: "jo@acme.com".to_string(),
            contact_phone: None,
            contact_mobile: None,
            preferred_contact_method: "email".to_string(),
            is_primary_contact: None,
            is_decision_maker: None,
            is_active_contact: None,
        }
    }

    #[test]
    fn contact_requires_name_and_email() {
        let contact = valid_contact();
        assert!(contact.validate().is_ok());

        let mut missing_email = contact.clone();
        missing_email.contact_email = String::new();
        assert!(missing_email.validate().is_err());

        let mut missing_last = contact;
        missing_last.contact_last_name = " ".to_string();
        assert!(missing_last.validate().is_err());
    }

    #[test]
    fn contact_rejects_unknown_contact_method() {
        let mut contact = valid_contact();
        contact.preferred_contact_method = "fax".to_string();
        assert!(matches!(
            contact.validate(),
            Err(CrmError::Validation(_))
        ));
        contact.preferred_contact_method = "mobile".to_string();
        assert!(contact.validate().is_ok());
    }

    #[test]
    fn company_rejects_unknown_status_and_score() {
        let mut company = valid_company();
        company.company_status = Some("archived".to_string());
        assert!(matches!(
            company.validate(),
            Err(CrmError::Validation(_))
        ));
        company.company_status = Some("prospect".to_string());
        company.lead_score = Some("lukewarm".to_string());
        assert!(company.validate().is_err());
        company.lead_score = Some("warm".to_string());
        assert!(company.validate().is_ok());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            CompanyStatus::Lead,
            CompanyStatus::Prospect,
            CompanyStatus::Client,
            CompanyStatus::Inactive,
        ] {
            assert_eq!(CompanyStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(CompanyStatus::from_str("customer").is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CompanyStatus::Prospect).unwrap(),
            "\"prospect\""
        );
        let parsed: CompanyStatus = serde_json::from_str("\"inactive\"").unwrap();
        assert_eq!(parsed, CompanyStatus::Inactive);
    }

    #[test]
    fn changes_validate_enum_strings() {
        let mut changes = CompanyChanges {
            company_status: Some("prospect".to_string()),
            lead_score: Some("hot".to_string()),
            ..Default::default()
        };
        assert!(changes.validate().is_ok());
        changes.company_status = Some("archived".to_string());
        assert!(changes.validate().is_err());
    }
}
