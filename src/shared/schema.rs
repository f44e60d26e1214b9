diesel::table! {
    companies (company_id) {
        company_id -> Uuid,
        company_name -> Varchar,
        industry -> Nullable<Varchar>,
        company_size -> Nullable<Varchar>,
        annual_revenue -> Nullable<Varchar>,
        company_website -> Nullable<Varchar>,
        street_number -> Nullable<Varchar>,
        street_name -> Nullable<Varchar>,
        apt_suite -> Nullable<Varchar>,
        city -> Nullable<Varchar>,
        state -> Nullable<Varchar>,
        zip_code -> Nullable<Varchar>,
        company_status -> Varchar,
        lead_source -> Nullable<Varchar>,
        lead_score -> Nullable<Varchar>,
        expected_close_date -> Nullable<Date>,
        staffing_needs_overview -> Nullable<Text>,
        immediate_positions -> Nullable<Int4>,
        annual_positions -> Nullable<Int4>,
        opportunity_value -> Nullable<Float8>,
        position_names -> Nullable<Text>,
        position_type -> Nullable<Varchar>,
        additional_staffing_details -> Nullable<Text>,
        created_date -> Timestamptz,
        updated_date -> Timestamptz,
    }
}

diesel::table! {
    company_contacts (contact_id) {
        contact_id -> Uuid,
        company_id -> Uuid,
        contact_first_name -> Varchar,
        contact_last_name -> Varchar,
        contact_job_title -> Nullable<Varchar>,
        contact_email -> Varchar,
        contact_phone -> Nullable<Varchar>,
        contact_mobile -> Nullable<Varchar>,
        preferred_contact_method -> Varchar,
        is_primary_contact -> Bool,
        is_decision_maker -> Bool,
        is_active_contact -> Bool,
        created_date -> Timestamptz,
        updated_date -> Timestamptz,
    }
}

diesel::table! {
    company_notes (note_id) {
        note_id -> Uuid,
        company_id -> Uuid,
        note_text -> Text,
        created_by_name -> Varchar,
        created_date -> Timestamptz,
    }
}

diesel::table! {
    company_activities (activity_id) {
        activity_id -> Uuid,
        company_id -> Uuid,
        activity_type -> Varchar,
        activity_notes -> Text,
        follow_up_date -> Nullable<Date>,
        created_by_name -> Varchar,
        created_date -> Timestamptz,
    }
}

diesel::joinable!(company_contacts -> companies (company_id));
diesel::joinable!(company_notes -> companies (company_id));
diesel::joinable!(company_activities -> companies (company_id));

diesel::allow_tables_to_appear_in_same_query!(
    companies,
    company_contacts,
    company_notes,
    company_activities,
);
