//! Repository for the `patients` table.

use sqlx::PgPool;
use woundcare_core::types::DbId;

use crate::models::patient::{CreatePatient, Patient};

const COLUMNS: &str = "id, user_id, first_name, last_name, dob, sex, phone, email, address, \
                       created_at, updated_at";

pub struct PatientRepo;

impl PatientRepo {
    pub async fn create(pool: &PgPool, input: &CreatePatient) -> Result<Patient, sqlx::Error> {
        let query = format!(
            "INSERT INTO patients (user_id, first_name, last_name, dob, sex, phone, email, address)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Patient>(&query)
            .bind(input.user_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(input.dob)
            .bind(&input.sex)
            .bind(&input.phone)
            .bind(&input.email)
            .bind(&input.address)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Patient>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patients WHERE id = $1");
        sqlx::query_as::<_, Patient>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the most recently updated patient whose stored phone equals any
    /// of `candidates` (see `woundcare_core::phone::match_candidates`).
    pub async fn find_by_phone_candidates(
        pool: &PgPool,
        candidates: &[String],
    ) -> Result<Option<Patient>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM patients
             WHERE phone = ANY($1)
             ORDER BY updated_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Patient>(&query)
            .bind(candidates)
            .fetch_optional(pool)
            .await
    }
}
