//! Student registry adapter

use crate::adapter::DependencyClient;
use crate::config::DependencyConfig;
use crate::transport::{OutboundRequest, RestConnector};
use registrar_breaker::{CallContext, CanonicalError, DownstreamFailure, trace::trace_label};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STUDENT_SERVICE: &str = "Student Service";

const CONFLICT: u16 = 409;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Student {
    pub id: Option<i64>,
    #[serde(rename = "numero_etudiant")]
    pub student_number: String,
    pub email: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    #[serde(rename = "nom")]
    pub last_name: String,
}

/// Profile the registry creates for a user who has none yet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStudentProfile {
    #[serde(rename = "numero_etudiant")]
    pub student_number: String,
    pub email: String,
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    #[serde(rename = "niveau")]
    pub level: String,
    #[serde(rename = "est_actif")]
    pub active: bool,
}

impl NewStudentProfile {
    /// Default first-year profile: `STU` plus the zero-padded user id
    pub fn for_user(user_id: u64, email: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            student_number: format!("STU{user_id:06}"),
            email: email.into(),
            last_name: username.into(),
            first_name: "Student".to_string(),
            level: "L1".to_string(),
            active: true,
        }
    }
}

#[derive(Debug)]
pub struct StudentRegistryClient {
    client: DependencyClient,
}

impl StudentRegistryClient {
    pub fn new(client: DependencyClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &DependencyConfig) -> Self {
        let connector = RestConnector {
            base_url: config.endpoint.clone(),
            timeout: config.timeout(),
        };
        Self::new(DependencyClient::from_config(
            STUDENT_SERVICE,
            config,
            Box::new(connector),
        ))
    }

    pub fn client(&self) -> &DependencyClient {
        &self.client
    }

    /// Look a student up by numeric id or student number
    pub async fn get_student(&self, ctx: &CallContext, student_id: &str) -> Result<Student, CanonicalError> {
        tracing::info!(
            trace_id = %trace_label(ctx.trace_id()),
            student_id,
            "fetching student"
        );

        let request = OutboundRequest::get(format!("/api/v1/students/{}", urlencoding::encode(student_id)));
        let data = self.client.call(ctx, &request).await?;

        if data.is_null() {
            return Err(
                CanonicalError::not_found(format!("Student with ID {student_id} not found"))
                    .with_trace(ctx.trace_id()),
            );
        }
        serde_json::from_value(data).map_err(|e| {
            self.client.translate(
                DownstreamFailure::Unexpected(format!("malformed student record: {e}")),
                ctx.trace_id(),
            )
        })
    }

    /// `false` when the registry has no such student
    pub async fn validate_student(&self, ctx: &CallContext, student_id: &str) -> Result<bool, CanonicalError> {
        match self.get_student(ctx, student_id).await {
            Ok(_) => Ok(true),
            Err(error) if error.is_not_found() => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Student number registered for `email`, `None` when there is no profile
    pub async fn find_student_number_by_email(
        &self,
        ctx: &CallContext,
        email: &str,
    ) -> Result<Option<String>, CanonicalError> {
        tracing::info!(trace_id = %trace_label(ctx.trace_id()), "looking up student by email");

        let request = OutboundRequest::get(format!(
            "/api/v1/students/internal/by-email/{}",
            urlencoding::encode(email)
        ));
        let data = match self.client.call(ctx, &request).await {
            Ok(data) => data,
            Err(error) if error.is_not_found() => return Ok(None),
            Err(error) => return Err(error),
        };

        Ok(student_number(&data))
    }

    /// Create `profile` in the registry and return its student number
    pub async fn create_student_profile(
        &self,
        ctx: &CallContext,
        profile: &NewStudentProfile,
    ) -> Result<String, CanonicalError> {
        tracing::info!(
            trace_id = %trace_label(ctx.trace_id()),
            student_number = %profile.student_number,
            "creating student profile"
        );

        let body = serde_json::to_value(profile).map_err(|e| {
            self.client.translate(
                DownstreamFailure::Unexpected(format!("unencodable student profile: {e}")),
                ctx.trace_id(),
            )
        })?;
        let request = OutboundRequest::new("/api/v1/students/internal", body);
        let data = self.client.call(ctx, &request).await?;

        Ok(student_number(&data).unwrap_or_else(|| profile.student_number.clone()))
    }

    /// Student number for `profile.email`, creating the profile when missing
    ///
    /// A concurrent creation shows up as a conflict; the winner's profile is
    /// then looked up again by email.
    pub async fn get_or_create_student_profile(
        &self,
        ctx: &CallContext,
        profile: &NewStudentProfile,
    ) -> Result<String, CanonicalError> {
        if let Some(number) = self.find_student_number_by_email(ctx, &profile.email).await? {
            return Ok(number);
        }

        match self.create_student_profile(ctx, profile).await {
            Ok(number) => Ok(number),
            Err(error) if error.status_code() == CONFLICT => {
                tracing::warn!(
                    trace_id = %trace_label(ctx.trace_id()),
                    "student profile already exists, looking it up again"
                );
                match self.find_student_number_by_email(ctx, &profile.email).await? {
                    Some(number) => Ok(number),
                    None => Err(error),
                }
            }
            Err(error) => Err(error),
        }
    }
}

fn student_number(data: &Value) -> Option<String> {
    match data.get("numero_etudiant") {
        Some(Value::String(number)) => Some(number.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}
