//! Course catalog adapter

use crate::adapter::DependencyClient;
use crate::config::DependencyConfig;
use crate::transport::{OutboundRequest, RpcConnector};
use registrar_breaker::{CallContext, CanonicalError, DownstreamFailure, trace::trace_label};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const COURSES_SERVICE: &str = "Courses Service";

/// RPC endpoint below the configured base URL
pub const RPC_PATH: &str = "/rpc/courses";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub course_id: i64,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub credits: Option<u32>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug)]
pub struct CourseCatalogClient {
    client: DependencyClient,
}

impl CourseCatalogClient {
    pub fn new(client: DependencyClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &DependencyConfig) -> Self {
        let connector = RpcConnector {
            endpoint: format!("{}{RPC_PATH}", config.endpoint.trim_end_matches('/')),
            timeout: config.timeout(),
        };
        Self::new(DependencyClient::from_config(
            COURSES_SERVICE,
            config,
            Box::new(connector),
        ))
    }

    pub fn client(&self) -> &DependencyClient {
        &self.client
    }

    pub async fn get_course(&self, ctx: &CallContext, course_id: i64) -> Result<Course, CanonicalError> {
        tracing::info!(
            trace_id = %trace_label(ctx.trace_id()),
            course_id,
            "fetching course"
        );

        let request = OutboundRequest::new("getCourse", json!({ "courseId": course_id }));
        let result = self.client.call(ctx, &request).await?;

        if is_empty(&result) {
            return Err(
                CanonicalError::not_found(format!("Course with ID {course_id} not found"))
                    .with_trace(ctx.trace_id()),
            );
        }
        serde_json::from_value(result).map_err(|e| {
            self.client.translate(
                DownstreamFailure::Unexpected(format!("malformed course record: {e}")),
                ctx.trace_id(),
            )
        })
    }

    /// `false` when the catalog has no such course
    pub async fn validate_course(&self, ctx: &CallContext, course_id: i64) -> Result<bool, CanonicalError> {
        match self.get_course(ctx, course_id).await {
            Ok(_) => Ok(true),
            Err(error) if error.is_not_found() => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// `false` when either side of the enrollment is unknown
    pub async fn check_enrollment(
        &self,
        ctx: &CallContext,
        student_id: i64,
        course_id: i64,
    ) -> Result<bool, CanonicalError> {
        tracing::info!(
            trace_id = %trace_label(ctx.trace_id()),
            student_id,
            course_id,
            "checking enrollment"
        );

        let request = OutboundRequest::new(
            "checkEnrollment",
            json!({ "studentId": student_id, "courseId": course_id }),
        );
        match self.client.call(ctx, &request).await {
            Ok(result) => Ok(is_truthy(&result)),
            Err(error) if error.is_not_found() => Ok(false),
            Err(error) => Err(error),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty() && s != "false",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => match map.get("enrolled") {
            Some(enrolled) => is_truthy(enrolled),
            None => !map.is_empty(),
        },
    }
}
