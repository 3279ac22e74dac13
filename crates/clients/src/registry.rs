//! Composition root: one client per dependency, built once and passed around

use crate::adapter::{DependencyClient, DependencyHealth};
use crate::config::ClientsConfig;
use crate::courses::CourseCatalogClient;
use crate::students::StudentRegistryClient;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dependency: {0}")]
pub struct UnknownDependency(pub String);

#[derive(Debug)]
pub struct Dependencies {
    pub courses: CourseCatalogClient,
    pub students: StudentRegistryClient,
}

impl Dependencies {
    pub fn new(courses: CourseCatalogClient, students: StudentRegistryClient) -> Self {
        Self { courses, students }
    }

    pub fn from_config(config: &ClientsConfig) -> Self {
        Self::new(
            CourseCatalogClient::from_config(&config.courses),
            StudentRegistryClient::from_config(&config.students),
        )
    }

    /// Connect both dependencies; an unreachable one is retried on first use
    pub async fn startup(&self) {
        let (courses, students) = tokio::join!(
            self.courses.client().startup(),
            self.students.client().startup()
        );
        tracing::info!(courses, students, "dependency clients started");
    }

    /// Look a client up by key (`courses`, `students`) or display name
    pub fn client(&self, name: &str) -> Result<&DependencyClient, UnknownDependency> {
        [self.courses.client(), self.students.client()]
            .into_iter()
            .find(|client| client.name().eq_ignore_ascii_case(name) || key_of(client.name()) == name)
            .ok_or_else(|| UnknownDependency(name.to_string()))
    }

    pub fn health(&self) -> Vec<DependencyHealth> {
        vec![self.courses.client().health(), self.students.client().health()]
    }

    /// Operator override for one dependency's breaker
    pub fn reset(&self, name: &str) -> Result<(), UnknownDependency> {
        let client = self.client(name)?;
        client.reset();
        tracing::warn!(dependency = %client.name(), "breaker reset by operator");
        Ok(())
    }
}

fn key_of(display_name: &str) -> &'static str {
    match display_name {
        crate::courses::COURSES_SERVICE => "courses",
        crate::students::STUDENT_SERVICE => "students",
        _ => "",
    }
}
