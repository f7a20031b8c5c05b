use reqwest::Method;
use serde_json::json;

use super::Driver;
use crate::ledger::ResourceKind;
use crate::report::Severity;
use crate::session::Role;

impl Driver {
    /// Student registration needs a class, so this is skipped until one exists.
    pub async fn student_auth(&mut self) {
        self.section("TESTING STUDENT AUTHENTICATION", true);

        if self.ledger.is_empty(ResourceKind::Class) {
            self.log(Severity::Warning, "Need class to create student");
            return;
        }
        self.authenticate(Role::Student).await;
    }

    pub async fn student_assessments(&mut self) {
        self.section("TESTING STUDENT - VIEW ASSESSMENTS", true);
        self.request(
            Method::GET,
            "/student/assessments",
            Role::Student,
            None,
            200,
        )
        .await;
    }

    /// Opens the first assessment and starts an attempt on it.
    pub async fn student_exam(&mut self) {
        self.section("TESTING STUDENT - EXAM INTERFACE", true);

        let Some(assessment_id) = self.ledger.first(ResourceKind::Assessment) else {
            self.log(
                Severity::Warning,
                "Need published assessment to test exam",
            );
            return;
        };

        let exam_path = format!("/student/assessments/{assessment_id}");
        let loaded = self
            .request(Method::GET, &exam_path, Role::Student, None, 200)
            .await;
        if !loaded.success {
            return;
        }
        self.log(Severity::Success, "Assessment loaded for exam");

        let started = self
            .request(
                Method::POST,
                &format!("{exam_path}/start"),
                Role::Student,
                Some(json!({})),
                201,
            )
            .await;
        if started.success {
            self.log(Severity::Success, "Exam started");
        }
    }

    pub async fn student_results(&mut self) {
        self.section("TESTING STUDENT - VIEW RESULTS", true);
        self.request(Method::GET, "/student/results", Role::Student, None, 200)
            .await;
    }
}
