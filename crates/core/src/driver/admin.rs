use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Method;
use serde_json::{Value, json};

use super::Driver;
use crate::ledger::ResourceKind;
use crate::report::Severity;
use crate::session::Role;

impl Driver {
    pub async fn admin_auth(&mut self) {
        self.section("TESTING ADMIN AUTHENTICATION", true);
        self.authenticate(Role::Admin).await;
    }

    pub async fn admin_classes(&mut self) -> Result<()> {
        self.section("TESTING ADMIN - CLASS MANAGEMENT", true);

        let created = self
            .request(
                Method::POST,
                "/admin/classes",
                Role::Admin,
                Some(json!({"name": "JSS1", "stream": "Science"})),
                201,
            )
            .await;
        let class_id = if created.success {
            self.created_id(&created.body, "class").context("Failed to read created class")?
        } else {
            None
        };
        let Some(class_id) = class_id else {
            self.log(Severity::Error, "Failed to create class");
            return Ok(());
        };

        self.ledger.record(ResourceKind::Class, class_id.clone());
        self.log(Severity::Success, format!("Class created: {class_id}"));

        let class_path = format!("/admin/classes/{class_id}");
        self.request(Method::GET, "/admin/classes", Role::Admin, None, 200)
            .await;
        self.request(Method::GET, &class_path, Role::Admin, None, 200)
            .await;
        self.request(
            Method::PUT,
            &class_path,
            Role::Admin,
            Some(json!({"name": "JSS1", "stream": "Arts"})),
            200,
        )
        .await;
        Ok(())
    }

    /// Creates a subject and links it to the first recorded class.
    pub async fn admin_subjects(&mut self) -> Result<()> {
        self.section("TESTING ADMIN - SUBJECT MANAGEMENT", true);

        let name = format!("Mathematics_{}", Utc::now().timestamp_millis());
        let created = self
            .request(
                Method::POST,
                "/admin/subjects",
                Role::Admin,
                Some(json!({"name": name})),
                201,
            )
            .await;
        let subject_id = if created.success {
            self.created_id(&created.body, "subject").context("Failed to read created subject")?
        } else {
            None
        };
        let Some(subject_id) = subject_id else {
            self.log(Severity::Error, "Failed to create subject");
            return Ok(());
        };

        self.ledger.record(ResourceKind::Subject, subject_id.clone());
        self.log(Severity::Success, format!("Subject created: {subject_id}"));

        self.request(Method::GET, "/admin/subjects", Role::Admin, None, 200)
            .await;

        let Some(class_id) = self.ledger.first(ResourceKind::Class).map(str::to_string) else {
            return Ok(());
        };
        let linked = self
            .request(
                Method::POST,
                "/admin/class-subjects",
                Role::Admin,
                Some(json!({"classId": class_id, "subjectId": subject_id})),
                201,
            )
            .await;
        if linked.success {
            self.ledger
                .record(ResourceKind::ClassSubject, format!("{class_id}:{subject_id}"));
            self.log(Severity::Success, "Subject assigned to class");
        }
        Ok(())
    }

    /// Creates an assessment for the first class and subject, then adds questions to it.
    pub async fn admin_assessments(&mut self) -> Result<()> {
        self.section("TESTING ADMIN - ASSESSMENT MANAGEMENT", true);

        let (Some(class_id), Some(subject_id)) = (
            self.ledger.first(ResourceKind::Class),
            self.ledger.first(ResourceKind::Subject),
        ) else {
            self.log(
                Severity::Warning,
                "Need class and subject to create assessment",
            );
            return Ok(());
        };

        let data = json!({
            "title": format!("Test Assessment {}", Utc::now().timestamp_millis()),
            "description": "Test assessment for API testing",
            "classId": class_id,
            "subjectId": subject_id,
            "duration": 30,
            "passMarks": 50,
            "instructions": "Answer all questions",
            "showResults": true
        });
        let created = self
            .request(Method::POST, "/assessment", Role::Admin, Some(data), 201)
            .await;
        let assessment_id = if created.success {
            self.created_id(&created.body, "assessment")
                .context("Failed to read created assessment")?
        } else {
            None
        };
        let Some(assessment_id) = assessment_id else {
            self.log(Severity::Error, "Failed to create assessment");
            return Ok(());
        };

        self.ledger
            .record(ResourceKind::Assessment, assessment_id.clone());
        self.log(
            Severity::Success,
            format!("Assessment created: {assessment_id}"),
        );

        let assessment_path = format!("/assessment/{assessment_id}");
        self.request(Method::GET, "/assessment", Role::Admin, None, 200)
            .await;
        self.request(Method::GET, &assessment_path, Role::Admin, None, 200)
            .await;

        self.admin_questions(&assessment_id).await;

        self.request(
            Method::PUT,
            &assessment_path,
            Role::Admin,
            Some(json!({"title": "Updated Assessment Title"})),
            200,
        )
        .await;
        Ok(())
    }

    /// Adds one question of each kind to `assessment_id` and reads it back.
    pub async fn admin_questions(&mut self, assessment_id: &str) {
        self.section("TESTING ADMIN - QUESTION MANAGEMENT", false);

        let questions_path = format!("/assessment/{assessment_id}/questions");
        for question in sample_questions() {
            let kind = question["questionType"].as_str().unwrap_or_default().to_string();
            let added = self
                .request(
                    Method::POST,
                    &questions_path,
                    Role::Admin,
                    Some(question),
                    201,
                )
                .await;
            if added.success && kind == "MULTIPLE_CHOICE" {
                self.log(Severity::Success, "MCQ question added");
            }
        }

        self.request(
            Method::GET,
            &format!("/assessment/{assessment_id}"),
            Role::Admin,
            None,
            200,
        )
        .await;
    }

    pub async fn admin_bulk_import(&mut self) {
        self.section("TESTING ADMIN - BULK IMPORT", true);

        let Some(assessment_id) = self.ledger.first(ResourceKind::Assessment) else {
            self.log(Severity::Warning, "Need assessment to test bulk import");
            return;
        };

        let questions = json!({
            "questions": [
                {
                    "questionText": "Bulk Q1",
                    "questionType": "MULTIPLE_CHOICE",
                    "options": ["A", "B", "C", "D"],
                    "correctAnswer": "B",
                    "marks": 2
                },
                {
                    "questionText": "Bulk Q2: True or False?",
                    "questionType": "TRUE_FALSE",
                    "correctAnswer": "True",
                    "marks": 1
                }
            ]
        });
        let imported = self
            .request(
                Method::POST,
                &format!("/assessment/{assessment_id}/questions/bulk"),
                Role::Admin,
                Some(questions),
                201,
            )
            .await;
        if imported.success {
            self.log(Severity::Success, "Bulk import successful");
        }
    }

    pub async fn admin_publish(&mut self) {
        self.section("TESTING ADMIN - ASSESSMENT PUBLISHING", true);

        let Some(assessment_id) = self.ledger.first(ResourceKind::Assessment) else {
            self.log(Severity::Warning, "Need assessment to test publishing");
            return;
        };

        let published = self
            .request(
                Method::POST,
                &format!("/assessment/{assessment_id}/publish"),
                Role::Admin,
                Some(json!({})),
                200,
            )
            .await;
        if published.success {
            self.log(Severity::Success, "Assessment published successfully");
        }
    }

    pub async fn admin_students(&mut self) {
        self.section("TESTING ADMIN - STUDENT MANAGEMENT", true);

        if self.ledger.is_empty(ResourceKind::Class) {
            self.log(Severity::Warning, "Need class to create student");
            return;
        }

        self.request(Method::GET, "/admin/students", Role::Admin, None, 200)
            .await;
    }
}

/// One multiple choice, one true/false and one fill-in-the-blank question.
fn sample_questions() -> Vec<Value> {
    vec![
        json!({
            "questionText": "What is 2 + 2?",
            "questionType": "MULTIPLE_CHOICE",
            "options": ["3", "4", "5", "6"],
            "correctAnswer": "4",
            "marks": 1,
            "explanation": "The sum of 2 and 2 is 4",
            "orderIndex": 1
        }),
        json!({
            "questionText": "Earth is round: True or False?",
            "questionType": "TRUE_FALSE",
            "correctAnswer": "True",
            "marks": 1,
            "orderIndex": 2
        }),
        json!({
            "questionText": "The capital of France is ___",
            "questionType": "FILL_BLANK",
            "correctAnswer": "Paris",
            "marks": 1,
            "orderIndex": 3
        }),
    ]
}
