//! Identifiers of resources created during a run.
//!
//! Entries are only ever appended. Later scenarios read the first entry of a
//! kind as a foreign reference, so nothing here supports removal.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Class,
    Subject,
    Assessment,
    Student,
    ClassSubject,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Class => "Classes",
            ResourceKind::Subject => "Subjects",
            ResourceKind::Assessment => "Assessments",
            ResourceKind::Student => "Students",
            ResourceKind::ClassSubject => "Class-subject links",
        }
    }
}

#[derive(Debug, Default)]
pub struct Ledger {
    classes: Vec<String>,
    subjects: Vec<String>,
    assessments: Vec<String>,
    students: Vec<String>,
    class_subjects: Vec<String>,
}

impl Ledger {
    fn entries(&self, kind: ResourceKind) -> &Vec<String> {
        match kind {
            ResourceKind::Class => &self.classes,
            ResourceKind::Subject => &self.subjects,
            ResourceKind::Assessment => &self.assessments,
            ResourceKind::Student => &self.students,
            ResourceKind::ClassSubject => &self.class_subjects,
        }
    }

    fn entries_mut(&mut self, kind: ResourceKind) -> &mut Vec<String> {
        match kind {
            ResourceKind::Class => &mut self.classes,
            ResourceKind::Subject => &mut self.subjects,
            ResourceKind::Assessment => &mut self.assessments,
            ResourceKind::Student => &mut self.students,
            ResourceKind::ClassSubject => &mut self.class_subjects,
        }
    }

    pub fn record(&mut self, kind: ResourceKind, id: impl Into<String>) {
        self.entries_mut(kind).push(id.into());
    }

    pub fn first(&self, kind: ResourceKind) -> Option<&str> {
        self.entries(kind).first().map(String::as_str)
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.entries(kind).len()
    }

    pub fn is_empty(&self, kind: ResourceKind) -> bool {
        self.entries(kind).is_empty()
    }

    pub fn ids(&self, kind: ResourceKind) -> &[String] {
        self.entries(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_entry_is_stable() {
        let mut ledger = Ledger::default();
        assert!(ledger.first(ResourceKind::Class).is_none());

        ledger.record(ResourceKind::Class, "C1");
        ledger.record(ResourceKind::Class, "C2");

        assert_eq!(ledger.first(ResourceKind::Class), Some("C1"));
        assert_eq!(ledger.count(ResourceKind::Class), 2);
        assert_eq!(ledger.ids(ResourceKind::Class), ["C1", "C2"]);
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut ledger = Ledger::default();
        ledger.record(ResourceKind::Subject, "S1");
        assert!(ledger.is_empty(ResourceKind::Class));
        assert!(ledger.is_empty(ResourceKind::Assessment));
        assert_eq!(ledger.count(ResourceKind::Subject), 1);
    }
}
