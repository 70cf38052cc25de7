// Form validation for new and edited records

use crate::models::{Candidate, CandidatePatch, CandidateStage, Interview, InterviewPatch, Job, JobPatch, JobStatus};
use crate::record::{Record, new_id};
use chrono::{DateTime, Utc};

/// Allowed interview score range (inclusive)
pub const SCORE_RANGE: std::ops::RangeInclusive<f64> = 1.0..=5.0;

/// Per-field validation messages, in the order the fields were checked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(&'static str, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message for `field`, if it failed
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn require(&mut self, field: &'static str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.add(field, message);
        }
    }

    fn require_if_present(&mut self, field: &'static str, value: &Option<String>, message: &str) {
        if let Some(v) = value {
            self.require(field, v, message);
        }
    }

    fn check_score(&mut self, score: Option<f64>) {
        if score.is_some_and(|s| !SCORE_RANGE.contains(&s)) {
            self.add("score", "Score must be between 1 and 5.");
        }
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (field, message)) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Form input for a new record
pub trait Draft {
    type Output: Record;

    /// Check required fields against `now` and build the record
    fn validate(self, now: DateTime<Utc>) -> Result<Self::Output, ValidationErrors>;
}

/// Check a partial update before it is sent anywhere
pub trait Validate {
    fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationErrors>;
}

/// Free-text skill tags.
///
/// Duplicates are rejected by exact string match after trimming; "Rust" and "rust"
/// are different tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillSet {
    tags: Vec<String>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag. Returns false for blank or duplicate tags.
    pub fn add(&mut self, raw: &str) -> bool {
        let tag = raw.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    pub fn into_vec(self) -> Vec<String> {
        self.tags
    }
}

impl<S: AsRef<str>> FromIterator<S> for SkillSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = SkillSet::new();
        for tag in iter {
            set.add(tag.as_ref());
        }
        set
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

// ============================================================================
// Drafts
// ============================================================================

#[derive(Debug, Clone)]
pub struct JobDraft {
    pub title: String,
    pub department: String,
    pub description: String,
    pub status: JobStatus,
    pub skills: SkillSet,
}

impl Default for JobDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            department: String::new(),
            description: String::new(),
            status: JobStatus::Open,
            skills: SkillSet::new(),
        }
    }
}

impl Draft for JobDraft {
    type Output = Job;

    fn validate(self, now: DateTime<Utc>) -> Result<Job, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("title", &self.title, "Title is required.");
        errors.require("department", &self.department, "Department is required.");

        errors.into_result(Job {
            id: new_id(),
            title: self.title.trim().to_string(),
            department: self.department.trim().to_string(),
            status: self.status,
            description: non_blank(self.description),
            required_skills: self.skills.into_vec(),
            created_at: Some(now),
            updated_at: now.timestamp_millis(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CandidateDraft {
    pub name: String,
    pub email: String,
    pub applied_job_id: String,
    pub resume_url: String,
    pub stage: CandidateStage,
    pub source: String,
    pub skills: SkillSet,
}

impl Default for CandidateDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            applied_job_id: String::new(),
            resume_url: String::new(),
            stage: CandidateStage::Applied,
            source: String::new(),
            skills: SkillSet::new(),
        }
    }
}

impl Draft for CandidateDraft {
    type Output = Candidate;

    fn validate(self, now: DateTime<Utc>) -> Result<Candidate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("name", &self.name, "Name is required.");
        errors.require("email", &self.email, "Email is required.");
        errors.require("appliedJobId", &self.applied_job_id, "Job selection is required.");

        errors.into_result(Candidate {
            id: new_id(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            applied_job_id: self.applied_job_id,
            resume_url: non_blank(self.resume_url),
            stage: self.stage,
            source: non_blank(self.source),
            skills: self.skills.into_vec(),
            created_at: Some(now),
            updated_at: now.timestamp_millis(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterviewDraft {
    pub job_id: String,
    pub candidate_id: String,
    /// Interview day
    pub date: Option<DateTime<Utc>>,
    /// Exact start time
    pub scheduled_at: Option<DateTime<Utc>>,
    pub kind: String,
    pub score: Option<f64>,
}

impl Draft for InterviewDraft {
    type Output = Interview;

    fn validate(self, now: DateTime<Utc>) -> Result<Interview, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require("jobId", &self.job_id, "Job is required.");
        errors.require("candidateId", &self.candidate_id, "Candidate is required.");

        match self.scheduled_at {
            None => errors.add("scheduledAt", "Scheduled time is required."),
            Some(t) if t <= now => errors.add("scheduledAt", "Scheduled time must be in the future."),
            Some(_) => {}
        }
        match self.date {
            None => errors.add("date", "Date is required."),
            Some(t) if t <= now => errors.add("date", "Date must be in the future."),
            Some(_) => {}
        }
        errors.check_score(self.score);

        let date = match self.date {
            Some(date) if errors.is_empty() => date,
            _ => return Err(errors),
        };

        Ok(Interview {
            id: new_id(),
            candidate_id: self.candidate_id,
            job_id: self.job_id,
            date,
            scheduled_at: self.scheduled_at,
            created_at: Some(now),
            notes: None,
            kind: non_blank(self.kind),
            score: self.score,
            updated_at: now.timestamp_millis(),
        })
    }
}

// ============================================================================
// Patches
// ============================================================================

impl Validate for JobPatch {
    fn validate(&self, _now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_if_present("title", &self.title, "Title is required.");
        errors.require_if_present("department", &self.department, "Department is required.");
        errors.into_result(())
    }
}

impl Validate for CandidatePatch {
    fn validate(&self, _now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_if_present("name", &self.name, "Name is required.");
        errors.require_if_present("email", &self.email, "Email is required.");
        errors.require_if_present("appliedJobId", &self.applied_job_id, "Job selection is required.");
        errors.into_result(())
    }
}

impl Validate for InterviewPatch {
    fn validate(&self, _now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_score(self.score);
        errors.into_result(())
    }
}
