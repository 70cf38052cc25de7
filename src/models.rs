// Data models for HireTrack

use crate::record::{FieldValue, Record, new_id, now_ms};
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use eyre::Result;
use serde::{Deserialize, Serialize};

/// Job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub department: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Open,
    Closed,
}

/// Applicant for a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub email: String,
    pub applied_job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    pub stage: CandidateStage,
    /// Where the candidate came from, e.g. "LinkedIn", "Referral"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStage {
    Applied,
    Screened,
    Interviewed,
    Offered,
    Hired,
}

/// Interview of a candidate for a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: String,
    pub candidate_id: String,
    pub job_id: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// e.g. "phone", "on-site"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// 1-5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub updated_at: i64,
}

/// Staff account with a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default)]
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Staff,
}

impl Job {
    pub fn new(title: impl Into<String>, department: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            department: department.into(),
            status,
            description: None,
            required_skills: Vec::new(),
            created_at: Some(Utc::now()),
            updated_at: now_ms(),
        }
    }
}

impl Candidate {
    pub fn new(name: impl Into<String>, email: impl Into<String>, applied_job_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            email: email.into(),
            applied_job_id: applied_job_id.into(),
            resume_url: None,
            stage: CandidateStage::Applied,
            source: None,
            skills: Vec::new(),
            created_at: Some(Utc::now()),
            updated_at: now_ms(),
        }
    }
}

impl Interview {
    pub fn new(candidate_id: impl Into<String>, job_id: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            candidate_id: candidate_id.into(),
            job_id: job_id.into(),
            date,
            scheduled_at: None,
            created_at: Some(Utc::now()),
            notes: None,
            kind: None,
            score: None,
            updated_at: now_ms(),
        }
    }
}

fn opt_text(value: &Option<String>) -> Option<FieldValue> {
    value.as_deref().and_then(FieldValue::text)
}

impl Record for Job {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms;
    }

    fn collection_name() -> &'static str {
        "jobs"
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "title" => FieldValue::text(&self.title),
            "department" => FieldValue::text(&self.department),
            "status" => Some(FieldValue::Text(self.status.to_string())),
            "description" => opt_text(&self.description),
            "requiredSkills" => Some(FieldValue::Tags(self.required_skills.clone())),
            "createdAt" => self.created_at.map(FieldValue::Time),
            _ => None,
        }
    }
}

impl Record for Candidate {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms;
    }

    fn collection_name() -> &'static str {
        "candidates"
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => FieldValue::text(&self.name),
            "email" => FieldValue::text(&self.email),
            "appliedJobId" => FieldValue::text(&self.applied_job_id),
            "resumeUrl" => opt_text(&self.resume_url),
            "stage" => Some(FieldValue::Text(self.stage.to_string())),
            "source" => opt_text(&self.source),
            "skills" => Some(FieldValue::Tags(self.skills.clone())),
            "createdAt" => self.created_at.map(FieldValue::Time),
            _ => None,
        }
    }
}

impl Record for Interview {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms;
    }

    fn collection_name() -> &'static str {
        "interviews"
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "candidateId" => FieldValue::text(&self.candidate_id),
            "jobId" => FieldValue::text(&self.job_id),
            "date" => Some(FieldValue::Time(self.date)),
            "scheduledAt" => self.scheduled_at.map(FieldValue::Time),
            "createdAt" => self.created_at.map(FieldValue::Time),
            "notes" => opt_text(&self.notes),
            "type" => opt_text(&self.kind),
            "score" => self.score.map(FieldValue::Float),
            _ => None,
        }
    }
}

impl Record for User {
    fn id(&self) -> &str {
        &self.uid
    }

    fn updated_at(&self) -> i64 {
        self.updated_at
    }

    fn touch(&mut self, now_ms: i64) {
        self.updated_at = now_ms;
    }

    fn collection_name() -> &'static str {
        "users"
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => FieldValue::text(&self.name),
            "email" => FieldValue::text(&self.email),
            "role" => Some(FieldValue::Text(self.role.to_string())),
            "department" => opt_text(&self.department),
            _ => None,
        }
    }
}

/// Role of the user with `uid`, or None for an unknown user
pub fn role_of<S: RecordStore>(store: &S, uid: &str) -> Result<Option<UserRole>> {
    Ok(store.get::<User>(uid)?.map(|u| u.role))
}

// ============================================================================
// Partial updates
// ============================================================================

/// Changes to a job. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_skills: Option<Vec<String>>,
}

/// Changes to a candidate. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<CandidateStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}

/// Changes to an interview. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl InterviewPatch {
    /// Post-interview evaluation: a 1-5 score and free-form notes
    pub fn evaluation(score: f64, notes: impl Into<String>) -> Self {
        Self {
            score: Some(score),
            notes: Some(notes.into()),
            ..Default::default()
        }
    }
}

// ============================================================================
// Enum text forms
// ============================================================================

impl JobStatus {
    pub const ALL: [JobStatus; 2] = [JobStatus::Open, JobStatus::Closed];
}

impl CandidateStage {
    pub const ALL: [CandidateStage; 5] = [
        CandidateStage::Applied,
        CandidateStage::Screened,
        CandidateStage::Interviewed,
        CandidateStage::Offered,
        CandidateStage::Hired,
    ];
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Open => write!(f, "Open"),
            JobStatus::Closed => write!(f, "Closed"),
        }
    }
}

impl std::fmt::Display for CandidateStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateStage::Applied => write!(f, "Applied"),
            CandidateStage::Screened => write!(f, "Screened"),
            CandidateStage::Interviewed => write!(f, "Interviewed"),
            CandidateStage::Offered => write!(f, "Offered"),
            CandidateStage::Hired => write!(f, "Hired"),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Staff => write!(f, "staff"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|v| v.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown job status: {} (expected Open or Closed)", s))
    }
}

impl std::str::FromStr for CandidateStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandidateStage::ALL
            .into_iter()
            .find(|v| v.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Unknown candidate stage: {} (expected Applied, Screened, Interviewed, Offered or Hired)",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::TimeZone;

    #[test]
    fn test_job_serializes_camel_case() {
        let mut job = Job::new("Engineer", "R&D", JobStatus::Open);
        job.required_skills = vec!["Rust".to_string()];

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "Open");
        assert_eq!(json["requiredSkills"][0], "Rust");
        assert!(json.get("description").is_none());

        let back: Job = serde_json::from_value(json).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn test_job_without_optional_fields_deserializes() {
        let job: Job = serde_json::from_str(r#"{"id":"j1","title":"T","department":"D","status":"Closed"}"#).unwrap();
        assert_eq!(job.status, JobStatus::Closed);
        assert!(job.required_skills.is_empty());
        assert_eq!(job.updated_at, 0);
    }

    #[test]
    fn test_interview_type_field_name() {
        let mut interview = Interview::new("c1", "j1", Utc.with_ymd_and_hms(2030, 1, 2, 10, 0, 0).unwrap());
        interview.kind = Some("phone".to_string());

        let json = serde_json::to_value(&interview).unwrap();
        assert_eq!(json["type"], "phone");
        assert_eq!(json["candidateId"], "c1");
        assert_eq!(interview.field("type"), Some(FieldValue::Text("phone".to_string())));
    }

    #[test]
    fn test_candidate_fields() {
        let mut c = Candidate::new("Ada", "ada@example.com", "job-1");
        c.skills = vec!["Rust".to_string(), "Go".to_string()];

        assert_eq!(c.field("name"), Some(FieldValue::Text("Ada".to_string())));
        assert_eq!(c.field("stage"), Some(FieldValue::Text("Applied".to_string())));
        assert_eq!(c.field("appliedJobId"), Some(FieldValue::Text("job-1".to_string())));
        assert!(c.field("source").is_none());
        assert!(c.field("nope").is_none());

        c.source = Some(String::new());
        assert!(c.field("source").is_none());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("closed".parse::<JobStatus>(), Ok(JobStatus::Closed));
        assert_eq!("Hired".parse::<CandidateStage>(), Ok(CandidateStage::Hired));
        assert!("archived".parse::<JobStatus>().is_err());
        assert!("".parse::<CandidateStage>().is_err());
    }

    #[test]
    fn test_patch_skips_unset_fields() {
        let patch = JobPatch {
            status: Some(JobStatus::Closed),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), serde_json::json!({"status": "Closed"}));

        let eval = serde_json::to_value(InterviewPatch::evaluation(4.0, "Strong")).unwrap();
        assert_eq!(eval, serde_json::json!({"score": 4.0, "notes": "Strong"}));
    }

    #[test]
    fn test_role_of() {
        let mut store = MemoryStore::new();
        store
            .create(User {
                uid: "u1".to_string(),
                name: "Admin".to_string(),
                email: "admin@example.com".to_string(),
                role: UserRole::Admin,
                department: None,
                updated_at: 0,
            })
            .unwrap();

        assert_eq!(role_of(&store, "u1").unwrap(), Some(UserRole::Admin));
        assert_eq!(role_of(&store, "nobody").unwrap(), None);

        let json = serde_json::to_value(store.get::<User>("u1").unwrap().unwrap()).unwrap();
        assert_eq!(json["role"], "admin");
    }
}
