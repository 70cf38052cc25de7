// Filter sets for the jobs, candidates and interviews screens

use crate::filter::{Accessor, FilterKind};
use crate::lookup::Labels;
use crate::models::{Candidate, Interview, Job};
use crate::record::{FieldValue, Record};
use crate::screen::{Screen, ScreenError};
use crate::store::RecordStore;
use crate::view::FilterDef;
use std::num::NonZeroUsize;
use std::sync::Arc;

// Filter names, shared by all screens that offer them
pub const SEARCH: &str = "search";
pub const STATUS: &str = "status";
pub const DEPARTMENT: &str = "department";
pub const STAGE: &str = "stage";
pub const JOB: &str = "job";
pub const CANDIDATE: &str = "candidate";
pub const DATE: &str = "date";

/// Jobs: title search, status and department dropdowns
pub fn job_filters() -> Vec<FilterDef<Job>> {
    vec![
        FilterDef::new(SEARCH, FilterKind::TextContains, Accessor::field("title")),
        FilterDef::new(STATUS, FilterKind::Equals, Accessor::field("status")),
        FilterDef::new(DEPARTMENT, FilterKind::Equals, Accessor::field("department")),
    ]
}

/// Candidates: name search and stage dropdown
pub fn candidate_filters() -> Vec<FilterDef<Candidate>> {
    vec![
        FilterDef::new(SEARCH, FilterKind::TextContains, Accessor::field("name")),
        FilterDef::new(STAGE, FilterKind::Equals, Accessor::field("stage")),
    ]
}

/// Interviews: candidate-name search, job and candidate dropdowns, and a day picker
pub fn interview_filters(candidates: &[Candidate]) -> Vec<FilterDef<Interview>> {
    vec![
        interview_search(candidates),
        FilterDef::new(JOB, FilterKind::Equals, Accessor::field("jobId")),
        FilterDef::new(CANDIDATE, FilterKind::Equals, Accessor::field("candidateId")),
        FilterDef::new(DATE, FilterKind::DateEquals, Accessor::field("date")),
    ]
}

/// Search interviews by the name of their candidate.
///
/// Interviews whose candidate is not loaded have no name and never match a search.
pub fn interview_search(candidates: &[Candidate]) -> FilterDef<Interview> {
    let names = Arc::new(Labels::build(candidates, |c| c.name.as_str()));
    FilterDef::new(
        SEARCH,
        FilterKind::TextContains,
        Accessor::new(move |i: &Interview| names.resolve(&i.candidate_id).and_then(FieldValue::text)),
    )
}

/// Interviews screen together with the collections its rows refer to
#[derive(Debug)]
pub struct InterviewBoard {
    pub screen: Screen<Interview>,
    jobs: Vec<Job>,
    candidates: Vec<Candidate>,
    job_titles: Labels,
    candidate_names: Labels,
}

impl InterviewBoard {
    /// Load jobs, candidates and interviews for the screen
    pub fn enter<S: RecordStore>(store: &S, page_size: NonZeroUsize) -> Result<Self, ScreenError> {
        let jobs = load::<S, Job>(store)?;
        let candidates = load::<S, Candidate>(store)?;
        let screen = Screen::enter(store, interview_filters(&candidates), page_size)?;

        Ok(Self {
            screen,
            job_titles: Labels::build(&jobs, |j| j.title.as_str()),
            candidate_names: Labels::build(&candidates, |c| c.name.as_str()),
            jobs,
            candidates,
        })
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Swap in a fresh candidates collection; the search filter depends on it
    pub fn set_candidates(&mut self, candidates: Vec<Candidate>) {
        self.candidate_names = Labels::build(&candidates, |c| c.name.as_str());
        self.screen.view_mut().replace_filter(interview_search(&candidates));
        self.candidates = candidates;
    }

    pub fn set_jobs(&mut self, jobs: Vec<Job>) {
        self.job_titles = Labels::build(&jobs, |j| j.title.as_str());
        self.jobs = jobs;
    }

    /// Candidate name, or the raw id for a dangling reference
    pub fn candidate_name(&self, id: &str) -> String {
        self.candidate_names.get(id)
    }

    /// Job title, or the raw id for a dangling reference
    pub fn job_title(&self, id: &str) -> String {
        self.job_titles.get(id)
    }
}

fn load<S: RecordStore, R: Record>(store: &S) -> Result<Vec<R>, ScreenError> {
    store
        .list::<R>()
        .map_err(|e| ScreenError::load(R::collection_name(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::models::JobStatus;
    use crate::view::DEFAULT_PAGE_SIZE;
    use chrono::{TimeZone, Utc};

    struct Fixture {
        store: MemoryStore,
        job: String,
        ada: String,
        bob: String,
    }

    fn fixture() -> Fixture {
        let mut store = MemoryStore::new();
        let job = store.create(Job::new("Backend Engineer", "Engineering", JobStatus::Open)).unwrap();
        let ada = store.create(Candidate::new("Ada Lovelace", "ada@example.com", &job)).unwrap();
        let bob = store.create(Candidate::new("Bob Smith", "bob@example.com", "job-gone")).unwrap();

        let slots = [
            (&ada, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
            (&ada, Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap()),
            (&bob, Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap()),
        ];
        for (candidate, at) in slots {
            store.create(Interview::new(candidate.as_str(), &job, at)).unwrap();
        }
        store
            .create(Interview::new("candidate-gone", "job-gone", Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()))
            .unwrap();

        Fixture { store, job, ada, bob }
    }

    #[test]
    fn test_job_filters() {
        let mut store = MemoryStore::new();
        for (title, dept, status) in [
            ("Backend Engineer", "Engineering", JobStatus::Open),
            ("Frontend Engineer", "Engineering", JobStatus::Closed),
            ("Account Executive", "Sales", JobStatus::Open),
        ] {
            store.create(Job::new(title, dept, status)).unwrap();
        }

        let mut screen = Screen::enter(&store, job_filters(), DEFAULT_PAGE_SIZE).unwrap();
        let view = screen.view_mut();
        assert_eq!(view.facet(DEPARTMENT), vec!["Engineering", "Sales"]);

        view.set_filter(SEARCH, "engineer");
        assert_eq!(view.current_slice().total_items, 2);
        view.set_filter(STATUS, "Open");
        assert_eq!(view.current_slice().total_items, 1);
        view.set_filter(SEARCH, "");
        view.set_filter(DEPARTMENT, "Sales");
        assert_eq!(view.current_slice().items[0].title, "Account Executive");
    }

    #[test]
    fn test_candidate_filters() {
        let f = fixture();
        let mut screen = Screen::enter(&f.store, candidate_filters(), DEFAULT_PAGE_SIZE).unwrap();
        let view = screen.view_mut();

        assert_eq!(view.facet(STAGE), vec!["Applied"]);
        view.set_filter(SEARCH, "LOVE");
        let slice = view.current_slice();
        assert_eq!(slice.total_items, 1);
        assert_eq!(slice.items[0].id, f.ada);

        view.set_filter(STAGE, "Hired");
        assert_eq!(view.current_slice().total_items, 0);
    }

    #[test]
    fn test_interview_date_filter_is_same_day() {
        let f = fixture();
        let mut board = InterviewBoard::enter(&f.store, DEFAULT_PAGE_SIZE).unwrap();

        board.screen.view_mut().set_filter(DATE, "2024-03-01");
        assert_eq!(board.screen.view().current_slice().total_items, 3);

        board.screen.view_mut().set_filter(DATE, "2024-03-02");
        let slice = board.screen.view().current_slice();
        assert_eq!(slice.total_items, 1);
        assert_eq!(slice.items[0].candidate_id, f.bob);
    }

    #[test]
    fn test_interview_search_by_candidate_name() {
        let f = fixture();
        let mut board = InterviewBoard::enter(&f.store, DEFAULT_PAGE_SIZE).unwrap();

        board.screen.view_mut().set_filter(SEARCH, "ada");
        assert_eq!(board.screen.view().current_slice().total_items, 2);

        // the dangling interview has no candidate name to match, even on its id
        board.screen.view_mut().set_filter(SEARCH, "gone");
        assert_eq!(board.screen.view().current_slice().total_items, 0);
    }

    #[test]
    fn test_interview_job_and_candidate_filters() {
        let f = fixture();
        let mut board = InterviewBoard::enter(&f.store, DEFAULT_PAGE_SIZE).unwrap();
        let view = board.screen.view_mut();

        view.set_filter(JOB, f.job.as_str());
        assert_eq!(view.current_slice().total_items, 3);
        view.set_filter(CANDIDATE, f.ada.as_str());
        assert_eq!(view.current_slice().total_items, 2);
    }

    #[test]
    fn test_labels_fall_back_to_ids() {
        let f = fixture();
        let board = InterviewBoard::enter(&f.store, DEFAULT_PAGE_SIZE).unwrap();

        assert_eq!(board.job_title(&f.job), "Backend Engineer");
        assert_eq!(board.candidate_name(&f.ada), "Ada Lovelace");
        assert_eq!(board.job_title("job-gone"), "job-gone");
        assert_eq!(board.candidate_name("candidate-gone"), "candidate-gone");
    }

    #[test]
    fn test_reloading_candidates_updates_search() {
        let f = fixture();
        let mut board = InterviewBoard::enter(&f.store, DEFAULT_PAGE_SIZE).unwrap();
        board.screen.view_mut().set_filter(SEARCH, "lovelace");
        assert_eq!(board.screen.view().current_slice().total_items, 2);

        let renamed: Vec<Candidate> = board
            .candidates()
            .iter()
            .cloned()
            .map(|mut c| {
                if c.id == f.ada {
                    c.name = "Ada King".to_string();
                }
                c
            })
            .collect();
        board.set_candidates(renamed);

        assert_eq!(board.screen.view().current_slice().total_items, 0);
        assert_eq!(board.screen.view().filter_value(SEARCH), "lovelace");
        assert_eq!(board.candidate_name(&f.ada), "Ada King");
        assert_eq!(board.jobs().len(), 1);
    }
}
