// tests/common/mod.rs
//
// In-process stand-ins for the remote LMS API and local scratch storage.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use assessment_engine::{
    AppError,
    config::Config,
    models::{
        assessment::AssessmentKind,
        catalog::{BatchAssignment, ExpiryPayload, SummaryDto},
        payload::{
            AssessmentDto, AssessmentRef, Identifier, LearnerIdResponse, ResultPayload,
            SavePayload, SaveResponse, StoreReply,
        },
    },
    services::{AssessmentStore, LearnerDirectory, StaticIdentity},
    state::EngineContext,
    storage::DraftStore,
};
use async_trait::async_trait;
use serde_json::Value;

#[derive(Default)]
struct StoreState {
    assessments: Vec<(AssessmentRef, AssessmentDto)>,
    saves: Vec<SavePayload>,
    save_replies: VecDeque<Result<SaveResponse, AppError>>,
    submissions: Vec<ResultPayload>,
    submit_replies: VecDeque<Result<StoreReply, AppError>>,
    deleted: Vec<AssessmentRef>,
    delete_replies: VecDeque<StoreReply>,
    quizzes: Vec<SummaryDto>,
    tests: Vec<SummaryDto>,
    expiries: Vec<ExpiryPayload>,
    assigned: Vec<BatchAssignment>,
    fail_fetch: bool,
}

/// Fake backend. Saves succeed with id 500 and item ids 101, 102, ...
/// unless a reply was queued.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    pub fn insert_assessment(&self, target: AssessmentRef, dto: Value) {
        let dto: AssessmentDto = serde_json::from_value(dto).expect("valid assessment fixture");
        self.state().assessments.push((target, dto));
    }

    pub fn fail_fetch(&self) {
        self.state().fail_fetch = true;
    }

    pub fn queue_save_reply(&self, reply: Result<SaveResponse, AppError>) {
        self.state().save_replies.push_back(reply);
    }

    pub fn queue_submit_reply(&self, reply: Result<StoreReply, AppError>) {
        self.state().submit_replies.push_back(reply);
    }

    pub fn queue_delete_reply(&self, reply: StoreReply) {
        self.state().delete_replies.push_back(reply);
    }

    pub fn set_quizzes(&self, rows: Value) {
        self.state().quizzes = serde_json::from_value(rows).expect("valid summary fixture");
    }

    pub fn set_tests(&self, rows: Value) {
        self.state().tests = serde_json::from_value(rows).expect("valid summary fixture");
    }

    pub fn saves(&self) -> Vec<SavePayload> {
        self.state().saves.clone()
    }

    pub fn saves_json(&self) -> Vec<Value> {
        self.saves()
            .iter()
            .map(|p| serde_json::to_value(p).unwrap())
            .collect()
    }

    pub fn submissions(&self) -> Vec<ResultPayload> {
        self.state().submissions.clone()
    }

    pub fn deleted(&self) -> Vec<AssessmentRef> {
        self.state().deleted.clone()
    }

    pub fn expiries(&self) -> Vec<ExpiryPayload> {
        self.state().expiries.clone()
    }

    pub fn assigned(&self) -> Vec<BatchAssignment> {
        self.state().assigned.clone()
    }
}

#[async_trait]
impl AssessmentStore for FakeStore {
    async fn fetch_assessment(&self, target: &AssessmentRef) -> Result<AssessmentDto, AppError> {
        let state = self.state();
        if state.fail_fetch {
            return Err(AppError::Persistence("connection refused".to_string()));
        }
        state
            .assessments
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, dto)| dto.clone())
            .ok_or_else(|| AppError::Persistence("404 Not Found".to_string()))
    }

    async fn save_assessment(&self, payload: &SavePayload) -> Result<SaveResponse, AppError> {
        let mut state = self.state();
        state.saves.push(payload.clone());
        match state.save_replies.pop_front() {
            Some(reply) => reply,
            None => Ok(SaveResponse {
                success: true,
                message: None,
                id: Some(Identifier::Number(500)),
                items: (0..payload.items().len())
                    .map(|i| Identifier::Number(101 + i as i64))
                    .collect(),
            }),
        }
    }

    async fn delete_assessment(&self, target: &AssessmentRef) -> Result<StoreReply, AppError> {
        let mut state = self.state();
        state.deleted.push(target.clone());
        Ok(state.delete_replies.pop_front().unwrap_or_else(StoreReply::ok))
    }

    async fn submit_result(&self, payload: &ResultPayload) -> Result<StoreReply, AppError> {
        let mut state = self.state();
        let reply = state.submit_replies.pop_front().unwrap_or_else(|| Ok(StoreReply::ok()));
        if matches!(reply, Ok(StoreReply { success: true, .. })) {
            state.submissions.push(payload.clone());
        }
        reply
    }

    async fn list_quizzes(&self, _module_id: &Identifier) -> Result<Vec<SummaryDto>, AppError> {
        Ok(self.state().quizzes.clone())
    }

    async fn list_tests(&self) -> Result<Vec<SummaryDto>, AppError> {
        Ok(self.state().tests.clone())
    }

    async fn set_expiry(&self, payload: &ExpiryPayload) -> Result<StoreReply, AppError> {
        self.state().expiries.push(payload.clone());
        Ok(StoreReply::ok())
    }

    async fn check_assignment(&self, payload: &BatchAssignment) -> Result<StoreReply, AppError> {
        let already = self.state().assigned.contains(payload);
        Ok(StoreReply {
            success: already,
            message: None,
        })
    }

    async fn assign_to_batch(&self, payload: &BatchAssignment) -> Result<StoreReply, AppError> {
        self.state().assigned.push(payload.clone());
        Ok(StoreReply {
            success: true,
            message: Some("Test has been successfully assigned to batch.".to_string()),
        })
    }
}

/// Maps account uids to student numbers.
#[derive(Default)]
pub struct FakeLearners {
    ids: HashMap<String, String>,
}

impl FakeLearners {
    pub fn with(account: &str, id_number: &str) -> Arc<Self> {
        let mut ids = HashMap::new();
        ids.insert(account.to_string(), id_number.to_string());
        Arc::new(Self { ids })
    }
}

#[async_trait]
impl LearnerDirectory for FakeLearners {
    async fn lookup_learner_id(&self, account_uid: &str) -> Result<LearnerIdResponse, AppError> {
        self.ids
            .get(account_uid)
            .map(|id| LearnerIdResponse {
                id_number: id.clone(),
            })
            .ok_or_else(|| AppError::Persistence("student not found".to_string()))
    }
}

/// Draft store that remembers every write in order.
#[derive(Default)]
pub struct RecordingDrafts {
    entries: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
}

impl RecordingDrafts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn writes_to(&self, key: &str) -> Vec<String> {
        self.writes()
            .into_iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl DraftStore for RecordingDrafts {
    async fn put(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.value(key))
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

pub const MODULE_ID: i64 = 9;

pub fn quiz_kind() -> AssessmentKind {
    AssessmentKind::Quiz {
        module_id: Identifier::Number(MODULE_ID),
    }
}

pub fn quiz_ref(id: i64) -> AssessmentRef {
    AssessmentRef::QuizId(Identifier::Number(id))
}

pub struct Harness {
    pub store: Arc<FakeStore>,
    pub drafts: Arc<RecordingDrafts>,
    pub context: EngineContext,
}

/// Context with a signed-in learner `uid-1` whose student number is `2021-0001`.
pub fn harness() -> Harness {
    harness_with_identity(StaticIdentity::signed_in("uid-1"))
}

pub fn harness_with_identity(identity: StaticIdentity) -> Harness {
    let store = FakeStore::new();
    let drafts = RecordingDrafts::new();
    let context = EngineContext::new(
        Config::default(),
        store.clone(),
        drafts.clone(),
        Arc::new(identity),
        FakeLearners::with("uid-1", "2021-0001"),
    );
    Harness {
        store,
        drafts,
        context,
    }
}
