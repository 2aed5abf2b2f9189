use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    Category, EndReason, Question, QuestionId, QuizResult, QuizSettings, UserId,
};
use quiz_core::time::{fixed_clock, fixed_now};
use services::{QuizSession, QuizSessionService, SessionError, SessionState, Ticker};
use storage::repository::{
    InMemoryRepository, QuestionRecord, QuestionRepository, ResultRepository, ResultRow,
    StorageError,
};

const CATEGORIES: [&str; 4] = ["History", "Science", "Geography", "Art"];

fn cat(name: &str) -> Category {
    Category::new(name).unwrap()
}

fn user() -> UserId {
    UserId::new("player@example.com").unwrap()
}

fn question(category: &str, i: usize) -> Question {
    Question::new(
        format!("{category} question {i}"),
        vec!["A".into(), "B".into(), "C".into(), "D".into()],
        i % 4,
        cat(category),
    )
    .unwrap()
}

async fn seeded(per_category: usize) -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    for name in CATEGORIES {
        for i in 0..per_category {
            repo.insert_question(&question(name, i), fixed_now())
                .await
                .unwrap();
        }
    }
    repo
}

/// Wraps the in-memory repository with switchable failures and extra
/// categories that have no questions.
#[derive(Default)]
struct ScriptedRepository {
    inner: InMemoryRepository,
    empty_categories: Vec<Category>,
    fail_loads: AtomicBool,
    fail_persist: AtomicBool,
    persist_calls: AtomicUsize,
}

impl ScriptedRepository {
    fn over(inner: InMemoryRepository) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    fn check_loads(&self) -> Result<(), StorageError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            Err(StorageError::Connection("backend unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl QuestionRepository for ScriptedRepository {
    async fn insert_question(
        &self,
        question: &Question,
        created_at: DateTime<Utc>,
    ) -> Result<QuestionId, StorageError> {
        self.inner.insert_question(question, created_at).await
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        self.inner.delete_question(id).await
    }

    async fn list_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        self.inner.list_questions().await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        self.check_loads()?;
        let mut categories = self.inner.list_categories().await?;
        categories.extend(self.empty_categories.iter().cloned());
        Ok(categories)
    }

    async fn fetch_questions(&self, category: &Category) -> Result<Vec<Question>, StorageError> {
        self.check_loads()?;
        self.inner.fetch_questions(category).await
    }
}

#[async_trait]
impl ResultRepository for ScriptedRepository {
    async fn persist_result(&self, result: &QuizResult) -> Result<(), StorageError> {
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("disk full".into()));
        }
        self.inner.persist_result(result).await
    }

    async fn list_results(&self, user_id: &UserId) -> Result<Vec<ResultRow>, StorageError> {
        self.inner.list_results(user_id).await
    }
}

fn service_over(repo: &Arc<ScriptedRepository>, settings: QuizSettings) -> QuizSessionService {
    QuizSessionService::new(fixed_clock(), settings, repo.clone(), repo.clone())
}

async fn started(service: &QuizSessionService) -> QuizSession {
    let mut session = service.new_session(user());
    service.load(&mut session).await.unwrap();
    session
}

/// Answer `count` questions of every category in order, correctly.
async fn answer_all(service: &QuizSessionService, session: &mut QuizSession, count: usize) {
    for name in CATEGORIES {
        service.select_category(session, &cat(name)).await.unwrap();
        for i in 0..count {
            session.answer_current(i, i % 4).unwrap();
        }
    }
}

#[tokio::test]
async fn full_submission_scores_every_category() {
    let repo = Arc::new(ScriptedRepository::over(seeded(12).await));
    let service = service_over(&repo, QuizSettings::default());
    let mut session = started(&service).await;

    assert_eq!(session.categories().len(), 4);
    assert_eq!(session.current_category(), Some(&cat("History")));
    answer_all(&service, &mut session, 12).await;
    assert!(session.is_complete());

    let submission = service.submit(&mut session).await.unwrap().unwrap();
    assert_eq!(submission.ended_by, EndReason::Submitted);
    assert_eq!(submission.score.total(), 48);
    assert_eq!(submission.score.percent(), 100);
    assert!(submission.persistence_error.is_none());
    assert_eq!(session.state(), SessionState::Terminal);

    let history = service.history(&user()).await.unwrap();
    assert_eq!(history.len(), 4);
    assert!(history.iter().all(|row| row.score.correct == 12));
}

#[tokio::test]
async fn expiry_submits_partial_answers() {
    let repo = Arc::new(ScriptedRepository::over(seeded(12).await));
    let service = service_over(&repo, QuizSettings::new(3, 10).unwrap());
    let mut session = started(&service).await;

    // 30 of 48: all of History and Science, half of Geography, one wrong.
    answer_all(&service, &mut session, 0).await;
    for (name, count) in [("History", 12), ("Science", 12), ("Geography", 6)] {
        service.select_category(&mut session, &cat(name)).await.unwrap();
        for i in 0..count {
            session.answer_current(i, i % 4).unwrap();
        }
    }
    service
        .select_category(&mut session, &cat("History"))
        .await
        .unwrap();
    session.answer_current(0, 3).unwrap();
    assert_eq!(session.overall_progress().answered, 30);
    assert!(matches!(
        service.submit(&mut session).await,
        Err(SessionError::InvalidSubmission {
            answered: 30,
            total: 48
        })
    ));

    assert!(service.tick(&mut session).await.unwrap().is_none());
    assert!(service.tick(&mut session).await.unwrap().is_none());
    let submission = service.tick(&mut session).await.unwrap().unwrap();
    assert_eq!(submission.ended_by, EndReason::Expired);
    assert_eq!(submission.score.total(), 29);
    assert_eq!(session.remaining_time(), 0);
    assert_eq!(repo.persist_calls.load(Ordering::SeqCst), 1);

    assert!(service.tick(&mut session).await.unwrap().is_none());
    assert!(service.submit(&mut session).await.unwrap().is_none());
    assert_eq!(repo.persist_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn ticker_drives_session_to_expiry() {
    let repo = Arc::new(ScriptedRepository::over(seeded(2).await));
    let service = service_over(&repo, QuizSettings::new(5, 10).unwrap());
    let mut session = started(&service).await;
    session.answer_current(0, 0).unwrap();

    let mut ticker = Ticker::every_second();
    let submission = service
        .run_clock(&mut session, &mut ticker)
        .await
        .unwrap()
        .expect("expiry submits");
    assert_eq!(submission.ended_by, EndReason::Expired);
    assert_eq!(submission.score.total(), 1);
    assert!(ticker.is_disposed());
    assert!(session.is_terminal());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(session.remaining_time(), 0);
}

#[tokio::test]
async fn empty_category_counts_as_complete() {
    let bank = InMemoryRepository::new();
    for i in 0..3 {
        bank.insert_question(&question("History", i), fixed_now())
            .await
            .unwrap();
    }
    let repo = Arc::new(ScriptedRepository {
        inner: bank,
        empty_categories: vec![cat("Science")],
        ..ScriptedRepository::default()
    });
    let service = service_over(&repo, QuizSettings::default());
    let mut session = started(&service).await;

    service
        .select_category(&mut session, &cat("Science"))
        .await
        .unwrap();
    assert!(session.visible_questions().is_empty());
    assert_eq!(session.progress(&cat("Science")).total, 0);

    service
        .select_category(&mut session, &cat("History"))
        .await
        .unwrap();
    for i in 0..3 {
        session.answer_current(i, 0).unwrap();
    }
    let submission = service.submit(&mut session).await.unwrap().unwrap();
    assert_eq!(submission.score.correct_for(&cat("Science")), Some(0));
    assert_eq!(submission.score.total(), 1);
}

#[tokio::test]
async fn later_answer_overwrites_earlier() {
    let repo = Arc::new(ScriptedRepository::over(seeded(4).await));
    let service = service_over(&repo, QuizSettings::default());
    let mut session = started(&service).await;

    let history = cat("History");
    session.record_answer(&history, 3, 1).unwrap();
    session.record_answer(&history, 3, 3).unwrap();
    assert_eq!(session.ledger().selection(&history, 3), Some(3));
    assert_eq!(session.progress(&history).answered, 1);
}

#[tokio::test]
async fn answers_survive_category_switches() {
    let repo = Arc::new(ScriptedRepository::over(seeded(4).await));
    let service = service_over(&repo, QuizSettings::default());
    let mut session = started(&service).await;

    session.answer_current(2, 2).unwrap();
    service
        .select_category(&mut session, &cat("Art"))
        .await
        .unwrap();
    service
        .select_category(&mut session, &cat("History"))
        .await
        .unwrap();
    assert_eq!(session.ledger().selection(&cat("History"), 2), Some(2));
    assert_eq!(session.visible_questions()[2].selected, Some(2));
}

#[tokio::test]
async fn persistence_failure_still_ends_session() {
    let repo = Arc::new(ScriptedRepository::over(seeded(1).await));
    repo.fail_persist.store(true, Ordering::SeqCst);
    let service = service_over(&repo, QuizSettings::default());
    let mut session = started(&service).await;
    answer_all(&service, &mut session, 1).await;

    let submission = service.submit(&mut session).await.unwrap().unwrap();
    assert!(matches!(
        submission.persistence_error,
        Some(SessionError::PersistenceFailure(_))
    ));
    assert_eq!(submission.score.total(), 4);
    assert!(session.is_terminal());
    assert!(session.persistence_error().is_some());
    assert_eq!(session.result().map(|r| r.total()), Some(4));
}

#[tokio::test]
async fn remaining_time_never_increases() {
    let repo = Arc::new(ScriptedRepository::over(seeded(2).await));
    let service = service_over(&repo, QuizSettings::new(10, 1).unwrap());
    let mut session = started(&service).await;

    let mut last = session.remaining_time();
    for name in CATEGORIES.iter().cycle().take(8) {
        service.tick(&mut session).await.unwrap();
        service.select_category(&mut session, &cat(name)).await.unwrap();
        session.next_page();
        session.prev_page();
        let now = session.remaining_time();
        assert!(now <= last);
        last = now;
    }
    assert_eq!(last, 2);
}

#[tokio::test]
async fn actions_after_terminal_are_ignored() {
    let repo = Arc::new(ScriptedRepository::over(seeded(1).await));
    let service = service_over(&repo, QuizSettings::default());
    let mut session = started(&service).await;
    answer_all(&service, &mut session, 1).await;
    service.submit(&mut session).await.unwrap().unwrap();

    let before = session.ledger().clone();
    let remaining = session.remaining_time();
    session.answer_current(0, 1).unwrap();
    session.next_page();
    service
        .select_category(&mut session, &cat("History"))
        .await
        .unwrap();
    assert!(service.tick(&mut session).await.unwrap().is_none());
    assert!(service.submit(&mut session).await.unwrap().is_none());

    assert_eq!(session.ledger(), &before);
    assert_eq!(session.remaining_time(), remaining);
    assert_eq!(session.current_category(), Some(&cat("Art")));
    assert_eq!(repo.persist_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_load_can_be_retried() {
    let repo = Arc::new(ScriptedRepository::over(seeded(2).await));
    repo.fail_loads.store(true, Ordering::SeqCst);
    let service = service_over(&repo, QuizSettings::default());
    let mut session = service.new_session(user());

    let err = service.load(&mut session).await.unwrap_err();
    assert!(matches!(err, SessionError::LoadFailure(_)));
    assert_eq!(session.state(), SessionState::Loading);
    assert!(session.load_error().is_some());
    assert_eq!(session.remaining_time(), 3600);

    repo.fail_loads.store(false, Ordering::SeqCst);
    service.load(&mut session).await.unwrap();
    assert!(session.is_active());
    assert!(session.load_error().is_none());
}

#[tokio::test]
async fn failed_category_fetch_keeps_current_view() {
    let repo = Arc::new(ScriptedRepository::over(seeded(2).await));
    let service = service_over(&repo, QuizSettings::default());
    let mut session = started(&service).await;
    session.answer_current(0, 0).unwrap();

    repo.fail_loads.store(true, Ordering::SeqCst);
    let err = service
        .select_category(&mut session, &cat("Science"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::LoadFailure(_)));
    assert!(session.is_active());
    assert_eq!(session.current_category(), Some(&cat("History")));
    assert_eq!(session.ledger().selection(&cat("History"), 0), Some(0));

    // Loaded categories are served from the session snapshot.
    service
        .select_category(&mut session, &cat("History"))
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_category_is_rejected() {
    let repo = Arc::new(ScriptedRepository::over(seeded(2).await));
    let service = service_over(&repo, QuizSettings::default());
    let mut session = started(&service).await;

    let err = service
        .select_category(&mut session, &cat("Music"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::UnknownCategory(_)));
    assert_eq!(session.current_category(), Some(&cat("History")));
}

#[tokio::test]
async fn late_fetch_after_expiry_is_dropped() {
    let repo = Arc::new(ScriptedRepository::over(seeded(2).await));
    let service = service_over(&repo, QuizSettings::new(1, 10).unwrap());
    let mut session = started(&service).await;

    let science = cat("Science");
    assert!(service.needs_fetch(&mut session, &science).unwrap());
    let fetched = service.fetch_category(&science).await;
    let submission = service.tick(&mut session).await.unwrap().unwrap();
    assert_eq!(submission.ended_by, EndReason::Expired);

    service
        .apply_category(&mut session, science.clone(), fetched)
        .unwrap();
    assert!(!session.is_loaded(&science));
    assert_eq!(session.result().map(|r| r.per_category().len()), Some(1));
}
