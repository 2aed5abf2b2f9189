use quiz_core::model::{
    Category, CategoryScore, EndReason, Question, QuizResult, ScoreResult, SessionId, UserId,
};
use quiz_core::time::fixed_now;
use storage::repository::{QuestionRepository, ResultRepository, StorageError};
use storage::sqlite::SqliteRepository;

fn build_question(text: &str, category: &str, answer: usize) -> Question {
    Question::new(
        text,
        vec!["A".into(), "B".into(), "C".into(), "D".into()],
        answer,
        Category::new(category).unwrap(),
    )
    .unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!(
        "sqlite:file:{name}?mode=memory&cache=shared"
    ))
    .await
    .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_questions_roundtrip_in_insertion_order() {
    let repo = connect("memdb_questions").await;

    let q1 = build_question("First", "History", 1);
    let q2 = build_question("Second", "Science", 3);
    let q3 = build_question("Third", "History", 0);
    for q in [&q1, &q2, &q3] {
        repo.insert_question(q, fixed_now()).await.unwrap();
    }

    let categories = repo.list_categories().await.unwrap();
    let names: Vec<_> = categories.iter().map(Category::as_str).collect();
    assert_eq!(names, ["History", "Science"]);

    let history = repo
        .fetch_questions(&Category::new("History").unwrap())
        .await
        .unwrap();
    assert_eq!(history, vec![q1.clone(), q3.clone()]);

    let unknown = repo
        .fetch_questions(&Category::new("Music").unwrap())
        .await
        .unwrap();
    assert!(unknown.is_empty());

    let all = repo.list_questions().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[1].question, q2);
    assert_eq!(all[1].created_at, fixed_now());
}

#[tokio::test]
async fn sqlite_delete_question() {
    let repo = connect("memdb_delete").await;
    let id = repo
        .insert_question(&build_question("Gone", "Art", 2), fixed_now())
        .await
        .unwrap();

    repo.delete_question(id).await.unwrap();
    assert!(repo.list_questions().await.unwrap().is_empty());
    assert!(repo.list_categories().await.unwrap().is_empty());
    assert!(matches!(
        repo.delete_question(id).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_results_overwrite_per_user_and_category() {
    let repo = connect("memdb_results").await;
    let user = UserId::new("player@example.com").unwrap();
    let history = Category::new("History").unwrap();
    let science = Category::new("Science").unwrap();

    let first = QuizResult::new(
        SessionId::generate(),
        user.clone(),
        ScoreResult::from_categories(vec![
            CategoryScore {
                category: history.clone(),
                correct: 1,
                total: 4,
            },
            CategoryScore {
                category: science.clone(),
                correct: 2,
                total: 2,
            },
        ]),
        EndReason::Expired,
        fixed_now(),
        fixed_now(),
    )
    .unwrap();
    repo.persist_result(&first).await.unwrap();

    let second_session = SessionId::generate();
    let second = QuizResult::new(
        second_session,
        user.clone(),
        ScoreResult::from_categories(vec![CategoryScore {
            category: history.clone(),
            correct: 4,
            total: 4,
        }]),
        EndReason::Submitted,
        fixed_now(),
        fixed_now(),
    )
    .unwrap();
    repo.persist_result(&second).await.unwrap();

    let rows = repo.list_results(&user).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].score.category, history);
    assert_eq!(rows[0].score.correct, 4);
    assert_eq!(rows[0].session_id, second_session);
    assert_eq!(rows[0].ended_by, EndReason::Submitted);
    assert_eq!(rows[1].score.category, science);
    assert_eq!(rows[1].ended_by, EndReason::Expired);

    let other = UserId::new("someone-else@example.com").unwrap();
    assert!(repo.list_results(&other).await.unwrap().is_empty());
}
