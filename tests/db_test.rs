mod common;

use chrono::Utc;
use common::create_test_db;
use studium::models::{GeneratedAnswer, Level, Question, Topic};
use ulid::Ulid;

fn sample_topic() -> Topic {
    let question = |text: &str| Question {
        id: Ulid::new().to_string(),
        text: text.to_owned(),
        answers: vec![
            GeneratedAnswer {
                id: Ulid::new().to_string(),
                level: Level::Low,
                text: "a partial answer".to_owned(),
            },
            GeneratedAnswer {
                id: Ulid::new().to_string(),
                level: Level::Low,
                text: "another partial answer".to_owned(),
            },
            GeneratedAnswer {
                id: Ulid::new().to_string(),
                level: Level::Medium,
                text: "a decent answer".to_owned(),
            },
            GeneratedAnswer {
                id: Ulid::new().to_string(),
                level: Level::High,
                text: "a complete answer".to_owned(),
            },
        ],
    };

    Topic {
        id: Ulid::new().to_string(),
        title: "Photosynthesis".to_owned(),
        created_utc: Utc::now(),
        conspect: None,
        teacher_id: Some("teacher-1".to_owned()),
        questions: vec![question("What is chlorophyll?"), question("Why are leaves green?")],
    }
}

#[tokio::test]
async fn topic_graph_round_trips() {
    let db = create_test_db().await;
    let topic = sample_topic();

    db.insert_topic(&topic).await.unwrap();

    let loaded = db.get_topic(&topic.id).await.unwrap().unwrap();
    assert_eq!(loaded.title, "Photosynthesis");
    assert_eq!(loaded.teacher_id.as_deref(), Some("teacher-1"));
    assert_eq!(loaded.questions.len(), 2);
    // input order preserved
    assert_eq!(loaded.questions[0].text, "What is chlorophyll?");
    assert_eq!(loaded.questions[1].text, "Why are leaves green?");
    // answers come back strongest level first
    let levels: Vec<Level> = loaded.questions[0].answers.iter().map(|a| a.level).collect();
    assert_eq!(levels, vec![Level::High, Level::Medium, Level::Low, Level::Low]);
}

#[tokio::test]
async fn missing_topic_is_none() {
    let db = create_test_db().await;
    assert!(db.get_topic("nope").await.unwrap().is_none());
    assert!(!db.topic_exists("nope").await.unwrap());
}

#[tokio::test]
async fn conspect_backfill_updates_topic() {
    let db = create_test_db().await;
    let topic = sample_topic();
    db.insert_topic(&topic).await.unwrap();

    db.set_topic_conspect(&topic.id, "Section 1: Light\n...")
        .await
        .unwrap();

    let loaded = db.get_topic(&topic.id).await.unwrap().unwrap();
    assert_eq!(loaded.conspect.as_deref(), Some("Section 1: Light\n..."));
}

#[tokio::test]
async fn session_creation_is_idempotent_per_topic_and_student() {
    let db = create_test_db().await;
    let topic = sample_topic();
    db.insert_topic(&topic).await.unwrap();

    let now = Utc::now().to_rfc3339();
    let first = db
        .find_or_create_session(&Ulid::new().to_string(), &topic.id, "student-1", &now)
        .await
        .unwrap();
    let second = db
        .find_or_create_session(&Ulid::new().to_string(), &topic.id, "student-1", &now)
        .await
        .unwrap();

    assert_eq!(first, second);

    // a different student still gets their own session
    let other = db
        .find_or_create_session(&Ulid::new().to_string(), &topic.id, "student-2", &now)
        .await
        .unwrap();
    assert_ne!(first, other);
}

#[tokio::test]
async fn resubmitting_a_question_replaces_the_response() {
    let db = create_test_db().await;
    let topic = sample_topic();
    db.insert_topic(&topic).await.unwrap();

    let session_id = db
        .find_or_create_session(
            &Ulid::new().to_string(),
            &topic.id,
            "student-1",
            &Utc::now().to_rfc3339(),
        )
        .await
        .unwrap();

    let question_id = topic.questions[0].id.clone();
    let submission = |answer: &str| {
        (
            Ulid::new().to_string(),
            studium::models::AnswerSubmission {
                question_id: question_id.clone(),
                answer: answer.to_owned(),
            },
        )
    };

    db.upsert_responses(&session_id, &[submission("first try")])
        .await
        .unwrap();
    db.upsert_responses(&session_id, &[submission("second try")])
        .await
        .unwrap();

    let responses = db.responses_for_session(&session_id).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].answer, "second try");
}

#[tokio::test]
async fn concurrent_resubmissions_leave_one_response() {
    let db = create_test_db().await;
    let topic = sample_topic();
    db.insert_topic(&topic).await.unwrap();

    let session_id = db
        .find_or_create_session(
            &Ulid::new().to_string(),
            &topic.id,
            "student-1",
            &Utc::now().to_rfc3339(),
        )
        .await
        .unwrap();

    let question_id = topic.questions[0].id.clone();
    let writer = |answer: &str| {
        let db = db.clone();
        let session_id = session_id.clone();
        let entries = vec![(
            Ulid::new().to_string(),
            studium::models::AnswerSubmission {
                question_id: question_id.clone(),
                answer: answer.to_owned(),
            },
        )];
        tokio::spawn(async move { db.upsert_responses(&session_id, &entries).await })
    };

    let (a, b) = tokio::join!(writer("racing answer a"), writer("racing answer b"));
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    let responses = db.responses_for_session(&session_id).await.unwrap();
    assert_eq!(responses.len(), 1);
    assert!(responses[0].answer.starts_with("racing answer"));
}

#[tokio::test]
async fn evaluation_insert_is_write_once() {
    let db = create_test_db().await;
    let topic = sample_topic();
    db.insert_topic(&topic).await.unwrap();

    let session_id = db
        .find_or_create_session(
            &Ulid::new().to_string(),
            &topic.id,
            "student-1",
            &Utc::now().to_rfc3339(),
        )
        .await
        .unwrap();

    let first = db
        .insert_evaluation(&Ulid::new().to_string(), &session_id, 75.0, "{}")
        .await
        .unwrap();
    let second = db
        .insert_evaluation(&Ulid::new().to_string(), &session_id, 10.0, "{\"other\":1}")
        .await
        .unwrap();

    assert_eq!(first, second);

    let stored = db.evaluation_for_session(&session_id).await.unwrap().unwrap();
    assert_eq!(stored.id, first);
    assert_eq!(stored.total_score, 75.0);
    assert_eq!(stored.report_json, "{}");

    let by_id = db.get_evaluation(&first).await.unwrap().unwrap();
    assert_eq!(by_id.session_id, session_id);
    assert_eq!(db.report_by_session(&session_id).await.unwrap().unwrap(), "{}");
}

#[tokio::test]
async fn documents_round_trip_with_embeddings() {
    let db = create_test_db().await;

    let doc = studium::models::RagDocument {
        id: Ulid::new().to_string(),
        source: Some("notes.txt".to_owned()),
        content: "Plants convert light to energy.".to_owned(),
        embedding: vec![0.1, -0.5, 2.0],
    };
    db.insert_document(&doc).await.unwrap();

    let docs = db.documents().await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].source.as_deref(), Some("notes.txt"));
    assert_eq!(docs[0].embedding, vec![0.1, -0.5, 2.0]);
}

#[tokio::test]
async fn class_membership_backs_teacher_checks() {
    let db = create_test_db().await;

    db.create_class("class-1", "7B", "teacher-1").await.unwrap();
    db.add_class_member("class-1", "student-1").await.unwrap();
    // duplicate membership is a no-op
    db.add_class_member("class-1", "student-1").await.unwrap();

    assert!(db.teacher_has_student("teacher-1", "student-1").await.unwrap());
    assert!(!db.teacher_has_student("teacher-1", "student-2").await.unwrap());
    assert!(!db.teacher_has_student("teacher-2", "student-1").await.unwrap());
}
