//! End-to-end behaviour of the retrieval pipeline against fake services.

use super::fakes::{engine, hit, FakeEmbedder, FakeLlm, FakeStore};
use crate::rag::APOLOGY_MESSAGE;
use crate::types::Citation;
use std::sync::Arc;
use tutor_core::AppError;
use tutor_prompt::ChatTurn;

const IK_TEXT: &str = "IK solves joint angles...";

#[tokio::test]
async fn relevant_hit_becomes_context_and_citation() {
    let store = FakeStore::with_hits(vec![hit(1, 0.82, IK_TEXT, "Kinematics", "ch3/kinematics")]);
    let llm = FakeLlm::answering("Inverse kinematics finds joint angles for a target pose.");
    let engine = engine(FakeEmbedder::returning(vec![1.0, 0.0, 0.0]), store, llm.clone());

    let result = engine.chat("What is inverse kinematics?", &[]).await.unwrap();

    assert!(result.has_textbook_context);
    assert_eq!(
        result.citations,
        vec![Citation {
            title: "Kinematics".to_string(),
            chapter_path: "ch3/kinematics".to_string(),
            score: 0.82,
        }]
    );
    assert_eq!(
        result.response,
        "Inverse kinematics finds joint angles for a target pose."
    );

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("## Relevant Textbook Content:"));
    assert!(prompts[0].contains(IK_TEXT));
    assert!(prompts[0].contains("What is inverse kinematics?"));
}

#[tokio::test]
async fn hits_at_or_below_threshold_are_discarded() {
    let store = FakeStore::with_hits(vec![
        hit(1, 0.5, "borderline", "A", "a"),
        hit(2, 0.45, "weak", "B", "b"),
        hit(3, 0.1, "noise", "C", "c"),
    ]);
    let llm = FakeLlm::answering("General answer.");
    let engine = engine(FakeEmbedder::returning(vec![1.0, 0.0, 0.0]), store, llm.clone());

    let result = engine.chat("What is a gyroscope?", &[]).await.unwrap();

    assert!(!result.has_textbook_context);
    assert!(result.citations.is_empty());
    let prompt = &llm.prompts()[0];
    assert!(prompt.contains("No specific textbook content was found"));
    assert!(!prompt.contains("borderline"));
}

#[tokio::test]
async fn citations_keep_score_order_of_relevant_hits() {
    let store = FakeStore::with_hits(vec![
        hit(1, 0.91, "first", "Actuators", "ch2/actuators"),
        hit(2, 0.74, "second", "Sensors", "ch2/sensors"),
        hit(3, 0.40, "third", "History", "ch1/history"),
    ]);
    let llm = FakeLlm::answering("Answer.");
    let engine = engine(FakeEmbedder::returning(vec![0.0, 1.0, 0.0]), store, llm.clone());

    let result = engine.chat("How do robots sense?", &[]).await.unwrap();

    let scores: Vec<f32> = result.citations.iter().map(|c| c.score).collect();
    assert_eq!(scores, vec![0.91, 0.74]);
    assert!(llm.prompts()[0].contains("first\n\n---\n\nsecond"));
}

#[tokio::test]
async fn embedding_failure_skips_retrieval() {
    let embedder = FakeEmbedder::failing();
    let store = FakeStore::with_hits(vec![hit(1, 0.99, "unused", "X", "x")]);
    let llm = FakeLlm::answering("Answer from general knowledge.");
    let engine = engine(embedder.clone(), store.clone(), llm.clone());

    let result = engine.chat("What is ZMP?", &[]).await.unwrap();

    assert_eq!(embedder.calls(), 1);
    assert_eq!(store.searches(), 0);
    assert!(!result.has_textbook_context);
    assert!(result.citations.is_empty());
    assert_eq!(result.response, "Answer from general knowledge.");
    assert!(llm.prompts()[0].contains("## User's Question:\nWhat is ZMP?"));
}

#[tokio::test]
async fn search_failure_answers_without_context() {
    let store = FakeStore::failing();
    let llm = FakeLlm::answering("Still answered.");
    let engine = engine(FakeEmbedder::returning(vec![1.0, 0.0, 0.0]), store.clone(), llm);

    let result = engine.chat("Explain PID control", &[]).await.unwrap();

    assert_eq!(store.searches(), 1);
    assert!(!result.has_textbook_context);
    assert_eq!(result.response, "Still answered.");
}

#[tokio::test]
async fn completion_failure_uses_fallback_prompt() {
    let store = FakeStore::with_hits(vec![hit(1, 0.9, IK_TEXT, "Kinematics", "ch3/kinematics")]);
    let llm = FakeLlm::scripted(vec![Err("503"), Ok("Fallback answer.")]);
    let engine = engine(FakeEmbedder::returning(vec![1.0, 0.0, 0.0]), store, llm.clone());

    let result = engine.chat("What is inverse kinematics?", &[]).await.unwrap();

    assert_eq!(result.response, "Fallback answer.");
    assert!(result.citations.is_empty());
    assert!(!result.has_textbook_context);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("encountered an error retrieving textbook content"));
    assert!(prompts[1].contains("What is inverse kinematics?"));
    assert!(!prompts[1].contains(IK_TEXT));
}

#[tokio::test]
async fn empty_completion_uses_fallback_prompt() {
    let store = FakeStore::with_hits(Vec::new());
    let llm = FakeLlm::scripted(vec![Ok("   "), Ok("Recovered.")]);
    let engine = engine(FakeEmbedder::returning(vec![1.0, 0.0, 0.0]), store, llm);

    let result = engine.chat("What is a servo?", &[]).await.unwrap();
    assert_eq!(result.response, "Recovered.");
}

#[tokio::test]
async fn double_completion_failure_returns_apology() {
    let store = FakeStore::with_hits(vec![hit(1, 0.9, IK_TEXT, "Kinematics", "ch3/kinematics")]);
    let llm = FakeLlm::scripted(vec![Err("503"), Err("503")]);
    let engine = engine(FakeEmbedder::returning(vec![1.0, 0.0, 0.0]), store, llm.clone());

    let result = engine.chat("What is inverse kinematics?", &[]).await.unwrap();

    assert_eq!(result.response, APOLOGY_MESSAGE);
    assert!(result.citations.is_empty());
    assert!(!result.has_textbook_context);
    assert_eq!(llm.prompts().len(), 2);
}

#[tokio::test]
async fn every_service_down_still_yields_a_response() {
    for query in ["a", "What is SLAM?", "  padded  ", "¿Qué es un robot?"] {
        let engine = engine(
            FakeEmbedder::failing(),
            FakeStore::failing(),
            FakeLlm::scripted(Vec::new()),
        );
        let result = engine.chat(query, &[]).await.unwrap();
        assert!(!result.response.is_empty());
        assert_eq!(result.response, APOLOGY_MESSAGE);
    }
}

#[tokio::test]
async fn empty_query_is_rejected_before_any_call() {
    let embedder = FakeEmbedder::returning(vec![1.0, 0.0, 0.0]);
    let llm = FakeLlm::answering("unused");
    let engine = engine(embedder.clone(), FakeStore::with_hits(Vec::new()), llm.clone());

    for query in ["", "   ", "\n\t"] {
        let err = engine.chat(query, &[]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
    assert_eq!(embedder.calls(), 0);
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn only_last_three_history_turns_reach_the_prompt() {
    let history: Vec<ChatTurn> = (0..10)
        .map(|i| ChatTurn::new(format!("user turn {}", i), format!("ai turn {}", i)))
        .collect();
    let llm = FakeLlm::answering("ok");
    let engine = engine(
        FakeEmbedder::returning(vec![1.0, 0.0, 0.0]),
        FakeStore::with_hits(Vec::new()),
        llm.clone(),
    );

    engine.chat("And then?", &history).await.unwrap();

    let prompt = &llm.prompts()[0];
    for i in 0..7 {
        assert!(!prompt.contains(&format!("user turn {}\n", i)));
    }
    for i in 7..10 {
        assert!(prompt.contains(&format!("User: user turn {}\nAI: ai turn {}", i, i)));
    }
}

#[tokio::test]
async fn concurrent_requests_share_one_engine() {
    let store = FakeStore::with_hits(vec![hit(1, 0.8, IK_TEXT, "Kinematics", "ch3/kinematics")]);
    let llm = FakeLlm::scripted(vec![Ok("one"), Ok("two"), Ok("three")]);
    let engine = Arc::new(engine(
        FakeEmbedder::returning(vec![1.0, 0.0, 0.0]),
        store,
        llm.clone(),
    ));

    let (a, b, c) = tokio::join!(
        engine.chat("q1", &[]),
        engine.chat("q2", &[]),
        engine.chat("q3", &[])
    );

    let mut responses = vec![a.unwrap().response, b.unwrap().response, c.unwrap().response];
    responses.sort();
    assert_eq!(responses, vec!["one", "three", "two"]);
    assert_eq!(llm.prompts().len(), 3);
}

#[tokio::test]
async fn collection_info_is_separate_from_chat() {
    let engine = engine(
        FakeEmbedder::returning(vec![1.0, 0.0, 0.0]),
        FakeStore::with_hits(vec![hit(1, 0.8, "t", "T", "t")]),
        FakeLlm::scripted(Vec::new()),
    );

    let info = engine.collection_info().await.unwrap();
    assert_eq!(info.name, "textbook");
    assert_eq!(info.points_count, Some(1));

    let down = super::fakes::engine(
        FakeEmbedder::returning(vec![1.0, 0.0, 0.0]),
        FakeStore::failing(),
        FakeLlm::scripted(Vec::new()),
    );
    assert!(down.collection_info().await.is_err());
}
