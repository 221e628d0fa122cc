use std::time::Duration;

use mindflow_core::config::Config;
use mindflow_core::{ChatService, LearningPathService, LessonService, LessonSource, ServiceError};
use mindflow_lesson::{LessonPipeline, Origin, PathSource, Strategy};
use mindflow_llm::OpenRouterProvider;
use mindflow_store::{CachedLessonStore, LessonStore, SqliteStore, TtlCache};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEGMENTS: &str = r#"[
  {"id":"1","title":"What is a Star?","content":"A star is a ball of hot gas.","keyPoints":["Gas","Gravity"],"question":{"text":"What holds a star together?","options":["Magnetism","Gravity","Wind"],"correctAnswer":1,"explanation":"Gravity pulls the gas inward."},"completed":false},
  {"id":2,"title":"Fusion","content":"Stars fuse hydrogen into helium.","keyPoints":["Hydrogen","Helium"],"question":{"text":"What do stars fuse?","options":["Hydrogen","Iron"],"correctAnswer":0,"explanation":"Hydrogen nuclei fuse."},"completed":false}
]"#;

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "gen-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

async fn mount_reply(server: &MockServer, content: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.llm.base_url = server.uri();
    config.store.path = ":memory:".into();
    config
}

fn provider(config: &Config) -> OpenRouterProvider {
    OpenRouterProvider::new(
        "sk-or-test".into(),
        config.llm.base_url.clone(),
        config.llm.model.clone(),
        Duration::from_secs(5),
    )
    .unwrap()
    .with_max_tokens(config.llm.max_tokens)
}

async fn lesson_service(
    config: &Config,
) -> LessonService<OpenRouterProvider, CachedLessonStore<SqliteStore>> {
    let store = SqliteStore::new(&config.store.path).await.unwrap();
    LessonService::new(
        provider(config),
        CachedLessonStore::new(store, TtlCache::new(config.store.cache_ttl())),
        LessonPipeline::new(config.extraction_policy()),
        config.prompt_builder(),
        config.lesson.shape,
    )
}

#[tokio::test]
async fn chatty_tagged_lesson_is_extracted_stored_and_reused() {
    let server = MockServer::start().await;
    let raw = format!("Sure! Here is your lesson:\n<output>\n{SEGMENTS}\n</output>\nHave fun!");
    mount_reply(&server, &raw, 1).await;

    let config = test_config(&server);
    let svc = lesson_service(&config).await;

    let first = svc.deliver("astro-1", "Stars").await;
    assert!(first.error.is_none());
    assert_eq!(
        first.source,
        LessonSource::Generated(Origin::Extracted {
            strategy: Some(Strategy::DirectParse),
            delimited: true,
            repaired: false,
        })
    );
    assert_eq!(first.lesson.segments().len(), 2);
    assert_eq!(first.lesson.segments()[1].id, "2");

    let second = svc.deliver("astro-1", "Stars").await;
    assert_eq!(second.source, LessonSource::Store);
    assert_eq!(second.lesson, first.lesson);

    let persisted = svc.store().inner().get("astro-1").await.unwrap();
    assert_eq!(persisted, Some(first.lesson));
}

#[tokio::test]
async fn truncated_output_keeps_complete_segments() {
    let server = MockServer::start().await;
    let cut = SEGMENTS.find(r#"{"id":2"#).unwrap() + 20;
    mount_reply(&server, &SEGMENTS[..cut], 1).await;

    let config = test_config(&server);
    let delivery = lesson_service(&config).await.deliver("astro-2", "Stars").await;

    assert!(!delivery.source.is_fallback());
    assert_eq!(delivery.lesson.segments().len(), 1);
    assert_eq!(delivery.lesson.first().title, "What is a Star?");
}

#[tokio::test]
async fn upstream_error_yields_fallback_lesson() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server);
    let svc = lesson_service(&config).await;
    let delivery = svc.deliver("chess-1", "Chess").await;

    assert_eq!(delivery.source, LessonSource::Unavailable);
    assert!(matches!(delivery.error, Some(ServiceError::Upstream(_))));
    let segment = delivery.lesson.first();
    assert!(segment.question.correct_answer < segment.question.options.len());
    assert!(svc.store().inner().get("chess-1").await.unwrap().is_none());

    let json = serde_json::to_value(&delivery).unwrap();
    assert_eq!(json["source"]["kind"], "unavailable");
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn prose_reply_falls_back_with_diagnostic() {
    let server = MockServer::start().await;
    mount_reply(&server, "I'm sorry, I can only chat about that.", 1).await;

    let config = test_config(&server);
    let svc = lesson_service(&config).await;
    let delivery = svc.deliver("x-1", "Knitting").await;

    assert_eq!(delivery.source, LessonSource::Generated(Origin::Fallback));
    let diagnostic = delivery.diagnostic.unwrap();
    assert_eq!(diagnostic.raw, "I'm sorry, I can only chat about that.");
    assert!(svc.store().inner().get("x-1").await.unwrap().is_none());
}

#[tokio::test]
async fn learning_path_from_numbered_list() {
    let server = MockServer::start().await;
    mount_reply(
        &server,
        "Here is a path for you:\n1. Basics\n2. Openings\n3. Endgames",
        1,
    )
    .await;

    let config = test_config(&server);
    let svc = LearningPathService::new(
        provider(&config),
        config.prompt_builder(),
        config.extraction_policy(),
    );
    let delivery = svc.generate("Chess").await;

    assert!(delivery.error.is_none());
    assert_eq!(delivery.path.source, PathSource::List);
    assert_eq!(delivery.path.titles, vec!["Basics", "Openings", "Endgames"]);
}

#[tokio::test]
async fn chat_sends_history_and_persists_replies() {
    let server = MockServer::start().await;
    mount_reply(&server, "Happy to help!", 2).await;

    let config = test_config(&server);
    let store = SqliteStore::new(&config.store.path).await.unwrap();
    let svc = ChatService::new(provider(&config), store, config.chat.history_limit);

    svc.send("u1", "hello").await.unwrap();
    let reply = svc.send("u1", "teach me rust").await.unwrap();
    assert_eq!(reply.content, "Happy to help!");
    assert!(reply.error.is_none());
    assert_eq!(svc.history("u1").await.unwrap().len(), 4);
    assert_eq!(svc.clear("u1").await.unwrap(), 4);
    assert!(svc.history("u1").await.unwrap().is_empty());

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[1].body_json().unwrap();
    let roles: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(body["messages"][3]["content"], "teach me rust");
}
