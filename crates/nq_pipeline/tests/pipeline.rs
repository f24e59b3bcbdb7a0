use std::io::Write;
use std::sync::Arc;

use nq_inference::{create_model, ModelConfig, ModelKind, NO_INFORMATION_MESSAGE};
use nq_pipeline::{PipelineConfig, QueryProcessor, SearchAnalytics};
use nq_storage::create_index;

const CORPUS: &str = r#"[
  {"id": "ai", "title": "AI 투자 급증", "url": "https://news.test/ai",
   "published_date": "2024-03-02T09:00:00+09:00", "categories": ["IT", "경제"],
   "content": "올해 AI 스타트업 투자가 급증했다. 벤처캐피털은 생성형 AI 기술에 집중했다. 날씨는 맑았다."},
  {"id": "chip", "title": "AI 반도체 수출 호조", "url": "https://news.test/chip",
   "published_date": "2024-03-01", "categories": ["산업"],
   "content": "AI 서버용 반도체 수출이 늘었다."},
  {"id": "house", "title": "부동산 거래 위축", "url": "https://news.test/house",
   "content": "아파트 거래량이 크게 줄었다."}
]"#;

async fn processor() -> (tempfile::NamedTempFile, Arc<QueryProcessor>) {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(CORPUS.as_bytes()).unwrap();

    let index = create_index("memory", Some(file.path())).await.unwrap();
    let model = create_model(&ModelConfig::new(ModelKind::Extractive)).unwrap();
    let processor = QueryProcessor::new(index, model.clone(), model, PipelineConfig::default());
    (file, Arc::new(processor))
}

#[tokio::test]
async fn test_answers_from_loaded_corpus() {
    let (_file, processor) = processor().await;
    let result = processor.process_query("AI 기술 투자 동향").await.unwrap();

    let primary = result.primary.as_ref().expect("primary article");
    assert_eq!(primary.id.as_str(), "ai");
    assert!(result.score > 0.0 && result.score <= 100.0);
    assert!(result.related.iter().all(|a| a.id != primary.id));
    assert_eq!(result.related.len(), 1);
    assert_eq!(result.related[0].id.as_str(), "chip");
    assert!(result.answer.contains("AI 스타트업 투자가 급증했다."));
    assert!(!result.answer.contains("날씨"));
}

#[tokio::test]
async fn test_unrelated_question_gets_no_information() {
    let (_file, processor) = processor().await;
    let result = processor.process_query("우주 탐사 계획").await.unwrap();
    assert!(result.primary.is_none());
    assert!(result.related.is_empty());
    assert_eq!(result.score, 0.0);
    assert_eq!(result.answer, NO_INFORMATION_MESSAGE);
}

#[tokio::test]
async fn test_serialized_result_shape() {
    let (_file, processor) = processor().await;
    let result = processor.process_query("AI 투자").await.unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["primary"]["title"], "AI 투자 급증");
    assert_eq!(json["primary"]["url"], "https://news.test/ai");
    assert_eq!(json["primary"]["published_date"], "2024-03-02T00:00:00Z");
    assert_eq!(json["primary"]["categories"][1], "경제");
    assert!(json["answer"].is_string());
}

#[tokio::test]
async fn test_analytics_over_session() {
    let (_file, processor) = processor().await;
    let mut analytics = SearchAnalytics::new();
    for query in ["AI 투자", "반도체 수출", "우주 탐사"] {
        let result = processor.process_query(query).await.unwrap();
        analytics.record(query, &result);
    }
    assert_eq!(analytics.total_queries(), 3);
    assert_eq!(analytics.total_articles(), 2);
    assert_eq!(analytics.date_distribution().len(), 2);
}
