use anyhow::{bail, Context};
use clap::Parser;
use nq_core::{Article, PipelineResult};
use nq_inference::{create_model, ModelConfig, ModelKind};
use nq_pipeline::{PipelineConfig, QueryProcessor, SearchAnalytics};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

mod logging;

#[derive(Debug, Clone, Copy)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                let unit = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = num
                    .checked_mul(unit)
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(|| "Invalid number in duration".to_string())?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A bare number means seconds
        if !current_number.is_empty() {
            total_seconds = current_number
                .parse::<u64>()
                .ok()
                .and_then(|secs| total_seconds.checked_add(secs))
                .ok_or_else(|| "Invalid number in duration".to_string())?;
            has_unit = true;
        }

        if !has_unit || total_seconds == 0 {
            return Err("Duration must be a positive number of seconds (e.g. 30s, 1m30s)".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Answer questions about a news corpus", long_about = None)]
pub struct Cli {
    /// Article corpus, a JSON array or JSON lines file
    #[arg(long, env = "NQ_CORPUS", global = true)]
    corpus: Option<PathBuf>,
    #[arg(long, default_value = "memory", global = true)]
    index: String,
    #[arg(
        long,
        env = "NQ_MODEL",
        default_value = "ollama",
        global = true,
        help = "Model used to draft answers. Available models: ollama (default), gemini, deepseek, extractive"
    )]
    model: String,
    #[arg(long, env = "NQ_MODEL_URL", global = true)]
    model_url: Option<String>,
    #[arg(long, global = true)]
    model_name: Option<String>,
    /// Model used to review drafts; defaults to the drafting model
    #[arg(long, global = true)]
    review_model: Option<String>,
    #[arg(long, global = true)]
    no_review: bool,
    /// Pipeline tuning file (JSON)
    #[arg(long, env = "NQ_CONFIG", global = true)]
    config: Option<PathBuf>,
    /// Backend timeout for both generation and review (e.g. 30s, 1m)
    #[arg(long, global = true)]
    timeout: Option<HumanDuration>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Answer one question, or read questions from stdin when none is given
    Ask { query: Option<String> },
    /// Answer every line of a file and summarize the session
    Batch { file: PathBuf },
    /// Serve the query API over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
    /// Describe the loaded corpus
    Stats,
}

impl Cli {
    fn model_config(&self, name: &str) -> anyhow::Result<ModelConfig> {
        let kind = ModelKind::from_str(name)?;
        Ok(ModelConfig::from_env(kind)
            .with_url(self.model_url.clone())
            .with_model_name(self.model_name.clone()))
    }

    async fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .await
                .with_context(|| format!("reading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(HumanDuration(timeout)) = self.timeout {
            config.generation.timeout = timeout;
            config.review.timeout = timeout;
        }
        if self.no_review {
            config.review.enabled = false;
        }
        Ok(config)
    }

    async fn processor(&self) -> anyhow::Result<Arc<QueryProcessor>> {
        let index = nq_storage::create_index(&self.index, self.corpus.as_deref()).await?;
        info!("📚 Index ready with {} articles (using {})", index.len(), self.index);

        let generation = create_model(&self.model_config(&self.model)?)?;
        let review = match &self.review_model {
            Some(name) => create_model(&self.model_config(name)?)?,
            None => generation.clone(),
        };
        info!("🧠 Models ready: {} drafts, {} reviews", generation.name(), review.name());

        let config = self.pipeline_config().await?;
        Ok(Arc::new(QueryProcessor::new(index, generation, review, config)))
    }
}

fn format_date(article: &Article) -> String {
    article
        .published_date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "날짜 정보 없음".to_string())
}

fn print_article(article: &Article, score: Option<f64>) {
    println!("  📰 {}", article.title);
    println!("     날짜: {}", format_date(article));
    println!("     분류: {}", article.categories.join(", "));
    if let Some(score) = score {
        println!("     관련도: {:.2}%", score);
    }
    println!("     {}", article.url);
}

fn print_result(result: &PipelineResult) {
    println!("{}\n", result.answer);
    if let Some(primary) = &result.primary {
        println!("주요 기사");
        print_article(primary, Some(result.score));
    }
    if !result.related.is_empty() {
        println!("관련 기사");
        for article in &result.related {
            print_article(article, None);
        }
    }
}

fn print_analytics(analytics: &SearchAnalytics) {
    println!("\n검색 통계");
    println!("  질문 수: {}", analytics.total_queries());
    println!("  찾은 기사 수: {}", analytics.total_articles());
    if let Some(latest) = analytics.latest_article_date() {
        println!("  최신 기사: {}", latest.format("%Y-%m-%d"));
    }
    for share in analytics.category_distribution() {
        println!("  {}: {} ({:.1}%)", share.category, share.count, share.percentage);
    }
    for (day, count) in analytics.date_distribution() {
        println!("  {}: {}건", day, count);
    }
    let recent = analytics.recent_queries(5);
    if !recent.is_empty() {
        println!("  최근 질문: {}", recent.join(" | "));
    }
}

/// Run one query, abandoning it on Ctrl-C.
async fn answer(processor: &Arc<QueryProcessor>, query: &str) -> anyhow::Result<Option<PipelineResult>> {
    let handle = processor.spawn_query(query);
    let abort = handle.abort_handle();
    tokio::select! {
        result = handle.join() => Ok(Some(result?)),
        _ = tokio::signal::ctrl_c() => {
            abort.abort();
            Ok(None)
        }
    }
}

async fn run_query(
    processor: &Arc<QueryProcessor>,
    analytics: &mut SearchAnalytics,
    query: &str,
) -> anyhow::Result<()> {
    match answer(processor, query).await? {
        Some(result) => {
            analytics.record(query, &result);
            print_result(&result);
        }
        None => eprintln!("⏹️ Cancelled"),
    }
    Ok(())
}

async fn interactive(processor: &Arc<QueryProcessor>) -> anyhow::Result<SearchAnalytics> {
    let mut analytics = SearchAnalytics::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all("질문> ".as_bytes()).await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if let Err(e) = run_query(processor, &mut analytics, query).await {
            eprintln!("❌ {}", e);
        }
    }
    Ok(analytics)
}

async fn batch(processor: &Arc<QueryProcessor>, file: &Path) -> anyhow::Result<SearchAnalytics> {
    let input = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading questions from {}", file.display()))?;
    let mut analytics = SearchAnalytics::new();
    for query in input.lines().map(str::trim) {
        if query.is_empty() || query.starts_with('#') {
            continue;
        }
        println!("━━ {}", query);
        if let Err(e) = run_query(processor, &mut analytics, query).await {
            eprintln!("❌ {}", e);
        }
        println!();
    }
    Ok(analytics)
}

fn print_stats(articles: &[Arc<Article>]) {
    println!("기사 수: {}", articles.len());
    if let Some(latest) = articles.iter().filter_map(|a| a.published_date).max() {
        println!("최신 기사: {}", latest.format("%Y-%m-%d"));
    }
    let undated = articles.iter().filter(|a| a.published_date.is_none()).count();
    if undated > 0 {
        println!("날짜 정보 없음: {}건", undated);
    }
    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
    for category in articles.iter().flat_map(|a| a.categories.iter()) {
        *categories.entry(category.as_str()).or_insert(0) += 1;
    }
    let mut categories: Vec<_> = categories.into_iter().collect();
    categories.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    for (category, count) in categories {
        println!("  {}: {}", category, count);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match &cli.command {
        Commands::Stats => {
            let index = nq_storage::create_index(&cli.index, cli.corpus.as_deref()).await?;
            print_stats(&index.articles());
        }
        Commands::Ask { query: Some(query) } => {
            if query.trim().is_empty() {
                bail!("the question is empty");
            }
            let processor = cli.processor().await?;
            match answer(&processor, query).await? {
                Some(result) => print_result(&result),
                None => eprintln!("⏹️ Cancelled"),
            }
        }
        Commands::Ask { query: None } => {
            let processor = cli.processor().await?;
            let analytics = interactive(&processor).await?;
            print_analytics(&analytics);
        }
        Commands::Batch { file } => {
            let processor = cli.processor().await?;
            let analytics = batch(&processor, file).await?;
            print_analytics(&analytics);
        }
        Commands::Serve { addr } => {
            let processor = cli.processor().await?;
            nq_web::serve(nq_web::AppState::new(processor), *addr).await?;
        }
    }

    Ok(())
}
