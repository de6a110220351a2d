//! Minimal end-to-end pipeline demo with in-memory backends.
//!
//! Run with: `cargo run -p ragkit-retrieval --example pipeline_demo`

use std::sync::Arc;

use futures::StreamExt;

use ragkit_core::{Document, Embedder, Query, Result};
use ragkit_model::{MockEmbedder, MockGenerationClient};
use ragkit_retrieval::{
    InMemoryRetriever, KeywordRetriever, Pipeline, PipelineConfig, RetrievalConfig,
    RetrievalOrchestrator,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let corpus = [
        ("winter-bees", "bees cluster tightly through the winter months to keep the queen warm"),
        ("summer-flow", "hives expand rapidly during the summer nectar flow"),
        ("harvest", "honey harvest begins in late august once frames are capped"),
        ("varroa", "varroa mites are treated after the harvest to protect winter bees"),
    ];

    // Dense store with precomputed embeddings plus a sparse keyword index.
    let embedder = Arc::new(MockEmbedder::new(64));
    let dense = InMemoryRetriever::new("dense");
    let sparse = KeywordRetriever::new("keyword");
    for (id, content) in corpus {
        let embedding = embedder.embed(content).await?;
        dense.insert(vec![Document::new(id, content).with_embedding(embedding)]).await?;
        sparse.insert(vec![Document::new(id, content)]).await;
    }

    let orchestrator = RetrievalOrchestrator::builder()
        .config(RetrievalConfig::builder().mmr_lambda(0.7).backend_timeout_ms(2000).build()?)
        .embedder(embedder)
        .backend(Arc::new(dense))
        .backend(Arc::new(sparse))
        .build()?;

    let pipeline = Pipeline::builder()
        .config(PipelineConfig::builder().top_k(3).max_context_length(600).build()?)
        .orchestrator(orchestrator)
        .generation_client(Arc::new(MockGenerationClient::with_text(
            "Bees form a tight cluster around the queen and eat stored honey.",
        )))
        .build()?;

    let query = Query::new("how do bees survive the winter?");

    let answer = pipeline.answer(&query).await?;
    println!("answer: {}", answer.text);

    print!("streamed: ");
    let mut stream = pipeline.answer_stream(&query).await?;
    while let Some(fragment) = stream.next().await {
        print!("{}", fragment?);
    }
    println!();

    Ok(())
}
