use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use studium::db::Db;
use studium::llm::LanguageModel;
use studium::{Error, Result};

pub async fn create_test_db() -> Db {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("studium_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);

    let _ = tracing_subscriber::fmt()
        .with_env_filter("studium=debug")
        .try_init();

    let url = format!("file:{}", path.display());
    Db::new(url, String::new())
        .await
        .expect("failed to create test database")
}

/// Scripted stand-in for the provider. Completion rules are matched first
/// to last against the prompt; embed rules against the input text. Calls
/// that match nothing fail the way a broken provider would.
#[derive(Default)]
pub struct ScriptedModel {
    completion_rules: Mutex<Vec<(String, String)>>,
    embed_rules: Mutex<HashMap<String, Vec<f32>>>,
    pub complete_calls: AtomicUsize,
    pub embed_calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `response` to any completion prompt containing `needle`.
    pub fn on_completion(&self, needle: &str, response: &str) {
        self.completion_rules
            .lock()
            .unwrap()
            .push((needle.to_owned(), response.to_owned()));
    }

    /// Respond with `embedding` when asked to embed exactly `input`.
    pub fn on_embed(&self, input: &str, embedding: Vec<f32>) {
        self.embed_rules
            .lock()
            .unwrap()
            .insert(input.to_owned(), embedding);
    }

    pub fn completions_made(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str, _expect_json: bool) -> Result<String> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);

        let rules = self.completion_rules.lock().unwrap();
        rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle))
            .map(|(_, response)| response.clone())
            .ok_or_else(|| Error::ProviderMalformed("no scripted completion".into()))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);

        let rules = self.embed_rules.lock().unwrap();
        rules
            .get(text)
            .cloned()
            .ok_or_else(|| Error::ProviderMalformed("no scripted embedding".into()))
    }
}
