//! Default `Embedder`: a remote embedding API reached over HTTP. Grounded
//! on the teacher's `OnnxHttpEmbedder` (provider kind + config shape),
//! replacing its deterministic placeholder body with a real `reqwest` call
//! since this crate already carries the dependency.

use crate::error::EmbedderError;
use crate::{Embedder, EmbedderInfo, ProviderKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    pub endpoint: String,
    pub auth_token: Option<String>,
    pub dimension: usize,
    pub max_input_length: usize,
    pub embedding_model_id: String,
    pub text_repr_version: String,
}

#[derive(Debug)]
pub struct HttpEmbedder {
    info: EmbedderInfo,
    endpoint: String,
    auth_token: Option<String>,
    max_input_length: usize,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
}

#[derive(Deserialize)]
struct EmbedDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self, EmbedderError> {
        if config.dimension == 0 {
            return Err(EmbedderError::InvalidConfiguration {
                message: "dimension must be greater than zero".into(),
            });
        }
        if config.max_input_length == 0 {
            return Err(EmbedderError::InvalidConfiguration {
                message: "max_input_length must be greater than zero".into(),
            });
        }
        let info = EmbedderInfo {
            provider: ProviderKind::Http,
            embedding_model_id: config.embedding_model_id,
            dimension: config.dimension,
            text_repr_version: config.text_repr_version,
        };
        Ok(Self {
            info,
            endpoint: config.endpoint,
            auth_token: config.auth_token,
            max_input_length: config.max_input_length,
            client: reqwest::Client::new(),
        })
    }

    fn validate_lengths(&self, texts: &[&str]) -> Result<(), EmbedderError> {
        for text in texts {
            let actual_length = text.chars().count();
            if actual_length > self.max_input_length {
                return Err(EmbedderError::InputTooLong {
                    max_length: self.max_input_length,
                    actual_length,
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        Ok(self.embed_batch(&[text]).await?.into_iter().next().unwrap_or_default())
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.validate_lengths(texts)?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&EmbedRequest { model: &self.info.embedding_model_id, input: texts });
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| EmbedderError::ProviderFailure {
            message: format!("embedding request failed: {e}"),
        })?;
        let parsed: EmbedResponse = response.json().await.map_err(|e| EmbedderError::ProviderFailure {
            message: format!("embedding response decode failed: {e}"),
        })?;

        let mut ordered: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for datum in parsed.data {
            if let Some(slot) = ordered.get_mut(datum.index) {
                *slot = Some(datum.embedding);
            }
        }
        ordered
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.ok_or_else(|| EmbedderError::ProviderFailure {
                    message: format!("provider response missing embedding for index {i}"),
                })
            })
            .collect()
    }

    fn info(&self) -> &EmbedderInfo {
        &self.info
    }
}
