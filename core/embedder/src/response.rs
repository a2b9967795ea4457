/// Response shape handling for the embedding router.
///
/// Routers in front of GitHub Copilot do not agree on one response layout, so
/// the body is classified into a known shape first and then decoded by a pure
/// function. Shapes that match nothing are passed through untouched instead of
/// failing the call.

use copilot_embedder_schemas::{EmbeddingItem, EmbeddingResponse};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// A router response classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEmbeddingResponse {
    /// OpenAI-style object: `model` plus a typed `data` list whose first
    /// entry carries an `embedding`. `raw` is the body exactly as received.
    Typed {
        response: EmbeddingResponse,
        raw: Map<String, Value>,
    },
    /// Any other JSON object.
    Mapping(Map<String, Value>),
    /// A bare JSON array.
    Sequence(Vec<Value>),
    /// Scalars and null. Only ever passed through.
    Unrecognized(Value),
}

impl RawEmbeddingResponse {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Sequence(items),
            Value::Object(map) => {
                let looks_typed =
                    map.contains_key("model") && map.get("data").map_or(false, Value::is_array);

                if looks_typed {
                    match serde_json::from_value::<EmbeddingResponse>(Value::Object(map.clone())) {
                        Ok(response) if first_item_has_embedding(&response) => {
                            return Self::Typed { response, raw: map };
                        }
                        Ok(_) => debug!("Typed response has no usable data entry"),
                        Err(e) => debug!("Response is not a typed embedding list: {}", e),
                    }
                }

                Self::Mapping(map)
            }
            other => Self::Unrecognized(other),
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            Self::Typed { response, .. } => Some(response.model.as_str()),
            Self::Mapping(map) => map.get("model").and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn total_tokens(&self) -> Option<u64> {
        match self {
            Self::Typed { response, .. } => response.usage.as_ref().map(|u| u.total_tokens),
            Self::Mapping(map) => map
                .get("usage")
                .and_then(|u| u.get("total_tokens"))
                .and_then(Value::as_u64),
            _ => None,
        }
    }

    /// The body as the router sent it.
    pub fn into_value(self) -> Value {
        match self {
            Self::Typed { raw, .. } => Value::Object(raw),
            Self::Mapping(map) => Value::Object(map),
            Self::Sequence(items) => Value::Array(items),
            Self::Unrecognized(value) => value,
        }
    }
}

/// What the adapter hands back for one input.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingOutput {
    /// A numeric vector.
    Vector(Vec<f32>),
    /// Whatever was found where a vector was expected. Not guaranteed to be
    /// numeric or even an array.
    Passthrough(Value),
}

impl EmbeddingOutput {
    /// Arrays of numbers become vectors, everything else passes through.
    pub fn from_value(value: Value) -> Self {
        let parsed = value.as_array().and_then(|items| {
            items
                .iter()
                .map(|v| v.as_f64().map(|f| f as f32))
                .collect::<Option<Vec<f32>>>()
        });

        match parsed {
            Some(vector) => Self::Vector(vector),
            None => Self::Passthrough(value),
        }
    }

    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            Self::Vector(v) => Some(v),
            Self::Passthrough(_) => None,
        }
    }

    pub fn into_vector(self) -> Option<Vec<f32>> {
        match self {
            Self::Vector(v) => Some(v),
            Self::Passthrough(_) => None,
        }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_))
    }
}

/// Every embedding found in one response, in input order.
/// `indices[i]` is the router's index for `embeddings[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingBatch {
    pub model: Option<String>,
    pub embeddings: Vec<EmbeddingOutput>,
    pub indices: Vec<usize>,
    pub total_tokens: Option<u64>,
}

impl EmbeddingBatch {
    pub fn first(&self) -> Option<&EmbeddingOutput> {
        self.embeddings.first()
    }

    pub fn first_index(&self) -> Option<usize> {
        self.indices.first().copied()
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Extract the embedding of the first input.
///
/// First match wins:
/// 1. typed `data[0]` with a numeric `embedding`
/// 2. typed `data[0]` that is a mapping holding `embedding`
/// 3. bare array: its first element, or empty when the array is empty
/// 4. mapping: `data[0].embedding`, else `data[0]` itself, else the
///    mapping's own `embedding` key, else empty
/// 5. anything else is returned as is
pub fn decode_embedding(raw: RawEmbeddingResponse) -> EmbeddingOutput {
    match raw {
        RawEmbeddingResponse::Typed { response, raw } => {
            let found = match response.data.first() {
                Some(EmbeddingItem::Embedding(data)) => {
                    Some(EmbeddingOutput::Vector(data.embedding.clone()))
                }
                Some(EmbeddingItem::Mapping(item)) => {
                    item.get("embedding").cloned().map(EmbeddingOutput::from_value)
                }
                None => None,
            };

            found.unwrap_or_else(|| passthrough(Value::Object(raw)))
        }
        RawEmbeddingResponse::Sequence(items) => match items.into_iter().next() {
            Some(first) => EmbeddingOutput::from_value(first),
            None => EmbeddingOutput::Vector(Vec::new()),
        },
        RawEmbeddingResponse::Mapping(map) => {
            if let Some(first) = first_data_item(&map) {
                return item_output(first.clone());
            }

            match map.get("embedding") {
                Some(embedding) => EmbeddingOutput::from_value(embedding.clone()),
                None => EmbeddingOutput::Vector(Vec::new()),
            }
        }
        RawEmbeddingResponse::Unrecognized(value) => {
            warn!("Unrecognized embedding response shape, passing it through");
            EmbeddingOutput::Passthrough(value)
        }
    }
}

/// Extract every embedding in a response.
///
/// Typed lists are reordered by `index`. Shapes without a list fall back to
/// [`decode_embedding`] and yield a single entry.
pub fn decode_batch(raw: RawEmbeddingResponse) -> EmbeddingBatch {
    let model = raw.model().map(str::to_string);
    let total_tokens = raw.total_tokens();

    let indexed: Vec<(usize, EmbeddingOutput)> = match raw {
        RawEmbeddingResponse::Typed { response, .. } => {
            let mut indexed: Vec<(usize, EmbeddingOutput)> = response
                .data
                .into_iter()
                .enumerate()
                .map(|(position, item)| match item {
                    EmbeddingItem::Embedding(data) => {
                        (data.index, EmbeddingOutput::Vector(data.embedding))
                    }
                    EmbeddingItem::Mapping(map) => {
                        let index = map
                            .get("index")
                            .and_then(Value::as_u64)
                            .map_or(position, |i| i as usize);
                        (index, item_output(Value::Object(map)))
                    }
                })
                .collect();

            indexed.sort_by_key(|(index, _)| *index);
            indexed
        }
        RawEmbeddingResponse::Sequence(items) => items
            .into_iter()
            .map(EmbeddingOutput::from_value)
            .enumerate()
            .collect(),
        RawEmbeddingResponse::Mapping(map) if first_data_item(&map).is_some() => map
            .get("data")
            .and_then(Value::as_array)
            .map(|items| items.iter().cloned().map(item_output).enumerate().collect())
            .unwrap_or_default(),
        other => vec![(0, decode_embedding(other))],
    };

    let (indices, embeddings) = indexed.into_iter().unzip();

    EmbeddingBatch {
        model,
        embeddings,
        indices,
        total_tokens,
    }
}

fn first_item_has_embedding(response: &EmbeddingResponse) -> bool {
    match response.data.first() {
        Some(EmbeddingItem::Embedding(_)) => true,
        Some(EmbeddingItem::Mapping(item)) => item.contains_key("embedding"),
        None => false,
    }
}

fn first_data_item(map: &Map<String, Value>) -> Option<&Value> {
    map.get("data")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
}

/// A `data` entry: its `embedding` when it is a mapping holding one,
/// otherwise the entry itself.
fn item_output(item: Value) -> EmbeddingOutput {
    match item {
        Value::Object(mut map) if map.contains_key("embedding") => {
            EmbeddingOutput::from_value(map.remove("embedding").unwrap_or(Value::Null))
        }
        other => EmbeddingOutput::from_value(other),
    }
}

fn passthrough(raw: Value) -> EmbeddingOutput {
    warn!("Embedding response had no usable data entry, passing it through");
    EmbeddingOutput::Passthrough(raw)
}
