//! Tokenizer seam between raw text and the oracle's vocabulary.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use xqa_core::{AppError, AppResult};

/// Separator token closing the question and the passage.
pub const SEP_TOKEN: &str = "[SEP]";

/// Start-of-sequence token. The oracle points at it to mean "no answer here".
pub const CLS_TOKEN: &str = "[CLS]";

/// Prefix marking a sub-word continuation in WordPiece vocabularies.
pub const CONTINUATION_PREFIX: &str = "##";

/// Vocabulary entries the extractor relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialTokens {
    /// Id of the separator token
    pub sep_id: u32,

    /// Text a span decodes to when the oracle finds no answer
    pub no_answer: String,

    /// Prefix of sub-word continuation tokens
    pub continuation_prefix: String,
}

impl SpecialTokens {
    /// BERT-style special tokens around the given separator id.
    pub fn bert(sep_id: u32) -> Self {
        Self {
            sep_id,
            no_answer: CLS_TOKEN.to_string(),
            continuation_prefix: CONTINUATION_PREFIX.to_string(),
        }
    }
}

/// Trait for tokenizers that encode a (question, passage) pair.
pub trait PairTokenizer: Send + Sync {
    /// Encode `question` then `passage` into one id sequence, including the
    /// start marker and a separator after each part.
    fn encode_pair(&self, question: &str, passage: &str) -> AppResult<Vec<u32>>;

    /// Look up the vocabulary entry for `id`.
    fn id_to_token(&self, id: u32) -> Option<String>;

    /// Special tokens of this vocabulary.
    fn special_tokens(&self) -> &SpecialTokens;
}

/// WordPiece tokenizer backed by a Hugging Face `tokenizer.json`.
pub struct WordPieceTokenizer {
    inner: tokenizers::Tokenizer,
    special: SpecialTokens,
}

impl WordPieceTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            AppError::Tokenizer(format!(
                "Cannot load tokenizer from '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_tokenizer(inner)
    }

    /// Wrap an already loaded tokenizer.
    ///
    /// Truncation and padding stored with the tokenizer are switched off;
    /// the budget is applied to the encoded pair by [`ModelInput::build`],
    /// which only ever drops passage tokens.
    ///
    /// [`ModelInput::build`]: crate::types::ModelInput::build
    pub fn from_tokenizer(mut inner: tokenizers::Tokenizer) -> AppResult<Self> {
        inner
            .with_truncation(None)
            .map_err(|e| AppError::Tokenizer(format!("Cannot disable truncation: {}", e)))?;
        inner.with_padding(None);

        let sep_id = inner.token_to_id(SEP_TOKEN).ok_or_else(|| {
            AppError::Tokenizer(format!("Vocabulary has no {} token", SEP_TOKEN))
        })?;

        Ok(Self {
            inner,
            special: SpecialTokens::bert(sep_id),
        })
    }
}

impl PairTokenizer for WordPieceTokenizer {
    fn encode_pair(&self, question: &str, passage: &str) -> AppResult<Vec<u32>> {
        let encoding = self
            .inner
            .encode((question, passage), true)
            .map_err(|e| AppError::Tokenizer(format!("Failed to encode input: {}", e)))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn id_to_token(&self, id: u32) -> Option<String> {
        self.inner.id_to_token(id)
    }

    fn special_tokens(&self) -> &SpecialTokens {
        &self.special
    }
}

#[derive(Debug, Default)]
struct MockVocab {
    tokens: Vec<String>,
    ids: HashMap<String, u32>,
}

impl MockVocab {
    fn id_for(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.ids.get(token) {
            return id;
        }
        let id = self.tokens.len() as u32;
        self.tokens.push(token.to_string());
        self.ids.insert(token.to_string(), id);
        id
    }
}

/// Deterministic tokenizer for testing and development.
///
/// Lower-cases, splits on whitespace and punctuation, and grows its
/// vocabulary on demand. Words registered with [`MockTokenizer::with_pieces`]
/// are emitted as sub-word pieces.
#[derive(Debug)]
pub struct MockTokenizer {
    vocab: Mutex<MockVocab>,
    pieces: HashMap<String, Vec<String>>,
    special: SpecialTokens,
}

impl MockTokenizer {
    pub fn new() -> Self {
        let mut vocab = MockVocab::default();
        vocab.id_for("[PAD]");
        vocab.id_for("[UNK]");
        vocab.id_for(CLS_TOKEN);
        let sep_id = vocab.id_for(SEP_TOKEN);

        Self {
            vocab: Mutex::new(vocab),
            pieces: HashMap::new(),
            special: SpecialTokens::bert(sep_id),
        }
    }

    /// Split `word` into the given pieces, e.g. `["sam", "##antha"]`.
    pub fn with_pieces(mut self, word: &str, pieces: &[&str]) -> Self {
        self.pieces.insert(
            word.to_lowercase(),
            pieces.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    /// Id of `token`, adding it to the vocabulary if needed.
    pub fn id_for(&self, token: &str) -> u32 {
        self.vocab
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .id_for(token)
    }

    /// Split text into token strings.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for word in text.to_lowercase().split_whitespace() {
            let mut current = String::new();
            for ch in word.chars() {
                if ch.is_alphanumeric() {
                    current.push(ch);
                } else {
                    self.push_word(&mut tokens, &mut current);
                    tokens.push(ch.to_string());
                }
            }
            self.push_word(&mut tokens, &mut current);
        }
        tokens
    }

    fn push_word(&self, tokens: &mut Vec<String>, current: &mut String) {
        if current.is_empty() {
            return;
        }
        match self.pieces.get(current.as_str()) {
            Some(pieces) => tokens.extend(pieces.iter().cloned()),
            None => tokens.push(current.clone()),
        }
        current.clear();
    }
}

impl Default for MockTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PairTokenizer for MockTokenizer {
    fn encode_pair(&self, question: &str, passage: &str) -> AppResult<Vec<u32>> {
        let mut ids = vec![self.id_for(CLS_TOKEN)];
        ids.extend(self.tokenize(question).iter().map(|t| self.id_for(t)));
        ids.push(self.special.sep_id);
        ids.extend(self.tokenize(passage).iter().map(|t| self.id_for(t)));
        ids.push(self.special.sep_id);
        Ok(ids)
    }

    fn id_to_token(&self, id: u32) -> Option<String> {
        self.vocab
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .tokens
            .get(id as usize)
            .cloned()
    }

    fn special_tokens(&self) -> &SpecialTokens {
        &self.special
    }
}
