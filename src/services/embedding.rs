use std::collections::HashMap;
use std::time::Instant;

use ndarray::{Array1, Array2, ArrayView1};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    services::normalizer::NormalizedDocument,
};

const MAX_EXP: f32 = 6.0;
const NOISE_EXPONENT: f64 = 0.75;

/// Hyperparameters for one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Vector dimension
    pub dimension: usize,
    /// Maximum distance between center and context word
    pub window: usize,
    /// Tokens seen fewer times are left out of the vocabulary
    pub min_count: u64,
    /// Passes over the corpus
    pub epochs: usize,
    /// Negative samples per positive pair
    pub negative: usize,
    /// Shortest character n-gram
    pub min_n: usize,
    /// Longest character n-gram
    pub max_n: usize,
    /// Hash buckets for character n-grams; 0 disables sub-words
    pub buckets: usize,
    /// Initial learning rate, decayed linearly to `min_learning_rate`
    pub learning_rate: f32,
    pub min_learning_rate: f32,
    /// Frequent-word subsampling threshold; 0 disables subsampling
    pub sample: f64,
    /// RNG seed; training is unseeded when absent
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dimension: 300,
            window: 30,
            min_count: 2,
            epochs: 50,
            negative: 5,
            min_n: 3,
            max_n: 6,
            buckets: 100_000,
            learning_rate: 0.025,
            min_learning_rate: 0.0001,
            sample: 1e-3,
            seed: None,
        }
    }
}

/// Trained token -> vector mapping
///
/// Immutable once trained. Serialized with bincode through `StoredModel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "StoredModel", into = "StoredModel")]
pub struct EmbeddingModel {
    config: TrainingConfig,
    vocab: Vec<String>,
    counts: Vec<u64>,
    index: HashMap<String, usize>,
    /// One composed vector per vocabulary word (word + its n-grams, averaged)
    word_vectors: Array2<f32>,
    /// One row per n-gram bucket
    ngram_vectors: Array2<f32>,
}

impl EmbeddingModel {
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocab.len()
    }

    /// Vocabulary ordered by descending frequency
    pub fn vocabulary(&self) -> &[String] {
        &self.vocab
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Training-corpus frequency of an in-vocabulary token
    pub fn count(&self, token: &str) -> Option<u64> {
        self.index.get(token).map(|&i| self.counts[i])
    }

    /// Composed vector of an in-vocabulary token
    pub fn word_vector(&self, token: &str) -> Option<ArrayView1<'_, f32>> {
        self.index.get(token).map(|&i| self.word_vectors.row(i))
    }

    /// Vector for any token
    ///
    /// In-vocabulary tokens return their trained vector. Other tokens are
    /// built from their character n-gram buckets; `None` when the token is
    /// too short to yield an n-gram or sub-words are disabled.
    pub fn subword_vector(&self, token: &str) -> Option<Array1<f32>> {
        if let Some(vector) = self.word_vector(token) {
            return Some(vector.to_owned());
        }
        if self.config.buckets == 0 {
            return None;
        }

        let ngrams = char_ngrams(token, self.config.min_n, self.config.max_n);
        if ngrams.is_empty() {
            return None;
        }

        let mut vector = Array1::<f32>::zeros(self.dimension());
        for ngram in &ngrams {
            let bucket = ngram_bucket(ngram, self.config.buckets);
            vector.scaled_add(1.0, &self.ngram_vectors.row(bucket));
        }
        vector.mapv_inplace(|v| v / ngrams.len() as f32);

        Some(vector)
    }
}

/// Flat, shape-tagged form of `EmbeddingModel` for persistence
#[derive(Serialize, Deserialize)]
struct StoredModel {
    config: TrainingConfig,
    vocab: Vec<String>,
    counts: Vec<u64>,
    word_shape: (usize, usize),
    word_data: Vec<f32>,
    ngram_shape: (usize, usize),
    ngram_data: Vec<f32>,
}

impl From<EmbeddingModel> for StoredModel {
    fn from(model: EmbeddingModel) -> Self {
        Self {
            word_shape: model.word_vectors.dim(),
            word_data: model.word_vectors.iter().copied().collect(),
            ngram_shape: model.ngram_vectors.dim(),
            ngram_data: model.ngram_vectors.iter().copied().collect(),
            config: model.config,
            vocab: model.vocab,
            counts: model.counts,
        }
    }
}

impl TryFrom<StoredModel> for EmbeddingModel {
    type Error = String;

    fn try_from(stored: StoredModel) -> Result<Self, Self::Error> {
        let word_vectors = Array2::from_shape_vec(stored.word_shape, stored.word_data)
            .map_err(|e| format!("word vectors: {}", e))?;
        let ngram_vectors = Array2::from_shape_vec(stored.ngram_shape, stored.ngram_data)
            .map_err(|e| format!("n-gram vectors: {}", e))?;

        if word_vectors.nrows() != stored.vocab.len() || stored.counts.len() != stored.vocab.len() {
            return Err(format!(
                "vocabulary has {} words but {} vectors and {} counts",
                stored.vocab.len(),
                word_vectors.nrows(),
                stored.counts.len()
            ));
        }

        let index = stored
            .vocab
            .iter()
            .enumerate()
            .map(|(i, token)| (token.clone(), i))
            .collect();

        Ok(Self {
            config: stored.config,
            vocab: stored.vocab,
            counts: stored.counts,
            index,
            word_vectors,
            ngram_vectors,
        })
    }
}

/// Batch trainer producing an `EmbeddingModel` from the whole corpus
///
/// Skip-gram with negative sampling over words and their hashed character
/// n-grams, so unseen or misspelled tokens still get a vector.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingTrainer {
    config: TrainingConfig,
}

impl EmbeddingTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Trains a model over every document
    ///
    /// Fails on an empty corpus, and when no token reaches `min_count`.
    pub fn train(&self, documents: &[NormalizedDocument]) -> AppResult<EmbeddingModel> {
        let config = &self.config;
        if documents.is_empty() {
            return Err(AppError::InputEmpty);
        }
        if config.dimension == 0
            || config.window == 0
            || config.epochs == 0
            || config.min_n > config.max_n
        {
            return Err(AppError::InvalidInput(format!(
                "invalid training configuration: {:?}",
                config
            )));
        }

        // 1. Vocabulary of tokens reaching min_count
        let start = Instant::now();
        let vocab = Vocabulary::build(documents, config.min_count);
        if vocab.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "no token occurs at least {} times",
                config.min_count
            )));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        tracing::info!(
            documents = documents.len(),
            vocabulary = vocab.len(),
            total_words = vocab.total_words,
            dimension = config.dimension,
            epochs = config.epochs,
            "Training sub-word skip-gram model"
        );

        // 2. Input rows per word: the word itself plus its n-gram buckets
        let subwords: Vec<Vec<usize>> = vocab
            .words
            .iter()
            .enumerate()
            .map(|(i, word)| {
                let mut rows = vec![i];
                if config.buckets > 0 {
                    rows.extend(
                        char_ngrams(word, config.min_n, config.max_n)
                            .iter()
                            .map(|ngram| vocab.len() + ngram_bucket(ngram, config.buckets)),
                    );
                }
                rows
            })
            .collect();

        // 3. Negative sampling table and frequent-word subsampling
        let noise = WeightedIndex::new(
            vocab
                .counts
                .iter()
                .map(|&c| (c as f64).powf(NOISE_EXPONENT)),
        )
        .map_err(|e| AppError::Internal(format!("noise distribution: {}", e)))?;

        let keep_probability = vocab.keep_probabilities(config.sample);
        let mut state = SkipGram::new(
            vocab.len() + config.buckets,
            vocab.len(),
            config.dimension,
            &mut rng,
        );

        // 4. Epochs over the corpus with linearly decaying learning rate
        let planned_words = (vocab.total_words * config.epochs as u64).max(1) as f64;
        let mut processed_words: u64 = 0;
        let mut sentence = Vec::new();

        for epoch in 0..config.epochs {
            for document in documents {
                let learning_rate = decayed_rate(config, processed_words as f64 / planned_words);

                sentence.clear();
                for token in document {
                    if let Some(&word) = vocab.index.get(token.as_str()) {
                        processed_words += 1;
                        let keep = keep_probability[word];
                        if keep >= 1.0 || rng.gen::<f64>() < keep {
                            sentence.push(word);
                        }
                    }
                }

                // Window shrinks at random per center word
                for (pos, &center) in sentence.iter().enumerate() {
                    let span = config.window - rng.gen_range(0..config.window);
                    let from = pos.saturating_sub(span);
                    let to = (pos + span + 1).min(sentence.len());

                    for ctx in from..to {
                        if ctx == pos {
                            continue;
                        }
                        state.update(
                            &subwords[center],
                            sentence[ctx],
                            learning_rate,
                            config.negative,
                            &noise,
                            &mut rng,
                        );
                    }
                }
            }

            tracing::debug!(epoch, processed_words, "Epoch finished");
        }

        let model = state.into_model(config.clone(), vocab, &subwords);

        tracing::info!(
            vocabulary = model.vocabulary_size(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Embedding model trained"
        );

        Ok(model)
    }
}

fn decayed_rate(config: &TrainingConfig, progress: f64) -> f32 {
    let progress = progress.clamp(0.0, 1.0) as f32;
    let rate = config.learning_rate - (config.learning_rate - config.min_learning_rate) * progress;
    rate.max(config.min_learning_rate)
}

/// Retained tokens, most frequent first
struct Vocabulary {
    words: Vec<String>,
    counts: Vec<u64>,
    index: HashMap<String, usize>,
    total_words: u64,
}

impl Vocabulary {
    fn build(documents: &[NormalizedDocument], min_count: u64) -> Self {
        let mut raw: HashMap<&str, u64> = HashMap::new();
        for token in documents.iter().flatten() {
            *raw.entry(token.as_str()).or_insert(0) += 1;
        }

        let mut retained: Vec<(&str, u64)> = raw
            .into_iter()
            .filter(|&(_, count)| count >= min_count)
            .collect();
        retained.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let words: Vec<String> = retained.iter().map(|(w, _)| w.to_string()).collect();
        let counts: Vec<u64> = retained.iter().map(|&(_, c)| c).collect();
        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();
        let total_words = counts.iter().sum();

        Self {
            words,
            counts,
            index,
            total_words,
        }
    }

    fn len(&self) -> usize {
        self.words.len()
    }

    fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Probability of keeping each word under frequent-word subsampling
    fn keep_probabilities(&self, sample: f64) -> Vec<f64> {
        if sample <= 0.0 {
            return vec![1.0; self.len()];
        }
        let threshold = sample * self.total_words as f64;

        self.counts
            .iter()
            .map(|&count| {
                let count = count as f64;
                ((count / threshold).sqrt() + 1.0) * (threshold / count)
            })
            .map(|p| p.min(1.0))
            .collect()
    }
}

/// Parameters and scratch buffers of a training run
struct SkipGram {
    /// Word rows followed by n-gram bucket rows
    input: Array2<f32>,
    /// One row per vocabulary word
    output: Array2<f32>,
    hidden: Array1<f32>,
    grad: Array1<f32>,
}

impl SkipGram {
    fn new(input_rows: usize, output_rows: usize, dimension: usize, rng: &mut StdRng) -> Self {
        let bound = 1.0 / dimension as f32;
        let input =
            Array2::from_shape_fn((input_rows, dimension), |_| rng.gen_range(-bound..bound));

        Self {
            input,
            output: Array2::zeros((output_rows, dimension)),
            hidden: Array1::zeros(dimension),
            grad: Array1::zeros(dimension),
        }
    }

    /// One positive pair plus `negative` noise words
    fn update(
        &mut self,
        input_rows: &[usize],
        target: usize,
        learning_rate: f32,
        negative: usize,
        noise: &WeightedIndex<f64>,
        rng: &mut StdRng,
    ) {
        let Self {
            input,
            output,
            hidden,
            grad,
        } = self;
        let scale = 1.0 / input_rows.len() as f32;

        hidden.fill(0.0);
        for &row in input_rows {
            hidden.scaled_add(1.0, &input.row(row));
        }
        hidden.mapv_inplace(|v| v * scale);
        grad.fill(0.0);

        for d in 0..=negative {
            let (label, word) = if d == 0 {
                (1.0, target)
            } else {
                let word = noise.sample(rng);
                if word == target {
                    continue;
                }
                (0.0, word)
            };

            let score = sigmoid(hidden.dot(&output.row(word)));
            let g = (label - score) * learning_rate;
            grad.scaled_add(g, &output.row(word));
            output.row_mut(word).scaled_add(g, hidden);
        }

        for &row in input_rows {
            input.row_mut(row).scaled_add(scale, grad);
        }
    }

    fn into_model(
        self,
        config: TrainingConfig,
        vocab: Vocabulary,
        subwords: &[Vec<usize>],
    ) -> EmbeddingModel {
        let dimension = config.dimension;
        let mut word_vectors = Array2::<f32>::zeros((vocab.len(), dimension));

        for (i, rows) in subwords.iter().enumerate() {
            let mut target = word_vectors.row_mut(i);
            for &row in rows {
                target.scaled_add(1.0, &self.input.row(row));
            }
            let scale = 1.0 / rows.len() as f32;
            target.mapv_inplace(|v| v * scale);
        }

        let ngram_vectors = self
            .input
            .slice(ndarray::s![vocab.len().., ..])
            .to_owned();

        EmbeddingModel {
            config,
            vocab: vocab.words,
            counts: vocab.counts,
            index: vocab.index,
            word_vectors,
            ngram_vectors,
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    if x > MAX_EXP {
        1.0
    } else if x < -MAX_EXP {
        0.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

/// Character n-grams of `<word>` with lengths `min_n..=max_n`
pub fn char_ngrams(word: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let padded: Vec<char> = format!("<{}>", word).chars().collect();
    let mut ngrams = Vec::new();

    for n in min_n.max(1)..=max_n {
        if n > padded.len() {
            break;
        }
        for start in 0..=padded.len() - n {
            ngrams.push(padded[start..start + n].iter().collect());
        }
    }

    ngrams
}

/// Bucket of an n-gram (32-bit FNV-1a over UTF-8 bytes)
pub fn ngram_bucket(ngram: &str, buckets: usize) -> usize {
    let mut hash: u32 = 2_166_136_261;
    for byte in ngram.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash as usize % buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            dimension: 24,
            window: 2,
            min_count: 1,
            epochs: 60,
            negative: 3,
            buckets: 500,
            sample: 0.0,
            seed: Some(7),
            ..TrainingConfig::default()
        }
    }

    fn docs(raw: &[&str]) -> Vec<NormalizedDocument> {
        raw.iter()
            .map(|d| d.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    fn cosine(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
        a.dot(&b) / (a.dot(&a).sqrt() * b.dot(&b).sqrt())
    }

    #[test]
    fn test_default_hyperparameters() {
        let config = TrainingConfig::default();
        assert_eq!(config.dimension, 300);
        assert_eq!(config.window, 30);
        assert_eq!(config.min_count, 2);
        assert_eq!(config.epochs, 50);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_char_ngrams() {
        let ngrams = char_ngrams("cat", 3, 4);
        assert_eq!(ngrams, vec!["<ca", "cat", "at>", "<cat", "cat>"]);
        assert_eq!(char_ngrams("a", 3, 6), vec!["<a>"]);
        assert!(char_ngrams("", 3, 6).is_empty());
    }

    #[test]
    fn test_ngram_bucket_is_stable_and_bounded() {
        assert_eq!(ngram_bucket("<ca", 1000), ngram_bucket("<ca", 1000));
        assert!(ngram_bucket("anything", 10) < 10);
    }

    #[test]
    fn test_vocabulary_respects_min_count() {
        let trainer = EmbeddingTrainer::new(TrainingConfig {
            min_count: 2,
            ..small_config()
        });
        let model = trainer
            .train(&docs(&["heist crew vault", "heist crew", "lonely"]))
            .unwrap();

        assert_eq!(model.vocabulary_size(), 2);
        assert!(model.contains("heist"));
        assert!(!model.contains("lonely"));
        assert_eq!(model.count("crew"), Some(2));
        assert_eq!(model.word_vector("heist").unwrap().len(), 24);
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        let trainer = EmbeddingTrainer::new(small_config());
        assert!(matches!(trainer.train(&[]), Err(AppError::InputEmpty)));

        let strict = EmbeddingTrainer::new(TrainingConfig {
            min_count: 5,
            ..small_config()
        });
        assert!(matches!(
            strict.train(&docs(&["once only"])),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_seeded_training_is_reproducible() {
        let corpus = docs(&["space alien ship", "alien ship crew", "space crew"]);
        let first = EmbeddingTrainer::new(small_config()).train(&corpus).unwrap();
        let second = EmbeddingTrainer::new(small_config()).train(&corpus).unwrap();

        assert_eq!(first.vocabulary(), second.vocabulary());
        assert_eq!(first.word_vector("alien"), second.word_vector("alien"));
    }

    #[test]
    fn test_cooccurring_words_end_up_closer() {
        let mut raw = Vec::new();
        for _ in 0..20 {
            raw.push("space alien ship galaxy");
            raw.push("galaxy ship alien space");
            raw.push("cowboy horse desert saloon");
            raw.push("saloon desert horse cowboy");
        }
        let model = EmbeddingTrainer::new(small_config()).train(&docs(&raw)).unwrap();

        let space = model.word_vector("space").unwrap();
        let alien = model.word_vector("alien").unwrap();
        let horse = model.word_vector("horse").unwrap();
        assert!(cosine(space, alien) > cosine(space, horse));
    }

    #[test]
    fn test_subword_vector_for_unknown_token() {
        let mut raw = Vec::new();
        for _ in 0..10 {
            raw.push("dragon castle knight");
        }
        let config = TrainingConfig {
            dimension: 32,
            ..small_config()
        };
        let model = EmbeddingTrainer::new(config).train(&docs(&raw)).unwrap();

        assert!(!model.contains("dragons"));
        let known = model.word_vector("dragon").unwrap();
        let typo = model.subword_vector("dragons").unwrap();
        let unrelated = model.subword_vector("xqzvw").unwrap();

        assert_eq!(typo.len(), 32);
        assert!(cosine(known, typo.view()) > cosine(known, unrelated.view()));
        assert_eq!(model.subword_vector("dragon").unwrap().view(), known);
        assert!(model.subword_vector("").is_none());
    }

    #[test]
    fn test_model_bincode_round_trip() {
        let model = EmbeddingTrainer::new(small_config())
            .train(&docs(&["noir detective rain", "detective rain city"]))
            .unwrap();

        let bytes = bincode::serialize(&model).unwrap();
        let restored: EmbeddingModel = bincode::deserialize(&bytes).unwrap();

        assert_eq!(restored.vocabulary(), model.vocabulary());
        assert_eq!(restored.config(), model.config());
        assert_eq!(restored.word_vector("noir"), model.word_vector("noir"));
        assert_eq!(restored.subword_vector("detectives"), model.subword_vector("detectives"));
    }
}
