use std::collections::{HashMap, HashSet};

/// Tokens of one normalized description, in source order
pub type NormalizedDocument = Vec<String>;

/// English stop words (the NLTK `english` list, 179 entries).
///
/// Entries containing an apostrophe can never match once punctuation has
/// been stripped; they are kept so the table matches the published list.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
    "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
    "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
    "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
    "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don",
    "don't", "should", "should've", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain",
    "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn", "doesn't", "hadn",
    "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma", "mightn",
    "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't", "shouldn",
    "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

/// Contraction expansions.
///
/// Punctuation is removed before expansion, so lookups use the
/// apostrophe-free form ("don't" matches the token "dont"). Contractions
/// whose stripped form is an ordinary English word ("we'll" -> "well",
/// "it's" -> "its", "i'll" -> "ill", "he'll" -> "hell") are left out.
/// No expansion contains a word that is itself a key.
pub const CONTRACTIONS: &[(&str, &str)] = &[
    ("ain't", "am not"),
    ("aren't", "are not"),
    ("can't", "cannot"),
    ("could've", "could have"),
    ("couldn't", "could not"),
    ("didn't", "did not"),
    ("doesn't", "does not"),
    ("don't", "do not"),
    ("hadn't", "had not"),
    ("hasn't", "has not"),
    ("haven't", "have not"),
    ("he's", "he is"),
    ("he'd", "he would"),
    ("how's", "how is"),
    ("i'm", "i am"),
    ("i've", "i have"),
    ("isn't", "is not"),
    ("it'll", "it will"),
    ("ma'am", "madam"),
    ("might've", "might have"),
    ("mightn't", "might not"),
    ("must've", "must have"),
    ("mustn't", "must not"),
    ("needn't", "need not"),
    ("o'clock", "of the clock"),
    ("shan't", "shall not"),
    ("she's", "she is"),
    ("she'd", "she would"),
    ("should've", "should have"),
    ("shouldn't", "should not"),
    ("that's", "that is"),
    ("there's", "there is"),
    ("they'd", "they would"),
    ("they'll", "they will"),
    ("they're", "they are"),
    ("they've", "they have"),
    ("wasn't", "was not"),
    ("we've", "we have"),
    ("weren't", "were not"),
    ("what's", "what is"),
    ("where's", "where is"),
    ("who's", "who is"),
    ("won't", "will not"),
    ("would've", "would have"),
    ("wouldn't", "would not"),
    ("y'all", "you all"),
    ("you'd", "you would"),
    ("you'll", "you will"),
    ("you're", "you are"),
    ("you've", "you have"),
    ("gonna", "going to"),
    ("gotta", "got to"),
    ("wanna", "want to"),
];

/// Normalizer holding the fixed stop-word and contraction tables
///
/// Output tokens are lowercase ASCII alphanumerics with stop words removed.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stop_words: HashSet<&'static str>,
    contractions: HashMap<String, &'static str>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::english()
    }
}

impl TextNormalizer {
    /// Normalizer with the English tables
    pub fn english() -> Self {
        let contractions = CONTRACTIONS
            .iter()
            .map(|(short, long)| (strip_punctuation(short), *long))
            .collect();

        Self {
            stop_words: ENGLISH_STOP_WORDS.iter().copied().collect(),
            contractions,
        }
    }

    /// Normalizes one description into tokens
    pub fn normalize(&self, text: &str) -> NormalizedDocument {
        let cleaned = strip_punctuation(text).to_lowercase();

        cleaned
            .trim()
            .split_whitespace()
            .flat_map(|word| -> Vec<&str> {
                match self.contractions.get(word) {
                    Some(expanded) => expanded.split(' ').collect(),
                    None => vec![word],
                }
            })
            .filter(|token| !self.is_stop_word(token))
            .map(str::to_string)
            .collect()
    }

    /// Normalizes every description, preserving order
    pub fn normalize_all<'a, I>(&self, texts: I) -> Vec<NormalizedDocument>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().map(|text| self.normalize(text)).collect()
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }
}

/// Keeps ASCII letters, digits and whitespace
fn strip_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect()
}
