use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Default probability at which a prediction counts as a match.
pub const DEFAULT_THRESHOLD: f32 = 0.8;

/// Label names follow the usual toxicity-model vocabulary.
pub const LABEL_INSULT: &str = "insult";
pub const LABEL_OBSCENE: &str = "obscene";
pub const LABEL_THREAT: &str = "threat";
pub const LABEL_TOXICITY: &str = "toxicity";

// (word, label, severity)
const LEXICON: &[(&str, &str, f32)] = &[
    ("stupid", LABEL_INSULT, 0.85),
    ("idiot", LABEL_INSULT, 0.9),
    ("dumb", LABEL_INSULT, 0.85),
    ("fool", LABEL_INSULT, 0.7),
    ("moron", LABEL_INSULT, 0.9),
    ("jerk", LABEL_INSULT, 0.8),
    ("hate", LABEL_TOXICITY, 0.6),
    ("loser", LABEL_INSULT, 0.85),
    ("trash", LABEL_INSULT, 0.7),
    ("garbage", LABEL_INSULT, 0.7),
    ("worthless", LABEL_INSULT, 0.85),
    ("damn", LABEL_OBSCENE, 0.5),
    ("hell", LABEL_OBSCENE, 0.5),
    ("crap", LABEL_OBSCENE, 0.6),
    ("wtf", LABEL_OBSCENE, 0.8),
    ("shut up", LABEL_TOXICITY, 0.8),
    ("screw you", LABEL_TOXICITY, 0.9),
    ("go to hell", LABEL_TOXICITY, 0.9),
    ("fuck", LABEL_OBSCENE, 0.98),
    ("shit", LABEL_OBSCENE, 0.9),
    ("asshole", LABEL_INSULT, 0.97),
    ("bitch", LABEL_INSULT, 0.97),
    ("bastard", LABEL_INSULT, 0.9),
    ("dick", LABEL_OBSCENE, 0.9),
    ("retard", LABEL_INSULT, 0.97),
    ("slut", LABEL_INSULT, 0.97),
    ("whore", LABEL_INSULT, 0.97),
    ("cunt", LABEL_OBSCENE, 0.99),
    ("piss", LABEL_OBSCENE, 0.7),
    ("bollocks", LABEL_OBSCENE, 0.7),
    ("bloody", LABEL_OBSCENE, 0.5),
    ("bugger", LABEL_OBSCENE, 0.7),
    ("rubbish", LABEL_INSULT, 0.5),
    ("wanker", LABEL_INSULT, 0.95),
    ("douchebag", LABEL_INSULT, 0.95),
    ("motherfucker", LABEL_OBSCENE, 0.99),
    ("bullshit", LABEL_OBSCENE, 0.9),
    ("ass", LABEL_OBSCENE, 0.8),
    ("butt", LABEL_OBSCENE, 0.5),
    ("hoe", LABEL_INSULT, 0.9),
    ("thot", LABEL_INSULT, 0.9),
    ("jackass", LABEL_INSULT, 0.9),
    ("stfu", LABEL_TOXICITY, 0.9),
    ("fck", LABEL_OBSCENE, 0.95),
    ("f*ck", LABEL_OBSCENE, 0.95),
    ("s*it", LABEL_OBSCENE, 0.9),
    ("a**hole", LABEL_INSULT, 0.95),
    ("b*tch", LABEL_INSULT, 0.95),
    ("b*stard", LABEL_INSULT, 0.9),
    ("d*ck", LABEL_OBSCENE, 0.9),
    ("r*tard", LABEL_INSULT, 0.95),
    ("sl*t", LABEL_INSULT, 0.95),
    ("wh*re", LABEL_INSULT, 0.95),
    ("c*nt", LABEL_OBSCENE, 0.98),
    ("p*ss", LABEL_OBSCENE, 0.7),
    ("b*llocks", LABEL_OBSCENE, 0.7),
    ("noob", LABEL_INSULT, 0.6),
    ("sucker", LABEL_INSULT, 0.7),
    ("suck", LABEL_TOXICITY, 0.5),
    ("kill yourself", LABEL_THREAT, 0.99),
    ("kys", LABEL_THREAT, 0.99),
    ("die", LABEL_THREAT, 0.85),
];

struct LexiconEntry {
    word: &'static str,
    label: &'static str,
    severity: f32,
    pattern: Regex,
}

lazy_static! {
    static ref ENTRIES: Vec<LexiconEntry> = LEXICON
        .iter()
        .filter_map(|&(word, label, severity)| {
            // Whole-word, case-insensitive
            let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))).ok()?;
            Some(LexiconEntry { word, label, severity, pattern })
        })
        .collect();
}

/// One label's verdict for a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToxicityPrediction {
    pub label: String,
    pub probability: f32,
    #[serde(rename = "match")]
    pub matched: bool,
}

/// Classifies text into toxicity labels.
pub trait ToxicityClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Vec<ToxicityPrediction>;

    /// First label whose prediction matched.
    fn first_match(&self, text: &str) -> Option<String> {
        self.classify(text)
            .into_iter()
            .find(|p| p.matched)
            .map(|p| p.label)
    }
}

/// Lexicon-backed classifier: each label's probability is the highest
/// severity among the words of that label found in the text.
pub struct LexiconClassifier {
    threshold: f32,
}

impl LexiconClassifier {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ToxicityClassifier for LexiconClassifier {
    fn classify(&self, text: &str) -> Vec<ToxicityPrediction> {
        let mut predictions: Vec<ToxicityPrediction> =
            [LABEL_INSULT, LABEL_OBSCENE, LABEL_THREAT, LABEL_TOXICITY]
                .iter()
                .map(|label| ToxicityPrediction {
                    label: label.to_string(),
                    probability: 0.0,
                    matched: false,
                })
                .collect();

        for entry in ENTRIES.iter().filter(|e| e.pattern.is_match(text)) {
            if let Some(prediction) = predictions.iter_mut().find(|p| p.label == entry.label) {
                prediction.probability = prediction.probability.max(entry.severity);
            }
        }

        for prediction in &mut predictions {
            prediction.matched = prediction.probability >= self.threshold;
        }

        predictions
    }
}

/// First lexicon word present in the message, regardless of severity.
pub fn contains_toxic_word(message: &str) -> Option<&'static str> {
    ENTRIES
        .iter()
        .find(|e| e.pattern.is_match(message))
        .map(|e| e.word)
}

/// Replaces every lexicon word with asterisks of the same length.
pub fn censor_toxic_words(message: &str) -> String {
    ENTRIES.iter().fold(message.to_string(), |acc, entry| {
        if entry.pattern.is_match(&acc) {
            let stars = "*".repeat(entry.word.chars().count());
            entry.pattern.replace_all(&acc, stars.as_str()).into_owned()
        } else {
            acc
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_matches_nothing() {
        let classifier = LexiconClassifier::default();
        let predictions = classifier.classify("I had a lovely walk in the park today");
        assert!(predictions.iter().all(|p| !p.matched));
        assert_eq!(classifier.first_match("I had a lovely walk"), None);
    }

    #[test]
    fn test_severe_word_matches_label() {
        let classifier = LexiconClassifier::default();
        assert_eq!(classifier.first_match("you are an IDIOT"), Some(LABEL_INSULT.to_string()));
        assert_eq!(classifier.first_match("just kys"), Some(LABEL_THREAT.to_string()));
    }

    #[test]
    fn test_mild_words_stay_below_threshold() {
        let classifier = LexiconClassifier::default();
        assert_eq!(classifier.first_match("what the hell, that was bloody hard"), None);

        let strict = LexiconClassifier::new(0.4);
        assert_eq!(strict.first_match("what the hell"), Some(LABEL_OBSCENE.to_string()));
    }

    #[test]
    fn test_whole_word_matching() {
        assert_eq!(contains_toxic_word("the class assignment"), None);
        assert_eq!(contains_toxic_word("a hello to everyone"), None);
        assert_eq!(contains_toxic_word("you fool"), Some("fool"));
    }

    #[test]
    fn test_censor_preserves_length() {
        assert_eq!(censor_toxic_words("You are STUPID and dumb"), "You are ****** and ****");
        assert_eq!(censor_toxic_words("nothing to hide"), "nothing to hide");
    }

    #[test]
    fn test_masked_spellings_are_detected() {
        assert_eq!(contains_toxic_word("what the f*ck"), Some("f*ck"));
    }
}
