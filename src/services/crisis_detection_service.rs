use crate::services::toxicity_service::ToxicityClassifier;
use crate::utils::AppError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Phrases that always indicate suicidal ideation.
pub const BASE_INDICATORS: [&str; 12] = [
    "kill myself",
    "suicide",
    "end my life",
    "want to die",
    "tired of living",
    "don't want to be here",
    "end it all",
    "put myself to rest",
    "roll over and die",
    "hate my life",
    "life is miserable",
    "hope i die",
];

const SUICIDE_PATTERNS: [&str; 6] = [
    r"(?i)i (?:want|need|wish) to d[ie]{2}",
    r"(?i)(?:kill(?:ing)? myself|end(?:ing)? (?:my life|it all))",
    r"(?i)(?:don'?t|do not) want to (?:live|be here|exist)",
    r"(?i)(?:hate|tired of) (?:my )?life",
    r"(?i)put (?:myself|me) to rest",
    r"(?i)no reason to (?:live|be here|continue)",
];

lazy_static! {
    static ref SUICIDE_REGEXES: Vec<Regex> = SUICIDE_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();
}

/// What made a message count as suicidal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SuicidalMatch {
    MatchedPhrase(String),
    MatchedPattern(String),
}

impl SuicidalMatch {
    pub fn trigger(&self) -> &str {
        match self {
            SuicidalMatch::MatchedPhrase(p) | SuicidalMatch::MatchedPattern(p) => p,
        }
    }
}

/// Phrase list plus regex patterns, optionally weighted by a labelled dataset.
#[derive(Debug, Clone)]
pub struct CrisisDetector {
    phrases: Vec<String>,
    dataset_records: usize,
}

impl Default for CrisisDetector {
    fn default() -> Self {
        Self {
            phrases: BASE_INDICATORS.iter().map(|s| s.to_string()).collect(),
            dataset_records: 0,
        }
    }
}

impl CrisisDetector {
    /// Loads the dataset if present; any problem leaves the base phrase list.
    pub fn load(dataset_path: Option<&str>) -> Self {
        let Some(path) = dataset_path else {
            log::info!("🧠 No suicide dataset configured, using {} base indicators", BASE_INDICATORS.len());
            return Self::default();
        };

        if !Path::new(path).exists() {
            log::warn!("⚠️  Dataset file not found at: {}", path);
            return Self::default();
        }

        let result = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read dataset {}: {}", path, e)))
            .and_then(|csv| Self::from_dataset(&csv));

        match result {
            Ok(detector) => {
                log::info!(
                    "✅ Loaded {} records from suicide dataset, {} patterns active",
                    detector.dataset_records,
                    detector.phrases.len()
                );
                detector
            }
            Err(e) => {
                log::warn!("⚠️  Error loading suicide dataset: {}", e);
                Self::default()
            }
        }
    }

    /// Builds the phrase list from CSV text with `Tweet` and `Suicide` columns.
    /// Indicators are ordered by how often they occur in positively labelled rows.
    pub fn from_dataset(csv: &str) -> Result<Self, AppError> {
        let mut lines = csv.lines();
        let header = lines
            .next()
            .ok_or_else(|| AppError::InvalidRequest("Dataset is empty".to_string()))?;

        let columns: Vec<String> = split_csv_row(header)
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();
        let tweet_idx = columns.iter().position(|c| c == "tweet");
        let label_idx = columns.iter().position(|c| c == "suicide");

        let (tweet_idx, label_idx) = match (tweet_idx, label_idx) {
            (Some(t), Some(l)) => (t, l),
            _ => {
                return Err(AppError::InvalidRequest(
                    "Dataset does not contain required columns (Tweet, Suicide)".to_string(),
                ))
            }
        };

        let mut support = [0usize; BASE_INDICATORS.len()];
        let mut records = 0usize;

        for line in lines.filter(|l| !l.trim().is_empty()) {
            let fields = split_csv_row(line);
            let (Some(tweet), Some(label)) = (fields.get(tweet_idx), fields.get(label_idx)) else {
                continue;
            };
            records += 1;

            if !is_positive_label(label) {
                continue;
            }

            let tweet = tweet.trim().to_lowercase();
            for (i, indicator) in BASE_INDICATORS.iter().enumerate() {
                if tweet.contains(indicator) {
                    support[i] += 1;
                }
            }
        }

        let mut ranked: Vec<(usize, &str)> = BASE_INDICATORS
            .iter()
            .enumerate()
            .map(|(i, p)| (support[i], *p))
            .collect();
        // Stable, so ties keep the base order
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(Self {
            phrases: ranked.into_iter().map(|(_, p)| p.to_string()).collect(),
            dataset_records: records,
        })
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }


    pub fn detect_suicidal(&self, text: &str) -> Option<SuicidalMatch> {
        let lower = text.to_lowercase();

        if let Some(phrase) = self.phrases.iter().find(|p| lower.contains(p.as_str())) {
            return Some(SuicidalMatch::MatchedPhrase(phrase.clone()));
        }

        SUICIDE_REGEXES
            .iter()
            .find(|re| re.is_match(&lower))
            .map(|re| SuicidalMatch::MatchedPattern(re.as_str().to_string()))
    }
}

/// "Potential Suicide post" is positive, "Not Suicide post" is not.
/// Splits one CSV row. Double-quoted fields may hold commas; `""` inside quotes is a literal quote.
fn split_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn is_positive_label(label: &str) -> bool {
    let label = label.trim().to_lowercase();
    !label.starts_with("not") && (label.contains("suicide") || label.contains("potential"))
}

/// Result of screening a message.
#[derive(Debug, Clone, PartialEq)]
pub enum HarmAssessment {
    Safe,
    Suicidal(SuicidalMatch),
    Toxic { category: String },
}

/// Suicidal-content check first, then the toxicity classifier.
pub struct HarmDetector {
    crisis: CrisisDetector,
    toxicity: Arc<dyn ToxicityClassifier>,
}

impl HarmDetector {
    pub fn new(crisis: CrisisDetector, toxicity: Arc<dyn ToxicityClassifier>) -> Self {
        Self { crisis, toxicity }
    }

    pub fn assess(&self, text: &str) -> HarmAssessment {
        if let Some(found) = self.crisis.detect_suicidal(text) {
            return HarmAssessment::Suicidal(found);
        }

        match self.toxicity.first_match(text) {
            Some(category) => HarmAssessment::Toxic { category },
            None => HarmAssessment::Safe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::toxicity_service::LexiconClassifier;

    fn detector() -> HarmDetector {
        HarmDetector::new(CrisisDetector::default(), Arc::new(LexiconClassifier::default()))
    }

    #[test]
    fn test_phrase_match_is_case_insensitive() {
        let found = CrisisDetector::default().detect_suicidal("Sometimes I just want to DIE");
        assert_eq!(found, Some(SuicidalMatch::MatchedPhrase("want to die".to_string())));
    }

    #[test]
    fn test_regex_catches_variants_outside_phrase_list() {
        let crisis = CrisisDetector::default();

        let found = crisis.detect_suicidal("I keep thinking about killing myself").unwrap();
        assert!(matches!(found, SuicidalMatch::MatchedPattern(_)));

        assert!(crisis.detect_suicidal("I do not want to exist anymore").is_some());
        assert!(crisis.detect_suicidal("there is no reason to continue").is_some());
        assert!(crisis.detect_suicidal("I wish to die").is_some());
    }

    #[test]
    fn test_ordinary_sadness_is_not_flagged() {
        let crisis = CrisisDetector::default();
        assert_eq!(crisis.detect_suicidal("I feel sad and tired after work"), None);
        assert_eq!(crisis.detect_suicidal("my phone battery died"), None);
    }

    #[test]
    fn test_dataset_reorders_by_support() {
        let csv = "Tweet,Suicide\n\
                   i hate my life so much,Potential Suicide post\n\
                   honestly i hate my life,Potential Suicide post\n\
                   want to die lol,Not Suicide post\n\
                   \n\
                   life is miserable,Potential Suicide post\n";
        let crisis = CrisisDetector::from_dataset(csv).unwrap();

        assert_eq!(crisis.dataset_records, 4);
        assert_eq!(crisis.phrases()[0], "hate my life");
        assert_eq!(crisis.phrases()[1], "life is miserable");
        // Negative rows add no support; ties keep base order
        assert_eq!(crisis.phrases()[2], "kill myself");
        assert_eq!(crisis.phrases().len(), BASE_INDICATORS.len());
    }

    #[test]
    fn test_quoted_tweets_keep_their_label() {
        let csv = "Tweet,Suicide\n\
                   \"honestly, i want to die, nothing helps\",Potential Suicide post\n\
                   \"he said \"\"end it all\"\", then laughed\",Not Suicide post\n";
        let crisis = CrisisDetector::from_dataset(csv).unwrap();

        assert_eq!(crisis.dataset_records, 2);
        assert_eq!(crisis.phrases()[0], "want to die");
    }

    #[test]
    fn test_csv_row_splitting() {
        assert_eq!(split_csv_row("a,b"), vec!["a", "b"]);
        assert_eq!(split_csv_row("\"x, y\",z"), vec!["x, y", "z"]);
        assert_eq!(split_csv_row("\"say \"\"hi\"\"\",1"), vec!["say \"hi\"", "1"]);
    }

    #[test]
    fn test_label_polarity() {
        assert!(is_positive_label("Potential Suicide post "));
        assert!(!is_positive_label("Not Suicide post"));
        assert!(!is_positive_label(""));
    }

    #[test]
    fn test_dataset_without_required_columns_is_rejected() {
        assert!(CrisisDetector::from_dataset("text,label\nhello,0\n").is_err());
        assert!(CrisisDetector::from_dataset("").is_err());
    }

    #[test]
    fn test_missing_dataset_falls_back_to_base_list() {
        let crisis = CrisisDetector::load(Some("/nonexistent/dataset.csv"));
        assert_eq!(crisis.phrases().len(), BASE_INDICATORS.len());
        assert_eq!(crisis.dataset_records, 0);
    }

    #[test]
    fn test_suicidal_takes_priority_over_toxicity() {
        let assessment = detector().assess("I hate my life, everyone is stupid");
        assert!(matches!(assessment, HarmAssessment::Suicidal(_)));
    }

    #[test]
    fn test_toxic_and_safe_assessments() {
        let harm = detector();
        assert_eq!(
            harm.assess("shut up you idiot"),
            HarmAssessment::Toxic { category: "insult".to_string() }
        );
        assert_eq!(harm.assess("Can you recommend a breathing exercise?"), HarmAssessment::Safe);
    }
}
