use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Overall feedback used when the model's evaluation cannot be decoded.
pub const FALLBACK_FEEDBACK: &str = "Unable to generate detailed evaluation.";
/// Overall rating used when the model's evaluation cannot be decoded.
pub const FALLBACK_RATING: f64 = 5.0;

/// Upper bound of every rating the evaluator produces.
pub const MAX_RATING: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Case-insensitive lookup of the label the model writes after `Difficulty:`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Focus {
    #[serde(rename = "technical")]
    Technical,
    #[serde(rename = "behavioral")]
    Behavioral,
    #[serde(rename = "scenario-based")]
    ScenarioBased,
}

impl Focus {
    /// Case-insensitive lookup of the label the model writes after `Focus:`.
    /// Accepts the spelling variants models commonly drift into.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .trim()
            .to_ascii_lowercase()
            .replace(|c: char| c == ' ' || c == '_', "-");
        match normalized.as_str() {
            "technical" => Some(Self::Technical),
            "behavioral" | "behavioural" => Some(Self::Behavioral),
            "scenario-based" | "scenario" => Some(Self::ScenarioBased),
            _ => None,
        }
    }
}

/// One generated interview question. Order in the session list is both
/// presentation order and answer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    #[serde(rename = "question")]
    pub text: String,
    pub difficulty: Difficulty,
    pub focus: Focus,
}

/// Scored feedback for a whole answer set, as decoded from the model's JSON.
///
/// Every field is optional on the wire; display defaults are applied by
/// `interview::review`, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    #[serde(default, deserialize_with = "deserialize_rating")]
    pub overall_rating: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub overall_feedback: Option<String>,
    #[serde(default, deserialize_with = "deserialize_feedback_list")]
    pub detailed_feedback: Vec<QuestionFeedback>,
}

impl EvaluationReport {
    /// The report substituted when the model's reply holds no decodable JSON object.
    pub fn fallback() -> Self {
        Self {
            overall_rating: Some(FALLBACK_RATING),
            overall_feedback: Some(FALLBACK_FEEDBACK.to_string()),
            detailed_feedback: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionFeedback {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "deserialize_rating")]
    pub answer_rating: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub strengths: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub areas_for_improvement: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub suggested_answer_framework: Option<String>,
}

/// Accepts `7`, `7.5`, `"7"` and `"7/10"`. Anything else becomes `None`.
/// Values are clamped into `0..=10`.
fn deserialize_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(rating_from_value))
}

fn rating_from_value(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.split('/').next()?.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    raw.is_finite().then(|| raw.clamp(0.0, MAX_RATING))
}

/// Null or a non-list becomes empty; entries that are not objects are skipped.
fn deserialize_feedback_list<'de, D>(deserializer: D) -> Result<Vec<QuestionFeedback>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        _ => return Ok(vec![]),
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Accepts a string, or a list of strings (joined one per line).
fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Some(other) => Some(other.to_string()),
    })
}
