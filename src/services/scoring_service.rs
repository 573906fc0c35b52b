use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Role ids the client can select in step 3, with their display labels.
const ROLE_LABELS: &[(&str, &str)] = &[
    ("ai_ml", "AI / ML Engineer"),
    ("product_manager", "Product Manager"),
    ("financial_analyst", "Financial Analyst"),
    ("business_analyst", "Business Analyst"),
    ("java_full_stack", "Java Full Stack Developer"),
    ("python_full_stack", "Python Full Stack Developer"),
];

pub fn role_label(role_id: &str) -> Option<&'static str> {
    ROLE_LABELS
        .iter()
        .find(|(id, _)| *id == role_id)
        .map(|(_, label)| *label)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ReadyToStart {
    #[serde(rename = "Yes")]
    Yes,
    #[serde(rename = "With basic training")]
    WithBasicTraining,
    #[serde(rename = "Needs significant training")]
    NeedsSignificantTraining,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionScores {
    #[serde(rename = "honestySignal0to10")]
    pub honesty_signal: f64,
    #[serde(rename = "aiTooling0to10")]
    pub ai_tooling: f64,
    #[serde(rename = "promptEngineering0to10")]
    pub prompt_engineering: f64,
    #[serde(rename = "domainBasics0to10")]
    pub domain_basics: f64,
    #[serde(rename = "codingBasics0to10")]
    pub coding_basics: Option<f64>,
    #[serde(rename = "communication0to10")]
    pub communication: Option<f64>,
    #[serde(rename = "integrityRisk0to10")]
    pub integrity_risk: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerVerdict {
    pub knowledge_level: String,
    pub availability: String,
    pub best_fit: String,
    pub training_needs: String,
    pub ready_to_start: ReadyToStart,
}

/// The fixed evaluation schema the model must return. Parsing alone covers
/// the enum fields; `validate` covers ranges and length caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    #[serde(rename = "overallScore0to100")]
    pub overall_score: f64,
    pub section_scores: SectionScores,
    /// questionId -> acceptable (text answers only; MCQs are auto-graded).
    pub answer_validations: BTreeMap<String, bool>,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub recommended_next_steps: Vec<String>,
    pub short_summary: String,
    pub trainer_summary: TrainerVerdict,
}

impl Evaluation {
    pub fn validate(&self) -> Result<()> {
        fn in_range(name: &str, value: f64, max: f64) -> Result<()> {
            if (0.0..=max).contains(&value) {
                Ok(())
            } else {
                Err(Error::ExternalService(format!(
                    "AI evaluation field {} out of range: {}",
                    name, value
                )))
            }
        }

        in_range("overallScore0to100", self.overall_score, 100.0)?;
        in_range("honestySignal0to10", self.section_scores.honesty_signal, 10.0)?;
        in_range("aiTooling0to10", self.section_scores.ai_tooling, 10.0)?;
        in_range(
            "promptEngineering0to10",
            self.section_scores.prompt_engineering,
            10.0,
        )?;
        in_range("domainBasics0to10", self.section_scores.domain_basics, 10.0)?;
        if let Some(v) = self.section_scores.coding_basics {
            in_range("codingBasics0to10", v, 10.0)?;
        }
        if let Some(v) = self.section_scores.communication {
            in_range("communication0to10", v, 10.0)?;
        }
        in_range("integrityRisk0to10", self.section_scores.integrity_risk, 10.0)?;

        for (name, list) in [
            ("strengths", &self.strengths),
            ("risks", &self.risks),
            ("recommendedNextSteps", &self.recommended_next_steps),
        ] {
            if list.len() > 8 {
                return Err(Error::ExternalService(format!(
                    "AI evaluation field {} exceeds 8 entries",
                    name
                )));
            }
        }
        if self.short_summary.len() > 600 {
            return Err(Error::ExternalService(
                "AI evaluation shortSummary exceeds 600 characters".to_string(),
            ));
        }
        for (name, text) in [
            ("knowledgeLevel", &self.trainer_summary.knowledge_level),
            ("availability", &self.trainer_summary.availability),
            ("bestFit", &self.trainer_summary.best_fit),
            ("trainingNeeds", &self.trainer_summary.training_needs),
        ] {
            if text.len() > 200 {
                return Err(Error::ExternalService(format!(
                    "AI evaluation trainerSummary.{} exceeds 200 characters",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringInput {
    pub role_label: Option<String>,
    pub answers: JsonValue,
    pub proctoring: JsonValue,
    pub video_behavior: JsonValue,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct ScoringService {
    client: Client,
    api_key: String,
    model: String,
}

impl ScoringService {
    pub fn new(api_key: String, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    /// Score one assessment with the external LLM. The rubric asks for a
    /// trainability-focused evaluation in the fixed JSON schema; the parsed
    /// response is range-validated before being stored.
    pub async fn evaluate(&self, input: &ScoringInput) -> Result<Evaluation> {
        let system_prompt = build_system_prompt();
        let payload = serde_json::json!({
            "model": self.model,
            "temperature": 0.2,
            "response_format": { "type": "json_object" },
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": serde_json::to_string(input)?}
            ],
        });

        let response = self
            .client
            .post(GROQ_API_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = if status.as_u16() == 429 {
                "AI service is experiencing high demand. Please try again in a moment.".to_string()
            } else if status.is_server_error() {
                "AI service is temporarily down. This usually resolves quickly.".to_string()
            } else {
                format!(
                    "Unable to connect to AI service ({}). Please try again.",
                    status.as_u16()
                )
            };
            return Err(Error::ExternalService(message));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|_| {
            Error::ExternalService(
                "AI service returned an incomplete response. Please try again.".to_string(),
            )
        })?;
        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                Error::ExternalService(
                    "AI service returned an incomplete response. Please try again.".to_string(),
                )
            })?;

        let evaluation: Evaluation = serde_json::from_str(&content).map_err(|_| {
            Error::ExternalService(
                "AI service returned an unexpected format. Please try again.".to_string(),
            )
        })?;
        evaluation.validate()?;
        Ok(evaluation)
    }
}

fn build_system_prompt() -> String {
    [
        "You are a practical trainer evaluator reviewing candidate assessments.",
        "",
        "IMPORTANT: This is for TRAINING candidates, not hiring experienced developers.",
        "Knowledge is 'good to have' - focus on TRAINABILITY. Be lenient: 'Right' beats 'Perfect'.",
        "",
        "SCORING (be generous, give credit for trying):",
        "- overallScore0to100: Trainability + basic aptitude (60-80 is typical)",
        "- honestySignal0to10, aiTooling0to10, promptEngineering0to10, domainBasics0to10, codingBasics0to10, communication0to10: Rate 0-10",
        "- integrityRisk0to10: 0 = clean, 10 = very suspicious proctoring events",
        "",
        "VIDEO BEHAVIOR EVALUATION (if provided):",
        "Use video behavior data to assess the communication0to10 score. Good indicators:",
        "calm/confident/professional tone, speed 6-7/10, few repetitive filler words,",
        "thoughtful pauses. If behavior data is missing or empty, don't penalize -",
        "score communication based on text answers only.",
        "",
        "ANSWER VALIDATION (domain questions):",
        "For each text-based question in domainKnowledge, mark TRUE if the answer shows",
        "basic understanding, FALSE if completely wrong, nonsensical or empty. Return",
        "answerValidations as an object keyed by questionId. MCQ answers are auto-graded,",
        "only validate text answers.",
        "",
        "OUTPUT MUST be a JSON object with ALL of: overallScore0to100, sectionScores",
        "(honestySignal0to10, aiTooling0to10, promptEngineering0to10, domainBasics0to10,",
        "codingBasics0to10, communication0to10, integrityRisk0to10), answerValidations,",
        "strengths (max 8), risks (max 8), recommendedNextSteps (max 8), shortSummary",
        "(max 600 chars), trainerSummary (knowledgeLevel, availability, bestFit,",
        "trainingNeeds, readyToStart).",
        "",
        "CRITICAL: \"readyToStart\" must be EXACTLY one of: \"Yes\", \"With basic training\",",
        "or \"Needs significant training\".",
        "Return ONLY this JSON structure. No markdown, no extra text.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_evaluation_json() -> JsonValue {
        json!({
            "overallScore0to100": 72,
            "sectionScores": {
                "honestySignal0to10": 8,
                "aiTooling0to10": 7,
                "promptEngineering0to10": 6,
                "domainBasics0to10": 5,
                "codingBasics0to10": 4,
                "communication0to10": 7,
                "integrityRisk0to10": 1
            },
            "answerValidations": {"ml_5": true, "ml_7": false},
            "strengths": ["Willing to learn"],
            "risks": ["Limited coding experience"],
            "recommendedNextSteps": ["Start with fundamentals"],
            "shortSummary": "Trainable candidate with basic understanding.",
            "trainerSummary": {
                "knowledgeLevel": "Basic understanding of concepts",
                "availability": "Mon-Fri 9am-5pm EST",
                "bestFit": "Junior role with mentorship",
                "trainingNeeds": "Fundamentals and hands-on practice",
                "readyToStart": "With basic training"
            }
        })
    }

    #[test]
    fn well_formed_evaluation_parses_and_validates() {
        let eval: Evaluation = serde_json::from_value(sample_evaluation_json()).unwrap();
        assert!(eval.validate().is_ok());
        assert_eq!(eval.trainer_summary.ready_to_start, ReadyToStart::WithBasicTraining);
        assert_eq!(eval.answer_validations.get("ml_5"), Some(&true));
    }

    #[test]
    fn out_of_range_scores_fail_validation() {
        let mut raw = sample_evaluation_json();
        raw["overallScore0to100"] = json!(140);
        let eval: Evaluation = serde_json::from_value(raw).unwrap();
        assert!(eval.validate().is_err());

        let mut raw = sample_evaluation_json();
        raw["sectionScores"]["integrityRisk0to10"] = json!(-1);
        let eval: Evaluation = serde_json::from_value(raw).unwrap();
        assert!(eval.validate().is_err());
    }

    #[test]
    fn unknown_ready_to_start_variant_fails_to_parse() {
        let mut raw = sample_evaluation_json();
        raw["trainerSummary"]["readyToStart"] = json!("Maybe");
        assert!(serde_json::from_value::<Evaluation>(raw).is_err());
    }

    #[test]
    fn oversized_lists_fail_validation() {
        let mut raw = sample_evaluation_json();
        raw["strengths"] = json!(vec!["x"; 9]);
        let eval: Evaluation = serde_json::from_value(raw).unwrap();
        assert!(eval.validate().is_err());
    }

    #[test]
    fn role_labels_resolve_known_ids() {
        assert_eq!(role_label("ai_ml"), Some("AI / ML Engineer"));
        assert_eq!(role_label("unknown_role"), None);
    }
}
