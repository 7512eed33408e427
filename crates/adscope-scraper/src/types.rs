use serde::{Deserialize, Serialize};

/// Body of a browser-agent run request.
#[derive(Debug, Clone, Serialize)]
pub struct AgentTaskRequest<'a> {
    pub task: &'a str,
    pub start_url: &'a str,
}

/// Output of one browser-agent run.
///
/// `final_result` is the agent's closing answer; `extracted_content` holds the
/// intermediate extraction blocks in the order the agent produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgentRun {
    #[serde(default)]
    pub final_result: Option<String>,
    #[serde(default)]
    pub extracted_content: Vec<String>,
}

/// One ad entry as written by the agent. Every field is optional and may be
/// `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AgentAd {
    pub library_id: Option<serde_json::Value>,
    pub id: Option<serde_json::Value>,
    pub advertiser: Option<String>,
    pub primary_text: Option<String>,
    pub headline: Option<String>,
    #[serde(alias = "call_to_action")]
    pub cta: Option<String>,
    pub format: Option<String>,
    pub first_seen: Option<String>,
    pub start_date: Option<String>,
    pub platforms: Option<Vec<String>>,
}
