use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Severity classification attached to every alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Parse a severity label in any letter case.
    ///
    /// Unclassified labels fall back to `Low`, matching how the alert
    /// source classifies recalls without a known class.
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" => Severity::High,
            "medium" => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Severity::parse_lenient(&label))
    }
}

/// Position of an alert inside the result set that returned it.
///
/// Only meaningful within one `SearchResultSet`; a new search yields new ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlertId(pub usize);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One compliance-relevant record returned by a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub id: AlertId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recall_number: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
}

impl Alert {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id: AlertId::default(),
            title: title.into(),
            description: description.into(),
            severity,
            date: date.into(),
            source: None,
            source_url: None,
            event_id: None,
            recall_number: None,
            components: Vec::new(),
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_recall_number(mut self, recall_number: impl Into<String>) -> Self {
        self.recall_number = Some(recall_number.into());
        self
    }

    /// Project to the fields the chat and report collaborators receive
    pub fn context(&self) -> AlertContext {
        AlertContext {
            date: self.date.clone(),
            severity: self.severity,
            description: self.description.clone(),
        }
    }
}

/// Projection of an alert sent to the chat and report collaborators.
///
/// Never carries title, source or id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertContext {
    pub date: String,
    pub severity: Severity,
    pub description: String,
}

/// The alerts returned by one search. Replaced wholesale, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    pub query: String,
    pub alerts: Vec<Alert>,
    pub total: usize,
}

impl SearchResultSet {
    /// Build a result set, assigning each alert its position as id
    pub fn new(query: impl Into<String>, alerts: Vec<Alert>, total: usize) -> Self {
        let alerts = alerts
            .into_iter()
            .enumerate()
            .map(|(position, mut alert)| {
                alert.id = AlertId(position);
                alert
            })
            .collect();

        Self {
            query: query.into(),
            alerts,
            total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn get(&self, id: AlertId) -> Option<&Alert> {
        self.alerts.get(id.0)
    }

    pub fn contexts(&self) -> Vec<AlertContext> {
        self.alerts.iter().map(Alert::context).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_accepts_any_case() {
        let parsed: Vec<Severity> = serde_json::from_str(r#"["High", "medium", "LOW"]"#).unwrap();
        assert_eq!(parsed, vec![Severity::High, Severity::Medium, Severity::Low]);
    }

    #[test]
    fn test_unknown_severity_is_low() {
        let parsed: Severity = serde_json::from_str(r#""class iii""#).unwrap();
        assert_eq!(parsed, Severity::Low);
    }

    #[test]
    fn test_result_set_assigns_positional_ids() {
        let alerts: Vec<Alert> = serde_json::from_str(
            r#"[
                {"title": "A", "description": "first", "date": "20240101", "severity": "high", "source": "FDA"},
                {"title": "B", "description": "second", "date": "20240102", "severity": "low"}
            ]"#,
        )
        .unwrap();

        let set = SearchResultSet::new("aspirin", alerts, 2);
        assert_eq!(set.alerts[0].id, AlertId(0));
        assert_eq!(set.alerts[1].id, AlertId(1));
        assert_eq!(set.get(AlertId(1)).map(|a| a.title.as_str()), Some("B"));
    }

    #[test]
    fn test_context_drops_identifying_fields() {
        let alert = Alert::new("Recall", "Contamination", Severity::High, "20240301")
            .with_source_url("https://example.org/recall");

        let json = serde_json::to_value(alert.context()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "20240301",
                "severity": "high",
                "description": "Contamination",
            })
        );
    }
}
