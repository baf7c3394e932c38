//! Mission brief payload
//!
//! Composes the plain-text brief that the dashboard shares through the
//! export pipeline: operational metrics, the agent formation and the
//! mission priorities.

use std::fmt::{self, Write as _};

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Roles assigned to formation agents, in seat order
pub const FORMATION_ROLES: [&str; 4] = [
    "Strategic Analysis",
    "Pressure Testing",
    "Chaos Engineering",
    "Synthesis Coordination",
];

/// Headline numbers shown on the mission card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationalMetrics {
    /// Operations per second
    pub throughput: u32,
    /// Average latency in milliseconds
    pub latency_ms: u32,
    /// Percent
    pub reliability: f64,
    /// Percent
    pub efficiency: f64,
}

impl Default for OperationalMetrics {
    fn default() -> Self {
        Self {
            throughput: 1250,
            latency_ms: 230,
            reliability: 99.8,
            efficiency: 94.2,
        }
    }
}

/// Agents seated in the formation, one per role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentFormation {
    pub agents: Vec<String>,
    /// Percent
    pub confidence: u8,
    /// Local time the formation was reported; filled at compose time when empty
    pub timestamp: Option<String>,
}

impl Default for AgentFormation {
    fn default() -> Self {
        Self {
            agents: ["Claude", "DeepSeek", "Grok", "ChatGPT"]
                .into_iter()
                .map(String::from)
                .collect(),
            confidence: 85,
            timestamp: None,
        }
    }
}

/// Everything that goes into a shared brief
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionBrief {
    pub title: String,
    pub status: String,
    pub metrics: OperationalMetrics,
    pub formation: AgentFormation,
    pub priorities: Vec<String>,
}

impl Default for MissionBrief {
    fn default() -> Self {
        Self {
            title: "Strategic AI Orchestration".to_string(),
            status: "OPERATIONAL EXCELLENCE".to_string(),
            metrics: OperationalMetrics::default(),
            formation: AgentFormation::default(),
            priorities: vec![
                "Week 1: Multi-AI baseline assessment".to_string(),
                "Week 2: Orchestration deployment".to_string(),
                "Week 3: Antifragile validation".to_string(),
                "Week 4: Strategic briefing + trust score".to_string(),
            ],
        }
    }
}

impl MissionBrief {
    /// Render the brief as the shared text payload
    pub fn compose(&self) -> String {
        let mut text = String::new();
        let m = &self.metrics;
        let f = &self.formation;

        // Writing into a String cannot fail
        let _ = writeln!(text, "TRS OBSIDIAN MISSION BRIEF");
        let _ = writeln!(text, "{}", self.title);
        let _ = writeln!(text);
        let _ = writeln!(text, "TRUST FIRST. SCALE SECOND.");
        let _ = writeln!(text, "Multi-Agent Intelligence Formation");
        let _ = writeln!(text);
        let _ = writeln!(text, "OPERATIONAL METRICS");
        let _ = writeln!(text, "• {} ops/sec", m.throughput);
        let _ = writeln!(text, "• {}ms avg latency", m.latency_ms);
        let _ = writeln!(text, "• {}% reliability", m.reliability);
        let _ = writeln!(text, "• {}% efficiency", m.efficiency);
        let _ = writeln!(text);
        let _ = writeln!(text, "AI FORMATION STATUS");
        for (i, role) in FORMATION_ROLES.iter().enumerate() {
            let agent = f.agents.get(i).map_or("Unassigned", String::as_str);
            let _ = writeln!(text, "• {agent} → {role}");
        }
        let _ = writeln!(text, "• Confidence: {}%", f.confidence);
        let _ = writeln!(text);
        let _ = writeln!(text, "MISSION PRIORITIES");
        for priority in &self.priorities {
            let _ = writeln!(text, "• {priority}");
        }
        let _ = writeln!(text);
        let _ = writeln!(text, "STATUS: {}", self.status);

        let generated = f
            .timestamp
            .clone()
            .unwrap_or_else(|| Local::now().format("%H:%M:%S").to_string());
        let _ = write!(text, "Generated: {generated}");

        text
    }
}

impl fmt::Display for MissionBrief {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.compose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_brief() -> MissionBrief {
        let mut brief = MissionBrief::default();
        brief.formation.timestamp = Some("14:05:09".to_string());
        brief
    }

    #[test]
    fn test_default_brief_sections() {
        let text = fixed_brief().compose();

        assert!(text.starts_with("TRS OBSIDIAN MISSION BRIEF\nStrategic AI Orchestration\n"));
        assert!(text.contains("OPERATIONAL METRICS\n• 1250 ops/sec\n• 230ms avg latency\n"));
        assert!(text.contains("• 99.8% reliability\n• 94.2% efficiency\n"));
        assert!(text.contains("• Claude → Strategic Analysis\n"));
        assert!(text.contains("• ChatGPT → Synthesis Coordination\n• Confidence: 85%\n"));
        assert!(text.contains("MISSION PRIORITIES\n• Week 1: Multi-AI baseline assessment\n"));
        assert!(text.ends_with("STATUS: OPERATIONAL EXCELLENCE\nGenerated: 14:05:09"));
    }

    #[test]
    fn test_short_formation_marks_empty_seats() {
        let mut brief = fixed_brief();
        brief.formation.agents = vec!["Claude".to_string()];

        let text = brief.compose();
        assert!(text.contains("• Claude → Strategic Analysis\n"));
        assert!(text.contains("• Unassigned → Pressure Testing\n"));
        assert!(text.contains("• Unassigned → Synthesis Coordination\n"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let brief: MissionBrief = serde_json::from_str(
            r#"{"title": "Orbit Sync", "metrics": {"throughput": 900}}"#,
        )
        .unwrap();

        assert_eq!(brief.title, "Orbit Sync");
        assert_eq!(brief.metrics.throughput, 900);
        assert_eq!(brief.metrics.latency_ms, 230);
        assert_eq!(brief.status, "OPERATIONAL EXCELLENCE");
        assert_eq!(brief.priorities.len(), 4);
    }

    #[test]
    fn test_generated_timestamp_filled_when_missing() {
        let text = MissionBrief::default().compose();
        let generated = text.rsplit("Generated: ").next().unwrap();
        assert_eq!(generated.len(), "HH:MM:SS".len());
    }
}
