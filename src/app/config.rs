//! Application configuration types

use anyhow::{bail, Context, Result};
use parley_core::{AgentIdentity, EngineConfig, Session, SessionKind, StaticDirectory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Engine tuning, loop policy and silence rules
    #[serde(default)]
    pub engine: EngineConfig,
    /// Registered agents
    #[serde(default)]
    pub agents: Vec<AgentIdentity>,
    /// Known sessions
    #[serde(default)]
    pub sessions: Vec<SessionEntry>,
}

/// A session as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub id: String,
    #[serde(default = "default_kind")]
    pub kind: SessionKind,
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestrator: Option<String>,
}

fn default_kind() -> SessionKind {
    SessionKind::Group
}

impl SessionEntry {
    /// Convert into the engine's session type.
    pub fn to_session(&self) -> Session {
        let session = match self.kind {
            SessionKind::Direct => {
                let agent = self.members.first().cloned().unwrap_or_default();
                Session::direct(self.id.clone(), agent)
            }
            SessionKind::Group => Session::group(self.id.clone(), self.members.iter().cloned()),
        };
        match &self.orchestrator {
            Some(orchestrator) => session.with_orchestrator(orchestrator.clone()),
            None => session,
        }
    }
}

impl AppConfig {
    /// Check engine settings and cross-references between agents and sessions.
    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .context("Invalid engine configuration")?;

        let mut known = HashSet::new();
        for agent in &self.agents {
            if agent.id.trim().is_empty() {
                bail!("agents: agent ID must not be empty");
            }
            if agent.display_name.trim().is_empty() {
                bail!("agents.{}: display name must not be empty", agent.id);
            }
            if !known.insert(agent.id.as_str()) {
                bail!("agents: duplicate agent ID '{}'", agent.id);
            }
        }

        let mut sessions = HashSet::new();
        for session in &self.sessions {
            if !sessions.insert(session.id.as_str()) {
                bail!("sessions: duplicate session ID '{}'", session.id);
            }
            if session.kind == SessionKind::Direct && session.members.len() != 1 {
                bail!(
                    "sessions.{}: a direct session needs exactly one member, found {}",
                    session.id,
                    session.members.len()
                );
            }
            if let Some(unknown) = session
                .members
                .iter()
                .chain(session.orchestrator.iter())
                .find(|id| !known.contains(id.as_str()))
            {
                bail!("sessions.{}: unknown agent '{}'", session.id, unknown);
            }
        }

        Ok(())
    }

    /// Build an in-memory agent directory from the configured agents and sessions.
    pub fn directory(&self) -> StaticDirectory {
        let directory = self
            .agents
            .iter()
            .cloned()
            .fold(StaticDirectory::new(), StaticDirectory::with_agent);
        self.sessions
            .iter()
            .map(SessionEntry::to_session)
            .fold(directory, StaticDirectory::with_session)
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Write the configuration to a TOML file, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::AgentDirectory;

    fn sample() -> AppConfig {
        AppConfig {
            engine: EngineConfig::default(),
            agents: vec![
                AgentIdentity::new("backend", "Sindri"),
                AgentIdentity::new("pm", "Athena"),
            ],
            sessions: vec![SessionEntry {
                id: "team".to_string(),
                kind: SessionKind::Group,
                members: vec!["backend".to_string(), "pm".to_string()],
                orchestrator: Some("pm".to_string()),
            }],
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_unknown_member_rejected() {
        let mut config = sample();
        config.sessions[0].members.push("ghost".to_string());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("ghost"));
    }

    #[test]
    fn test_direct_session_needs_one_member() {
        let mut config = sample();
        config.sessions[0].kind = SessionKind::Direct;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_agent_rejected() {
        let mut config = sample();
        config.agents.push(AgentIdentity::new("pm", "Other"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_display_name_rejected() {
        let mut config = sample();
        config.agents[1].display_name = "   ".to_string();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("agents.pm"));
    }

    #[test]
    fn test_directory_from_config() {
        let directory = sample().directory();
        let members = directory.list_session_members("team");
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].display_name, "Athena");
        assert_eq!(directory.get_orchestrator("team").unwrap().id, "pm");
    }

    #[test]
    fn test_save_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("parley.toml");
        sample().save(&path).unwrap();

        let loaded: AppConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.agents, sample().agents);
        assert_eq!(loaded.engine, EngineConfig::default());
    }
}
