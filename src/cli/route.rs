//! `parley route`: dry-run responder resolution

use crate::app::AppConfig;
use anyhow::{bail, Result};
use parley_core::{AgentDirectory, Message, ResponderResolver};

pub fn run(app: &AppConfig, session_id: &str, text: &str) -> Result<()> {
    let directory = app.directory();
    if directory.session(session_id).is_none() {
        bail!("Unknown session '{}'", session_id);
    }

    let members = directory.list_session_members(session_id);
    let orchestrator = directory.get_orchestrator(session_id);
    let message = Message::user(session_id, "user", text);

    let resolution =
        ResponderResolver::new(&directory).resolve(&message, &members, orchestrator.as_ref(), &[]);

    println!("rule: {}", resolution.rule);
    for id in &resolution.responders {
        let name = members
            .iter()
            .find(|m| &m.id == id)
            .map_or(id.as_str(), |m| m.display_name.as_str());
        println!("  -> {} ({})", name, id);
    }
    Ok(())
}
