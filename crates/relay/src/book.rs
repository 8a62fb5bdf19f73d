use std::collections::BTreeMap;

use crate::payload::{GmContext, RelayPayload};
use crate::{RelayError, ACTION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    Script,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroEntry {
    pub id: String,
    pub name: String,
    pub kind: MacroKind,
    pub command: String,
}

impl MacroEntry {
    pub fn script(id: impl Into<String>, name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: MacroKind::Script,
            command: command.into(),
        }
    }
}

/// A resolved relay request: the script to run and the context to run it with.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch<'a> {
    pub entry: &'a MacroEntry,
    pub context: GmContext,
}

/// The macros known to one client, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MacroBook {
    entries: BTreeMap<String, MacroEntry>,
}

impl MacroBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: MacroEntry) -> Option<MacroEntry> {
        self.entries.insert(entry.id.clone(), entry)
    }

    pub fn get(&self, id: &str) -> Option<&MacroEntry> {
        self.entries.get(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&MacroEntry> {
        self.entries.values().find(|entry| entry.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves an incoming payload. A missing context reads as empty.
    pub fn receive(&self, payload: &RelayPayload) -> Result<Dispatch<'_>, RelayError> {
        if payload.action != ACTION {
            return Err(RelayError::UnknownAction(payload.action.clone()));
        }
        let id = payload
            .macro_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(RelayError::MissingMacroId)?;
        let entry = self
            .get(id)
            .ok_or_else(|| RelayError::UnknownMacro(id.to_string()))?;
        if entry.kind != MacroKind::Script {
            return Err(RelayError::NotAScript {
                name: entry.name.clone(),
            });
        }
        tracing::debug!(macro_id = %entry.id, name = %entry.name, "dispatching relayed macro");
        Ok(Dispatch {
            entry,
            context: payload.gm_context.clone().unwrap_or_default(),
        })
    }

    pub fn receive_json(&self, text: &str) -> Result<Dispatch<'_>, RelayError> {
        let payload = RelayPayload::from_json(text)?;
        self.receive(&payload)
    }
}
