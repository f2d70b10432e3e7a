//! Turbo Stream instructions.
//!
//! An instruction is one `<turbo-stream>` element: an action, a target DOM id
//! and an HTML fragment wrapped in a `<template>`. Fragments are inserted
//! verbatim; escaping untrusted content is the caller's job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::TurboError;

/// The closed set of Turbo Stream actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Append,
    Prepend,
    Replace,
    Update,
    Remove,
    Before,
    After,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Append,
        Action::Prepend,
        Action::Replace,
        Action::Update,
        Action::Remove,
        Action::Before,
        Action::After,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Prepend => "prepend",
            Self::Replace => "replace",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Before => "before",
            Self::After => "after",
        }
    }

    /// Whether the action carries a template fragment.
    pub fn takes_content(self) -> bool {
        !matches!(self, Self::Remove)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = TurboError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| TurboError::UnknownAction(s.to_owned()))
    }
}

/// A single DOM patch instruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawInstruction")]
pub struct Instruction {
    action: Action,
    target: String,
    content: String,
}

/// Wire shape of an [`Instruction`]; decoding goes through [`Instruction::new`].
#[derive(Deserialize)]
struct RawInstruction {
    action: Action,
    target: String,
    #[serde(default)]
    content: String,
}

impl From<RawInstruction> for Instruction {
    fn from(raw: RawInstruction) -> Self {
        Self::new(raw.action, raw.content, raw.target)
    }
}

impl Instruction {
    /// Build an instruction. The content is dropped for [`Action::Remove`].
    pub fn new(action: Action, content: impl Into<String>, target: impl Into<String>) -> Self {
        let content = if action.takes_content() {
            content.into()
        } else {
            String::new()
        };
        Self {
            action,
            target: target.into(),
            content,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Render the `<turbo-stream>` envelope.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<turbo-stream action="{}" target="{}"><template>{}</template></turbo-stream>"#,
            self.action, self.target, self.content
        )
    }
}

/// Render one instruction straight to its serialized form.
pub fn build(action: Action, content: &str, target: &str) -> String {
    Instruction::new(action, content, target).render()
}

pub fn append(content: impl Into<String>, target: impl Into<String>) -> Instruction {
    Instruction::new(Action::Append, content, target)
}

pub fn prepend(content: impl Into<String>, target: impl Into<String>) -> Instruction {
    Instruction::new(Action::Prepend, content, target)
}

pub fn replace(content: impl Into<String>, target: impl Into<String>) -> Instruction {
    Instruction::new(Action::Replace, content, target)
}

pub fn update(content: impl Into<String>, target: impl Into<String>) -> Instruction {
    Instruction::new(Action::Update, content, target)
}

pub fn before(content: impl Into<String>, target: impl Into<String>) -> Instruction {
    Instruction::new(Action::Before, content, target)
}

pub fn after(content: impl Into<String>, target: impl Into<String>) -> Instruction {
    Instruction::new(Action::After, content, target)
}

pub fn remove(target: impl Into<String>) -> Instruction {
    Instruction::new(Action::Remove, "", target)
}

/// One or more rendered instructions delivered as a single unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Single(String),
    Many(Vec<String>),
}

impl Payload {
    /// Concatenate into the wire body, in order, without separators.
    pub fn into_body(self) -> String {
        match self {
            Self::Single(s) => s,
            Self::Many(parts) => parts.concat(),
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::Single(s.to_owned())
    }
}

impl From<Instruction> for Payload {
    fn from(i: Instruction) -> Self {
        Self::Single(i.render())
    }
}

impl From<Vec<String>> for Payload {
    fn from(parts: Vec<String>) -> Self {
        Self::Many(parts)
    }
}

impl From<Vec<Instruction>> for Payload {
    fn from(parts: Vec<Instruction>) -> Self {
        Self::Many(parts.iter().map(Instruction::render).collect())
    }
}

impl<const N: usize> From<[Instruction; N]> for Payload {
    fn from(parts: [Instruction; N]) -> Self {
        Self::Many(parts.iter().map(Instruction::render).collect())
    }
}
