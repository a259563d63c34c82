//! tasks::tag
//!
//! Create or delete a tag. With a message the tag is annotated and signed
//! by the author identity; without one it is lightweight.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use super::{open_repo, Action, Task, TaskError, TaskReport};
use crate::core::resolve;
use crate::core::types::{Identity, Oid, RefName};

#[derive(Debug, Clone)]
pub struct TagTask {
    pub path: PathBuf,
    pub action: Action,
    pub tag: String,
    /// Ref-ish to tag; required for `add`
    pub reference: Option<String>,
    pub message: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagPayload {
    pub tag: String,
    /// Commit the tag points at, when one was created
    pub target: Option<Oid>,
}

impl Task for TagTask {
    const NAME: &'static str = "tag";
    type Payload = TagPayload;

    fn run(&self) -> Result<TaskReport<TagPayload>, TaskError> {
        let tag = self.tag.trim();
        let tag_ref =
            RefName::for_tag(tag).map_err(|e| TaskError::invalid_state(e.to_string()))?;

        let reference = match (self.action, self.reference.as_deref()) {
            (Action::Add, None) => {
                return Err(TaskError::invalid_state(
                    "a ref is required to add a tag",
                ))
            }
            (_, reference) => reference,
        };

        let (git, config) = open_repo(&self.path)?;
        let exists = git.ref_exists(tag_ref.as_str());
        let mut payload = TagPayload {
            tag: tag.to_string(),
            target: None,
        };

        match self.action {
            Action::Delete if !exists => Ok(TaskReport::unchanged(
                format!("tag {} doesn't exist", tag),
                payload,
            )),
            Action::Delete => {
                git.delete_tag(tag)?;
                info!(tag, "deleted tag");
                Ok(TaskReport::changed(format!("tag {} deleted", tag), payload))
            }
            Action::Add if exists => {
                payload.target = git.try_resolve_ref(tag_ref.as_str())?;
                Ok(TaskReport::unchanged(
                    format!("tag {} already exists", tag),
                    payload,
                ))
            }
            Action::Add => {
                let reference = reference.unwrap_or(RefName::HEAD);
                let target = resolve::resolve(&git, reference)?
                    .ok_or_else(|| TaskError::not_found(format!("failed to get {}", reference)))?
                    .commit;

                match self.message.as_deref() {
                    Some(message) => {
                        let defaults = config.identity();
                        let tagger = Identity::new(
                            self.author.clone().unwrap_or(defaults.name),
                            self.email.clone().unwrap_or(defaults.email),
                        );
                        git.create_annotated_tag(tag, &target, &tagger, message)?;
                    }
                    None => {
                        git.create_lightweight_tag(tag, &target)?;
                    }
                }
                info!(tag, %target, annotated = self.message.is_some(), "created tag");

                payload.target = Some(target);
                Ok(TaskReport::changed(
                    format!("tag {} applied to ref {}", tag, reference),
                    payload,
                ))
            }
        }
    }
}
