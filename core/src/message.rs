//! Message descriptor.

use serde::{Deserialize, Serialize};

use crate::ParsedArgs;

/// The message a command was invoked from, as far as argument parsing
/// needs it.
///
/// Reply and mention data must already be resolved by the caller; the parser
/// never fetches anything.
///
/// # Examples
///
/// ```
/// use command_args_core::{MessageContext, ParsedArgs};
///
/// let mut message = MessageContext::new("100")
///     .replying_to("200")
///     .with_mentions(["200"]);
/// assert!(message.mentions("200"));
/// assert!(message.args_result().is_none());
///
/// message.attach_args_result(ParsedArgs::new("hi"));
/// assert_eq!(message.args_result().map(|a| a.content.as_str()), Some("hi"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    /// Id of the message author.
    pub author_id: String,
    /// Id of the author of the message this one replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replied_author_id: Option<String>,
    /// Ids of the users pinged by this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mention_ids: Vec<String>,
    #[serde(skip)]
    args_result: Option<ParsedArgs>,
}

impl MessageContext {
    /// Creates a plain message by `author_id`.
    pub fn new(author_id: &str) -> Self {
        Self {
            author_id: author_id.to_string(),
            ..Self::default()
        }
    }

    /// Marks the message as a reply to a message by `author_id`.
    pub fn replying_to(mut self, author_id: &str) -> Self {
        self.replied_author_id = Some(author_id.to_string());
        self
    }

    /// Sets the pinged user ids.
    pub fn with_mentions<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mention_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` if the message pings `user_id`.
    pub fn mentions(&self, user_id: &str) -> bool {
        self.mention_ids.iter().any(|id| id == user_id)
    }

    /// Keeps a parse result with the message for later inspection.
    pub fn attach_args_result(&mut self, args: ParsedArgs) {
        self.args_result = Some(args);
    }

    /// Returns the last attached parse result.
    pub fn args_result(&self) -> Option<&ParsedArgs> {
        self.args_result.as_ref()
    }

    /// Removes and returns the attached parse result.
    pub fn take_args_result(&mut self) -> Option<ParsedArgs> {
        self.args_result.take()
    }
}
