//! # Execution Context
//!
//! Per-invocation view handed to command handlers: parsed arguments, flags,
//! the resolved target user, and the `respond` family that tracks the last
//! response so later calls can edit or chain from it.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, OnceLock};
use std::time::Duration;

use crate::application::bot::Bot;
use crate::application::message::ResilientMessage;
use crate::domain::error::TransportFault;
use crate::domain::traits::ResponseRequest;
use crate::domain::types::{EntityKind, FormatOptions, ResponseMode, UserRef};

/// `-name` optionally followed by digits, at input start or after whitespace.
static FLAG_ARGUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\s|^)(-[a-zA-Z_]+)([0-9]+)?").expect("flag pattern is valid")
});

/// One match of a command's trigger pattern, with owned capture groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    groups: Vec<Option<String>>,
}

impl PatternMatch {
    pub(crate) fn from_captures(captures: &Captures<'_>) -> Self {
        Self {
            groups: captures
                .iter()
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        }
    }

    /// The whole matched text.
    pub fn as_str(&self) -> &str {
        self.get(0).unwrap_or_default()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }
}

#[derive(Debug)]
struct FilteredInput {
    flags: HashMap<String, String>,
    text: String,
}

impl FilteredInput {
    fn parse(input: &str) -> Self {
        let flags = FLAG_ARGUMENT
            .captures_iter(input)
            .filter_map(|caps| {
                let name = caps.get(1)?.as_str().to_string();
                let value = caps.get(2).map_or("", |m| m.as_str()).to_string();
                Some((name, value))
            })
            .collect();
        let text = FLAG_ARGUMENT.replace_all(input, "").trim().to_string();
        Self { flags, text }
    }
}

/// Options for [`Context::respond`] and [`Context::respond_multi`].
///
/// Unset fields fall back to the documented defaults of each call.
#[derive(Debug, Clone, Default)]
pub struct RespondOptions {
    pub mode: Option<ResponseMode>,
    pub redact: Option<bool>,
    /// Message to respond to; the invoking message when unset.
    pub target: Option<ResilientMessage>,
    pub reuse_response: Option<bool>,
    pub delete_after: Option<Duration>,
    pub format: FormatOptions,
}

impl RespondOptions {
    pub fn mode(mode: ResponseMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn reuse() -> Self {
        Self {
            reuse_response: Some(true),
            ..Self::default()
        }
    }
}

pub struct Context {
    bot: Arc<Bot>,
    msg: ResilientMessage,
    segments: Vec<String>,
    input: String,
    matches: Vec<PatternMatch>,

    args: OnceLock<Vec<String>>,
    filtered: OnceLock<FilteredInput>,

    response: Option<ResilientMessage>,
    response_mode: Option<ResponseMode>,
}

impl Context {
    pub(crate) fn new(
        bot: Arc<Bot>,
        msg: ResilientMessage,
        segments: Vec<String>,
        cmd_len: usize,
        matches: Vec<PatternMatch>,
    ) -> Self {
        let input = msg.text().get(cmd_len..).unwrap_or_default().to_string();
        Self {
            bot,
            msg,
            segments,
            input,
            matches,
            args: OnceLock::new(),
            filtered: OnceLock::new(),
            response: None,
            response_mode: None,
        }
    }

    pub fn bot(&self) -> &Arc<Bot> {
        &self.bot
    }

    pub fn msg(&self) -> &ResilientMessage {
        &self.msg
    }

    /// The token that triggered the command (name or alias).
    pub fn invoker(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or_default()
    }

    /// Raw text following the invoker.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn matches(&self) -> &[PatternMatch] {
        &self.matches
    }

    pub fn response_mode(&self) -> Option<ResponseMode> {
        self.response_mode
    }

    /// Segments after the invoker.
    pub fn args(&self) -> &[String] {
        self.args
            .get_or_init(|| self.segments.iter().skip(1).cloned().collect())
    }

    /// Flags found in the input, mapped to their numeric suffix (or "").
    pub fn flags(&self) -> &HashMap<String, String> {
        &self.filtered().flags
    }

    /// The input with every flag removed and trimmed.
    pub fn filtered_input(&self) -> &str {
        &self.filtered().text
    }

    fn filtered(&self) -> &FilteredInput {
        self.filtered.get_or_init(|| FilteredInput::parse(&self.input))
    }

    /// Resolve who a moderation-style command is aimed at, and why.
    ///
    /// Input wins over the replied-to message.
    pub fn target_user_and_reason(&self) -> (Option<UserRef>, Option<String>) {
        let input = self.filtered_input();
        if !input.is_empty() {
            let mut parts = input.splitn(2, char::is_whitespace);
            let user = parts.next().unwrap_or_default();
            let reason = parts
                .next()
                .map(str::trim_start)
                .filter(|rest| !rest.is_empty())
                .map(str::to_string);

            let user_ref = if !user.is_empty() && user.chars().all(|c| c.is_ascii_digit()) {
                user.parse().ok().map(UserRef::Id)
            } else if user.starts_with('@') {
                Some(UserRef::Username(user.to_string()))
            } else {
                self.msg
                    .entities()
                    .iter()
                    .filter(|ent| ent.kind == EntityKind::TextMention)
                    .find_map(|ent| ent.user.as_ref())
                    .map(|u| u.preferred_ref())
            };
            return (user_ref, reason);
        }

        if let Some(reply) = self.msg.reply_to()
            && let Some(user) = reply.forward_from().or(reply.from_user())
        {
            return (Some(user.preferred_ref()), None);
        }

        (None, None)
    }

    /// Respond to the invocation (or `options.target`).
    ///
    /// With `reuse_response` set and an unchanged mode, the previous response
    /// is edited instead of sending a new one.
    pub async fn respond(
        &mut self,
        text: &str,
        options: RespondOptions,
    ) -> Result<ResilientMessage, TransportFault> {
        let responder = self.bot.responder().clone();
        let target = options.target.unwrap_or_else(|| self.msg.clone());
        let reuse = options.reuse_response.unwrap_or(false);
        let request = ResponseRequest {
            mode: options.mode,
            redact: options.redact,
            format: options.format,
        };

        let prior = if reuse && self.response_mode == options.mode {
            self.response.as_mut()
        } else {
            None
        };

        let response = responder
            .produce_response(&target, text, request, prior)
            .await?;
        self.response = Some(response.clone());
        self.response_mode = options.mode;

        if let Some(delay) = options.delete_after {
            let doomed = response.clone();
            responder.run_detached(Box::pin(async move {
                tokio::time::sleep(delay).await;
                if let Err(e) = doomed.delete(true, true).await {
                    tracing::warn!("Deferred delete of message {} failed: {}", doomed.id(), e);
                }
            }));
        }

        Ok(response)
    }

    /// Like [`Context::respond`], but after the first response every further
    /// call replies to the previous response unless told otherwise.
    pub async fn respond_multi(
        &mut self,
        text: &str,
        mut options: RespondOptions,
    ) -> Result<ResilientMessage, TransportFault> {
        if let Some(previous) = &self.response {
            options.mode.get_or_insert(ResponseMode::Reply);
            if options.target.is_none() {
                options.target = Some(previous.clone());
            }
            options.reuse_response.get_or_insert(false);
        }
        self.respond(text, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ChatKind, MessageEntity, User};
    use crate::testing::{Call, RecordedResponse, StubTransport, context_for, raw_message, test_bot};

    #[test]
    fn test_args_skip_invoker() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, _) = test_bot(&stub);
        let ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".ban @user spam"));

        assert_eq!(ctx.invoker(), "ban");
        assert_eq!(ctx.args(), ["@user", "spam"]);
        assert_eq!(ctx.input(), "@user spam");
    }

    #[test]
    fn test_flags_and_filtered_input() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, _) = test_bot(&stub);
        let ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".x foo -w10 bar -x baz"));

        let expected: HashMap<String, String> =
            [("-w".to_string(), "10".to_string()), ("-x".to_string(), String::new())]
                .into_iter()
                .collect();
        assert_eq!(ctx.flags(), &expected);
        assert_eq!(ctx.filtered_input(), "foo bar baz");
        // Repeated reads in either order agree with the first parse.
        assert_eq!(ctx.filtered_input(), "foo bar baz");
        assert_eq!(ctx.flags(), &expected);
    }

    #[test]
    fn test_filtered_input_first_then_flags() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, _) = test_bot(&stub);
        let ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".dl -a link-with-dash -q"));

        assert_eq!(ctx.filtered_input(), "link-with-dash");
        assert_eq!(ctx.flags().len(), 2);
        assert_eq!(ctx.flags()["-a"], "");
        assert_eq!(ctx.flags()["-q"], "");
    }

    #[test]
    fn test_target_from_numeric_input() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, _) = test_bot(&stub);
        let ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".ban 123456 spamming"));

        assert_eq!(
            ctx.target_user_and_reason(),
            (Some(UserRef::Id(123456)), Some("spamming".to_string()))
        );
    }

    #[test]
    fn test_target_from_username_input() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, _) = test_bot(&stub);
        let ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".ban @bob"));

        assert_eq!(
            ctx.target_user_and_reason(),
            (Some(UserRef::Username("@bob".into())), None)
        );
    }

    #[test]
    fn test_target_reason_keeps_remaining_text() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, _) = test_bot(&stub);
        let ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".ban @bob  too many  links"));

        assert_eq!(
            ctx.target_user_and_reason(),
            (
                Some(UserRef::Username("@bob".into())),
                Some("too many  links".to_string())
            )
        );
    }

    #[test]
    fn test_target_from_text_mention_entity() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, _) = test_bot(&stub);
        let mut raw = raw_message(1, ChatKind::Group, ".ban Dave flooding");
        raw.entities.push(MessageEntity {
            kind: EntityKind::TextMention,
            offset: 5,
            length: 4,
            user: Some(User {
                id: 31337,
                username: None,
            }),
        });
        let ctx = context_for(&bot, raw);

        assert_eq!(
            ctx.target_user_and_reason(),
            (Some(UserRef::Id(31337)), Some("flooding".to_string()))
        );
    }

    #[test]
    fn test_target_from_forwarded_reply() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, _) = test_bot(&stub);
        let mut reply = raw_message(5, ChatKind::Group, "fwd");
        reply.forward_from = Some(User {
            id: 77,
            username: Some("carol".into()),
        });
        let mut raw = raw_message(6, ChatKind::Group, ".ban");
        raw.reply_to = Some(Box::new(reply));
        let ctx = context_for(&bot, raw);

        assert_eq!(
            ctx.target_user_and_reason(),
            (Some(UserRef::Username("carol".into())), None)
        );
    }

    #[test]
    fn test_target_from_hidden_forward_uses_sender_id() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, _) = test_bot(&stub);
        let mut reply = raw_message(5, ChatKind::Group, "fwd");
        reply.forward_sender_name = Some("Hidden Person".into());
        reply.from_user = Some(User {
            id: 55,
            username: None,
        });
        let mut raw = raw_message(6, ChatKind::Group, ".ban");
        raw.reply_to = Some(Box::new(reply));
        let ctx = context_for(&bot, raw);

        assert_eq!(ctx.target_user_and_reason(), (Some(UserRef::Id(55)), None));
    }

    #[test]
    fn test_target_absent() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, _) = test_bot(&stub);
        let ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".ban -s"));

        assert_eq!(ctx.target_user_and_reason(), (None, None));
    }

    #[tokio::test]
    async fn test_respond_reuses_matching_mode() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, recorder) = test_bot(&stub);
        let mut ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".ping"));

        let first = ctx.respond("one", RespondOptions::default()).await.unwrap();
        let second = ctx.respond("two", RespondOptions::reuse()).await.unwrap();
        assert_eq!(first.id(), second.id());

        let third = ctx
            .respond(
                "three",
                RespondOptions {
                    mode: Some(ResponseMode::Error),
                    reuse_response: Some(true),
                    ..RespondOptions::default()
                },
            )
            .await
            .unwrap();
        assert_ne!(third.id(), second.id());
        assert_eq!(ctx.response_mode(), Some(ResponseMode::Error));

        let prior_ids: Vec<_> = recorder.responses().iter().map(|r| r.prior).collect();
        assert_eq!(prior_ids, vec![None, Some(first.id()), None]);
    }

    #[tokio::test]
    async fn test_respond_multi_chains_from_previous_response() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, recorder) = test_bot(&stub);
        let mut ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".list"));

        let first = ctx.respond_multi("page 1", RespondOptions::default()).await.unwrap();
        let second = ctx.respond_multi("page 2", RespondOptions::default()).await.unwrap();
        assert_ne!(first.id(), second.id());

        assert_eq!(
            recorder.responses(),
            vec![
                RecordedResponse {
                    target: 1,
                    text: "page 1".into(),
                    mode: None,
                    prior: None,
                },
                RecordedResponse {
                    target: first.id(),
                    text: "page 2".into(),
                    mode: Some(ResponseMode::Reply),
                    prior: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_respond_multi_respects_overrides() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, recorder) = test_bot(&stub);
        let mut ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".list"));

        let first = ctx.respond_multi("a", RespondOptions::default()).await.unwrap();
        ctx.respond_multi(
            "b",
            RespondOptions {
                mode: Some(ResponseMode::Reply),
                ..RespondOptions::default()
            },
        )
        .await
        .unwrap();
        // Same mode as the stored one and reuse requested: edits the last response.
        ctx.respond_multi("c", RespondOptions::reuse()).await.unwrap();

        let recorded = recorder.responses();
        assert_eq!(recorded[1].target, first.id());
        assert_eq!(recorded[2].mode, Some(ResponseMode::Reply));
        assert!(recorded[2].prior.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_respond_delete_after_runs_detached() {
        let stub = StubTransport::new(ChatKind::Group);
        let (bot, _) = test_bot(&stub);
        let mut ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".tmp"));

        let response = ctx
            .respond(
                "gone soon",
                RespondOptions {
                    delete_after: Some(Duration::from_secs(5)),
                    ..RespondOptions::default()
                },
            )
            .await
            .unwrap();
        drop(ctx);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(stub.calls().contains(&Call::Delete {
            chat_id: 1,
            message_ids: vec![response.id()],
            revoke: true,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_delete_failure_is_swallowed() {
        let stub = StubTransport::new(ChatKind::Group);
        stub.fail_next_delete(TransportFault::Other("gone".into()));
        let (bot, _) = test_bot(&stub);
        let mut ctx = context_for(&bot, raw_message(1, ChatKind::Group, ".tmp"));

        let result = ctx
            .respond(
                "x",
                RespondOptions {
                    delete_after: Some(Duration::from_secs(1)),
                    ..RespondOptions::default()
                },
            )
            .await;
        assert!(result.is_ok());

        tokio::time::sleep(Duration::from_secs(2)).await;
        // The delete ran and hit the fault without recording a call.
        assert_eq!(stub.pending_delete_faults(), 0);
        assert!(
            !stub
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Delete { .. }))
        );

        let second = ctx
            .respond(
                "y",
                RespondOptions {
                    delete_after: Some(Duration::from_secs(1)),
                    ..RespondOptions::default()
                },
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(stub.calls().contains(&Call::Delete {
            chat_id: 1,
            message_ids: vec![second.id()],
            revoke: true,
        }));
    }
}
