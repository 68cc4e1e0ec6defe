//! The guard chain: which inbound messages the bot reacts to.
//!
//! Guards run in a fixed order and the first failure wins. Rejections are
//! silent; the rejecting guard is reported only so callers can log it.

use henrybot_config::DiscordConfig;
use henrybot_core::channel::{InboundMessage, Origin};

/// The guards, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// The message was written by the bot (or, optionally, any bot)
    NotSelf,
    /// The message was posted outside the configured channel
    RestrictedChannel,
    /// The message is empty or carries attachments or embeds
    ContentType,
}

impl Guard {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSelf => "not_self",
            Self::RestrictedChannel => "restricted_channel",
            Self::ContentType => "content_type",
        }
    }
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected(Guard),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

#[derive(Debug, Clone)]
pub struct GuardChain {
    bot_id: String,
    channel_id: String,
    ignore_other_bots: bool,
}

impl GuardChain {
    pub fn new(bot_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            channel_id: channel_id.into(),
            ignore_other_bots: false,
        }
    }

    pub fn from_config(config: &DiscordConfig) -> Self {
        Self::new(&config.bot_id, &config.channel_id).ignore_other_bots(config.ignore_other_bots)
    }

    pub fn ignore_other_bots(mut self, ignore: bool) -> Self {
        self.ignore_other_bots = ignore;
        self
    }

    pub fn check(&self, msg: &InboundMessage) -> Admission {
        if msg.author_id == self.bot_id || (self.ignore_other_bots && msg.origin == Origin::Bot) {
            return Admission::Rejected(Guard::NotSelf);
        }
        if msg.channel_id.as_str() != self.channel_id {
            return Admission::Rejected(Guard::RestrictedChannel);
        }
        if !msg.is_plain_text() {
            return Admission::Rejected(Guard::ContentType);
        }
        Admission::Admitted
    }
}
