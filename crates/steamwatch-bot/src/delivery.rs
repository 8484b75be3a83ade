//! Delivery selected at startup from `delivery.kind`.

use steamwatch_core::config::{DeliveryConfig, DeliveryKind};
use steamwatch_core::{Delivery, DeliveryError, LogDelivery};
use steamwatch_types::Destination;

use crate::discord::DiscordDelivery;
use crate::error::BotError;

/// The configured delivery collaborator.
#[derive(Debug, Clone)]
pub enum BotDelivery {
    /// Post to Discord.
    Discord(DiscordDelivery),
    /// Log only.
    Log(LogDelivery),
}

impl BotDelivery {
    /// Build the delivery named by `config.kind`.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Discord`] if Discord is selected without a token
    /// or its client cannot be built.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, BotError> {
        match config.kind {
            DeliveryKind::Log => Ok(Self::Log(LogDelivery)),
            DeliveryKind::Discord => {
                let token = config.bot_token.as_deref().ok_or_else(|| BotError::Discord {
                    message: "no bot token configured".to_owned(),
                })?;
                Ok(Self::Discord(DiscordDelivery::new(
                    &config.discord_api_url,
                    token,
                )?))
            }
        }
    }

    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Discord(_) => "discord",
            Self::Log(_) => "log",
        }
    }
}

impl Delivery for BotDelivery {
    async fn resolve(&self, destination: &Destination) -> Result<bool, DeliveryError> {
        match self {
            Self::Discord(discord) => discord.resolve(destination).await,
            Self::Log(log) => log.resolve(destination).await,
        }
    }

    async fn deliver(&self, destination: &Destination, message: &str) -> Result<(), DeliveryError> {
        match self {
            Self::Discord(discord) => discord.deliver(destination, message).await,
            Self::Log(log) => log.deliver(destination, message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_the_default() {
        let delivery = BotDelivery::from_config(&DeliveryConfig::default());
        assert!(matches!(delivery, Ok(BotDelivery::Log(_))));
    }

    #[test]
    fn discord_needs_a_token() {
        let mut config = DeliveryConfig {
            kind: DeliveryKind::Discord,
            ..DeliveryConfig::default()
        };
        assert!(matches!(
            BotDelivery::from_config(&config),
            Err(BotError::Discord { .. })
        ));

        config.bot_token = Some("token".to_owned());
        let delivery = BotDelivery::from_config(&config);
        assert!(delivery.is_ok_and(|d| d.name() == "discord"));
    }
}
