// Applying loaded configuration to endpoint registration

use rampart_config::{ConfigError, RampartConfig};
use rampart_validation::EndpointBuilder;

/// Apply envelope options and, when domains are configured, the cookie policy.
pub trait ConfigureEndpoint: Sized {
    fn configured(self, config: &RampartConfig) -> Result<Self, ConfigError>;
}

impl ConfigureEndpoint for EndpointBuilder {
    fn configured(self, config: &RampartConfig) -> Result<Self, ConfigError> {
        let builder = self.envelope_options(config.envelope_options());
        if config.cookies.trusted_domains.is_empty() {
            return Ok(builder);
        }
        Ok(builder.cookie_policy(config.cookie_policy()?))
    }
}
