use crate::plugins::{Plugin, PluginContext};
use crate::state::Resource;
use crate::PluginError;

/// Internal field holding whether the status code was acceptable
pub const SUCCESSFUL_FIELD: &str = "_successful";

/// Status codes accepted by [`Status::lenient`]
const LENIENT_CODES: &[u16] = &[200, 300, 301, 302, 303, 307];

/// Records `statusCode` and marks the resource successful if the code is acceptable
#[derive(Debug, Clone)]
pub struct Status {
    accepted: Vec<u16>,
}

impl Default for Status {
    fn default() -> Self {
        Self { accepted: vec![200] }
    }
}

impl Status {
    pub fn new(accepted: impl IntoIterator<Item = u16>) -> Self {
        Self {
            accepted: accepted.into_iter().collect(),
        }
    }

    /// Also accepts the common redirect codes
    pub fn lenient() -> Self {
        Self::new(LENIENT_CODES.iter().copied())
    }

    pub fn accepts(&self, status_code: u16) -> bool {
        self.accepted.contains(&status_code)
    }
}

impl Plugin for Status {
    fn name(&self) -> &str {
        "status"
    }

    fn process(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        let status_code = ctx.response().status_code;
        let successful = self.accepts(status_code);

        let resource = ctx.resource_mut();
        resource.status_code = Some(status_code);
        resource.set(SUCCESSFUL_FIELD, successful)?;
        Ok(())
    }
}

/// Whether the status plugin accepted this resource's status code
pub fn is_successful(resource: &Resource) -> bool {
    resource
        .get(SUCCESSFUL_FIELD)
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}
