use std::env;

use tracing::debug;

use crate::{
    builder::DebugClientBuilder,
    client::DebugClient,
    defaults::{flag_enabled, DEV_DEBUG_ENABLED_ENV, WEB_CONTEXT_ENVS},
};

/// How the host process is being run.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ExecutionContext {
    Cli,
    /// Serving a request under a CGI-style gateway.
    Web,
}

impl ExecutionContext {
    pub fn detect() -> Self {
        if WEB_CONTEXT_ENVS
            .iter()
            .any(|key| env::var_os(key).is_some())
        {
            ExecutionContext::Web
        } else {
            ExecutionContext::Cli
        }
    }
}

/// Decides whether debug reporting is live for this process.
///
/// Reporting is active from the command line, or anywhere when
/// `DEV_DEBUG_ENABLED` is set. An inactive bootstrap hands out clients that
/// discard everything.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Bootstrap {
    context: ExecutionContext,
    enabled: bool,
}

impl Bootstrap {
    pub fn new(context: ExecutionContext, enabled: bool) -> Self {
        Self { context, enabled }
    }

    pub fn from_env() -> Self {
        let enabled = flag_enabled(env::var(DEV_DEBUG_ENABLED_ENV).ok().as_deref());
        Self::new(ExecutionContext::detect(), enabled)
    }

    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    pub fn is_active(&self) -> bool {
        self.context == ExecutionContext::Cli || self.enabled
    }

    pub fn client(&self) -> DebugClient {
        self.client_with(DebugClient::builder())
    }

    /// Builds `builder` when active; otherwise returns a disabled client.
    pub fn client_with(&self, builder: DebugClientBuilder) -> DebugClient {
        if self.is_active() {
            builder.build()
        } else {
            debug!(
                "debug reporting inactive ({:?} context, {DEV_DEBUG_ENABLED_ENV} unset)",
                self.context
            );
            DebugClient::disabled()
        }
    }
}
