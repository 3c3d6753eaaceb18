// Copyright 2025 Cowboy AI, LLC.

//! # Command envelopes and handlers
//!
//! A command reaches a flow wrapped in a [`CommandEnvelope`] that carries the session it was sent
//! on (registrar, superuser flag, request source, extensions declared at login), the transaction
//! id pair and the dry-run flag. Handlers consume envelopes and return a typed response or a
//! [`FlowError`](crate::errors::FlowError).

use crate::entity::CommandId;
use crate::errors::FlowResult;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Debug};

/// Where a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum RequestSource {
    /// A registrar over EPP
    Epp,
    /// An internal registry tool
    Tool,
}

/// Client and server transaction ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Trid {
    /// Id chosen by the client, if sent
    pub client_trid: Option<String>,
    /// Id chosen by the server
    pub server_trid: String,
}

impl Trid {
    /// A trid pair
    pub fn new(client_trid: Option<&str>, server_trid: impl Into<String>) -> Self {
        Self {
            client_trid: client_trid.map(str::to_string),
            server_trid: server_trid.into(),
        }
    }
}

impl fmt::Display for Trid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.client_trid {
            Some(client) => write!(f, "{client}/{}", self.server_trid),
            None => f.write_str(&self.server_trid),
        }
    }
}

/// Session a command was sent on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SessionMetadata {
    /// Logged-in registrar
    pub registrar_id: String,
    /// Whether the caller may bypass policy checks
    pub is_superuser: bool,
    /// Request origin
    pub request_source: RequestSource,
    /// Service extension URIs declared at login
    pub declared_extension_uris: BTreeSet<String>,
}

impl SessionMetadata {
    /// An EPP session for a registrar with the given declared extensions
    pub fn epp<I, S>(registrar_id: impl Into<String>, declared: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registrar_id: registrar_id.into(),
            is_superuser: false,
            request_source: RequestSource::Epp,
            declared_extension_uris: declared.into_iter().map(Into::into).collect(),
        }
    }

    /// Same session flagged as superuser
    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }

    /// Same session originating from a tool
    pub fn from_tool(mut self) -> Self {
        self.request_source = RequestSource::Tool;
        self
    }

    /// Whether a service URI was declared at login
    pub fn has_declared(&self, uri: &str) -> bool {
        self.declared_extension_uris.contains(uri)
    }
}

/// A command that requests a state change
///
/// # Examples
///
/// ```rust
/// use registry_flows::cqrs::Command;
///
/// #[derive(Debug)]
/// struct DeleteHost {
///     host_name: String,
/// }
///
/// struct Host;
///
/// impl Command for DeleteHost {
///     type Aggregate = Host;
///
///     fn target_name(&self) -> &str {
///         &self.host_name
///     }
/// }
///
/// let cmd = DeleteHost { host_name: "ns1.example.net".into() };
/// assert_eq!(cmd.target_name(), "ns1.example.net");
/// ```
pub trait Command: Debug + Send + Sync {
    /// The aggregate type this command targets
    type Aggregate;

    /// Name of the resource the command targets
    fn target_name(&self) -> &str;
}

/// A command with the session and transaction metadata it was sent with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope<C> {
    /// Unique identifier for this command instance
    pub id: CommandId,
    /// The actual command
    pub command: C,
    /// Session the command was sent on
    pub session: SessionMetadata,
    /// Transaction ids
    pub trid: Trid,
    /// Run every check but write nothing
    pub dry_run: bool,
}

impl<C: Command> CommandEnvelope<C> {
    /// Wrap a command for execution
    pub fn new(command: C, session: SessionMetadata, trid: Trid) -> Self {
        Self {
            id: CommandId::new(),
            command,
            session,
            trid,
            dry_run: false,
        }
    }

    /// Same envelope marked as a dry run
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Registrar that issued the command
    pub fn issued_by(&self) -> &str {
        &self.session.registrar_id
    }
}

/// Processes one kind of command
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    /// Response payload on success
    type Response: Send;

    /// Handle a command envelope
    async fn handle(&self, envelope: CommandEnvelope<C>) -> FlowResult<Self::Response>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct TestCommand {
        name: String,
    }

    impl Command for TestCommand {
        type Aggregate = ();

        fn target_name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_command_envelope_new() {
        let session = SessionMetadata::epp("TheRegistrar", ["urn:ietf:params:xml:ns:fee-0.6"]);
        let envelope = CommandEnvelope::new(
            TestCommand {
                name: "example.tld".into(),
            },
            session,
            Trid::new(Some("ABC-12345"), "server-trid"),
        );
        assert_eq!(envelope.issued_by(), "TheRegistrar");
        assert!(!envelope.dry_run);
        assert!(envelope.session.has_declared("urn:ietf:params:xml:ns:fee-0.6"));
        assert!(!envelope.session.is_superuser);
        assert!(envelope.dry_run().dry_run);
    }

    #[test]
    fn test_session_builders() {
        let session = SessionMetadata::epp("TheRegistrar", Vec::<String>::new())
            .superuser()
            .from_tool();
        assert!(session.is_superuser);
        assert_eq!(session.request_source, RequestSource::Tool);
    }

    #[test]
    fn test_trid_display() {
        assert_eq!(
            Trid::new(Some("ABC-12345"), "server-trid").to_string(),
            "ABC-12345/server-trid"
        );
        assert_eq!(Trid::new(None, "server-trid").to_string(), "server-trid");
    }

    struct EchoHandler;

    #[async_trait]
    impl CommandHandler<TestCommand> for EchoHandler {
        type Response = String;

        async fn handle(&self, envelope: CommandEnvelope<TestCommand>) -> FlowResult<String> {
            Ok(envelope.command.name)
        }
    }

    #[tokio::test]
    async fn test_command_handler() {
        let envelope = CommandEnvelope::new(
            TestCommand {
                name: "example.tld".into(),
            },
            SessionMetadata::epp("TheRegistrar", Vec::<String>::new()),
            Trid::new(None, "server-trid"),
        );
        assert_eq!(EchoHandler.handle(envelope).await.unwrap(), "example.tld");
    }
}
