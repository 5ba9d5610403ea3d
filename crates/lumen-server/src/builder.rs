//! Builder for [`Server`].

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use lumen_protocol::lifecycle::ServerInfo;

use crate::server::{ExitHook, Server};

/// How long `exit` waits for in-flight handlers before terminating anyway.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Configures and constructs a [`Server`].
///
/// ```rust,ignore
/// let server = Server::builder()
///     .name("my-language-server")
///     .version("0.3.0")
///     .build_stdio();
/// server.register("textDocument/hover", handler::request(hover))?;
/// server.run().await?;
/// ```
pub struct ServerBuilder {
    name: String,
    version: Option<String>,
    commands: Vec<String>,
    drain_timeout: Duration,
    exit_hook: ExitHook,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            name: "lumen-server".to_string(),
            version: None,
            commands: Vec::new(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            exit_hook: Box::new(|code| std::process::exit(code)),
        }
    }

    /// The server name reported in the initialize result.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The server version reported in the initialize result.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Command identifiers advertised by the execute-command capability when
    /// a `workspace/executeCommand` handler is registered.
    pub fn commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Override the bounded wait for in-flight handlers during `exit`.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Override what happens when the client sends `exit`.
    ///
    /// The default terminates the process with the computed status. Tests
    /// install a capture hook instead.
    pub fn on_exit(mut self, hook: impl Fn(i32) + Send + Sync + 'static) -> Self {
        self.exit_hook = Box::new(hook);
        self
    }

    /// Build a server over an arbitrary duplex byte channel.
    pub fn build(
        self,
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Server {
        Server::new(
            Box::new(reader),
            Box::new(writer),
            ServerInfo {
                name: self.name,
                version: self.version,
            },
            self.commands,
            self.drain_timeout,
            self.exit_hook,
        )
    }

    /// Build a server over the process's stdin and stdout, the standard
    /// editor transport.
    pub fn build_stdio(self) -> Server {
        self.build(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
