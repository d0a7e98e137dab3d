//! TCP listener that runs one [`HttpConnection`] task per accepted socket.

use crate::connection::{ConnectionConfig, HttpConnection};
use crate::dispatch::Dispatcher;
use crate::ensure;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::select;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub struct ServerBuilder {
    address: Option<io::Result<Vec<SocketAddr>>>,
    dispatcher: Option<Dispatcher>,
    connection_config: ConnectionConfig,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { address: None, dispatcher: None, connection_config: ConnectionConfig::default() }
    }

    /// Address to bind, resolution errors are reported by [`ServerBuilder::build`].
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    /// Defaults to [`Dispatcher::default`], the built-in handler for every method.
    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn connection_config(mut self, connection_config: ConnectionConfig) -> Self {
        self.connection_config = connection_config;
        self
    }

    pub fn read_timeout(mut self, read_timeout: Duration) -> Self {
        self.connection_config = self.connection_config.with_read_timeout(read_timeout);
        self
    }

    pub fn write_timeout(mut self, write_timeout: Duration) -> Self {
        self.connection_config = self.connection_config.with_write_timeout(write_timeout);
        self
    }

    pub fn max_body_size(mut self, max_body_size: u64) -> Self {
        self.connection_config = self.connection_config.with_max_body_size(max_body_size);
        self
    }

    pub fn build(self) -> Result<Server, ServerError> {
        let address = self.address.ok_or(ServerError::MissingAddress)?.map_err(|source| ServerError::Resolve { source })?;
        ensure!(!address.is_empty(), ServerError::MissingAddress);

        Ok(Server {
            address,
            dispatcher: Arc::new(self.dispatcher.unwrap_or_default()),
            connection_config: self.connection_config,
        })
    }
}

#[derive(Debug)]
pub struct Server {
    address: Vec<SocketAddr>,
    dispatcher: Arc<Dispatcher>,
    connection_config: ConnectionConfig,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("address must be set")]
    MissingAddress,
    #[error("can't resolve address: {source}")]
    Resolve { source: io::Error },
    #[error("can't bind {address:?}: {source}")]
    Bind { address: Vec<SocketAddr>, source: io::Error },
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn address(&self) -> &[SocketAddr] {
        &self.address
    }

    /// Binds the configured address and serves until `shutdown` completes.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let tcp_listener = TcpListener::bind(self.address.as_slice())
            .await
            .map_err(|source| ServerError::Bind { address: self.address.clone(), source })?;

        match tcp_listener.local_addr() {
            Ok(local_addr) => info!(address = %local_addr, "start listening"),
            Err(e) => warn!(cause = %e, "can't read local address"),
        }

        self.serve(tcp_listener, shutdown).await;
        Ok(())
    }

    /// Accepts connections on an already bound listener until `shutdown` completes.
    ///
    /// Once `shutdown` completes no new connection is accepted, every open connection is
    /// dropped and this returns after all connection tasks have finished.
    pub async fn serve<F>(self, tcp_listener: TcpListener, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let cancellation = CancellationToken::new();
        let mut connections = JoinSet::new();
        let mut shutdown = pin!(shutdown);

        loop {
            select! {
                biased;

                () = &mut shutdown => {
                    info!(active_connections = connections.len(), "receive shutdown signal, stop accepting");
                    break;
                }

                Some(joined) = connections.join_next() => {
                    if let Err(e) = joined {
                        error!(cause = %e, "connection task failed");
                    }
                }

                accepted = tcp_listener.accept() => {
                    let (tcp_stream, remote_addr) = match accepted {
                        Ok(stream_and_addr) => stream_and_addr,
                        Err(e) => {
                            warn!(cause = %e, "failed to accept");
                            continue;
                        }
                    };

                    let connection = serve_connection(
                        tcp_stream,
                        remote_addr,
                        Arc::clone(&self.dispatcher),
                        self.connection_config,
                        cancellation.child_token(),
                    );
                    connections.spawn(connection);
                }
            }
        }

        cancellation.cancel();
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                error!(cause = %e, "connection task failed");
            }
        }
        info!("server stopped");
    }
}

async fn serve_connection(
    tcp_stream: TcpStream,
    remote_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    connection_config: ConnectionConfig,
    cancelled: CancellationToken,
) {
    debug!(remote_addr = %remote_addr, "accept connection");
    if let Err(e) = tcp_stream.set_nodelay(true) {
        debug!(remote_addr = %remote_addr, cause = %e, "can't set TCP_NODELAY");
    }

    let (reader, writer) = tcp_stream.into_split();
    let connection = HttpConnection::with_config(reader, writer, connection_config);

    select! {
        result = connection.process(dispatcher) => match result {
            Ok(()) => debug!(remote_addr = %remote_addr, "finished process, connection shutdown"),
            Err(e) => info!(remote_addr = %remote_addr, cause = %e, "connection closed with error"),
        },
        () = cancelled.cancelled() => {
            debug!(remote_addr = %remote_addr, "server is shutting down, drop connection");
        }
    }
}
