use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use simple_http::dispatch::Dispatcher;
use simple_http::handler::{make_handler, BoxError};
use simple_http::server::Server;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    address: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl TestServer {
    async fn start(dispatcher: Dispatcher) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server = Server::builder().address(address).dispatcher(dispatcher).build().unwrap();

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(server.serve(listener, async move {
            let _ = signal.await;
        }));

        Self { address, shutdown, task }
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), self.task).await.unwrap().unwrap();
    }
}

/// Sends a raw request and reads until the server closes the connection.
async fn send(address: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(address).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn basic_methods() {
    let server = TestServer::start(Dispatcher::default()).await;

    let cases = [
        ("GET /api/v1/users HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n", "HTTP/1.1 200 OK\r\n"),
        ("POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 9\r\nConnection: close\r\n\r\ntest data", "HTTP/1.1 200 OK\r\n"),
        ("PUT /test HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n", "HTTP/1.1 201 Created\r\n"),
        ("DELETE /test HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n", "HTTP/1.1 204 No Content\r\n"),
        ("PATCH /test HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n", "HTTP/1.1 405 Method Not Allowed\r\n"),
        ("GET / HTTP/1.0\r\n\r\n", "HTTP/1.1 200 OK\r\n"),
        ("GET / HTTP/1.1\r\nConnection: close\r\n\r\n", "HTTP/1.1 400 Bad Request\r\n"),
        ("INVALID REQUEST LINE\r\n\r\n", "HTTP/1.1 400 Bad Request\r\n"),
    ];

    for (request, status_line) in cases {
        let response = send(server.address, request).await;
        assert!(response.starts_with(status_line), "{request:?} -> {response:?}");
        assert!(response.contains("\r\nContent-Length: "), "{response:?}");
    }

    server.stop().await;
}

#[tokio::test]
async fn head_has_no_body() {
    let server = TestServer::start(Dispatcher::default()).await;

    let response = send(server.address, "HEAD / HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n").await;
    let (head, body) = response.split_once("\r\n\r\n").unwrap();

    assert!(head.contains("\r\nContent-Length: 13"), "{head}");
    assert_eq!(body, "");

    server.stop().await;
}

#[tokio::test]
async fn large_body_in_pieces() {
    let server = TestServer::start(Dispatcher::default()).await;
    let body = "x".repeat(10_000);

    let mut stream = TcpStream::connect(server.address).await.unwrap();
    stream
        .write_all(format!("POST / HTTP/1.1\r\nHost: x\r\nContent-Length: {}\r\nConnection: close\r\n\r\n", body.len()).as_bytes())
        .await
        .unwrap();
    for piece in body.as_bytes().chunks(1000) {
        stream.write_all(piece).await.unwrap();
        stream.flush().await.unwrap();
    }

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.ends_with("received 10000 bytes\n"), "{response}");

    server.stop().await;
}

#[tokio::test]
async fn persistent_connection() {
    let server = TestServer::start(Dispatcher::default()).await;
    let mut stream = TcpStream::connect(server.address).await.unwrap();

    for path in ["/", "/test"] {
        stream.write_all(format!("GET {path} HTTP/1.1\r\nHost: x\r\n\r\n").as_bytes()).await.unwrap();

        let expected_body = format!("Hello from {path}\n");
        let expected = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{expected_body}",
            expected_body.len()
        );
        let mut response = vec![0; expected.len()];
        stream.read_exact(&mut response).await.unwrap();
        assert_eq!(String::from_utf8(response).unwrap(), expected);
    }

    drop(stream);
    server.stop().await;
}

#[tokio::test]
async fn concurrent_clients() {
    let server = TestServer::start(Dispatcher::default()).await;

    let clients = (0..5)
        .map(|i| {
            let address = server.address;
            tokio::spawn(async move { send(address, &format!("GET /client/{i} HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n")).await })
        })
        .collect::<Vec<_>>();

    for (i, client) in clients.into_iter().enumerate() {
        let response = client.await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"), "{response}");
        assert!(response.ends_with(&format!("Hello from /client/{i}\n")), "{response}");
    }

    server.stop().await;
}

#[tokio::test]
async fn custom_handler() {
    let dispatcher = Dispatcher::builder()
        .post(make_handler(|request: Request<Bytes>| async move {
            Ok::<_, BoxError>(Response::builder().header("x-echo", "yes").body(Full::new(request.into_body())).unwrap())
        }))
        .build();
    let server = TestServer::start(dispatcher).await;

    let response = send(server.address, "POST / HTTP/1.1\r\nHost: x\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello").await;

    assert_eq!(response, "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nX-Echo: yes\r\nConnection: close\r\n\r\nhello");

    server.stop().await;
}

#[tokio::test]
async fn shutdown_drops_idle_connections() {
    let server = TestServer::start(Dispatcher::default()).await;

    let mut idle = TcpStream::connect(server.address).await.unwrap();
    // make sure the connection was accepted before shutting down
    idle.write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n").await.unwrap();
    let mut first_line = [0; 17];
    idle.read_exact(&mut first_line).await.unwrap();
    assert_eq!(&first_line, b"HTTP/1.1 200 OK\r\n");

    server.stop().await;

    let mut rest = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), idle.read_to_end(&mut rest)).await.unwrap();
    assert!(read.is_ok());
}
