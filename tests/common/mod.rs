//! Shared mock infrastructure: a small but real SOCKS5 proxy that relays to
//! loopback upstreams, used by the end-to-end tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub struct MockSocksProxy {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
}

impl MockSocksProxy {
    pub fn url(&self) -> String {
        format!("socks5://{}", self.addr)
    }

    pub fn url_with_auth(&self, user: &str, pass: &str) -> String {
        format!("socks5://{user}:{pass}@{}", self.addr)
    }

    /// Number of tunnels opened so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Spawn a SOCKS5 proxy on a random loopback port. CONNECT requests are
/// relayed to `127.0.0.1:<requested port>` whatever the hostname says, so
/// tests can use made-up domains against local listeners.
pub async fn spawn_socks5_proxy(auth: Option<(&'static str, &'static str)>) -> MockSocksProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let count = connections.clone();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            count.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(handle(socket, auth));
        }
    });

    MockSocksProxy { addr, connections }
}

async fn handle(mut socket: TcpStream, auth: Option<(&'static str, &'static str)>) {
    let mut head = [0u8; 2];
    if socket.read_exact(&mut head).await.is_err() || head[0] != 0x05 {
        return;
    }
    let mut methods = vec![0u8; head[1] as usize];
    if socket.read_exact(&mut methods).await.is_err() {
        return;
    }

    if let Some((user, pass)) = auth {
        if !methods.contains(&0x02) {
            let _ = socket.write_all(&[0x05, 0xFF]).await;
            return;
        }
        let _ = socket.write_all(&[0x05, 0x02]).await;

        let mut ver_ulen = [0u8; 2];
        if socket.read_exact(&mut ver_ulen).await.is_err() {
            return;
        }
        let mut got_user = vec![0u8; ver_ulen[1] as usize];
        let _ = socket.read_exact(&mut got_user).await;
        let mut plen = [0u8; 1];
        let _ = socket.read_exact(&mut plen).await;
        let mut got_pass = vec![0u8; plen[0] as usize];
        let _ = socket.read_exact(&mut got_pass).await;

        let ok = got_user == user.as_bytes() && got_pass == pass.as_bytes();
        let _ = socket
            .write_all(&[0x01, if ok { 0x00 } else { 0x01 }])
            .await;
        if !ok {
            return;
        }
    } else {
        let _ = socket.write_all(&[0x05, 0x00]).await;
    }

    let mut request = [0u8; 4];
    if socket.read_exact(&mut request).await.is_err() {
        return;
    }
    let port = match request[3] {
        0x01 => {
            let mut rest = [0u8; 6];
            if socket.read_exact(&mut rest).await.is_err() {
                return;
            }
            u16::from_be_bytes([rest[4], rest[5]])
        }
        0x03 => {
            let mut len = [0u8; 1];
            if socket.read_exact(&mut len).await.is_err() {
                return;
            }
            let mut host = vec![0u8; len[0] as usize];
            if socket.read_exact(&mut host).await.is_err() {
                return;
            }
            let mut port = [0u8; 2];
            if socket.read_exact(&mut port).await.is_err() {
                return;
            }
            u16::from_be_bytes(port)
        }
        _ => {
            let _ = socket.write_all(&[0x05, 0x08, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await;
            return;
        }
    };

    let Ok(mut upstream) = TcpStream::connect(("127.0.0.1", port)).await else {
        let _ = socket.write_all(&[0x05, 0x05, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await;
        return;
    };
    let _ = socket
        .write_all(&[0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0])
        .await;
    let _ = tokio::io::copy_bidirectional(&mut socket, &mut upstream).await;
}
