//! Integration tests for the login and game servers over real sockets.
//!
//! Each test starts a login server and two game servers on random ports,
//! wired through the in-process handoff queue and sharing one store. The
//! directory advertises the fixed ports 7400/7401; tests check those, then
//! connect to wherever the game server actually bound.

use std::sync::Arc;

use mir_protocol::{ClientMessage, NewCharacter, ServerMessage};
use mir_transport::{Connection, TcpConnection};
use mirserver::prelude::*;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

// =========================================================================
// Helpers
// =========================================================================

struct Cluster {
    login: String,
    games: Vec<String>,
}

fn server(id: u32, name: &str, port: u16) -> ServerInfo {
    ServerInfo {
        id: ServerId(id),
        name: name.into(),
        game_addr: "127.0.0.1".into(),
        game_port: port,
        login_addr: "127.0.0.1".into(),
        login_port: 7000,
    }
}

/// Starts the login server and both game servers; returns their addresses.
async fn start_cluster() -> Cluster {
    let store = Arc::new(
        MemoryStore::builder()
            .user(User::new("pangliang", "pwd"))
            .user(User::new("other", "secret"))
            .server(server(1, "test1", 7400))
            .server(server(2, "test2", 7401))
            .build(),
    );

    let mut login = LoginServerBuilder::new().bind("127.0.0.1:0");
    let mut games = Vec::new();
    for id in [1, 2] {
        let game = GameServerBuilder::new(ServerId(id))
            .bind("127.0.0.1:0")
            .build(Arc::clone(&store))
            .await
            .expect("game server should build");
        games.push(game.local_addr().expect("game addr").to_string());
        login = login.route(game.cert_sender());
        tokio::spawn(game.run());
    }

    let login = login.build(store).await.expect("login server should build");
    let login_addr = login.local_addr().expect("login addr").to_string();
    tokio::spawn(login.run());

    Cluster {
        login: login_addr,
        games,
    }
}

async fn connect(addr: &str) -> TcpConnection {
    TcpConnection::connect(addr).await.expect("should connect")
}

async fn request(conn: &mut TcpConnection, message: ClientMessage) -> Packet {
    conn.request(message.to_packet()).await.expect("response")
}

fn id_password(username: &str, password: &str) -> ClientMessage {
    ClientMessage::IdPassword {
        username: username.into(),
        password: password.into(),
    }
}

fn select(server_name: &str) -> ClientMessage {
    ClientMessage::SelectServer {
        server_name: server_name.into(),
    }
}

fn query(username: &str, token: &str) -> Packet {
    Packet::new(kind::CM_QUERYCHR, format!("{username}/{token}"))
}

/// Logs in, selects `server_name`, and returns the issued token.
async fn login_and_select(cluster: &Cluster, username: &str, password: &str, server_name: &str) -> String {
    let mut login = connect(&cluster.login).await;
    let list = request(&mut login, id_password(username, password)).await;
    assert_eq!(list.kind(), kind::SM_PASSOK_SELECTSERVER);

    let selected = request(&mut login, select(server_name)).await;
    match ServerMessage::from_packet(&selected).expect("decode") {
        ServerMessage::SelectServerOk { token, .. } => token,
        other => panic!("expected SelectServerOk, got {other:?}"),
    }
}

/// Asserts the server closed the connection without answering.
async fn assert_closed(conn: &mut TcpConnection) {
    let next = conn.recv().await;
    assert!(
        !matches!(next, Ok(Some(_))),
        "expected the connection to be closed, got {next:?}"
    );
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_login_select_query_create_roundtrip() {
    let cluster = start_cluster().await;
    let mut login = connect(&cluster.login).await;

    let list = request(&mut login, id_password("pangliang", "pwd")).await;
    assert_eq!(list.kind(), kind::SM_PASSOK_SELECTSERVER);
    assert_eq!(list.code(), 0);
    assert_eq!(list.header.r3, 2);
    assert_eq!(list.payload, "test1/1/test2/2/");

    let selected = request(&mut login, select("test1")).await;
    assert_eq!(selected.kind(), kind::SM_SELECTSERVER_OK);
    let params = selected.params();
    assert_eq!(params.len(), 3);
    assert_eq!(params[..2], ["127.0.0.1", "7400"]);
    let token = params[2].to_string();

    let mut game = connect(&cluster.games[0]).await;

    let empty = game.request(query("pangliang", &token)).await.unwrap();
    assert_eq!(empty.kind(), kind::SM_QUERYCHR);
    assert_eq!(empty.code(), 0);
    assert_eq!(empty.payload, "");

    let created = game
        .request(Packet::new(kind::CM_NEWCHR, "pangliang/player1/3/2/1/"))
        .await
        .unwrap();
    assert_eq!(created.kind(), kind::SM_NEWCHR_SUCCESS);
    assert_eq!(created.code(), 0);

    let roster = game.request(query("pangliang", &token)).await.unwrap();
    assert_eq!(roster.kind(), kind::SM_QUERYCHR);
    assert_eq!(roster.code(), 1);
    assert_eq!(roster.payload, "player1/2/3/1/1/");

    // Same name, different attributes: still a collision.
    let duplicate = request(
        &mut game,
        ClientMessage::NewCharacter(NewCharacter {
            username: "pangliang".into(),
            name: "player1".into(),
            hair: 0,
            job: 0,
            sex: 0,
        }),
    )
    .await;
    assert_eq!(duplicate.kind(), kind::SM_NEWCHR_FAIL);
    assert_eq!(duplicate.code(), 2);
}

#[tokio::test]
async fn test_login_unknown_user_and_wrong_password_look_the_same() {
    let cluster = start_cluster().await;
    let mut login = connect(&cluster.login).await;

    let unknown = request(&mut login, id_password("nobody", "pwd")).await;
    let wrong = request(&mut login, id_password("pangliang", "nope")).await;

    assert_eq!(unknown, wrong);
    assert_eq!(unknown.kind(), kind::SM_PASSWD_FAIL);
    assert_eq!(unknown.code(), 1);

    // The connection survives and a correct retry works.
    let ok = request(&mut login, id_password("pangliang", "pwd")).await;
    assert_eq!(ok.kind(), kind::SM_PASSOK_SELECTSERVER);
}

#[tokio::test]
async fn test_login_select_unknown_server_fails() {
    let cluster = start_cluster().await;
    let mut login = connect(&cluster.login).await;
    request(&mut login, id_password("pangliang", "pwd")).await;

    let response = request(&mut login, select("test9")).await;

    assert_eq!(response.kind(), kind::SM_SELECTSERVER_FAIL);
    assert_eq!(response.code(), 1);
}

#[tokio::test]
async fn test_game_query_failure_codes() {
    let cluster = start_cluster().await;
    login_and_select(&cluster, "pangliang", "pwd", "test1").await;
    let mut game = connect(&cluster.games[0]).await;

    let malformed = game
        .request(Packet::new(kind::CM_QUERYCHR, "pangliang"))
        .await
        .unwrap();
    let unknown = game.request(query("pangliang1", "1000")).await.unwrap();
    let mismatch = game.request(query("pangliang", "1000")).await.unwrap();

    assert_eq!(malformed.kind(), kind::SM_QUERYCHR_FAIL);
    assert_eq!(malformed.code(), 1);
    assert_eq!(unknown.code(), 2);
    assert_eq!(mismatch.code(), 3);
}

#[tokio::test]
async fn test_game_token_only_valid_on_selected_server() {
    let cluster = start_cluster().await;
    let token = login_and_select(&cluster, "pangliang", "pwd", "test1").await;

    let mut other_game = connect(&cluster.games[1]).await;
    let response = other_game.request(query("pangliang", &token)).await.unwrap();
    assert_eq!(response.kind(), kind::SM_QUERYCHR_FAIL);
    assert_eq!(response.code(), 2);

    let mut right_game = connect(&cluster.games[0]).await;
    let wrong_user = right_game.request(query("other", &token)).await.unwrap();
    assert_eq!(wrong_user.code(), 2);
}

#[tokio::test]
async fn test_game_newer_selection_replaces_token() {
    let cluster = start_cluster().await;
    let old = login_and_select(&cluster, "pangliang", "pwd", "test1").await;
    let new = login_and_select(&cluster, "pangliang", "pwd", "test1").await;
    let mut game = connect(&cluster.games[0]).await;

    let stale = game.request(query("pangliang", &old)).await.unwrap();
    let fresh = game.request(query("pangliang", &new)).await.unwrap();

    assert_eq!(stale.code(), 3);
    assert_eq!(fresh.kind(), kind::SM_QUERYCHR);
}

#[tokio::test]
async fn test_game_newchr_after_newer_selection_fails() {
    let cluster = start_cluster().await;
    let token = login_and_select(&cluster, "pangliang", "pwd", "test1").await;
    let mut game = connect(&cluster.games[0]).await;
    game.request(query("pangliang", &token)).await.unwrap();

    // A second login on another client replaces this connection's credential.
    login_and_select(&cluster, "pangliang", "pwd", "test1").await;
    let response = game
        .request(Packet::new(kind::CM_NEWCHR, "pangliang/player1/3/2/1/"))
        .await
        .unwrap();

    assert_eq!(response.kind(), kind::SM_NEWCHR_FAIL);
    assert_eq!(response.code(), 4);
}

#[tokio::test]
async fn test_game_newchr_before_verification_fails() {
    let cluster = start_cluster().await;
    let mut game = connect(&cluster.games[0]).await;

    let response = game
        .request(Packet::new(kind::CM_NEWCHR, "pangliang/player1/3/2/1/"))
        .await
        .unwrap();

    assert_eq!(response.kind(), kind::SM_NEWCHR_FAIL);
    assert_eq!(response.code(), 4);
}

#[tokio::test]
async fn test_game_name_is_unique_across_owners_and_servers() {
    let cluster = start_cluster().await;
    let token = login_and_select(&cluster, "pangliang", "pwd", "test1").await;
    let mut game1 = connect(&cluster.games[0]).await;
    game1.request(query("pangliang", &token)).await.unwrap();
    let created = game1
        .request(Packet::new(kind::CM_NEWCHR, "pangliang/player1/3/2/1/"))
        .await
        .unwrap();
    assert_eq!(created.kind(), kind::SM_NEWCHR_SUCCESS);

    let other_token = login_and_select(&cluster, "other", "secret", "test2").await;
    let mut game2 = connect(&cluster.games[1]).await;
    let roster = game2.request(query("other", &other_token)).await.unwrap();
    assert_eq!(roster.code(), 0, "other owns no characters yet");

    let response = game2
        .request(Packet::new(kind::CM_NEWCHR, "other/player1/0/1/0/"))
        .await
        .unwrap();

    assert_eq!(response.kind(), kind::SM_NEWCHR_FAIL);
    assert_eq!(response.code(), 2);
}

#[tokio::test]
async fn test_login_unknown_kind_closes_connection() {
    let cluster = start_cluster().await;
    let mut login = connect(&cluster.login).await;

    login.send(Packet::new(4242, "")).await.unwrap();

    assert_closed(&mut login).await;
}

#[tokio::test]
async fn test_login_select_before_password_closes_connection() {
    let cluster = start_cluster().await;
    let mut login = connect(&cluster.login).await;

    login.send(select("test1").to_packet()).await.unwrap();

    assert_closed(&mut login).await;
}

#[tokio::test]
async fn test_game_login_kind_closes_connection() {
    let cluster = start_cluster().await;
    let mut game = connect(&cluster.games[0]).await;

    game.send(id_password("pangliang", "pwd").to_packet())
        .await
        .unwrap();

    assert_closed(&mut game).await;
}

#[tokio::test]
async fn test_game_malformed_frame_closes_connection() {
    let cluster = start_cluster().await;
    let mut raw = TcpStream::connect(&cluster.games[0]).await.unwrap();

    // A body length smaller than the header can never be a packet.
    raw.write_all(&4u32.to_le_bytes()).await.unwrap();
    raw.write_all(&[0, 0, 0, 0]).await.unwrap();

    let mut buf = [0u8; 16];
    let read = tokio::io::AsyncReadExt::read(&mut raw, &mut buf).await;
    assert!(matches!(read, Ok(0) | Err(_)), "expected close, got {read:?}");
}

#[tokio::test]
async fn test_connections_are_independent() {
    let cluster = start_cluster().await;
    let token = login_and_select(&cluster, "pangliang", "pwd", "test1").await;

    let mut verified = connect(&cluster.games[0]).await;
    verified.request(query("pangliang", &token)).await.unwrap();
    let mut fresh = connect(&cluster.games[0]).await;

    // Verification on one connection doesn't carry over to another.
    let response = fresh
        .request(Packet::new(kind::CM_NEWCHR, "pangliang/player1/3/2/1/"))
        .await
        .unwrap();

    assert_eq!(response.code(), 4);
}
