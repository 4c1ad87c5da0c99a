//! Full daemon over TCP: gateway, connection tasks and the core actor.

mod common;

use std::time::Duration;

use common::{TestClient, TestServer, test_config};

async fn client(server: &TestServer, nick: &str) -> anyhow::Result<TestClient> {
    let mut c = TestClient::connect(&server.address(), nick).await?;
    c.register().await?;
    Ok(c)
}

#[tokio::test]
async fn register_and_exchange_messages() -> anyhow::Result<()> {
    let server = TestServer::spawn(test_config()).await?;
    let mut alice = TestClient::connect(&server.address(), "alice").await?;
    alice.send_raw("NICK alice").await?;
    alice.send_raw("USER alice 0 * :Alice").await?;
    let burst = alice.recv_until(|m| m.command == "005").await?;
    assert_eq!(burst[0].command, "001");
    let isupport = burst.last().map(|m| m.params.join(" ")).unwrap_or_default();
    assert!(isupport.contains("PREFIX=(ohv)@%+"));
    assert!(isupport.contains("NETWORK=TestNet"));

    let mut bob = client(&server, "bob").await?;
    alice.privmsg("bob", "hello there").await?;
    let msg = bob.recv().await?;
    assert_eq!(msg.command, "PRIVMSG");
    assert_eq!(msg.params, ["bob", "hello there"]);
    assert_eq!(msg.prefix.as_deref(), Some("alice!alice@127.0.0.1"));

    bob.send_raw("PING :token").await?;
    let pong = bob.recv().await?;
    assert_eq!(pong.command, "PONG");
    assert_eq!(pong.params[1], "token");
    Ok(())
}

#[tokio::test]
async fn channel_mode_changes_are_broadcast() -> anyhow::Result<()> {
    let server = TestServer::spawn(test_config()).await?;
    let mut alice = client(&server, "alice").await?;
    let mut bob = client(&server, "bob").await?;

    alice.join("#rust").await?;
    bob.join("#rust").await?;
    // Bob's JOIN echo on alice's side.
    let join = alice.recv().await?;
    assert_eq!(join.command, "JOIN");

    alice.send_raw("MODE #rust +mv bob").await?;
    for c in [&mut alice, &mut bob] {
        let mode = c.recv().await?;
        assert_eq!(mode.command, "MODE");
        assert_eq!(mode.params, ["#rust", "+mv", "bob"]);
    }

    // Not an op: refused with 482, nothing broadcast.
    bob.send_raw("MODE #rust -m").await?;
    let refusal = bob.recv().await?;
    assert_eq!(refusal.command, "482");
    assert!(alice.recv_timeout(Duration::from_millis(200)).await.is_err());
    Ok(())
}

#[tokio::test]
async fn configured_modules_load_at_startup() -> anyhow::Result<()> {
    let mut config = test_config();
    config.modules.load = vec!["no_ctcp".to_string()];
    let server = TestServer::spawn(config).await?;

    let mut alice = client(&server, "alice").await?;
    let mut bob = client(&server, "bob").await?;
    alice.join("#rust").await?;
    bob.join("#rust").await?;
    alice.recv().await?;

    alice.send_raw("MODE #rust +C").await?;
    alice.recv().await?;
    bob.recv().await?;

    bob.privmsg("#rust", "\x01VERSION\x01").await?;
    let refusal = bob.recv().await?;
    assert_eq!(refusal.command, "404");
    assert!(alice.recv_timeout(Duration::from_millis(200)).await.is_err());
    Ok(())
}

#[tokio::test]
async fn quit_reaches_channel_peers() -> anyhow::Result<()> {
    let server = TestServer::spawn(test_config()).await?;
    let mut alice = client(&server, "alice").await?;
    let mut bob = client(&server, "bob").await?;
    alice.join("#rust").await?;
    bob.join("#rust").await?;
    alice.recv().await?;

    bob.quit("bye").await?;
    let error = bob.recv().await?;
    assert_eq!(error.command, "ERROR");
    assert!(bob.recv().await.is_err());

    let quit = alice.recv().await?;
    assert_eq!(quit.command, "QUIT");
    assert_eq!(quit.params, ["Quit: bye"]);
    Ok(())
}

#[tokio::test]
async fn commands_before_registration_are_refused() -> anyhow::Result<()> {
    let server = TestServer::spawn(test_config()).await?;
    let mut c = TestClient::connect(&server.address(), "early").await?;
    c.send_raw("JOIN #rust").await?;
    let reply = c.recv().await?;
    assert_eq!(reply.command, "451");

    c.send_raw("FROBNICATE").await?;
    // Unknown commands are unknown before and after registration.
    let reply = c.recv().await?;
    assert_eq!(reply.command, "421");
    Ok(())
}
