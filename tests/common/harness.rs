//! In-process harness around a `Matrix`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use slirc_proto::Message;
use slircd_core::config::{Config, OperBlock};
use slircd_core::state::{CoreEvent, Matrix, Uid};
use tokio::sync::mpsc;

pub const OPER_NAME: &str = "root";
pub const OPER_PASSWORD: &str = "hunter2";

/// Default config plus one oper block.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.name = "irc.test".to_string();
    config.server.network = "TestNet".to_string();
    config.oper.push(OperBlock {
        name: OPER_NAME.to_string(),
        password: OPER_PASSWORD.to_string(),
    });
    config
}

pub struct Harness {
    pub matrix: Matrix,
    inboxes: HashMap<Uid, mpsc::Receiver<Message>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let matrix = Matrix::new(Arc::new(config)).expect("core registration failed");
        Self {
            matrix,
            inboxes: HashMap::new(),
        }
    }

    /// Connect and register `nick`, discarding the welcome burst.
    pub fn connect(&mut self, nick: &str) -> Uid {
        let uid = self.connect_unregistered();
        self.send(&uid, &format!("NICK {nick}"));
        self.send(&uid, &format!("USER {nick} 0 * :Test User {nick}"));
        self.drain(&uid);
        uid
    }

    pub fn connect_unregistered(&mut self) -> Uid {
        let uid = self.matrix.uid_gen.next_uid();
        let (tx, rx) = mpsc::channel(1024);
        self.matrix.handle_event(CoreEvent::Connected {
            uid: uid.clone(),
            host: "test.example".to_string(),
            sender: tx,
        });
        self.inboxes.insert(uid.clone(), rx);
        uid
    }

    /// Feed one raw line from `uid` through the core.
    pub fn send(&mut self, uid: &str, line: &str) {
        self.matrix.handle_event(CoreEvent::Line {
            uid: uid.to_string(),
            line: line.to_string(),
        });
    }

    /// Everything queued for `uid` so far.
    pub fn drain(&mut self, uid: &str) -> Vec<Message> {
        let mut out = Vec::new();
        if let Some(rx) = self.inboxes.get_mut(uid) {
            while let Ok(msg) = rx.try_recv() {
                out.push(msg);
            }
        }
        out
    }

    pub fn drain_all(&mut self) {
        let uids: Vec<Uid> = self.inboxes.keys().cloned().collect();
        for uid in uids {
            self.drain(&uid);
        }
    }

    /// Drain and keep only messages with `command`.
    pub fn drain_command(&mut self, uid: &str, command: &str) -> Vec<Message> {
        self.drain(uid)
            .into_iter()
            .filter(|m| m.command == command)
            .collect()
    }

    pub fn oper(&mut self, uid: &str) {
        self.send(uid, &format!("OPER {OPER_NAME} {OPER_PASSWORD}"));
        self.drain(uid);
    }

    /// `alice` creates `channel` (and holds ops); the others join it.
    pub fn channel_with(&mut self, channel: &str, members: &[&str]) -> Vec<Uid> {
        let uids: Vec<Uid> = members.iter().map(|n| self.connect(n)).collect();
        for uid in &uids {
            self.send(uid, &format!("JOIN {channel}"));
        }
        self.drain_all();
        uids
    }
}

/// Render messages to wire form for readable assertions.
pub fn lines(messages: &[Message]) -> Vec<String> {
    messages.iter().map(|m| m.to_string()).collect()
}
