//! Hook ordering and verdict consensus, driven through real commands.

mod common;

use std::sync::Arc;

use common::Harness;
use parking_lot::Mutex;
use slircd_core::error::ModuleError;
use slircd_core::hooks::{EventKind, ModResult, Priority};
use slircd_core::modules::{
    CommandEvent, JoinEvent, MessageEvent, Module, ModuleContext, ModuleEvent,
};
use slircd_core::state::Matrix;

type Log = Arc<Mutex<Vec<String>>>;

/// Subscribes to one event, records every call, and answers `verdict`.
struct Recorder {
    name: String,
    kind: EventKind,
    priority: Priority,
    verdict: ModResult,
    panics: bool,
    log: Log,
}

impl Recorder {
    fn new(name: &str, kind: EventKind, log: &Log) -> Self {
        Self {
            name: name.to_string(),
            kind,
            priority: Priority::Default,
            verdict: ModResult::PassThru,
            panics: false,
            log: Arc::clone(log),
        }
    }

    fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    fn verdict(mut self, verdict: ModResult) -> Self {
        self.verdict = verdict;
        self
    }

    fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    fn hit(&self) -> ModResult {
        self.log.lock().push(self.name.clone());
        if self.panics {
            panic!("recorder {} exploded", self.name);
        }
        self.verdict
    }
}

impl Module for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        ctx.subscribe(self.kind, self.priority.clone());
        Ok(())
    }

    fn on_pre_command(&self, _matrix: &mut Matrix, event: &CommandEvent) -> ModResult {
        if event.command == "PRIVMSG" { self.hit() } else { ModResult::PassThru }
    }

    fn on_user_pre_join(&self, _matrix: &mut Matrix, _event: &JoinEvent) -> ModResult {
        self.hit()
    }

    fn on_user_message(&self, _matrix: &mut Matrix, _event: &MessageEvent) {
        self.hit();
    }

    fn on_load_module(&self, _matrix: &mut Matrix, event: &ModuleEvent) {
        self.log.lock().push(format!("loaded:{}", event.name));
    }

    fn on_unload_module(&self, _matrix: &mut Matrix, event: &ModuleEvent) {
        self.log.lock().push(format!("unloaded:{}", event.name));
    }
}

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn load(h: &mut Harness, recorder: Recorder) {
    h.matrix.load_module(Box::new(recorder)).unwrap();
}

#[test]
fn first_decisive_verdict_wins() {
    let mut h = Harness::new();
    let calls = log();
    load(&mut h, Recorder::new("a", EventKind::UserPreJoin, &calls));
    load(&mut h, Recorder::new("b", EventKind::UserPreJoin, &calls).verdict(ModResult::Deny));
    load(&mut h, Recorder::new("c", EventKind::UserPreJoin, &calls).verdict(ModResult::Allow));

    let alice = h.connect("alice");
    h.send(&alice, "JOIN #rust");

    assert_eq!(*calls.lock(), ["a", "b"]);
    assert!(h.matrix.channel("#rust").is_none());
    assert!(h.drain_command(&alice, "JOIN").is_empty());
}

#[test]
fn allow_overrides_builtin_join_checks() {
    let mut h = Harness::new();
    let uids = h.channel_with("#rust", &["alice", "bob"]);
    let (alice, bob) = (&uids[0], &uids[1]);
    h.send(bob, "PART #rust");
    h.send(alice, "MODE #rust +i");
    h.send(bob, "JOIN #rust");
    assert_eq!(h.drain_command(bob, "473").len(), 1);
    assert!(!h.matrix.is_member("#rust", bob));

    let calls = log();
    load(&mut h, Recorder::new("vip", EventKind::UserPreJoin, &calls).verdict(ModResult::Allow));
    h.send(bob, "JOIN #rust");
    assert!(h.matrix.is_member("#rust", bob));
    assert_eq!(*calls.lock(), ["vip"]);
}

#[test]
fn notifications_follow_resolved_priority_order() {
    let mut h = Harness::new();
    let calls = log();
    load(&mut h, Recorder::new("a", EventKind::UserMessage, &calls));
    load(&mut h, Recorder::new("b", EventKind::UserMessage, &calls).priority(Priority::before("a")));
    load(&mut h, Recorder::new("c", EventKind::UserMessage, &calls).priority(Priority::First));
    load(&mut h, Recorder::new("d", EventKind::UserMessage, &calls).priority(Priority::Last));
    load(&mut h, Recorder::new("e", EventKind::UserMessage, &calls).priority(Priority::after("a")));
    // Notifications ignore verdicts: everyone runs.
    load(&mut h, Recorder::new("f", EventKind::UserMessage, &calls).verdict(ModResult::Deny));

    let alice = h.connect("alice");
    let _bob = h.connect("bob");
    h.send(&alice, "PRIVMSG bob :hi");

    assert_eq!(*calls.lock(), ["c", "b", "a", "e", "f", "d"]);
}

#[test]
fn ordering_cycle_falls_back_to_registration_order() {
    let mut h = Harness::new();
    let calls = log();
    load(&mut h, Recorder::new("x", EventKind::UserMessage, &calls).priority(Priority::after("y")));
    load(&mut h, Recorder::new("y", EventKind::UserMessage, &calls).priority(Priority::after("x")));
    load(&mut h, Recorder::new("z", EventKind::UserMessage, &calls));

    let alice = h.connect("alice");
    let _bob = h.connect("bob");
    h.send(&alice, "PRIVMSG bob :one");
    h.send(&alice, "PRIVMSG bob :two");

    assert_eq!(*calls.lock(), ["x", "y", "z", "x", "y", "z"]);
}

#[test]
fn panicking_subscriber_is_skipped() {
    let mut h = Harness::new();
    let calls = log();
    load(&mut h, Recorder::new("boom", EventKind::UserPreJoin, &calls).panicking());
    load(&mut h, Recorder::new("after", EventKind::UserPreJoin, &calls));

    let alice = h.connect("alice");
    h.send(&alice, "JOIN #rust");

    assert_eq!(*calls.lock(), ["boom", "after"]);
    assert!(h.matrix.is_member("#rust", &alice));
}

#[test]
fn pre_command_deny_suppresses_the_handler() {
    let mut h = Harness::new();
    let calls = log();
    load(&mut h, Recorder::new("mute", EventKind::PreCommand, &calls).verdict(ModResult::Deny));

    let alice = h.connect("alice");
    let bob = h.connect("bob");
    h.send(&alice, "PRIVMSG bob :can you hear me");

    assert_eq!(*calls.lock(), ["mute"]);
    assert!(h.drain_command(&bob, "PRIVMSG").is_empty());
    // A vetoed command produces no error numeric either.
    assert!(h.drain(&alice).is_empty());
}

#[test]
fn unloading_removes_subscriptions() {
    let mut h = Harness::new();
    let calls = log();
    load(&mut h, Recorder::new("gate", EventKind::UserPreJoin, &calls).verdict(ModResult::Deny));

    let alice = h.connect("alice");
    h.send(&alice, "JOIN #rust");
    assert!(h.matrix.channel("#rust").is_none());

    h.matrix.unload_module("gate").unwrap();
    assert!(!h.matrix.hooks.is_subscribed("gate", EventKind::UserPreJoin));
    h.send(&alice, "JOIN #rust");
    assert!(h.matrix.is_member("#rust", &alice));
    assert_eq!(*calls.lock(), ["gate"]);
}

#[test]
fn load_and_unload_are_announced() {
    let mut h = Harness::new();
    let calls = log();
    load(&mut h, Recorder::new("watcher", EventKind::LoadModule, &calls));
    h.matrix.hooks.subscribe("watcher", EventKind::UnloadModule, Priority::Default);

    load(&mut h, Recorder::new("other", EventKind::UserMessage, &log()));
    h.matrix.unload_module("other").unwrap();

    // The watcher sees its own load too.
    assert_eq!(*calls.lock(), ["loaded:watcher", "loaded:other", "unloaded:other"]);
    assert!(matches!(
        h.matrix.unload_module("other"),
        Err(ModuleError::NotLoaded(_))
    ));
}

#[test]
fn duplicate_module_names_are_refused() {
    let mut h = Harness::new();
    let calls = log();
    load(&mut h, Recorder::new("dup", EventKind::UserMessage, &calls));
    let again = h
        .matrix
        .load_module(Box::new(Recorder::new("dup", EventKind::UserMessage, &calls)));
    assert!(matches!(again, Err(ModuleError::AlreadyLoaded(_))));
    assert_eq!(h.matrix.modules.len(), 1);
}
