//! Bundled modules, the extension store, and runtime load/unload.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::Harness;
use slirc_proto::{Message, irc_to_lower};
use slircd_core::error::{HandlerResult, ModuleError, RejectReason};
use slircd_core::handlers::{CommandSpec, Context, Handler};
use slircd_core::extensible::{ExtItem, ExtensibleKind};
use slircd_core::hooks::{EventKind, Priority};
use slircd_core::modules::{JoinEvent, Module, ModuleContext};
use slircd_core::state::{Actor, Matrix};

fn params(p: &[&str]) -> Vec<String> {
    p.iter().map(|s| s.to_string()).collect()
}

fn codes(h: &mut Harness, uid: &str) -> Vec<String> {
    h.drain(uid).into_iter().map(|m| m.command).collect()
}

#[test]
fn ban_exception_lets_matching_users_in() {
    let mut h = Harness::new();
    h.matrix.load_bundled("ban_exception").unwrap();
    let alice = h.channel_with("#c", &["alice"]).remove(0);
    let bob = h.connect("bob");

    h.send(&alice, "MODE #c +b *!*@test.example");
    h.send(&bob, "JOIN #c");
    assert_eq!(h.drain_command(&bob, "474").len(), 1);

    h.send(&alice, "MODE #c +e bob!*@*");
    h.send(&bob, "JOIN #c");
    assert!(h.matrix.is_member("#c", &bob));

    h.send(&alice, "MODE #c e");
    let listed = h.drain_command(&alice, "348");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].params[2], "bob!*@*");
}

#[test]
fn unloading_ban_exception_drops_its_lists() {
    let mut h = Harness::new();
    h.matrix.load_bundled("ban_exception").unwrap();
    let alice = Actor::User(h.channel_with("#c", &["alice"]).remove(0));
    h.matrix.process_mode(&alice, "#c", "+e", &params(&["friend"])).unwrap();
    assert_eq!(h.matrix.channel("#c").unwrap().list('e').len(), 1);

    h.matrix.unload_module("ban_exception").unwrap();
    assert!(h.matrix.channel("#c").unwrap().list('e').is_empty());
    // Unknown letters take no parameter.
    assert!(h.matrix.process_mode(&alice, "#c", "+e", &params(&["friend"])).is_err());
    let outcome = h.matrix.process_mode(&alice, "#c", "+e", &[]).unwrap();
    assert_eq!(outcome.rejection_for('e'), Some(&RejectReason::UnknownMode));
    assert!(outcome.applied.is_empty());
}

#[test]
fn account_extbans() {
    let mut h = Harness::new();
    h.matrix.load_bundled("account").unwrap();
    let alice = h.channel_with("#c", &["alice"]).remove(0);
    let bob = h.connect("bob");
    let carol = h.connect("carol");

    h.send(&alice, "SETACCOUNT bob BobAcct");
    assert_eq!(h.drain_command(&alice, "481").len(), 1);

    h.oper(&alice);
    h.send(&alice, "SETACCOUNT bob BobAcct");
    let notices = h.drain_command(&alice, "NOTICE");
    assert_eq!(notices[0].params[1], "bob is now identified as BobAcct");

    let actor = Actor::User(alice.clone());
    let outcome = h.matrix.process_mode(&actor, "#c", "+b", &params(&["$a:BOBACCT"])).unwrap();
    assert_eq!(outcome.applied.to_string(), "+b $a:bobacct");

    h.send(&bob, "JOIN #c");
    assert_eq!(codes(&mut h, &bob), ["474"]);
    h.send(&carol, "JOIN #c");
    assert!(h.matrix.is_member("#c", &carol));

    let outcome = h.matrix.process_mode(&actor, "#c", "+b", &params(&["$a:"])).unwrap();
    assert!(matches!(outcome.rejection_for('b'), Some(RejectReason::InvalidParam(_))));
    let outcome = h.matrix.process_mode(&actor, "#c", "+b", &params(&["$q:x"])).unwrap();
    assert!(matches!(outcome.rejection_for('b'), Some(RejectReason::InvalidParam(_))));
}

#[test]
fn unidentified_users_match_dollar_u() {
    let mut h = Harness::new();
    h.matrix.load_bundled("account").unwrap();
    let alice = h.channel_with("#c", &["alice"]).remove(0);
    let bob = h.connect("bob");
    let carol = h.connect("carol");
    h.oper(&alice);
    h.send(&alice, "SETACCOUNT bob bob");
    h.send(&alice, "MODE #c +b $U");

    h.send(&carol, "JOIN #c");
    assert!(!h.matrix.is_member("#c", &carol));
    h.send(&bob, "JOIN #c");
    assert!(h.matrix.is_member("#c", &bob));

    // Clearing the account puts bob back under $U for speaking too.
    h.send(&alice, "SETACCOUNT bob");
    h.drain_all();
    h.send(&bob, "PRIVMSG #c :hello");
    assert_eq!(codes(&mut h, &bob), ["404"]);
}

#[test]
fn unloading_account_purges_values_and_commands() {
    let mut h = Harness::new();
    h.matrix.load_bundled("account").unwrap();
    let alice = h.channel_with("#c", &["alice"]).remove(0);
    let bob = h.connect("bob");
    h.oper(&alice);
    h.send(&alice, "SETACCOUNT bob bob");
    h.send(&alice, "MODE #c +b $a:bob");
    assert_eq!(h.matrix.users[bob.as_str()].ext.len(), 1);

    h.matrix.unload_module("account").unwrap();
    assert!(h.matrix.users[bob.as_str()].ext.is_empty());
    assert!(h.matrix.extensions.find(ExtensibleKind::User, "account").is_none());
    assert!(!h.matrix.commands.contains("SETACCOUNT"));

    // The stored entry stays but no longer matches anyone.
    assert_eq!(h.matrix.channel("#c").unwrap().list('b').len(), 1);
    h.send(&bob, "JOIN #c");
    assert!(h.matrix.is_member("#c", &bob));

    h.drain_all();
    h.send(&alice, "SETACCOUNT bob bob");
    assert_eq!(codes(&mut h, &alice), ["421"]);
}

#[test]
fn entries_outliving_their_extban_can_still_be_removed() {
    let mut h = Harness::new();
    h.matrix.load_bundled("account").unwrap();
    let alice = h.channel_with("#c", &["alice"]).remove(0);
    let actor = Actor::User(alice.clone());
    h.matrix
        .process_mode(&actor, "#c", "+bb", &params(&["$a:bob", "$a:carol"]))
        .unwrap();
    h.matrix.unload_module("account").unwrap();

    let outcome = h
        .matrix
        .process_mode(&actor, "#c", "-b", &params(&["$A:BOB"]))
        .unwrap();
    assert!(outcome.rejected.is_empty());
    assert_eq!(outcome.applied.len(), 1);
    let left: Vec<_> = h.matrix.channel("#c").unwrap().list('b').iter().map(|e| e.mask.clone()).collect();
    assert_eq!(left, ["$a:carol"]);

    // Adding still needs a registered extban.
    let add = h.matrix.process_mode(&actor, "#c", "+b", &params(&["$a:dave"])).unwrap();
    assert!(matches!(add.rejection_for('b'), Some(RejectReason::InvalidParam(_))));
    let remove = h.matrix.process_mode(&actor, "#c", "-b", &params(&["$a:dave"])).unwrap();
    assert_eq!(remove.rejection_for('b'), Some(&RejectReason::NotFound));
}

#[test]
fn no_ctcp_blocks_everything_but_action() {
    let mut h = Harness::new();
    h.matrix.load_bundled("no_ctcp").unwrap();
    let uids = h.channel_with("#c", &["alice", "bob"]);
    let (alice, bob) = (&uids[0], &uids[1]);

    h.send(alice, "MODE #c +C");
    h.drain_all();

    h.send(bob, "PRIVMSG #c :\x01VERSION\x01");
    let replies = h.drain(bob);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].command, "404");
    assert_eq!(replies[0].params[2], "Cannot send CTCP to channel (+C)");

    h.send(bob, "NOTICE #c :\x01PING 1\x01");
    assert!(h.drain(bob).is_empty());
    assert!(h.drain(alice).is_empty());

    h.send(bob, "PRIVMSG #c :\x01ACTION waves\x01");
    assert_eq!(h.drain_command(alice, "PRIVMSG").len(), 1);

    h.matrix.unload_module("no_ctcp").unwrap();
    assert!(!h.matrix.channel("#c").unwrap().has_mode('C'));
    h.send(bob, "PRIVMSG #c :\x01VERSION\x01");
    assert_eq!(h.drain_command(alice, "PRIVMSG").len(), 1);
}

#[test]
fn oper_override_bypasses_channel_checks() {
    let mut h = Harness::new();
    h.matrix.load_bundled("oper_override").unwrap();
    let uids = h.channel_with("#c", &["alice", "bob"]);
    let (alice, bob) = (&uids[0], &uids[1]);
    let carol = h.connect("carol");
    h.send(alice, "MODE #c +i");

    let outcome = h
        .matrix
        .process_mode(&Actor::User(bob.clone()), "#c", "+m", &[])
        .unwrap();
    assert!(outcome.applied.is_empty());

    h.oper(bob);
    let outcome = h
        .matrix
        .process_mode(&Actor::User(bob.clone()), "#c", "+m-o", &params(&["alice"]))
        .unwrap();
    assert_eq!(outcome.applied.to_string(), "+m-o alice");

    h.send(&carol, "JOIN #c");
    assert!(!h.matrix.is_member("#c", &carol));
    h.oper(&carol);
    h.send(&carol, "JOIN #c");
    assert!(h.matrix.is_member("#c", &carol));
}

#[test]
fn module_admin_commands() {
    let mut h = Harness::new();
    let alice = h.connect("alice");
    let bob = h.connect("bob");

    h.send(&bob, "LOADMODULE no_ctcp");
    assert_eq!(codes(&mut h, &bob), ["481"]);

    h.oper(&alice);
    h.send(&alice, "LOADMODULE no_ctcp");
    assert_eq!(codes(&mut h, &alice), ["975"]);
    h.send(&alice, "LOADMODULE no_ctcp");
    h.send(&alice, "LOADMODULE telepathy");
    assert_eq!(codes(&mut h, &alice), ["974", "974"]);

    h.send(&alice, "MODULES");
    let listing = h.drain(&alice);
    let names: Vec<&str> = listing
        .iter()
        .filter(|m| m.command == "702")
        .map(|m| m.params[1].as_str())
        .collect();
    assert_eq!(names, ["no_ctcp", "*"]);
    assert!(listing[1].params[2].contains("ban_exception"));
    assert_eq!(listing.last().unwrap().command, "703");

    // Non-opers only see what is loaded.
    h.send(&bob, "MODULES");
    assert_eq!(codes(&mut h, &bob), ["702", "703"]);

    h.send(&alice, "UNLOADMODULE no_ctcp");
    h.send(&alice, "UNLOADMODULE no_ctcp");
    assert_eq!(codes(&mut h, &alice), ["973", "972"]);
    assert!(h.matrix.modules.is_empty());
}

#[test]
fn conflicting_registrations_roll_back() {
    let mut h = Harness::new();
    h.matrix.load_bundled("no_ctcp").unwrap();

    struct Squatter;
    impl Module for Squatter {
        fn name(&self) -> &str {
            "squatter"
        }
        fn init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
            ctx.subscribe(EventKind::UserJoin, Priority::Default);
            ctx.register_ext::<u32>(ExtensibleKind::Channel, "squat")?;
            ctx.add_mode(slircd_core::modes::ModeDescriptor::simple(
                'C',
                slircd_core::modes::ModeTarget::Channel,
            ))
        }
    }

    let err = h.matrix.load_module(Box::new(Squatter)).unwrap_err();
    assert!(matches!(err, ModuleError::DuplicateMode { letter: 'C', .. }));
    assert!(!h.matrix.modules.contains("squatter"));
    assert!(!h.matrix.hooks.is_subscribed("squatter", EventKind::UserJoin));
    assert!(h.matrix.extensions.find(ExtensibleKind::Channel, "squat").is_none());
    // The original owner keeps its mode.
    assert_eq!(h.matrix.modes.isupport_chanmodes(), "b,k,l,Cimnpst");
}

/// Counts join order on each membership; counts released values.
struct JoinCounter {
    item: Option<ExtItem<usize>>,
    released: Arc<AtomicUsize>,
}

impl Module for JoinCounter {
    fn name(&self) -> &str {
        "join_counter"
    }

    fn init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        let released = Arc::clone(&self.released);
        self.item = Some(ctx.register_ext_with_release(
            ExtensibleKind::Membership,
            "join_seq",
            move |_: usize| {
                released.fetch_add(1, Ordering::SeqCst);
            },
        )?);
        ctx.subscribe(EventKind::UserJoin, Priority::Default);
        Ok(())
    }

    fn on_user_join(&self, matrix: &mut Matrix, event: &JoinEvent) {
        let Some(item) = &self.item else {
            return;
        };
        let extensions = &matrix.extensions;
        let Some(chan) = matrix.channels.get_mut(&irc_to_lower(&event.channel)) else {
            return;
        };
        let seq = chan.members.len();
        if let Some(member) = chan.members.get_mut(&event.uid) {
            let _ = item.set(extensions, &mut member.ext, seq);
        }
    }
}

#[test]
fn membership_values_are_released_with_their_owner() {
    let mut h = Harness::new();
    let released = Arc::new(AtomicUsize::new(0));
    h.matrix
        .load_module(Box::new(JoinCounter {
            item: None,
            released: Arc::clone(&released),
        }))
        .unwrap();

    let uids = h.channel_with("#c", &["alice", "bob", "carol"]);
    let chan = h.matrix.channel("#c").unwrap();
    assert!(chan.members.values().all(|m| m.ext.len() == 1));

    // Leaving releases that membership's value.
    h.send(&uids[2], "PART #c");
    assert_eq!(released.load(Ordering::SeqCst), 1);

    // Unloading releases the rest.
    h.matrix.unload_module("join_counter").unwrap();
    assert_eq!(released.load(Ordering::SeqCst), 3);
    let chan = h.matrix.channel("#c").unwrap();
    assert!(chan.members.values().all(|m| m.ext.is_empty()));
}

struct Crasher;

struct BoomHandler;

impl Handler for BoomHandler {
    fn handle(&self, _ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        panic!("boom");
    }
}

impl Module for Crasher {
    fn name(&self) -> &str {
        "crasher"
    }

    fn init(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        ctx.add_command("BOOM", Arc::new(BoomHandler), CommandSpec::registered(0))
    }
}

#[test]
fn panicking_module_command_leaves_the_core_running() {
    let mut h = Harness::new();
    h.matrix.load_module(Box::new(Crasher)).unwrap();
    let alice = h.connect("alice");
    h.drain_all();

    h.send(&alice, "BOOM");
    assert!(h.drain(&alice).is_empty());
    assert!(h.matrix.users.contains_key(alice.as_str()));

    h.send(&alice, "PING :still-here");
    assert_eq!(codes(&mut h, &alice), ["PONG"]);
}
