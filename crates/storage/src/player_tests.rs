// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::Recorder;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;
use yare::parameterized;

fn page(channel: &str, start: usize, n: usize) -> Vec<Message> {
    (start..start + n)
        .map(|i| Message::new(format!("{i}.0"), format!("{channel} #{i}")))
        .collect()
}

fn player_from(rec: Recorder<Vec<u8>>) -> Player<Cursor<Vec<u8>>> {
    Player::new(Cursor::new(rec.close().unwrap())).unwrap()
}

fn thread_parent(ts: &str) -> Message {
    Message {
        thread_ts: Some(ts.to_string()),
        reply_count: Some(2),
        ..Message::new(ts, "root")
    }
}

#[test]
fn channel_pages_come_back_in_capture_order() {
    let mut rec = Recorder::new(Vec::new());
    rec.messages("C1", page("C1", 0, 5), false).unwrap();
    rec.messages("C1", page("C1", 5, 3), false).unwrap();
    rec.messages("C1", page("C1", 8, 2), true).unwrap();
    let player = player_from(rec);

    assert_eq!(player.messages("C1").unwrap().len(), 5);
    assert_eq!(player.messages("C1").unwrap().len(), 3);
    let last = player.messages("C1").unwrap();
    assert_eq!(last.len(), 2);
    assert_eq!(last[1].ts, "9.0");

    assert!(player.messages("C1").unwrap_err().is_exhausted());
}

#[test]
fn thread_lookup_distinguishes_exhausted_from_not_found() {
    let mut rec = Recorder::new(Vec::new());
    rec.thread_messages(
        "C1",
        thread_parent("1000.001"),
        vec![Message::new("1000.002", "r1"), Message::new("1000.003", "r2")],
        true,
    )
    .unwrap();
    let player = player_from(rec);

    let replies = player.thread("C1", "1000.001").unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].text.as_deref(), Some("r1"));

    let err = player.next(&GroupId::from("t:C1:1000.001")).unwrap_err();
    assert!(matches!(err, PlayerError::Exhausted(_)));

    let err = player.next(&GroupId::from("t:C1:9999.999")).unwrap_err();
    assert!(matches!(err, PlayerError::NotFound(_)));
}

#[test]
fn has_more_tracks_cursor_state() {
    let mut rec = Recorder::new(Vec::new());
    rec.users(vec![User::new("U1")]).unwrap();
    rec.users(vec![User::new("U2")]).unwrap();
    let player = player_from(rec);

    assert!(player.has_more_users());
    player.users().unwrap();
    assert!(player.has_more_users());
    player.users().unwrap();
    assert!(!player.has_more_users());

    // never written
    assert!(!player.has_more_channels());
    assert!(!player.has_more_messages("C1"));
}

#[test]
fn reset_rewinds_every_cursor() {
    let mut rec = Recorder::new(Vec::new());
    rec.messages("C1", page("C1", 0, 1), true).unwrap();
    rec.channels(vec![Channel::new("C1")]).unwrap();
    let player = player_from(rec);

    player.messages("C1").unwrap();
    player.channels().unwrap();
    assert!(!player.has_more_messages("C1"));
    assert!(!player.has_more_channels());

    player.reset().unwrap();

    assert!(player.has_more_messages("C1"));
    assert!(player.has_more_channels());
    assert_eq!(player.messages("C1").unwrap()[0].ts, "0.0");
}

#[test]
fn offset_reports_last_read_record() {
    let mut rec = Recorder::new(Vec::new());
    rec.users(vec![User::new("U1")]).unwrap();
    let second = rec.channel_info(Channel::new("C7")).unwrap();
    let player = player_from(rec);

    assert_eq!(player.channel_info("C7").unwrap().id, "C7");
    assert_eq!(player.offset(), second);
}

#[parameterized(
    single = { 1 },
    pair = { 2 },
    several = { 5 },
)]
fn read_reports_offset_and_has_more(pages: usize) {
    let mut rec = Recorder::new(Vec::new());
    rec.messages("C1", page("C1", 0, 1), true).unwrap();
    let offsets: Vec<u64> = (0..pages)
        .map(|i| rec.users(vec![User::new(format!("U{i}"))]).unwrap())
        .collect();
    let player = player_from(rec);

    for (i, &expected) in offsets.iter().enumerate() {
        let entry = player.read(&GroupId::users(), || true).unwrap();
        assert_eq!(entry.offset, expected);
        assert_eq!(entry.has_more, i + 1 < pages);
    }
    let err = player.read(&GroupId::users(), || true).unwrap_err();
    assert!(err.is_exhausted());
}

#[test]
fn refused_commit_leaves_the_cursor_in_place() {
    let mut rec = Recorder::new(Vec::new());
    rec.users(vec![User::new("U1")]).unwrap();
    rec.users(vec![User::new("U2")]).unwrap();
    let player = player_from(rec);

    let err = player.read(&GroupId::users(), || false).unwrap_err();
    assert!(matches!(err, PlayerError::Abandoned(ref g) if *g == GroupId::users()));
    assert_eq!(player.users().unwrap()[0].id, "U1");
    assert_eq!(player.users().unwrap()[0].id, "U2");
}

#[parameterized(
    channel = { "C9" },
    thread = { "t:C1:9.9" },
    files = { "f:C1:9.9" },
    channel_info = { "ic:C1" },
    channels = { "lch" },
)]
fn unwritten_groups_are_not_found(key: &str) {
    let mut rec = Recorder::new(Vec::new());
    rec.messages("C1", page("C1", 0, 1), true).unwrap();
    rec.users(vec![User::new("U1")]).unwrap();
    let player = player_from(rec);

    let id = GroupId::from(key);
    assert!(!player.has_more(&id));
    assert!(player.next(&id).unwrap_err().is_not_found());
}

/// Reader whose bytes turn to garbage once `garble` is set
struct Garbling {
    inner: Cursor<Vec<u8>>,
    garble: Arc<AtomicBool>,
}

impl Read for Garbling {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if self.garble.load(Ordering::SeqCst) {
            for b in buf[..n].iter_mut().filter(|b| **b != b'\n') {
                *b = b'#';
            }
        }
        Ok(n)
    }
}

impl Seek for Garbling {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[test]
fn corrupt_point_read_names_group_and_offset() {
    let mut rec = Recorder::new(Vec::new());
    rec.messages("C1", page("C1", 0, 2), true).unwrap();
    let users_at = rec.users(vec![User::new("U1")]).unwrap();
    let garble = Arc::new(AtomicBool::new(false));
    let player = Player::new(Garbling {
        inner: Cursor::new(rec.close().unwrap()),
        garble: Arc::clone(&garble),
    })
    .unwrap();

    garble.store(true, Ordering::SeqCst);
    let err = player.next(&GroupId::users()).unwrap_err();
    assert!(err.to_string().contains(&format!("offset {users_at}")));
    match err {
        PlayerError::Decode { group, offset, .. } => {
            assert_eq!(group, GroupId::users());
            assert_eq!(offset, users_at);
        }
        other => panic!("expected decode error, got {other:?}"),
    }

    garble.store(false, Ordering::SeqCst);
    assert_eq!(player.users().unwrap()[0].id, "U1");
}

#[test]
fn typed_accessors_project_their_payloads() {
    let mut rec = Recorder::new(Vec::new());
    rec.workspace_info(WorkspaceInfo {
        team: "acme".to_string(),
        ..WorkspaceInfo::default()
    })
    .unwrap();
    rec.channel_users("C1", vec!["U1".to_string(), "U2".to_string()])
        .unwrap();
    rec.bookmarks(
        "C1",
        vec![Bookmark {
            id: "B1".to_string(),
            ..Bookmark::default()
        }],
    )
    .unwrap();
    rec.starred_items(vec![StarredItem {
        kind: "message".to_string(),
        ..StarredItem::default()
    }])
    .unwrap();
    let mut parent = Message::new("5.0", "see attached");
    parent.files = vec![ApiFile::new("F1")];
    rec.files("C1", None, parent.clone(), parent.files.clone())
        .unwrap();
    let player = player_from(rec);

    assert_eq!(player.workspace_info().unwrap().team, "acme");
    assert_eq!(player.channel_users("C1").unwrap(), vec!["U1", "U2"]);
    assert_eq!(player.bookmarks("C1").unwrap()[0].id, "B1");
    assert_eq!(player.starred_items().unwrap()[0].kind, "message");
    assert_eq!(player.files("C1", "5.0").unwrap()[0].id, "F1");
}

#[test]
fn drains_concatenate_pages_and_reset_first() {
    let mut rec = Recorder::new(Vec::new());
    rec.channels(vec![Channel::new("C1"), Channel::new("C2")])
        .unwrap();
    rec.channels(vec![Channel::new("C3")]).unwrap();
    rec.messages("C1", page("C1", 0, 2), false).unwrap();
    rec.messages("C1", page("C1", 2, 2), true).unwrap();
    let player = player_from(rec);

    player.channels().unwrap();
    let ids: Vec<_> = player
        .all_channels()
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec!["C1", "C2", "C3"]);

    let ts: Vec<_> = player
        .all_messages("C1")
        .unwrap()
        .into_iter()
        .map(|m| m.ts)
        .collect();
    assert_eq!(ts, vec!["0.0", "1.0", "2.0", "3.0"]);

    assert!(player.all_users().unwrap_err().is_not_found());
}

#[test]
fn for_each_is_repeatable_and_rewinds() {
    let mut rec = Recorder::new(Vec::new());
    rec.messages("C1", page("C1", 0, 1), false).unwrap();
    rec.users(vec![User::new("U1")]).unwrap();
    rec.messages("C2", page("C2", 0, 1), true).unwrap();
    let player = player_from(rec);

    let visit = || {
        let mut seen = Vec::new();
        player
            .for_each(|chunk| {
                seen.push(chunk);
                Ok::<_, PlayerError>(())
            })
            .unwrap();
        seen
    };

    let first = visit();
    let second = visit();
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert_eq!(first[1].kind(), ChunkKind::Users);

    // stream is back at the start: a point read still works
    assert_eq!(
        player.messages("C2").unwrap()[0].text.as_deref(),
        Some("C2 #0")
    );
}

#[test]
fn for_each_stops_on_callback_error() {
    let mut rec = Recorder::new(Vec::new());
    rec.users(vec![User::new("U1")]).unwrap();
    rec.users(vec![User::new("U2")]).unwrap();
    let player = player_from(rec);

    let mut visited = 0;
    let err = player
        .for_each(|_| {
            visited += 1;
            Err(PlayerError::NotFound(GroupId::users()))
        })
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(visited, 1);
    assert_eq!(player.users().unwrap()[0].id, "U1");
}

#[test]
fn channel_ids_lists_plain_channels() {
    let mut rec = Recorder::new(Vec::new());
    rec.messages("C2", page("C2", 0, 1), true).unwrap();
    rec.channel_info(Channel::new("C3")).unwrap();
    rec.thread_messages("C4", thread_parent("1.0"), page("C4", 2, 1), true)
        .unwrap();
    rec.messages("C1", page("C1", 0, 1), true).unwrap();
    let player = player_from(rec);

    assert_eq!(player.channel_ids(), vec!["C1", "C2"]);
}

#[test]
fn concurrent_readers_split_a_group_without_overlap() {
    let mut rec = Recorder::new(Vec::new());
    for i in 0..200 {
        rec.messages("C1", page("C1", i, 1), i == 199).unwrap();
        rec.users(vec![User::new(format!("U{i}"))]).unwrap();
    }
    let player = Arc::new(player_from(rec));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let player = Arc::clone(&player);
            std::thread::spawn(move || {
                let mut seen = Vec::new();
                loop {
                    match player.messages("C1") {
                        Ok(page) => seen.push(page[0].ts.clone()),
                        Err(e) if e.is_exhausted() => return seen,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                    // interleave with another group
                    let _ = player.users();
                }
            })
        })
        .collect();

    let mut all: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_by_key(|ts| ts.trim_end_matches(".0").parse::<u32>().unwrap());
    let expected: Vec<String> = (0..200).map(|i| format!("{i}.0")).collect();
    assert_eq!(all, expected);
}

#[test]
fn open_labels_with_file_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("capture.jsonl");
    let mut rec = Recorder::create(&path).unwrap();
    rec.users(vec![User::new("U1")]).unwrap();
    drop(rec.close().unwrap());

    let player = Player::open(&path).unwrap();
    assert_eq!(player.label(), "capture.jsonl");
    assert_eq!(player.users().unwrap()[0].id, "U1");

    let unnamed = Player::new(Cursor::new(Vec::new())).unwrap();
    assert_eq!(unnamed.label(), "");
}

#[test]
fn open_refuses_a_log_still_being_recorded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("capture.jsonl");
    let mut rec = Recorder::create(&path).unwrap();
    rec.users(vec![User::new("U1")]).unwrap();

    let err = Player::open(&path).err().unwrap();
    assert!(matches!(err, PlayerError::Locked(_)));

    drop(rec.close().unwrap());
    assert!(Player::open(&path).is_ok());
}

#[test]
fn open_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Player::open(&dir.path().join("nope.jsonl")).err().unwrap();
    assert!(matches!(err, PlayerError::Io(_)));
}

fn arb_pages() -> impl Strategy<Value = Vec<(usize, usize)>> {
    proptest::collection::vec((0usize..3, 0usize..6), 0..24)
}

proptest! {
    #[test]
    fn drained_groups_match_what_was_written(pages in arb_pages()) {
        let channels = ["C0", "C1", "C2"];
        let mut rec = Recorder::new(Vec::new());
        let mut expected: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        let mut next_ts = 0;

        for (ch, n) in &pages {
            let msgs = page(channels[*ch], next_ts, *n);
            next_ts += n;
            expected
                .entry(channels[*ch])
                .or_default()
                .extend(msgs.iter().map(|m| m.ts.clone()));
            rec.messages(channels[*ch], msgs, false).unwrap();
        }
        let player = player_from(rec);

        prop_assert_eq!(player.channel_ids().len(), expected.len());
        for (ch, want) in &expected {
            let got: Vec<String> = player
                .all_messages(ch)
                .unwrap()
                .into_iter()
                .map(|m| m.ts)
                .collect();
            prop_assert_eq!(&got, want);
        }
    }
}
