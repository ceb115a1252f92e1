use std::io::Write;

use retrace_memdb::{DumpOptions, Error, MemDb, dump_sourcemap};
use retrace_sourcemap::{DecodedMap, NO_REF, RawToken, SourceMap, decode_slice};

const SIMPLE: &[u8] = br#"{
    "version": 3,
    "sources": ["coolstuff.js"],
    "sourcesContent": ["var x = alert;"],
    "names": ["x", "alert"],
    "mappings": "AAAA,GAAIA,GAAI,EACR,IAAIA,GAAK,EAAG,CACVC,MAAM"
}"#;

fn simple_map() -> SourceMap {
    match decode_slice(SIMPLE).unwrap() {
        DecodedMap::Flat(sm) => sm,
        DecodedMap::Index(_) => unreachable!(),
    }
}

fn assert_equivalent(sm: &SourceMap, db: &MemDb) {
    assert_eq!(sm.get_token_count(), db.get_token_count());
    for idx in 0..sm.get_token_count() {
        let want = sm.get_token(idx).unwrap();
        let got = db.get_token(idx).unwrap();
        assert_eq!(want.get_dst(), got.get_dst(), "token {idx}");
        assert_eq!(want.get_src(), got.get_src(), "token {idx}");
        assert_eq!(want.get_source(), got.get_source(), "token {idx}");
        assert_eq!(want.get_name(), got.get_name(), "token {idx}");
    }
    assert_eq!(sm.get_source_count(), db.get_source_count());
    for (id, name) in sm.sources() {
        assert_eq!(db.get_source(id), Some(name));
        assert_eq!(sm.get_source_contents(id), db.get_source_contents(id));
    }
    assert_eq!(sm.get_name_count(), db.get_name_count());
}

#[test]
fn round_trip_through_buffer() {
    let sm = simple_map();
    let blob = dump_sourcemap(&sm, DumpOptions::default()).unwrap();
    let db = MemDb::from_vec(blob).unwrap();
    assert_equivalent(&sm, &db);
}

#[test]
fn round_trip_through_mmap() {
    let sm = simple_map();
    let blob = dump_sourcemap(&sm, DumpOptions::default()).unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&blob).unwrap();
    file.flush().unwrap();

    let db = MemDb::from_path(file.path()).unwrap();
    assert_equivalent(&sm, &db);
}

#[test]
fn lookup_matches_json_side_lookup() {
    let sm = simple_map();
    let db = MemDb::from_vec(dump_sourcemap(&sm, DumpOptions::default()).unwrap()).unwrap();

    for line in 0..3 {
        for col in 0..40 {
            match (sm.lookup_token(line, col), db.lookup_token(line, col)) {
                (Some(want), Some(got)) => {
                    assert_eq!(want.get_dst(), got.get_dst(), "at {line}:{col}");
                    assert_eq!(want.get_name(), got.get_name(), "at {line}:{col}");
                }
                (None, None) => {}
                (want, got) => panic!(
                    "lookup diverged at {line}:{col}: json={:?} memdb={:?}",
                    want.is_some(),
                    got.is_some()
                ),
            }
        }
    }
}

#[test]
fn lookup_does_not_fall_back_across_lines() {
    let sm = SourceMap::new(
        None,
        vec![RawToken {
            dst_line: 1,
            dst_col: 0,
            src_line: 0,
            src_col: 0,
            src_id: 0,
            name_id: NO_REF,
        }],
        vec!["a.js".into()],
        vec![],
        vec![],
    );
    let db = MemDb::from_vec(dump_sourcemap(&sm, DumpOptions::default()).unwrap()).unwrap();
    assert!(db.lookup_token(1, 10).is_some());
    assert!(db.lookup_token(2, 10).is_none());
    assert!(db.lookup_token(0, 10).is_none());
}

#[test]
fn dump_without_names_keeps_positions() {
    let sm = simple_map();
    let full = MemDb::from_vec(dump_sourcemap(&sm, DumpOptions::default()).unwrap()).unwrap();
    let stripped = MemDb::from_vec(
        dump_sourcemap(
            &sm,
            DumpOptions {
                with_names: false,
                ..Default::default()
            },
        )
        .unwrap(),
    )
    .unwrap();

    assert_eq!(stripped.get_name_count(), 0);
    assert_eq!(full.get_token_count(), stripped.get_token_count());
    for idx in 0..full.get_token_count() {
        let want = full.get_token(idx).unwrap();
        let got = stripped.get_token(idx).unwrap();
        // positional fields unchanged, name gone
        assert_eq!(want.get_dst(), got.get_dst());
        assert_eq!(want.get_src(), got.get_src());
        assert_eq!(want.get_src_id(), got.get_src_id());
        assert_eq!(got.get_name(), None);
    }
    // source contents are unaffected by the names flag
    assert_eq!(stripped.get_source_contents(0), Some("var x = alert;"));
}

#[test]
fn dump_without_source_contents_keeps_source_names() {
    let sm = simple_map();
    let db = MemDb::from_vec(
        dump_sourcemap(
            &sm,
            DumpOptions {
                with_source_contents: false,
                ..Default::default()
            },
        )
        .unwrap(),
    )
    .unwrap();

    assert_eq!(db.get_source_count(), 1);
    assert_eq!(db.get_source(0), Some("coolstuff.js"));
    assert_eq!(db.get_source_contents(0), None);
    assert!(!db.has_source_contents(0));
    // names are unaffected by the contents flag
    assert!(db.get_token(1).unwrap().get_name().is_some());
}

#[test]
fn unknown_source_ids_are_misses_not_errors() {
    let sm = simple_map();
    let db = MemDb::from_vec(dump_sourcemap(&sm, DumpOptions::default()).unwrap()).unwrap();
    assert_eq!(db.get_source(42), None);
    assert_eq!(db.get_source_contents(42), None);
    assert!(db.get_token(9999).is_none());
}

#[test]
fn rejects_bad_magic() {
    let mut blob = dump_sourcemap(&simple_map(), DumpOptions::default()).unwrap();
    blob[0] = b'X';
    assert!(matches!(MemDb::from_vec(blob), Err(Error::BadMagic)));
}

#[test]
fn rejects_future_version_before_anything_else() {
    let mut blob = dump_sourcemap(&simple_map(), DumpOptions::default()).unwrap();
    blob[4..8].copy_from_slice(&99u32.to_le_bytes());
    // also truncate: the version check must fire first regardless
    blob.truncate(40);
    assert!(matches!(
        MemDb::from_vec(blob),
        Err(Error::UnsupportedVersion(99))
    ));
}

#[test]
fn rejects_truncated_buffer() {
    let blob = dump_sourcemap(&simple_map(), DumpOptions::default()).unwrap();
    for len in [0, 10, 51, 60, blob.len() - 1] {
        let rv = MemDb::from_vec(blob[..len].to_vec());
        assert!(
            matches!(rv, Err(Error::Corrupt(_))),
            "length {len} must not validate"
        );
    }
}

#[test]
fn rejects_marker_pointing_outside_the_buffer() {
    let mut blob = dump_sourcemap(&simple_map(), DumpOptions::default()).unwrap();
    // the blob ends with the name marker table; aim the last marker far
    // outside the buffer
    let off = blob.len() - 8;
    blob[off..off + 4].copy_from_slice(&0x00ff_ffffu32.to_le_bytes());
    blob[off + 4..off + 8].copy_from_slice(&4096u32.to_le_bytes());
    assert!(matches!(MemDb::from_vec(blob), Err(Error::Corrupt(_))));
}

#[test]
fn dump_rejects_too_many_sources() {
    let sources: Vec<String> = (0..0xffff).map(|i| format!("src{i}.js")).collect();
    let sm = SourceMap::new(None, vec![], sources, vec![], vec![]);
    let rv = dump_sourcemap(&sm, DumpOptions::default());
    assert!(matches!(rv, Err(Error::TooManySources)));
}

#[test]
fn dump_rejects_too_many_names() {
    let names: Vec<String> = (0..0xffff).map(|i| format!("n{i}")).collect();
    let sm = SourceMap::new(None, vec![], vec![], vec![], names);
    assert!(matches!(
        dump_sourcemap(&sm, DumpOptions::default()),
        Err(Error::TooManyNames)
    ));
    // dropping names from the dump sidesteps the limit
    assert!(
        dump_sourcemap(
            &sm,
            DumpOptions {
                with_names: false,
                ..Default::default()
            }
        )
        .is_ok()
    );
}

#[test]
fn dump_rejects_unpackable_locations() {
    let sm = SourceMap::new(
        None,
        vec![RawToken {
            dst_line: 0x4000,
            dst_col: 0x20000,
            src_line: 0,
            src_col: 0,
            src_id: NO_REF,
            name_id: NO_REF,
        }],
        vec![],
        vec![],
        vec![],
    );
    assert!(matches!(
        dump_sourcemap(&sm, DumpOptions::default()),
        Err(Error::LocationOverflow)
    ));
}

#[test]
fn empty_map_round_trips() {
    let sm = SourceMap::new(None, vec![], vec![], vec![], vec![]);
    let db = MemDb::from_vec(dump_sourcemap(&sm, DumpOptions::default()).unwrap()).unwrap();
    assert_eq!(db.get_token_count(), 0);
    assert!(db.lookup_token(0, 0).is_none());
}
