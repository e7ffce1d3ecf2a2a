//! Error handling for malformed input
//!
//! Missing data never fails; only unreadable files and corrupt encodings do.

use config::binary::constants::{MAGIC, MAX_RECURSION_DEPTH, TYPE_NULL, TYPE_STRING};
use config::{Config, Error};

#[test]
fn test_invalid_magic() {
    let data = vec![b'X', b'Y', b'Z', b'W', 0, 0, 0, 0, 0];
    let result = Config::from_bytes(&data);

    assert!(result.is_err());
    match result.unwrap_err() {
        Error::InvalidMagic { expected, found } => {
            assert_eq!(expected, MAGIC);
            assert_eq!(found, u32::from_le_bytes([b'X', b'Y', b'Z', b'W']));
        }
        other => panic!("Expected InvalidMagic error, got {:?}", other),
    }
}

#[test]
fn test_too_short_for_header() {
    match Config::from_bytes(&[0x43, 0x46]).unwrap_err() {
        Error::TruncatedData {
            expected_bytes,
            available_bytes,
        } => {
            assert_eq!(expected_bytes, 4);
            assert_eq!(available_bytes, 2);
        }
        other => panic!("Expected TruncatedData error, got {:?}", other),
    }
}

#[test]
fn test_string_length_past_end() {
    let mut data = MAGIC.to_le_bytes().to_vec();
    data.push(TYPE_STRING);
    data.extend_from_slice(&100u32.to_le_bytes());
    data.extend_from_slice(b"short");

    match Config::from_bytes(&data).unwrap_err() {
        Error::TruncatedData {
            expected_bytes,
            available_bytes,
        } => {
            assert_eq!(expected_bytes, 100);
            assert_eq!(available_bytes, 5);
        }
        other => panic!("Expected TruncatedData error, got {:?}", other),
    }
}

#[test]
fn test_invalid_utf8_string() {
    let mut data = MAGIC.to_le_bytes().to_vec();
    data.push(TYPE_STRING);
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&[0xFF, 0xFE]);
    data.extend_from_slice(&0u32.to_le_bytes());

    match Config::from_bytes(&data).unwrap_err() {
        Error::InvalidUtf8 => {}
        other => panic!("Expected InvalidUtf8 error, got {:?}", other),
    }
}

#[test]
fn test_reserved_tag_bits_rejected() {
    let mut data = MAGIC.to_le_bytes().to_vec();
    data.push(0x10 | TYPE_NULL);
    data.extend_from_slice(&0u32.to_le_bytes());

    match Config::from_bytes(&data).unwrap_err() {
        Error::InvalidTypeTag { tag } => assert_eq!(tag, 0x10),
        other => panic!("Expected InvalidTypeTag error, got {:?}", other),
    }
}

#[test]
fn test_deep_but_legal_nesting_decodes() {
    let mut cfg = Config::new();
    let path = vec!["level"; MAX_RECURSION_DEPTH - 1].join("/");
    cfg.find(&path).set(1);

    let restored = Config::from_bytes(&cfg.to_bytes()).unwrap();
    assert_eq!(restored.lookup(&path).unwrap().integer(0), 1);
}

#[test]
fn test_strict_text_reports_line() {
    let text = "ok = 1\nbad = \"open\nfine = 2\n";
    match text.parse::<Config>().unwrap_err() {
        Error::Parse { line, .. } => assert_eq!(line, 2),
        other => panic!("Expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_strict_text_rejects_unmatched_close() {
    match "a {\n}\n}\n".parse::<Config>().unwrap_err() {
        Error::Parse { line, message } => {
            assert_eq!(line, 3);
            assert!(message.contains("unmatched"));
        }
        other => panic!("Expected Parse error, got {:?}", other),
    }
}

#[test]
fn test_unclosed_block_is_closed_at_end() {
    let cfg: Config = "outer {\n    inner = 3\n".parse().unwrap();
    assert_eq!(cfg["outer"]["inner"].integer(0), 3);
}

#[test]
fn test_missing_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.bin");

    match Config::load_binary(&missing).unwrap_err() {
        Error::Io(_) => {}
        other => panic!("Expected Io error, got {:?}", other),
    }
    assert!(Config::from_kdl_file(dir.path().join("missing.kdl")).is_err());
}

#[test]
fn test_malformed_kdl() {
    match Config::from_kdl_str("node \"unterminated").unwrap_err() {
        Error::Kdl(_) => {}
        other => panic!("Expected Kdl error, got {:?}", other),
    }
}

#[test]
fn test_missing_data_is_not_an_error() {
    let mut cfg = Config::new();
    assert_eq!(cfg.find("never/written").integer(42), 42);
    assert_eq!(cfg.find("never/written").string("fallback"), "fallback");
    assert!(cfg.lookup("never/written").is_some());
}
