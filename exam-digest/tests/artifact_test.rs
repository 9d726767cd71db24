mod common;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::{init_tracing, sample_record};
use exam_digest::artifact::{
    decode_records, decrypt_artifact, encode_report, encrypt_with_iv, read_artifact, serialize_records,
    write_artifact, ArtifactKey, IV_LEN,
};
use exam_digest::{EngineError, NewsRecord, ARTIFACT_ENCRYPTION};

fn test_key() -> ArtifactKey {
    ArtifactKey::new(*b"KesugExamProCurrentAffairKey2026")
}

fn sample_report() -> Vec<NewsRecord> {
    vec![
        sample_record("Lunar landing", "International_Affairs"),
        sample_record("Budget session", "Economics"),
    ]
}

#[test]
fn test_round_trip_recovers_serialized_report() {
    init_tracing();

    let records = sample_report();
    let iv = [7u8; IV_LEN];
    let artifact = encrypt_with_iv(&records, &test_key(), &iv).expect("encryption succeeds");

    assert_eq!(artifact.encryption, ARTIFACT_ENCRYPTION);
    assert_eq!(STANDARD.decode(&artifact.iv).expect("iv is base64"), iv.to_vec());

    let plaintext = decrypt_artifact(&artifact, &test_key()).expect("decryption succeeds");
    assert_eq!(plaintext, serialize_records(&records).expect("serializes"));

    let decoded = decode_records(&artifact, &test_key()).expect("records decode");
    assert_eq!(decoded, records);
}

#[test]
fn test_fixed_iv_is_deterministic() {
    let records = sample_report();
    let iv = [1u8; IV_LEN];

    let first = encrypt_with_iv(&records, &test_key(), &iv).expect("encrypts");
    let second = encrypt_with_iv(&records, &test_key(), &iv).expect("encrypts");
    assert_eq!(first, second);
}

#[test]
fn test_different_ivs_give_different_ciphertext() {
    let records = sample_report();

    let a = encrypt_with_iv(&records, &test_key(), &[0u8; IV_LEN]).expect("encrypts");
    let b = encrypt_with_iv(&records, &test_key(), &[9u8; IV_LEN]).expect("encrypts");
    assert_ne!(a.payload, b.payload);

    // Fresh IVs per encode
    let c = encode_report(&records, &test_key()).expect("encodes").expect("non-empty report");
    let d = encode_report(&records, &test_key()).expect("encodes").expect("non-empty report");
    assert_ne!(c.iv, d.iv);
    assert_ne!(c.payload, d.payload);
}

#[test]
fn test_empty_report_produces_no_artifact() {
    let artifact = encode_report(&[], &test_key()).expect("empty report is not an error");
    assert!(artifact.is_none());
}

#[test]
fn test_payload_is_padded_to_block_size() {
    let artifact = encode_report(&sample_report(), &test_key())
        .expect("encodes")
        .expect("non-empty report");
    let ciphertext = STANDARD.decode(&artifact.payload).expect("payload is base64");
    assert_eq!(ciphertext.len() % 16, 0);
}

#[test]
fn test_record_fields_serialize_in_declaration_order() {
    let json = String::from_utf8(serialize_records(&[sample_record("Order", "Sports")]).expect("serializes"))
        .expect("utf-8");

    let keys = [
        "\"topic\"",
        "\"what\"",
        "\"who\"",
        "\"where\"",
        "\"when\"",
        "\"why_how\"",
        "\"takeaway\"",
        "\"category\"",
        "\"source_link\"",
    ];
    let positions: Vec<usize> = keys
        .iter()
        .map(|k| json.find(k).unwrap_or_else(|| panic!("{} missing from {}", k, json)))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "unexpected order: {}", json);
    assert!(json.starts_with('['));
}

#[test]
fn test_records_omit_status_but_accept_it_when_reading() {
    let json = String::from_utf8(serialize_records(&[sample_record("Tagless", "Economics")]).expect("serializes"))
        .expect("utf-8");
    assert!(!json.contains("\"status\""), "status leaked into {}", json);

    // Older artifacts appended the classifier object whole
    let legacy = r#"[{"status":"ACCEPTED","topic":"Tagless","what":"w","who":"o","where":"p","when":"t",
        "why_how":"h","takeaway":"k","category":"Economics","source_link":"https://news.example.com/story"}]"#;
    let records: Vec<NewsRecord> = serde_json::from_str(legacy).expect("legacy record decodes");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].facts.topic, "Tagless");
    assert_eq!(records[0].category, "Economics");
}

#[test]
fn test_wrong_key_does_not_recover_report() {
    let records = sample_report();
    let artifact = encode_report(&records, &test_key()).expect("encodes").expect("non-empty");

    let other = ArtifactKey::new([0x42; 32]);
    match decode_records(&artifact, &other) {
        Err(EngineError::Crypto(_)) | Err(EngineError::Serialization(_)) => {}
        Ok(decoded) => assert_ne!(decoded, records),
        Err(e) => panic!("unexpected error: {}", e),
    }
}

#[test]
fn test_unsupported_scheme_is_rejected() {
    let mut artifact = encode_report(&sample_report(), &test_key()).expect("encodes").expect("non-empty");
    artifact.encryption = "AES-256-GCM".to_string();

    let err = decrypt_artifact(&artifact, &test_key()).expect_err("scheme mismatch");
    assert!(matches!(err, EngineError::Crypto(_)));
}

#[test]
fn test_bad_iv_length_is_rejected() {
    let mut artifact = encode_report(&sample_report(), &test_key()).expect("encodes").expect("non-empty");
    artifact.iv = STANDARD.encode([0u8; 8]);

    let err = decrypt_artifact(&artifact, &test_key()).expect_err("short iv");
    assert!(matches!(err, EngineError::Crypto(_)));
}

#[test]
fn test_write_and_read_artifact_file() {
    init_tracing();

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("out").join("encrypted_news.json");

    let artifact = encode_report(&sample_report(), &test_key()).expect("encodes").expect("non-empty");
    write_artifact(&path, &artifact).expect("writes");

    let raw = std::fs::read_to_string(&path).expect("file exists");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("valid JSON");
    let object = value.as_object().expect("top-level object");
    assert_eq!(object.len(), 3);
    for field in ["encryption", "iv", "payload"] {
        assert!(object[field].is_string(), "{} should be a string", field);
    }
    assert!(raw.contains("\n    \"encryption\""), "expected 4-space indent: {}", raw);

    let loaded = read_artifact(&path).expect("reads back");
    assert_eq!(loaded, artifact);
    assert_eq!(decode_records(&loaded, &test_key()).expect("decodes"), sample_report());
}
