//! Cache interaction across repeated runs: hits, refusals, refetching.

use super::test_utils::TestEnv;
use flagforge::hashing::HashAlgorithm;
use serde_json::json;

const CDN: &str = "https://cdn.example.com/";
const MANIFEST_URL: &str = "https://flags.example.com/m.json";

#[tokio::test]
async fn test_second_apply_downloads_fragments_once() {
    let mut env = TestEnv::new();
    env.add_install("abc123");

    let fragment = env.add_fragment(CDN, "base.json", &json!({ "FFlagFoo": true }));
    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "Flags": { "base_url": CDN, "default": true, "files": [fragment] }
        }),
    );

    env.pipeline().apply(false).await.unwrap();
    env.pipeline().apply(false).await.unwrap();

    // manifests are fetched on every run, verified fragments only once
    assert_eq!(env.request_count_for(MANIFEST_URL), 2);
    assert_eq!(
        env.request_count_for("https://cdn.example.com/base.json"),
        1
    );
}

#[tokio::test]
async fn test_md5_fragment_is_refused_without_fetch() {
    let mut env = TestEnv::new();
    env.add_install("abc123");

    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "Flags": {
                "base_url": CDN,
                "default": true,
                "files": [
                    {
                        "path": "weak.json",
                        "hash": {
                            "algorithm": "md5",
                            "digest": "d41d8cd98f00b204e9800998ecf8427e"
                        }
                    }
                ]
            }
        }),
    );

    let err = env.pipeline().apply(false).await.unwrap_err();
    assert!(err.to_string().contains("refused"));
    // the refusal happens before any download attempt
    assert_eq!(env.request_count_for("https://cdn.example.com/weak.json"), 0);
}

#[tokio::test]
async fn test_digest_mismatch_fails_and_caches_nothing() {
    let mut env = TestEnv::new();
    env.add_install("abc123");

    // served bytes do not match the digest the manifest declares
    let served = serde_json::to_vec(&json!({ "FFlagTampered": true })).unwrap();
    let declared = HashAlgorithm::Sha256
        .digest_hex(br#"{"FFlagOriginal": true}"#)
        .unwrap();
    env.fetcher
        .insert("https://cdn.example.com/flags.json", served);
    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "Flags": {
                "base_url": CDN,
                "default": true,
                "files": [
                    {
                        "path": "flags.json",
                        "hash": { "algorithm": "sha256", "digest": declared }
                    }
                ]
            }
        }),
    );

    let pipeline = env.pipeline();
    let err = pipeline.apply(false).await.unwrap_err();
    assert!(err.to_string().contains("Digest mismatch"));
    assert_eq!(pipeline.cache().stats().unwrap().entries, 0);
}

#[tokio::test]
async fn test_unverified_fragment_refetches_every_run() {
    let mut env = TestEnv::new();
    env.add_install("abc123");

    env.fetcher.insert(
        "https://cdn.example.com/latest.json",
        serde_json::to_vec(&json!({ "FFlagLatest": 7 })).unwrap(),
    );
    env.add_remote_manifest(
        MANIFEST_URL,
        &json!({
            "Flags": {
                "base_url": CDN,
                "default": true,
                "files": [
                    { "path": "latest.json", "hash": { "algorithm": "none" } }
                ]
            }
        }),
    );

    env.pipeline().apply(false).await.unwrap();
    let pipeline = env.pipeline();
    pipeline.apply(false).await.unwrap();

    assert_eq!(
        env.request_count_for("https://cdn.example.com/latest.json"),
        2
    );
    // identical bytes land on the same content-addressed entry
    assert_eq!(pipeline.cache().stats().unwrap().entries, 1);
}
